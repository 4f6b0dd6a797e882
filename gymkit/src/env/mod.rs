// gymkit/src/env/mod.rs
use std::io::{self, Write};

mod errors;
mod handle;
mod traits;
mod types;
mod wrappers;

pub use errors::{ConfigurationError, EnvError};
pub use handle::EnvHandle;
pub use traits::{Env, ensure_action};
pub use types::{EnvMetadata, Info, RenderFrame, RenderMode, Step};
pub use wrappers::{FlattenObservation, OrderEnforcing, TimeLimit};

/// Shows a frame to the user on stderr, leaving stdout to program output.
pub(crate) fn show_human(frame: &RenderFrame) {
    if let Err(e) = write_frame(&mut io::stderr().lock(), frame) {
        tracing::warn!(error = %e, "failed to show frame");
    }
}

fn write_frame<W: Write + ?Sized>(out: &mut W, frame: &RenderFrame) -> io::Result<()> {
    writeln!(out, "{frame}")
}
