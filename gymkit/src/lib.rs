pub mod catalog;
pub mod env;
pub mod envs;
pub mod logging;
pub mod registry;
pub mod rollout;
pub mod spaces;
