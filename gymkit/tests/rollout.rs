use gymkit::env::{Env, EnvError, FlattenObservation};
use gymkit::registry::{EnvOptions, Registry};
use gymkit::rollout::{self, RolloutConfig, RolloutError};
use gymkit::spaces::Element;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn quiet(env_id: &str, options: EnvOptions) -> RolloutConfig {
    RolloutConfig {
        env_id: env_id.to_string(),
        options,
        iterations: 1000,
        seed: Some(7),
    }
}

#[test]
fn blackjack_thousand_steps_resets_many_times() {
    let registry = Registry::with_builtins().unwrap();
    let config = quiet(
        "Blackjack-v1",
        EnvOptions::new().with("natural", false).with("sab", false),
    );
    let mut out = Vec::new();
    let summary = rollout::run(&registry, &config, &mut out).unwrap();

    assert_eq!(summary.iterations, 1000);
    assert!(summary.resets > 1);
    assert_eq!(summary.resets, summary.episodes + 1);
    assert_eq!(summary.episode_returns.len() as u64, summary.episodes);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Action space: Discrete(2)");
    assert_eq!(lines[4], "Wrapped observation space: Box(0, 1, (45,), int64)");
    assert_eq!(lines[5], "Wrapped observation space shape: (45,)");
    assert!(lines[6].starts_with("Initial observation: ("));
    assert_eq!(lines[7], "Initial info: {}");
}

#[test]
fn every_builtin_survives_a_rollout() {
    let registry = Registry::with_builtins().unwrap();
    for id in registry.ids() {
        let summary = rollout::run(&registry, &quiet(id, EnvOptions::new()), &mut Vec::new())
            .unwrap_or_else(|e| panic!("{id}: {e}"));
        assert!(summary.resets >= 1, "{id}");
    }
}

#[test]
fn observations_stay_in_space_across_resets() {
    let registry = Registry::with_builtins().unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for id in ["Blackjack-v1", "CartPole-v1", "FrozenLake-v1", "FrozenLake8x8-v1"] {
        let mut env = registry.make(id, &EnvOptions::new()).unwrap();
        let (obs, _) = env.reset(Some(1)).unwrap();
        assert!(env.observation_space().contains(&obs), "{id}: {obs}");
        for _ in 0..300 {
            let action = env.action_space().sample(&mut rng);
            let step = env.step(&action).unwrap();
            assert!(env.observation_space().contains(&step.observation), "{id}");
            if step.is_done() {
                let (obs, _) = env.reset(None).unwrap();
                assert!(env.observation_space().contains(&obs), "{id}");
            }
        }
        env.close().unwrap();
    }
}

#[test]
fn flattened_view_matches_flattened_space() {
    let registry = Registry::with_builtins().unwrap();
    let mut env = registry.make("Blackjack-v1", &EnvOptions::new()).unwrap();
    {
        let mut flat = FlattenObservation::new(&mut env);
        let (obs, _) = flat.reset(Some(9)).unwrap();
        assert!(flat.observation_space().contains(&obs));
        let Element::Array(values) = &obs else {
            panic!("expected a flat array, got {obs}");
        };
        assert_eq!(values.len(), 45);
        assert_eq!(values.iter().filter(|&&v| v == 1.0).count(), 3);
    }
    // The handle keeps its state after the wrapper is gone.
    env.step(&Element::Int(0)).unwrap();
}

#[test]
fn stepping_a_finished_episode_fails() {
    let registry = Registry::with_builtins().unwrap();
    let mut env = registry.make("Blackjack-v1", &EnvOptions::new()).unwrap();
    assert!(matches!(env.step(&Element::Int(0)), Err(EnvError::Step(_))));
    env.reset(None).unwrap();
    // Sticking always ends the hand.
    assert!(env.step(&Element::Int(0)).unwrap().terminated);
    assert!(matches!(env.step(&Element::Int(0)), Err(EnvError::Step(_))));
}

#[test]
fn bad_options_surface_as_configuration_errors() {
    let registry = Registry::with_builtins().unwrap();
    let config = quiet("FrozenLake-v1", EnvOptions::new().with("map_name", "5x5"));
    let err = rollout::run(&registry, &config, &mut Vec::new()).unwrap_err();
    assert!(matches!(
        err,
        RolloutError::Env(EnvError::Configuration(_))
    ));
}
