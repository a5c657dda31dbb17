//! Loading tuning files and running birds with them.

use std::path::PathBuf;

use crane::{BirdConfig, ConfigError, ControlInput, Simulation};
use glam::Vec3;
use rstest::{fixture, rstest};
use test_utils::{held, meadow, walking_player, SharedEpisode, SEED};

#[fixture]
fn gentle() -> BirdConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/gentle.json");
    BirdConfig::from_json_path(&path).expect("shipped tuning must load")
}

fn distance_walked(config: BirdConfig) -> f32 {
    let mut simulation = Simulation::new(config, meadow(), SEED);
    let player = walking_player(&mut simulation, Vec3::new(0.0, 1.0, 0.0));
    let episode = SharedEpisode::new(simulation);
    let mut episode = episode.lock();
    episode.run_to(
        60,
        held(ControlInput {
            forward: true,
            ..ControlInput::default()
        }),
    );
    -episode.position(player).z
}

#[rstest]
fn shipped_tuning_overrides_only_what_it_names(gentle: BirdConfig) {
    let defaults = BirdConfig::default();
    assert!((gentle.walking.walk_speed - 1.0).abs() < f32::EPSILON);
    assert!((gentle.discovery.fade_seconds - 1.5).abs() < f32::EPSILON);
    assert_eq!(gentle.swimming, defaults.swimming);
    assert_eq!(gentle.npc, defaults.npc);
}

#[rstest]
fn slower_tuning_walks_a_shorter_way(gentle: BirdConfig) {
    let slow = distance_walked(gentle);
    let brisk = distance_walked(BirdConfig::default());
    assert!(slow > 0.0);
    assert!(slow < brisk, "slow {slow} should trail brisk {brisk}");
}

#[rstest]
fn unreadable_tuning_names_the_file() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/missing.json");
    let err = BirdConfig::from_json_path(&path).expect_err("missing file must fail");
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("missing.json"));
}

/// Dotted path of the field a rejected tuning file is blamed on.
fn rejected_field(json: &str) -> &'static str {
    match BirdConfig::from_json_str(json) {
        Err(ConfigError::Invalid { field, .. }) => field,
        Err(ConfigError::Unordered { upper, .. }) => upper,
        other => panic!("expected {json} to be rejected, got {other:?}"),
    }
}

#[rstest]
#[case::ceiling_below_level_band(r#"{ "flying": { "max_height": 5.0 } }"#, "flying.max_height")]
#[case::stopping_inside_close(r#"{ "npc": { "stopping_distance": 1.0 } }"#, "npc.stopping_distance")]
#[case::negative_stopping(r#"{ "npc": { "stopping_distance": -1.0 } }"#, "npc.stopping_distance")]
#[case::negative_close(r#"{ "npc": { "close_distance": -0.5 } }"#, "npc.close_distance")]
#[case::negative_arrival(r#"{ "npc": { "arrival_distance": -2.0 } }"#, "npc.arrival_distance")]
#[case::zero_level_tolerance(r#"{ "landing": { "level_tolerance": 0.0 } }"#, "landing.level_tolerance")]
#[case::zero_reach(r#"{ "jumping": { "reach": 0.0 } }"#, "jumping.reach")]
#[case::oversized_short_hop(r#"{ "jumping": { "short_scale": 1.5 } }"#, "jumping.short_scale")]
#[case::negative_clearance(r#"{ "jumping": { "tall_clearance": -0.1 } }"#, "jumping.tall_clearance")]
#[case::clearance_beyond_probe(r#"{ "jumping": { "tall_clearance": 2.0 } }"#, "jumping.probe_distance")]
fn unusable_tuning_is_rejected(#[case] json: &str, #[case] field: &str) {
    assert_eq!(rejected_field(json), field);
}

#[rstest]
fn out_of_order_values_name_both_fields() {
    let err = BirdConfig::from_json_str(r#"{ "npc": { "close_distance": 6.0 } }"#)
        .expect_err("close distance beyond stopping distance must fail");
    let message = err.to_string();
    assert!(message.contains("npc.close_distance"), "{message}");
    assert!(message.contains("npc.stopping_distance"), "{message}");
}
