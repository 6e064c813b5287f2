mod common;

use cgmath::Vector3;
use flow_figure::{
    config::{load_roster, parse_roster},
    data_structures::instance::EulerRotation,
    ModelEntity,
};

use crate::common::test_utils::{assets_dir, curie, init_logger, RecordingLoader};

#[test]
fn should_parse_roster_with_optional_fields_missing() {
    let json = br#"[{ "id": 1, "name": "Curie", "position": [0, 0, 0], "birth_year": 1867, "death_year": 1934 }]"#;

    let roster = parse_roster(json).unwrap();

    assert_eq!(roster, vec![curie()]);
    assert_eq!(roster[0].lifespan(), 67);
}

#[test]
fn should_parse_every_optional_field() {
    let json = br#"[{
        "id": 4, "name": "Pauling", "position": [1, 2, 3],
        "rotation": { "x": 0.5, "y": 0, "z": 0 }, "scale": [2, 2, 2],
        "modelPath": "models/pauling.glb", "portraitPath": "portraits/pauling.png",
        "bio": "Two Nobel prizes.", "birth_year": 1901, "death_year": 1994
    }]"#;

    let config = parse_roster(json).unwrap().remove(0);

    assert_eq!(config.position, Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(config.rotation, Some(EulerRotation::new(0.5, 0.0, 0.0)));
    assert_eq!(config.scale, Some(Vector3::new(2.0, 2.0, 2.0)));
    assert_eq!(config.model_path.as_deref(), Some("models/pauling.glb"));
    assert_eq!(config.portrait_path.as_deref(), Some("portraits/pauling.png"));
    assert_eq!(config.bio.as_deref(), Some("Two Nobel prizes."));
}

#[test]
fn should_accept_death_year_before_birth_year() {
    let json = br#"[{ "id": 9, "name": "Typo", "position": [0, 0, 0], "birth_year": 1900, "death_year": 1800 }]"#;

    let roster = parse_roster(json).unwrap();

    assert_eq!(roster[0].lifespan(), -100);
}

#[test]
fn should_reject_roster_without_position() {
    let json = br#"[{ "id": 1, "name": "Curie", "birth_year": 1867, "death_year": 1934 }]"#;

    assert!(parse_roster(json).is_err());
}

#[test]
fn should_write_configs_back_in_roster_format() {
    let config = curie().with_scale(Vector3::new(1.5, 1.5, 1.5));

    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(json["position"], serde_json::json!([0.0, 0.0, 0.0]));
    assert_eq!(json["scale"], serde_json::json!([1.5, 1.5, 1.5]));
    assert_eq!(json["birth_year"], 1867);
    assert!(json.get("modelPath").is_none());
}

#[tokio::test]
async fn should_load_bundled_roster_into_entities() {
    init_logger();
    let roster = load_roster(&assets_dir(), "roster.json").await.unwrap();

    let mut entities: Vec<_> = roster
        .into_iter()
        .map(|config| ModelEntity::with_loader(config, RecordingLoader::default()))
        .collect();
    for entity in entities.iter_mut() {
        entity.load().await.unwrap();
    }

    assert_eq!(entities.len(), 2);
    assert_eq!(entities[1].config().name, "Mendeleev");
    assert!(entities[1].config().rotation.is_some());
    assert!(entities.iter().all(|entity| entity.is_loaded()));
}
