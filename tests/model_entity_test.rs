mod common;

use cgmath::{One, Point3, Quaternion, Vector3};
use flow_figure::{
    data_structures::{instance::EulerRotation, model::Side, scene_graph::SceneNode},
    entity::{self, DEFAULT_MODEL_PATH},
    resources::GltfLoader,
    EntityConfig, ModelEntity,
};

use crate::common::test_utils::{
    assets_dir, curie, init_logger, FailingLoader, OneShotLoader, RecordingLoader,
};

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn should_request_default_model_when_no_path_is_configured() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::default());

    entity.load().await.unwrap();

    assert_eq!(
        entity.loader().requested.borrow().as_slice(),
        [DEFAULT_MODEL_PATH.to_string()]
    );
    assert!(entity.model().is_some());
    let highlight = entity.highlight_mesh().expect("highlight mesh");
    assert!(!highlight.is_visible());
    assert!(entity.is_point_inside(Point3::new(0.0, 0.0, 0.0)));
}

#[tokio::test]
async fn should_request_configured_model_path() {
    init_logger();
    let config = curie().with_model_path("models/curie.glb");
    let mut entity = ModelEntity::with_loader(config, RecordingLoader::default());

    entity.load().await.unwrap();

    assert_eq!(
        entity.loader().requested.borrow().as_slice(),
        ["models/curie.glb".to_string()]
    );
}

#[tokio::test]
async fn should_load_default_figure_from_assets() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), GltfLoader::new(assets_dir()));

    entity.load().await.unwrap();

    assert!(entity.model().is_some());
    assert!(!entity.highlight_mesh().unwrap().is_visible());
    assert!(entity.is_point_inside(Point3::new(0.0, 0.0, 0.0)));
    assert_eq!(entity.animation_names(), vec!["Idle", "Bow"]);
}

#[tokio::test]
async fn should_keep_default_rotation_and_scale_when_not_configured() {
    init_logger();
    let config = EntityConfig::new(7, "Dalton", Vector3::new(5.0, 0.0, -2.0), 1766, 1844);
    let mut entity = ModelEntity::with_loader(config, RecordingLoader::default());

    entity.load().await.unwrap();

    let local = entity.model().unwrap().get_local_transform();
    assert_eq!(local.position, Vector3::new(5.0, 0.0, -2.0));
    assert_eq!(local.rotation, Quaternion::one());
    assert_eq!(local.scale, Vector3::new(1.0, 1.0, 1.0));
}

#[tokio::test]
async fn should_apply_configured_rotation_and_scale() {
    init_logger();
    let rotation = EulerRotation::new(0.0, std::f32::consts::FRAC_PI_2, 0.0);
    let config = curie()
        .with_rotation(rotation)
        .with_scale(Vector3::new(2.0, 2.0, 2.0));
    let mut entity = ModelEntity::with_loader(config, RecordingLoader::default());

    entity.load().await.unwrap();

    let local = entity.model().unwrap().get_local_transform();
    assert_eq!(local.rotation, rotation.to_quaternion());
    assert_eq!(local.scale, Vector3::new(2.0, 2.0, 2.0));
    // the 1x2x1 body doubles in size
    assert_close(entity.bounding_box().size().y, 4.5);
}

#[tokio::test]
async fn should_move_bounding_box_with_configured_position() {
    init_logger();
    let config = EntityConfig::new(2, "Mendeleev", Vector3::new(5.0, 0.0, 0.0), 1834, 1907);
    let mut entity = ModelEntity::with_loader(config, RecordingLoader::default());

    entity.load().await.unwrap();

    assert!(entity.is_point_inside(Point3::new(5.0, 0.0, 0.0)));
    assert!(!entity.is_point_inside(Point3::new(0.0, 0.0, 0.0)));
    assert_close(entity.bounding_box().min.x, 4.5);
    assert_close(entity.bounding_box().max.y, 1.25);
}

#[tokio::test]
async fn should_size_highlight_mesh_ten_percent_larger_than_bounds() {
    init_logger();
    let config = EntityConfig::new(3, "Lavoisier", Vector3::new(1.0, 2.0, 3.0), 1743, 1794);
    let mut entity = ModelEntity::with_loader(config, RecordingLoader::default());

    entity.load().await.unwrap();

    let highlight = entity.highlight_mesh().unwrap();
    let size = highlight.mesh().geometry.bounding_box().size();
    assert_close(size.x, 1.1);
    assert_close(size.y, 2.25 * 1.1);
    assert_close(size.z, 1.1);
    assert_eq!(
        highlight.get_local_transform().position,
        Vector3::new(1.0, 2.0, 3.0)
    );

    let material = highlight.mesh().material.iter().next().unwrap();
    assert!(material.transparent);
    assert_close(material.opacity, 0.3);
    assert_eq!(material.side, Side::Back);
    assert_close(material.color[0], 0x42 as f32 / 255.0);
}

#[tokio::test]
async fn should_toggle_highlight_idempotently() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::default());
    entity.load().await.unwrap();

    entity.highlight();
    entity.highlight();
    assert!(entity.is_highlighted());
    assert!(entity.highlight_mesh().unwrap().is_visible());

    entity.unhighlight();
    entity.unhighlight();
    assert!(!entity.is_highlighted());
    assert!(!entity.highlight_mesh().unwrap().is_visible());
}

#[test]
fn should_ignore_highlight_before_load() {
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::default());

    entity.highlight();

    assert!(!entity.is_highlighted());
    assert!(entity.highlight_mesh().is_none());
}

#[tokio::test]
async fn should_play_named_animation() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::animated());
    entity.load().await.unwrap();

    entity.play_animation("Wave");
    entity.update(1.0);

    let body = entity.model().unwrap().find_by_name("body").unwrap();
    assert_close(body.get_local_transform().position.x, 1.0);
    assert_close(body.get_world_transform().position.x, 1.0);
    let mixer = entity.animation().unwrap().mixer();
    assert_eq!(mixer.running_actions().count(), 1);
}

#[tokio::test]
async fn should_ignore_unknown_animation_name() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::animated());
    entity.load().await.unwrap();

    entity.play_animation("wave");
    entity.play_animation("Dance");
    entity.update(1.0);

    let mixer = entity.animation().unwrap().mixer();
    assert_eq!(mixer.running_actions().count(), 0);
    assert!(mixer.existing_action("Wave").is_none());
    let body = entity.model().unwrap().find_by_name("body").unwrap();
    assert_eq!(body.get_local_transform().position.x, 0.0);
}

#[tokio::test]
async fn should_not_create_mixer_without_clips() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::default());
    entity.load().await.unwrap();

    entity.play_animation("Wave");
    entity.update(0.5);

    assert!(entity.animation().is_none());
    assert!(entity.animation_names().is_empty());
}

#[tokio::test]
async fn should_restart_animation_when_played_again() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::animated());
    entity.load().await.unwrap();

    entity.play_animation("Wave");
    entity.update(1.5);
    entity.play_animation("Wave");
    entity.update(0.5);

    let action = entity
        .animation()
        .unwrap()
        .mixer()
        .existing_action("Wave")
        .unwrap();
    assert_close(action.time(), 0.5);
}

#[tokio::test]
async fn should_propagate_load_errors_without_committing_state() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), FailingLoader);

    let err = entity.load().await.unwrap_err();

    assert_eq!(err.to_string(), format!("no such model: {DEFAULT_MODEL_PATH}"));
    assert!(entity.model().is_none());
    assert!(entity.highlight_mesh().is_none());
    assert!(!entity.is_point_inside(Point3::new(0.0, 0.0, 0.0)));
}

#[tokio::test]
async fn should_keep_loaded_state_when_reload_fails() {
    init_logger();
    let config = EntityConfig::new(3, "Dalton", Vector3::new(2.0, 0.0, 0.0), 1766, 1844);
    let mut entity = ModelEntity::with_loader(config, OneShotLoader::default());
    entity.load().await.unwrap();
    entity.highlight();
    entity.play_animation("Wave");
    entity.update(0.5);
    let bounds = *entity.bounding_box();

    assert!(entity.load().await.is_err());

    assert_eq!(entity.loader().calls.get(), 2);
    assert!(entity.is_loaded());
    assert_eq!(*entity.bounding_box(), bounds);
    assert!(entity.is_highlighted());
    assert!(entity.highlight_mesh().unwrap().is_visible());
    assert_eq!(entity.animation_names(), ["Wave"]);
    let action = entity
        .animation()
        .unwrap()
        .mixer()
        .existing_action("Wave")
        .unwrap();
    assert!(action.is_running());
    assert_close(action.time(), 0.5);
}

#[tokio::test]
async fn should_replace_model_when_loaded_twice() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::animated());
    entity.load().await.unwrap();
    entity.highlight();
    entity.play_animation("Wave");
    entity.update(1.0);

    entity.load().await.unwrap();

    assert_eq!(entity.loader().requested.borrow().len(), 2);
    assert!(entity.is_loaded());
    assert!(!entity.is_highlighted());
    assert!(!entity.highlight_mesh().unwrap().is_visible());
    let mixer = entity.animation().unwrap().mixer();
    assert_eq!(mixer.running_actions().count(), 0);
    assert_eq!(mixer.time(), 0.0);
    let body = entity.model().unwrap().find_by_name("body").unwrap();
    assert_eq!(body.get_local_transform().position.x, 0.0);
    assert!(body.get_mesh().is_some_and(|mesh| !mesh.is_disposed()));
}

#[tokio::test]
async fn should_survive_non_finite_frame_times() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::animated());
    entity.load().await.unwrap();
    entity.play_animation("Wave");

    entity.update(f32::NAN);
    entity.update(f32::INFINITY);
    entity.update(0.5);

    let body = entity.model().unwrap().find_by_name("body").unwrap();
    assert_close(body.get_local_transform().position.x, 0.5);
}

#[tokio::test]
async fn should_fail_for_missing_asset_file() {
    init_logger();
    let config = curie().with_model_path("models/does-not-exist.glb");
    let mut entity = ModelEntity::with_loader(config, GltfLoader::new(assets_dir()));

    assert!(entity.load().await.is_err());
    assert!(!entity.is_loaded());
}

#[test]
fn should_report_no_point_inside_before_load() {
    let entity = ModelEntity::with_loader(curie(), RecordingLoader::default());

    assert!(!entity.is_point_inside(Point3::new(0.0, 0.0, 0.0)));
    assert!(entity.bounding_box().is_empty());
}

#[test]
fn should_dispose_never_loaded_entity() {
    let mut entity = ModelEntity::new(curie());

    entity.dispose();
    entity.dispose();

    assert!(entity.model().is_none());
    assert!(entity.highlight_mesh().is_none());
    assert_eq!(entity.config().name, "Curie");
}

#[tokio::test]
async fn should_clear_everything_on_dispose() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::animated());
    entity.load().await.unwrap();
    entity.highlight();

    entity.dispose();
    entity.dispose();

    assert!(entity.model().is_none());
    assert!(entity.highlight_mesh().is_none());
    assert!(entity.animation().is_none());
    assert!(!entity.is_highlighted());
    assert!(!entity.is_point_inside(Point3::new(0.0, 0.0, 0.0)));

    // disposed entities behave like unloaded ones
    entity.highlight();
    entity.play_animation("Wave");
    entity.update(1.0);
    assert!(!entity.is_highlighted());
}

#[tokio::test]
async fn should_load_again_after_dispose() {
    init_logger();
    let mut entity = ModelEntity::with_loader(curie(), RecordingLoader::default());
    entity.load().await.unwrap();
    entity.dispose();

    entity.load().await.unwrap();

    assert!(entity.is_loaded());
    assert_eq!(entity.loader().requested.borrow().len(), 2);
    assert!(entity.is_point_inside(Point3::new(0.0, 0.0, 0.0)));
}

#[tokio::test]
async fn should_load_all_entities_and_pick_by_point() {
    init_logger();
    let mut entities = vec![
        ModelEntity::with_loader(curie(), RecordingLoader::default()),
        ModelEntity::with_loader(
            EntityConfig::new(2, "Mendeleev", Vector3::new(5.0, 0.0, 0.0), 1834, 1907),
            RecordingLoader::default(),
        ),
    ];

    let results = entity::load_all(&mut entities).await;

    assert!(results.iter().all(Result::is_ok));
    let picked = entity::pick(&entities, Point3::new(5.2, 0.5, 0.0)).unwrap();
    assert_eq!(picked.config().name, "Mendeleev");
    assert!(entity::pick(&entities, Point3::new(2.5, 0.0, 0.0)).is_none());
}
