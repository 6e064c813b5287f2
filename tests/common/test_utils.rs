use std::{
    cell::{Cell, RefCell},
    path::PathBuf,
};

use flow_figure::{
    data_structures::{
        animation::{AnimationClip, AnimationTrack, Keyframes},
        instance::Instance,
        model::{Geometry, Material, Mesh, MeshMaterial},
        scene_graph::{ContainerNode, ModelNode, SceneNode},
    },
    resources::{AssetLoader, LoadedAsset},
    EntityConfig, Vector3,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn assets_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets")
}

pub fn curie() -> EntityConfig {
    EntityConfig::new(1, "Curie", Vector3::new(0.0, 0.0, 0.0), 1867, 1934)
}

/// Root container with a 1x2x1 body (node 0) and a 0.5 cube hat (node 1)
/// sitting one unit above it. The hat uses two materials.
pub fn figure_scene() -> Box<dyn SceneNode> {
    let body = Mesh::new(
        "body",
        Geometry::cuboid("body", 1.0, 2.0, 1.0),
        MeshMaterial::Single(Material::new("skin", [0.9, 0.8, 0.7])),
    );
    let hat = Mesh::new(
        "hat",
        Geometry::cuboid("hat", 0.5, 0.5, 0.5),
        MeshMaterial::Multiple(vec![
            Material::new("felt", [0.1, 0.1, 0.1]),
            Material::new("band", [0.6, 0.0, 0.0]),
        ]),
    );
    let mut hat = ModelNode::new("hat", hat).with_index(1);
    hat.set_local_transform(Instance::from(Vector3::new(0.0, 1.0, 0.0)));
    let mut body = ModelNode::new("body", body).with_index(0);
    body.add_child(Box::new(hat));

    let mut root = ContainerNode::new("Scene");
    root.add_child(Box::new(body));
    root.update_world_transform_all();
    Box::new(root)
}

/// "Wave" moves node 0 from x=0 to x=2 over two seconds.
pub fn wave_clip() -> AnimationClip {
    AnimationClip::new(
        "Wave",
        vec![AnimationTrack {
            target: 0,
            keyframes: Keyframes::Translation(vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(2.0, 0.0, 0.0),
            ]),
            timestamps: vec![0.0, 2.0],
        }],
    )
}

/// Serves `figure_scene` for every path and remembers what was asked for.
#[derive(Debug, Default)]
pub struct RecordingLoader {
    pub requested: RefCell<Vec<String>>,
    pub with_animations: bool,
}

impl RecordingLoader {
    pub fn animated() -> Self {
        Self {
            with_animations: true,
            ..Default::default()
        }
    }
}

impl AssetLoader for RecordingLoader {
    async fn load(&self, path: &str) -> anyhow::Result<LoadedAsset> {
        self.requested.borrow_mut().push(path.to_string());
        let animations = if self.with_animations {
            vec![wave_clip()]
        } else {
            Vec::new()
        };
        Ok(LoadedAsset {
            scene: figure_scene(),
            animations,
        })
    }
}

#[derive(Debug, Default)]
pub struct FailingLoader;

impl AssetLoader for FailingLoader {
    async fn load(&self, path: &str) -> anyhow::Result<LoadedAsset> {
        anyhow::bail!("no such model: {path}")
    }
}

/// Serves an animated `figure_scene` once and fails on every later call.
#[derive(Debug, Default)]
pub struct OneShotLoader {
    pub calls: Cell<usize>,
}

impl AssetLoader for OneShotLoader {
    async fn load(&self, path: &str) -> anyhow::Result<LoadedAsset> {
        let calls = self.calls.get() + 1;
        self.calls.set(calls);
        if calls > 1 {
            anyhow::bail!("{path} went away");
        }
        Ok(LoadedAsset {
            scene: figure_scene(),
            animations: vec![wave_clip()],
        })
    }
}
