//! Loadable figures.
//!
//! A `ModelEntity` wraps one character model: it asks its loader for the
//! asset, places the loaded scene according to its `EntityConfig`, keeps the
//! bounding box and a highlight overlay around, and drives the model's
//! animations. The entity goes through unloaded -> loaded -> disposed, where
//! a disposed entity behaves like an unloaded one and can be loaded again.

use std::sync::Arc;

use cgmath::{Point3, Vector3};

use crate::{
    config::EntityConfig,
    data_structures::{
        animation::{AnimationClip, AnimationMixer},
        bounds::Aabb,
        instance::Instance,
        model::{Geometry, Material, Mesh, MeshMaterial, Side},
        scene_graph::{ModelNode, SceneNode},
    },
    resources::{AssetLoader, GltfLoader, LoadedAsset},
};

/// Model used for figures without a `model_path`.
pub const DEFAULT_MODEL_PATH: &str = "/models/default-chemist.glb";

const HIGHLIGHT_COLOR: u32 = 0x42b883;
const HIGHLIGHT_OPACITY: f32 = 0.3;
const HIGHLIGHT_MARGIN: f32 = 1.1;

/// Animation state of a loaded model. Only exists if the asset has clips.
#[derive(Debug)]
pub struct Animation {
    mixer: AnimationMixer,
    clips: Vec<Arc<AnimationClip>>,
}

impl Animation {
    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    pub fn clips(&self) -> &[Arc<AnimationClip>] {
        &self.clips
    }
}

#[derive(Debug)]
pub struct ModelEntity<L = GltfLoader> {
    config: EntityConfig,
    loader: L,
    model: Option<Box<dyn SceneNode>>,
    animation: Option<Animation>,
    bounding_box: Aabb,
    highlight_mesh: Option<ModelNode>,
    highlighted: bool,
}

impl ModelEntity<GltfLoader> {
    /// Creates an unloaded entity reading models from the default asset
    /// directory. Does no I/O.
    pub fn new(config: EntityConfig) -> Self {
        Self::with_loader(config, GltfLoader::default())
    }
}

impl<L> ModelEntity<L> {
    pub fn with_loader(config: EntityConfig, loader: L) -> Self {
        Self {
            config,
            loader,
            model: None,
            animation: None,
            bounding_box: Aabb::empty(),
            highlight_mesh: None,
            highlighted: false,
        }
    }

    /// Path handed to the loader: the configured one or `DEFAULT_MODEL_PATH`.
    pub fn model_path(&self) -> &str {
        self.config
            .model_path
            .as_deref()
            .unwrap_or(DEFAULT_MODEL_PATH)
    }

    pub fn model(&self) -> Option<&dyn SceneNode> {
        self.model.as_deref()
    }

    pub fn highlight_mesh(&self) -> Option<&ModelNode> {
        self.highlight_mesh.as_ref()
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn animation_names(&self) -> Vec<&str> {
        self.animation
            .iter()
            .flat_map(|animation| animation.clips.iter().map(|clip| clip.name.as_str()))
            .collect()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Advances the running animations by `dt` seconds. Has to be called once
    /// per frame by the owner; without animations this does nothing.
    pub fn update(&mut self, dt: f32) {
        if let (Some(animation), Some(model)) = (self.animation.as_mut(), self.model.as_mut()) {
            animation.mixer.update(dt, &mut **model);
        }
    }

    /// Restarts the clip called exactly `name`. Unknown names are ignored.
    pub fn play_animation(&mut self, name: &str) {
        let Some(animation) = self.animation.as_mut() else {
            return;
        };
        match animation.clips.iter().find(|clip| clip.name == name) {
            Some(clip) => {
                animation.mixer.clip_action(clip).reset().play();
            }
            None => log::debug!("{} has no animation called {name}", self.config.name),
        }
    }

    pub fn highlight(&mut self) {
        if let Some(highlight_mesh) = self.highlight_mesh.as_mut() {
            if !self.highlighted {
                highlight_mesh.set_visible(true);
                self.highlighted = true;
            }
        }
    }

    pub fn unhighlight(&mut self) {
        if let Some(highlight_mesh) = self.highlight_mesh.as_mut() {
            if self.highlighted {
                highlight_mesh.set_visible(false);
                self.highlighted = false;
            }
        }
    }

    /// Whether `point` lies inside the bounding box. Always false while
    /// nothing is loaded.
    pub fn is_point_inside(&self, point: Point3<f32>) -> bool {
        self.bounding_box.contains_point(point)
    }

    /// Creates the GPU buffers of the model and its highlight overlay.
    pub fn upload(&mut self, device: &wgpu::Device) {
        if let Some(model) = self.model.as_mut() {
            model.traverse_mut(&mut |node| {
                if let Some(mesh) = node.get_mesh_mut() {
                    mesh.upload(device);
                }
            });
        }
        if let Some(highlight_mesh) = self.highlight_mesh.as_mut() {
            highlight_mesh.mesh_mut().upload(device);
        }
    }

    /// Releases every geometry and material and forgets the loaded state.
    /// Safe to call at any point, any number of times.
    pub fn dispose(&mut self) {
        if let Some(model) = self.model.as_mut() {
            model.traverse_mut(&mut |node| {
                if let Some(mesh) = node.get_mesh_mut() {
                    mesh.dispose();
                }
            });
        }
        if let Some(highlight_mesh) = self.highlight_mesh.as_mut() {
            highlight_mesh.mesh_mut().dispose();
        }

        self.model = None;
        self.animation = None;
        self.highlight_mesh = None;
        self.highlighted = false;
        self.bounding_box.make_empty();
    }
}

impl<L: AssetLoader> ModelEntity<L> {
    /// Loads the model and derives everything that depends on it.
    ///
    /// Nothing is committed unless the loader succeeds. A loader error is
    /// logged with the figure's name and returned unchanged. Loading an already
    /// loaded entity releases the previous model first.
    pub async fn load(&mut self) -> anyhow::Result<()> {
        let path = self.model_path().to_string();
        let LoadedAsset {
            mut scene,
            animations,
        } = match self.loader.load(&path).await {
            Ok(asset) => asset,
            Err(e) => {
                log::error!("error loading model for {}: {:#}", self.config.name, e);
                return Err(e);
            }
        };

        let config = &self.config;
        scene.set_local_transform_with(&mut |local| {
            local.position = config.position;
            if let Some(rotation) = config.rotation {
                local.rotation = rotation.into();
            }
            if let Some(scale) = config.scale {
                local.scale = scale;
            }
        });
        scene.update_world_transform_all();

        let animation = if animations.is_empty() {
            None
        } else {
            Some(Animation {
                mixer: AnimationMixer::new(scene.as_ref()),
                clips: animations.into_iter().map(Arc::new).collect(),
            })
        };
        let bounding_box = Aabb::from_node(scene.as_ref());
        let highlight_mesh = create_highlight_mesh(&bounding_box, config.position);

        if self.is_loaded() {
            log::warn!("{} was loaded twice, releasing the previous model", self.config.name);
            self.dispose();
        }
        log::info!(
            "loaded {} from {path} ({} animations)",
            self.config.name,
            animation.as_ref().map_or(0, |animation| animation.clips.len())
        );
        self.model = Some(scene);
        self.animation = animation;
        self.bounding_box = bounding_box;
        self.highlight_mesh = Some(highlight_mesh);
        self.highlighted = false;
        Ok(())
    }
}

impl<L> Drop for ModelEntity<L> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// A translucent, inside-out box slightly larger than `bounds`, hidden until
/// the figure gets highlighted.
fn create_highlight_mesh(bounds: &Aabb, position: Vector3<f32>) -> ModelNode {
    let size = bounds.size() * HIGHLIGHT_MARGIN;
    let geometry = Geometry::cuboid("highlight", size.x, size.y, size.z);
    let material = Material::from_hex("highlight", HIGHLIGHT_COLOR)
        .with_opacity(HIGHLIGHT_OPACITY)
        .with_transparency(true)
        .with_side(Side::Back);
    let mut node = ModelNode::new(
        "highlight",
        Mesh::new("highlight", geometry, MeshMaterial::Single(material)),
    );
    node.set_local_transform(Instance::from(position));
    node.update_world_transform_all();
    node.set_visible(false);
    node
}

/// Loads all `entities` concurrently. Results are in input order.
pub async fn load_all<L: AssetLoader>(entities: &mut [ModelEntity<L>]) -> Vec<anyhow::Result<()>> {
    futures::future::join_all(entities.iter_mut().map(|entity| entity.load())).await
}

/// First entity whose bounding box contains `point`.
pub fn pick<L>(entities: &[ModelEntity<L>], point: Point3<f32>) -> Option<&ModelEntity<L>> {
    entities.iter().find(|entity| entity.is_point_inside(point))
}
