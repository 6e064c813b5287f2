//! Engine data structures: scene graphs, transforms, meshes and animation.
//!
//! - `animation` holds keyframe clips, per-clip actions and the mixer
//! - `bounds` is the axis-aligned bounding box used for picking
//! - `instance` holds local/world transformation data
//! - `model` contains geometry, material and mesh definitions with their GPU buffers
//! - `scene_graph` enables hierarchical scene organization

pub mod animation;
pub mod bounds;
pub mod instance;
pub mod model;
pub mod scene_graph;
