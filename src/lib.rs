//! flow-figure
//!
//! Loadable, animated and highlightable character figures for native and WASM
//! front-ends. A figure is described by an `EntityConfig`, loaded from a glTF
//! asset into a small scene graph, and exposes bounding-box picking, animation
//! playback and a selection overlay.
//!
//! High-level modules
//! - `config`: figure descriptions and roster files
//! - `data_structures`: scene graph, transforms, meshes, bounds and animation
//! - `entity`: the `ModelEntity` facade tying a loaded model to its config
//! - `resources`: asset loaders and raw file access
//!

pub mod config;
pub mod data_structures;
pub mod entity;
pub mod resources;

pub use cgmath::*;
pub use config::EntityConfig;
pub use entity::ModelEntity;

/// Installs the platform logger. Calling this more than once only warns.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            log::warn!("could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::warn!("could not initialize logger: {}", e);
        }
    }
}
