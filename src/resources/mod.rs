use std::{future::Future, path::Path};

use anyhow::Context;

use crate::data_structures::{animation::AnimationClip, scene_graph::SceneNode};

/**
 * This module contains all logic for loading models and raw bytes from external files.
 */
pub mod model;

pub use model::GltfLoader;

/// Everything a loader produces for one asset: the root of its node hierarchy
/// and the animation clips that target nodes inside it.
#[derive(Debug)]
pub struct LoadedAsset {
    pub scene: Box<dyn SceneNode>,
    pub animations: Vec<AnimationClip>,
}

/// Source of loadable models. The path is opaque to callers and only
/// interpreted by the loader.
pub trait AssetLoader {
    fn load(&self, path: &str) -> impl Future<Output = anyhow::Result<LoadedAsset>>;
}

/// `file_name` below `root` as a URL path, relative to the page origin.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn web_path(root: &Path, file_name: &str) -> String {
    let root = root.to_string_lossy();
    let root = root.trim_start_matches("./").trim_matches('/');
    if root.is_empty() || root == "." {
        file_name.to_string()
    } else {
        format!("{root}/{file_name}")
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(root: &Path, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no browser window available")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("unable to read the page origin"))?;
    let base = reqwest::Url::parse(&format!("{}/", origin))?;
    Ok(base.join(&web_path(root, file_name))?)
}

/// Reads `file_name` below `root`. Leading slashes are ignored so web-style
/// absolute asset paths resolve inside the asset directory.
pub async fn load_binary(root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    let file_name = file_name.trim_start_matches('/');
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = root.join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("unable to read {}", path.display()))?
    };

    Ok(data)
}
