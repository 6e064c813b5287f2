//! Figure configuration and roster files.
//!
//! A roster is a JSON array of `EntityConfig`s:
//!
//! ```json
//! [
//!   { "id": 1, "name": "Curie", "position": [0, 0, 0], "birth_year": 1867, "death_year": 1934 },
//!   { "id": 2, "name": "Mendeleev", "position": [3, 0, 0], "rotation": { "x": 0, "y": 1.57, "z": 0 },
//!     "scale": [1.2, 1.2, 1.2], "modelPath": "models/mendeleev.glb", "birth_year": 1834, "death_year": 1907 }
//! ]
//! ```

use std::path::Path;

use anyhow::Context;
use cgmath::Vector3;
use serde::{Deserialize, Serialize};

use crate::{data_structures::instance::EulerRotation, resources::load_binary};

/// Static description of one figure. Nothing here is validated; in particular
/// `death_year` is not checked against `birth_year`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    pub id: u32,
    pub name: String,
    #[serde(with = "vec3")]
    pub position: Vector3<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<EulerRotation>,
    #[serde(default, with = "opt_vec3", skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vector3<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(rename = "birth_year")]
    pub birth_year: i32,
    #[serde(rename = "death_year")]
    pub death_year: i32,
}

impl EntityConfig {
    /// Config with only the required fields set.
    pub fn new(id: u32, name: &str, position: Vector3<f32>, birth_year: i32, death_year: i32) -> Self {
        Self {
            id,
            name: name.to_string(),
            position,
            rotation: None,
            scale: None,
            model_path: None,
            portrait_path: None,
            bio: None,
            birth_year,
            death_year,
        }
    }

    pub fn with_rotation(mut self, rotation: EulerRotation) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_model_path(mut self, model_path: &str) -> Self {
        self.model_path = Some(model_path.to_string());
        self
    }

    /// Years between birth and death, negative if the years are swapped.
    pub fn lifespan(&self) -> i32 {
        self.death_year - self.birth_year
    }
}

pub fn parse_roster(json: &[u8]) -> anyhow::Result<Vec<EntityConfig>> {
    Ok(serde_json::from_slice(json)?)
}

/// Reads a roster file from below `root`.
pub async fn load_roster(root: &Path, file_name: &str) -> anyhow::Result<Vec<EntityConfig>> {
    let data = load_binary(root, file_name).await?;
    let roster = parse_roster(&data).with_context(|| format!("invalid roster {file_name}"))?;
    log::info!("loaded {} figures from {file_name}", roster.len());
    Ok(roster)
}

mod vec3 {
    use cgmath::Vector3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vector3<f32>, serializer: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y, v.z].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vector3<f32>, D::Error> {
        <[f32; 3]>::deserialize(deserializer).map(Vector3::from)
    }
}

mod opt_vec3 {
    use cgmath::Vector3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        v: &Option<Vector3<f32>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        v.map(|v| [v.x, v.y, v.z]).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vector3<f32>>, D::Error> {
        Option::<[f32; 3]>::deserialize(deserializer).map(|v| v.map(Vector3::from))
    }
}
