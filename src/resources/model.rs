use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use base64::Engine;
use cgmath::{Quaternion, Vector3};

use crate::{
    data_structures::{
        animation::{AnimationClip, AnimationTrack, Keyframes},
        instance::Instance,
        model::{Geometry, Material, Mesh, MeshMaterial, ModelVertex, Side},
        scene_graph::{ContainerNode, ModelNode, SceneNode},
    },
    resources::{AssetLoader, LoadedAsset, load_binary},
};

/// Loads `.gltf` and `.glb` files from an asset directory.
#[derive(Clone, Debug)]
pub struct GltfLoader {
    root: PathBuf,
}

impl GltfLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for GltfLoader {
    fn default() -> Self {
        Self::new("./assets")
    }
}

impl AssetLoader for GltfLoader {
    async fn load(&self, path: &str) -> anyhow::Result<LoadedAsset> {
        load_model_gltf(&self.root, path).await
    }
}

pub async fn load_model_gltf(root: &Path, file_name: &str) -> anyhow::Result<LoadedAsset> {
    let data = load_binary(root, file_name).await?;
    let gltf = gltf::Gltf::from_slice(&data)
        .with_context(|| format!("{file_name} is not a valid glTF asset"))?;

    // External buffers are resolved relative to the model file
    let model_dir = Path::new(file_name.trim_start_matches('/'))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        let bytes = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .with_context(|| format!("{file_name} references a missing binary chunk"))?,
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri)
                .with_context(|| format!("buffer {} of {file_name}", buffer.index()))?,
            gltf::buffer::Source::Uri(uri) => {
                let path = model_dir.join(uri);
                load_binary(root, &path.to_string_lossy()).await?
            }
        };
        if bytes.len() < buffer.length() {
            bail!(
                "buffer {} of {file_name} holds {} bytes, expected {}",
                buffer.index(),
                bytes.len(),
                buffer.length()
            );
        }
        buffer_data.push(bytes);
    }

    let animations = gltf
        .animations()
        .map(|animation| to_animation_clip(animation, &buffer_data))
        .collect::<Vec<_>>();

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .with_context(|| format!("{file_name} contains no scene"))?;
    let mut root_node = ContainerNode::new(scene.name().unwrap_or("Scene"));
    for node in scene.nodes() {
        root_node.add_child(to_scene_node(node, &buffer_data));
    }
    root_node.update_world_transform_all();

    log::debug!(
        "loaded {file_name}: {} nodes, {} animations",
        gltf.nodes().len(),
        animations.len()
    );

    Ok(LoadedAsset {
        scene: Box::new(root_node),
        animations,
    })
}

fn decode_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    let (header, payload) = uri
        .split_once(',')
        .context("malformed data uri")?;
    if !header.ends_with(";base64") {
        bail!("only base64 data uris are supported");
    }
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

fn to_scene_node(node: gltf::scene::Node, buf: &[Vec<u8>]) -> Box<dyn SceneNode> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => Box::new(ModelNode::new(&name, to_mesh(&mesh, buf)).with_index(node.index())),
        None => Box::new(ContainerNode::new(&name).with_index(node.index())),
    };
    let (translation, rotation, scale) = node.transform().decomposed();
    scene_node.set_local_transform(Instance {
        position: translation.into(),
        rotation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    });
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buf));
    }
    scene_node
}

/// All primitives of a glTF mesh end up in one geometry. A mesh with several
/// primitives carries one material per primitive.
fn to_mesh(mesh: &gltf::Mesh, buf: &[Vec<u8>]) -> Mesh {
    let name = mesh.name().unwrap_or("unknown_mesh");
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut materials = Vec::new();

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));
        let base = vertices.len() as u32;

        let mut primitive_vertices = Vec::new();
        if let Some(positions) = reader.read_positions() {
            positions.for_each(|position| {
                primitive_vertices.push(ModelVertex {
                    position,
                    ..Default::default()
                })
            });
        }
        if let Some(normals) = reader.read_normals() {
            primitive_vertices
                .iter_mut()
                .zip(normals)
                .for_each(|(vertex, normal)| vertex.normal = normal);
        }
        if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
            primitive_vertices
                .iter_mut()
                .zip(tex_coords)
                .for_each(|(vertex, tex_coord)| vertex.tex_coords = tex_coord);
        }

        match reader.read_indices() {
            Some(raw) => indices.extend(raw.into_u32().map(|i| base + i)),
            None => indices.extend(base..base + primitive_vertices.len() as u32),
        }
        vertices.append(&mut primitive_vertices);
        materials.push(to_material(&primitive.material()));
    }

    let geometry = Geometry::new(name, vertices, indices);
    let material = if materials.len() == 1 {
        MeshMaterial::Single(materials.remove(0))
    } else {
        MeshMaterial::Multiple(materials)
    };
    Mesh::new(name, geometry, material)
}

fn to_material(material: &gltf::Material) -> Material {
    let [r, g, b, a] = material.pbr_metallic_roughness().base_color_factor();
    let side = if material.double_sided() {
        Side::Double
    } else {
        Side::Front
    };
    Material::new(material.name().unwrap_or("default_material"), [r, g, b])
        .with_opacity(a)
        .with_transparency(material.alpha_mode() == gltf::material::AlphaMode::Blend)
        .with_side(side)
}

fn to_animation_clip(animation: gltf::Animation, buf: &[Vec<u8>]) -> AnimationClip {
    let mut tracks = Vec::new();
    for channel in animation.channels() {
        let reader = channel.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));
        let timestamps: Vec<f32> = match reader.read_inputs() {
            Some(inputs) => inputs.collect(),
            None => {
                log::warn!("no timestamps found in channel {}", channel.index());
                Vec::new()
            }
        };
        let keyframes = match reader.read_outputs() {
            Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                Keyframes::Translation(translations.map(Vector3::from).collect())
            }
            Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => Keyframes::Rotation(
                rotations
                    .into_f32()
                    .map(|[x, y, z, w]| Quaternion::new(w, x, y, z))
                    .collect(),
            ),
            Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                Keyframes::Scale(scales.map(Vector3::from).collect())
            }
            // TODO: implement morphing
            Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => Keyframes::Other,
            None => {
                log::warn!("no keyframes found in channel {}", channel.index());
                Keyframes::Other
            }
        };
        tracks.push(AnimationTrack {
            target: channel.target().node().index(),
            keyframes,
            timestamps,
        });
    }
    let name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Animation{}", animation.index()));
    AnimationClip::new(&name, tracks)
}
