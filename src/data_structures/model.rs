//! Meshes, geometry and materials.
//!
//! Geometry and materials keep their CPU-side data so bounds can be computed
//! without a device. GPU buffers are created on demand through `upload` and
//! are destroyed again by `dispose`, which also drops the CPU data. A disposed
//! resource stays disposed: uploading it again is refused.

use wgpu::util::DeviceExt;

use crate::data_structures::{bounds::Aabb, instance::point};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

#[derive(Debug)]
struct GeometryBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

/// Vertex and index data of a single primitive.
#[derive(Debug)]
pub struct Geometry {
    pub name: String,
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
    buffers: Option<GeometryBuffers>,
    disposed: bool,
}

impl Geometry {
    pub fn new(name: &str, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.to_string(),
            vertices,
            indices,
            buffers: None,
            disposed: false,
        }
    }

    /// An axis-aligned box centered on the origin with the given extent.
    pub fn cuboid(name: &str, width: f32, height: f32, depth: f32) -> Self {
        let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([1.0, 0.0, 0.0], [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]]),
            ([-1.0, 0.0, 0.0], [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]]),
            ([0.0, 1.0, 0.0], [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]]),
            ([0.0, -1.0, 0.0], [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]]),
            ([0.0, 0.0, 1.0], [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]]),
            ([0.0, 0.0, -1.0], [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]]),
        ];
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            let base = vertices.len() as u32;
            for (position, tex_coords) in corners.into_iter().zip(uvs) {
                vertices.push(ModelVertex {
                    position,
                    tex_coords,
                    normal,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(name, vertices, indices)
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn num_elements(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Extent of the vertex positions in the geometry's own space.
    pub fn bounding_box(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for vertex in &self.vertices {
            aabb.expand_by_point(point(vertex.position));
        }
        aabb
    }

    pub fn upload(&mut self, device: &wgpu::Device) {
        if self.disposed {
            log::warn!("refusing to upload disposed geometry {}", self.name);
            return;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        if let Some(old) = self.buffers.replace(GeometryBuffers {
            vertex_buffer,
            index_buffer,
        }) {
            old.vertex_buffer.destroy();
            old.index_buffer.destroy();
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    pub fn dispose(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            buffers.vertex_buffer.destroy();
            buffers.index_buffer.destroy();
        }
        self.vertices = Vec::new();
        self.indices = Vec::new();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Which faces of a mesh get rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    color: [f32; 4],
}

/// Unlit surface description: a flat colour with optional transparency.
#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub color: [f32; 3],
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,
    uniform_buffer: Option<wgpu::Buffer>,
    disposed: bool,
}

impl Material {
    pub fn new(name: &str, color: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            color,
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
            uniform_buffer: None,
            disposed: false,
        }
    }

    /// Builds a material from a packed `0xRRGGBB` colour.
    pub fn from_hex(name: &str, hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(name, [channel(16), channel(8), channel(0)])
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn upload(&mut self, device: &wgpu::Device) {
        if self.disposed {
            log::warn!("refusing to upload disposed material {}", self.name);
            return;
        }
        let [r, g, b] = self.color;
        let uniform = MaterialUniform {
            color: [r, g, b, self.opacity],
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Material Buffer", self.name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        if let Some(old) = self.uniform_buffer.replace(buffer) {
            old.destroy();
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.uniform_buffer.is_some()
    }

    pub fn dispose(&mut self) {
        if let Some(buffer) = self.uniform_buffer.take() {
            buffer.destroy();
        }
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// A mesh references either one material or one per primitive group.
#[derive(Debug)]
pub enum MeshMaterial {
    Single(Material),
    Multiple(Vec<Material>),
}

impl MeshMaterial {
    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        match self {
            MeshMaterial::Single(material) => std::slice::from_ref(material).iter(),
            MeshMaterial::Multiple(materials) => materials.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Material> {
        match self {
            MeshMaterial::Single(material) => std::slice::from_mut(material).iter_mut(),
            MeshMaterial::Multiple(materials) => materials.iter_mut(),
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub geometry: Geometry,
    pub material: MeshMaterial,
}

impl Mesh {
    pub fn new(name: &str, geometry: Geometry, material: MeshMaterial) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            material,
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device) {
        self.geometry.upload(device);
        self.material
            .iter_mut()
            .for_each(|material| material.upload(device));
    }

    /// Releases the geometry and every referenced material.
    pub fn dispose(&mut self) {
        self.geometry.dispose();
        self.material.iter_mut().for_each(Material::dispose);
    }

    pub fn is_disposed(&self) -> bool {
        self.geometry.is_disposed() && self.material.iter().all(Material::is_disposed)
    }
}
