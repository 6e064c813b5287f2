//! Scene graph and hierarchical scene organization.
//!
//! A scene is a tree of boxed `SceneNode`s. `ContainerNode`s only carry a
//! transform, `ModelNode`s additionally own a `Mesh`. Every node keeps its
//! local transform next to a cached world transform which is refreshed top
//! down by `update_world_transforms`.

use crate::data_structures::{instance::Instance, model::Mesh};

pub trait SceneNode: std::fmt::Debug {
    fn get_name(&self) -> &str;

    /// Index of the node inside the asset it was loaded from. Animation tracks
    /// target nodes through this index.
    fn get_index(&self) -> Option<usize>;

    fn get_local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Instance));

    fn get_world_transform(&self) -> &Instance;

    fn update_world_transforms(&mut self, parents_world_transform: &Instance);

    fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&Instance::default());
    }

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    fn get_mesh(&self) -> Option<&Mesh>;

    fn get_mesh_mut(&mut self) -> Option<&mut Mesh>;

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);
}

impl dyn SceneNode + '_ {
    /// Depth-first, pre-order walk over this node and all of its descendants.
    pub fn traverse(&self, f: &mut dyn FnMut(&dyn SceneNode)) {
        f(self);
        for child in self.get_children() {
            child.traverse(f);
        }
    }

    pub fn traverse_mut(&mut self, f: &mut dyn FnMut(&mut dyn SceneNode)) {
        f(&mut *self);
        for child in self.get_children_mut() {
            child.traverse_mut(f);
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&dyn SceneNode> {
        if self.get_name() == name {
            return Some(self);
        }
        self.get_children()
            .iter()
            .find_map(|child| child.find_by_name(name))
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |node| {
            if node.get_mesh().is_some() {
                count += 1;
            }
        });
        count
    }
}

#[derive(Debug)]
pub struct ContainerNode {
    pub name: String,
    pub index: Option<usize>,
    pub children: Vec<Box<dyn SceneNode>>,
    local: Instance,
    world: Instance,
    visible: bool,
}

impl ContainerNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            index: None,
            children: vec![],
            local: Instance::default(),
            world: Instance::default(),
            visible: true,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl SceneNode for ContainerNode {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_index(&self) -> Option<usize> {
        self.index
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        mutation(&mut self.local);
    }

    fn get_world_transform(&self) -> &Instance {
        &self.world
    }

    fn update_world_transforms(&mut self, parents_world_transform: &Instance) {
        self.world = parents_world_transform * &self.local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn get_mesh(&self) -> Option<&Mesh> {
        None
    }

    fn get_mesh_mut(&mut self) -> Option<&mut Mesh> {
        None
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }
}

#[derive(Debug)]
pub struct ModelNode {
    pub name: String,
    pub index: Option<usize>,
    children: Vec<Box<dyn SceneNode>>,
    mesh: Mesh,
    local: Instance,
    world: Instance,
    visible: bool,
}

impl ModelNode {
    pub fn new(name: &str, mesh: Mesh) -> Self {
        Self {
            name: name.to_string(),
            index: None,
            children: vec![],
            mesh,
            local: Instance::default(),
            world: Instance::default(),
            visible: true,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }
}

impl SceneNode for ModelNode {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_index(&self) -> Option<usize> {
        self.index
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        mutation(&mut self.local);
    }

    fn get_world_transform(&self) -> &Instance {
        &self.world
    }

    fn update_world_transforms(&mut self, parents_world_transform: &Instance) {
        self.world = parents_world_transform * &self.local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn get_mesh(&self) -> Option<&Mesh> {
        Some(&self.mesh)
    }

    fn get_mesh_mut(&mut self) -> Option<&mut Mesh> {
        Some(&mut self.mesh)
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }
}
