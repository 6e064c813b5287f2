//! Axis-aligned bounding boxes.

use cgmath::{EuclideanSpace, Point3, Vector3};

use crate::data_structures::scene_graph::SceneNode;

/// An axis-aligned box. The empty box has `min > max` on every axis and
/// contains no point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(point1: Point3<f32>, point2: Point3<f32>) -> Self {
        let min = Point3::new(
            point1.x.min(point2.x),
            point1.y.min(point2.y),
            point1.z.min(point2.z),
        );
        let max = Point3::new(
            point1.x.max(point2.x),
            point1.y.max(point2.y),
            point1.z.max(point2.z),
        );
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn make_empty(&mut self) {
        *self = Self::empty();
    }

    pub fn expand_by_point(&mut self, point: Point3<f32>) {
        self.min = Point3::new(
            self.min.x.min(point.x),
            self.min.y.min(point.y),
            self.min.z.min(point.z),
        );
        self.max = Point3::new(
            self.max.x.max(point.x),
            self.max.y.max(point.y),
            self.max.z.max(point.z),
        );
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        [
            Point3::new(self.min.x, self.min.y, self.min.z),
            Point3::new(self.max.x, self.min.y, self.min.z),
            Point3::new(self.min.x, self.max.y, self.min.z),
            Point3::new(self.max.x, self.max.y, self.min.z),
            Point3::new(self.min.x, self.min.y, self.max.z),
            Point3::new(self.max.x, self.min.y, self.max.z),
            Point3::new(self.min.x, self.max.y, self.max.z),
            Point3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Recomputes the box from the world-space extent of every mesh below
    /// `node`. World transforms must be current.
    pub fn set_from_node(&mut self, node: &dyn SceneNode) {
        self.make_empty();
        node.traverse(&mut |node| {
            let Some(mesh) = node.get_mesh() else {
                return;
            };
            let local = mesh.geometry.bounding_box();
            if local.is_empty() {
                return;
            }
            let world = node.get_world_transform();
            for corner in local.corners() {
                self.expand_by_point(world.transform_point(corner));
            }
        });
    }

    pub fn from_node(node: &dyn SceneNode) -> Self {
        let mut aabb = Self::empty();
        aabb.set_from_node(node);
        aabb
    }

    /// Zero for the empty box.
    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::new(0.0, 0.0, 0.0);
        }
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        if self.is_empty() {
            return Point3::origin();
        }
        self.min.midpoint(self.max)
    }

    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
