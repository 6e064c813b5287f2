//! Local and world transforms for scene nodes.
//!
//! An `Instance` is a decomposed affine transform: translation, rotation (as
//! quaternion) and non-uniform scale. Parent and child transforms are combined
//! with `*` the same way the scene graph combines them when world transforms
//! get refreshed.

use std::ops::Mul;

use cgmath::{EuclideanSpace, InnerSpace, One, Rad, Transform};
use serde::{Deserialize, Serialize};

/// Position, rotation and scale of a scene node.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Maps a point from this transform's local space into its parent space.
    pub fn transform_point(&self, point: cgmath::Point3<f32>) -> cgmath::Point3<f32> {
        self.to_matrix().transform_point(point)
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = (self.rotation * rhs.rotation).normalize();

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// Euler angles in radians, applied in X, Y, Z order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerRotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerRotation {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_quaternion(self) -> cgmath::Quaternion<f32> {
        cgmath::Quaternion::from(cgmath::Euler::new(Rad(self.x), Rad(self.y), Rad(self.z)))
    }
}

impl From<EulerRotation> for cgmath::Quaternion<f32> {
    fn from(rotation: EulerRotation) -> Self {
        rotation.to_quaternion()
    }
}

/// Lifts a plain `[x, y, z]` into a point, used where asset data is raw arrays.
pub(crate) fn point(p: [f32; 3]) -> cgmath::Point3<f32> {
    cgmath::Point3::from_vec(p.into())
}
