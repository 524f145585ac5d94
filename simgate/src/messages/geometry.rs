// Geometric and spatial message types
//
// Fundamental primitives for representing position, orientation, and motion
// on the bus. Fixed-layout types are POD so they can cross zero-copy
// transports unchanged.

use serde::{Deserialize, Serialize};

/// 3D vector
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Check if all components are finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<nalgebra::Vector3<f64>> for Vector3 {
    fn from(v: nalgebra::Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for nalgebra::Vector3<f64> {
    fn from(v: Vector3) -> Self {
        nalgebra::Vector3::new(v.x, v.y, v.z)
    }
}

/// Quaternion for 3D rotation representation, `[x, y, z, w]` convention
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Check that components are finite and the norm is close to one
    pub fn is_valid(&self) -> bool {
        let finite = self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
            && self.w.is_finite();
        finite && (self.norm() - 1.0).abs() < 0.01
    }
}

impl From<&nalgebra::UnitQuaternion<f64>> for Quaternion {
    fn from(q: &nalgebra::UnitQuaternion<f64>) -> Self {
        let c = q.quaternion().coords;
        Self::new(c.x, c.y, c.z, c.w)
    }
}

impl From<Quaternion> for nalgebra::UnitQuaternion<f64> {
    fn from(q: Quaternion) -> Self {
        nalgebra::UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(q.w, q.x, q.y, q.z))
    }
}

/// 3D pose (position and orientation)
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Pose {
    pub position: Vector3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Vector3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.position.is_valid() && self.orientation.is_valid()
    }
}

/// Linear and angular velocity
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Twist {
    /// Linear velocity [x, y, z] in m/s
    pub linear: Vector3,
    /// Angular velocity [roll, pitch, yaw] rates in rad/s
    pub angular: Vector3,
}

impl Twist {
    pub fn new(linear: Vector3, angular: Vector3) -> Self {
        Self { linear, angular }
    }

    pub fn is_valid(&self) -> bool {
        self.linear.is_valid() && self.angular.is_valid()
    }
}

/// Unstamped 3D transformation (translation and rotation)
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Transform {
    pub translation: Vector3,
    pub rotation: Quaternion,
}

impl Transform {
    pub fn identity() -> Self {
        Self::default()
    }
}

/// A transform between two named frames at a point in simulated time
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TransformStamped {
    /// Parent frame
    pub frame_id: String,
    /// Child frame
    pub child_frame_id: String,
    pub transform: Transform,
    /// Simulated seconds
    pub stamp: f64,
}

/// A batch of transforms broadcast together.
///
/// Static transforms in particular must go out as one batch: broadcasting
/// them one at a time lets a second message overwrite the first on latched
/// transports.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TransformBatch {
    pub transforms: Vec<TransformStamped>,
}

// POD support for fixed-layout types: all-f64 fields, no padding.
unsafe impl bytemuck::Pod for Vector3 {}
unsafe impl bytemuck::Zeroable for Vector3 {}

unsafe impl bytemuck::Pod for Quaternion {}
unsafe impl bytemuck::Zeroable for Quaternion {}

unsafe impl bytemuck::Pod for Pose {}
unsafe impl bytemuck::Zeroable for Pose {}

unsafe impl bytemuck::Pod for Twist {}
unsafe impl bytemuck::Zeroable for Twist {}

unsafe impl bytemuck::Pod for Transform {}
unsafe impl bytemuck::Zeroable for Transform {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quaternion_identity_is_valid() {
        assert!(Quaternion::identity().is_valid());
        assert!(!Quaternion::new(0.0, 0.0, 0.0, 0.5).is_valid());
    }

    #[test]
    fn test_quaternion_nalgebra_round_trip() {
        let q = Quaternion::new(0.0, 0.0, 0.7071067811865476, 0.7071067811865476);
        let unit: nalgebra::UnitQuaternion<f64> = q.into();
        let back: Quaternion = (&unit).into();
        assert!((back.z - q.z).abs() < 1e-12);
        assert!((back.w - q.w).abs() < 1e-12);
    }

    #[test]
    fn test_vector_validity() {
        assert!(Vector3::new(1.0, 2.0, 3.0).is_valid());
        assert!(!Vector3::new(f64::NAN, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_pod_cast() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 24);
        let back: &Vector3 = bytemuck::from_bytes(bytes);
        assert_eq!(*back, v);
    }
}
