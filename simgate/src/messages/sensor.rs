// Sensor message types: IMU and odometry

use serde::{Deserialize, Serialize};

use super::geometry::{Pose, Quaternion, Twist, Vector3};

/// Inertial measurement in the body frame.
///
/// `linear_acceleration` is a specific-force reading: the derived body
/// acceleration plus gravity rotated into the body frame, matching what a
/// physical IMU would report.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Imu {
    /// Body frame this measurement is expressed in
    pub frame_id: String,
    /// Orientation of the body frame in the world frame
    pub orientation: Quaternion,
    /// Angular velocity in rad/s, body frame
    pub angular_velocity: Vector3,
    /// Specific force in m/s², body frame
    pub linear_acceleration: Vector3,
    /// Simulated seconds
    pub stamp: f64,
}

impl Imu {
    pub fn is_valid(&self) -> bool {
        self.orientation.is_valid()
            && self.angular_velocity.is_valid()
            && self.linear_acceleration.is_valid()
            && self.stamp.is_finite()
    }
}

/// Ground-truth odometry: pose in the world frame, twist in the body frame.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Odometry {
    /// World frame of the pose
    pub frame_id: String,
    /// Body frame of the twist
    pub child_frame_id: String,
    pub pose: Pose,
    pub twist: Twist,
    /// Simulated seconds
    pub stamp: f64,
}

impl Odometry {
    pub fn is_valid(&self) -> bool {
        self.pose.is_valid() && self.twist.is_valid() && self.stamp.is_finite()
    }
}
