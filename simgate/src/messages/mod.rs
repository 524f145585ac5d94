// Message types published by the SIMGATE bridge
//
// These are the bus-facing shapes of the bridge's output. They are organized
// by domain:
// - Geometry: spatial primitives (Vector3, Quaternion, Pose, Twist, tf)
// - Sensor: Imu and Odometry
// - Vision: Image and CameraInfo
// - Timing: the simulated clock
//
// All message types are re-exported at this module's root for convenience.
// Timestamps are simulated seconds (already divided by the speedup factor),
// carried as f64 like the simulator's own clock.

pub mod geometry;
pub mod sensor;
pub mod timing;
pub mod vision;

pub use geometry::{Pose, Quaternion, Transform, TransformBatch, TransformStamped, Twist, Vector3};
pub use sensor::{Imu, Odometry};
pub use timing::Clock;
pub use vision::{CameraInfo, Image, ImageEncoding};
