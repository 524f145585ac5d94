//! Pinhole intrinsics derived from the simulator's camera model.
//!
//! The simulator exposes a camera as a resolution plus a vertical field of
//! view. Square pixels are assumed, so a single focal length serves both
//! axes and the principal point sits at the image center.

use crate::messages::CameraInfo;
use crate::protocol::CameraRole;

/// Validated intrinsics for one camera role.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRecord {
    pub role: CameraRole,
    pub width: u32,
    pub height: u32,
    pub vertical_fov_deg: f64,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CalibrationRecord {
    /// Intrinsics from resolution and vertical FOV in degrees.
    pub fn from_fov(role: CameraRole, width: u32, height: u32, vertical_fov_deg: f64) -> Self {
        let f = (height as f64 / 2.0) / (vertical_fov_deg.to_radians() / 2.0).tan();
        Self {
            role,
            width,
            height,
            vertical_fov_deg,
            fx: f,
            fy: f,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }

    /// Stamped camera-info message for the given optical frame.
    pub fn to_camera_info(&self, frame_id: &str, stamp: f64) -> CameraInfo {
        CameraInfo {
            frame_id: frame_id.to_string(),
            height: self.height,
            width: self.width,
            fx: self.fx,
            fy: self.fy,
            cx: self.cx,
            cy: self.cy,
            stamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_focal_length_from_vertical_fov() {
        // 90 degree vertical FOV: tan(45) = 1, so f equals half the height.
        let cal = CalibrationRecord::from_fov(CameraRole::RgbLeft, 640, 480, 90.0);
        assert_relative_eq!(cal.fy, 240.0, epsilon = 1e-9);
        assert_relative_eq!(cal.fx, cal.fy, epsilon = 1e-12);
        assert_relative_eq!(cal.cx, 320.0, epsilon = 1e-12);
        assert_relative_eq!(cal.cy, 240.0, epsilon = 1e-12);
    }

    #[test]
    fn test_camera_info_carries_intrinsics() {
        let cal = CalibrationRecord::from_fov(CameraRole::RgbRight, 720, 480, 60.0);
        let info = cal.to_camera_info("right_cam", 2.5);
        assert_eq!(info.frame_id, "right_cam");
        assert_eq!(info.width, 720);
        assert_relative_eq!(info.fy, cal.fy, epsilon = 1e-12);
        let k = info.k_matrix();
        assert_relative_eq!(k[0], cal.fx, epsilon = 1e-12);
        assert_relative_eq!(k[5], cal.cy, epsilon = 1e-12);
        assert_relative_eq!(k[8], 1.0, epsilon = 1e-12);
    }
}
