//! Frame synthesizer
//!
//! Pure mapping from one [`ProcessedTelemetry`] sample (plus static frame-id
//! configuration) to the bus messages that carry it: IMU, odometry, and the
//! body-in-world transform. Also owns the imagery encoding rule, which is
//! coupled to the camera role: depth frames are scaled by the far draw
//! distance into metric meters, single-channel frames become `Mono8`,
//! three-channel frames become `Rgb8`.

use nalgebra::Vector3 as NaVector3;

use simgate_core::{GateError, GateResult};

use crate::camera::CalibrationRecord;
use crate::messages::{
    Image, ImageEncoding, Imu, Odometry, Pose, Transform, TransformStamped, Twist,
};
use crate::protocol::{CameraSelection, ChannelCount, PixelBuffer, RawFrame};

use super::transform::ProcessedTelemetry;

/// Standard gravity, m/s², applied along ENU up.
pub const GRAVITY: f64 = 9.81;

/// IMU message for one processed sample.
///
/// The accelerometer reading is specific force: derived body acceleration
/// plus gravity rotated into the body frame.
pub fn imu_message(processed: &ProcessedTelemetry, stamp: f64, body_frame_id: &str) -> Imu {
    let rotation = processed.rotation();
    let gravity_body = rotation.inverse() * NaVector3::new(0.0, 0.0, GRAVITY);
    Imu {
        frame_id: body_frame_id.to_string(),
        orientation: (&rotation).into(),
        angular_velocity: processed.angular_velocity.into(),
        linear_acceleration: (processed.acceleration + gravity_body).into(),
        stamp,
    }
}

/// Ground-truth odometry: pose in the world frame, twist in the body frame.
pub fn odometry_message(
    processed: &ProcessedTelemetry,
    stamp: f64,
    world_frame_id: &str,
    body_frame_id: &str,
) -> Odometry {
    Odometry {
        frame_id: world_frame_id.to_string(),
        child_frame_id: body_frame_id.to_string(),
        pose: Pose {
            position: processed.translation().into(),
            orientation: (&processed.rotation()).into(),
        },
        twist: Twist {
            linear: processed.velocity.into(),
            angular: processed.angular_velocity.into(),
        },
        stamp,
    }
}

/// Body-in-world transform broadcast for one ENU-from-body pose.
pub fn transform_message(
    enu_from_body: &nalgebra::Matrix4<f64>,
    stamp: f64,
    world_frame_id: &str,
    body_frame_id: &str,
) -> TransformStamped {
    let translation = enu_from_body.fixed_view::<3, 1>(0, 3).into_owned();
    let rotation = nalgebra::UnitQuaternion::from_rotation_matrix(
        &nalgebra::Rotation3::from_matrix_unchecked(
            enu_from_body.fixed_view::<3, 3>(0, 0).into_owned(),
        ),
    );
    TransformStamped {
        frame_id: world_frame_id.to_string(),
        child_frame_id: body_frame_id.to_string(),
        transform: Transform {
            translation: translation.into(),
            rotation: (&rotation).into(),
        },
        stamp,
    }
}

/// Encode one raw simulator frame as a bus image message.
///
/// The declared resolution must equal the calibration record's resolution;
/// a mismatch means the node and the simulator have desynchronized and is a
/// fatal [`GateError::CalibrationMismatch`], not a recoverable condition.
pub fn image_message(
    frame: &RawFrame,
    selection: &CameraSelection,
    calibration: &CalibrationRecord,
    far_draw_dist: f64,
    stamp: f64,
    frame_id: &str,
) -> GateResult<Image> {
    if frame.width != calibration.width || frame.height != calibration.height {
        return Err(GateError::calibration_mismatch(format!(
            "{} frame is {}x{}, calibration says {}x{}",
            selection.role, frame.width, frame.height, calibration.width, calibration.height,
        )));
    }

    let pixel_count = (frame.width * frame.height) as usize;
    let (encoding, data) = if selection.role.is_depth() {
        let PixelBuffer::Floats(raw) = &frame.pixels else {
            return Err(GateError::invalid_input(format!(
                "{} frame carries byte pixels, expected normalized floats",
                selection.role
            )));
        };
        expect_len(raw.len(), pixel_count, selection)?;
        // Normalized [0, 1] depth times the far draw distance gives meters.
        let metric: Vec<f32> = raw.iter().map(|d| d * far_draw_dist as f32).collect();
        (
            ImageEncoding::Depth32F,
            bytemuck::cast_slice(&metric).to_vec(),
        )
    } else {
        let PixelBuffer::Bytes(raw) = &frame.pixels else {
            return Err(GateError::invalid_input(format!(
                "{} frame carries float pixels, expected bytes",
                selection.role
            )));
        };
        match selection.channels {
            ChannelCount::Single => {
                expect_len(raw.len(), pixel_count, selection)?;
                (ImageEncoding::Mono8, raw.clone())
            }
            ChannelCount::Three => {
                expect_len(raw.len(), pixel_count * 3, selection)?;
                (ImageEncoding::Rgb8, raw.clone())
            }
        }
    };

    Ok(Image {
        frame_id: frame_id.to_string(),
        height: frame.height,
        width: frame.width,
        encoding,
        data,
        stamp,
    })
}

fn expect_len(got: usize, expected: usize, selection: &CameraSelection) -> GateResult<()> {
    if got == expected {
        Ok(())
    } else {
        Err(GateError::invalid_input(format!(
            "{} payload holds {} pixels, expected {}",
            selection.role, got, expected
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CameraRole, Compression};
    use crate::telemetry::{TelemetryRecord, TransformEngine};
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    fn processed() -> ProcessedTelemetry {
        let mut engine = TransformEngine::new();
        let record = TelemetryRecord {
            time: 1.0,
            position: Vector3::new(1.0, 2.0, 3.0),
            orientation: UnitQuaternion::identity(),
            velocity: Some(Vector3::new(0.5, 0.0, 0.0)),
            angular_velocity: Some(Vector3::zeros()),
            collision: false,
            frame_id: "agent".into(),
        };
        engine.update(&record).unwrap()
    }

    fn selection(role: CameraRole, channels: ChannelCount) -> CameraSelection {
        CameraSelection {
            role,
            compression: Compression::Off,
            channels,
        }
    }

    fn calibration(width: u32, height: u32) -> CalibrationRecord {
        CalibrationRecord::from_fov(CameraRole::RgbLeft, width, height, 60.0)
    }

    #[test]
    fn test_imu_includes_gravity() {
        let imu = imu_message(&processed(), 1.0, "base_link_gt");
        assert_eq!(imu.frame_id, "base_link_gt");
        // At identity yaw the body z axis is not world up in this
        // convention, so gravity lands on the body y axis.
        let g = Vector3::new(
            imu.linear_acceleration.x,
            imu.linear_acceleration.y,
            imu.linear_acceleration.z,
        );
        // acceleration part: (0.5 - 0)/1.0 along body x
        assert_relative_eq!(g.x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(g.norm(), (0.5f64.powi(2) + GRAVITY.powi(2)).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_odometry_frames_and_pose() {
        let odom = odometry_message(&processed(), 0.5, "world", "base_link_gt");
        assert_eq!(odom.frame_id, "world");
        assert_eq!(odom.child_frame_id, "base_link_gt");
        // Native (1, 2, 3) with y up becomes ENU (1, 3, 2)
        assert_relative_eq!(odom.pose.position.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(odom.pose.position.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(odom.pose.position.z, 2.0, epsilon = 1e-12);
        assert_relative_eq!(odom.twist.linear.x, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_message_round_trip() {
        let p = processed();
        let tf = transform_message(&p.enu_from_body, 0.5, "world", "base_link_gt");
        assert_eq!(tf.frame_id, "world");
        assert_eq!(tf.child_frame_id, "base_link_gt");
        assert_relative_eq!(tf.transform.translation.y, 3.0, epsilon = 1e-12);
        let q: nalgebra::UnitQuaternion<f64> = tf.transform.rotation.into();
        assert_relative_eq!(
            (q.to_rotation_matrix().matrix()
                - p.enu_from_body.fixed_view::<3, 3>(0, 0).into_owned())
            .norm(),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_depth_scaled_to_meters() {
        let frame = RawFrame {
            height: 2,
            width: 2,
            channels: 1,
            pixels: PixelBuffer::Floats(vec![0.0, 0.25, 0.5, 1.0]),
        };
        let img = image_message(
            &frame,
            &selection(CameraRole::Depth, ChannelCount::Three),
            &calibration(2, 2),
            50.0,
            1.0,
            "left_cam",
        )
        .unwrap();
        assert_eq!(img.encoding, ImageEncoding::Depth32F);
        let meters: &[f32] = bytemuck::cast_slice(&img.data);
        assert_eq!(meters, &[0.0, 12.5, 25.0, 50.0]);
    }

    #[test]
    fn test_channel_count_selects_encoding() {
        let mono = RawFrame {
            height: 2,
            width: 2,
            channels: 1,
            pixels: PixelBuffer::Bytes(vec![9; 4]),
        };
        let img = image_message(
            &mono,
            &selection(CameraRole::RgbLeft, ChannelCount::Single),
            &calibration(2, 2),
            50.0,
            1.0,
            "left_cam",
        )
        .unwrap();
        assert_eq!(img.encoding, ImageEncoding::Mono8);

        let rgb = RawFrame {
            height: 2,
            width: 2,
            channels: 3,
            pixels: PixelBuffer::Bytes(vec![9; 12]),
        };
        let img = image_message(
            &rgb,
            &selection(CameraRole::Segmentation, ChannelCount::Three),
            &calibration(2, 2),
            50.0,
            1.0,
            "left_cam",
        )
        .unwrap();
        assert_eq!(img.encoding, ImageEncoding::Rgb8);
        assert!(img.is_valid());
    }

    #[test]
    fn test_resolution_mismatch_is_fatal() {
        let frame = RawFrame {
            height: 4,
            width: 2,
            channels: 3,
            pixels: PixelBuffer::Bytes(vec![0; 24]),
        };
        let err = image_message(
            &frame,
            &selection(CameraRole::RgbLeft, ChannelCount::Three),
            &calibration(2, 2),
            50.0,
            1.0,
            "left_cam",
        )
        .unwrap_err();
        assert!(err.is_calibration_mismatch());
        assert!(err.is_fatal());
    }
}
