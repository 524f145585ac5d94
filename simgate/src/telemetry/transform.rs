//! Frame transform engine
//!
//! Converts a native body-frame pose into an ENU-aligned world pose and
//! derives missing rates by finite difference. The simulator's world frame
//! is left-handed with y up; the published world frame is right-handed ENU
//! with z up. Two fixed change-of-basis matrices bridge the gap:
//!
//! - world: swap the y and z axes (`ENU_FROM_NATIVE`)
//! - body: negate the y axis (`RH_FROM_LH`)
//!
//! Both have determinant -1; their product with a native rotation is a
//! proper rotation again. The accumulated rotation is re-orthonormalized on
//! every update so floating drift cannot build up over long sessions.

use nalgebra::{Isometry3, Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3};

use simgate_core::{GateError, GateResult};

use super::parser::TelemetryRecord;

/// Change of basis from the native left-handed y-up world frame to ENU.
#[rustfmt::skip]
fn enu_from_native() -> Matrix3<f64> {
    Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, 0.0, 1.0,
        0.0, 1.0, 0.0,
    )
}

/// Handedness fix from the native left-handed body frame to the published
/// right-handed body frame.
#[rustfmt::skip]
fn rh_from_lh() -> Matrix3<f64> {
    Matrix3::new(
        1.0,  0.0, 0.0,
        0.0, -1.0, 0.0,
        0.0,  0.0, 1.0,
    )
}

/// ENU-from-body rotation for one record, re-orthonormalized.
fn enu_rotation(orientation: &UnitQuaternion<f64>) -> Rotation3<f64> {
    let composed = enu_from_native() * orientation.to_rotation_matrix().matrix() * rh_from_lh();
    // The product is proper (det +1); from_matrix snaps it back onto SO(3).
    Rotation3::from_matrix(&composed)
}

/// State carried between telemetry updates. Mutated exactly once per
/// accepted update, never reset after construction.
#[derive(Debug, Clone)]
pub struct TransformState {
    /// Time of the last accepted update; strictly increases
    pub previous_time: f64,
    /// Last body-frame linear velocity
    pub previous_velocity: Vector3<f64>,
    /// Last ENU-from-body rotation
    pub previous_rotation: Rotation3<f64>,
    /// Last ENU position, needed for position differencing
    pub previous_position: Vector3<f64>,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            previous_time: 0.0,
            previous_velocity: Vector3::zeros(),
            previous_rotation: Rotation3::identity(),
            previous_position: Vector3::zeros(),
        }
    }
}

/// One normalized telemetry sample, ready for message synthesis.
#[derive(Debug, Clone)]
pub struct ProcessedTelemetry {
    /// Simulation time in seconds
    pub time: f64,
    /// ENU-from-body homogeneous transform
    pub enu_from_body: Matrix4<f64>,
    /// Linear velocity in the body frame
    pub velocity: Vector3<f64>,
    /// Angular velocity in the body frame
    pub angular_velocity: Vector3<f64>,
    /// Linear acceleration in the body frame (finite difference of velocity)
    pub acceleration: Vector3<f64>,
    /// Collision flag carried through from the record
    pub collision: bool,
}

impl ProcessedTelemetry {
    /// Translation part of the world pose
    pub fn translation(&self) -> Vector3<f64> {
        self.enu_from_body.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Rotation part of the world pose
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        let r = self.enu_from_body.fixed_view::<3, 3>(0, 0).into_owned();
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r))
    }
}

/// Stateful transform engine. Owns the [`TransformState`] for the lifetime
/// of the node; callers serialize access (the bridge node is the single
/// mutual-exclusion domain around it).
#[derive(Debug, Default)]
pub struct TransformEngine {
    state: TransformState,
}

impl TransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TransformState {
        &self.state
    }

    /// Accept one telemetry record.
    ///
    /// Rejects non-advancing time with [`GateError::TemporalRegression`];
    /// that is a fatal precondition violation, not a recoverable condition,
    /// because every downstream consumer assumes monotonic time. On success
    /// the state's previous-* fields are replaced by this record's values.
    pub fn update(&mut self, record: &TelemetryRecord) -> GateResult<ProcessedTelemetry> {
        let (processed, next) = step(record, &self.state)?;
        self.state = next;
        Ok(processed)
    }

    /// Stateless ENU-from-body pose for one record.
    ///
    /// Used by the imagery path for the ground-truth transform; does not
    /// touch the engine state.
    pub fn world_pose(record: &TelemetryRecord) -> Matrix4<f64> {
        let rotation = enu_rotation(&record.orientation);
        let position = enu_from_native() * record.position;
        homogeneous(&rotation, &position)
    }
}

fn homogeneous(rotation: &Rotation3<f64>, position: &Vector3<f64>) -> Matrix4<f64> {
    let iso = Isometry3::from_parts(
        Translation3::from(*position),
        UnitQuaternion::from_rotation_matrix(rotation),
    );
    iso.to_homogeneous()
}

/// Pure update step: one record plus the prior state yields the processed
/// sample and the successor state.
fn step(
    record: &TelemetryRecord,
    state: &TransformState,
) -> GateResult<(ProcessedTelemetry, TransformState)> {
    if record.time <= state.previous_time {
        return Err(GateError::TemporalRegression {
            previous: state.previous_time,
            current: record.time,
        });
    }
    // dt > 0 by the check above; no further guard needed below.
    let dt = record.time - state.previous_time;

    let rotation = enu_rotation(&record.orientation);
    let position = enu_from_native() * record.position;

    let velocity = match record.velocity {
        Some(native) => rh_from_lh() * native,
        None => {
            // First-order difference of ENU position, rotated into the body.
            let world = (position - state.previous_position) / dt;
            rotation.inverse() * world
        }
    };

    let angular_velocity = match record.angular_velocity {
        Some(native) => rh_from_lh() * native,
        None => {
            // Relative rotation since the last sample, as an axis-rate.
            let relative = state.previous_rotation.inverse() * rotation;
            relative.scaled_axis() / dt
        }
    };

    let acceleration = (velocity - state.previous_velocity) / dt;

    let processed = ProcessedTelemetry {
        time: record.time,
        enu_from_body: homogeneous(&rotation, &position),
        velocity,
        angular_velocity,
        acceleration,
        collision: record.collision,
    };
    let next = TransformState {
        previous_time: record.time,
        previous_velocity: velocity,
        previous_rotation: rotation,
        previous_position: position,
    };
    Ok((processed, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Quaternion as NaQuaternion;

    fn record(time: f64, position: Vector3<f64>) -> TelemetryRecord {
        TelemetryRecord {
            time,
            position,
            orientation: UnitQuaternion::identity(),
            velocity: None,
            angular_velocity: None,
            collision: false,
            frame_id: "agent".into(),
        }
    }

    #[test]
    fn test_time_must_advance() {
        let mut engine = TransformEngine::new();
        engine.update(&record(1.0, Vector3::zeros())).unwrap();

        let err = engine.update(&record(1.0, Vector3::zeros())).unwrap_err();
        assert!(err.is_temporal_regression());
        let err = engine.update(&record(0.5, Vector3::zeros())).unwrap_err();
        assert!(err.is_temporal_regression());

        // State is untouched by rejected updates
        assert_eq!(engine.state().previous_time, 1.0);
    }

    #[test]
    fn test_state_time_strictly_increases() {
        let mut engine = TransformEngine::new();
        let mut last = engine.state().previous_time;
        for i in 1..50 {
            let t = i as f64 * 0.005;
            engine.update(&record(t, Vector3::zeros())).unwrap();
            assert!(engine.state().previous_time > last);
            last = engine.state().previous_time;
        }
    }

    #[test]
    fn test_finite_difference_velocity_straight_line() {
        // spec scenario: 1 m of native-x travel over dt = 0.05 s
        let mut engine = TransformEngine::new();
        engine.update(&record(1.0, Vector3::zeros())).unwrap();
        let processed = engine
            .update(&record(1.05, Vector3::new(1.0, 0.0, 0.0)))
            .unwrap();
        assert_relative_eq!(processed.velocity, Vector3::new(20.0, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_finite_difference_converges_with_dt() {
        // Constant native velocity (2, 0, 1): the derived rate is exact for
        // this trajectory at any dt, and stays put as dt shrinks.
        let truth = Vector3::new(2.0, 0.0, 1.0);
        for dt in [0.1, 0.01, 0.001] {
            let mut engine = TransformEngine::new();
            let mut t = 0.5;
            engine.update(&record(t, truth * t)).unwrap();
            let mut worst: f64 = 0.0;
            for _ in 0..10 {
                t += dt;
                let processed = engine.update(&record(t, truth * t)).unwrap();
                // For a y-free native velocity the handedness fix is a no-op,
                // so differencing must recover the native rate exactly.
                worst = worst.max((processed.velocity - truth).norm());
            }
            assert!(worst < 1e-6, "dt={} worst={}", dt, worst);
        }
    }

    #[test]
    fn test_reported_velocity_bypasses_differencing() {
        let mut engine = TransformEngine::new();
        let mut rec = record(0.1, Vector3::zeros());
        rec.velocity = Some(Vector3::new(1.0, 2.0, 3.0));
        let processed = engine.update(&rec).unwrap();
        // Handedness fix negates the body y component
        assert_relative_eq!(processed.velocity, Vector3::new(1.0, -2.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_angular_rate_from_rotation_difference() {
        // Yaw about the native up axis appears as a pure body-y rate.
        let mut engine = TransformEngine::new();
        engine.update(&record(1.0, Vector3::zeros())).unwrap();

        let dt = 0.05;
        let yaw = 0.02; // rad over dt
        let mut rec = record(1.0 + dt, Vector3::zeros());
        rec.orientation =
            UnitQuaternion::from_axis_angle(&nalgebra::Vector3::y_axis(), yaw);
        let processed = engine.update(&rec).unwrap();

        assert_relative_eq!(processed.angular_velocity.y.abs(), yaw / dt, epsilon = 1e-9);
        assert_relative_eq!(processed.angular_velocity.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(processed.angular_velocity.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rotation_stays_orthonormal() {
        let mut engine = TransformEngine::new();
        let mut t = 0.0;
        for i in 0..500 {
            t += 0.01;
            let angle = 0.37 * i as f64;
            let axis = nalgebra::Unit::new_normalize(Vector3::new(
                (i as f64).sin(),
                1.0,
                (i as f64 * 0.3).cos(),
            ));
            let mut rec = record(t, Vector3::new(t, 0.0, -t));
            rec.orientation = UnitQuaternion::from_axis_angle(&axis, angle);
            engine.update(&rec).unwrap();
        }
        let r = engine.state().previous_rotation;
        let gram = r.matrix() * r.matrix().transpose();
        assert_relative_eq!(gram, Matrix3::identity(), epsilon = 1e-9);
    }

    #[test]
    fn test_world_pose_matches_update_pose() {
        let mut rec = record(2.0, Vector3::new(0.5, 1.0, -2.0));
        rec.orientation = UnitQuaternion::from_quaternion(NaQuaternion::new(0.9, 0.1, 0.2, 0.3));

        let stateless = TransformEngine::world_pose(&rec);
        let mut engine = TransformEngine::new();
        let processed = engine.update(&rec).unwrap();
        assert_relative_eq!(stateless, processed.enu_from_body, epsilon = 1e-12);
    }

    #[test]
    fn test_position_maps_to_enu() {
        // Native y is up; it must come out as ENU z.
        let rec = record(1.0, Vector3::new(0.0, 3.0, 0.0));
        let pose = TransformEngine::world_pose(&rec);
        assert_relative_eq!(pose[(2, 3)], 3.0, epsilon = 1e-12);
        assert_relative_eq!(pose[(1, 3)], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_acceleration_finite_difference() {
        let mut engine = TransformEngine::new();
        let mut rec = record(1.0, Vector3::zeros());
        rec.velocity = Some(Vector3::new(1.0, 0.0, 0.0));
        engine.update(&rec).unwrap();

        let mut rec = record(1.5, Vector3::zeros());
        rec.velocity = Some(Vector3::new(2.0, 0.0, 0.0));
        let processed = engine.update(&rec).unwrap();
        assert_relative_eq!(
            processed.acceleration,
            Vector3::new(2.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }
}
