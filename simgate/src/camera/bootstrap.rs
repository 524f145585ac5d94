//! Startup handshake that brings the simulator's cameras into a known state.
//!
//! The simulator boots with whatever camera setup the scene shipped with, so
//! before any imagery is trusted the bridge pushes its own parameters and
//! reads them back. The handshake is a linear state machine: intrinsics,
//! then position, then orientation, then a calibration query that must echo
//! the configured values. The simulator ignores requests while a scene is
//! still loading, so every phase retries until it gets a non-null answer,
//! with no backoff and no attempt cap.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use simgate_core::{GateError, GateResult};

use crate::messages::{Quaternion, Transform, TransformBatch, TransformStamped, Vector3};
use crate::protocol::{CameraRole, Request, Response, SimulatorClient};
use crate::telemetry::parse_camera_info;

use super::calibration::CalibrationRecord;

/// Camera setup shared by every role in the rig.
#[derive(Debug, Clone)]
pub struct RigSettings {
    pub width: u32,
    pub height: u32,
    pub vertical_fov_deg: f64,
    pub near_draw_dist: f64,
    pub far_draw_dist: f64,
    pub stereo_baseline: f64,
    pub body_frame_id: String,
    pub left_frame_id: String,
    pub right_frame_id: String,
}

/// Where the handshake currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    ConfiguringIntrinsics,
    ConfiguringPosition,
    ConfiguringOrientation,
    QueryingCalibration,
    Validated,
}

/// Output of a completed handshake.
#[derive(Debug, Clone)]
pub struct CameraRig {
    calibrations: HashMap<CameraRole, CalibrationRecord>,
    /// Left/right camera mounts relative to the body, broadcast once.
    pub static_transforms: TransformBatch,
}

impl CameraRig {
    /// Calibration for a role. Segmentation and depth render through the
    /// left camera and share its record.
    pub fn calibration(&self, role: CameraRole) -> &CalibrationRecord {
        let key = match role {
            CameraRole::RgbRight => CameraRole::RgbRight,
            _ => CameraRole::RgbLeft,
        };
        &self.calibrations[&key]
    }
}

/// Drives the camera handshake against a [`SimulatorClient`].
pub struct CameraBootstrap {
    settings: RigSettings,
    roles: Vec<CameraRole>,
    phase: BootstrapPhase,
    total_attempts: u32,
    calibrations: HashMap<CameraRole, CalibrationRecord>,
}

impl CameraBootstrap {
    pub fn new(settings: RigSettings, roles: Vec<CameraRole>) -> Self {
        Self {
            settings,
            roles,
            phase: BootstrapPhase::ConfiguringIntrinsics,
            total_attempts: 0,
            calibrations: HashMap::new(),
        }
    }

    pub fn phase(&self) -> BootstrapPhase {
        self.phase
    }

    /// Requests issued so far, including ignored ones.
    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    /// Run the current phase to completion and move to the next one.
    pub fn advance<C: SimulatorClient>(&mut self, client: &mut C) -> GateResult<BootstrapPhase> {
        match self.phase {
            BootstrapPhase::ConfiguringIntrinsics => {
                for role in self.roles.clone() {
                    self.acknowledge(
                        client,
                        &Request::SetCameraParameters {
                            role,
                            height: self.settings.height,
                            width: self.settings.width,
                            vertical_fov: self.settings.vertical_fov_deg,
                            near_draw_dist: self.settings.near_draw_dist,
                            far_draw_dist: self.settings.far_draw_dist,
                        },
                    );
                }
                self.phase = BootstrapPhase::ConfiguringPosition;
            }
            BootstrapPhase::ConfiguringPosition => {
                for role in self.roles.clone() {
                    let x = self.mount_offset(role);
                    self.acknowledge(
                        client,
                        &Request::SetCameraPosition {
                            role,
                            x,
                            y: 0.0,
                            z: 0.0,
                        },
                    );
                }
                self.phase = BootstrapPhase::ConfiguringOrientation;
            }
            BootstrapPhase::ConfiguringOrientation => {
                for role in self.roles.clone() {
                    self.acknowledge(
                        client,
                        &Request::SetCameraOrientation {
                            role,
                            x: 0.0,
                            y: 0.0,
                            z: 0.0,
                            w: 1.0,
                        },
                    );
                }
                self.phase = BootstrapPhase::QueryingCalibration;
            }
            BootstrapPhase::QueryingCalibration => {
                for role in [CameraRole::RgbLeft, CameraRole::RgbRight] {
                    let record = self.query_calibration(client, role)?;
                    self.calibrations.insert(role, record);
                }
                self.phase = BootstrapPhase::Validated;
                info!(attempts = self.total_attempts, "camera rig validated");
            }
            BootstrapPhase::Validated => {}
        }
        Ok(self.phase)
    }

    /// Drive all phases and hand back the validated rig.
    pub fn run<C: SimulatorClient>(mut self, client: &mut C) -> GateResult<CameraRig> {
        while self.phase != BootstrapPhase::Validated {
            self.advance(client)?;
        }
        Ok(CameraRig {
            static_transforms: self.static_transforms(),
            calibrations: self.calibrations,
        })
    }

    /// Horizontal mount offset of a role in the native frame. Segmentation
    /// and depth are co-located with the left camera.
    fn mount_offset(&self, role: CameraRole) -> f64 {
        match role {
            CameraRole::RgbRight => self.settings.stereo_baseline / 2.0,
            _ => -self.settings.stereo_baseline / 2.0,
        }
    }

    /// Issue a request until the simulator acknowledges it.
    fn acknowledge<C: SimulatorClient>(&mut self, client: &mut C, request: &Request) {
        loop {
            self.total_attempts += 1;
            match client.request(request) {
                Some(_) => return,
                None => debug!(?request, "no answer from simulator, retrying"),
            }
        }
    }

    fn query_calibration<C: SimulatorClient>(
        &mut self,
        client: &mut C,
        role: CameraRole,
    ) -> GateResult<CalibrationRecord> {
        let raw = loop {
            self.total_attempts += 1;
            match client.request(&Request::CameraInformation { role }) {
                Some(Response::CameraInformation { raw }) => break raw,
                Some(other) => {
                    warn!(%role, ?other, "unexpected calibration response, retrying");
                }
                None => debug!(%role, "no calibration answer, retrying"),
            }
        };
        let reported = parse_camera_info(&raw)?;
        if reported.id != role.index() {
            return Err(GateError::calibration_mismatch(format!(
                "asked camera {} about itself, camera {} answered",
                role.index(),
                reported.id
            )));
        }
        if reported.width == 0 || reported.height == 0 {
            return Err(GateError::calibration_mismatch(format!(
                "{role} reports degenerate resolution {}x{}",
                reported.width, reported.height
            )));
        }
        if reported.width != self.settings.width || reported.height != self.settings.height {
            return Err(GateError::calibration_mismatch(format!(
                "{role} settled at {}x{}, configured {}x{}",
                reported.width, reported.height, self.settings.width, self.settings.height
            )));
        }
        Ok(CalibrationRecord::from_fov(
            role,
            reported.width,
            reported.height,
            reported.vertical_fov,
        ))
    }

    /// Stereo mount transforms relative to the body frame. The handedness
    /// fix negates y, which is zero for a pure horizontal baseline, so the
    /// native offsets carry over unchanged.
    fn static_transforms(&self) -> TransformBatch {
        let mount = |frame_id: &str, x: f64| TransformStamped {
            frame_id: self.settings.body_frame_id.clone(),
            child_frame_id: frame_id.to_string(),
            transform: Transform {
                translation: Vector3 { x, y: 0.0, z: 0.0 },
                rotation: Quaternion::identity(),
            },
            stamp: 0.0,
        };
        TransformBatch {
            transforms: vec![
                mount(
                    &self.settings.left_frame_id,
                    -self.settings.stereo_baseline / 2.0,
                ),
                mount(
                    &self.settings.right_frame_id,
                    self.settings.stereo_baseline / 2.0,
                ),
            ],
        }
    }
}
