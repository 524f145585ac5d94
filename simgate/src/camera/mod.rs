//! Camera bring-up: intrinsics and the startup handshake.

mod bootstrap;
mod calibration;

pub use bootstrap::{BootstrapPhase, CameraBootstrap, CameraRig, RigSettings};
pub use calibration::CalibrationRecord;
