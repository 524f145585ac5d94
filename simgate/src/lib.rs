//! # SIMGATE
//!
//! Bridges a remote 3D simulator's proprietary protocol onto a robotics
//! message bus: raw metadata blobs become IMU, odometry, and transform
//! messages in a consistent ENU world frame, and the simulator's cameras are
//! configured and validated before a single image is streamed.
//!
//! The pipeline, leaf first:
//!
//! - [`telemetry::parser`] — raw metadata blob → typed [`TelemetryRecord`]
//! - [`telemetry::transform`] — native body pose → ENU world pose, with
//!   finite-difference rates when the source withholds them
//! - [`telemetry::synthesizer`] — processed telemetry → bus messages
//! - [`camera`] — retry-until-acknowledged camera bootstrap and calibration
//! - [`streaming`] — duplicate-frame suppression for the imagery pull
//! - [`node`] — the bridge node wiring everything to a [`SimulatorClient`]
//!
//! [`TelemetryRecord`]: telemetry::TelemetryRecord
//! [`SimulatorClient`]: protocol::SimulatorClient

pub mod camera;
pub mod config;
pub mod messages;
pub mod node;
pub mod protocol;
pub mod streaming;
pub mod telemetry;

pub use camera::{BootstrapPhase, CalibrationRecord, CameraBootstrap, CameraRig};
pub use config::BridgeConfig;
pub use node::BridgeNode;
pub use protocol::{CameraRole, SimulatorClient};
pub use streaming::{DedupGuard, FrameDecision};
pub use telemetry::{ProcessedTelemetry, TelemetryRecord, TransformEngine};

// Re-export the core crate so downstream users need only one dependency.
pub use simgate_core as core;
pub use simgate_core::{GateError, GateResult, Hub};
