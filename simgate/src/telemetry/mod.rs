//! Telemetry normalization pipeline
//!
//! Raw metadata blob → [`TelemetryRecord`] → [`ProcessedTelemetry`] → bus
//! messages. The parser is stateless, the transform engine is the only
//! stateful stage, and the synthesizer is pure again.

pub mod parser;
pub mod synthesizer;
pub mod transform;

pub use parser::{parse_camera_info, parse_metadata, CameraInfoData, TelemetryRecord};
pub use transform::{ProcessedTelemetry, TransformEngine, TransformState};
