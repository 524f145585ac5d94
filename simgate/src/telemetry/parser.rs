//! Metadata parser
//!
//! The simulator reports agent state as an attribute-structured text blob:
//!
//! ```xml
//! <agent_metadata frame="agent">
//!   <position x="1.25" y="0.5" z="3.0"/>
//!   <quaternion x="0.0" y="0.0" z="0.0" w="1.0"/>
//!   <velocity x="0.1" y="0.0" z="0.0"/>
//!   <angular_velocity x="0.0" y="0.0" z="0.01"/>
//!   <time>4.25</time>
//!   <collision status="false"/>
//! </agent_metadata>
//! ```
//!
//! `time`, `position`, and `quaternion` are required; `velocity` and
//! `angular_velocity` are optional and their absence tells the transform
//! engine to derive rates by finite difference. Camera calibration blobs
//! use the same style:
//!
//! ```xml
//! <camera_info id="0" name="rgb_left">
//!   <parameters width="720" height="480" fov="60"/>
//! </camera_info>
//! ```

use nalgebra::{Quaternion as NaQuaternion, UnitQuaternion, Vector3};
use once_cell::sync::Lazy;
use regex::Regex;

use simgate_core::{GateError, GateResult};

/// One parsed metadata sample. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Simulation time in seconds, strictly increasing across samples
    pub time: f64,
    /// Position in the simulator's native world frame
    pub position: Vector3<f64>,
    /// Orientation of the native body frame in the native world frame
    pub orientation: UnitQuaternion<f64>,
    /// Linear velocity in the native body frame, if reported
    pub velocity: Option<Vector3<f64>>,
    /// Angular velocity in the native body frame, if reported
    pub angular_velocity: Option<Vector3<f64>>,
    /// Whether the agent is currently colliding
    pub collision: bool,
    /// Native frame id the sample was reported in
    pub frame_id: String,
}

/// A camera's resolved calibration as reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraInfoData {
    /// Wire id of the camera
    pub id: u32,
    pub width: u32,
    pub height: u32,
    /// Vertical field of view in degrees
    pub vertical_fov: f64,
}

static FRAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<agent_metadata\s+frame="([^"]+)""#).unwrap());
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<time>\s*([^<\s]+)\s*</time>").unwrap());
static POSITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<position\s+x="([^"]*)"\s+y="([^"]*)"\s+z="([^"]*)""#).unwrap()
});
static QUATERNION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<quaternion\s+x="([^"]*)"\s+y="([^"]*)"\s+z="([^"]*)"\s+w="([^"]*)""#).unwrap()
});
static VELOCITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<velocity\s+x="([^"]*)"\s+y="([^"]*)"\s+z="([^"]*)""#).unwrap()
});
static ANGULAR_VELOCITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<angular_velocity\s+x="([^"]*)"\s+y="([^"]*)"\s+z="([^"]*)""#).unwrap()
});
static COLLISION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<collision\s+status="([^"]+)""#).unwrap());

static CAMERA_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<camera_info\s+id="([^"]+)""#).unwrap());
static CAMERA_PARAMS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<parameters\s+width="([^"]*)"\s+height="([^"]*)"\s+fov="([^"]*)""#).unwrap()
});

fn field_f64(text: &str, field: &str) -> GateResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| GateError::malformed_metadata(format!("non-numeric {}: '{}'", field, text)))
        .and_then(|v| {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(GateError::malformed_metadata(format!(
                    "non-finite {}: '{}'",
                    field, text
                )))
            }
        })
}

fn field_u32(text: &str, field: &str) -> GateResult<u32> {
    text.trim().parse::<u32>().map_err(|_| {
        GateError::malformed_metadata(format!("non-integral {}: '{}'", field, text))
    })
}

fn vector_element(raw: &str, re: &Regex, element: &str) -> GateResult<Option<Vector3<f64>>> {
    match re.captures(raw) {
        None => Ok(None),
        Some(caps) => Ok(Some(Vector3::new(
            field_f64(&caps[1], element)?,
            field_f64(&caps[2], element)?,
            field_f64(&caps[3], element)?,
        ))),
    }
}

/// Parse a raw metadata blob into a [`TelemetryRecord`].
///
/// Fails with [`GateError::MalformedMetadata`] when a required field is
/// absent or non-numeric. No side effects.
pub fn parse_metadata(raw: &str) -> GateResult<TelemetryRecord> {
    let time = TIME_RE
        .captures(raw)
        .ok_or_else(|| GateError::malformed_metadata("missing <time> element"))
        .and_then(|caps| field_f64(&caps[1], "time"))?;

    let position = vector_element(raw, &POSITION_RE, "position")?
        .ok_or_else(|| GateError::malformed_metadata("missing <position> element"))?;

    let quat = QUATERNION_RE
        .captures(raw)
        .ok_or_else(|| GateError::malformed_metadata("missing <quaternion> element"))?;
    let orientation = UnitQuaternion::from_quaternion(NaQuaternion::new(
        field_f64(&quat[4], "quaternion.w")?,
        field_f64(&quat[1], "quaternion.x")?,
        field_f64(&quat[2], "quaternion.y")?,
        field_f64(&quat[3], "quaternion.z")?,
    ));

    let velocity = vector_element(raw, &VELOCITY_RE, "velocity")?;
    let angular_velocity = vector_element(raw, &ANGULAR_VELOCITY_RE, "angular_velocity")?;

    let collision = COLLISION_RE
        .captures(raw)
        .map(|caps| caps[1].eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let frame_id = FRAME_RE
        .captures(raw)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "agent".to_string());

    Ok(TelemetryRecord {
        time,
        position,
        orientation,
        velocity,
        angular_velocity,
        collision,
        frame_id,
    })
}

/// Parse a camera calibration blob into [`CameraInfoData`].
pub fn parse_camera_info(raw: &str) -> GateResult<CameraInfoData> {
    let id = CAMERA_ID_RE
        .captures(raw)
        .ok_or_else(|| GateError::malformed_metadata("missing camera_info id"))
        .and_then(|caps| {
            caps[1]
                .parse::<u32>()
                .map_err(|_| GateError::malformed_metadata("non-numeric camera id"))
        })?;

    let params = CAMERA_PARAMS_RE
        .captures(raw)
        .ok_or_else(|| GateError::malformed_metadata("missing camera <parameters> element"))?;
    let width = field_u32(&params[1], "camera width")?;
    let height = field_u32(&params[2], "camera height")?;
    let vertical_fov = field_f64(&params[3], "camera fov")?;

    Ok(CameraInfoData {
        id,
        width,
        height,
        vertical_fov,
    })
}
