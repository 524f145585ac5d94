//! Simulator protocol surface
//!
//! The transport/session to the simulator is an external collaborator; the
//! bridge only sees the [`SimulatorClient`] trait. Requests carry a typed
//! command and yield `Some(response)` or `None` when the simulator did not
//! answer (still initializing, or the reply timed out). Commands are
//! fire-and-forget. The high-rate telemetry feed is delivered through a
//! channel sink registered with [`SimulatorClient::register_feed`].

mod simulation;

pub use simulation::SimulationClient;

use crossbeam::channel::Sender;

use crate::messages::Pose;

/// Camera roles supported by the simulator.
///
/// The wire protocol addresses cameras by a stable numeric id; the bridge
/// validates that the simulator and this enum agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraRole {
    RgbLeft,
    RgbRight,
    Segmentation,
    Depth,
}

impl CameraRole {
    /// Wire id of this camera
    pub fn index(&self) -> u32 {
        match self {
            Self::RgbLeft => 0,
            Self::RgbRight => 1,
            Self::Segmentation => 2,
            Self::Depth => 3,
        }
    }

    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth)
    }

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::RgbLeft),
            1 => Some(Self::RgbRight),
            2 => Some(Self::Segmentation),
            3 => Some(Self::Depth),
            _ => None,
        }
    }
}

impl std::fmt::Display for CameraRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RgbLeft => write!(f, "rgb_left"),
            Self::RgbRight => write!(f, "rgb_right"),
            Self::Segmentation => write!(f, "segmentation"),
            Self::Depth => write!(f, "depth"),
        }
    }
}

/// Wire compression of image payloads. The bridge always streams raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Off,
}

/// Channel count requested for a camera stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCount {
    Single,
    Three,
}

impl ChannelCount {
    pub fn count(&self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Three => 3,
        }
    }
}

/// One camera entry of a data request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSelection {
    pub role: CameraRole,
    pub compression: Compression,
    pub channels: ChannelCount,
}

/// Object types the simulator can spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Cube,
    HumanFemale,
    HumanMale,
}

impl SpawnKind {
    /// Map a bus service's integer object-type id
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::Cube),
            1 => Some(Self::HumanFemale),
            2 => Some(Self::HumanMale),
            _ => None,
        }
    }
}

/// Where a spawned object lands
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Simulator picks a free spot
    Random,
    /// Exact pose in the simulator's native frame
    Exact(Pose),
}

/// Request/response commands understood by the simulator
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Fetch one frame of imagery, optionally with the matching metadata
    Data {
        include_metadata: bool,
        cameras: Vec<CameraSelection>,
    },
    /// Fetch the current metadata blob only
    Metadata,
    SetCameraParameters {
        role: CameraRole,
        height: u32,
        width: u32,
        vertical_fov: f64,
        near_draw_dist: f64,
        far_draw_dist: f64,
    },
    SetCameraPosition {
        role: CameraRole,
        x: f64,
        y: f64,
        z: f64,
    },
    SetCameraOrientation {
        role: CameraRole,
        x: f64,
        y: f64,
        z: f64,
        w: f64,
    },
    /// Query a camera's resolved calibration blob
    CameraInformation { role: CameraRole },
    ChangeScene { id: u32 },
    SpawnObject {
        kind: SpawnKind,
        placement: Placement,
    },
}

/// Fire-and-forget commands (no response expected)
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetCollision { enabled: bool },
    SetFrameRate { fps: f64 },
}

/// Raw pixel payload handed over by the pass-through codec
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    Bytes(Vec<u8>),
    /// Normalized depth in [0, 1]
    Floats(Vec<f32>),
}

impl PixelBuffer {
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(b) => b.len(),
            Self::Floats(f) => f.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One camera's frame as delivered by the simulator
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub height: u32,
    pub width: u32,
    pub channels: u8,
    pub pixels: PixelBuffer,
}

/// Responses the simulator can return
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Bare acknowledgement
    Ack,
    Data {
        metadata: String,
        frames: Vec<RawFrame>,
    },
    Metadata { raw: String },
    CameraInformation { raw: String },
}

/// Opaque client over the simulator transport.
///
/// `request` returns `None` when the simulator did not answer; callers
/// decide whether to retry (bootstrap does, indefinitely) or abandon the
/// cycle (the periodic callbacks do).
pub trait SimulatorClient {
    fn request(&mut self, request: &Request) -> Option<Response>;

    fn send(&mut self, command: &Command);

    /// Register the sink that receives raw high-rate metadata blobs.
    fn register_feed(&mut self, sink: Sender<String>);
}
