//! In-process simulator backend.
//!
//! Stands in for the real simulator transport: answers the full request
//! surface, synthesizes a straight-line trajectory with flat test imagery,
//! and remembers every camera parameter pushed to it so calibration queries
//! echo reality. Tests and the demo binary use the fault-injection knobs to
//! reproduce the awkward cases a live simulator produces, ignored requests
//! during scene loads and repeated frames between renders.

use std::collections::HashMap;

use crossbeam::channel::Sender;
use tracing::debug;

use super::{
    CameraRole, CameraSelection, Command, PixelBuffer, Placement, RawFrame, Request, Response,
    SimulatorClient, SpawnKind,
};

#[derive(Debug, Clone, Copy)]
struct CameraParams {
    width: u32,
    height: u32,
    vertical_fov: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            width: 720,
            height: 480,
            vertical_fov: 60.0,
        }
    }
}

/// Deterministic simulator stand-in.
pub struct SimulationClient {
    time: f64,
    tick_dt: f64,
    frozen: bool,
    ignore_remaining: u32,
    resolution_override: Option<(u32, u32)>,
    cameras: HashMap<u32, CameraParams>,
    feed: Option<Sender<String>>,
    scene: u32,
    collision_enabled: bool,
    frame_rate: Option<f64>,
    spawned: Vec<(SpawnKind, Placement)>,
}

impl SimulationClient {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            tick_dt: 0.05,
            frozen: false,
            ignore_remaining: 0,
            resolution_override: None,
            cameras: HashMap::new(),
            feed: None,
            scene: 0,
            collision_enabled: false,
            frame_rate: None,
            spawned: Vec::new(),
        }
    }

    /// Drop the next `n` requests on the floor, as a loading scene would.
    pub fn ignore_next_requests(&mut self, n: u32) {
        self.ignore_remaining = n;
    }

    /// Answer calibration queries with this resolution regardless of what
    /// was configured.
    pub fn override_reported_resolution(&mut self, width: u32, height: u32) {
        self.resolution_override = Some((width, height));
    }

    /// Stop advancing simulated time; every later pull repeats the current
    /// frame and timestamp.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    /// Push one metadata blob into the registered high-rate feed.
    pub fn emit_feed(&mut self) {
        self.step();
        let blob = self.metadata_blob();
        if let Some(feed) = &self.feed {
            let _ = feed.send(blob);
        }
    }

    /// Push an arbitrary blob into the feed, bypassing the trajectory.
    pub fn emit_feed_raw(&mut self, blob: &str) {
        if let Some(feed) = &self.feed {
            let _ = feed.send(blob.to_string());
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn scene(&self) -> u32 {
        self.scene
    }

    pub fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    pub fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    pub fn spawned(&self) -> &[(SpawnKind, Placement)] {
        &self.spawned
    }

    fn step(&mut self) {
        if !self.frozen {
            self.time += self.tick_dt;
        }
    }

    /// Straight-line flight: 1 m/s along native x at 1 m altitude.
    fn metadata_blob(&self) -> String {
        format!(
            concat!(
                "<agent_metadata frame=\"agent\">",
                "<position x=\"{x}\" y=\"1.0\" z=\"0.0\"/>",
                "<quaternion x=\"0\" y=\"0\" z=\"0\" w=\"1\"/>",
                "<velocity x=\"1.0\" y=\"0.0\" z=\"0.0\"/>",
                "<angular_velocity x=\"0.0\" y=\"0.0\" z=\"0.0\"/>",
                "<collision status=\"false\"/>",
                "<time>{t}</time>",
                "</agent_metadata>"
            ),
            x = self.time,
            t = self.time,
        )
    }

    fn camera_params(&self, role: CameraRole) -> CameraParams {
        self.cameras
            .get(&role.index())
            .copied()
            .unwrap_or_default()
    }

    fn render(&self, selection: &CameraSelection) -> RawFrame {
        let params = self.camera_params(selection.role);
        let pixel_count = (params.width * params.height) as usize;
        let pixels = if selection.role.is_depth() {
            // Mid-range normalized depth everywhere.
            PixelBuffer::Floats(vec![0.5; pixel_count])
        } else {
            let channels = selection.channels.count() as usize;
            PixelBuffer::Bytes(vec![128; pixel_count * channels])
        };
        RawFrame {
            height: params.height,
            width: params.width,
            channels: if selection.role.is_depth() {
                1
            } else {
                selection.channels.count()
            },
            pixels,
        }
    }

    fn calibration_blob(&self, role: CameraRole) -> String {
        let params = self.camera_params(role);
        let (width, height) = self
            .resolution_override
            .unwrap_or((params.width, params.height));
        format!(
            "<camera_info id=\"{}\"><parameters width=\"{}\" height=\"{}\" fov=\"{}\"/></camera_info>",
            role.index(),
            width,
            height,
            params.vertical_fov,
        )
    }
}

impl Default for SimulationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatorClient for SimulationClient {
    fn request(&mut self, request: &Request) -> Option<Response> {
        if self.ignore_remaining > 0 {
            self.ignore_remaining -= 1;
            debug!(?request, "dropping request");
            return None;
        }
        match request {
            Request::Data {
                include_metadata,
                cameras,
            } => {
                self.step();
                let frames = cameras.iter().map(|c| self.render(c)).collect();
                let metadata = if *include_metadata {
                    self.metadata_blob()
                } else {
                    String::new()
                };
                Some(Response::Data { metadata, frames })
            }
            Request::Metadata => {
                self.step();
                Some(Response::Metadata {
                    raw: self.metadata_blob(),
                })
            }
            Request::SetCameraParameters {
                role,
                height,
                width,
                vertical_fov,
                ..
            } => {
                self.cameras.insert(
                    role.index(),
                    CameraParams {
                        width: *width,
                        height: *height,
                        vertical_fov: *vertical_fov,
                    },
                );
                Some(Response::Ack)
            }
            Request::SetCameraPosition { .. } | Request::SetCameraOrientation { .. } => {
                Some(Response::Ack)
            }
            Request::CameraInformation { role } => Some(Response::CameraInformation {
                raw: self.calibration_blob(*role),
            }),
            Request::ChangeScene { id } => {
                self.scene = *id;
                Some(Response::Ack)
            }
            Request::SpawnObject { kind, placement } => {
                self.spawned.push((*kind, placement.clone()));
                Some(Response::Ack)
            }
        }
    }

    fn send(&mut self, command: &Command) {
        match command {
            Command::SetCollision { enabled } => self.collision_enabled = *enabled,
            Command::SetFrameRate { fps } => self.frame_rate = Some(*fps),
        }
    }

    fn register_feed(&mut self, sink: Sender<String>) {
        self.feed = Some(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ChannelCount, Compression};
    use crate::telemetry::parse_metadata;
    use crossbeam::channel;

    fn data_request() -> Request {
        Request::Data {
            include_metadata: true,
            cameras: vec![CameraSelection {
                role: CameraRole::RgbLeft,
                compression: Compression::Off,
                channels: ChannelCount::Three,
            }],
        }
    }

    #[test]
    fn test_metadata_parses_and_time_advances() {
        let mut client = SimulationClient::new();
        let Some(Response::Metadata { raw }) = client.request(&Request::Metadata) else {
            panic!("expected metadata");
        };
        let first = parse_metadata(&raw).unwrap();
        let Some(Response::Metadata { raw }) = client.request(&Request::Metadata) else {
            panic!("expected metadata");
        };
        let second = parse_metadata(&raw).unwrap();
        assert!(second.time > first.time);
    }

    #[test]
    fn test_frozen_client_repeats_timestamps() {
        let mut client = SimulationClient::new();
        client.freeze();
        let Some(Response::Data { metadata: a, .. }) = client.request(&data_request()) else {
            panic!("expected data");
        };
        let Some(Response::Data { metadata: b, .. }) = client.request(&data_request()) else {
            panic!("expected data");
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_ignored_requests_then_answer() {
        let mut client = SimulationClient::new();
        client.ignore_next_requests(2);
        assert!(client.request(&Request::Metadata).is_none());
        assert!(client.request(&Request::Metadata).is_none());
        assert!(client.request(&Request::Metadata).is_some());
    }

    #[test]
    fn test_configured_resolution_is_echoed_and_rendered() {
        let mut client = SimulationClient::new();
        client.request(&Request::SetCameraParameters {
            role: CameraRole::RgbLeft,
            height: 4,
            width: 6,
            vertical_fov: 60.0,
            near_draw_dist: 0.05,
            far_draw_dist: 50.0,
        });
        let Some(Response::CameraInformation { raw }) =
            client.request(&Request::CameraInformation {
                role: CameraRole::RgbLeft,
            })
        else {
            panic!("expected calibration");
        };
        assert!(raw.contains("width=\"6\""));
        let Some(Response::Data { frames, .. }) = client.request(&data_request()) else {
            panic!("expected data");
        };
        assert_eq!(frames[0].width, 6);
        assert_eq!(frames[0].pixels.len(), 6 * 4 * 3);
    }

    #[test]
    fn test_feed_delivers_blobs() {
        let mut client = SimulationClient::new();
        let (tx, rx) = channel::unbounded();
        client.register_feed(tx);
        client.emit_feed();
        client.emit_feed();
        assert_eq!(rx.len(), 2);
        let record = parse_metadata(&rx.recv().unwrap()).unwrap();
        assert!(record.time > 0.0);
    }

    #[test]
    fn test_commands_and_services_recorded() {
        let mut client = SimulationClient::new();
        client.send(&Command::SetCollision { enabled: true });
        client.send(&Command::SetFrameRate { fps: 20.0 });
        client.request(&Request::ChangeScene { id: 2 });
        client.request(&Request::SpawnObject {
            kind: SpawnKind::Cube,
            placement: Placement::Random,
        });
        assert!(client.collision_enabled());
        assert_eq!(client.frame_rate(), Some(20.0));
        assert_eq!(client.scene(), 2);
        assert_eq!(client.spawned().len(), 1);
    }
}
