//! The bridge node.
//!
//! Owns the simulator client, the telemetry pipeline state, and every bus
//! publisher, and runs the three cycles: high-rate telemetry from the feed
//! channel, the paced imagery pull, and the clock poll. All simulator access
//! and all pipeline state live behind `&mut self`, so the cycles are
//! serialized by construction.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver};
use tracing::{error, info, warn};

use simgate_core::{GateError, GateResult, Hub, Node};

use crate::camera::{CameraBootstrap, CameraRig};
use crate::config::BridgeConfig;
use crate::messages::{Clock, Image, Imu, Odometry, Pose, TransformBatch, TransformStamped};
use crate::protocol::{
    CameraRole, Command, Placement, Request, Response, SimulatorClient, SpawnKind,
};
use crate::streaming::{DedupGuard, FrameDecision};
use crate::telemetry::synthesizer;
use crate::telemetry::{parse_metadata, TransformEngine};

/// Bus surface of the bridge. Subscribe before the first tick.
pub struct BridgePublishers {
    pub imu: Hub<Imu>,
    pub odometry: Hub<Odometry>,
    pub tf: Hub<TransformStamped>,
    pub tf_static: Hub<TransformBatch>,
    pub clock: Hub<Clock>,
    /// Raw metadata passthrough, only fed when enabled in config.
    pub metadata: Hub<String>,
    pub images: HashMap<CameraRole, Hub<Image>>,
    pub camera_infos: HashMap<CameraRole, Hub<crate::messages::CameraInfo>>,
}

/// Bus topic prefix for a camera role.
fn camera_topic(role: CameraRole) -> &'static str {
    match role {
        CameraRole::RgbLeft => "left_cam/rgb/image_raw",
        CameraRole::RgbRight => "right_cam/rgb/image_raw",
        CameraRole::Segmentation => "seg_cam/rgb/image_raw",
        CameraRole::Depth => "depth_cam/mono/image_raw",
    }
}

fn camera_info_topic(role: CameraRole) -> &'static str {
    match role {
        CameraRole::RgbLeft => "left_cam/camera_info",
        CameraRole::RgbRight => "right_cam/camera_info",
        CameraRole::Segmentation => "seg_cam/camera_info",
        CameraRole::Depth => "depth_cam/camera_info",
    }
}

pub struct BridgeNode<C: SimulatorClient> {
    config: BridgeConfig,
    client: C,
    engine: TransformEngine,
    dedup: DedupGuard,
    rig: Option<CameraRig>,
    feed: Receiver<String>,
    pub publishers: BridgePublishers,
}

impl<C: SimulatorClient> BridgeNode<C> {
    /// Build the node and wire the high-rate feed. Fails on invalid config.
    pub fn new(config: BridgeConfig, mut client: C) -> GateResult<Self> {
        config.validate()?;
        let (feed_tx, feed_rx) = channel::unbounded();
        client.register_feed(feed_tx);

        let mut images = HashMap::new();
        let mut camera_infos = HashMap::new();
        for role in config.active_roles() {
            images.insert(role, Hub::new(camera_topic(role))?);
            camera_infos.insert(role, Hub::new(camera_info_topic(role))?);
        }
        let publishers = BridgePublishers {
            imu: Hub::new("imu")?,
            odometry: Hub::new("odom_gt")?,
            tf: Hub::new("tf")?,
            tf_static: Hub::new("tf_static")?,
            clock: Hub::new("clock")?,
            metadata: Hub::new("metadata")?,
            images,
            camera_infos,
        };

        Ok(Self {
            config,
            client,
            engine: TransformEngine::new(),
            dedup: DedupGuard::new(),
            rig: None,
            feed: feed_rx,
            publishers,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn rig(&self) -> Option<&CameraRig> {
        self.rig.as_ref()
    }

    /// Scale a simulated timestamp to an outbound stamp.
    fn stamp(&self, sim_time: f64) -> f64 {
        sim_time / self.config.speedup_factor
    }

    /// One high-rate telemetry sample: parse, advance the transform engine,
    /// publish IMU, odometry, and the body transform.
    pub fn on_telemetry(&mut self, raw: &str) -> GateResult<()> {
        let record = parse_metadata(raw)?;
        let processed = self.engine.update(&record)?;
        if processed.collision {
            warn!(time = processed.time, "agent in collision");
        }
        let stamp = self.stamp(processed.time);

        self.publishers.imu.send(synthesizer::imu_message(
            &processed,
            stamp,
            &self.config.body_frame_id,
        ))?;
        self.publishers.odometry.send(synthesizer::odometry_message(
            &processed,
            stamp,
            &self.config.world_frame_id,
            &self.config.body_frame_id,
        ))?;
        self.publishers.tf.send(synthesizer::transform_message(
            &processed.enu_from_body,
            stamp,
            &self.config.world_frame_id,
            &self.config.body_frame_id,
        ))?;
        if self.config.publish_metadata {
            self.publishers.metadata.send(raw.to_string())?;
        }
        Ok(())
    }

    /// One imagery pull: request every active camera, drop duplicates,
    /// publish images with their camera infos and the matching ground-truth
    /// transform.
    pub fn image_cycle(&mut self) -> GateResult<()> {
        let rig = self
            .rig
            .as_ref()
            .ok_or_else(|| GateError::node("bridge", "image cycle before bootstrap"))?;
        let cameras = self.config.active_cameras();
        let response = self
            .client
            .request(&Request::Data {
                include_metadata: true,
                cameras: cameras.clone(),
            })
            .ok_or_else(|| GateError::communication("no answer to imagery request"))?;
        let Response::Data { metadata, frames } = response else {
            return Err(GateError::communication("imagery request answered with a non-data response"));
        };
        if frames.len() != cameras.len() {
            return Err(GateError::communication(format!(
                "asked for {} frames, got {}",
                cameras.len(),
                frames.len()
            )));
        }

        let record = parse_metadata(&metadata)?;
        if self.dedup.check(record.time) == FrameDecision::Duplicate {
            info!(time = record.time, "duplicate frame set, dropping");
            return Ok(());
        }
        let stamp = self.stamp(record.time);

        for (selection, frame) in cameras.iter().zip(&frames) {
            let frame_id = if selection.role == CameraRole::RgbRight {
                &self.config.right_camera_frame_id
            } else {
                &self.config.left_camera_frame_id
            };
            let calibration = rig.calibration(selection.role);
            let image = synthesizer::image_message(
                frame,
                selection,
                calibration,
                self.config.far_draw_dist,
                stamp,
                frame_id,
            )?;
            self.publishers.images[&selection.role].send(image)?;
            self.publishers.camera_infos[&selection.role]
                .send(calibration.to_camera_info(frame_id, stamp))?;
        }

        // Imagery consumers need the pose at the frame's own timestamp,
        // computed statelessly so the feed path owns the engine history.
        let pose = TransformEngine::world_pose(&record);
        self.publishers.tf.send(synthesizer::transform_message(
            &pose,
            stamp,
            &self.config.world_frame_id,
            &self.config.body_frame_id,
        ))?;
        // Only a fully published frame set counts as seen; a cycle that
        // errored above gets a retry at the same timestamp.
        self.dedup.commit(record.time);
        Ok(())
    }

    /// Poll the simulator for its current time and publish the clock.
    pub fn clock_cycle(&mut self) -> GateResult<()> {
        let response = self
            .client
            .request(&Request::Metadata)
            .ok_or_else(|| GateError::communication("no answer to metadata request"))?;
        let Response::Metadata { raw } = response else {
            return Err(GateError::communication("metadata request answered with a non-metadata response"));
        };
        let record = parse_metadata(&raw)?;
        self.publishers.clock.send(Clock {
            clock: self.stamp(record.time),
        })?;
        Ok(())
    }

    /// Drain the feed, then run one imagery pull and one clock poll.
    ///
    /// Returns the first fatal error; non-fatal errors abandon their cycle
    /// and are logged.
    pub fn tick_once(&mut self) -> GateResult<()> {
        let pending: Vec<String> = self.feed.try_iter().collect();
        for raw in pending {
            if let Err(err) = self.on_telemetry(&raw) {
                if err.is_fatal() {
                    return Err(err);
                }
                warn!(%err, "telemetry sample abandoned");
            }
        }
        if let Err(err) = self.image_cycle() {
            if err.is_fatal() {
                return Err(err);
            }
            warn!(%err, "image cycle abandoned");
        }
        if let Err(err) = self.clock_cycle() {
            if err.is_fatal() {
                return Err(err);
            }
            warn!(%err, "clock cycle abandoned");
        }
        Ok(())
    }

    /// Run until a fatal error, pacing imagery at the configured frame rate.
    pub fn spin(&mut self) -> GateError {
        let period = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        loop {
            if let Err(err) = self.tick_once() {
                error!(%err, "fatal error, stopping");
                return err;
            }
            thread::sleep(period);
        }
    }

    /// Bus service: switch the simulator to another scene.
    pub fn scene_change(&mut self, id: u32) -> bool {
        match self.client.request(&Request::ChangeScene { id }) {
            Some(_) => {
                info!(scene = id, "scene changed");
                true
            }
            None => {
                warn!(scene = id, "scene change not acknowledged");
                false
            }
        }
    }

    /// Bus service: spawn an object, at an exact pose or wherever the
    /// simulator finds room.
    pub fn spawn_object(&mut self, kind_id: u32, pose: Option<Pose>) -> bool {
        let Some(kind) = SpawnKind::from_id(kind_id) else {
            warn!(kind_id, "unknown spawn kind");
            return false;
        };
        let placement = match pose {
            Some(pose) => Placement::Exact(pose),
            None => Placement::Random,
        };
        self.client
            .request(&Request::SpawnObject { kind, placement })
            .is_some()
    }
}

impl<C: SimulatorClient> Node for BridgeNode<C> {
    fn name(&self) -> &'static str {
        "simgate_bridge"
    }

    /// Bring the cameras up, broadcast the static mounts once, and push the
    /// startup commands.
    fn init(&mut self) -> GateResult<()> {
        let bootstrap =
            CameraBootstrap::new(self.config.rig_settings(), self.config.active_roles());
        let rig = bootstrap.run(&mut self.client)?;
        self.publishers
            .tf_static
            .send(rig.static_transforms.clone())?;
        self.rig = Some(rig);

        self.client.send(&Command::SetCollision {
            enabled: self.config.enable_collision,
        });
        if self
            .client
            .request(&Request::ChangeScene {
                id: self.config.initial_scene,
            })
            .is_none()
        {
            return Err(GateError::simulator("initial scene change not acknowledged"));
        }
        if self.config.enable_step_mode {
            self.client.send(&Command::SetFrameRate {
                fps: self.config.frame_rate,
            });
        }
        info!(scene = self.config.initial_scene, "bridge initialized");
        Ok(())
    }

    fn tick(&mut self) {
        if let Err(err) = self.tick_once() {
            error!(%err, "tick failed fatally");
        }
    }
}
