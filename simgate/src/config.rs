//! Bridge configuration.
//!
//! Loadable from YAML or TOML, picked by file extension. Every field has a
//! default, so an empty document is a valid config for the demo setup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use simgate_core::{GateError, GateResult};

use crate::camera::RigSettings;
use crate::protocol::{CameraRole, CameraSelection, ChannelCount, Compression};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Camera resolution pushed to the simulator. Both dimensions must be
    /// even, the simulator's renderer rejects odd sizes.
    pub camera_width: u32,
    pub camera_height: u32,
    /// Vertical field of view in degrees.
    pub camera_vertical_fov: f64,
    pub near_draw_dist: f64,
    pub far_draw_dist: f64,
    /// Distance between the left and right RGB cameras, meters.
    pub stereo_baseline: f64,
    /// Simulated seconds per wall second; every outbound stamp is divided
    /// by this.
    pub speedup_factor: f64,
    /// Imagery pull rate, Hz.
    pub frame_rate: f64,
    pub world_frame_id: String,
    pub body_frame_id: String,
    pub left_camera_frame_id: String,
    pub right_camera_frame_id: String,
    /// Scene to load at startup.
    pub initial_scene: u32,
    pub enable_collision: bool,
    /// When set, the simulator advances one frame per request instead of
    /// free-running, and the frame-rate command is issued at startup.
    pub enable_step_mode: bool,
    /// Republish raw metadata blobs alongside the parsed messages.
    pub publish_metadata: bool,
    /// Stream the stereo pair as single-channel grayscale instead of RGB.
    pub publish_mono_stereo: bool,
    pub publish_stereo_rgb: bool,
    pub publish_segmentation: bool,
    pub publish_depth: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            camera_width: 720,
            camera_height: 480,
            camera_vertical_fov: 60.0,
            near_draw_dist: 0.05,
            far_draw_dist: 50.0,
            stereo_baseline: 0.2,
            speedup_factor: 1.0,
            frame_rate: 20.0,
            world_frame_id: "world".to_string(),
            body_frame_id: "base_link_gt".to_string(),
            left_camera_frame_id: "left_cam".to_string(),
            right_camera_frame_id: "right_cam".to_string(),
            initial_scene: 2,
            enable_collision: false,
            enable_step_mode: false,
            publish_metadata: false,
            publish_mono_stereo: false,
            publish_stereo_rgb: true,
            publish_segmentation: true,
            publish_depth: true,
        }
    }
}

impl BridgeConfig {
    /// Load from a YAML or TOML file, decided by the extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> GateResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&contents)?,
            Some("toml") => Self::from_toml(&contents)?,
            other => {
                return Err(GateError::config(format!(
                    "unsupported config extension {:?} for {}",
                    other,
                    path.display()
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> GateResult<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn from_toml(contents: &str) -> GateResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Startup preconditions. Violations are config errors, not runtime
    /// faults.
    pub fn validate(&self) -> GateResult<()> {
        if self.camera_width == 0 || self.camera_height == 0 {
            return Err(GateError::config("camera resolution must be positive"));
        }
        if self.camera_width % 2 != 0 || self.camera_height % 2 != 0 {
            return Err(GateError::config(format!(
                "camera resolution must be even, got {}x{}",
                self.camera_width, self.camera_height
            )));
        }
        if self.camera_vertical_fov <= 0.0 || self.camera_vertical_fov >= 180.0 {
            return Err(GateError::config(format!(
                "vertical FOV must be in (0, 180), got {}",
                self.camera_vertical_fov
            )));
        }
        if self.near_draw_dist <= 0.0 || self.far_draw_dist <= self.near_draw_dist {
            return Err(GateError::config(
                "draw distances must satisfy 0 < near < far",
            ));
        }
        if self.stereo_baseline <= 0.0 {
            return Err(GateError::config("stereo baseline must be positive"));
        }
        if self.speedup_factor <= 0.0 {
            return Err(GateError::config("speedup factor must be positive"));
        }
        if self.frame_rate <= 0.0 {
            return Err(GateError::config("frame rate must be positive"));
        }
        let frames = [
            &self.world_frame_id,
            &self.body_frame_id,
            &self.left_camera_frame_id,
            &self.right_camera_frame_id,
        ];
        for (i, a) in frames.iter().enumerate() {
            if a.is_empty() {
                return Err(GateError::config("frame ids must be non-empty"));
            }
            if frames[i + 1..].contains(a) {
                return Err(GateError::config(format!("duplicate frame id '{a}'")));
            }
        }
        Ok(())
    }

    /// Camera roles the node brings up at startup.
    pub fn active_roles(&self) -> Vec<CameraRole> {
        let mut roles = vec![CameraRole::RgbLeft];
        if self.publish_stereo_rgb {
            roles.push(CameraRole::RgbRight);
        }
        if self.publish_segmentation {
            roles.push(CameraRole::Segmentation);
        }
        if self.publish_depth {
            roles.push(CameraRole::Depth);
        }
        roles
    }

    /// Per-cycle imagery request, one selection per active role.
    ///
    /// Depth is always single-channel; the stereo pair follows the
    /// mono-stereo option; segmentation stays three-channel, its pixel
    /// values are class labels.
    pub fn active_cameras(&self) -> Vec<CameraSelection> {
        self.active_roles()
            .into_iter()
            .map(|role| {
                let mono = role.is_depth()
                    || (self.publish_mono_stereo
                        && matches!(role, CameraRole::RgbLeft | CameraRole::RgbRight));
                CameraSelection {
                    role,
                    compression: Compression::Off,
                    channels: if mono {
                        ChannelCount::Single
                    } else {
                        ChannelCount::Three
                    },
                }
            })
            .collect()
    }

    pub fn rig_settings(&self) -> RigSettings {
        RigSettings {
            width: self.camera_width,
            height: self.camera_height,
            vertical_fov_deg: self.camera_vertical_fov,
            near_draw_dist: self.near_draw_dist,
            far_draw_dist: self.far_draw_dist,
            stereo_baseline: self.stereo_baseline,
            body_frame_id: self.body_frame_id.clone(),
            left_frame_id: self.left_camera_frame_id.clone(),
            right_frame_id: self.right_camera_frame_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        BridgeConfig::default().validate().unwrap();
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let config = BridgeConfig::from_yaml(
            "camera_width: 640\ncamera_height: 480\nspeedup_factor: 2.5\n",
        )
        .unwrap();
        assert_eq!(config.camera_width, 640);
        assert_eq!(config.speedup_factor, 2.5);
        assert_eq!(config.frame_rate, 20.0);
    }

    #[test]
    fn test_toml_parses() {
        let config = BridgeConfig::from_toml("initial_scene = 5\nenable_collision = true\n").unwrap();
        assert_eq!(config.initial_scene, 5);
        assert!(config.enable_collision);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(BridgeConfig::from_yaml("cammera_width: 640\n").is_err());
    }

    #[test]
    fn test_odd_resolution_rejected() {
        let mut config = BridgeConfig::default();
        config.camera_width = 721;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_frame_ids_rejected() {
        let mut config = BridgeConfig::default();
        config.left_camera_frame_id = config.right_camera_frame_id.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_active_cameras_follow_flags() {
        let mut config = BridgeConfig::default();
        config.publish_stereo_rgb = false;
        config.publish_depth = false;
        let cameras = config.active_cameras();
        assert_eq!(cameras.len(), 2);
        assert!(cameras.iter().all(|c| !c.role.is_depth()));
        config.publish_depth = true;
        let cameras = config.active_cameras();
        let depth = cameras.iter().find(|c| c.role.is_depth()).unwrap();
        assert_eq!(depth.channels, ChannelCount::Single);
    }

    #[test]
    fn test_mono_stereo_selects_single_channel() {
        let mut config = BridgeConfig::default();
        config.publish_mono_stereo = true;
        let cameras = config.active_cameras();
        for selection in &cameras {
            let expected = match selection.role {
                CameraRole::Segmentation => ChannelCount::Three,
                _ => ChannelCount::Single,
            };
            assert_eq!(selection.channels, expected, "{}", selection.role);
        }
    }
}
