// Vision message types: images and camera calibration

use serde::{Deserialize, Serialize};

/// Pixel encoding of a published image
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Single 8-bit channel
    Mono8,
    /// Three 8-bit channels
    Rgb8,
    /// Single 32-bit float channel, metric depth in meters
    Depth32F,
}

impl ImageEncoding {
    pub fn channels(&self) -> u32 {
        match self {
            Self::Mono8 | Self::Depth32F => 1,
            Self::Rgb8 => 3,
        }
    }

    pub fn bytes_per_channel(&self) -> u32 {
        match self {
            Self::Mono8 | Self::Rgb8 => 1,
            Self::Depth32F => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mono8 => "mono8",
            Self::Rgb8 => "rgb8",
            Self::Depth32F => "depth32f",
        }
    }
}

/// An image as published on the bus.
///
/// `data` holds row-major pixels in the declared encoding; depth pixels are
/// little-endian f32 meters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    /// Camera frame the image was taken in
    pub frame_id: String,
    pub height: u32,
    pub width: u32,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,
    /// Simulated seconds
    pub stamp: f64,
}

impl Image {
    /// Bytes per image row
    pub fn step(&self) -> u32 {
        self.width * self.encoding.channels() * self.encoding.bytes_per_channel()
    }

    /// Check that the payload length matches the declared geometry
    pub fn is_valid(&self) -> bool {
        self.data.len() == (self.height * self.step()) as usize
    }
}

/// Pinhole camera calibration as published alongside every image.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CameraInfo {
    /// Camera frame this calibration belongs to
    pub frame_id: String,
    pub height: u32,
    pub width: u32,
    /// Focal length in pixels, x
    pub fx: f64,
    /// Focal length in pixels, y
    pub fy: f64,
    /// Principal point, x
    pub cx: f64,
    /// Principal point, y
    pub cy: f64,
    /// Simulated seconds
    pub stamp: f64,
}

impl CameraInfo {
    /// Row-major 3x3 intrinsic matrix
    pub fn k_matrix(&self) -> [f64; 9] {
        [
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_and_validity() {
        let img = Image {
            frame_id: "left_cam".into(),
            height: 2,
            width: 4,
            encoding: ImageEncoding::Rgb8,
            data: vec![0; 24],
            stamp: 1.0,
        };
        assert_eq!(img.step(), 12);
        assert!(img.is_valid());

        let depth = Image {
            frame_id: "left_cam".into(),
            height: 2,
            width: 4,
            encoding: ImageEncoding::Depth32F,
            data: vec![0; 32],
            stamp: 1.0,
        };
        assert_eq!(depth.step(), 16);
        assert!(depth.is_valid());
    }

    #[test]
    fn test_k_matrix_layout() {
        let info = CameraInfo {
            fx: 415.7,
            fy: 415.7,
            cx: 360.0,
            cy: 240.0,
            ..Default::default()
        };
        let k = info.k_matrix();
        assert_eq!(k[0], 415.7);
        assert_eq!(k[2], 360.0);
        assert_eq!(k[4], 415.7);
        assert_eq!(k[5], 240.0);
        assert_eq!(k[8], 1.0);
    }
}
