//! Live video capture for the camera background.
//!
//! The viewer only sees the [`CaptureDevice`] / [`VideoStream`] traits. The
//! real backend decodes a webcam through libavdevice and is compiled in with
//! the `camera` feature; without it [`default_device`] returns a device that
//! always reports [`MediaError::Unsupported`].

#[cfg(feature = "camera")]
mod ffmpeg;

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::options::CaptureOptions;

/// Which way the requested camera faces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front camera, facing the user.
    User,
    /// Rear camera, facing the scene.
    #[default]
    Environment,
}

/// Errors from opening or reading a capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// No capture backend is compiled in.
    Unsupported,
    /// The device could not be opened.
    DeviceUnavailable(String),
    /// The stream failed after opening.
    Stream(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => {
                write!(f, "camera capture is not supported in this build")
            }
            Self::DeviceUnavailable(msg) => {
                write!(f, "camera unavailable: {msg}")
            }
            Self::Stream(msg) => write!(f, "camera stream failed: {msg}"),
        }
    }
}

impl std::error::Error for MediaError {}

/// One decoded RGBA8 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    /// Increases by one per decoded frame; lets consumers skip re-uploads.
    pub serial: u64,
}

/// Source of capture streams.
pub trait CaptureDevice {
    /// Start streaming. Opening may complete asynchronously; a later
    /// failure surfaces from [`VideoStream::latest_frame`].
    ///
    /// # Errors
    ///
    /// Returns [`MediaError`] if the stream cannot be started at all.
    fn open(
        &mut self,
        options: &CaptureOptions,
    ) -> Result<Box<dyn VideoStream>, MediaError>;
}

/// A running capture stream.
pub trait VideoStream {
    /// The most recent frame decoded since the last call, if any.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError`] once the stream has failed.
    fn latest_frame(&mut self) -> Result<Option<VideoFrame>, MediaError>;

    /// Stop capturing and release the device. Idempotent.
    fn stop(&mut self);
}

/// Capture device used when no backend is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCapture;

impl CaptureDevice for UnavailableCapture {
    fn open(
        &mut self,
        _options: &CaptureOptions,
    ) -> Result<Box<dyn VideoStream>, MediaError> {
        Err(MediaError::Unsupported)
    }
}

/// The best capture device this build supports.
#[must_use]
pub fn default_device() -> Box<dyn CaptureDevice> {
    #[cfg(feature = "camera")]
    {
        Box::new(ffmpeg::FfmpegCapture)
    }
    #[cfg(not(feature = "camera"))]
    {
        Box::new(UnavailableCapture)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_capture_reports_unsupported() {
        let mut device = UnavailableCapture;
        let err = device.open(&CaptureOptions::default()).err();
        assert_eq!(err, Some(MediaError::Unsupported));
    }

    #[test]
    fn facing_mode_serializes_snake_case() {
        let json = serde_json::to_string(&FacingMode::Environment).unwrap();
        assert_eq!(json, "\"environment\"");
    }

    #[test]
    fn error_messages_are_readable() {
        assert_eq!(
            MediaError::DeviceUnavailable("/dev/video0 busy".into()).to_string(),
            "camera unavailable: /dev/video0 busy"
        );
    }
}
