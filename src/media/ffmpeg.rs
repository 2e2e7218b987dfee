//! Webcam capture through libavdevice.
//!
//! FFmpeg contexts are not `Send`, so the device is opened and decoded
//! entirely on the `camera-capture` thread. Frames are converted to RGBA
//! and handed over a small bounded channel; when the consumer falls behind
//! frames are dropped rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Once};
use std::thread::JoinHandle;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;

use super::{CaptureDevice, MediaError, VideoFrame, VideoStream};
use crate::options::CaptureOptions;

static FFMPEG_INIT: Once = Once::new();

#[cfg(target_os = "linux")]
const DEFAULT_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
const DEFAULT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const DEFAULT_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const DEFAULT_FORMAT: &str = "v4l2";

#[cfg(target_os = "linux")]
const DEFAULT_DEVICE: &str = "/dev/video0";
#[cfg(target_os = "windows")]
const DEFAULT_DEVICE: &str = "video=Integrated Camera";
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
const DEFAULT_DEVICE: &str = "0";

type FrameMessage = Result<VideoFrame, MediaError>;

/// Capture device backed by FFmpeg's platform input formats.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct FfmpegCapture;

impl CaptureDevice for FfmpegCapture {
    fn open(
        &mut self,
        options: &CaptureOptions,
    ) -> Result<Box<dyn VideoStream>, MediaError> {
        let format = options
            .format
            .clone()
            .unwrap_or_else(|| DEFAULT_FORMAT.to_owned());
        let device = options
            .device
            .clone()
            .unwrap_or_else(|| DEFAULT_DEVICE.to_owned());
        log::info!(
            "Opening {:?}-facing camera {device} via {format}",
            options.facing
        );

        let (frame_tx, frame_rx) = mpsc::sync_channel::<FrameMessage>(2);
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = std::thread::Builder::new()
            .name("camera-capture".into())
            .spawn(move || {
                if let Err(e) = capture_loop(&format, &device, &frame_tx, &thread_stop) {
                    // The consumer may already be gone.
                    let _ = frame_tx.try_send(Err(e));
                }
            })
            .map_err(|e| MediaError::DeviceUnavailable(e.to_string()))?;

        Ok(Box::new(FfmpegStream {
            frame_rx,
            stop,
            thread: Some(thread),
        }))
    }
}

struct FfmpegStream {
    frame_rx: mpsc::Receiver<FrameMessage>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl VideoStream for FfmpegStream {
    fn latest_frame(&mut self) -> Result<Option<VideoFrame>, MediaError> {
        let mut latest = None;
        loop {
            match self.frame_rx.try_recv() {
                Ok(Ok(frame)) => latest = Some(frame),
                Ok(Err(e)) => return Err(e),
                Err(mpsc::TryRecvError::Empty) => return Ok(latest),
                Err(mpsc::TryRecvError::Disconnected) => {
                    return match latest {
                        Some(frame) => Ok(Some(frame)),
                        None if self.thread.is_some() => Err(MediaError::Stream(
                            "capture thread exited".into(),
                        )),
                        None => Ok(None),
                    };
                }
            }
        }
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
            log::debug!("Camera capture stopped");
        }
    }
}

impl Drop for FfmpegStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn init_ffmpeg() -> Result<(), MediaError> {
    let mut result = Ok(());
    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            result = Err(MediaError::DeviceUnavailable(format!(
                "FFmpeg initialization failed: {e}"
            )));
            return;
        }
        ffmpeg_next::device::register_all();
        // SAFETY: av_log_set_level only updates a global log threshold.
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });
    result
}

fn open_input(
    format_name: &str,
    device: &str,
) -> Result<ffmpeg_next::format::context::Input, MediaError> {
    let unavailable = MediaError::DeviceUnavailable;

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == format_name)
        .map(ffmpeg_next::format::Format::Input)
        .ok_or_else(|| unavailable(format!("input format {format_name} not found")))?;

    let mut dict = ffmpeg_next::Dictionary::new();
    dict.set("framerate", "30");
    match ffmpeg_next::format::open_with(&device, &format, dict)
        .map_err(|e| unavailable(format!("{device}: {e}")))?
    {
        ffmpeg_next::format::context::Context::Input(input) => Ok(input),
        ffmpeg_next::format::context::Context::Output(_) => {
            Err(unavailable(format!("{device} opened as an output")))
        }
    }
}

fn capture_loop(
    format_name: &str,
    device: &str,
    frame_tx: &mpsc::SyncSender<FrameMessage>,
    stop: &AtomicBool,
) -> Result<(), MediaError> {
    init_ffmpeg()?;
    let mut ictx = open_input(format_name, device)?;

    let input = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| MediaError::DeviceUnavailable("no video stream".into()))?;
    let stream_index = input.index();

    let stream_err = |e: ffmpeg_next::Error| MediaError::Stream(e.to_string());
    let mut decoder =
        ffmpeg_next::codec::context::Context::from_parameters(input.parameters())
            .map_err(stream_err)?
            .decoder()
            .video()
            .map_err(stream_err)?;

    let (width, height) = (decoder.width(), decoder.height());
    let mut scaler = scaling::Context::get(
        decoder.format(),
        width,
        height,
        Pixel::RGBA,
        width,
        height,
        scaling::Flags::BILINEAR,
    )
    .map_err(stream_err)?;
    log::info!("Camera streaming at {width}x{height}");

    let mut serial = 0_u64;
    for (stream, packet) in ictx.packets() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet).map_err(stream_err)?;

        let mut decoded = ffmpeg_next::frame::Video::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            let mut rgba = ffmpeg_next::frame::Video::empty();
            scaler.run(&decoded, &mut rgba).map_err(stream_err)?;
            serial += 1;
            let frame = VideoFrame {
                width: rgba.width(),
                height: rgba.height(),
                pixels: extract_rgba(&rgba),
                serial,
            };
            match frame_tx.try_send(Ok(frame)) {
                Ok(()) | Err(mpsc::TrySendError::Full(_)) => {}
                Err(mpsc::TrySendError::Disconnected(_)) => return Ok(()),
            }
        }
    }
    Ok(())
}

/// Copy RGBA rows out of a frame whose rows may be padded.
fn extract_rgba(frame: &ffmpeg_next::frame::Video) -> Vec<u8> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let data = frame.data(0);
    let stride = frame.stride(0);

    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let start = y * stride;
        out.extend_from_slice(&data[start..start + width * 4]);
    }
    out
}
