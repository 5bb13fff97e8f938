// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 decoder backend
//!
//! Concrete [`Decoder`] implementation. Device enumeration lives in
//! [`enumeration`]; the decode loop opens the device on its own thread,
//! streams memory-mapped frames, converts them to grayscale, and runs the
//! QR engine once per frame.

pub mod enumeration;

use crate::config::Config;
use crate::constants::CAPTURE_BUFFER_COUNT;
use crate::decoder::decode_loop::DecodeLoop;
use crate::decoder::qr;
use crate::decoder::types::{DecodeOutcome, ScanFrame, VideoDevice, VideoTarget};
use crate::decoder::{Decoder, OutcomeCallback};
use crate::errors::{ScanError, ScanResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

/// Pause before retrying capture after a frame error, so a device that
/// disappeared mid-stream does not spin the loop hot.
const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Decoder backed by V4L2 capture devices
pub struct V4l2Decoder {
    config: Config,
}

impl V4l2Decoder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Decoder for V4l2Decoder {
    fn list_video_devices(&self) -> ScanResult<Vec<VideoDevice>> {
        enumeration::enumerate_devices()
    }

    fn start_decode(
        &self,
        device_id: &str,
        target: VideoTarget,
        on_outcome: OutcomeCallback,
    ) -> ScanResult<DecodeLoop> {
        // Sanity-check the device before spawning the loop thread; the
        // capture handle itself is opened on the thread that uses it.
        let dev = Device::with_path(device_id)
            .map_err(|e| ScanError::DeviceNotFound(format!("{}: {}", device_id, e)))?;
        let caps = dev
            .query_caps()
            .map_err(|e| ScanError::DeviceNotFound(format!("{}: {}", device_id, e)))?;
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            return Err(ScanError::FormatNotSupported(format!(
                "{} is not a video capture device",
                device_id
            )));
        }
        drop(dev);

        let config = self.config.clone();
        let device_id = device_id.to_string();
        Ok(DecodeLoop::start("qr-decode", move |stop| {
            capture_session(&device_id, &config, target, on_outcome, stop);
        }))
    }

    fn reset(&self) {
        // Capture handles live on the loop threads and are released when
        // their loops stop; there is nothing held here.
        debug!("V4L2 decoder reset");
    }
}

/// Run one capture-and-decode session until the stop signal is raised
///
/// Owns the device and stream for the lifetime of the loop thread. Setup
/// failures are reported once through the callback and end the session;
/// per-frame failures are reported and the session continues.
fn capture_session(
    device_id: &str,
    config: &Config,
    mut target: VideoTarget,
    mut on_outcome: OutcomeCallback,
    stop: &AtomicBool,
) {
    let mut dev = match Device::with_path(device_id) {
        Ok(dev) => dev,
        Err(e) => {
            let err = ScanError::DeviceNotFound(format!("{}: {}", device_id, e));
            warn!(device = %device_id, error = %err, "Decode session failed to open device");
            on_outcome(DecodeOutcome::Failed(err.to_string()));
            return;
        }
    };

    let format = match negotiate_format(&dev, config) {
        Ok(format) => format,
        Err(e) => {
            warn!(device = %device_id, error = %e, "Decode session failed to negotiate format");
            on_outcome(DecodeOutcome::Failed(e.to_string()));
            return;
        }
    };

    let mut stream = match Stream::with_buffers(&mut dev, Type::VideoCapture, CAPTURE_BUFFER_COUNT)
    {
        Ok(stream) => stream,
        Err(e) => {
            let err = ScanError::Capture(format!("create stream: {}", e));
            warn!(device = %device_id, error = %err, "Decode session failed to start streaming");
            on_outcome(DecodeOutcome::Failed(err.to_string()));
            return;
        }
    };

    info!(
        device = %device_id,
        width = format.width,
        height = format.height,
        fourcc = %format.fourcc,
        "Decode loop streaming"
    );

    while !stop.load(Ordering::SeqCst) {
        let (buf, meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(device = %device_id, error = %e, "Frame capture failed");
                on_outcome(DecodeOutcome::Failed(format!("frame capture failed: {}", e)));
                std::thread::sleep(CAPTURE_RETRY_DELAY);
                continue;
            }
        };

        let used = if meta.bytesused == 0 {
            buf.len()
        } else {
            (meta.bytesused as usize).min(buf.len())
        };

        let frame = match to_gray_frame(&buf[..used], &format) {
            Ok(frame) => frame,
            Err(e) => {
                on_outcome(DecodeOutcome::Failed(e.to_string()));
                continue;
            }
        };

        target.push_frame(frame.clone());
        on_outcome(qr::decode_frame(&frame, config.max_decode_dimension));
    }

    debug!(device = %device_id, "Decode session released device");
}

/// Negotiate a capture format the decoder can read
///
/// Requests the configured resolution in YUYV; the driver may answer with a
/// different format, which is accepted as long as grayscale conversion
/// supports it.
fn negotiate_format(dev: &Device, config: &Config) -> ScanResult<Format> {
    let mut format = dev
        .format()
        .map_err(|e| ScanError::Capture(format!("query format: {}", e)))?;
    format.width = config.capture_width;
    format.height = config.capture_height;
    format.fourcc = FourCC::new(b"YUYV");

    let applied = dev
        .set_format(&format)
        .map_err(|e| ScanError::Capture(format!("set format: {}", e)))?;

    match &applied.fourcc.repr {
        b"YUYV" | b"GREY" | b"MJPG" => Ok(applied),
        other => Err(ScanError::FormatNotSupported(
            String::from_utf8_lossy(other).to_string(),
        )),
    }
}

/// Convert one captured buffer to a tightly packed grayscale frame
fn to_gray_frame(data: &[u8], format: &Format) -> ScanResult<ScanFrame> {
    let width = format.width as usize;
    let height = format.height as usize;
    if width == 0 || height == 0 {
        return Err(ScanError::Capture(format!(
            "zero-sized capture format {}x{}",
            width, height
        )));
    }

    match &format.fourcc.repr {
        b"YUYV" => {
            let stride = (format.stride as usize).max(width * 2);
            let pixels = yuyv_to_gray(data, width, height, stride)?;
            Ok(ScanFrame::new(format.width, format.height, pixels))
        }
        b"GREY" => {
            let stride = (format.stride as usize).max(width);
            let pixels = copy_gray_rows(data, width, height, stride)?;
            Ok(ScanFrame::new(format.width, format.height, pixels))
        }
        b"MJPG" => {
            let image = image::load_from_memory(data)
                .map_err(|e| ScanError::Capture(format!("decode MJPG frame: {}", e)))?
                .to_luma8();
            let (width, height) = image.dimensions();
            Ok(ScanFrame::new(width, height, image.into_raw()))
        }
        other => Err(ScanError::FormatNotSupported(
            String::from_utf8_lossy(other).to_string(),
        )),
    }
}

/// Extract the Y plane from packed YUYV (one luma byte per pixel)
fn yuyv_to_gray(data: &[u8], width: usize, height: usize, stride: usize) -> ScanResult<Vec<u8>> {
    if data.len() < stride * (height - 1) + width * 2 {
        return Err(ScanError::Capture(format!(
            "short YUYV buffer: {} bytes for {}x{}",
            data.len(),
            width,
            height
        )));
    }

    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = &data[y * stride..];
        for x in 0..width {
            pixels.push(row[x * 2]);
        }
    }
    Ok(pixels)
}

/// Copy grayscale rows without stride padding
fn copy_gray_rows(data: &[u8], width: usize, height: usize, stride: usize) -> ScanResult<Vec<u8>> {
    if data.len() < stride * (height - 1) + width {
        return Err(ScanError::Capture(format!(
            "short GREY buffer: {} bytes for {}x{}",
            data.len(),
            width,
            height
        )));
    }

    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        let row_start = y * stride;
        pixels.extend_from_slice(&data[row_start..row_start + width]);
    }
    Ok(pixels)
}
