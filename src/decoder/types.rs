// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for decoder capabilities

use std::sync::Arc;
use std::time::Instant;

/// A video input device discovered by enumeration
///
/// The list is a snapshot: devices are immutable once listed and valid for
/// the lifetime of one enumeration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDevice {
    /// Opaque platform identifier (V4L2 node path, e.g. `/dev/video0`)
    pub id: String,
    /// Human-readable device name
    pub label: String,
}

/// The result of one decode attempt on one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A symbol was decoded; carries its text payload
    Decoded(String),
    /// No symbol in this frame. Expected on most frames, not an error.
    NotFound,
    /// The decode attempt failed for any other reason
    Failed(String),
}

/// A single grayscale frame from the capture loop
///
/// Pixel data is 8-bit grayscale, tightly packed (no row padding), shared
/// so that handing a frame to the preview sink never copies pixels.
#[derive(Debug, Clone)]
pub struct ScanFrame {
    pub width: u32,
    pub height: u32,
    /// Gray8 pixels, row-major, `width * height` bytes
    pub data: Arc<[u8]>,
    /// Timestamp when the frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl ScanFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            captured_at: Instant::now(),
        }
    }
}

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<ScanFrame>;

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<ScanFrame>;

/// Handle to the surface where live frames are rendered
///
/// The target is supplied by the caller at start time and passed through to
/// the decoder unmodified; the scanner never owns, mutates, or destroys the
/// underlying surface. Frame delivery is best-effort: a full or disconnected
/// sink drops the frame and never stalls the decode loop.
#[derive(Clone)]
pub struct VideoTarget {
    sink: Option<FrameSender>,
}

impl VideoTarget {
    /// Create a target backed by a bounded preview channel
    pub fn channel(capacity: usize) -> (Self, FrameReceiver) {
        let (sender, receiver) = futures::channel::mpsc::channel(capacity);
        (Self { sink: Some(sender) }, receiver)
    }

    /// A target with no rendering surface (headless runs)
    pub fn detached() -> Self {
        Self { sink: None }
    }

    /// Offer a frame to the rendering surface
    pub fn push_frame(&mut self, frame: ScanFrame) {
        if let Some(sink) = self.sink.as_mut() {
            // Dropped frames are fine; preview must never block capture
            let _ = sink.try_send(frame);
        }
    }
}

impl std::fmt::Debug for VideoTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTarget")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}
