// SPDX-License-Identifier: GPL-3.0-only

//! Decoder capability abstraction
//!
//! The controller consumes decoding through the [`Decoder`] trait: list the
//! available video input devices, start a continuous decode loop against one
//! of them, and release resources. The concrete backend is V4L2.

pub mod decode_loop;
pub mod qr;
pub mod types;
pub mod v4l2;

pub use decode_loop::DecodeLoop;
pub use types::{
    DecodeOutcome, FrameReceiver, FrameSender, ScanFrame, VideoDevice, VideoTarget,
};

use crate::config::Config;
use crate::errors::ScanResult;
use std::sync::Arc;

/// Callback invoked once per processed frame with that frame's outcome
pub type OutcomeCallback = Box<dyn FnMut(DecodeOutcome) + Send>;

/// Capability that reads frames from a camera device and attempts to
/// extract an encoded symbol from each frame
pub trait Decoder: Send + Sync {
    /// Enumerate video input devices
    ///
    /// An empty list is a valid result. Errors mean the platform refused
    /// enumeration as a whole.
    fn list_video_devices(&self) -> ScanResult<Vec<VideoDevice>>;

    /// Begin a continuous decode loop against a device
    ///
    /// The callback is invoked once per processed frame, in frame order,
    /// until the returned loop is stopped. There is no completion signal:
    /// the returned handle is the only way to end the loop, and dropping it
    /// stops the loop too.
    fn start_decode(
        &self,
        device_id: &str,
        target: VideoTarget,
        on_outcome: OutcomeCallback,
    ) -> ScanResult<DecodeLoop>;

    /// Release any resources held outside of decode loops
    ///
    /// Safe to call when nothing is active.
    fn reset(&self);
}

/// Get the default decoder for this platform (V4L2)
pub fn default_decoder(config: Config) -> Arc<dyn Decoder> {
    Arc::new(v4l2::V4l2Decoder::new(config))
}
