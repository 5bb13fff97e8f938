// SPDX-License-Identifier: GPL-3.0-only

//! Scanner - QR code scanning for video input devices
//!
//! This library exposes camera devices and decodes QR content from a live
//! video feed, surfacing the decoded text and any error as observable state.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`controller`]: Scan state and decode-loop lifecycle
//! - [`decoder`]: Decoder capability trait and the V4L2 backend
//! - [`config`]: Decode tuning configuration
//! - [`errors`]: Crate-wide error types
//!
//! # Example
//!
//! ```ignore
//! let controller = ScannerController::new(default_decoder(Config::load()));
//! controller.activate().await;
//! controller.start_scanning(&VideoTarget::detached());
//! // ... poll controller.result() / controller.error()
//! controller.deactivate();
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod decoder;
pub mod errors;

// Re-export commonly used types
pub use config::Config;
pub use controller::ScannerController;
pub use decoder::{
    DecodeLoop, DecodeOutcome, Decoder, OutcomeCallback, ScanFrame, VideoDevice, VideoTarget,
    default_decoder,
};
pub use errors::{ScanError, ScanResult};
