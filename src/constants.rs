// SPDX-License-Identifier: GPL-3.0-only

//! Capture and decode defaults

/// Default capture width requested from the device
pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;

/// Default capture height requested from the device
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

/// Frames larger than this are downscaled before decoding.
/// QR codes are typically large enough to be detected at this resolution.
pub const DEFAULT_MAX_DECODE_DIMENSION: u32 = 640;

/// Number of memory-mapped capture buffers per decode loop
pub const CAPTURE_BUFFER_COUNT: u32 = 4;

/// Directory under the user config dir holding the config file
pub const CONFIG_DIR: &str = "scanner";

/// Config file name
pub const CONFIG_FILE: &str = "config.json";
