// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device enumeration
//!
//! Walks the platform's video nodes and keeps those that can capture video.
//! Nodes that cannot be opened or queried are skipped with a debug log;
//! metadata-only nodes (no capture capability) are filtered out.

use crate::decoder::types::VideoDevice;
use crate::errors::ScanResult;
use tracing::{debug, info};
use v4l::capability::Flags;
use v4l::context;

/// Enumerate video input devices
///
/// Returns one entry per usable capture node. An empty list is a valid
/// result, not an error.
pub fn enumerate_devices() -> ScanResult<Vec<VideoDevice>> {
    let mut devices = Vec::new();

    for node in context::enum_devices() {
        let path = node.path().to_string_lossy().to_string();

        let dev = match v4l::Device::with_path(node.path()) {
            Ok(dev) => dev,
            Err(e) => {
                debug!(path = %path, error = %e, "Skipping unopenable node");
                continue;
            }
        };

        let caps = match dev.query_caps() {
            Ok(caps) => caps,
            Err(e) => {
                debug!(path = %path, error = %e, "Skipping node without capabilities");
                continue;
            }
        };

        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            debug!(path = %path, card = %caps.card, "Skipping non-capture node");
            continue;
        }

        let label = device_label(&caps.card, node.name(), &path);
        debug!(path = %path, label = %label, driver = %caps.driver, "Found video input device");

        devices.push(VideoDevice { id: path, label });
    }

    info!(count = devices.len(), "Enumerated video input devices");
    Ok(devices)
}

/// Pick a human-readable label for a device
///
/// Prefers the V4L2 card name, then the node name, then the node path.
fn device_label(card: &str, node_name: Option<String>, path: &str) -> String {
    if !card.is_empty() {
        return card.to_string();
    }
    match node_name {
        Some(name) if !name.is_empty() => name,
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_label_prefers_card_name() {
        let label = device_label("Integrated Camera", Some("video0".into()), "/dev/video0");
        assert_eq!(label, "Integrated Camera");
    }

    #[test]
    fn test_device_label_falls_back_to_node_name() {
        let label = device_label("", Some("video0".into()), "/dev/video0");
        assert_eq!(label, "video0");
    }

    #[test]
    fn test_device_label_falls_back_to_path() {
        let label = device_label("", None, "/dev/video0");
        assert_eq!(label, "/dev/video0");
    }
}
