// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanner operations
//!
//! This module provides command-line functionality for:
//! - Listing available video input devices
//! - Scanning a live camera feed for QR codes

use scanner::{Config, ScannerController, VideoTarget, default_decoder};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How often the scan command polls the controller's observable state
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// List all available video input devices
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let controller = ScannerController::new(default_decoder(Config::load()));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(controller.activate());

    let devices = controller.devices();
    if devices.is_empty() {
        println!("No video input devices found.");
        return Ok(());
    }

    println!("Available video input devices:");
    println!();
    for (index, device) in devices.iter().enumerate() {
        println!("  [{}] {} ({})", index, device.label, device.id);
    }

    Ok(())
}

/// Scan a live camera feed and print decoded codes until interrupted
pub fn scan(device_index: Option<usize>, once: bool) -> Result<(), Box<dyn std::error::Error>> {
    let controller = ScannerController::new(default_decoder(Config::load()));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(controller.activate());

    let devices = controller.devices();
    if devices.is_empty() {
        return Err("No video input devices found".into());
    }

    // The first device is preselected; an explicit index overrides it
    if let Some(index) = device_index {
        let Some(device) = devices.get(index) else {
            return Err(format!(
                "Device index {} out of range (0-{})",
                index,
                devices.len() - 1
            )
            .into());
        };
        controller.select_device(device.id.clone());
    }

    let selected = controller.selected_device().unwrap_or_default();
    let label = devices
        .iter()
        .find(|device| device.id == selected)
        .map(|device| device.label.clone())
        .unwrap_or_else(|| selected.clone());
    println!("Scanning on {} (Ctrl-C to stop)...", label);

    // No rendering surface in the CLI; frames go straight to the decoder
    controller.start_scanning(&VideoTarget::detached());

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })?;

    let mut last_result = String::new();
    let mut last_error = String::new();

    while running.load(Ordering::SeqCst) {
        let result = controller.result();
        if !result.is_empty() && result != last_result {
            println!("{}", result);
            last_result = result;
            if once {
                break;
            }
        }

        let error = controller.error();
        if !error.is_empty() && error != last_error {
            eprintln!("error: {}", error);
            last_error = error;
        }

        std::thread::sleep(POLL_INTERVAL);
    }

    controller.deactivate();
    Ok(())
}
