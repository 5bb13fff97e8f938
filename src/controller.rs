// SPDX-License-Identifier: GPL-3.0-only

//! Scanner controller
//!
//! The controller owns all scan state (device list, selection, latest
//! result, latest error), mediates access to the [`Decoder`] capability,
//! and guarantees that the decode loop and the decoder are released on
//! teardown.

use crate::decoder::{DecodeLoop, DecodeOutcome, Decoder, OutcomeCallback, VideoDevice, VideoTarget};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, info, warn};

/// Scan session state
#[derive(Default)]
struct ScanState {
    /// Devices published by the last activation
    devices: Vec<VideoDevice>,
    /// Selected device id; must originate from the published list
    /// (trusted, not validated)
    selected: Option<String>,
    /// Latest decoded payload; empty = none
    result: String,
    /// Latest decode error; empty = none
    error: String,
    /// The active decode loop, if any. At most one per controller.
    active: Option<DecodeLoop>,
    /// Set once teardown has run, so the decoder is released exactly once
    released: bool,
}

struct Inner {
    decoder: Arc<dyn Decoder>,
    state: Mutex<ScanState>,
}

/// Observable state holder and lifecycle manager around a [`Decoder`]
///
/// Clones share state. Decode callbacks run on the loop thread and hold
/// only a weak reference, so a running loop never keeps a dropped
/// controller alive.
#[derive(Clone)]
pub struct ScannerController {
    inner: Arc<Inner>,
}

impl ScannerController {
    /// Create a controller around a decoder capability
    pub fn new(decoder: Arc<dyn Decoder>) -> Self {
        Self {
            inner: Arc::new(Inner {
                decoder,
                state: Mutex::new(ScanState::default()),
            }),
        }
    }

    /// Enumerate devices and publish the list
    ///
    /// Enumeration runs off the caller's thread. On success the device list
    /// is published and the default-selection rule applies: the first listed
    /// device becomes selected. Enumeration failure degrades to an empty
    /// list with a warning log; it is never surfaced as a user-visible
    /// error.
    pub async fn activate(&self) {
        let decoder = Arc::clone(&self.inner.decoder);
        let listed = tokio::task::spawn_blocking(move || decoder.list_video_devices()).await;

        let devices = match listed {
            Ok(Ok(devices)) => devices,
            Ok(Err(e)) => {
                warn!(error = %e, "Device enumeration failed");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Device enumeration task failed");
                Vec::new()
            }
        };

        let selected = default_device(&devices);
        info!(count = devices.len(), selected = ?selected, "Published device list");

        let mut state = self.inner.state.lock().unwrap();
        state.selected = selected;
        state.devices = devices;
    }

    /// Devices published by the last activation
    pub fn devices(&self) -> Vec<VideoDevice> {
        self.inner.state.lock().unwrap().devices.clone()
    }

    /// Currently selected device id
    pub fn selected_device(&self) -> Option<String> {
        self.inner.state.lock().unwrap().selected.clone()
    }

    /// Select a device by id
    ///
    /// The id is trusted to originate from the published list and is not
    /// validated against it.
    pub fn select_device(&self, id: impl Into<String>) {
        let id = id.into();
        debug!(device = %id, "Device selected");
        self.inner.state.lock().unwrap().selected = Some(id);
    }

    /// Latest decoded payload; empty = none
    pub fn result(&self) -> String {
        self.inner.state.lock().unwrap().result.clone()
    }

    /// Latest decode error; empty = none
    pub fn error(&self) -> String {
        self.inner.state.lock().unwrap().error.clone()
    }

    /// Check whether a decode loop is currently active
    pub fn is_scanning(&self) -> bool {
        self.inner
            .state
            .lock()
            .unwrap()
            .active
            .as_ref()
            .map(|l| l.is_running())
            .unwrap_or(false)
    }

    /// Begin continuous decoding against the selected device
    ///
    /// No-op when no device is selected. Starting while a loop is already
    /// active replaces it: the existing loop is stopped and joined and the
    /// previous result and error are cleared before the new one starts, so
    /// at most one loop ever runs and a restart begins from a clean slate.
    /// A failure to start the loop is logged and published as the error
    /// state; nothing is returned across this boundary.
    pub fn start_scanning(&self, target: &VideoTarget) {
        let (device_id, previous) = {
            let mut state = self.inner.state.lock().unwrap();
            let Some(id) = state.selected.clone() else {
                debug!("No device selected, ignoring start request");
                return;
            };
            (id, state.active.take())
        };

        if let Some(mut active) = previous {
            info!(device = %device_id, "Replacing active decode loop");
            // Join before clearing: the old loop can deliver one last
            // outcome while stopping, and it must not bleed into the new
            // session's state.
            active.stop();
            let mut state = self.inner.state.lock().unwrap();
            state.result.clear();
            state.error.clear();
        }

        info!(device = %device_id, "Starting scan");
        let on_outcome = self.outcome_callback();

        // The state lock is never held across decoder calls; callbacks may
        // fire before the new loop handle is stored.
        match self
            .inner
            .decoder
            .start_decode(&device_id, target.clone(), on_outcome)
        {
            Ok(decode_loop) => {
                self.inner.state.lock().unwrap().active = Some(decode_loop);
            }
            Err(e) => {
                warn!(device = %device_id, error = %e, "Failed to start decode loop");
                self.inner.state.lock().unwrap().error = e.to_string();
            }
        }
    }

    /// Stop the active decode loop and clear result and error
    ///
    /// The loop is joined before the clear, so an in-flight outcome cannot
    /// land after this returns: result and error stay empty until the next
    /// start.
    pub fn reset_scanner(&self) {
        let previous = self.inner.state.lock().unwrap().active.take();
        if let Some(mut active) = previous {
            active.stop();
        }

        let mut state = self.inner.state.lock().unwrap();
        state.result.clear();
        state.error.clear();
        debug!("Scanner reset");
    }

    /// Tear down: release the decode loop and the decoder
    ///
    /// Runs at most once; later calls and the final drop are no-ops. The
    /// device list and selection are discarded with it.
    pub fn deactivate(&self) {
        let previous = {
            let mut state = self.inner.state.lock().unwrap();
            if state.released {
                return;
            }
            state.released = true;
            state.devices.clear();
            state.selected = None;
            state.active.take()
        };

        if let Some(mut active) = previous {
            active.stop();
        }
        self.inner.decoder.reset();
        info!("Scanner deactivated");
    }

    /// Build the per-frame callback that wires decode outcomes into state
    ///
    /// Decoded payloads overwrite the result and leave the error untouched;
    /// NotFound is ignored entirely; failures are logged and overwrite the
    /// error, leaving the result untouched.
    fn outcome_callback(&self) -> OutcomeCallback {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Box::new(move |outcome| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match outcome {
                DecodeOutcome::Decoded(text) => {
                    debug!(payload = %text, "Scan result published");
                    inner.state.lock().unwrap().result = text;
                }
                DecodeOutcome::NotFound => {}
                DecodeOutcome::Failed(message) => {
                    warn!(error = %message, "Decode failed");
                    inner.state.lock().unwrap().error = message;
                }
            }
        })
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap();
        if state.released {
            return;
        }
        state.released = true;
        if let Some(mut active) = state.active.take() {
            active.stop();
        }
        self.decoder.reset();
        debug!("Scanner controller dropped, decoder released");
    }
}

impl std::fmt::Debug for ScannerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock().unwrap();
        f.debug_struct("ScannerController")
            .field("devices", &state.devices.len())
            .field("selected", &state.selected)
            .field("scanning", &state.active.is_some())
            .finish()
    }
}

/// Default-selection rule: the first listed device
fn default_device(devices: &[VideoDevice]) -> Option<String> {
    devices.first().map(|device| device.id.clone())
}
