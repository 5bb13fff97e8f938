// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for decode loops
//!
//! A decode loop is a standing, repeating operation on a dedicated thread
//! that runs until explicitly stopped. Capture handles are frequently not
//! `Send`, or borrow each other, so the session owns everything it opens on
//! the loop thread itself and polls the stop signal between frames. The
//! handle returned here is the only way to stop the loop; dropping it stops
//! and joins the thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Handle to a decode loop running on its own thread
pub struct DecodeLoop {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl DecodeLoop {
    /// Start a decode session on a dedicated thread
    ///
    /// The session is called once with the stop signal. It is expected to
    /// loop until the signal is raised; returning early (for example when
    /// initialization fails) simply ends the loop.
    pub fn start<F>(name: &str, session: F) -> Self
    where
        F: FnOnce(&AtomicBool) + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting decode loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Decode loop thread started");
            session(&stop_signal_clone);
            info!(name = %name_clone, "Decode loop thread exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting decode loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending a stop signal
    ///
    /// Useful if the session ends on its own.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for decode loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Decode loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Decode loop thread finished");
            }
        }
    }
}

impl Drop for DecodeLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "DecodeLoop dropped, stopping loop");
            self.stop();
        }
    }
}
