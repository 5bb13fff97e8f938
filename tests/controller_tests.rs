// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scanner controller
//!
//! A scripted mock decoder delivers a fixed sequence of outcomes from its
//! decode loop, so the controller's observable state can be checked without
//! camera hardware.

use scanner::{
    DecodeLoop, DecodeOutcome, Decoder, OutcomeCallback, ScanError, ScanResult,
    ScannerController, VideoDevice, VideoTarget,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

struct MockDecoder {
    devices: ScanResult<Vec<VideoDevice>>,
    outcomes: Mutex<Vec<DecodeOutcome>>,
    starts: AtomicUsize,
    resets: AtomicUsize,
    active_loops: Arc<AtomicUsize>,
}

impl MockDecoder {
    fn new(devices: ScanResult<Vec<VideoDevice>>, outcomes: Vec<DecodeOutcome>) -> Arc<Self> {
        Arc::new(Self {
            devices,
            outcomes: Mutex::new(outcomes),
            starts: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
            active_loops: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn with_devices(ids: &[&str]) -> Arc<Self> {
        Self::new(Ok(devices(ids)), Vec::new())
    }

    fn with_outcomes(ids: &[&str], outcomes: Vec<DecodeOutcome>) -> Arc<Self> {
        Self::new(Ok(devices(ids)), outcomes)
    }

    fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    fn active_loops(&self) -> usize {
        self.active_loops.load(Ordering::SeqCst)
    }
}

impl Decoder for MockDecoder {
    fn list_video_devices(&self) -> ScanResult<Vec<VideoDevice>> {
        self.devices.clone()
    }

    fn start_decode(
        &self,
        _device_id: &str,
        _target: VideoTarget,
        mut on_outcome: OutcomeCallback,
    ) -> ScanResult<DecodeLoop> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let script = self.outcomes.lock().unwrap().clone();
        let active = Arc::clone(&self.active_loops);
        Ok(DecodeLoop::start("mock-decode", move |stop| {
            active.fetch_add(1, Ordering::SeqCst);
            for outcome in script {
                on_outcome(outcome);
            }
            while !stop.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            active.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock whose decode loop keeps emitting outcomes until it is stopped
///
/// "camA" emits its own id as a decoded payload every few milliseconds;
/// every other device runs a silent loop. Anything visible in controller
/// state while a silent loop is active is therefore a leftover from an
/// earlier session.
struct ContinuousMockDecoder {
    starts: AtomicUsize,
    active_loops: Arc<AtomicUsize>,
}

impl ContinuousMockDecoder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            starts: AtomicUsize::new(0),
            active_loops: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    fn active_loops(&self) -> usize {
        self.active_loops.load(Ordering::SeqCst)
    }
}

impl Decoder for ContinuousMockDecoder {
    fn list_video_devices(&self) -> ScanResult<Vec<VideoDevice>> {
        Ok(devices(&["camA", "camB"]))
    }

    fn start_decode(
        &self,
        device_id: &str,
        _target: VideoTarget,
        mut on_outcome: OutcomeCallback,
    ) -> ScanResult<DecodeLoop> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let active = Arc::clone(&self.active_loops);
        let emit = device_id == "camA";
        let payload = device_id.to_string();
        Ok(DecodeLoop::start("continuous-mock-decode", move |stop| {
            active.fetch_add(1, Ordering::SeqCst);
            while !stop.load(Ordering::SeqCst) {
                if emit {
                    on_outcome(DecodeOutcome::Decoded(payload.clone()));
                }
                thread::sleep(Duration::from_millis(2));
            }
            active.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    fn reset(&self) {}
}

fn devices(ids: &[&str]) -> Vec<VideoDevice> {
    ids.iter()
        .map(|id| VideoDevice {
            id: id.to_string(),
            label: format!("{} camera", id),
        })
        .collect()
}

/// Poll a condition until it holds or a second passes
fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[tokio::test]
async fn test_first_device_selected_by_default() {
    let decoder = MockDecoder::with_devices(&["camA", "camB"]);
    let controller = ScannerController::new(decoder);

    controller.activate().await;

    assert_eq!(controller.devices().len(), 2);
    assert_eq!(controller.selected_device().as_deref(), Some("camA"));
}

#[tokio::test]
async fn test_empty_device_list_makes_start_a_noop() {
    let decoder = MockDecoder::with_devices(&[]);
    let controller = ScannerController::new(Arc::clone(&decoder) as Arc<dyn Decoder>);

    controller.activate().await;

    assert!(controller.devices().is_empty());
    assert_eq!(controller.selected_device(), None);

    controller.start_scanning(&VideoTarget::detached());
    assert_eq!(decoder.starts(), 0, "No loop may be created without a selection");
    assert!(!controller.is_scanning());
}

#[tokio::test]
async fn test_enumeration_failure_degrades_to_empty_list() {
    let decoder = MockDecoder::new(Err(ScanError::Enumeration("bus gone".into())), Vec::new());
    let controller = ScannerController::new(decoder);

    controller.activate().await;

    assert!(controller.devices().is_empty());
    assert_eq!(controller.selected_device(), None);
    assert_eq!(controller.error(), "", "Enumeration failure is never user-visible");
}

#[tokio::test]
async fn test_decoded_outcome_publishes_result() {
    let decoder =
        MockDecoder::with_outcomes(&["camA"], vec![DecodeOutcome::Decoded("ABC123".into())]);
    let controller = ScannerController::new(decoder);

    controller.activate().await;
    controller.start_scanning(&VideoTarget::detached());

    assert!(wait_for(|| controller.result() == "ABC123"));
    assert_eq!(controller.error(), "");
}

#[tokio::test]
async fn test_failed_outcome_publishes_error() {
    let decoder =
        MockDecoder::with_outcomes(&["camA"], vec![DecodeOutcome::Failed("camera busy".into())]);
    let controller = ScannerController::new(decoder);

    controller.activate().await;
    controller.start_scanning(&VideoTarget::detached());

    assert!(wait_for(|| controller.error() == "camera busy"));
    assert_eq!(controller.result(), "");
}

#[tokio::test]
async fn test_not_found_leaves_state_unchanged() {
    let decoder = MockDecoder::with_outcomes(
        &["camA"],
        vec![
            DecodeOutcome::Decoded("X".into()),
            DecodeOutcome::Failed("Y".into()),
            DecodeOutcome::NotFound,
        ],
    );
    let controller = ScannerController::new(decoder);

    controller.activate().await;
    controller.start_scanning(&VideoTarget::detached());

    assert!(wait_for(|| controller.result() == "X" && controller.error() == "Y"));

    // Give the trailing NotFound time to be processed, then verify it
    // touched nothing
    thread::sleep(Duration::from_millis(50));
    assert_eq!(controller.result(), "X");
    assert_eq!(controller.error(), "Y");
}

#[tokio::test]
async fn test_reset_clears_state_and_releases_loop() {
    let decoder = MockDecoder::with_outcomes(
        &["camA"],
        vec![
            DecodeOutcome::Decoded("X".into()),
            DecodeOutcome::Failed("Y".into()),
        ],
    );
    let controller = ScannerController::new(Arc::clone(&decoder) as Arc<dyn Decoder>);

    controller.activate().await;
    controller.start_scanning(&VideoTarget::detached());
    assert!(wait_for(|| controller.result() == "X" && controller.error() == "Y"));

    controller.reset_scanner();

    assert_eq!(controller.result(), "");
    assert_eq!(controller.error(), "");
    assert!(wait_for(|| decoder.active_loops() == 0));
    assert!(!controller.is_scanning());
}

#[tokio::test]
async fn test_restart_replaces_active_loop() {
    let decoder = MockDecoder::with_devices(&["camA"]);
    let controller = ScannerController::new(Arc::clone(&decoder) as Arc<dyn Decoder>);

    controller.activate().await;
    controller.start_scanning(&VideoTarget::detached());
    assert!(wait_for(|| decoder.active_loops() == 1));

    controller.start_scanning(&VideoTarget::detached());

    assert_eq!(decoder.starts(), 2);
    assert!(wait_for(|| decoder.active_loops() == 1));
    assert!(controller.is_scanning());
}

#[tokio::test]
async fn test_reset_wins_against_in_flight_outcomes() {
    let decoder = ContinuousMockDecoder::new();
    let controller = ScannerController::new(Arc::clone(&decoder) as Arc<dyn Decoder>);

    controller.activate().await;
    controller.start_scanning(&VideoTarget::detached());
    assert!(wait_for(|| controller.result() == "camA"));

    controller.reset_scanner();

    // The loop is joined before the clear, so even a loop that was still
    // emitting cannot land an outcome after the reset
    assert_eq!(controller.result(), "");
    assert_eq!(controller.error(), "");
    assert!(!controller.is_scanning());
    assert!(wait_for(|| decoder.active_loops() == 0));

    thread::sleep(Duration::from_millis(50));
    assert_eq!(controller.result(), "");
    assert_eq!(controller.error(), "");
}

#[tokio::test]
async fn test_restart_does_not_leak_previous_session_state() {
    let decoder = ContinuousMockDecoder::new();
    let controller = ScannerController::new(Arc::clone(&decoder) as Arc<dyn Decoder>);

    controller.activate().await;
    controller.start_scanning(&VideoTarget::detached());
    assert!(wait_for(|| controller.result() == "camA"));

    // camB's loop stays silent, so any state visible after the restart
    // would be a leftover from the camA session
    controller.select_device("camB");
    controller.start_scanning(&VideoTarget::detached());

    assert_eq!(controller.result(), "");
    assert_eq!(controller.error(), "");
    assert_eq!(decoder.starts(), 2);
    assert!(wait_for(|| decoder.active_loops() == 1));
    assert!(controller.is_scanning());

    thread::sleep(Duration::from_millis(50));
    assert_eq!(controller.result(), "");
    assert_eq!(controller.error(), "");
}

#[tokio::test]
async fn test_deactivate_releases_decoder_exactly_once() {
    let decoder = MockDecoder::with_devices(&["camA"]);
    let controller = ScannerController::new(Arc::clone(&decoder) as Arc<dyn Decoder>);

    controller.activate().await;
    controller.start_scanning(&VideoTarget::detached());
    assert!(wait_for(|| decoder.active_loops() == 1));

    controller.deactivate();

    assert_eq!(decoder.resets(), 1);
    assert!(wait_for(|| decoder.active_loops() == 0));
    assert!(controller.devices().is_empty());
    assert_eq!(controller.selected_device(), None);

    // Later deactivations and the final drop stay no-ops
    controller.deactivate();
    drop(controller);
    assert_eq!(decoder.resets(), 1);
}

#[tokio::test]
async fn test_drop_releases_decoder() {
    let decoder = MockDecoder::with_devices(&["camA"]);
    let controller = ScannerController::new(Arc::clone(&decoder) as Arc<dyn Decoder>);

    controller.activate().await;
    controller.start_scanning(&VideoTarget::detached());
    assert!(wait_for(|| decoder.active_loops() == 1));

    drop(controller);

    assert!(wait_for(|| decoder.resets() == 1 && decoder.active_loops() == 0));
}

#[tokio::test]
async fn test_select_device_is_trusted_verbatim() {
    let decoder = MockDecoder::with_devices(&["camA"]);
    let controller = ScannerController::new(decoder);

    controller.activate().await;
    controller.select_device("camZ");

    assert_eq!(controller.selected_device().as_deref(), Some("camZ"));
}

#[tokio::test]
async fn test_scan_scenario() {
    // enumerate [camA, camB] -> selected camA -> start -> Decoded("42")
    // -> result "42" -> reset -> cleared, loop released
    let decoder =
        MockDecoder::with_outcomes(&["camA", "camB"], vec![DecodeOutcome::Decoded("42".into())]);
    let controller = ScannerController::new(Arc::clone(&decoder) as Arc<dyn Decoder>);

    controller.activate().await;
    assert_eq!(controller.selected_device().as_deref(), Some("camA"));

    controller.start_scanning(&VideoTarget::detached());
    assert!(wait_for(|| controller.result() == "42"));

    controller.reset_scanner();
    assert_eq!(controller.result(), "");
    assert_eq!(controller.error(), "");
    assert!(wait_for(|| decoder.active_loops() == 0));
}
