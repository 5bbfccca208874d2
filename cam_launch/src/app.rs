//! Top-level application state and the frame loop.
//!
//! `AppState` owns the [`Dispatcher`] and the launcher, folds
//! [`SourceEvent`]s into the current count, and feeds the HUD each frame.
//! All mutable dispatch state lives here as plain fields — no globals.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use gesture_map::GestureMap;
use hand_pose::{count_fingers, FingerCount};
use tracing::{info, warn};

use crate::dispatch::{
    CommandLauncher, Dispatcher, DispatchOutcome, ShellLauncher, DEFAULT_COOLDOWN,
};
use crate::hud::Hud;
use crate::source::{spawn_pose_source, SimInput, SourceEvent};
#[cfg(not(feature = "camera"))]
use crate::source::SimPoseSource;
#[cfg(feature = "camera")]
use crate::source::CameraPoseSource;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Startup configuration for the full application.
pub struct AppConfig {
    /// Gesture config file (JSON).  Missing or malformed files fall back
    /// to built-in defaults, they never abort startup.
    pub config_path: PathBuf,
    /// Shared cooldown between launches.
    pub cooldown: Duration,
    /// Video device index (camera builds only).
    pub camera_device: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            config_path: PathBuf::from("gestures.json"),
            cooldown: DEFAULT_COOLDOWN,
            camera_device: 0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    dispatcher: Dispatcher,
    launcher: Box<dyn CommandLauncher>,

    /// Latest counted hand; `None` while no hand is in view.
    hand: Option<FingerCount>,

    /// One-line HUD status (last launch, failures, readiness).
    pub status: String,
}

impl AppState {
    pub fn new(map: GestureMap, cooldown: Duration, launcher: Box<dyn CommandLauncher>) -> Self {
        AppState {
            dispatcher: Dispatcher::with_cooldown(map, cooldown),
            launcher,
            hand: None,
            status: String::from("Ready"),
        }
    }

    // ── process one SourceEvent ──────────────────────────────────────────

    pub fn handle_event(&mut self, event: SourceEvent, now: Instant) {
        match event {
            SourceEvent::Pose(pose) => {
                let count = count_fingers(&pose);
                self.hand = Some(count);
                self.dispatch(count, now);
            }
            SourceEvent::NoHand => {
                // An absent hand counts as zero raised fingers; whether
                // zero is mapped is the dispatcher's business.
                self.hand = None;
                self.dispatch(FingerCount::ZERO, now);
            }
            // Lifecycle events are handled by the run loop.
            SourceEvent::End | SourceEvent::Quit => {}
        }
    }

    fn dispatch(&mut self, count: FingerCount, now: Instant) {
        match self.dispatcher.on_frame(count, now, self.launcher.as_mut()) {
            DispatchOutcome::Launched(command) => {
                self.status = format!("Launched: {}", command);
            }
            DispatchOutcome::Failed(command, _) => {
                self.status = format!("Launch FAILED: {}", command);
            }
            // Idle and suppressed frames keep the last status; the HUD
            // shows the cooldown countdown separately.
            DispatchOutcome::Unmapped | DispatchOutcome::Suppressed => {}
        }
    }

    // ── accessors for the render loop ────────────────────────────────────

    pub fn current_count(&self) -> Option<FingerCount> {
        self.hand
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It loads the gesture
/// map (with fallbacks), spawns the pose source (simulation by default,
/// webcam with `--features camera`), opens the HUD, and drives the
/// event/render loop at ~60 fps.  Every exit path — `Esc`, window close,
/// Ctrl-C, end-of-stream — leaves by returning, so the camera, the
/// sidecar, and the window are all released by drop.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    // ── gesture table ─────────────────────────────────────────────────────
    let (map, map_source) = GestureMap::load_with_source(&cfg.config_path);
    for (count, command) in map.iter() {
        info!(%count, command, "gesture available");
    }

    // ── interrupt flag (Ctrl-C behaves like Esc) ─────────────────────────
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupted.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;
    }

    // ── pose source ───────────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    #[cfg(feature = "camera")]
    let pose_rx = {
        // HUD keys only quit in camera mode; poses come from the device.
        drop(sim_rx);
        spawn_pose_source(CameraPoseSource::open(cfg.camera_device)?)
    };
    #[cfg(not(feature = "camera"))]
    let pose_rx = spawn_pose_source(SimPoseSource { rx: sim_rx });

    // ── HUD window (owns the sim input sender) ───────────────────────────
    let mut hud = Hud::new(sim_tx).map_err(anyhow::Error::msg)?;

    // ── app state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(map, cfg.cooldown, Box::new(ShellLauncher));
    app.status = format!("Ready — gestures from {}", map_source.label());

    // ── main loop ─────────────────────────────────────────────────────────
    while hud.is_open() {
        if interrupted.load(Ordering::SeqCst) {
            info!("interrupt received, shutting down");
            break;
        }

        // 1. Poll window input → SimInput (false = Esc / window closed)
        if !hud.poll_input() {
            break;
        }

        // 2. Drain pose events
        let mut stream_ended = false;
        loop {
            match pose_rx.try_recv() {
                Ok(SourceEvent::Quit) => return Ok(()),
                Ok(SourceEvent::End) => {
                    warn!("pose stream ended");
                    stream_ended = true;
                    break;
                }
                Ok(event) => app.handle_event(event, Instant::now()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if stream_ended {
            break;
        }

        // 3. Render
        hud.render(&app, Instant::now());
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RecordingLauncher;
    use hand_pose::HandPose;
    use std::sync::Mutex;

    fn count(n: u8) -> FingerCount {
        FingerCount::new(n).unwrap()
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn make_app() -> (AppState, Arc<Mutex<Vec<String>>>) {
        let map = GestureMap::from_json_str(r#"{"0": "echo A", "2": "echo B"}"#).unwrap();
        let (rec, log) = RecordingLauncher::new();
        (AppState::new(map, secs(1.0), Box::new(rec)), log)
    }

    #[test]
    fn pose_event_counts_and_launches() {
        let (mut app, log) = make_app();
        let t0 = Instant::now();

        app.handle_event(SourceEvent::Pose(HandPose::showing(count(2))), t0);

        assert_eq!(app.current_count(), Some(count(2)));
        assert_eq!(*log.lock().unwrap(), ["echo B"]);
        assert!(app.status.contains("echo B"));
    }

    #[test]
    fn no_hand_clears_count_and_dispatches_zero() {
        let (mut app, log) = make_app();
        let t0 = Instant::now();

        app.handle_event(SourceEvent::Pose(HandPose::showing(count(5))), t0);
        app.handle_event(SourceEvent::NoHand, t0 + secs(0.1));

        assert_eq!(app.current_count(), None);
        // Count 5 is unmapped; the zero-finger default fired instead.
        assert_eq!(*log.lock().unwrap(), ["echo A"]);
    }

    #[test]
    fn sustained_gesture_launches_once_per_window() {
        let (mut app, log) = make_app();
        let t0 = Instant::now();
        let pose = HandPose::showing(count(2));

        app.handle_event(SourceEvent::Pose(pose.clone()), t0);
        app.handle_event(SourceEvent::Pose(pose.clone()), t0 + secs(0.3));
        app.handle_event(SourceEvent::Pose(pose.clone()), t0 + secs(0.9));
        assert_eq!(log.lock().unwrap().len(), 1);

        app.handle_event(SourceEvent::Pose(pose), t0 + secs(1.1));
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn unmapped_count_updates_display_only() {
        let (mut app, log) = make_app();

        app.handle_event(SourceEvent::Pose(HandPose::showing(count(4))), Instant::now());

        assert_eq!(app.current_count(), Some(count(4)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn lifecycle_events_leave_state_alone() {
        let (mut app, log) = make_app();
        let t0 = Instant::now();

        app.handle_event(SourceEvent::Pose(HandPose::showing(count(2))), t0);
        app.handle_event(SourceEvent::End, t0 + secs(0.1));
        app.handle_event(SourceEvent::Quit, t0 + secs(0.1));

        assert_eq!(app.current_count(), Some(count(2)));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn default_config_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.config_path, PathBuf::from("gestures.json"));
        assert_eq!(cfg.cooldown, Duration::from_secs(10));
        assert_eq!(cfg.camera_device, 0);
    }
}
