//! Gesture dispatch: the cooldown state machine and the launcher seam.
//!
//! The [`Dispatcher`] is fed one finger count per frame and decides
//! whether to fire the mapped command.  One global timer debounces all
//! gestures: after any successful decision to launch, every mapped count
//! is suppressed until the cooldown window has passed — sustaining a
//! gesture across frames, or switching to a different gesture mid-window,
//! produces no extra launches.
//!
//! Commands leave through the [`CommandLauncher`] trait so the state
//! machine can be exercised in tests without spawning processes.

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use gesture_map::GestureMap;
use hand_pose::FingerCount;
use thiserror::Error;
use tracing::{info, warn};

/// Minimum time between two launches, shared across all gestures.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

// ════════════════════════════════════════════════════════════════════════════
// CommandLauncher — abstraction over process spawn (and test doubles)
// ════════════════════════════════════════════════════════════════════════════

/// Spawn failure.  Never fatal to the frame loop.
#[derive(Debug, Error)]
#[error("failed to spawn {command:?}: {source}")]
pub struct LaunchError {
    pub command: String,
    #[source]
    pub source: std::io::Error,
}

/// Anything that can run a command string, fire-and-forget.
pub trait CommandLauncher: Send {
    fn launch(&mut self, command: &str) -> Result<(), LaunchError>;
}

// ── shell backend ─────────────────────────────────────────────────────────

/// Launches commands through `sh -c`, detached.
///
/// The child is never waited on or reaped, and its stdout/stderr go to
/// the null device.  The command string is passed to the shell verbatim
/// (metacharacters live).
pub struct ShellLauncher;

impl CommandLauncher for ShellLauncher {
    fn launch(&mut self, command: &str) -> Result<(), LaunchError> {
        Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ()) // dropped: runs independently of us
            .map_err(|source| LaunchError {
                command: command.to_string(),
                source,
            })
    }
}

// ── recording backend (tests) ─────────────────────────────────────────────

/// Test double: records launched commands instead of spawning.
#[cfg(test)]
pub(crate) struct RecordingLauncher {
    pub log: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    pub fail: bool,
}

#[cfg(test)]
impl RecordingLauncher {
    pub fn new() -> (Self, std::sync::Arc<std::sync::Mutex<Vec<String>>>) {
        let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        (
            RecordingLauncher {
                log: log.clone(),
                fail: false,
            },
            log,
        )
    }
}

#[cfg(test)]
impl CommandLauncher for RecordingLauncher {
    fn launch(&mut self, command: &str) -> Result<(), LaunchError> {
        if self.fail {
            return Err(LaunchError {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "spawn refused"),
            });
        }
        self.log.lock().unwrap().push(command.to_string());
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DispatchOutcome
// ════════════════════════════════════════════════════════════════════════════

/// What one frame's count led to.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The count has no mapped command (the usual idle case).
    Unmapped,
    /// Mapped, but the shared cooldown window is still open.
    Suppressed,
    /// The command was handed to the launcher.
    Launched(String),
    /// The launcher could not spawn it.  The cooldown window was already
    /// consumed (see [`Dispatcher::on_frame`]).
    Failed(String, LaunchError),
}

// ════════════════════════════════════════════════════════════════════════════
// Dispatcher
// ════════════════════════════════════════════════════════════════════════════

/// The debounced count → command state machine.
///
/// Owns the gesture table (read-only after load) and the last-trigger
/// timestamp — the only mutable dispatch state in the process, written
/// exclusively from the frame loop.
pub struct Dispatcher {
    map: GestureMap,
    cooldown: Duration,
    last_trigger: Option<Instant>,
}

impl Dispatcher {
    pub fn new(map: GestureMap) -> Self {
        Self::with_cooldown(map, DEFAULT_COOLDOWN)
    }

    pub fn with_cooldown(map: GestureMap, cooldown: Duration) -> Self {
        Dispatcher {
            map,
            cooldown,
            last_trigger: None,
        }
    }

    pub fn map(&self) -> &GestureMap {
        &self.map
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Whether a dispatch at `now` would be suppressed.  Before the first
    /// launch there is no window to wait out.
    pub fn is_in_cooldown(&self, now: Instant) -> bool {
        match self.last_trigger {
            Some(t) => now.duration_since(t) < self.cooldown,
            None => false,
        }
    }

    /// Time left in the current window, `None` when idle.  Informational
    /// (the HUD countdown); no side effects.
    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        let t = self.last_trigger?;
        let elapsed = now.duration_since(t);
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    /// Feed one frame's finger count.
    ///
    /// At most one launch per cooldown window, across all counts.  The
    /// window is consumed *before* the spawn attempt: a failed launch
    /// still burns it, and is not retried until the window passes.
    pub fn on_frame(
        &mut self,
        count: FingerCount,
        now: Instant,
        launcher: &mut dyn CommandLauncher,
    ) -> DispatchOutcome {
        let Some(command) = self.map.command_for(count) else {
            return DispatchOutcome::Unmapped;
        };
        if self.is_in_cooldown(now) {
            return DispatchOutcome::Suppressed;
        }

        let command = command.to_string();
        self.last_trigger = Some(now);

        match launcher.launch(&command) {
            Ok(()) => {
                info!(%count, command = %command, "launched");
                DispatchOutcome::Launched(command)
            }
            Err(e) => {
                warn!(%count, error = %e, "launch failed");
                DispatchOutcome::Failed(command, e)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn count(n: u8) -> FingerCount {
        FingerCount::new(n).unwrap()
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn test_map() -> GestureMap {
        GestureMap::from_json_str(r#"{"0": "echo A", "3": "echo B"}"#).unwrap()
    }

    #[test]
    fn first_mapped_count_launches() {
        let (mut rec, log) = RecordingLauncher::new();
        let mut d = Dispatcher::with_cooldown(test_map(), secs(10.0));
        let t0 = Instant::now();

        assert!(matches!(
            d.on_frame(count(3), t0, &mut rec),
            DispatchOutcome::Launched(c) if c == "echo B"
        ));
        assert_eq!(*log.lock().unwrap(), ["echo B"]);
    }

    #[test]
    fn repeat_within_cooldown_is_suppressed() {
        let (mut rec, log) = RecordingLauncher::new();
        let mut d = Dispatcher::with_cooldown(test_map(), secs(10.0));
        let t0 = Instant::now();

        d.on_frame(count(3), t0, &mut rec);
        assert!(matches!(
            d.on_frame(count(3), t0 + secs(5.0), &mut rec),
            DispatchOutcome::Suppressed
        ));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn cooldown_is_shared_across_gestures() {
        // Switching to a different mapped count mid-window still waits.
        let (mut rec, log) = RecordingLauncher::new();
        let mut d = Dispatcher::with_cooldown(test_map(), secs(10.0));
        let t0 = Instant::now();

        d.on_frame(count(3), t0, &mut rec);
        assert!(matches!(
            d.on_frame(count(0), t0 + secs(5.0), &mut rec),
            DispatchOutcome::Suppressed
        ));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn launch_resumes_after_window() {
        let (mut rec, log) = RecordingLauncher::new();
        let mut d = Dispatcher::with_cooldown(test_map(), secs(10.0));
        let t0 = Instant::now();

        d.on_frame(count(3), t0, &mut rec);
        assert!(matches!(
            d.on_frame(count(3), t0 + secs(10.1), &mut rec),
            DispatchOutcome::Launched(_)
        ));
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn unmapped_count_never_launches() {
        let (mut rec, log) = RecordingLauncher::new();
        let mut d = Dispatcher::with_cooldown(test_map(), secs(10.0));
        let t0 = Instant::now();

        // Idle and in-cooldown alike.
        assert!(matches!(
            d.on_frame(count(5), t0, &mut rec),
            DispatchOutcome::Unmapped
        ));
        d.on_frame(count(3), t0, &mut rec);
        assert!(matches!(
            d.on_frame(count(5), t0 + secs(1.0), &mut rec),
            DispatchOutcome::Unmapped
        ));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn unmapped_count_does_not_touch_the_timer() {
        let (mut rec, _log) = RecordingLauncher::new();
        let mut d = Dispatcher::with_cooldown(test_map(), secs(10.0));
        let t0 = Instant::now();

        d.on_frame(count(5), t0, &mut rec);
        assert!(!d.is_in_cooldown(t0 + secs(0.1)));
    }

    #[test]
    fn never_fired_means_no_cooldown() {
        let d = Dispatcher::with_cooldown(test_map(), secs(10.0));
        assert!(!d.is_in_cooldown(Instant::now()));
        assert_eq!(d.cooldown_remaining(Instant::now()), None);
    }

    #[test]
    fn cooldown_remaining_counts_down() {
        let (mut rec, _log) = RecordingLauncher::new();
        let mut d = Dispatcher::with_cooldown(test_map(), secs(10.0));
        let t0 = Instant::now();

        d.on_frame(count(3), t0, &mut rec);
        let left = d.cooldown_remaining(t0 + secs(4.0)).unwrap();
        assert_eq!(left, secs(6.0));
        assert_eq!(d.cooldown_remaining(t0 + secs(10.0)), None);
    }

    #[test]
    fn failed_launch_still_consumes_the_window() {
        let (mut rec, log) = RecordingLauncher::new();
        rec.fail = true;
        let mut d = Dispatcher::with_cooldown(test_map(), secs(10.0));
        let t0 = Instant::now();

        assert!(matches!(
            d.on_frame(count(3), t0, &mut rec),
            DispatchOutcome::Failed(c, _) if c == "echo B"
        ));

        // A working launcher right after is still suppressed.
        rec.fail = false;
        assert!(matches!(
            d.on_frame(count(3), t0 + secs(1.0), &mut rec),
            DispatchOutcome::Suppressed
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn spec_end_to_end_sequence() {
        // map {0: "echo A", 3: "echo B"}, cooldown 1.0 s:
        // (0.0, 3) launches B; (0.5, 3) and (0.5, 0) suppressed by the
        // shared window; (1.1, 0) launches A.
        let (mut rec, log) = RecordingLauncher::new();
        let mut d = Dispatcher::with_cooldown(test_map(), secs(1.0));
        let t0 = Instant::now();

        assert!(matches!(
            d.on_frame(count(3), t0, &mut rec),
            DispatchOutcome::Launched(_)
        ));
        assert!(matches!(
            d.on_frame(count(3), t0 + secs(0.5), &mut rec),
            DispatchOutcome::Suppressed
        ));
        assert!(matches!(
            d.on_frame(count(0), t0 + secs(0.5), &mut rec),
            DispatchOutcome::Suppressed
        ));
        assert!(matches!(
            d.on_frame(count(0), t0 + secs(1.1), &mut rec),
            DispatchOutcome::Launched(_)
        ));
        assert_eq!(*log.lock().unwrap(), ["echo B", "echo A"]);
    }
}
