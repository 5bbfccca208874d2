//! Pose sources — where hand poses come from, one per frame.
//!
//! The public interface is [`SourceEvent`] delivered over a `mpsc`
//! channel.  Consumers don't need to know whether poses came from a real
//! webcam + landmark detector or from the keyboard simulator; the same
//! counting and dispatch pipeline runs either way.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use hand_pose::{FingerCount, HandPose};

// ════════════════════════════════════════════════════════════════════════════
// SourceEvent
// ════════════════════════════════════════════════════════════════════════════

/// One frame's worth of detector output (or a lifecycle signal).
#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    /// Exactly one hand this frame.  Multi-hand detections are collapsed
    /// to the first hand before they get here.
    Pose(HandPose),

    /// Frame processed, no hand visible.
    NoHand,

    /// The stream is over (frame read failed or device went away).  The
    /// loop treats this as end-of-stream, not an error to retry.
    End,

    /// The source itself asked to exit (sim quit key).
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// PoseSource trait — unified interface for camera and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SourceEvent`]s over a channel.
pub trait PoseSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn a pose source on its own thread and return the receiving end.
pub fn spawn_pose_source<S: PoseSource>(source: S) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimPoseSource — keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the HUD window in simulation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    /// Show a hand with this many fingers raised (keys `0`–`5`).
    ShowFingers(u8),
    /// Take the hand out of view (key `N`).
    HideHand,
    /// Quit (`Esc`).
    Quit,
}

/// Pose source driven by [`SimInput`] events from the HUD window.
///
/// Key presses become *synthetic* hand poses (via
/// [`HandPose::showing`]), so the real counting rule still runs on every
/// simulated frame — the simulator replaces the detector, not the
/// pipeline.
pub struct SimPoseSource {
    pub rx: Receiver<SimInput>,
}

impl PoseSource for SimPoseSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        for input in self.rx {
            let event = match input {
                SimInput::ShowFingers(n) => match FingerCount::new(n) {
                    Some(count) => SourceEvent::Pose(HandPose::showing(count)),
                    None => continue,
                },
                SimInput::HideHand => SourceEvent::NoHand,
                SimInput::Quit => {
                    let _ = tx.send(SourceEvent::Quit);
                    return;
                }
            };
            if tx.send(event).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CameraPoseSource — real webcam + landmark sidecar (feature = "camera")
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "camera")]
pub use camera::{CameraPoseSource, SourceError};

#[cfg(feature = "camera")]
mod camera {
    use super::{PoseSource, SourceEvent};
    use hand_pose::{HandPose, Keypoint, LANDMARK_COUNT};

    use std::io::{BufRead, BufReader, Write};
    use std::path::PathBuf;
    use std::process::{Child, ChildStdout, Command, Stdio};
    use std::sync::mpsc::Sender;

    use opencv::core::Mat;
    use opencv::prelude::*;
    use opencv::videoio::{VideoCapture, CAP_ANY};
    use serde::Deserialize;
    use thiserror::Error;
    use tracing::{debug, error, info, warn};

    /// Why the camera pipeline could not start.
    ///
    /// These surface before the frame loop begins; once streaming, frame
    /// failures end the stream instead of erroring.
    #[derive(Debug, Error)]
    pub enum SourceError {
        #[error("cannot open video device {0}")]
        CameraOpen(i32),

        #[error("camera error: {0}")]
        Camera(#[from] opencv::Error),

        #[error("landmark sidecar i/o: {0}")]
        Io(#[from] std::io::Error),

        #[error("landmark sidecar: {0}")]
        Sidecar(String),
    }

    // ── sidecar wire format ───────────────────────────────────────────────

    #[derive(Deserialize)]
    struct Detection {
        #[serde(default)]
        hands: Vec<DetectedHand>,
        #[serde(default)]
        error: Option<String>,
    }

    #[derive(Deserialize)]
    struct DetectedHand {
        landmarks: Vec<Keypoint>,
    }

    // ── LandmarkSidecar ───────────────────────────────────────────────────

    /// The MediaPipe hand-landmark helper process.
    ///
    /// Protocol: after a `READY` line on startup, each request is a
    /// 12-byte little-endian header (width, height, channels) followed by
    /// the raw BGR frame; each response is one JSON line listing detected
    /// hands with 21 normalized landmarks apiece.
    struct LandmarkSidecar {
        child: Child,
        stdout: BufReader<ChildStdout>,
    }

    impl LandmarkSidecar {
        fn start() -> Result<Self, SourceError> {
            let script = PathBuf::from("scripts/hand_landmarker.py");
            if !script.exists() {
                return Err(SourceError::Sidecar(format!(
                    "helper script not found at {}",
                    script.display()
                )));
            }

            let mut child = Command::new("python3")
                .arg(&script)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()?;

            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| SourceError::Sidecar("no stdout pipe".into()))?;
            let mut stdout = BufReader::new(stdout);

            let mut line = String::new();
            stdout.read_line(&mut line)?;
            if line.trim() != "READY" {
                let _ = child.kill();
                return Err(SourceError::Sidecar(format!(
                    "detector did not signal READY, got {:?}",
                    line.trim()
                )));
            }

            info!("hand-landmark sidecar ready");
            Ok(LandmarkSidecar { child, stdout })
        }

        /// Send one BGR frame, get back the first detected hand (if any).
        fn detect(&mut self, frame: &Mat) -> Result<Option<HandPose>, SourceError> {
            if frame.empty() {
                return Ok(None);
            }

            let width = frame.cols() as u32;
            let height = frame.rows() as u32;
            let channels = frame.channels() as u32;
            let data = frame.data_bytes()?;

            let stdin = self
                .child
                .stdin
                .as_mut()
                .ok_or_else(|| SourceError::Sidecar("stdin pipe closed".into()))?;
            stdin.write_all(&width.to_le_bytes())?;
            stdin.write_all(&height.to_le_bytes())?;
            stdin.write_all(&channels.to_le_bytes())?;
            stdin.write_all(data)?;
            stdin.flush()?;

            let mut line = String::new();
            self.stdout.read_line(&mut line)?;
            let detection: Detection = serde_json::from_str(&line)
                .map_err(|e| SourceError::Sidecar(format!("bad response: {e}")))?;

            if let Some(msg) = detection.error {
                warn!(error = %msg, "detector reported an error");
                return Ok(None);
            }

            // First hand only; anything without the full skeleton is
            // ignored.
            for hand in detection.hands {
                if hand.landmarks.len() != LANDMARK_COUNT {
                    warn!(got = hand.landmarks.len(), "short landmark list, skipping hand");
                    continue;
                }
                return Ok(HandPose::from_slice(&hand.landmarks));
            }
            Ok(None)
        }
    }

    impl Drop for LandmarkSidecar {
        fn drop(&mut self) {
            let _ = self.child.kill();
        }
    }

    // ── CameraPoseSource ──────────────────────────────────────────────────

    /// Pose source backed by a real webcam and the landmark sidecar.
    ///
    /// Construction opens the device and starts the sidecar, so a missing
    /// camera aborts before the loop ever runs.  Each captured frame is
    /// mirrored horizontally (selfie view, so moving a hand left moves it
    /// left on screen) before detection.
    pub struct CameraPoseSource {
        cam: VideoCapture,
        detector: LandmarkSidecar,
        device: i32,
    }

    impl CameraPoseSource {
        pub fn open(device: i32) -> Result<Self, SourceError> {
            let cam = VideoCapture::new(device, CAP_ANY)?;
            if !cam.is_opened()? {
                return Err(SourceError::CameraOpen(device));
            }
            let detector = LandmarkSidecar::start()?;
            info!(device, "camera opened");
            Ok(CameraPoseSource {
                cam,
                detector,
                device,
            })
        }
    }

    impl PoseSource for CameraPoseSource {
        fn run(mut self: Box<Self>, tx: Sender<SourceEvent>) {
            let mut frame = Mat::default();
            let mut mirrored = Mat::default();

            loop {
                match self.cam.read(&mut frame) {
                    Ok(true) if !frame.empty() => {}
                    _ => {
                        // Frame-fatal: end-of-stream, not a retry.
                        error!(device = self.device, "camera frame read failed");
                        break;
                    }
                }

                if let Err(e) = opencv::core::flip(&frame, &mut mirrored, 1) {
                    error!(error = %e, "frame flip failed");
                    break;
                }

                let event = match self.detector.detect(&mirrored) {
                    Ok(Some(pose)) => SourceEvent::Pose(pose),
                    Ok(None) => SourceEvent::NoHand,
                    Err(e) => {
                        warn!(error = %e, "detection failed on this frame");
                        SourceEvent::NoHand
                    }
                };

                debug!(?event, "frame processed");
                if tx.send(event).is_err() {
                    return; // consumer gone
                }
            }

            let _ = tx.send(SourceEvent::End);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::count_fingers;

    #[test]
    fn sim_keys_become_counted_poses() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_pose_source(SimPoseSource { rx: sim_rx });

        sim_tx.send(SimInput::ShowFingers(3)).unwrap();
        sim_tx.send(SimInput::HideHand).unwrap();
        sim_tx.send(SimInput::Quit).unwrap();

        match rx.recv().unwrap() {
            SourceEvent::Pose(pose) => assert_eq!(count_fingers(&pose).get(), 3),
            other => panic!("expected a pose, got {:?}", other),
        }
        assert_eq!(rx.recv().unwrap(), SourceEvent::NoHand);
        assert_eq!(rx.recv().unwrap(), SourceEvent::Quit);
    }

    #[test]
    fn sim_ignores_out_of_range_counts() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_pose_source(SimPoseSource { rx: sim_rx });

        sim_tx.send(SimInput::ShowFingers(9)).unwrap();
        sim_tx.send(SimInput::HideHand).unwrap();

        // The bogus count produced nothing; the next event is the hide.
        assert_eq!(rx.recv().unwrap(), SourceEvent::NoHand);
    }

    #[test]
    fn source_thread_ends_when_input_closes() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_pose_source(SimPoseSource { rx: sim_rx });

        drop(sim_tx);
        assert!(rx.recv().is_err());
    }
}
