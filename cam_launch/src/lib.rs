//! # cam_launch
//!
//! Webcam finger-gesture application launcher.  A hand-landmark detector
//! supplies 21 keypoints per frame; the number of raised fingers picks a
//! shell command out of a configurable table; a shared cooldown keeps a
//! sustained gesture from launching more than once per window.
//!
//! ## Pipeline
//!
//! | Stage | Where |
//! |---|---|
//! | frame → pose (or "no hand") | [`source`] — camera + detector sidecar, or keyboard sim |
//! | pose → finger count | `hand_pose::count_fingers` |
//! | count → maybe launch | [`dispatch`] — cooldown state machine, `sh -c` spawn |
//! | count / cooldown / table → pixels | [`hud`] |
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: digit keys pose a synthetic hand;
//!   the full counting and dispatch pipeline runs on it.
//! * `camera` — **Hardware mode**: captures the webcam via OpenCV and
//!   asks a MediaPipe sidecar process (`scripts/hand_landmarker.py`) for
//!   hand landmarks.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | `0`–`5` | Show a hand with that many fingers raised (hold to sustain) |
//! | `N` | No hand in view |
//! | `Esc` | Quit |
//!
//! ## Configuration
//!
//! `gestures.json` maps digit strings to commands; missing or malformed
//! files fall back to built-in defaults (see the `gesture_map` crate).
//! Commands run through a shell verbatim — treat the config file as
//! trusted input.

pub mod app;
pub mod dispatch;
pub mod hud;
pub mod source;
