//! # hand_pose
//!
//! Hand landmark geometry: the 21-point hand skeleton produced by a
//! MediaPipe-style hand-landmark detector, and the geometric rule that
//! turns one detected pose into a raised-finger count.
//!
//! ## Landmark numbering
//!
//! | Index | Landmark |
//! |---|---|
//! | 0 | wrist |
//! | 1–4 | thumb (cmc, mcp, ip, **tip**) |
//! | 5–8 | index (mcp, **pip**, dip, **tip**) |
//! | 9–12 | middle (mcp, **pip**, dip, **tip**) |
//! | 13–16 | ring (mcp, **pip**, dip, **tip**) |
//! | 17–20 | pinky (mcp, **pip**, dip, **tip**) |
//!
//! Coordinates are normalized to `[0, 1]` relative to the frame, with `y`
//! growing **downward** (image convention).
//!
//! ## The counting rule
//!
//! A finger is "up" when its tip sits above its pip joint (`tip.y <
//! pip.y`).  The thumb is judged sideways instead: `tip.x > pip.x`.  The
//! thumb rule is orientation-dependent — it assumes a right hand in the
//! mirrored selfie view the capture path produces, and it is
//! intentionally *not* symmetric with the four y-based rules.  A left
//! hand or an unflipped frame can miscount; see [`Finger::is_raised`].

use serde::Deserialize;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

/// Indices into a [`HandPose`], MediaPipe hand-landmark numbering.
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Landmarks per detected hand.
pub const LANDMARK_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Keypoint
// ════════════════════════════════════════════════════════════════════════════

/// One landmark position, normalized to the frame.
///
/// `z` is the detector's relative depth (wrist-centred); the counting rule
/// never looks at it, but it is carried through so sources can hand over
/// detector output unmodified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Keypoint { x, y, z: 0.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandPose
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand: exactly [`LANDMARK_COUNT`] keypoints, indexed by the
/// [`landmark`] constants.
///
/// Poses are produced fresh each frame and consumed immediately; nothing
/// here persists across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct HandPose {
    keypoints: [Keypoint; LANDMARK_COUNT],
}

impl HandPose {
    /// Wrap a full set of keypoints.
    pub fn new(keypoints: [Keypoint; LANDMARK_COUNT]) -> Self {
        HandPose { keypoints }
    }

    /// Build from a detector's landmark list; `None` unless it holds
    /// exactly [`LANDMARK_COUNT`] entries.
    pub fn from_slice(points: &[Keypoint]) -> Option<Self> {
        let keypoints: [Keypoint; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(HandPose { keypoints })
    }

    pub fn keypoint(&self, index: usize) -> Keypoint {
        self.keypoints[index]
    }

    pub fn keypoints(&self) -> &[Keypoint; LANDMARK_COUNT] {
        &self.keypoints
    }

    // ── synthetic poses ──────────────────────────────────────────────────

    /// Synthesize a plausible pose with the given fingers raised, ordered
    /// `[thumb, index, middle, ring, pinky]`.
    ///
    /// The generated keypoints satisfy (or violate) each finger's
    /// raised-rule and stay inside the normalized frame, so the real
    /// counting rule can be exercised without a detector — this is what
    /// the simulation source and the unit tests feed through
    /// [`count_fingers`].
    pub fn with_fingers(raised: [bool; 5]) -> Self {
        let mut kp = [Keypoint::default(); LANDMARK_COUNT];

        // Wrist at the bottom centre of the frame.
        kp[landmark::WRIST] = Keypoint::new(0.50, 0.85);

        // Thumb chain runs sideways; raised means tip.x > ip.x.
        kp[landmark::THUMB_CMC] = Keypoint::new(0.44, 0.78);
        kp[landmark::THUMB_MCP] = Keypoint::new(0.40, 0.72);
        kp[landmark::THUMB_IP] = Keypoint::new(0.38, 0.66);
        kp[landmark::THUMB_TIP] = if raised[0] {
            Keypoint::new(0.44, 0.62)
        } else {
            Keypoint::new(0.32, 0.64)
        };

        // Four finger chains run upward in columns; raised means
        // tip.y < pip.y.
        let columns = [
            (Finger::Index, 0.44),
            (Finger::Middle, 0.50),
            (Finger::Ring, 0.56),
            (Finger::Pinky, 0.62),
        ];
        for (finger, x) in columns {
            let mcp = finger.tip() - 3;
            kp[mcp] = Keypoint::new(x, 0.60);
            kp[finger.pip()] = Keypoint::new(x, 0.48);
            kp[finger.pip() + 1] = Keypoint::new(x, 0.42);
            kp[finger.tip()] = if raised[finger as usize] {
                Keypoint::new(x, 0.30)
            } else {
                Keypoint::new(x, 0.58)
            };
        }

        HandPose { keypoints: kp }
    }

    /// Synthesize a pose showing `count` fingers the way people count:
    /// index first, then middle, ring, pinky, and finally the thumb.
    pub fn showing(count: FingerCount) -> Self {
        let order = [
            Finger::Index,
            Finger::Middle,
            Finger::Ring,
            Finger::Pinky,
            Finger::Thumb,
        ];
        let mut raised = [false; 5];
        for finger in order.iter().take(count.get() as usize) {
            raised[*finger as usize] = true;
        }
        HandPose::with_fingers(raised)
    }

    /// All five fingers raised (open palm).
    pub fn open_palm() -> Self {
        HandPose::with_fingers([true; 5])
    }

    /// No fingers raised (fist).
    pub fn fist() -> Self {
        HandPose::with_fingers([false; 5])
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

/// The five fingers, each pairing a tip landmark with the joint it is
/// compared against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finger {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Tip landmark index.
    pub fn tip(self) -> usize {
        match self {
            Finger::Thumb => landmark::THUMB_TIP,
            Finger::Index => landmark::INDEX_TIP,
            Finger::Middle => landmark::MIDDLE_TIP,
            Finger::Ring => landmark::RING_TIP,
            Finger::Pinky => landmark::PINKY_TIP,
        }
    }

    /// Joint the tip is compared against: the pip for the four fingers,
    /// the ip for the thumb.
    pub fn pip(self) -> usize {
        match self {
            Finger::Thumb => landmark::THUMB_IP,
            Finger::Index => landmark::INDEX_PIP,
            Finger::Middle => landmark::MIDDLE_PIP,
            Finger::Ring => landmark::RING_PIP,
            Finger::Pinky => landmark::PINKY_PIP,
        }
    }

    /// Whether this finger counts as "up" in `pose`.
    ///
    /// Thumb: `tip.x > pip.x` — valid for a right hand in a mirrored
    /// frame; a left hand or an unflipped frame can misread.  The
    /// asymmetry is known and kept.
    /// Other fingers: `tip.y < pip.y` (y grows downward).
    pub fn is_raised(self, pose: &HandPose) -> bool {
        let tip = pose.keypoint(self.tip());
        let pip = pose.keypoint(self.pip());
        match self {
            Finger::Thumb => tip.x > pip.x,
            _ => tip.y < pip.y,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FingerCount
// ════════════════════════════════════════════════════════════════════════════

/// A raised-finger count, guaranteed in `0..=5`.
///
/// Used as the key of a gesture map; absence of a hand is treated as
/// [`FingerCount::ZERO`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FingerCount(u8);

impl FingerCount {
    pub const ZERO: FingerCount = FingerCount(0);
    pub const MAX: u8 = 5;

    /// `None` if `n > 5`.
    pub fn new(n: u8) -> Option<Self> {
        (n <= Self::MAX).then_some(FingerCount(n))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for FingerCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Count the raised fingers in `pose`.
///
/// Pure and deterministic: five per-finger comparisons, nothing else.
pub fn count_fingers(pose: &HandPose) -> FingerCount {
    let up = Finger::ALL.iter().filter(|f| f.is_raised(pose)).count();
    FingerCount(up as u8)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
