// Hand signal extraction: landmark set → cursor, proximity, gesture, swipe.
//
// One frame of history (the previous palm x) is the only state. A frame
// with no hand clears it, so a swipe always needs two consecutive frames
// with a hand.

use glam::{Vec2, Vec3};

use super::config::HandConfig;
use super::landmarks::*;

/// Slack on the swipe threshold so a decimal delta equal to the threshold
/// (e.g. 0.50 → 0.47) is not pushed over it by binary rounding.
const SWIPE_EPSILON: f32 = 1e-6;

// ============================================================================
// SIGNAL TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Open,
    Fist,
    Pinch,
    Neutral,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Fist => "fist",
            Self::Pinch => "pinch",
            Self::Neutral => "neutral",
        }
    }
}

/// Horizontal swipe direction.
///
/// A positive palm x delta reports `Left` and a negative one `Right`. The
/// convention is fixed and names image-space direction only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Swipe {
    None,
    Left,
    Right,
}

impl Swipe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Which fingers point away from the wrist. The thumb is tracked for display
/// only; classification looks at the other four.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    /// Number of extended non-thumb fingers (0–4).
    pub fn extended_count(&self) -> usize {
        [self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|e| **e)
            .count()
    }
}

/// Per-frame summary of the tracked hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSignal {
    /// Cursor in [-1, 1] with y up and z = 0, until the frame driver maps it
    /// into world units.
    pub position: Vec3,
    /// 0 = far from the camera, 1 = close.
    pub proximity: f32,
    pub gesture: Gesture,
    pub swipe: Swipe,
    pub fingers: FingerStates,
}

impl HandSignal {
    pub fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

pub struct HandSignalExtractor {
    config: HandConfig,
    /// Palm-proxy x from the previous frame with a hand.
    prev_palm_x: Option<f32>,
}

impl HandSignalExtractor {
    pub fn new(config: HandConfig) -> Self {
        Self {
            config,
            prev_palm_x: None,
        }
    }

    /// Process one perception frame. `None` in, `None` out, history reset.
    pub fn process(&mut self, landmarks: Option<&LandmarkSet>) -> Option<HandSignal> {
        let Some(hand) = landmarks else {
            self.prev_palm_x = None;
            return None;
        };

        let fingers = finger_states(hand);
        Some(HandSignal {
            position: cursor_position(hand),
            proximity: self.proximity(hand),
            gesture: self.classify(hand, &fingers),
            swipe: self.detect_swipe(hand),
            fingers,
        })
    }

    #[cfg(test)]
    pub fn has_history(&self) -> bool {
        self.prev_palm_x.is_some()
    }

    fn proximity(&self, hand: &LandmarkSet) -> f32 {
        let span = hand.planar(WRIST).distance(hand.planar(MIDDLE_MCP));
        ((span - self.config.proximity_offset) * self.config.proximity_gain).clamp(0.0, 1.0)
    }

    fn classify(&self, hand: &LandmarkSet, fingers: &FingerStates) -> Gesture {
        let pinch_gap = hand.planar(THUMB_TIP).distance(hand.planar(INDEX_TIP));
        if pinch_gap < self.config.pinch_threshold {
            return Gesture::Pinch;
        }
        match fingers.extended_count() {
            4 => Gesture::Open,
            0 => Gesture::Fist,
            _ => Gesture::Neutral,
        }
    }

    fn detect_swipe(&mut self, hand: &LandmarkSet) -> Swipe {
        let palm_x = hand.planar(MIDDLE_MCP).x;
        let swipe = match self.prev_palm_x {
            Some(prev) => {
                let delta = palm_x - prev;
                if delta.abs() > self.config.swipe_threshold + SWIPE_EPSILON {
                    if delta > 0.0 { Swipe::Left } else { Swipe::Right }
                } else {
                    Swipe::None
                }
            }
            None => Swipe::None,
        };
        self.prev_palm_x = Some(palm_x);
        swipe
    }
}

/// Index fingertip mapped from image space to [-1, 1], y flipped to point up.
fn cursor_position(hand: &LandmarkSet) -> Vec3 {
    let tip = hand.planar(INDEX_TIP);
    Vec3::new((tip.x - 0.5) * 2.0, (0.5 - tip.y) * 2.0, 0.0)
}

fn finger_states(hand: &LandmarkSet) -> FingerStates {
    let wrist = hand.planar(WRIST);
    let extended = |(tip, pip): (usize, usize)| is_extended(wrist, hand.planar(tip), hand.planar(pip));
    let [index, middle, ring, pinky] = FINGER_JOINTS.map(|joints| extended(joints));
    FingerStates {
        thumb: extended((THUMB_TIP, THUMB_IP)),
        index,
        middle,
        ring,
        pinky,
    }
}

/// A finger is extended when its tip is farther from the wrist than its PIP joint.
fn is_extended(wrist: Vec2, tip: Vec2, pip: Vec2) -> bool {
    tip.distance_squared(wrist) > pip.distance_squared(wrist)
}
