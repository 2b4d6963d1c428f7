// Simulated perception provider: builds a 21-point landmark set from mouse
// and keyboard so the app runs without a camera hand tracker.
//
//   mouse      → index fingertip position
//   1/2/3/4    → open / fist / pinch / point pose
//   H          → hand present / absent
//   scroll     → hand size (wrist to middle-MCP span, i.e. proximity)
//
// Fast horizontal mouse motion moves the palm far enough between frames to
// register as a swipe in the extractor.

use glam::Vec2;
use winit::keyboard::KeyCode;

use super::input::InputState;
use super::landmarks::*;

/// Allowed wrist to middle-MCP span, normalized image units.
const MIN_SPAN: f32 = 0.1;
const MAX_SPAN: f32 = 0.45;
/// Span change per scroll line.
const SPAN_PER_SCROLL: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Open,
    Fist,
    Pinch,
    /// Index finger out, the rest curled.
    Point,
}

pub struct SimulatedHand {
    pub present: bool,
    pub pose: Pose,
    /// Wrist to middle-MCP distance.
    pub span: f32,
}

impl SimulatedHand {
    pub fn new() -> Self {
        Self {
            present: true,
            pose: Pose::Open,
            span: 0.2,
        }
    }

    /// Update pose and presence from this frame's keys and scroll.
    pub fn handle_input(&mut self, input: &InputState) {
        if input.was_key_pressed(KeyCode::KeyH) {
            self.present = !self.present;
            log::info!("Simulated hand {}", if self.present { "shown" } else { "hidden" });
        }
        let poses = [
            (KeyCode::Digit1, Pose::Open),
            (KeyCode::Digit2, Pose::Fist),
            (KeyCode::Digit3, Pose::Pinch),
            (KeyCode::Digit4, Pose::Point),
        ];
        for (key, pose) in poses {
            if input.was_key_pressed(key) {
                self.pose = pose;
            }
        }
        if input.scroll_delta != 0.0 {
            self.span = (self.span + input.scroll_delta * SPAN_PER_SCROLL).clamp(MIN_SPAN, MAX_SPAN);
        }
    }

    /// Landmarks with the index tip at `tip` (normalized image coordinates),
    /// or `None` while the hand is hidden.
    pub fn landmarks(&self, tip: Vec2) -> Option<LandmarkSet> {
        self.present.then(|| pose_landmarks(self.pose, self.span, tip))
    }
}

/// Lay out a hand in "span units" (wrist at the origin, middle MCP one unit
/// up, y down like the image), then scale by `span` and shift so the index
/// tip lands on `tip`.
fn pose_landmarks(pose: Pose, span: f32, tip: Vec2) -> LandmarkSet {
    let mut local = [Vec2::ZERO; LANDMARK_COUNT];
    local[WRIST] = Vec2::ZERO;

    let curled = match pose {
        Pose::Open => [false; 4],
        Pose::Fist => [true; 4],
        Pose::Pinch | Pose::Point => [false, true, true, true],
    };
    // (mcp, pip, tip, x column)
    let fingers = [
        (INDEX_MCP, INDEX_PIP, INDEX_TIP, -0.35),
        (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, 0.0),
        (RING_MCP, RING_PIP, RING_TIP, 0.3),
        (PINKY_MCP, PINKY_PIP, PINKY_TIP, 0.55),
    ];
    for (finger, &(mcp, pip, fingertip, x)) in fingers.iter().enumerate() {
        local[mcp] = Vec2::new(x, -1.0);
        local[pip] = Vec2::new(x, -1.5);
        // Joints between PIP and tip are filled in for completeness.
        local[pip + 1] = Vec2::new(x, if curled[finger] { -1.35 } else { -1.8 });
        local[fingertip] = Vec2::new(x, if curled[finger] { -1.1 } else { -2.1 });
    }

    local[1] = Vec2::new(-0.3, -0.2);
    local[THUMB_MCP] = Vec2::new(-0.5, -0.4);
    local[THUMB_IP] = Vec2::new(-0.8, -0.7);
    local[THUMB_TIP] = match pose {
        Pose::Fist => Vec2::new(0.2, -0.5),
        _ => Vec2::new(-1.0, -1.0),
    };

    let mut points = local.map(|p| p * span);
    if pose == Pose::Pinch {
        // Thumb tip right next to the index tip, independent of hand size.
        points[THUMB_TIP] = points[INDEX_TIP] + Vec2::new(0.01, 0.0);
    }

    let offset = tip - points[INDEX_TIP];
    LandmarkSet::new(points.map(|p| (p + offset).extend(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::HandConfig;
    use crate::engine::hand_signal::{Gesture, HandSignalExtractor, Swipe};

    fn gesture_of(pose: Pose, span: f32) -> Gesture {
        let hand = SimulatedHand { present: true, pose, span };
        let set = hand.landmarks(Vec2::new(0.5, 0.4)).unwrap();
        HandSignalExtractor::new(HandConfig::default())
            .process(Some(&set))
            .unwrap()
            .gesture
    }

    #[test]
    fn poses_classify_as_intended_at_every_size() {
        for span in [MIN_SPAN, 0.2, MAX_SPAN] {
            assert_eq!(gesture_of(Pose::Open, span), Gesture::Open, "span {span}");
            assert_eq!(gesture_of(Pose::Fist, span), Gesture::Fist, "span {span}");
            assert_eq!(gesture_of(Pose::Pinch, span), Gesture::Pinch, "span {span}");
            assert_eq!(gesture_of(Pose::Point, span), Gesture::Neutral, "span {span}");
        }
    }

    #[test]
    fn index_tip_follows_the_mouse() {
        let hand = SimulatedHand::new();
        let set = hand.landmarks(Vec2::new(0.3, 0.6)).unwrap();
        assert!((set.planar(INDEX_TIP) - Vec2::new(0.3, 0.6)).length() < 1e-6);
    }

    #[test]
    fn span_sets_proximity() {
        let hand = SimulatedHand { present: true, pose: Pose::Open, span: 0.3 };
        let set = hand.landmarks(Vec2::splat(0.5)).unwrap();
        let signal = HandSignalExtractor::new(HandConfig::default()).process(Some(&set)).unwrap();
        assert!((signal.proximity - 0.6).abs() < 1e-4);
    }

    #[test]
    fn hidden_hand_has_no_landmarks() {
        let hand = SimulatedHand { present: false, pose: Pose::Open, span: 0.2 };
        assert!(hand.landmarks(Vec2::splat(0.5)).is_none());
    }

    #[test]
    fn fast_mouse_motion_swipes() {
        let hand = SimulatedHand::new();
        let mut ex = HandSignalExtractor::new(HandConfig::default());
        ex.process(hand.landmarks(Vec2::new(0.4, 0.5)).as_ref());
        let signal = ex.process(hand.landmarks(Vec2::new(0.5, 0.5)).as_ref()).unwrap();
        assert_eq!(signal.swipe, Swipe::Left);
    }
}
