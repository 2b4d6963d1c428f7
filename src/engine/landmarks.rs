// Hand skeleton as delivered by the perception provider.
//
// Coordinates are normalized image space: x/y in [0, 1], origin top-left,
// y increasing downward. z is a relative depth and is never used for
// planar measurements.

use glam::{Vec2, Vec3};

/// Number of points in one hand skeleton.
pub const LANDMARK_COUNT: usize = 21;

// ============================================================================
// LANDMARK INDICES
// ============================================================================

pub const WRIST: usize = 0;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// (tip, pip) pairs for the four non-thumb fingers, index first.
pub const FINGER_JOINTS: [(usize, usize); 4] = [
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (PINKY_TIP, PINKY_PIP),
];

// ============================================================================
// LANDMARK SET
// ============================================================================

/// One frame's 21-point hand skeleton. The array length is the invariant:
/// indices are fixed and a set can never be short.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSet {
    points: [Vec3; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Vec3; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a provider slice. Returns `None` unless it holds exactly 21 points.
    #[cfg(test)]
    pub fn from_slice(points: &[Vec3]) -> Option<Self> {
        let points: [Vec3; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    #[cfg(test)]
    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    /// x/y of a landmark, depth dropped.
    pub fn planar(&self, index: usize) -> Vec2 {
        self.points[index].truncate()
    }
}
