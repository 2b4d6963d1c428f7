// Frame driver: turns each frame's hand signal into engine control calls.
//
//   open    → expand
//   fist    → attract to the hand
//   neutral → release both
//   pinch   → wave (once per pinch)
//   swipe   → next / previous template, rate limited
//
// Frames without a hand issue no control calls, so whatever was active keeps
// running.

use glam::{Vec2, Vec3};

use super::config::DriverConfig;
use super::hand_signal::{Gesture, HandSignal, Swipe};
use super::particles::ParticleEngine;

pub struct FrameDriver {
    config: DriverConfig,
    /// Half width/height of the visible z = 0 plane in world units.
    world_half_extent: Vec2,
    last_gesture: Option<Gesture>,
    last_switch_at: Option<f32>,
}

impl FrameDriver {
    pub fn new(config: DriverConfig, world_half_extent: Vec2) -> Self {
        Self {
            config,
            world_half_extent,
            last_gesture: None,
            last_switch_at: None,
        }
    }

    pub fn set_world_half_extent(&mut self, extent: Vec2) {
        self.world_half_extent = extent;
    }

    #[cfg(test)]
    pub fn last_gesture(&self) -> Option<Gesture> {
        self.last_gesture
    }

    /// Cursor in [-1, 1]² → world position on the z = 0 plane.
    pub fn to_world(&self, cursor: Vec3) -> Vec3 {
        (cursor.truncate() * self.world_half_extent).extend(0.0)
    }

    /// Apply control calls for this frame and return the signal with its cursor
    /// in world units, ready for `ParticleEngine::update`.
    pub fn drive(
        &mut self,
        engine: &mut ParticleEngine,
        signal: Option<HandSignal>,
        time: f32,
    ) -> Option<HandSignal> {
        let Some(signal) = signal else {
            if self.last_gesture.take().is_some() {
                log::debug!("Hand lost");
            }
            return None;
        };

        if self.last_gesture != Some(signal.gesture) {
            log::debug!("Gesture: {}", signal.gesture.as_str());
        }

        match signal.gesture {
            Gesture::Open => engine.set_expanded(true),
            Gesture::Fist => engine.set_attract(true),
            Gesture::Neutral => {
                engine.set_expanded(false);
                engine.set_attract(false);
            }
            Gesture::Pinch => {
                if self.last_gesture != Some(Gesture::Pinch) {
                    engine.trigger_wave();
                }
            }
        }
        self.last_gesture = Some(signal.gesture);

        let steps = match signal.swipe {
            Swipe::Left => 1,
            Swipe::Right => -1,
            Swipe::None => 0,
        };
        if steps != 0 && self.cooldown_elapsed(time) {
            let next = engine.templates().cycle(engine.target(), steps);
            log::debug!("Swipe {} → {}", signal.swipe.as_str(), next);
            engine.set_target(next);
            self.last_switch_at = Some(time);
        }

        Some(signal.with_position(self.to_world(signal.position)))
    }

    fn cooldown_elapsed(&self, time: f32) -> bool {
        self.last_switch_at
            .is_none_or(|last| time - last >= self.config.swipe_cooldown_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::BehaviorConfig;
    use crate::engine::hand_signal::FingerStates;
    use crate::engine::templates::{CUBE, SATURN, SPHERE, TemplateSet};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    fn setup() -> (FrameDriver, ParticleEngine) {
        let mut rng = StdRng::seed_from_u64(1);
        let templates = Arc::new(TemplateSet::generate(20, &mut rng));
        let engine = ParticleEngine::new(templates, BehaviorConfig::default(), SPHERE, &mut rng);
        let driver = FrameDriver::new(DriverConfig::default(), Vec2::new(10.0, 6.0));
        (driver, engine)
    }

    fn signal(gesture: Gesture, swipe: Swipe) -> Option<HandSignal> {
        Some(HandSignal {
            position: Vec3::new(0.5, -1.0, 0.0),
            proximity: 0.3,
            gesture,
            swipe,
            fingers: FingerStates::default(),
        })
    }

    #[test]
    fn maps_cursor_to_world_plane() {
        let (mut driver, mut engine) = setup();
        let out = driver.drive(&mut engine, signal(Gesture::Neutral, Swipe::None), 0.0).unwrap();
        assert_eq!(out.position, Vec3::new(5.0, -6.0, 0.0));
        assert_eq!(out.proximity, 0.3);
    }

    #[test]
    fn open_expands_and_fist_attracts() {
        let (mut driver, mut engine) = setup();
        driver.drive(&mut engine, signal(Gesture::Open, Swipe::None), 0.0);
        assert!(engine.behavior().expanded());

        driver.drive(&mut engine, signal(Gesture::Fist, Swipe::None), 0.1);
        assert!(engine.behavior().attracted());
        assert!(!engine.behavior().expanded());

        driver.drive(&mut engine, signal(Gesture::Neutral, Swipe::None), 0.2);
        assert!(!engine.behavior().attracted());
        assert!(!engine.behavior().expanded());
    }

    #[test]
    fn lost_hand_keeps_flags() {
        let (mut driver, mut engine) = setup();
        driver.drive(&mut engine, signal(Gesture::Open, Swipe::None), 0.0);
        assert!(driver.drive(&mut engine, None, 0.1).is_none());
        assert!(engine.behavior().expanded());
        assert_eq!(driver.last_gesture(), None);
    }

    #[test]
    fn held_pinch_triggers_one_wave() {
        let (mut driver, mut engine) = setup();
        driver.drive(&mut engine, signal(Gesture::Pinch, Swipe::None), 0.0);
        assert!(engine.behavior().waving());

        engine.update(0.5, None);
        let phase = engine.behavior().phase();
        assert!(phase > 0.0);

        // Holding the pinch must not restart the wave.
        driver.drive(&mut engine, signal(Gesture::Pinch, Swipe::None), 0.5);
        assert_eq!(engine.behavior().phase(), phase);
    }

    #[test]
    fn swipes_cycle_templates_with_cooldown() {
        let (mut driver, mut engine) = setup();
        driver.drive(&mut engine, signal(Gesture::Neutral, Swipe::Left), 1.0);
        assert_eq!(engine.target(), CUBE);

        // Within the cooldown: ignored.
        driver.drive(&mut engine, signal(Gesture::Neutral, Swipe::Left), 1.3);
        assert_eq!(engine.target(), CUBE);

        driver.drive(&mut engine, signal(Gesture::Neutral, Swipe::Left), 1.9);
        assert_eq!(engine.target(), SATURN);

        driver.drive(&mut engine, signal(Gesture::Neutral, Swipe::Right), 3.0);
        assert_eq!(engine.target(), CUBE);
    }
}
