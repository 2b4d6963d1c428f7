// Particle behavior engine: owns the particle buffers and moves every particle
// toward the current template, shaped by the behavior flags and the hand.
//
// Per update, in order:
//   1. glow eases toward hand proximity (0 without a hand)
//   2. wave phase advances while waving
//   3. per particle: template → expand → wave → attract → ease → repel/heat
//   4. buffers are marked dirty for the renderer
//
// All constants are per call, not per second: the motion is coupled to the
// frame rate of whoever calls `update`.

use std::sync::Arc;

use glam::Vec3;
use rand::Rng;

use super::behavior::Behavior;
use super::config::BehaviorConfig;
use super::hand_signal::HandSignal;
use super::templates::{self, TemplateSet};

/// Red channel above this counts as "hot" and decays back.
const HOT_THRESHOLD: f32 = 0.5;

pub struct ParticleEngine {
    templates: Arc<TemplateSet>,
    config: BehaviorConfig,
    behavior: Behavior,
    glow: f32,

    positions: Vec<f32>,
    colors: Vec<f32>,
    scales: Vec<f32>,
    dirty: bool,
}

impl ParticleEngine {
    /// Particles start scattered on the `random` template and fly toward `initial_target`
    /// (falling back to `random` if that name is unknown).
    pub fn new<R: Rng>(
        templates: Arc<TemplateSet>,
        config: BehaviorConfig,
        initial_target: &str,
        rng: &mut R,
    ) -> Self {
        let count = templates.count();
        let positions = templates
            .get(templates::RANDOM)
            .map(|t| t.coords().to_vec())
            .unwrap_or_else(|| vec![0.0; count * 3]);

        let mut colors = Vec::with_capacity(count * 3);
        for _ in 0..count {
            colors.extend_from_slice(&[
                rng.gen_range(0.1..0.3),
                rng.gen_range(0.4..0.8),
                1.0,
            ]);
        }
        let scales = (0..count).map(|_| rng.gen_range(0.5..1.5)).collect();

        let target = match templates.get(initial_target) {
            Some(t) => t.name(),
            None => {
                log::warn!("Unknown initial template '{}', using '{}'", initial_target, templates::RANDOM);
                templates::RANDOM
            }
        };

        Self {
            templates,
            config,
            behavior: Behavior::new(target),
            glow: 0.0,
            positions,
            colors,
            scales,
            dirty: true,
        }
    }

    // ------------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------------

    /// Switch to a named template. Unknown names are ignored.
    pub fn set_target(&mut self, name: &str) {
        match self.templates.get(name) {
            Some(template) => {
                log::info!("Target template: {}", template.name());
                self.behavior.retarget(template.name());
            }
            None => log::debug!("Ignoring unknown template '{}'", name),
        }
    }

    pub fn set_expanded(&mut self, state: bool) {
        self.behavior.set_expanded(state);
    }

    pub fn set_attract(&mut self, state: bool) {
        self.behavior.set_attract(state);
    }

    /// Start a wave; it ends `wave_duration_secs` after the time passed to the next `update`.
    pub fn trigger_wave(&mut self) {
        self.behavior.trigger_wave(self.config.wave_duration_secs);
    }

    /// Advance one frame. `time` is the frame clock in seconds and only
    /// decides when a wave ends; all motion steps are per call.
    pub fn update(&mut self, time: f32, hand: Option<&HandSignal>) {
        let cfg = &self.config;
        self.behavior.advance_clock(time);

        let proximity = hand.map_or(0.0, |h| h.proximity);
        self.glow += (proximity - self.glow) * cfg.glow_smoothing;

        self.behavior.step_wave(cfg.wave_phase_step);

        let Some(template) = self.templates.get(self.behavior.target()) else {
            return;
        };

        let expanded = self.behavior.expanded();
        let attracted = self.behavior.attracted();
        let waving = self.behavior.waving();
        let phase = self.behavior.phase();
        let cursor = hand.map(|h| h.position);
        let attract_pos = cursor.unwrap_or(Vec3::ZERO);
        let repel_sq = cfg.repel_radius * cfg.repel_radius;

        for (i, (pos_slot, color)) in self
            .positions
            .chunks_exact_mut(3)
            .zip(self.colors.chunks_exact_mut(3))
            .enumerate()
        {
            let mut target = template.point(i);
            if expanded {
                target *= cfg.expand_factor;
            }
            if waving {
                target.y += (target.x * cfg.wave_frequency + phase).sin() * cfg.wave_amplitude;
            }
            if attracted {
                target = attract_pos + target * cfg.attract_scale;
            }

            let mut pos = Vec3::from_slice(pos_slot);
            pos += (target - pos) * cfg.ease;

            if let Some(cursor) = cursor.filter(|_| !attracted) {
                let away = pos - cursor;
                let dist_sq = away.length_squared();
                if dist_sq < repel_sq {
                    let dist = dist_sq.sqrt();
                    pos += away.normalize_or_zero() * (cfg.repel_radius - dist) * cfg.repel_strength;
                    color[0] = 1.0;
                }
            }
            if color[0] > HOT_THRESHOLD {
                color[0] -= cfg.heat_decay;
            }

            pos_slot.copy_from_slice(&pos.to_array());
        }

        self.dirty = true;
    }

    // ------------------------------------------------------------------------
    // Renderer-facing state
    // ------------------------------------------------------------------------

    pub fn count(&self) -> usize {
        self.scales.len()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    pub fn glow(&self) -> f32 {
        self.glow
    }

    pub fn target(&self) -> &'static str {
        self.behavior.target()
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// True if the buffers changed since the last call. Clears the mark.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::hand_signal::{FingerStates, Gesture, Swipe};
    use crate::engine::templates::{CUBE, CUBE_HALF_EXTENT, SPHERE, SPHERE_RADIUS};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn engine(count: usize, target: &str) -> ParticleEngine {
        let mut rng = StdRng::seed_from_u64(42);
        let templates = Arc::new(TemplateSet::generate(count, &mut rng));
        ParticleEngine::new(templates, BehaviorConfig::default(), target, &mut rng)
    }

    fn hand_at(position: Vec3, proximity: f32) -> HandSignal {
        HandSignal {
            position,
            proximity,
            gesture: Gesture::Neutral,
            swipe: Swipe::None,
            fingers: FingerStates::default(),
        }
    }

    fn point(buf: &[f32], i: usize) -> Vec3 {
        Vec3::from_slice(&buf[i * 3..i * 3 + 3])
    }

    fn distance_to_template(e: &ParticleEngine, i: usize) -> f32 {
        let t = e.templates().get(e.target()).unwrap();
        point(e.positions(), i).distance(t.point(i))
    }

    #[test]
    fn buffers_have_fixed_lengths() {
        let e = engine(250, SPHERE);
        assert_eq!(e.count(), 250);
        assert_eq!(e.positions().len(), 750);
        assert_eq!(e.colors().len(), 750);
        assert_eq!(e.scales().len(), 250);
        assert!(e.colors().chunks(3).all(|c| c[0] <= HOT_THRESHOLD));
    }

    #[test]
    fn unknown_target_is_a_no_op() {
        let mut e = engine(10, SPHERE);
        e.set_expanded(true);
        e.set_target("torus");
        assert_eq!(e.target(), SPHERE);
        assert!(e.behavior().expanded());
    }

    #[test]
    fn unknown_initial_target_falls_back_to_random() {
        let e = engine(10, "nope");
        assert_eq!(e.target(), templates::RANDOM);
    }

    #[test]
    fn set_target_clears_flags() {
        let mut e = engine(10, SPHERE);
        e.set_attract(true);
        e.set_target(CUBE);
        assert_eq!(e.target(), CUBE);
        assert!(!e.behavior().attracted());
        assert!(!e.behavior().expanded());
    }

    #[test]
    fn distance_to_target_shrinks_geometrically() {
        let mut e = engine(50, SPHERE);
        for frame in 0..20 {
            let before: Vec<f32> = (0..50).map(|i| distance_to_template(&e, i)).collect();
            e.update(frame as f32 / 60.0, None);
            for (i, d0) in before.iter().enumerate() {
                let d1 = distance_to_template(&e, i);
                assert!((d1 - d0 * 0.95).abs() < 1e-4, "particle {i}: {d0} -> {d1}");
            }
        }
    }

    #[test]
    fn expansion_doubles_sphere_radius() {
        let mut e = engine(100, SPHERE);
        e.set_expanded(true);
        for frame in 0..300 {
            e.update(frame as f32 / 60.0, None);
        }
        for i in 0..e.count() {
            let r = point(e.positions(), i).length();
            assert!((r - SPHERE_RADIUS * 2.0).abs() < 0.01, "radius {r}");
        }
    }

    #[test]
    fn settles_inside_cube_without_a_hand() {
        let mut e = engine(100, SPHERE);
        e.set_target(CUBE);
        for frame in 0..200 {
            e.update(frame as f32 / 60.0, None);
        }
        let tolerance = 0.01;
        assert!(e.positions().iter().all(|c| c.abs() <= CUBE_HALF_EXTENT + tolerance));
        assert_eq!(e.glow(), 0.0);
    }

    #[test]
    fn glow_eases_toward_proximity() {
        let mut e = engine(10, SPHERE);
        let hand = hand_at(Vec3::new(100.0, 100.0, 0.0), 1.0);
        e.update(0.0, Some(&hand));
        assert!((e.glow() - 0.1).abs() < 1e-6);
        e.update(0.0, Some(&hand));
        assert!((e.glow() - 0.19).abs() < 1e-6);

        for _ in 0..200 {
            e.update(0.0, None);
        }
        assert!(e.glow() < 1e-6);
    }

    #[test]
    fn attraction_pulls_shrunken_template_to_cursor() {
        let mut e = engine(100, SPHERE);
        e.set_expanded(true);
        e.set_attract(true);
        let cursor = Vec3::new(3.0, -2.0, 0.0);
        let hand = hand_at(cursor, 0.5);
        for frame in 0..400 {
            e.update(frame as f32 / 60.0, Some(&hand));
        }
        // Expansion was cleared by attraction, so the shrunken radius is 4 * 0.1.
        for i in 0..e.count() {
            let r = point(e.positions(), i).distance(cursor);
            assert!((r - SPHERE_RADIUS * 0.1).abs() < 0.01, "radius {r}");
        }
        // Attraction disables repulsion, so nothing heats up.
        assert!(e.colors().chunks(3).all(|c| c[0] <= HOT_THRESHOLD));
    }

    #[test]
    fn attraction_without_hand_uses_origin() {
        let mut e = engine(50, CUBE);
        e.set_attract(true);
        for frame in 0..400 {
            e.update(frame as f32 / 60.0, None);
        }
        let limit = CUBE_HALF_EXTENT * 0.1 + 0.01;
        assert!(e.positions().iter().all(|c| c.abs() <= limit));
    }

    #[test]
    fn repulsion_pushes_and_heats_nearby_particles() {
        let mut e = engine(200, SPHERE);
        for frame in 0..300 {
            e.update(frame as f32 / 60.0, None);
        }
        // Cursor on the sphere surface: some particles are within reach.
        let cursor = Vec3::new(SPHERE_RADIUS, 0.0, 0.0);
        let hand = hand_at(cursor, 0.0);
        let before: Vec<Vec3> = (0..e.count()).map(|i| point(e.positions(), i)).collect();
        e.update(5.0, Some(&hand));

        let mut hot = 0;
        for (i, p0) in before.iter().enumerate() {
            let p1 = point(e.positions(), i);
            let color = &e.colors()[i * 3..i * 3 + 3];
            if color[0] > HOT_THRESHOLD {
                hot += 1;
                // Hot marker is set to 1.0 then decays once in the same update.
                assert!((color[0] - 0.98).abs() < 1e-6);
                assert!(p1.distance(cursor) > p0.distance(cursor) - 1e-4);
            }
        }
        assert!(hot > 0);
    }

    #[test]
    fn heat_decays_after_hand_leaves() {
        let mut e = engine(200, SPHERE);
        for frame in 0..300 {
            e.update(frame as f32 / 60.0, None);
        }
        e.update(5.0, Some(&hand_at(Vec3::new(SPHERE_RADIUS, 0.0, 0.0), 0.0)));
        for _ in 0..30 {
            e.update(5.0, None);
        }
        // 0.98 - 30 * 0.02 = 0.38 is below the threshold, so decay stops just under it.
        for c in e.colors().chunks(3) {
            assert!(c[0] <= HOT_THRESHOLD + 1e-6);
        }
    }

    #[test]
    fn wave_ends_after_duration_then_phase_freezes() {
        let mut e = engine(50, CUBE);
        e.update(0.0, None);
        e.trigger_wave();
        assert!(e.behavior().waving());

        e.update(0.5, None);
        assert!((e.behavior().phase() - 0.1).abs() < 1e-6);

        e.update(1.9, None);
        assert!(e.behavior().waving());
        e.update(2.0, None);
        assert!(!e.behavior().waving());
        let phase = e.behavior().phase();
        e.update(2.1, None);
        assert_eq!(e.behavior().phase(), phase);
    }

    #[test]
    fn wave_triggered_before_first_update_lasts_full_duration() {
        let mut e = engine(10, CUBE);
        e.trigger_wave();

        e.update(100.0, None);
        assert!(e.behavior().waving());
        e.update(101.4, None);
        assert!(e.behavior().waving());
        e.update(101.5, None);
        assert!(!e.behavior().waving());
    }

    fn wave_offset(x: f32, phase: f32) -> Vec3 {
        Vec3::Y * ((x * 0.5 + phase).sin() * 2.0)
    }

    /// Run one update and compare every particle with `p0 + (target - p0) * 0.05`.
    fn assert_one_step(
        e: &mut ParticleEngine,
        hand: Option<&HandSignal>,
        target_of: impl Fn(Vec3, f32) -> Vec3,
    ) {
        let before: Vec<Vec3> = (0..e.count()).map(|i| point(e.positions(), i)).collect();
        e.update(0.0, hand);
        let phase = e.behavior().phase();
        let template = e.templates().get(e.target()).unwrap();
        for (i, p0) in before.iter().enumerate() {
            let target = target_of(template.point(i), phase);
            let expected = *p0 + (target - *p0) * 0.05;
            let got = point(e.positions(), i);
            assert!(got.distance(expected) < 1e-5, "particle {i}: {got} vs {expected}");
        }
    }

    #[test]
    fn wave_offsets_target_height_by_sine_of_x() {
        let mut e = engine(50, CUBE);
        e.trigger_wave();
        assert_one_step(&mut e, None, |t, phase| t + wave_offset(t.x, phase));
        assert!((e.behavior().phase() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn wave_reads_x_after_expansion() {
        let mut e = engine(50, CUBE);
        e.set_expanded(true);
        e.trigger_wave();
        assert_one_step(&mut e, None, |t, phase| {
            let t = t * 2.0;
            t + wave_offset(t.x, phase)
        });
    }

    #[test]
    fn attraction_shrinks_the_waved_target_around_cursor() {
        let mut e = engine(50, SPHERE);
        e.set_attract(true);
        e.trigger_wave();
        let cursor = Vec3::new(3.0, -2.0, 0.0);
        let hand = hand_at(cursor, 0.0);
        assert_one_step(&mut e, Some(&hand), |t, phase| {
            cursor + (t + wave_offset(t.x, phase)) * 0.1
        });
    }

    #[test]
    fn repulsion_push_falls_off_linearly_with_distance() {
        let mut e = engine(2000, SPHERE);
        let cursor = Vec3::ZERO;
        let before: Vec<Vec3> = (0..e.count()).map(|i| point(e.positions(), i)).collect();
        let red_before: Vec<f32> = e.colors().chunks(3).map(|c| c[0]).collect();
        e.update(0.0, Some(&hand_at(cursor, 0.0)));

        let template = e.templates().get(SPHERE).unwrap();
        let mut pushed = 0;
        for (i, p0) in before.iter().enumerate() {
            let eased = *p0 + (template.point(i) - *p0) * 0.05;
            let d = eased.distance(cursor);
            let got = point(e.positions(), i);
            let red = e.colors()[i * 3];
            if d < 2.0 {
                pushed += 1;
                let expected = eased + (eased - cursor).normalize_or_zero() * (2.0 - d) * 0.15;
                assert!(got.distance(expected) < 1e-5, "particle {i}: {got} vs {expected}");
                assert!((red - 0.98).abs() < 1e-6);
            } else {
                assert!(got.distance(eased) < 1e-5, "particle {i}: {got} vs {eased}");
                assert_eq!(red, red_before[i]);
            }
        }
        assert!(pushed > 0);
    }

    #[test]
    fn take_dirty_reports_once_per_update() {
        let mut e = engine(10, SPHERE);
        assert!(e.take_dirty());
        assert!(!e.take_dirty());
        e.update(0.0, None);
        assert!(e.take_dirty());
        assert!(!e.take_dirty());
    }
}
