// Target shapes for the particle cloud.
//
// Each template is a flat [x0, y0, z0, x1, ...] buffer of exactly count*3
// scalars, generated once at startup and shared read-only between engines.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rand::Rng;

pub const RANDOM: &str = "random";
pub const SPHERE: &str = "sphere";
pub const CUBE: &str = "cube";
pub const SATURN: &str = "saturn";

/// Cycling order used by swipes.
pub const TEMPLATE_NAMES: [&str; 4] = [RANDOM, SPHERE, CUBE, SATURN];

pub const RANDOM_EXTENT: f32 = 6.0;
pub const SPHERE_RADIUS: f32 = 4.0;
pub const CUBE_HALF_EXTENT: f32 = 2.5;
pub const SATURN_PLANET_RADIUS: f32 = 2.5;
pub const SATURN_RING_INNER: f32 = 3.5;
pub const SATURN_RING_OUTER: f32 = 7.5;
pub const SATURN_RING_JITTER: f32 = 0.1;
/// Ring tilt about the Z axis, radians.
pub const SATURN_TILT: f32 = 0.4;

// ============================================================================
// TEMPLATE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: &'static str,
    coords: Vec<f32>,
}

impl Template {
    fn from_points(name: &'static str, points: impl Iterator<Item = Vec3>) -> Self {
        let coords = points.flat_map(|p| p.to_array()).collect();
        Self { name, coords }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn coords(&self) -> &[f32] {
        &self.coords
    }

    pub fn point(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.coords[index * 3..index * 3 + 3])
    }

}

// ============================================================================
// TEMPLATE SET
// ============================================================================

/// All generated templates for one particle count.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    count: usize,
    templates: Vec<Template>,
}

impl TemplateSet {
    pub fn generate<R: Rng>(count: usize, rng: &mut R) -> Self {
        let templates = vec![
            random_cloud(count, rng),
            sphere(count, rng),
            cube(count, rng),
            saturn(count, rng),
        ];
        log::debug!("Generated {} templates for {} particles", templates.len(), count);
        Self { count, templates }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Look up a template by name. Unknown names are simply absent.
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Name `steps` positions after `current` in `TEMPLATE_NAMES` order
    /// (negative goes back). An unknown `current` counts as the first name.
    pub fn cycle(&self, current: &str, steps: isize) -> &'static str {
        let len = TEMPLATE_NAMES.len() as isize;
        let pos = TEMPLATE_NAMES
            .iter()
            .position(|&name| name == current)
            .unwrap_or(0) as isize;
        TEMPLATE_NAMES[(pos + steps).rem_euclid(len) as usize]
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

fn random_cloud<R: Rng>(count: usize, rng: &mut R) -> Template {
    let e = RANDOM_EXTENT;
    Template::from_points(
        RANDOM,
        (0..count).map(|_| Vec3::new(rng.gen_range(-e..=e), rng.gen_range(-e..=e), rng.gen_range(-e..=e))),
    )
}

fn sphere<R: Rng>(count: usize, rng: &mut R) -> Template {
    Template::from_points(SPHERE, (0..count).map(|_| sphere_point(SPHERE_RADIUS, &mut *rng)))
}

fn cube<R: Rng>(count: usize, rng: &mut R) -> Template {
    let h = CUBE_HALF_EXTENT;
    Template::from_points(
        CUBE,
        (0..count).map(|_| Vec3::new(rng.gen_range(-h..=h), rng.gen_range(-h..=h), rng.gen_range(-h..=h))),
    )
}

fn saturn<R: Rng>(count: usize, rng: &mut R) -> Template {
    let planet = planet_count(count);
    let tilt = Quat::from_rotation_z(SATURN_TILT);
    Template::from_points(
        SATURN,
        (0..count).map(|i| {
            if i < planet {
                sphere_point(SATURN_PLANET_RADIUS, &mut *rng)
            } else {
                let radius = rng.gen_range(SATURN_RING_INNER..=SATURN_RING_OUTER);
                let angle = rng.gen_range(0.0..TAU);
                let jitter = rng.gen_range(-SATURN_RING_JITTER..=SATURN_RING_JITTER);
                tilt * Vec3::new(radius * angle.cos(), jitter, radius * angle.sin())
            }
        }),
    )
}

/// Number of saturn particles on the planet (40%); the rest form the ring.
pub fn planet_count(count: usize) -> usize {
    count * 2 / 5
}

/// Uniform point on a sphere surface. `phi = acos(2u - 1)` keeps the area
/// density uniform instead of bunching at the poles.
fn sphere_point<R: Rng>(radius: f32, rng: &mut R) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let phi = (2.0 * rng.gen_range(0.0f32..=1.0) - 1.0).acos();
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    )
}
