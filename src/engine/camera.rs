// Viewer camera for the particle cloud.
//
// Camera model:
//   - Eye on the +Z axis looking at the origin, Y up
//   - The z = 0 plane is where the hand cursor lives, so its visible extent
//     is what the frame driver maps the [-1, 1] cursor onto

use glam::{Mat4, Vec2, Vec3};

pub struct ViewCamera {
    /// Distance from the origin along +Z.
    pub distance: f32,

    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl ViewCamera {
    pub fn new() -> Self {
        Self {
            distance: 18.0,
            fov: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Half width and half height of the z = 0 plane that fills the viewport.
    pub fn visible_half_extent(&self, aspect: f32) -> Vec2 {
        let half_height = self.distance * (self.fov * 0.5).tan();
        Vec2::new(half_height * aspect, half_height)
    }
}
