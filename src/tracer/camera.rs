use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use rand::Rng;

use super::sampling::random_in_unit_disk;
use super::Ray;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraSettings {
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub vfov: f32,
    pub aperture: f32,
    pub focus_dist: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vfov: 90.0,
            aperture: 0.0,
            focus_dist: 1.0,
        }
    }
}

/// Pinhole or thin-lens camera. `top_left` is the viewport corner that pixel row 0,
/// column 0 maps to.
#[derive(Copy, Clone, Debug, Default)]
pub struct Camera {
    origin: Vec3,
    top_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    lens_radius: f32,
}

impl Camera {
    pub fn new(
        look_from: Vec3,
        look_at: Vec3,
        vfov: f32,
        aspect_ratio: f32,
        aperture: f32,
        focus_dist: f32,
    ) -> Self {
        let theta = vfov.to_radians();
        let h = (theta * 0.5).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = aspect_ratio * viewport_height;

        let w = (look_from - look_at).normalize();
        let u = Vec3::Y.cross(w).normalize();
        let v = w.cross(u);

        let origin = look_from;
        let horizontal = focus_dist * viewport_width * u;
        let vertical = focus_dist * viewport_height * v;
        let top_left = origin - 0.5 * horizontal + 0.5 * vertical - focus_dist * w;

        Self {
            origin,
            top_left,
            horizontal,
            vertical,
            u,
            v,
            lens_radius: 0.5 * aperture,
        }
    }

    pub fn from_settings(settings: &CameraSettings, aspect_ratio: f32) -> Self {
        Self::new(
            settings.look_from,
            settings.look_at,
            settings.vfov,
            aspect_ratio,
            settings.aperture,
            settings.focus_dist,
        )
    }

    /// Ray through viewport coordinate `uv`, with (0, 0) at the top left.
    pub fn ray(&self, uv: Vec2, rng: &mut impl Rng) -> Ray {
        let lens = if self.lens_radius > 0.0 {
            self.lens_radius * random_in_unit_disk(rng)
        } else {
            Vec2::ZERO
        };
        let offset = self.u * lens.x + self.v * lens.y;
        let origin = self.origin + offset;

        Ray {
            origin,
            direction: self.top_left + uv.x * self.horizontal - uv.y * self.vertical - origin,
        }
    }

    pub fn to_gpu(&self) -> GpuCamera {
        GpuCamera {
            origin: self.origin.extend(self.lens_radius).to_array(),
            top_left: self.top_left.extend(0.0).to_array(),
            horizontal: self.horizontal.extend(0.0).to_array(),
            vertical: self.vertical.extend(0.0).to_array(),
            u: self.u.extend(0.0).to_array(),
            v: self.v.extend(0.0).to_array(),
        }
    }
}

/// Matches `Camera` in trace.wgsl. `origin.w` carries the lens radius.
#[repr(C)]
#[derive(Default, Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuCamera {
    pub origin: [f32; 4],
    pub top_left: [f32; 4],
    pub horizontal: [f32; 4],
    pub vertical: [f32; 4],
    pub u: [f32; 4],
    pub v: [f32; 4],
}
