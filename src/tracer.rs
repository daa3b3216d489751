mod camera;
mod cpu;
mod hit;
mod material;
mod perlin;
mod sampling;
mod texture;

use glam::Vec3;
use rand::Rng;

use crate::scene::Scene;

pub use camera::{Camera, CameraSettings, GpuCamera};
pub use cpu::CpuTracer;
pub use hit::{hit_nearest, HitRecord, Hittable, Sphere, Triangle, T_MIN, TRIANGLE_EPSILON};
pub use material::{
    GpuMaterial, Material, Scatter, MATERIAL_DIELECTRIC, MATERIAL_DIFFUSE_LIGHT,
    MATERIAL_LAMBERTIAN, MATERIAL_METAL,
};
pub use perlin::{GpuPerlin, Perlin, PERLIN_POINTS, TURBULENCE_DEPTH};
pub use texture::{Texture, TEXTURE_CHECKER, TEXTURE_NOISE, TEXTURE_SOLID};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
}

/// Radiance along `ray`, following at most `max_depth` bounces.
///
/// Iterative rather than recursive so it reads the same as the loop in trace.wgsl.
pub fn ray_color(scene: &Scene, mut ray: Ray, max_depth: u32, rng: &mut impl Rng) -> Vec3 {
    let mut radiance = Vec3::ZERO;
    let mut throughput = Vec3::ONE;

    for _ in 0..max_depth {
        let Some(rec) = scene.hit(&ray, T_MIN, f32::INFINITY) else {
            return radiance + throughput * scene.background;
        };

        radiance += throughput * rec.material.emitted();
        match rec.material.scatter(&ray, &rec, &scene.perlin, rng) {
            Scatter::Scattered {
                ray: scattered,
                attenuation,
            } => {
                throughput *= attenuation;
                ray = scattered;
            }
            Scatter::Absorbed => return radiance,
        }
    }

    radiance
}
