use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::{ray_color, Camera};
use crate::config::ShadeMode;
use crate::grid::{gradient_texel, pixel_uv};
use crate::image::Image;
use crate::scene::Scene;

/// Reference renderer that produces the same kind of image as the compute pass,
/// one jittered sample per pixel per call, rows in parallel.
#[derive(Debug)]
pub struct CpuTracer {
    width: u32,
    height: u32,
    max_depth: u32,
    mode: ShadeMode,
    seed: u64,
    image: Image,
    samples: u32,
}

impl CpuTracer {
    pub fn new(width: u32, height: u32, max_depth: u32, mode: ShadeMode, seed: u64) -> Self {
        Self {
            width,
            height,
            max_depth,
            mode,
            seed,
            image: Image::new(width, height),
            samples: 0,
        }
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.image = Image::new(width, height);
        self.samples = 0;
    }

    pub fn reset(&mut self) {
        self.samples = 0;
    }

    pub fn render(&mut self, scene: &Scene, camera: &Camera) -> &Image {
        let (width, height) = (self.width, self.height);

        let frame: Vec<[f32; 4]> = match self.mode {
            ShadeMode::Gradient => (0..height)
                .into_par_iter()
                .flat_map_iter(|y| {
                    (0..width).map(move |x| gradient_texel(x, y, width, height).unwrap_or_default())
                })
                .collect(),
            ShadeMode::Trace => {
                let frame_seed = self.seed ^ (u64::from(self.samples) << 32);
                let max_depth = self.max_depth;
                (0..height)
                    .into_par_iter()
                    .flat_map_iter(|y| {
                        let mut rng = StdRng::seed_from_u64(frame_seed.wrapping_add(u64::from(y)));
                        (0..width)
                            .map(|x| {
                                let jitter = [rng.gen::<f32>(), rng.gen::<f32>()];
                                let uv = Vec2::from(pixel_uv(x, y, width, height, jitter));
                                let ray = camera.ray(uv, &mut rng);
                                ray_color(scene, ray, max_depth, &mut rng).extend(1.0).to_array()
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect()
            }
        };

        self.image.accumulate(&frame, self.samples);
        self.samples += 1;
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_for(scene: &Scene, width: u32, height: u32) -> Camera {
        Camera::from_settings(&scene.camera, width as f32 / height as f32)
    }

    #[test]
    fn test_gradient_matches_grid() {
        let scene = Scene::basic();
        let mut tracer = CpuTracer::new(16, 8, 4, ShadeMode::Gradient, 0);
        let image = tracer.render(&scene, &camera_for(&scene, 16, 8));
        for y in 0..8 {
            for x in 0..16 {
                assert_eq!(image.load(x, y), gradient_texel(x, y, 16, 8));
            }
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let scene = Scene::spheres();
        let camera = camera_for(&scene, 24, 16);
        let mut a = CpuTracer::new(24, 16, 6, ShadeMode::Trace, 42);
        let mut b = CpuTracer::new(24, 16, 6, ShadeMode::Trace, 42);
        for _ in 0..2 {
            a.render(&scene, &camera);
            b.render(&scene, &camera);
        }
        assert_eq!(a.image(), b.image());
        assert_eq!(a.samples(), 2);
    }

    #[test]
    fn test_traced_pixels_are_finite_and_opaque() {
        let scene = Scene::lights();
        let mut tracer = CpuTracer::new(20, 10, 8, ShadeMode::Trace, 7);
        let image = tracer.render(&scene, &camera_for(&scene, 20, 10));
        for texel in &image.data {
            assert!(texel.iter().all(|c| c.is_finite() && *c >= 0.0));
            assert_eq!(texel[3], 1.0);
        }
    }

    #[test]
    fn test_empty_scene_is_background() {
        let scene = Scene {
            spheres: Vec::new(),
            ..Scene::basic()
        };
        let mut tracer = CpuTracer::new(4, 4, 4, ShadeMode::Trace, 1);
        let image = tracer.render(&scene, &camera_for(&scene, 4, 4));
        assert!(image.data.iter().all(|t| *t == [1.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_textured_scenes_render() {
        for scene in [Scene::spheres(), Scene::lights()] {
            let mut tracer = CpuTracer::new(12, 8, 4, ShadeMode::Trace, 3);
            let image = tracer.render(&scene, &camera_for(&scene, 12, 8));
            assert!(image.data.iter().flatten().all(|c| c.is_finite()));
            assert!(image.data.iter().any(|t| t[..3].iter().any(|c| *c > 0.0)));
        }
    }

    #[test]
    fn test_resize_resets_accumulation() {
        let scene = Scene::basic();
        let mut tracer = CpuTracer::new(4, 4, 2, ShadeMode::Trace, 1);
        tracer.render(&scene, &camera_for(&scene, 4, 4));
        tracer.resize(8, 2);
        assert_eq!(tracer.samples(), 0);
        assert_eq!(tracer.image().data.len(), 16);
    }
}
