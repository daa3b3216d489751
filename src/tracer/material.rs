use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;

use super::hit::HitRecord;
use super::perlin::Perlin;
use super::sampling::{near_zero, random_unit_vector, reflect, reflectance, refract};
use super::texture::Texture;
use super::Ray;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Material {
    Lambertian { albedo: Texture },
    Metal { albedo: Vec3, fuzz: f32 },
    Dielectric { refraction_index: f32 },
    DiffuseLight { emit: Vec3 },
}

pub enum Scatter {
    Scattered { ray: Ray, attenuation: Vec3 },
    Absorbed,
}

impl Default for Material {
    fn default() -> Self {
        Self::lambertian(Vec3::splat(0.5))
    }
}

/// Matches `Material` in trace.wgsl.
#[repr(C)]
#[derive(Default, Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    /// Albedo, emission, or the even checker color.
    pub albedo: [f32; 3],
    /// Metal fuzz or dielectric refraction index.
    pub param: f32,
    pub odd: [f32; 3],
    pub texture_scale: f32,
    pub kind: u32,
    pub texture_kind: u32,
    pub _pad: [u32; 2],
}

impl Material {
    pub fn lambertian(albedo: impl Into<Texture>) -> Self {
        Self::Lambertian {
            albedo: albedo.into(),
        }
    }

    pub fn metal(albedo: Vec3, fuzz: f32) -> Self {
        Self::Metal {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    pub fn emitted(&self) -> Vec3 {
        match self {
            Self::DiffuseLight { emit } => *emit,
            _ => Vec3::ZERO,
        }
    }

    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, perlin: &Perlin, rng: &mut impl Rng) -> Scatter {
        match *self {
            Self::Lambertian { albedo } => {
                let mut direction = rec.normal + random_unit_vector(rng);
                if near_zero(direction) {
                    direction = rec.normal;
                }
                Scatter::Scattered {
                    ray: Ray::new(rec.point, direction),
                    attenuation: albedo.value(rec.point, perlin),
                }
            }
            Self::Metal { albedo, fuzz } => {
                let reflected = reflect(ray_in.direction.normalize(), rec.normal);
                let direction = reflected + fuzz * random_unit_vector(rng);
                if direction.dot(rec.normal) > 0.0 {
                    Scatter::Scattered {
                        ray: Ray::new(rec.point, direction),
                        attenuation: albedo,
                    }
                } else {
                    Scatter::Absorbed
                }
            }
            Self::Dielectric { refraction_index } => {
                let ratio = if rec.front_face {
                    1.0 / refraction_index
                } else {
                    refraction_index
                };

                let unit_dir = ray_in.direction.normalize();
                let cos_theta = (-unit_dir).dot(rec.normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

                let cannot_refract = ratio * sin_theta > 1.0;
                let direction = if cannot_refract || reflectance(cos_theta, ratio) > rng.gen::<f32>() {
                    reflect(unit_dir, rec.normal)
                } else {
                    refract(unit_dir, rec.normal, ratio)
                };

                Scatter::Scattered {
                    ray: Ray::new(rec.point, direction),
                    attenuation: Vec3::ONE,
                }
            }
            Self::DiffuseLight { .. } => Scatter::Absorbed,
        }
    }

    pub fn to_gpu(&self) -> GpuMaterial {
        let solid = |albedo: Vec3, param: f32, kind: u32| GpuMaterial {
            albedo: albedo.to_array(),
            param,
            kind,
            ..Default::default()
        };
        match *self {
            Self::Lambertian { albedo } => {
                let texture = albedo.to_gpu();
                GpuMaterial {
                    albedo: texture.base,
                    param: 0.0,
                    odd: texture.odd,
                    texture_scale: texture.scale,
                    kind: MATERIAL_LAMBERTIAN,
                    texture_kind: texture.kind,
                    _pad: [0; 2],
                }
            }
            Self::Metal { albedo, fuzz } => solid(albedo, fuzz, MATERIAL_METAL),
            Self::Dielectric { refraction_index } => solid(Vec3::ONE, refraction_index, MATERIAL_DIELECTRIC),
            Self::DiffuseLight { emit } => solid(emit, 0.0, MATERIAL_DIFFUSE_LIGHT),
        }
    }
}

// Keep in sync with the MATERIAL_* constants in trace.wgsl.
pub const MATERIAL_LAMBERTIAN: u32 = 0;
pub const MATERIAL_METAL: u32 = 1;
pub const MATERIAL_DIELECTRIC: u32 = 2;
pub const MATERIAL_DIFFUSE_LIGHT: u32 = 3;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::texture::{TEXTURE_CHECKER, TEXTURE_SOLID};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn perlin() -> Perlin {
        Perlin::from_seed(0)
    }

    fn record(normal: Vec3, front_face: bool, material: Material) -> HitRecord {
        HitRecord {
            t: 1.0,
            point: Vec3::ZERO,
            normal,
            front_face,
            material,
        }
    }

    #[test]
    fn test_lambertian_scatters_into_hemisphere() {
        let mut rng = StdRng::seed_from_u64(11);
        let material = Material::lambertian(Vec3::new(0.1, 0.2, 0.3));
        let rec = record(Vec3::Y, true, material);
        let ray_in = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        for _ in 0..128 {
            match material.scatter(&ray_in, &rec, &perlin(), &mut rng) {
                Scatter::Scattered { ray, attenuation } => {
                    assert!(ray.direction.dot(Vec3::Y) >= 0.0);
                    assert_eq!(attenuation, Vec3::new(0.1, 0.2, 0.3));
                }
                Scatter::Absorbed => panic!("lambertian never absorbs"),
            }
        }
    }

    #[test]
    fn test_lambertian_samples_texture_at_hit_point() {
        let mut rng = StdRng::seed_from_u64(2);
        let material = Material::lambertian(Texture::Checker {
            odd: Vec3::new(1.0, 0.0, 0.0),
            even: Vec3::new(0.0, 0.0, 1.0),
            scale: 1.0,
        });
        let ray_in = Ray::new(Vec3::Y, -Vec3::Y);
        let half_pi = std::f32::consts::FRAC_PI_2;
        for (point, expected) in [
            (Vec3::splat(half_pi), Vec3::new(0.0, 0.0, 1.0)),
            (Vec3::new(-half_pi, half_pi, half_pi), Vec3::new(1.0, 0.0, 0.0)),
        ] {
            let rec = HitRecord {
                point,
                ..record(Vec3::Y, true, material)
            };
            match material.scatter(&ray_in, &rec, &perlin(), &mut rng) {
                Scatter::Scattered { attenuation, .. } => assert_eq!(attenuation, expected),
                Scatter::Absorbed => panic!("lambertian never absorbs"),
            }
        }
    }

    #[test]
    fn test_gpu_material_packing() {
        assert_eq!(std::mem::size_of::<GpuMaterial>(), 48);

        let metal = Material::metal(Vec3::splat(0.25), 0.3).to_gpu();
        assert_eq!(metal.albedo, [0.25; 3]);
        assert_eq!(metal.param, 0.3);
        assert_eq!(metal.kind, MATERIAL_METAL);
        assert_eq!(metal.texture_kind, TEXTURE_SOLID);

        let checker = Material::lambertian(Texture::Checker {
            odd: Vec3::ZERO,
            even: Vec3::ONE,
            scale: 10.0,
        })
        .to_gpu();
        assert_eq!(checker.kind, MATERIAL_LAMBERTIAN);
        assert_eq!(checker.texture_kind, TEXTURE_CHECKER);
        assert_eq!(checker.albedo, [1.0; 3]);
        assert_eq!(checker.odd, [0.0; 3]);
        assert_eq!(checker.texture_scale, 10.0);
    }

    #[test]
    fn test_polished_metal_reflects() {
        let mut rng = StdRng::seed_from_u64(5);
        let material = Material::metal(Vec3::ONE, 0.0);
        let rec = record(Vec3::Y, true, material);
        let ray_in = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        match material.scatter(&ray_in, &rec, &perlin(), &mut rng) {
            Scatter::Scattered { ray, .. } => {
                let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
                assert!((ray.direction - expected).length() < 1e-5);
            }
            Scatter::Absorbed => panic!("grazing reflection should scatter"),
        }
    }

    #[test]
    fn test_metal_fuzz_is_clamped() {
        assert_eq!(Material::metal(Vec3::ONE, 3.0), Material::Metal { albedo: Vec3::ONE, fuzz: 1.0 });
    }

    #[test]
    fn test_total_internal_reflection() {
        let mut rng = StdRng::seed_from_u64(9);
        let material = Material::Dielectric { refraction_index: 1.5 };
        // Leaving glass at a shallow angle: ratio 1.5, sin 0.8 -> reflects.
        let rec = record(-Vec3::Y, false, material);
        let ray_in = Ray::new(Vec3::ZERO, Vec3::new(0.8, 0.6, 0.0));
        match material.scatter(&ray_in, &rec, &perlin(), &mut rng) {
            Scatter::Scattered { ray, attenuation } => {
                assert_eq!(attenuation, Vec3::ONE);
                assert!((ray.direction - Vec3::new(0.8, -0.6, 0.0)).length() < 1e-5);
            }
            Scatter::Absorbed => panic!("dielectric never absorbs"),
        }
    }

    #[test]
    fn test_light_emits_and_absorbs() {
        let mut rng = StdRng::seed_from_u64(1);
        let material = Material::DiffuseLight { emit: Vec3::splat(4.0) };
        let rec = record(Vec3::Y, true, material);
        let ray_in = Ray::new(Vec3::Y, -Vec3::Y);
        assert!(matches!(material.scatter(&ray_in, &rec, &perlin(), &mut rng), Scatter::Absorbed));
        assert_eq!(material.emitted(), Vec3::splat(4.0));
        assert_eq!(Material::default().emitted(), Vec3::ZERO);
    }
}
