use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::config::ScenePreset;
use crate::tracer::{
    hit_nearest, CameraSettings, GpuMaterial, HitRecord, Material, Perlin, Ray, Sphere,
    Texture, Triangle,
};

/// Seed of the noise lattice shared by every noise texture in a scene.
pub const PERLIN_SEED: u64 = 0x9e37_79b9;

#[derive(Clone, Debug)]
pub struct Scene {
    pub camera: CameraSettings,
    pub spheres: Vec<Sphere>,
    pub triangles: Vec<Triangle>,
    pub perlin: Perlin,
    /// Radiance returned for rays that escape the scene.
    pub background: Vec3,
}

/// Matches `Sphere` in trace.wgsl.
#[repr(C)]
#[derive(Default, Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: GpuMaterial,
}

impl From<&Sphere> for GpuSphere {
    fn from(sphere: &Sphere) -> Self {
        Self {
            center: sphere.center.to_array(),
            radius: sphere.radius,
            material: sphere.material.to_gpu(),
        }
    }
}

/// Matches `Triangle` in trace.wgsl, where each vertex is padded to 16 bytes.
#[repr(C)]
#[derive(Default, Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuTriangle {
    pub v0: [f32; 3],
    pub _pad0: f32,
    pub v1: [f32; 3],
    pub _pad1: f32,
    pub v2: [f32; 3],
    pub _pad2: f32,
    pub material: GpuMaterial,
}

impl From<&Triangle> for GpuTriangle {
    fn from(triangle: &Triangle) -> Self {
        Self {
            v0: triangle.v0.to_array(),
            v1: triangle.v1.to_array(),
            v2: triangle.v2.to_array(),
            material: triangle.material.to_gpu(),
            ..Default::default()
        }
    }
}

impl Scene {
    /// Nothing but `background`, seen from the default camera.
    pub fn empty(background: Vec3) -> Self {
        Self {
            camera: CameraSettings::default(),
            spheres: Vec::new(),
            triangles: Vec::new(),
            perlin: Perlin::from_seed(PERLIN_SEED),
            background,
        }
    }

    /// Nearest hit over spheres and triangles.
    pub fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        let sphere = hit_nearest(&self.spheres, ray, t_min, t_max);
        let t_max = sphere.map_or(t_max, |rec| rec.t);
        hit_nearest(&self.triangles, ray, t_min, t_max).or(sphere)
    }

    pub fn preset(preset: ScenePreset) -> Self {
        match preset {
            ScenePreset::Basic => Self::basic(),
            ScenePreset::Spheres => Self::spheres(),
            ScenePreset::Lights => Self::lights(),
        }
    }

    pub fn basic() -> Self {
        let grey = Material::default();
        Self {
            spheres: vec![
                Sphere::new(Vec3::new(0.0, -100.5, -1.0), 100.0, grey),
                Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, grey),
            ],
            ..Self::empty(Vec3::ONE)
        }
    }

    pub fn spheres() -> Self {
        Self {
            camera: CameraSettings {
                look_from: Vec3::new(-2.0, 2.0, 1.0),
                look_at: Vec3::new(0.0, 0.0, -1.0),
                vfov: 30.0,
                aperture: 0.1,
                focus_dist: 3.4,
            },
            spheres: vec![
                Sphere::new(
                    Vec3::new(0.0, -100.5, -1.0),
                    100.0,
                    Material::lambertian(Texture::Checker {
                        odd: Vec3::new(0.2, 0.3, 0.1),
                        even: Vec3::new(0.9, 0.9, 0.9),
                        scale: 10.0,
                    }),
                ),
                Sphere::new(
                    Vec3::new(0.0, 0.0, -1.0),
                    0.5,
                    Material::lambertian(Vec3::new(0.1, 0.2, 0.5)),
                ),
                Sphere::new(
                    Vec3::new(-1.0, 0.0, -1.0),
                    0.5,
                    Material::Dielectric { refraction_index: 1.5 },
                ),
                Sphere::new(
                    Vec3::new(-1.0, 0.0, -1.0),
                    -0.45,
                    Material::Dielectric { refraction_index: 1.5 },
                ),
                Sphere::new(
                    Vec3::new(1.0, 0.0, -1.0),
                    0.5,
                    Material::metal(Vec3::new(0.8, 0.6, 0.2), 0.1),
                ),
            ],
            ..Self::empty(Vec3::new(0.7, 0.8, 1.0))
        }
    }

    pub fn lights() -> Self {
        Self {
            camera: CameraSettings {
                look_from: Vec3::new(0.0, 1.0, 3.0),
                look_at: Vec3::new(0.0, 0.3, -1.0),
                vfov: 45.0,
                aperture: 0.0,
                focus_dist: 4.0,
            },
            spheres: vec![
                Sphere::new(
                    Vec3::new(0.0, -1000.0, 0.0),
                    1000.0,
                    Material::lambertian(Texture::Noise {
                        color: Vec3::ONE,
                        scale: 4.0,
                    }),
                ),
                Sphere::new(
                    Vec3::new(0.0, 0.5, -1.0),
                    0.5,
                    Material::lambertian(Vec3::new(0.7, 0.2, 0.2)),
                ),
                Sphere::new(
                    Vec3::new(1.2, 0.5, -1.0),
                    0.5,
                    Material::metal(Vec3::splat(0.9), 0.0),
                ),
                Sphere::new(
                    Vec3::new(0.0, 3.0, -1.0),
                    1.0,
                    Material::DiffuseLight { emit: Vec3::splat(4.0) },
                ),
            ],
            // Back wall behind the spheres.
            triangles: Triangle::quad(
                Vec3::new(-3.0, 0.0, -2.5),
                Vec3::new(6.0, 0.0, 0.0),
                Vec3::new(0.0, 3.0, 0.0),
                Material::lambertian(Vec3::new(0.73, 0.73, 0.73)),
            )
            .to_vec(),
            ..Self::empty(Vec3::splat(0.02))
        }
    }

    /// Sphere array for the storage buffer. Never empty: zero-sized bindings are
    /// invalid, so an empty scene uploads one zero-radius placeholder that the shader
    /// never visits because `sphere_count` stays 0.
    pub fn gpu_spheres(&self) -> Vec<GpuSphere> {
        if self.spheres.is_empty() {
            return vec![GpuSphere::default()];
        }
        self.spheres.iter().map(GpuSphere::from).collect()
    }

    /// Triangle array for the storage buffer, with the same placeholder rule as
    /// `gpu_spheres`.
    pub fn gpu_triangles(&self) -> Vec<GpuTriangle> {
        if self.triangles.is_empty() {
            return vec![GpuTriangle::default()];
        }
        self.triangles.iter().map(GpuTriangle::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::{MATERIAL_METAL, T_MIN};

    #[test]
    fn test_gpu_primitive_layout() {
        assert_eq!(std::mem::size_of::<GpuSphere>(), 64);
        assert_eq!(std::mem::align_of::<GpuSphere>(), 4);
        assert_eq!(std::mem::offset_of!(GpuSphere, material), 16);
        assert_eq!(std::mem::size_of::<GpuTriangle>(), 96);
        assert_eq!(std::mem::offset_of!(GpuTriangle, v1), 16);
        assert_eq!(std::mem::offset_of!(GpuTriangle, v2), 32);
        assert_eq!(std::mem::offset_of!(GpuTriangle, material), 48);
    }

    #[test]
    fn test_gpu_sphere_packing() {
        let sphere = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 0.5, Material::metal(Vec3::splat(0.25), 0.3));
        let gpu = GpuSphere::from(&sphere);
        assert_eq!(gpu.center, [1.0, 2.0, 3.0]);
        assert_eq!(gpu.radius, 0.5);
        assert_eq!(gpu.material.albedo, [0.25; 3]);
        assert_eq!(gpu.material.param, 0.3);
        assert_eq!(gpu.material.kind, MATERIAL_METAL);
    }

    #[test]
    fn test_gpu_triangle_packing() {
        let triangle = Triangle::new(Vec3::X, Vec3::Y, Vec3::Z, Material::default());
        let gpu = GpuTriangle::from(&triangle);
        assert_eq!(gpu.v0, [1.0, 0.0, 0.0]);
        assert_eq!(gpu.v1, [0.0, 1.0, 0.0]);
        assert_eq!(gpu.v2, [0.0, 0.0, 1.0]);
        assert_eq!(gpu.material, Material::default().to_gpu());
    }

    #[test]
    fn test_empty_scene_uploads_placeholder() {
        let scene = Scene::empty(Vec3::ZERO);
        assert_eq!(scene.gpu_spheres().len(), 1);
        assert_eq!(scene.gpu_triangles().len(), 1);
    }

    #[test]
    fn test_scene_hit_picks_nearest_primitive() {
        let mut scene = Scene::empty(Vec3::ZERO);
        scene.spheres.push(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 0.5, Material::default()));
        scene.triangles.extend(Triangle::quad(
            Vec3::new(-1.0, -1.0, -2.0),
            Vec3::X * 2.0,
            Vec3::Y * 2.0,
            Material::metal(Vec3::ONE, 0.0),
        ));
        let ray = Ray::new(Vec3::new(0.1, 0.3, 0.0), -Vec3::Z);
        let rec = scene.hit(&ray, T_MIN, f32::INFINITY).unwrap();
        assert!((rec.t - 2.0).abs() < 1e-5);
        assert!(matches!(rec.material, Material::Metal { .. }));

        scene.spheres[0].center.z = -1.0;
        let rec = scene.hit(&ray, T_MIN, f32::INFINITY).unwrap();
        assert!(rec.t < 1.0);
        assert!(matches!(rec.material, Material::Lambertian { .. }));
    }

    #[test]
    fn test_presets_are_populated() {
        for preset in [ScenePreset::Basic, ScenePreset::Spheres, ScenePreset::Lights] {
            let scene = Scene::preset(preset);
            assert!(!scene.spheres.is_empty());
            assert_eq!(scene.gpu_spheres().len(), scene.spheres.len());
        }
    }
}
