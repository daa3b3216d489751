use glam::Vec3;

use super::material::Material;
use super::Ray;

/// Rays starting on a surface ignore hits closer than this.
pub const T_MIN: f32 = 0.001;
/// Rays closer to parallel with a triangle's plane than this miss it.
pub const TRIANGLE_EPSILON: f32 = 1e-4;

pub trait Hittable {
    /// Nearest intersection with `t` strictly inside `(t_min, t_max)`.
    fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord>;
}

fn face_normal(ray: &Ray, point: Vec3, t: f32, outward: Vec3, material: Material) -> HitRecord {
    let front_face = ray.direction.dot(outward) < 0.0;
    HitRecord {
        t,
        point,
        normal: if front_face { outward } else { -outward },
        front_face,
        material,
    }
}

#[derive(Copy, Clone, Debug)]
pub struct HitRecord {
    pub t: f32,
    pub point: Vec3,
    /// Always points against the incoming ray.
    pub normal: Vec3,
    pub front_face: bool,
    pub material: Material,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: Material) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;

        let disc = half_b * half_b - a * c;
        if disc < 0.0 {
            return None;
        }
        let sqrtd = disc.sqrt();

        let mut root = (-half_b - sqrtd) / a;
        if root <= t_min || t_max <= root {
            root = (-half_b + sqrtd) / a;
            if root <= t_min || t_max <= root {
                return None;
            }
        }

        let point = ray.at(root);
        let outward = (point - self.center) / self.radius;
        Some(face_normal(ray, point, root, outward, self.material))
    }
}

/// Single-sided geometry, double-sided shading: the normal faces the incoming ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    pub material: Material,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Material) -> Self {
        Self { v0, v1, v2, material }
    }

    /// The parallelogram `corner`, `corner + u`, `corner + u + v`, `corner + v` as two
    /// triangles.
    pub fn quad(corner: Vec3, u: Vec3, v: Vec3, material: Material) -> [Self; 2] {
        [
            Self::new(corner, corner + u, corner + u + v, material),
            Self::new(corner, corner + u + v, corner + v, material),
        ]
    }

    /// Unit normal following the `v0, v1, v2` winding.
    pub fn normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(self.v2 - self.v0).normalize()
    }
}

impl Hittable for Triangle {
    // Moller-Trumbore.
    fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        let pvec = ray.direction.cross(e2);
        let det = e1.dot(pvec);
        if det.abs() < TRIANGLE_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.origin - self.v0;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(e1);
        let v = ray.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(qvec) * inv_det;
        if t <= t_min || t_max <= t {
            return None;
        }

        Some(face_normal(ray, ray.at(t), t, self.normal(), self.material))
    }
}

/// Nearest hit across `objects`.
pub fn hit_nearest<H: Hittable>(objects: &[H], ray: &Ray, t_min: f32, t_max: f32) -> Option<HitRecord> {
    let mut closest = t_max;
    let mut result = None;
    for object in objects {
        if let Some(rec) = object.hit(ray, t_min, closest) {
            closest = rec.t;
            result = Some(rec);
        }
    }
    result
}
