use glam::{Vec2, Vec3};
use rand::Rng;

pub fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len_sq = p.length_squared();
        if len_sq > 1e-12 && len_sq <= 1.0 {
            return p / len_sq.sqrt();
        }
    }
}

pub fn random_in_unit_disk(rng: &mut impl Rng) -> Vec2 {
    loop {
        let p = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

#[inline]
pub fn near_zero(v: Vec3) -> bool {
    const EPS: f32 = 1e-8;
    v.x.abs() < EPS && v.y.abs() < EPS && v.z.abs() < EPS
}

#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

#[inline]
pub fn refract(v: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos_theta = (-v).dot(n).min(1.0);
    let perp = eta * (v + cos_theta * n);
    let parallel = -((1.0 - perp.length_squared()).abs().sqrt()) * n;
    perp + parallel
}

/// Schlick's approximation.
#[inline]
pub fn reflectance(cosine: f32, refraction_index: f32) -> f32 {
    let r0 = (1.0 - refraction_index) / (1.0 + refraction_index);
    let r0 = r0 * r0;
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unit_vectors_are_normalized() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..256 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-5);
            assert!(random_in_unit_disk(&mut rng).length() < 1.0);
        }
    }

    #[test]
    fn test_reflect_mirrors_about_normal() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_straight_through_with_unit_eta() {
        let v = Vec3::new(0.6, -0.8, 0.0);
        let r = refract(v, Vec3::Y, 1.0);
        assert!((r - v).length() < 1e-5);
    }

    #[test]
    fn test_reflectance_bounds() {
        let head_on = reflectance(1.0, 1.5);
        assert!((head_on - 0.04).abs() < 1e-6);
        assert!((reflectance(0.0, 1.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_near_zero() {
        assert!(near_zero(Vec3::splat(1e-9)));
        assert!(!near_zero(Vec3::new(0.0, 1e-3, 0.0)));
    }
}
