use glam::Vec3;

use super::perlin::{Perlin, TURBULENCE_DEPTH};

/// Surface color as a function of the hit point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Texture {
    Solid(Vec3),
    /// 3D checkerboard: `odd` where `sin(scale x) sin(scale y) sin(scale z)` is negative.
    Checker { odd: Vec3, even: Vec3, scale: f32 },
    /// Marble stripes along z, phase-shifted by Perlin turbulence.
    Noise { color: Vec3, scale: f32 },
}

// Keep in sync with the TEXTURE_* constants in trace.wgsl.
pub const TEXTURE_SOLID: u32 = 0;
pub const TEXTURE_CHECKER: u32 = 1;
pub const TEXTURE_NOISE: u32 = 2;

/// Texture fields of `GpuMaterial`.
pub struct GpuTexture {
    pub base: [f32; 3],
    pub odd: [f32; 3],
    pub scale: f32,
    pub kind: u32,
}

impl From<Vec3> for Texture {
    fn from(color: Vec3) -> Self {
        Self::Solid(color)
    }
}

impl Texture {
    pub fn value(&self, p: Vec3, perlin: &Perlin) -> Vec3 {
        match *self {
            Self::Solid(color) => color,
            Self::Checker { odd, even, scale } => {
                let sines = (scale * p.x).sin() * (scale * p.y).sin() * (scale * p.z).sin();
                if sines < 0.0 {
                    odd
                } else {
                    even
                }
            }
            Self::Noise { color, scale } => {
                let phase = scale * p.z + 10.0 * perlin.turbulence(p, TURBULENCE_DEPTH);
                color * 0.5 * (1.0 + phase.sin())
            }
        }
    }

    pub fn to_gpu(&self) -> GpuTexture {
        match *self {
            Self::Solid(color) => GpuTexture {
                base: color.to_array(),
                odd: [0.0; 3],
                scale: 0.0,
                kind: TEXTURE_SOLID,
            },
            Self::Checker { odd, even, scale } => GpuTexture {
                base: even.to_array(),
                odd: odd.to_array(),
                scale,
                kind: TEXTURE_CHECKER,
            },
            Self::Noise { color, scale } => GpuTexture {
                base: color.to_array(),
                odd: [0.0; 3],
                scale,
                kind: TEXTURE_NOISE,
            },
        }
    }
}
