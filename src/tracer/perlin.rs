use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const PERLIN_POINTS: usize = 256;
/// Octaves summed by `Perlin::turbulence` for noise textures.
pub const TURBULENCE_DEPTH: u32 = 7;

/// Gradient noise lattice: one random unit gradient per point and a shuffled index
/// table per axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Perlin {
    ranvec: Vec<Vec3>,
    perm_x: Vec<u32>,
    perm_y: Vec<u32>,
    perm_z: Vec<u32>,
}

/// Matches `PerlinTable` in trace.wgsl. `perm[i]` holds the x, y and z permutations
/// in its first three lanes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuPerlin {
    pub ranvec: [[f32; 4]; PERLIN_POINTS],
    pub perm: [[u32; 4]; PERLIN_POINTS],
}

fn permutation(rng: &mut impl Rng) -> Vec<u32> {
    let mut perm: Vec<u32> = (0..PERLIN_POINTS as u32).collect();
    perm.shuffle(rng);
    perm
}

impl Perlin {
    pub fn new(rng: &mut impl Rng) -> Self {
        let ranvec = (0..PERLIN_POINTS)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                )
                .normalize_or(Vec3::X)
            })
            .collect();
        Self {
            ranvec,
            perm_x: permutation(rng),
            perm_y: permutation(rng),
            perm_z: permutation(rng),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::new(&mut StdRng::seed_from_u64(seed))
    }

    /// Smoothed gradient noise in roughly [-1, 1]. Zero on every lattice point.
    pub fn noise(&self, p: Vec3) -> f32 {
        let cell = p.floor();
        let d = p - cell;
        let uu = d * d * (3.0 - 2.0 * d);
        let (i, j, k) = (cell.x as i32, cell.y as i32, cell.z as i32);

        let mut accum = 0.0;
        for di in 0..2 {
            for dj in 0..2 {
                for dk in 0..2 {
                    let index = self.perm_x[((i + di) & 255) as usize]
                        ^ self.perm_y[((j + dj) & 255) as usize]
                        ^ self.perm_z[((k + dk) & 255) as usize];
                    let gradient = self.ranvec[index as usize];
                    let corner = Vec3::new(di as f32, dj as f32, dk as f32);
                    let w = corner * uu + (1.0 - corner) * (1.0 - uu);
                    accum += w.x * w.y * w.z * gradient.dot(d - corner);
                }
            }
        }
        accum
    }

    /// Sum of `depth` octaves, each at twice the frequency and half the weight of the
    /// last. Never negative.
    pub fn turbulence(&self, p: Vec3, depth: u32) -> f32 {
        let mut accum = 0.0;
        let mut p = p;
        let mut weight = 1.0;
        for _ in 0..depth {
            accum += weight * self.noise(p);
            weight *= 0.5;
            p *= 2.0;
        }
        accum.abs()
    }

    pub fn to_gpu(&self) -> GpuPerlin {
        let mut table = GpuPerlin::zeroed();
        for i in 0..PERLIN_POINTS {
            table.ranvec[i] = self.ranvec[i].extend(0.0).to_array();
            table.perm[i] = [self.perm_x[i], self.perm_y[i], self.perm_z[i], 0];
        }
        table
    }
}
