use std::path::Path;

use image::{ImageBuffer, Rgba};

use crate::error::{RenderError, Result};

/// CPU-side mirror of an `Rgba32Float` storage texture. Row-major, row 0 at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub data: Vec<[f32; 4]>,
}

pub const BYTES_PER_TEXEL: u32 = 16;

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![[0.0; 4]; texel_count(width, height)],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Texel at `(x, y)`, or `None` outside the extent.
    pub fn load(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[self.index(x, y)])
    }

    pub fn store(&mut self, x: u32, y: u32, texel: [f32; 4]) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.data[index] = texel;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Rebuilds an image from a texture readback whose rows are padded to
    /// `padded_bytes_per_row`.
    pub fn from_padded_rows(width: u32, height: u32, padded_bytes_per_row: u32, bytes: &[u8]) -> Self {
        let row_bytes = width as usize * BYTES_PER_TEXEL as usize;
        let mut data = Vec::with_capacity(texel_count(width, height));
        for row in bytes.chunks(padded_bytes_per_row as usize).take(height as usize) {
            data.extend(
                row[..row_bytes]
                    .chunks_exact(BYTES_PER_TEXEL as usize)
                    .map(bytemuck::pod_read_unaligned::<[f32; 4]>),
            );
        }
        Self { width, height, data }
    }

    /// Folds `sample` into a running mean that already holds `samples` frames. Alpha is
    /// pinned to 1.
    pub fn accumulate(&mut self, sample: &[[f32; 4]], samples: u32) {
        if samples == 0 {
            for (old, new) in self.data.iter_mut().zip(sample) {
                *old = [new[0], new[1], new[2], 1.0];
            }
            return;
        }
        let n = samples as f32;
        let inv = 1.0 / (n + 1.0);
        for (old, new) in self.data.iter_mut().zip(sample) {
            for c in 0..3 {
                old[c] = (old[c] * n + new[c]) * inv;
            }
            old[3] = 1.0;
        }
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(self.data.len() * 4);
        for texel in &self.data {
            pixels.push(linear_to_srgb8(texel[0]));
            pixels.push(linear_to_srgb8(texel[1]));
            pixels.push(linear_to_srgb8(texel[2]));
            pixels.push((texel[3].clamp(0.0, 1.0) * 255.0).round() as u8);
        }
        pixels
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let buffer = ImageBuffer::<Rgba<u8>, _>::from_raw(self.width, self.height, self.to_rgba8())
            .ok_or(RenderError::InvalidSize {
                width: self.width,
                height: self.height,
            })?;
        buffer.save(path)?;
        log::info!("Saved PNG to {}", path.display());
        Ok(())
    }
}

/// Number of texels in a `width` x `height` image, computed without `u32` overflow.
pub fn texel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn linear_to_srgb8(value: f32) -> u8 {
    let v = value.clamp(0.0, 1.0);
    let encoded = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}
