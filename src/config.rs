use std::path::PathBuf;

use crate::error::{RenderError, Result};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_MAX_DEPTH: u32 = 8;

/// Where the per-pixel work runs. Presentation always goes through the blit pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderBackend {
    Gpu,
    Cpu,
}

/// What the compute pass writes for each pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShadeMode {
    /// Progressive path traced image.
    Trace,
    /// Normalized pixel coordinates in red/green, fixed blue and alpha.
    Gradient,
}

impl ShadeMode {
    pub fn as_gpu(self) -> u32 {
        match self {
            ShadeMode::Trace => 0,
            ShadeMode::Gradient => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScenePreset {
    Basic,
    Spheres,
    Lights,
}

#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub backend: RenderBackend,
    pub mode: ShadeMode,
    pub scene: ScenePreset,
    pub max_depth: u32,
    pub seed: u64,
    pub headless: Option<HeadlessConfig>,
}

#[derive(Clone, Debug)]
pub struct HeadlessConfig {
    pub frames: u32,
    pub output: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            backend: RenderBackend::Gpu,
            mode: ShadeMode::Trace,
            scene: ScenePreset::Basic,
            max_depth: DEFAULT_MAX_DEPTH,
            seed: 0x5eed,
            headless: None,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
