use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use razz_tracer::config::{DEFAULT_HEIGHT, DEFAULT_MAX_DEPTH, DEFAULT_WIDTH};
use razz_tracer::{HeadlessConfig, RenderBackend, RenderConfig, ScenePreset, ShadeMode};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendArg {
    Gpu,
    Cpu,
}

impl BackendArg {
    fn to_render_backend(self) -> RenderBackend {
        match self {
            BackendArg::Gpu => RenderBackend::Gpu,
            BackendArg::Cpu => RenderBackend::Cpu,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    Trace,
    Gradient,
}

impl ModeArg {
    fn to_shade_mode(self) -> ShadeMode {
        match self {
            ModeArg::Trace => ShadeMode::Trace,
            ModeArg::Gradient => ShadeMode::Gradient,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SceneArg {
    Basic,
    Spheres,
    Lights,
}

impl SceneArg {
    fn to_preset(self) -> ScenePreset {
        match self {
            SceneArg::Basic => ScenePreset::Basic,
            SceneArg::Spheres => ScenePreset::Spheres,
            SceneArg::Lights => ScenePreset::Lights,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Tile-parallel compute path tracer")]
struct Args {
    /// Window or output width in pixels
    #[arg(long, short = 'W', default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Window or output height in pixels
    #[arg(long, short = 'H', default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    /// Where per-pixel work runs
    #[arg(long, value_enum, default_value_t = BackendArg::Gpu)]
    backend: BackendArg,

    /// Path trace the scene or write the coordinate gradient
    #[arg(long, value_enum, default_value_t = ModeArg::Trace)]
    mode: ModeArg,

    /// Scene preset
    #[arg(long, value_enum, default_value_t = SceneArg::Basic)]
    scene: SceneArg,

    /// Maximum bounces per path
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u32,

    /// Render offscreen and save a PNG instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Samples per pixel to accumulate in headless mode
    #[arg(long, default_value_t = 64)]
    frames: u32,

    /// PNG written in headless mode
    #[arg(long, default_value = "render.png")]
    output: PathBuf,

    /// Sampling seed
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
}

impl Args {
    fn into_config(self) -> RenderConfig {
        RenderConfig {
            width: self.width,
            height: self.height,
            backend: self.backend.to_render_backend(),
            mode: self.mode.to_shade_mode(),
            scene: self.scene.to_preset(),
            max_depth: self.max_depth,
            seed: self.seed,
            headless: self.headless.then(|| HeadlessConfig {
                frames: self.frames,
                output: self.output,
            }),
        }
    }
}

fn main() -> razz_tracer::Result<()> {
    env_logger::init();
    let config = Args::parse().into_config();
    log::debug!("{config:?}");
    razz_tracer::run(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Args::parse_from(["razz-tracer"]).into_config();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.backend, RenderBackend::Gpu);
        assert_eq!(config.mode, ShadeMode::Trace);
        assert!(config.headless.is_none());
    }

    #[test]
    fn test_headless_flags() {
        let config = Args::parse_from([
            "razz-tracer",
            "--headless",
            "--backend",
            "cpu",
            "--mode",
            "gradient",
            "--scene",
            "lights",
            "--frames",
            "4",
            "--output",
            "out.png",
        ])
        .into_config();
        assert_eq!(config.backend, RenderBackend::Cpu);
        assert_eq!(config.mode, ShadeMode::Gradient);
        assert_eq!(config.scene, ScenePreset::Lights);
        let headless = config.headless.unwrap();
        assert_eq!(headless.frames, 4);
        assert_eq!(headless.output, PathBuf::from("out.png"));
    }
}
