//! Progressive path tracer that runs one compute invocation per pixel in 32x32 tiles and
//! blits the accumulated frame to a window, with a CPU reference backend and an
//! offscreen PNG export.

mod app;
pub mod config;
pub mod error;
mod frame_textures;
pub mod gpu_context;
pub mod grid;
mod headless;
pub mod image;
mod present_pass;
mod renderer;
pub mod scene;
mod trace_pass;
pub mod tracer;


pub use config::{HeadlessConfig, RenderBackend, RenderConfig, ScenePreset, ShadeMode};
pub use error::{RenderError, Result};
pub use headless::{render_cpu, run_headless};
pub use present_pass::fullscreen_vertex;
pub use scene::Scene;

/// Runs the configured renderer: offscreen export when `config.headless` is set,
/// otherwise an interactive window.
pub fn run(config: RenderConfig) -> Result<()> {
    match &config.headless {
        Some(headless) => run_headless(&config, headless),
        None => app::run_windowed(&config),
    }
}
