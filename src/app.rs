use web_time::Instant;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::gpu_context::GpuContext;
use crate::renderer::Renderer;
use crate::scene::Scene;

const PROGRESS_INTERVAL: u32 = 100;

/// Prefers an sRGB target so the linear radiance in the frame textures is encoded on
/// write.
pub fn preferred_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .or_else(|| formats.first().copied())
}

struct WindowState<'window> {
    surface: wgpu::Surface<'window>,
    surface_config: wgpu::SurfaceConfiguration,
    context: GpuContext,
    renderer: Renderer,
    minimized: bool,
    last_report: Instant,
}

impl WindowState<'_> {
    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.minimized = size.width == 0 || size.height == 0;
        if self.minimized {
            return;
        }
        let max = self.context.device.limits().max_texture_dimension_2d;
        self.surface_config.width = size.width.clamp(1, max);
        self.surface_config.height = size.height.clamp(1, max);
        self.surface.configure(&self.context.device, &self.surface_config);
        self.renderer.resize(
            &self.context.device,
            &self.context.queue,
            self.surface_config.width,
            self.surface_config.height,
        );
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.context.device, &self.surface_config);
    }

    fn redraw(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.renderer.encode_frame(&self.context.queue, &mut encoder);
        self.renderer.encode_present(&mut encoder, &view);

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn report_progress(&mut self) {
        let frames = self.renderer.frame_count();
        if frames % PROGRESS_INTERVAL != 0 {
            return;
        }
        let elapsed = self.last_report.elapsed().as_secs_f32();
        self.last_report = Instant::now();
        log::info!(
            "{frames} samples accumulated, {:.1} fps",
            PROGRESS_INTERVAL as f32 / elapsed.max(f32::EPSILON)
        );
    }
}

/// Opens a window and progressively renders into it until it is closed or Escape is
/// pressed. `R` restarts accumulation.
pub fn run_windowed(config: &RenderConfig) -> Result<()> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("razz-tracer")
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .build(&event_loop)?;

    let instance = wgpu::Instance::default();
    let surface = instance.create_surface(&window)?;
    let context = pollster::block_on(GpuContext::new(instance, Some(&surface)))?;

    let size = window.inner_size();
    let max = context.device.limits().max_texture_dimension_2d;
    let mut surface_config = surface
        .get_default_config(&context.adapter, size.width.clamp(1, max), size.height.clamp(1, max))
        .ok_or(RenderError::SurfaceUnsupported)?;
    let capabilities = surface.get_capabilities(&context.adapter);
    surface_config.format =
        preferred_format(&capabilities.formats).ok_or(RenderError::SurfaceUnsupported)?;
    surface.configure(&context.device, &surface_config);
    log::debug!("Surface configured: {:?}", surface_config);

    let render_config = RenderConfig {
        width: surface_config.width,
        height: surface_config.height,
        ..config.clone()
    };
    let renderer = context.validated(|context| {
        Renderer::new(
            &context.device,
            &render_config,
            Scene::preset(config.scene),
            Some(surface_config.format),
        )
    })?;

    let mut state = WindowState {
        surface,
        surface_config,
        context,
        renderer,
        minimized: false,
        last_report: Instant::now(),
    };

    let window = &window;
    event_loop.run(move |event, target| {
        target.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => match logical_key.as_ref() {
                    Key::Named(NamedKey::Escape) => target.exit(),
                    Key::Character("r") | Key::Character("R") => {
                        log::info!("Restarting accumulation");
                        state.renderer.reset();
                    }
                    _ => {}
                },
                WindowEvent::Resized(new_size) => state.resize(new_size),
                WindowEvent::RedrawRequested if !state.minimized => match state.redraw() {
                    Ok(()) => state.report_progress(),
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        log::debug!("Surface lost or outdated, reconfiguring");
                        state.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory while acquiring a frame, exiting");
                        target.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Timed out acquiring a frame, skipping");
                    }
                },
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        }
    })?;

    Ok(())
}
