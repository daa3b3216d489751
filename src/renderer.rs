use wgpu::util::DeviceExt;

use crate::config::{RenderBackend, RenderConfig, ShadeMode};
use crate::error::Result;
use crate::frame_textures::{output_index, FrameTextures};
use crate::gpu_context::check_target_size;
use crate::present_pass::{PresentBindings, PresentPass};
use crate::scene::Scene;
use crate::trace_pass::{gpu_seed, SceneBuffers, TraceBindings, TraceParams, TracePipeline};
use crate::tracer::{Camera, CpuTracer};

/// Owns everything needed to produce one accumulated frame per call and, when built with
/// a target format, to blit it.
pub struct Renderer {
    mode: ShadeMode,
    max_depth: u32,
    seed: u64,
    scene: Scene,
    camera: Camera,
    textures: FrameTextures,
    /// Samples accumulated in the most recently written texture.
    frame: u32,
    params_uniform: wgpu::Buffer,
    camera_uniform: wgpu::Buffer,
    scene_buffers: SceneBuffers,
    trace_pipeline: TracePipeline,
    trace_bindings: TraceBindings,
    present: Option<(PresentPass, PresentBindings)>,
    cpu: Option<CpuTracer>,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        config: &RenderConfig,
        scene: Scene,
        present_format: Option<wgpu::TextureFormat>,
    ) -> Result<Self> {
        let (width, height) = (config.width, config.height);
        check_target_size(&device.limits(), width, height)?;
        let camera = Camera::from_settings(&scene.camera, config.aspect_ratio());
        let textures = FrameTextures::new(device, width, height);

        let params_uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Trace Params Uniform Buffer"),
            contents: bytemuck::bytes_of(&TraceParams::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::bytes_of(&camera.to_gpu()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let scene_buffers = SceneBuffers::new(device, &scene);

        let trace_pipeline = TracePipeline::new(device);
        let trace_bindings = TraceBindings::new(
            device,
            &trace_pipeline,
            &textures,
            &params_uniform,
            &camera_uniform,
            &scene_buffers,
        );

        let present = present_format.map(|format| {
            let pass = PresentPass::new(device, format);
            let bindings = PresentBindings::new(device, &pass, &textures);
            (pass, bindings)
        });

        let cpu = match config.backend {
            RenderBackend::Gpu => None,
            RenderBackend::Cpu => Some(CpuTracer::new(
                width,
                height,
                config.max_depth,
                config.mode,
                config.seed,
            )),
        };

        log::info!(
            "Renderer ready: {width}x{height}, {:?} backend, {:?} mode, {} spheres, {} triangles",
            config.backend,
            config.mode,
            scene.spheres.len(),
            scene.triangles.len()
        );

        Ok(Self {
            mode: config.mode,
            max_depth: config.max_depth,
            seed: config.seed,
            scene,
            camera,
            textures,
            frame: 0,
            params_uniform,
            camera_uniform,
            scene_buffers,
            trace_pipeline,
            trace_bindings,
            present,
            cpu,
        })
    }

    pub fn width(&self) -> u32 {
        self.textures.width()
    }

    pub fn height(&self) -> u32 {
        self.textures.height()
    }

    /// Frames accumulated since the last reset.
    pub fn frame_count(&self) -> u32 {
        self.frame
    }

    /// Restarts accumulation on the next frame.
    pub fn reset(&mut self) {
        self.frame = 0;
        if let Some(cpu) = &mut self.cpu {
            cpu.reset();
        }
    }

    /// Recreates the frame textures at the new size, clamped to the device's texture
    /// limit, and restarts accumulation.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        let max = device.limits().max_texture_dimension_2d;
        let (width, height) = (width.clamp(1, max), height.clamp(1, max));
        if width == self.width() && height == self.height() {
            return;
        }

        self.textures = FrameTextures::new(device, width, height);
        self.camera = Camera::from_settings(&self.scene.camera, width as f32 / height as f32);
        queue.write_buffer(&self.camera_uniform, 0, bytemuck::bytes_of(&self.camera.to_gpu()));

        self.trace_bindings = TraceBindings::new(
            device,
            &self.trace_pipeline,
            &self.textures,
            &self.params_uniform,
            &self.camera_uniform,
            &self.scene_buffers,
        );
        if let Some((pass, bindings)) = &mut self.present {
            *bindings = PresentBindings::new(device, pass, &self.textures);
        }
        if let Some(cpu) = &mut self.cpu {
            cpu.resize(width, height);
        }
        self.frame = 0;
        log::debug!("Resized render target to {width}x{height}");
    }

    fn params(&self) -> TraceParams {
        TraceParams {
            width: self.width(),
            height: self.height(),
            frame_index: self.frame,
            max_depth: self.max_depth,
            mode: self.mode.as_gpu(),
            sphere_count: self.scene.spheres.len() as u32,
            seed: gpu_seed(self.seed),
            triangle_count: self.scene.triangles.len() as u32,
            background: self.scene.background.extend(1.0).to_array(),
        }
    }

    /// Adds one sample per pixel to the accumulation. The GPU backend records a compute
    /// pass into `encoder`; the CPU backend traces now and uploads the result.
    pub fn encode_frame(&mut self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) {
        let output = output_index(self.frame);

        if let Some(cpu) = &mut self.cpu {
            let image = cpu.render(&self.scene, &self.camera);
            self.textures.upload(queue, output, image);
        } else {
            queue.write_buffer(&self.params_uniform, 0, bytemuck::bytes_of(&self.params()));
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Trace Pass"),
                timestamp_writes: None,
            });
            self.trace_pipeline.record(
                &mut cpass,
                &self.trace_bindings,
                self.frame,
                self.width(),
                self.height(),
            );
        }

        self.frame = self.frame.wrapping_add(1);
    }

    /// Index of the texture holding the latest accumulated frame.
    pub fn latest_index(&self) -> usize {
        output_index(self.frame.wrapping_sub(1))
    }

    pub fn latest_texture(&self) -> &wgpu::Texture {
        self.textures.texture(self.latest_index())
    }

    /// Blits the latest frame into `view`. Does nothing for a renderer built without a
    /// target format.
    pub fn encode_present(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let Some((pass, bindings)) = &self.present else {
            return;
        };
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Present Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.record(&mut rpass, bindings, self.latest_index());
    }
}
