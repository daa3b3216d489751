use crate::config::{HeadlessConfig, RenderBackend, RenderConfig};
use crate::error::Result;
use crate::gpu_context::{check_target_size, GpuContext};
use crate::image::{Image, BYTES_PER_TEXEL};
use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::tracer::{Camera, CpuTracer};

const PROGRESS_INTERVAL: u32 = 100;

/// Renders `headless.frames` samples per pixel offscreen and writes the mean as a PNG.
pub fn run_headless(config: &RenderConfig, headless: &HeadlessConfig) -> Result<()> {
    config.validate()?;
    let frames = headless.frames.max(1);
    let scene = Scene::preset(config.scene);
    log::info!(
        "Rendering {frames} frames of {:?} at {}x{} to {}",
        config.scene,
        config.width,
        config.height,
        headless.output.display()
    );

    let image = match config.backend {
        RenderBackend::Cpu => render_cpu(config, &scene, frames),
        RenderBackend::Gpu => render_gpu(config, scene, frames)?,
    };
    image.save_png(&headless.output)
}

/// CPU-only path; no adapter is needed.
pub fn render_cpu(config: &RenderConfig, scene: &Scene, frames: u32) -> Image {
    let camera = Camera::from_settings(&scene.camera, config.aspect_ratio());
    let mut tracer = CpuTracer::new(
        config.width,
        config.height,
        config.max_depth,
        config.mode,
        config.seed,
    );
    for frame in 1..=frames {
        tracer.render(scene, &camera);
        if frame % PROGRESS_INTERVAL == 0 {
            log::info!("{frame}/{frames} frames");
        }
    }
    tracer.image().clone()
}

fn render_gpu(config: &RenderConfig, scene: Scene, frames: u32) -> Result<Image> {
    let context = pollster::block_on(GpuContext::new(wgpu::Instance::default(), None))?;
    render_gpu_with(&context, config, scene, frames)
}

/// Renders on an existing device. Device errors raised along the way are returned
/// rather than logged.
pub(crate) fn render_gpu_with(
    context: &GpuContext,
    config: &RenderConfig,
    scene: Scene,
    frames: u32,
) -> Result<Image> {
    check_target_size(&context.device.limits(), config.width, config.height)?;
    context.validated(|context| render_frames(context, config, scene, frames))
}

fn render_frames(context: &GpuContext, config: &RenderConfig, scene: Scene, frames: u32) -> Result<Image> {
    let GpuContext { device, queue, .. } = context;

    let mut renderer = Renderer::new(device, config, scene, None)?;
    for frame in 1..=frames {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Headless Frame Encoder"),
        });
        renderer.encode_frame(queue, &mut encoder);
        queue.submit(Some(encoder.finish()));
        if frame % PROGRESS_INTERVAL == 0 {
            device.poll(wgpu::Maintain::Wait);
            log::info!("{frame}/{frames} frames");
        }
    }

    read_texture(
        device,
        queue,
        renderer.latest_texture(),
        renderer.width(),
        renderer.height(),
    )
}

/// Row pitch of a texture-to-buffer copy of an `Rgba32Float` row of `width` texels.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * BYTES_PER_TEXEL).div_ceil(align) * align
}

/// Copies an `Rgba32Float` texture back to the CPU.
pub(crate) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Image> {
    let padded = padded_bytes_per_row(width);
    let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: u64::from(padded) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &readback_buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = readback_buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv()??;

    let image = {
        let data = slice.get_mapped_range();
        Image::from_padded_rows(width, height, padded, &data)
    };
    readback_buffer.unmap();
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScenePreset, ShadeMode};
    use crate::error::RenderError;
    use crate::gpu_context::test_context;
    use crate::grid::gradient_texel;

    #[test]
    fn test_padded_bytes_per_row() {
        assert_eq!(padded_bytes_per_row(16), 256);
        assert_eq!(padded_bytes_per_row(17), 512);
        assert_eq!(padded_bytes_per_row(800), 12800);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn test_cpu_gradient_export() {
        let config = RenderConfig {
            width: 32,
            height: 16,
            backend: RenderBackend::Cpu,
            mode: ShadeMode::Gradient,
            ..Default::default()
        };
        let image = render_cpu(&config, &Scene::preset(ScenePreset::Basic), 2);
        assert_eq!(image.load(31, 15), gradient_texel(31, 15, 32, 16));
        assert_eq!(image.load(5, 7), gradient_texel(5, 7, 32, 16));
    }

    #[test]
    fn test_headless_cpu_writes_png() {
        let output = std::env::temp_dir().join(format!("razz-tracer-test-{}.png", std::process::id()));
        let config = RenderConfig {
            width: 8,
            height: 6,
            backend: RenderBackend::Cpu,
            max_depth: 3,
            ..Default::default()
        };
        let headless = HeadlessConfig {
            frames: 2,
            output: output.clone(),
        };
        run_headless(&config, &headless).unwrap();

        let saved = ::image::open(&output).unwrap().to_rgba8();
        assert_eq!(saved.dimensions(), (8, 6));
        assert!(saved.pixels().all(|p| p[3] == 255));
        std::fs::remove_file(&output).unwrap();
    }

    #[test]
    fn test_gpu_gradient_matches_grid() {
        let Some(context) = test_context() else {
            return;
        };
        let (width, height) = (100, 70);
        let config = RenderConfig {
            width,
            height,
            mode: ShadeMode::Gradient,
            ..Default::default()
        };
        let image = render_gpu_with(&context, &config, Scene::basic(), 2).unwrap();
        assert_eq!((image.width, image.height), (width, height));
        for y in 0..height {
            for x in 0..width {
                let expected = gradient_texel(x, y, width, height).unwrap();
                let actual = image.load(x, y).unwrap();
                for c in 0..4 {
                    assert!((actual[c] - expected[c]).abs() < 1e-6, "({x}, {y}): {actual:?} vs {expected:?}");
                }
            }
        }
    }

    #[test]
    fn test_gpu_trace_converges_to_cpu_mean() {
        let Some(context) = test_context() else {
            return;
        };
        let config = RenderConfig {
            width: 48,
            height: 32,
            scene: ScenePreset::Spheres,
            ..Default::default()
        };
        let gpu = render_gpu_with(&context, &config, Scene::spheres(), 64).unwrap();
        let cpu = render_cpu(&config, &Scene::spheres(), 64);

        let mean = |image: &Image| {
            let sum = image.data.iter().fold([0.0f64; 3], |mut acc, t| {
                for c in 0..3 {
                    acc[c] += f64::from(t[c]);
                }
                acc
            });
            sum.map(|c| c / image.data.len() as f64)
        };
        let (gpu_mean, cpu_mean) = (mean(&gpu), mean(&cpu));
        for c in 0..3 {
            assert!(
                (gpu_mean[c] - cpu_mean[c]).abs() < 0.02,
                "channel {c}: gpu {gpu_mean:?} cpu {cpu_mean:?}"
            );
        }
        assert!(gpu.data.iter().all(|t| t[3] == 1.0));
    }

    #[test]
    fn test_gpu_rejects_oversized_target() {
        let Some(context) = test_context() else {
            return;
        };
        let config = RenderConfig {
            width: context.device.limits().max_texture_dimension_2d + 1,
            height: 4,
            ..Default::default()
        };
        let result = render_gpu_with(&context, &config, Scene::basic(), 1);
        assert!(matches!(result, Err(RenderError::TooLarge { .. })), "{result:?}");
    }
}
