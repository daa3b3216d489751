use crate::image::{Image, BYTES_PER_TEXEL};

pub const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Ping-pong pair of accumulation textures. Frame `k` writes `k % 2` and reads the other.
pub struct FrameTextures {
    textures: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    width: u32,
    height: u32,
}

pub fn output_index(frame: u32) -> usize {
    (frame % 2) as usize
}

pub fn input_index(frame: u32) -> usize {
    output_index(frame) ^ 1
}

fn create_frame_texture(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FRAME_FORMAT,
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

impl FrameTextures {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let textures = [
            create_frame_texture(device, "Frame Texture A", width, height),
            create_frame_texture(device, "Frame Texture B", width, height),
        ];
        let views = [
            textures[0].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];
        log::debug!("Created {width}x{height} frame textures");
        Self {
            textures,
            views,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texture(&self, index: usize) -> &wgpu::Texture {
        &self.textures[index]
    }

    pub fn view(&self, index: usize) -> &wgpu::TextureView {
        &self.views[index]
    }

    /// Replaces the contents of texture `index` with a CPU-rendered image of the same size.
    pub fn upload(&self, queue: &wgpu::Queue, index: usize, image: &Image) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.textures[index],
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_bytes(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(image.width * BYTES_PER_TEXEL),
                rows_per_image: Some(image.height),
            },
            wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
        );
    }
}
