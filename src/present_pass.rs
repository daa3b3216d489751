use crate::frame_textures::{FrameTextures, FRAME_FORMAT};

/// Copies a frame texture to the render target, one full-screen triangle, no blending.
pub struct PresentPass {
    pipeline: wgpu::RenderPipeline,
}

impl PresentPass {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let frame_texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Present: Frame Texture Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::ReadOnly,
                        format: FRAME_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                }],
            });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Present Pipeline Layout"),
            bind_group_layouts: &[&frame_texture_bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::include_wgsl!("present.wgsl"));
        // Float32 targets reject any blend state unless they are blendable.
        let blend = format
            .guaranteed_format_features(device.features())
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::BLENDABLE)
            .then_some(wgpu::BlendState::REPLACE);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Present Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: Default::default(),
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: Default::default(),
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self { pipeline }
    }
}

pub struct PresentBindings {
    frame_textures: [wgpu::BindGroup; 2],
}

impl PresentBindings {
    pub fn new(
        device: &wgpu::Device,
        PresentPass { pipeline }: &PresentPass,
        textures: &FrameTextures,
    ) -> Self {
        let frame_textures = [0, 1].map(|index| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Present: Frame Texture Bind Group"),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(textures.view(index)),
                }],
            })
        });
        Self { frame_textures }
    }
}

impl<'a> PresentPass {
    /// Draws frame texture `index` over the whole target.
    pub fn record<'pass>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'pass>,
        bindings: &'a PresentBindings,
        index: usize,
    ) where
        'a: 'pass,
    {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &bindings.frame_textures[index], &[]);
        rpass.draw(0..3, 0..1);
    }
}

/// Clip-space position `vs_main` emits for `vertex_index`.
pub fn fullscreen_vertex(vertex_index: u32) -> [f32; 4] {
    let x = ((vertex_index & 1) << 2) as f32 - 1.0;
    let y = ((vertex_index & 2) << 1) as f32 - 1.0;
    [x, y, 0.0, 1.0]
}
