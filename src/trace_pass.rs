use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::frame_textures::{input_index, output_index, FrameTextures, FRAME_FORMAT};
use crate::grid::workgroup_count;
use crate::scene::Scene;

pub struct TracePipeline {
    pipeline: wgpu::ComputePipeline,
}

const TRACE_GROUP_ID: u32 = 0;
const OUTPUT_TEXTURE_IDX: u32 = 0;
const INPUT_TEXTURE_IDX: u32 = 1;
const PARAMS_BUFFER_IDX: u32 = 2;
const CAMERA_BUFFER_IDX: u32 = 3;
const SPHERE_BUFFER_IDX: u32 = 4;
const TRIANGLE_BUFFER_IDX: u32 = 5;
const PERLIN_BUFFER_IDX: u32 = 6;

/// Matches `Params` in trace.wgsl.
#[repr(C)]
#[derive(Default, Copy, Clone, Debug, Pod, Zeroable)]
pub struct TraceParams {
    pub width: u32,
    pub height: u32,
    pub frame_index: u32,
    pub max_depth: u32,
    pub mode: u32,
    pub sphere_count: u32,
    pub seed: u32,
    pub triangle_count: u32,
    pub background: [f32; 4],
}

/// Folds a 64-bit seed into the shader's 32-bit one so the high half still matters.
pub fn gpu_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Read-only scene storage: spheres, triangles and the Perlin table.
pub struct SceneBuffers {
    spheres: wgpu::Buffer,
    triangles: wgpu::Buffer,
    perlin: wgpu::Buffer,
}

impl SceneBuffers {
    pub fn new(device: &wgpu::Device, scene: &Scene) -> Self {
        let spheres = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Buffer"),
            contents: bytemuck::cast_slice(&scene.gpu_spheres()),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let triangles = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Triangle Buffer"),
            contents: bytemuck::cast_slice(&scene.gpu_triangles()),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let perlin = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Perlin Buffer"),
            contents: bytemuck::bytes_of(&scene.perlin.to_gpu()),
            usage: wgpu::BufferUsages::STORAGE,
        });
        Self {
            spheres,
            triangles,
            perlin,
        }
    }
}

fn storage_buffer_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_texture_entry(binding: u32, access: wgpu::StorageTextureAccess) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access,
            format: FRAME_FORMAT,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

impl TracePipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let trace_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Trace: Bind Group Layout"),
                entries: &[
                    storage_texture_entry(OUTPUT_TEXTURE_IDX, wgpu::StorageTextureAccess::WriteOnly),
                    storage_texture_entry(INPUT_TEXTURE_IDX, wgpu::StorageTextureAccess::ReadOnly),
                    wgpu::BindGroupLayoutEntry { // Params
                        binding: PARAMS_BUFFER_IDX,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry { // Camera
                        binding: CAMERA_BUFFER_IDX,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    storage_buffer_entry(SPHERE_BUFFER_IDX),
                    storage_buffer_entry(TRIANGLE_BUFFER_IDX),
                    storage_buffer_entry(PERLIN_BUFFER_IDX),
                ],
            });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Trace Pipeline Layout"),
            bind_group_layouts: &[&trace_bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::include_wgsl!("trace.wgsl"));
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Trace Pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: Some("trace_pixel"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self { pipeline }
    }
}

/// One bind group per ping-pong direction, indexed by `output_index(frame)`.
pub struct TraceBindings {
    groups: [wgpu::BindGroup; 2],
}

fn create_trace_group(
    device: &wgpu::Device,
    pipeline: &TracePipeline,
    output: &wgpu::TextureView,
    input: &wgpu::TextureView,
    params_uniform: &wgpu::Buffer,
    camera_uniform: &wgpu::Buffer,
    scene_buffers: &SceneBuffers,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Trace: Bind Group"),
        layout: &pipeline.pipeline.get_bind_group_layout(TRACE_GROUP_ID),
        entries: &[
            wgpu::BindGroupEntry {
                binding: OUTPUT_TEXTURE_IDX,
                resource: wgpu::BindingResource::TextureView(output),
            },
            wgpu::BindGroupEntry {
                binding: INPUT_TEXTURE_IDX,
                resource: wgpu::BindingResource::TextureView(input),
            },
            wgpu::BindGroupEntry {
                binding: PARAMS_BUFFER_IDX,
                resource: params_uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: CAMERA_BUFFER_IDX,
                resource: camera_uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: SPHERE_BUFFER_IDX,
                resource: scene_buffers.spheres.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: TRIANGLE_BUFFER_IDX,
                resource: scene_buffers.triangles.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: PERLIN_BUFFER_IDX,
                resource: scene_buffers.perlin.as_entire_binding(),
            },
        ],
    })
}

impl TraceBindings {
    pub fn new(
        device: &wgpu::Device,
        pipeline: &TracePipeline,
        textures: &FrameTextures,
        params_uniform: &wgpu::Buffer,
        camera_uniform: &wgpu::Buffer,
        scene_buffers: &SceneBuffers,
    ) -> Self {
        let groups = [0, 1].map(|frame| {
            create_trace_group(
                device,
                pipeline,
                textures.view(output_index(frame)),
                textures.view(input_index(frame)),
                params_uniform,
                camera_uniform,
                scene_buffers,
            )
        });
        Self { groups }
    }
}

impl<'a> TracePipeline {
    pub fn record<'pass>(
        &'a self,
        cpass: &mut wgpu::ComputePass<'pass>,
        bindings: &'a TraceBindings,
        frame: u32,
        width: u32,
        height: u32,
    ) where
        'a: 'pass,
    {
        let (x, y, z) = workgroup_count(width, height);
        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(TRACE_GROUP_ID, &bindings.groups[output_index(frame)], &[]);
        cpass.dispatch_workgroups(x, y, z);
    }
}
