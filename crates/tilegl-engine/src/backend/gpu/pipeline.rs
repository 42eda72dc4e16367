//! Render pipelines keyed by the fixed-function state they bake in.

use std::collections::HashMap;
use std::num::NonZeroU64;

use crate::draw::{DrawingMode, GlState};

use super::batch::{DrawUniforms, GpuVertex};
use super::target::{COLOR_FORMAT, DEPTH_FORMAT};

/// State that must be baked into a wgpu pipeline rather than set per draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub topology: wgpu::PrimitiveTopology,
    pub blend: bool,
    pub depth_test: bool,
}

impl PipelineKey {
    pub(crate) fn new(mode: DrawingMode, state: &GlState) -> Self {
        let topology = match mode {
            DrawingMode::Points => wgpu::PrimitiveTopology::PointList,
            DrawingMode::Lines => wgpu::PrimitiveTopology::LineList,
            // Quads arrive already split into triangles.
            DrawingMode::Triangles | DrawingMode::Quads => wgpu::PrimitiveTopology::TriangleList,
            DrawingMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        };
        Self { topology, blend: state.blend, depth_test: state.depthtest }
    }
}

fn src_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: component, alpha: component }
}

/// Shader, layouts and the lazily built pipeline per [`PipelineKey`].
pub(crate) struct Pipelines {
    shader: wgpu::ShaderModule,
    pub(crate) uniform_layout: wgpu::BindGroupLayout,
    pub(crate) texture_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    cache: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl Pipelines {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tilegl primitive shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/primitive.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tilegl draw uniforms bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: uniform_binding_size(),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tilegl texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tilegl pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        Self { shader, uniform_layout, texture_layout, layout, cache: HashMap::new() }
    }

    /// Builds every pipeline `keys` needs; call before borrowing with [`Pipelines::get`].
    pub(crate) fn prepare(
        &mut self,
        device: &wgpu::Device,
        keys: impl IntoIterator<Item = PipelineKey>,
    ) {
        for key in keys {
            if !self.cache.contains_key(&key) {
                log::debug!("gpu: building pipeline {key:?}");
                let pipeline = self.build(device, key);
                self.cache.insert(key, pipeline);
            }
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.cache.get(key)
    }

    fn build(&self, device: &wgpu::Device, key: PipelineKey) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tilegl primitive pipeline"),
            layout: Some(&self.layout),

            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[GpuVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: key.blend.then(src_alpha_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: key.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_test,
                depth_compare: if key.depth_test {
                    wgpu::CompareFunction::LessEqual
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }
}

/// `DrawUniforms` is a fixed 80-byte struct, so this is never `None`.
pub(crate) fn uniform_binding_size() -> Option<NonZeroU64> {
    NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64)
}

/// Distance between consecutive uniforms in the dynamic-offset buffer.
pub(crate) fn uniform_stride(min_alignment: u32) -> u64 {
    let size = std::mem::size_of::<DrawUniforms>() as u64;
    let align = u64::from(min_alignment.max(1));
    size.div_ceil(align) * align
}
