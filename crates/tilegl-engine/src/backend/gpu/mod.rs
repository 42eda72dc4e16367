//! wgpu render controller.
//!
//! Draws are recorded into a [`batch::FrameBatch`] and replayed in one render
//! pass when the frame ends, when pixels are read back, or when a texture a
//! pending draw samples is about to change.

use std::any::Any;

use anyhow::Result;

use crate::backend::pixels::unpack_levels;
use crate::backend::TextureNames;
use crate::coords::{Vec3, Vec4, WindowSize};
use crate::draw::{AppliedState, GlPrimitive, GlState, MipMapOptions};
use crate::manager::{is_valid_unpack_alignment, GlStateManager, TextureId};
use crate::transform::Transform;

mod batch;
mod device;
mod pipeline;
mod target;
mod textures;

pub use device::GpuInit;

use batch::FrameBatch;
use device::HeadlessGpu;
use pipeline::{uniform_binding_size, uniform_stride, Pipelines};
use target::GpuTarget;
use textures::GpuTextures;

/// Growable vertex and dynamic-offset uniform buffers shared by all draws.
struct FrameBuffers {
    uniform_stride: u64,

    vertex: Option<wgpu::Buffer>,
    vertex_capacity: usize,

    uniform: Option<wgpu::Buffer>,
    uniform_capacity: usize,
    uniform_bind_group: Option<wgpu::BindGroup>,
}

impl FrameBuffers {
    fn new(uniform_stride: u64) -> Self {
        Self {
            uniform_stride,
            vertex: None,
            vertex_capacity: 0,
            uniform: None,
            uniform_capacity: 0,
            uniform_bind_group: None,
        }
    }

    fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        uniform_layout: &wgpu::BindGroupLayout,
        batch: &FrameBatch,
    ) {
        if batch.vertices.is_empty() {
            return;
        }

        if batch.vertices.len() > self.vertex_capacity || self.vertex.is_none() {
            let cap = batch.vertices.len().next_power_of_two().max(1024);
            self.vertex = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tilegl vertex buffer"),
                size: (cap * std::mem::size_of::<batch::GpuVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vertex_capacity = cap;
        }

        if batch.uniforms.len() > self.uniform_capacity || self.uniform.is_none() {
            let cap = batch.uniforms.len().next_power_of_two().max(64);
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tilegl draw uniforms"),
                size: cap as u64 * self.uniform_stride,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.uniform_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tilegl draw uniforms bind group"),
                layout: uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        size: uniform_binding_size(),
                    }),
                }],
            }));
            self.uniform = Some(buffer);
            self.uniform_capacity = cap;
        }

        if let Some(vertex) = self.vertex.as_ref() {
            queue.write_buffer(vertex, 0, bytemuck::cast_slice(&batch.vertices));
        }
        if let Some(uniform) = self.uniform.as_ref() {
            let stride = self.uniform_stride as usize;
            let mut staging = vec![0u8; batch.uniforms.len() * stride];
            for (chunk, u) in staging.chunks_exact_mut(stride).zip(&batch.uniforms) {
                let bytes = bytemuck::bytes_of(u);
                chunk[..bytes.len()].copy_from_slice(bytes);
            }
            queue.write_buffer(uniform, 0, &staging);
        }
    }
}

pub struct GpuStateManager {
    gpu: HeadlessGpu,
    target: GpuTarget,
    pipelines: Pipelines,
    textures: GpuTextures,
    buffers: FrameBuffers,
    batch: FrameBatch,

    state: AppliedState,
    projection: Transform,
    model_view: Transform,
    current_colour: Vec4,

    unpack_alignment: u32,
    names: TextureNames,
    bound: TextureId,
}

impl GpuStateManager {
    pub fn new(window_size: WindowSize, init: GpuInit) -> Result<Self> {
        let gpu = HeadlessGpu::new(init)?;
        let device = gpu.device();

        let target = GpuTarget::new(device, window_size);
        let pipelines = Pipelines::new(device);
        let textures = GpuTextures::new(device, gpu.queue(), &pipelines.texture_layout);
        let stride = uniform_stride(device.limits().min_uniform_buffer_offset_alignment);

        log::info!("gpu backend: {}x{} offscreen target", window_size.x, window_size.y);
        Ok(Self {
            target,
            pipelines,
            textures,
            buffers: FrameBuffers::new(stride),
            // New attachments start transparent black with depth at the far plane.
            batch: FrameBatch { clear_colour: Some(Vec4::default()), ..FrameBatch::default() },
            state: AppliedState::default(),
            projection: Transform::orthographic(window_size.x as f32, window_size.y as f32),
            model_view: Transform::IDENTITY,
            current_colour: Vec4::new(1.0, 1.0, 1.0, 1.0),
            unpack_alignment: 4,
            names: TextureNames::default(),
            bound: TextureId::NONE,
            gpu,
        })
    }

    #[inline]
    pub fn adapter_name(&self) -> String {
        self.gpu.adapter_name()
    }

    #[inline]
    pub fn current_state(&self) -> GlState {
        self.state.current()
    }

    #[inline]
    pub fn bound_texture(&self) -> TextureId {
        self.bound
    }

    /// Uploaded mip levels of a loaded texture.
    pub fn texture_levels(&self, texture: TextureId) -> Option<u32> {
        self.textures.get(texture).map(|t| t.levels)
    }

    /// Submits every recorded draw in a single render pass.
    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let device = self.gpu.device();
        let queue = self.gpu.queue();

        self.pipelines.prepare(device, self.batch.calls.iter().map(|c| c.key));
        self.buffers.upload(device, queue, &self.pipelines.uniform_layout, &self.batch);

        let (load, depth_load) = match self.batch.clear_colour {
            Some(c) => (
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: f64::from(c.x),
                    g: f64::from(c.y),
                    b: f64::from(c.z),
                    a: f64::from(c.t),
                }),
                wgpu::LoadOp::Clear(1.0),
            ),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tilegl frame encoder"),
        });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tilegl primitive pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.target.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.target.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let (Some(vertex), Some(uniforms)) =
                (self.buffers.vertex.as_ref(), self.buffers.uniform_bind_group.as_ref())
            {
                rpass.set_vertex_buffer(0, vertex.slice(..));
                for call in &self.batch.calls {
                    let Some(pipeline) = self.pipelines.get(&call.key) else { continue };
                    let offset = u64::from(call.uniform_index) * self.buffers.uniform_stride;
                    rpass.set_pipeline(pipeline);
                    rpass.set_bind_group(0, uniforms, &[offset as u32]);
                    rpass.set_bind_group(1, self.textures.bind_group(call.texture), &[]);
                    rpass.draw(call.first_vertex..call.first_vertex + call.vertex_count, 0..1);
                }
            }
        }
        queue.submit([encoder.finish()]);

        log::trace!("gpu: flushed {} draws", self.batch.calls.len());
        self.batch.clear();
    }
}

impl GlStateManager for GpuStateManager {
    fn name(&self) -> &str {
        "gpu"
    }

    fn set(&mut self, state: &GlState) {
        let changes = self.state.apply(state);
        if !changes.is_empty() {
            log::trace!("gpu: state changes {changes:?}");
        }
    }

    fn pixelstore_unpack_alignment(&mut self, bpp: u32) {
        debug_assert!(is_valid_unpack_alignment(bpp), "unpack alignment {bpp}");
        if !is_valid_unpack_alignment(bpp) {
            log::warn!("gpu: ignoring unpack alignment {bpp}");
            return;
        }
        self.unpack_alignment = bpp;
    }

    fn reset_view_for_redraw(&mut self, x: f32, y: f32) {
        self.projection = Transform::orthographic(x, y);
        self.model_view = Transform::IDENTITY;
    }

    fn reset_view_for_resize(&mut self, window_size: WindowSize) {
        if window_size != self.target.size() {
            log::debug!("gpu: resize to {}x{}", window_size.x, window_size.y);
            // Pending draws belong to the old target, which is about to go away.
            self.batch.clear();
            self.batch.clear_colour = Some(Vec4::default());
            self.target = GpuTarget::new(self.gpu.device(), window_size);
        }
        self.reset_view_for_redraw(window_size.x as f32, window_size.y as f32);
    }

    fn set_transform(&mut self, trans: Option<Vec3>, scale: Option<Vec3>) {
        self.model_view = Transform::translate_scale(trans, scale);
    }

    fn reset_transform(&mut self) {
        self.model_view = Transform::IDENTITY;
    }

    fn set_current_color_rgba(&mut self, color: Vec4) {
        self.current_colour = color;
    }

    fn draw_primitive(&mut self, prim: &GlPrimitive<'_>) {
        prim.debug_validate();

        let state = self.state.current();
        if prim.count == 0 || !state.array_vertex || prim.vertices.is_none() {
            log::trace!("gpu: draw with no vertex array skipped");
            return;
        }

        let mvp = self.projection
            * self.model_view
            * Transform::translate_scale(prim.pretranslate, prim.prescale);
        let flat = prim.color.map_or(self.current_colour, Vec4::from);
        if !self.batch.record(prim, &state, &mvp, flat, self.bound) {
            log::error!(
                "gpu: primitive streams shorter than {} vertices; draw dropped",
                prim.count
            );
        }
    }

    fn generate_textures(&mut self, count: usize) -> Vec<TextureId> {
        let ids = self.names.generate(count);
        log::debug!("gpu: generated textures {ids:?}");
        ids
    }

    fn delete_textures(&mut self, textures: &[TextureId]) {
        if textures.iter().any(|id| self.batch.uses_texture(*id)) {
            self.flush();
        }
        for id in textures {
            self.textures.remove(*id);
            if *id == self.bound {
                self.bound = TextureId::NONE;
            }
        }
        self.names.delete(textures);
        log::debug!("gpu: deleted textures {textures:?}");
    }

    fn bind_texture(&mut self, texture: TextureId) {
        debug_assert!(
            texture.is_none() || self.names.is_live(texture),
            "binding texture {texture:?} that is not live"
        );
        self.bound = texture;
    }

    fn load_texture(&mut self, pixels: &[u8], width: u32, height: u32, mip_opt: MipMapOptions) {
        debug_assert!(!self.bound.is_none(), "load_texture with no texture bound");
        if self.bound.is_none() {
            log::warn!("gpu: load_texture with no texture bound; ignored");
            return;
        }

        let alignment = self.unpack_alignment;
        let Some(levels) = unpack_levels(pixels, width, height, alignment, mip_opt) else {
            debug_assert!(false, "pixel data too short for {width}x{height}");
            log::error!("gpu: pixel data too short for {width}x{height}; upload dropped");
            return;
        };

        // Draws already recorded must see the old contents.
        if self.batch.uses_texture(self.bound) {
            self.flush();
        }

        self.textures.load(
            self.gpu.device(),
            self.gpu.queue(),
            &self.pipelines.texture_layout,
            self.bound,
            &levels,
            mip_opt,
        );
        log::debug!(
            "gpu: texture {:?} loaded {width}x{height}, {} levels",
            self.bound,
            levels.len()
        );
    }

    fn begin_frame(&mut self, clear: Vec4) {
        // Anything recorded so far would be covered by the clear.
        self.batch.clear();
        self.batch.clear_colour = Some(clear);
    }

    fn end_frame(&mut self) {
        self.flush();
    }

    fn target_size(&self) -> WindowSize {
        self.target.size()
    }

    fn read_pixels(&mut self) -> Result<Vec<u8>> {
        self.flush();
        self.target.read_rgba8(self.gpu.device(), self.gpu.queue())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::DrawingMode;

    /// Machines without any adapter (most CI runners) skip these.
    fn manager() -> Option<GpuStateManager> {
        let init = GpuInit { force_fallback_adapter: true, ..GpuInit::default() };
        match GpuStateManager::new(WindowSize::new(16, 16), init) {
            Ok(m) => Some(m),
            Err(err) => {
                eprintln!("skipping gpu test: {err:#}");
                None
            }
        }
    }

    #[test]
    fn cleared_frame_reads_back_clear_colour() {
        let Some(mut m) = manager() else { return };
        m.begin_frame(Vec4::new(0.0, 0.0, 1.0, 1.0));
        m.end_frame();
        let pixels = m.read_pixels().unwrap();
        assert_eq!(pixels.len(), 16 * 16 * 4);
        assert_eq!(&pixels[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn flat_triangle_covers_top_left() {
        let Some(mut m) = manager() else { return };
        let tri: [f32; 6] = [0.0, 0.0, 16.0, 0.0, 0.0, 16.0];
        m.begin_frame(Vec4::new(0.0, 0.0, 0.0, 1.0));
        m.set(&GlState { array_vertex: true, ..GlState::default() });
        m.set_current_color(Vec3::new(1.0, 0.0, 0.0));
        m.draw_primitive(&GlPrimitive::new(
            8,
            3,
            2,
            DrawingMode::Triangles,
            Some(bytemuck::cast_slice(&tri)),
            None,
            None,
        ));
        m.end_frame();

        let pixels = m.read_pixels().unwrap();
        let at = |x: usize, y: usize| &pixels[(y * 16 + x) * 4..][..4];
        assert_eq!(at(2, 2), &[255, 0, 0, 255]);
        assert_eq!(at(14, 14), &[0, 0, 0, 255]);
    }

    #[test]
    fn textures_recycle_and_unbind_on_delete() {
        let Some(mut m) = manager() else { return };
        let ids = m.generate_textures(2);
        m.bind_texture(ids[1]);
        m.load_texture(&[255; 16 * 4], 4, 4, MipMapOptions::Create);
        assert_eq!(m.texture_levels(ids[1]), Some(3));

        m.delete_textures(&ids[1..]);
        assert_eq!(m.bound_texture(), TextureId::NONE);
        assert_eq!(m.texture_levels(ids[1]), None);
        assert_eq!(m.generate_textures(1), vec![ids[1]]);
    }
}
