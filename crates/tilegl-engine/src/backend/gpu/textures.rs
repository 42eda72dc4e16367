//! GPU texture storage keyed by [`TextureId`].

use std::collections::HashMap;

use crate::backend::pixels::Level;
use crate::draw::MipMapOptions;
use crate::manager::TextureId;

pub(crate) struct GpuTexture {
    // Owns the storage the bind group's view refers to.
    _texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
    pub levels: u32,
}

pub(crate) struct GpuTextures {
    entries: HashMap<TextureId, GpuTexture>,
    /// Bound for untextured draws so the bind group layout is always satisfied.
    fallback: GpuTexture,
    nearest_mip: wgpu::Sampler,
    linear_mip: wgpu::Sampler,
}

impl GpuTextures {
    pub(crate) fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let nearest_mip = sampler(device, wgpu::MipmapFilterMode::Nearest);
        let linear_mip = sampler(device, wgpu::MipmapFilterMode::Linear);
        let white = Level { width: 1, height: 1, texels: vec![[255; 4]] };
        let fallback = upload(device, queue, layout, &nearest_mip, std::slice::from_ref(&white));
        Self { entries: HashMap::new(), fallback, nearest_mip, linear_mip }
    }

    /// Replaces the storage of `id` with `levels` (base first).
    pub(crate) fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        id: TextureId,
        levels: &[Level],
        mip: MipMapOptions,
    ) {
        let sampler = match mip {
            MipMapOptions::Max => &self.linear_mip,
            MipMapOptions::Create | MipMapOptions::None => &self.nearest_mip,
        };
        let texture = upload(device, queue, layout, sampler, levels);
        self.entries.insert(id, texture);
    }

    pub(crate) fn remove(&mut self, id: TextureId) {
        self.entries.remove(&id);
    }

    #[inline]
    pub(crate) fn get(&self, id: TextureId) -> Option<&GpuTexture> {
        self.entries.get(&id)
    }

    /// Bind group for `id`, or the white fallback when nothing is stored there.
    pub(crate) fn bind_group(&self, id: TextureId) -> &wgpu::BindGroup {
        self.entries.get(&id).map_or(&self.fallback.bind_group, |t| &t.bind_group)
    }
}

fn sampler(device: &wgpu::Device, mipmap_filter: wgpu::MipmapFilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("tilegl texture sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter,
        ..Default::default()
    })
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    levels: &[Level],
) -> GpuTexture {
    let (width, height) = levels.first().map_or((1, 1), |l| (l.width.max(1), l.height.max(1)));
    let level_count = levels.len().max(1) as u32;

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("tilegl texture"),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (mip_level, level) in levels.iter().enumerate() {
        if level.width == 0 || level.height == 0 {
            continue;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: mip_level as u32,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            level.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(level.width * 4),
                rows_per_image: Some(level.height),
            },
            wgpu::Extent3d { width: level.width, height: level.height, depth_or_array_layers: 1 },
        );
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("tilegl texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    GpuTexture { _texture: texture, bind_group, levels: level_count }
}
