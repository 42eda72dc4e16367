//! Offscreen colour/depth attachments and CPU readback.

use std::sync::mpsc::channel;

use anyhow::{Context, Result};

use crate::coords::WindowSize;

pub(crate) const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// `bytes_per_row` in texture/buffer copies must be a multiple of this.
const COPY_ROW_ALIGN: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

pub(crate) struct GpuTarget {
    size: WindowSize,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl GpuTarget {
    pub(crate) fn new(device: &wgpu::Device, size: WindowSize) -> Self {
        // Zero-sized attachments are invalid; keep at least one pixel.
        let extent = wgpu::Extent3d {
            width: size.x.max(1),
            height: size.y.max(1),
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tilegl colour target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tilegl depth target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
        Self { size, color, color_view, depth_view }
    }

    #[inline]
    pub(crate) fn size(&self) -> WindowSize {
        self.size
    }

    #[inline]
    pub(crate) fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    #[inline]
    pub(crate) fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Copies the colour attachment back as tightly packed RGBA8, top row first.
    pub(crate) fn read_rgba8(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>> {
        let WindowSize { x: width, y: height } = self.size;
        if self.size.is_empty() {
            return Ok(Vec::new());
        }

        let row_bytes = width * 4;
        let padded_row = padded_row_bytes(width);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tilegl readback"),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tilegl readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        queue.submit([encoder.finish()]);

        let slice = buffer.slice(..);
        let (sender, receiver) = channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            drop(sender.send(res));
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device lost during readback")?;
        receiver
            .recv()
            .context("readback mapping callback dropped")?
            .context("failed to map readback buffer")?;

        let mapped = slice.get_mapped_range();
        let data = strip_row_padding(&mapped, row_bytes, padded_row, height);
        drop(mapped);
        buffer.unmap();
        Ok(data)
    }
}

#[inline]
fn padded_row_bytes(width: u32) -> u32 {
    (width * 4).div_ceil(COPY_ROW_ALIGN) * COPY_ROW_ALIGN
}

fn strip_row_padding(padded: &[u8], row_bytes: u32, padded_row: u32, height: u32) -> Vec<u8> {
    let (row_bytes, padded_row) = (row_bytes as usize, padded_row as usize);
    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for row in padded.chunks(padded_row).take(height as usize) {
        data.extend_from_slice(&row[..row_bytes]);
    }
    data
}
