//! Renderizado offscreen del heatmap a un bitmap RGBA (lectura GPU -> CPU).

use super::resources::HeatmapResources;
use super::utils::{check_texture_size, is_bgra, padded_bytes_per_row, strip_row_padding, swap_red_blue};
use crate::heatmap::raster::clamp_bitmap_size;
use anyhow::{Context, Result};
use image::RgbaImage;

/// Dibuja la franja en un target temporal de `width` x `height` y lo lee de vuelta.
///
/// Devuelve un error, sin tocar la GPU, si el tamaño supera el límite del dispositivo.
pub fn render_to_bitmap(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    resources: &HeatmapResources,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    let (width, height) = clamp_bitmap_size(width, height);
    check_texture_size(width, height, device.limits().max_texture_dimension_2d)?;

    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("heatmap_bitmap_target"),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: resources.target_format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let bytes_per_pixel = 4u32;
    let unpadded_bpr = width * bytes_per_pixel;
    let padded_bpr = padded_bytes_per_row(width, bytes_per_pixel, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("heatmap_bitmap_staging"),
        size: (padded_bpr * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("heatmap_bitmap"),
    });
    {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("heatmap_bitmap_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        rpass.set_pipeline(&resources.pipeline);
        rpass.set_bind_group(0, &resources.bind_group, &[]);
        rpass.draw(0..6, 0..1);
    }
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
    );
    queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        let _ = tx.send(r);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .context("readback callback dropped")?
        .context("failed to map heatmap staging buffer")?;

    let mut pixels = {
        let mapped = slice.get_mapped_range();
        strip_row_padding(&mapped, unpadded_bpr as usize, padded_bpr as usize, height as usize)
    };
    staging.unmap();

    if is_bgra(resources.target_format) {
        swap_red_blue(&mut pixels);
    }
    RgbaImage::from_raw(width, height, pixels).context("readback size mismatch")
}

/// Dispositivo sin ventana, para exportar desde la línea de comandos.
pub fn headless_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter available")?;
        log::info!("headless adapter: {}", adapter.get_info().name);
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("scriptheat_headless"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                },
                None,
            )
            .await
            .context("failed to open GPU device")?;
        Ok((device, queue))
    })
}
