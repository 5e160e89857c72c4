//! Estado GPU para dibujar el heatmap: pipeline, textura de velocidades y rampa de color.
//!
//! Se crea una vez por dispositivo y se entrega a quien dibuja (los callback
//! resources de egui en el visor, el llamador en la exportación headless).

use super::types::HeatmapUniforms;
use crate::heatmap::raster::sample_speed;
use crate::heatmap::{Gradient, RampMode, MAX_BITMAP_RESOLUTION};

pub const HEATMAP_WGSL: &str = include_str!("../shaders/heatmap.wgsl");

pub struct HeatmapResources {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    pub uniform_buffer: wgpu::Buffer,
    pub target_format: wgpu::TextureFormat,

    pub speed_texture: wgpu::Texture,
    pub speed_len: u32,
    pub ramp_texture: wgpu::Texture,
    pub ramp_len: u32,
    pub ramp_mode: RampMode,

    /// Versiones del último array de velocidades y rampa subidos por un paint callback.
    pub speeds_version: u64,
    pub gradient_version: u64,
}

impl HeatmapResources {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
        gradient: &Gradient,
        resolution: usize,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("heatmap_shader"),
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(HEATMAP_WGSL)),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("heatmap_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("heatmap_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("heatmap_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("heatmap_uniforms"),
            size: std::mem::size_of::<HeatmapUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let speed_len = clamp_texture_len(resolution, device.limits().max_texture_dimension_2d);
        let speed_texture = create_row_texture(device, "heatmap_speed", wgpu::TextureFormat::R32Float, speed_len);
        let ramp_texels = ramp_texels(gradient);
        let ramp_len = ramp_texels.len() as u32;
        let ramp_texture = create_row_texture(device, "heatmap_ramp", wgpu::TextureFormat::Rgba8Unorm, ramp_len);
        write_row(queue, &ramp_texture, bytemuck::cast_slice(&ramp_texels), ramp_len, 4);

        let bind_group = create_bind_group(device, &bind_group_layout, &uniform_buffer, &speed_texture, &ramp_texture);

        let resources = Self {
            pipeline,
            bind_group_layout,
            bind_group,
            uniform_buffer,
            target_format,
            speed_texture,
            speed_len,
            ramp_texture,
            ramp_len,
            ramp_mode: gradient.mode(),
            speeds_version: 0,
            gradient_version: 0,
        };
        resources.update_speeds_in_place(queue, &[]);
        resources.write_uniforms(queue);
        log::info!(
            "heatmap pipeline ready ({:?}, {} buckets, {} ramp colors)",
            target_format,
            speed_len,
            ramp_len
        );
        resources
    }

    /// Sube un nuevo array de velocidades; la textura se recrea si cambia su longitud.
    /// Arrays más largos que el límite del dispositivo se remuestrean a ese límite.
    pub fn update_speeds(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, speeds: &[f32]) {
        let len = clamp_texture_len(speeds.len(), device.limits().max_texture_dimension_2d);
        if len != self.speed_len {
            self.speed_texture = create_row_texture(device, "heatmap_speed", wgpu::TextureFormat::R32Float, len);
            self.speed_len = len;
            self.rebuild_bind_group(device);
            self.write_uniforms(queue);
        }
        self.update_speeds_in_place(queue, speeds);
    }

    /// Cambia la rampa de color.
    pub fn set_gradient(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, gradient: &Gradient) {
        let texels = ramp_texels(gradient);
        let len = texels.len() as u32;
        if len != self.ramp_len {
            self.ramp_texture = create_row_texture(device, "heatmap_ramp", wgpu::TextureFormat::Rgba8Unorm, len);
            self.ramp_len = len;
            self.rebuild_bind_group(device);
        }
        write_row(queue, &self.ramp_texture, bytemuck::cast_slice(&texels), len, 4);
        self.ramp_mode = gradient.mode();
        self.write_uniforms(queue);
    }

    fn update_speeds_in_place(&self, queue: &wgpu::Queue, speeds: &[f32]) {
        let row = fit_row(speeds, self.speed_len as usize);
        write_row(queue, &self.speed_texture, bytemuck::cast_slice(&row), self.speed_len, 4);
    }

    fn write_uniforms(&self, queue: &wgpu::Queue) {
        let uniforms = HeatmapUniforms::new(
            self.speed_len,
            self.ramp_len,
            self.ramp_mode == RampMode::Smooth,
            self.target_format.is_srgb(),
        );
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    fn rebuild_bind_group(&mut self, device: &wgpu::Device) {
        self.bind_group = create_bind_group(
            device,
            &self.bind_group_layout,
            &self.uniform_buffer,
            &self.speed_texture,
            &self.ramp_texture,
        );
    }
}

fn clamp_texture_len(len: usize, max_dim: u32) -> u32 {
    let max = max_dim.clamp(1, MAX_BITMAP_RESOLUTION) as usize;
    len.clamp(1, max) as u32
}

/// Ajusta `speeds` a `len` texels: relleno con ceros si es más corto,
/// remuestreo lineal si es más largo.
fn fit_row(speeds: &[f32], len: usize) -> Vec<f32> {
    if speeds.len() <= len {
        let mut row = vec![0.0f32; len];
        row[..speeds.len()].copy_from_slice(speeds);
        return row;
    }
    (0..len)
        .map(|i| sample_speed(speeds, (i as f32 + 0.5) / len as f32))
        .collect()
}

/// El shader interpola entre vecinos, así que necesita al menos dos texels.
fn ramp_texels(gradient: &Gradient) -> Vec<[u8; 4]> {
    let mut texels = gradient.to_rgba8_table();
    match texels.len() {
        0 => vec![[0, 0, 0, 255]; 2],
        1 => {
            texels.push(texels[0]);
            texels
        }
        _ => texels,
    }
}

fn create_row_texture(device: &wgpu::Device, label: &str, format: wgpu::TextureFormat, width: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width, height: 1, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write_row(queue: &wgpu::Queue, texture: &wgpu::Texture, bytes: &[u8], width: u32, bytes_per_texel: u32) {
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytes,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(width * bytes_per_texel),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d { width, height: 1, depth_or_array_layers: 1 },
    );
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    speed_texture: &wgpu::Texture,
    ramp_texture: &wgpu::Texture,
) -> wgpu::BindGroup {
    let speed_view = speed_texture.create_view(&wgpu::TextureViewDescriptor::default());
    let ramp_view = ramp_texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("heatmap_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: uniform_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&speed_view) },
            wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&ramp_view) },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_always_has_two_texels() {
        assert_eq!(ramp_texels(&Gradient::new(RampMode::Linear)).len(), 2);
        let mut single = Gradient::new(RampMode::Linear);
        single.add_mark(0.5, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(ramp_texels(&single), vec![[255, 0, 0, 255]; 2]);
        assert_eq!(ramp_texels(&Gradient::heat_strip()).len(), 41);
    }

    #[test]
    fn texture_length_is_bounded() {
        assert_eq!(clamp_texture_len(0, 8192), 1);
        assert_eq!(clamp_texture_len(2048, 8192), 2048);
        assert_eq!(clamp_texture_len(100_000, 16384), MAX_BITMAP_RESOLUTION);
        // a downlevel device caps the speed texture below the settings maximum
        assert_eq!(clamp_texture_len(4096, 2048), 2048);
    }

    #[test]
    fn short_rows_are_zero_padded() {
        assert_eq!(fit_row(&[0.5, 1.0], 4), vec![0.5, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn long_rows_are_resampled_to_the_texture() {
        let speeds = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(fit_row(&speeds, 2), vec![0.0, 1.0]);
        let row = fit_row(&[0.25; 4096], 2048);
        assert_eq!(row.len(), 2048);
        assert!(row.iter().all(|&v| (v - 0.25).abs() < 1e-6));
    }

    #[test]
    fn shader_declares_entry_points() {
        assert!(HEATMAP_WGSL.contains("fn vs_main"));
        assert!(HEATMAP_WGSL.contains("fn fs_main"));
    }
}
