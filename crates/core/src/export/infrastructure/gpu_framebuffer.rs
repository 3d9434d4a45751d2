use std::sync::mpsc;

use crate::export::domain::frame_source::{ensure_size, FrameSource};
use crate::shared::constants::BYTES_PER_PIXEL;
use crate::shared::export_error::ExportError;
use crate::shared::frame::Frame;
use crate::shared::rect_size::RectSize;

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Packed params matching the WGSL uniform layout (16 bytes).
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    time: f32,
    _pad: [f32; 3],
}

/// Offscreen wgpu render target holding the plasma scene.
///
/// The texture is created with `COPY_SRC` so [`FrameSource::read_pixels`] can
/// copy it into a mappable staging buffer.
pub struct GpuFramebuffer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    uniform_buf: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture: wgpu::Texture,
    size: RectSize,
}

impl GpuFramebuffer {
    /// Fails with [`ExportError::NoAdapter`] if no suitable adapter is available.
    pub fn new(size: RectSize) -> Result<Self, ExportError> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(ExportError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("export-device"),
                required_features: wgpu::Features::empty(),
                // Exports may exceed the downlevel texture limit, so take what the adapter offers.
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|_| ExportError::NoAdapter)?;

        log::info!("GPU framebuffer on {}", adapter.get_info().name);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("plasma-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/plasma.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene-uniform"),
            size: std::mem::size_of::<SceneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-bind-group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            }],
        });

        check_texture_limit(&device, size)?;
        let texture = create_target(&device, size);

        Ok(Self {
            device,
            queue,
            pipeline,
            uniform_buf,
            bind_group,
            texture,
            size,
        })
    }

    /// Recreates the render target at `size`. No-op if unchanged.
    pub fn resize(&mut self, size: RectSize) -> Result<(), ExportError> {
        if size == self.size {
            return Ok(());
        }
        check_texture_limit(&self.device, size)?;
        self.texture = create_target(&self.device, size);
        self.size = size;
        Ok(())
    }

    /// Draws the scene at `time` seconds into the render target.
    pub fn render(&mut self, time: f64) {
        let uniform = SceneUniform {
            time: time as f32,
            _pad: [0.0; 3],
        };
        self.queue
            .write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(&uniform));

        let view = self
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
    }
}

impl FrameSource for GpuFramebuffer {
    fn size(&self) -> RectSize {
        self.size
    }

    fn read_pixels(&mut self, size: RectSize) -> Result<Frame, ExportError> {
        ensure_size(size, self.size)?;

        let unpadded_bytes_per_row = size.width() * BYTES_PER_PIXEL;
        let padded_bytes_per_row = padded_row_bytes(size.width());
        let buf_size = padded_bytes_per_row as u64 * size.height() as u64;

        let staging_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback-staging"),
            size: buf_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback-encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging_buf,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(size.height()),
                },
            },
            extent(size),
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = staging_buf.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| ExportError::Readback(e.to_string()))?
            .map_err(|e| ExportError::Readback(e.to_string()))?;

        let mapped = slice.get_mapped_range();
        let data = strip_row_padding(
            &mapped,
            unpadded_bytes_per_row as usize,
            padded_bytes_per_row as usize,
            size.height() as usize,
        );
        drop(mapped);
        staging_buf.unmap();

        Ok(Frame::new(data, size))
    }
}

/// Row pitch rounded up to `COPY_BYTES_PER_ROW_ALIGNMENT`.
fn padded_row_bytes(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * BYTES_PER_PIXEL).div_ceil(align) * align
}

fn strip_row_padding(padded: &[u8], row_bytes: usize, padded_row_bytes: usize, rows: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let start = row * padded_row_bytes;
        pixels.extend_from_slice(&padded[start..start + row_bytes]);
    }
    pixels
}

fn check_texture_limit(device: &wgpu::Device, size: RectSize) -> Result<(), ExportError> {
    let max = device.limits().max_texture_dimension_2d;
    if size.width() > max || size.height() > max {
        return Err(ExportError::InvalidSize {
            width: size.width(),
            height: size.height(),
        });
    }
    Ok(())
}

fn extent(size: RectSize) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width(),
        height: size.height(),
        depth_or_array_layers: 1,
    }
}

fn create_target(device: &wgpu::Device, size: RectSize) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("export-target"),
        size: extent(size),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::infrastructure::cpu_framebuffer::CpuFramebuffer;
    use crate::scene::domain::scene::Scene;
    use crate::scene::infrastructure::plasma_scene::PlasmaScene;

    #[test]
    fn test_padded_row_bytes_aligns_to_256() {
        assert_eq!(padded_row_bytes(64), 256);
        assert_eq!(padded_row_bytes(65), 512);
        assert_eq!(padded_row_bytes(1), 256);
        assert_eq!(padded_row_bytes(1920), 7680);
    }

    #[test]
    fn test_strip_row_padding_keeps_pixels_only() {
        // Two rows of 3 bytes padded to 5
        let padded = [1, 2, 3, 0, 0, 4, 5, 6, 0, 0];
        assert_eq!(strip_row_padding(&padded, 3, 5, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_readback_matches_cpu_scene() {
        // May fail on systems without GPU, which is acceptable for unit tests
        let size = RectSize::new(70, 33).unwrap();
        let Ok(mut gpu) = GpuFramebuffer::new(size) else {
            return;
        };
        gpu.render(1.5);
        let frame = gpu.read_pixels(size).unwrap();
        assert_eq!(frame.size(), size);

        let mut cpu = CpuFramebuffer::new(size);
        PlasmaScene::new().render(1.5, cpu.frame_mut());
        let expected = cpu.read_pixels(size).unwrap();

        let max_diff = frame
            .data()
            .iter()
            .zip(expected.data())
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap();
        assert!(max_diff <= 8, "GPU and CPU scenes diverge by {max_diff}");
    }

    #[test]
    fn test_readback_wrong_size_fails() {
        let size = RectSize::new(16, 16).unwrap();
        let Ok(mut gpu) = GpuFramebuffer::new(size) else {
            return;
        };
        let err = gpu.read_pixels(RectSize::new(8, 8).unwrap()).unwrap_err();
        assert!(matches!(err, ExportError::SizeMismatch { .. }));
    }
}
