//! Depth render pass: pipeline, offscreen targets, render and readback.

use crate::core::camera::CameraError;
use crate::core::{depth, Camera, Geometry};
use crate::gpu::context::GpuContext;
use crate::gpu::types::{CameraUniform, VertexGPU};
use crate::gpu::{buffers, shaders, RenderError};
use wgpu::{BindGroup, Buffer, BufferUsages, RenderPipeline, Texture, TextureView};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Clear color carrying the far-plane sentinel: depth16 == 65535 encodes as
/// red = green = 1.0 under the wire format in `core::depth`.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 1.0,
    b: 0.0,
    a: 1.0,
};

struct GeometryBuffers {
    vertices: Buffer,
    indices: Buffer,
    index_count: u32,
}

/// Offscreen depth renderer for one capture run.
///
/// Owns the GPU context, the color/depth attachments (allocated once at the
/// run's fixed resolution) and a persistent staging buffer for readback.
/// Every camera rendered through it must match that resolution. One
/// render/readback pair is in flight at a time; there is no double
/// buffering.
pub struct DepthRenderer {
    ctx: GpuContext,
    pipeline: RenderPipeline,
    camera_buffer: Buffer,
    bind_group: BindGroup,
    color_texture: Texture,
    color_view: TextureView,
    // Held for its lifetime; only the view is used after creation.
    _depth_texture: Texture,
    depth_view: TextureView,
    staging: Buffer,
    geometry: Option<GeometryBuffers>,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
}

impl DepthRenderer {
    /// Create the pipeline and attachments for a fixed capture resolution.
    ///
    /// Multisampling stays off: depth values blended across samples would
    /// corrupt the quantized encoding.
    pub fn new(ctx: GpuContext, width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::Camera(CameraError::Resolution {
                width,
                height,
            }));
        }

        let shader = shaders::create_depth_shader(&ctx.device);

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Depth Bind Group Layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Depth Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Depth Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[VertexGPU::LAYOUT],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    // Depth must be captured regardless of triangle winding
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    ..Default::default()
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
            });

        let camera_buffer = buffers::create_buffer(
            &ctx.device,
            "Camera Uniform",
            std::mem::size_of::<CameraUniform>() as u64,
            BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        );

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Depth Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Color Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Buffer"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Texture rows must be copied out at 256-byte alignment
        let pad = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = (width * 4 + pad - 1) / pad * pad;

        let staging = buffers::create_buffer(
            &ctx.device,
            "Readback Staging",
            u64::from(padded_bytes_per_row) * u64::from(height),
            BufferUsages::COPY_DST | BufferUsages::MAP_READ,
        );

        Ok(Self {
            ctx,
            pipeline,
            camera_buffer,
            bind_group,
            color_texture,
            color_view,
            _depth_texture: depth_texture,
            depth_view,
            staging,
            geometry: None,
            width,
            height,
            padded_bytes_per_row,
        })
    }

    /// Upload mesh geometry once for the run.
    ///
    /// The mesh is read-only for the rest of the run; re-uploading replaces
    /// the previous buffers.
    pub fn upload_geometry(&mut self, geometry: &Geometry) {
        let vertices: Vec<VertexGPU> = geometry
            .positions()
            .iter()
            .map(|p| VertexGPU { position: *p })
            .collect();

        let vertex_buffer = buffers::create_buffer_init(
            &self.ctx.device,
            "Mesh Vertices",
            &vertices,
            BufferUsages::VERTEX,
        );
        let index_buffer = buffers::create_buffer_init(
            &self.ctx.device,
            "Mesh Indices",
            geometry.indices(),
            BufferUsages::INDEX,
        );

        self.geometry = Some(GeometryBuffers {
            vertices: vertex_buffer,
            indices: index_buffer,
            index_count: geometry.indices().len() as u32,
        });
    }

    /// Render the mesh's depth for one camera.
    ///
    /// Clears both attachments (color to the far sentinel, depth to 1.0) and
    /// draws with the camera's projection * view. The camera's resolution
    /// must match the run's fixed surface size.
    pub fn render(&mut self, camera: &Camera, near: f32, far: f32) -> Result<(), RenderError> {
        let geometry = self.geometry.as_ref().ok_or(RenderError::NoGeometry)?;
        if camera.width() != self.width || camera.height() != self.height {
            return Err(RenderError::ResolutionMismatch {
                surface_width: self.width,
                surface_height: self.height,
                camera_width: camera.width(),
                camera_height: camera.height(),
            });
        }

        let uniform = CameraUniform::new(camera, near, far)?;
        self.ctx
            .queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Depth Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Depth Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, geometry.vertices.slice(..));
            pass.set_index_buffer(geometry.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..geometry.index_count, 0, 0..1);
        }

        self.ctx.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    /// Copy the rendered color attachment into `out` (RGB, rows bottom-to-top).
    ///
    /// Must follow a completed `render` on this renderer; blocks until the
    /// GPU has flushed the frame. `out` must hold exactly
    /// `width * height * 3` bytes; alignment padding and the unused alpha
    /// channel are stripped.
    pub fn read_pixels(&mut self, out: &mut [u8]) -> Result<(), RenderError> {
        let expected = self.width as usize * self.height as usize * depth::BYTES_PER_PIXEL;
        if out.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: out.len(),
            });
        }

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(Some(encoder.finish()));

        buffers::map_for_read_blocking(&self.ctx.device, &self.staging)?;
        {
            let data = self.staging.slice(..).get_mapped_range();
            let tight_row = self.width as usize * 4;
            let out_row = self.width as usize * depth::BYTES_PER_PIXEL;
            for row in 0..self.height as usize {
                let src = &data[row * self.padded_bytes_per_row as usize..][..tight_row];
                let dst = &mut out[row * out_row..][..out_row];
                for (src_px, dst_px) in src.chunks_exact(4).zip(dst.chunks_exact_mut(3)) {
                    dst_px.copy_from_slice(&src_px[..3]);
                }
            }
        }
        self.staging.unmap();
        Ok(())
    }

    /// The fixed surface resolution of this run.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
