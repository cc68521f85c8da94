use bytemuck::{Pod, Zeroable};
use tracing::debug;
use wgpu::util::DeviceExt;

use crate::carousel::CardItem;
use crate::carousel::geometry::{Mat4, mat_mul, model_matrix};
use crate::config::MeshOptions;
use crate::texture::CardTexture;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PlaneVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl PlaneVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PlaneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Unit plane centred on the origin, subdivided so the vertex ripple has
/// something to bend. `v` runs top to bottom to match bitmap rows.
pub fn build_plane(width_segments: u32, height_segments: u32) -> (Vec<PlaneVertex>, Vec<u32>) {
    let ws = width_segments.max(1);
    let hs = height_segments.max(1);
    let mut vertices = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);
    for j in 0..=hs {
        let v = j as f32 / hs as f32;
        for i in 0..=ws {
            let u = i as f32 / ws as f32;
            vertices.push(PlaneVertex {
                position: [u - 0.5, 0.5 - v, 0.0],
                uv: [u, v],
            });
        }
    }
    let row = ws + 1;
    let mut indices = Vec::with_capacity((ws * hs * 6) as usize);
    for j in 0..hs {
        for i in 0..ws {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
    (vertices, indices)
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CardUniform {
    mvp: Mat4,
    time: f32,
    speed: f32,
    border_radius: f32,
    _pad: f32,
}

struct CardGpu {
    texture: wgpu::Texture,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// GPU side of the track: one shared plane mesh and, per card, its texture,
/// uniform buffer and bind group.
pub struct CardRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    cards: Vec<CardGpu>,
}

impl CardRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        mesh: &MeshOptions,
        items: &[CardItem],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("card-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/card.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("card-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("card-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("card-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[PlaneVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (vertices, indices) = build_plane(mesh.width_segments, mesh.height_segments);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("card-plane-vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("card-plane-indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("card-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let cards = items
            .iter()
            .map(|item| {
                let texture = upload_texture(device, queue, &item.texture);
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                let uniform = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("card-uniform"),
                    size: std::mem::size_of::<CardUniform>() as wgpu::BufferAddress,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("card-bind-group"),
                    layout: &bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniform.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                });
                CardGpu {
                    texture,
                    uniform,
                    bind_group,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            cards = cards.len(),
            vertices = vertices.len(),
            "card renderer ready"
        );

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            cards,
        }
    }

    /// Writes this frame's transform and animation uniforms for every card.
    pub fn update(
        &self,
        queue: &wgpu::Queue,
        items: &[CardItem],
        view_proj: &Mat4,
        border_radius: f32,
    ) {
        for (gpu, item) in self.cards.iter().zip(items) {
            let model = model_matrix(
                item.x,
                item.y,
                item.rotation,
                item.plane_width,
                item.plane_height,
            );
            let uniform = CardUniform {
                mvp: mat_mul(view_proj, &model),
                time: item.time,
                speed: item.shader_speed(),
                border_radius,
                _pad: 0.0,
            };
            queue.write_buffer(&gpu.uniform, 0, bytemuck::bytes_of(&uniform));
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for card in &self.cards {
            pass.set_bind_group(0, &card.bind_group, &[]);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }

    /// Frees every texture and buffer this renderer owns.
    pub fn release(self) {
        let count = self.cards.len();
        for card in self.cards {
            card.texture.destroy();
            card.uniform.destroy();
        }
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        debug!(cards = count, "card GPU resources released");
    }
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, card: &CardTexture) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: card.width(),
        height: card.height(),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("card-texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        texture.as_image_copy(),
        card.pixels(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * card.width()),
            rows_per_image: Some(card.height()),
        },
        size,
    );
    texture
}
