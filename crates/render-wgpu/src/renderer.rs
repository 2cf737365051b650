use crate::gpu::Gpu;
use crate::mesh::{
    self, CameraUniforms, FirefliesBlock, ObjectUniforms, ParticleInstance, PortalBlock, Vertex,
};
use crate::shaders;
use portal_common::{Color, ColorSpace, TextureImage};
use portal_render::{PerspectiveCamera, Renderer, Viewport};
use portal_scene::{
    Blending, Material, MaterialBank, MaterialId, NodeId, Scene, SceneObject, ShaderProgram,
};
use std::collections::BTreeMap;
use std::mem::size_of;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SAMPLE_COUNT: u32 = 4;

/// Uploaded buffers of one model mesh.
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
}

struct GpuParticles {
    instance_buffer: wgpu::Buffer,
    count: u32,
}

/// Multisampled color target and matching depth buffer, both at the
/// drawing-buffer size.
struct Attachments {
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    size: (u32, u32),
    /// Present when the drawing buffer is smaller than the surface.
    upscale: Option<UpscaleTarget>,
}

/// Resolved scene, sampled by the upscale pass onto the swapchain.
struct UpscaleTarget {
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// Drawing-buffer extent for a surface: never larger than the surface and
/// never zero.
fn buffer_extent(surface: (u32, u32), buffer: (u32, u32)) -> (u32, u32) {
    (
        buffer.0.clamp(1, surface.0.max(1)),
        buffer.1.clamp(1, surface.1.max(1)),
    )
}

/// Which opaque pipeline draws a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
enum MeshPass {
    Baked,
    Basic(Color),
    Portal,
}

fn mesh_pass(materials: &MaterialBank, id: MaterialId) -> Option<MeshPass> {
    match materials.get(id) {
        Material::Baked { .. } => Some(MeshPass::Baked),
        Material::Basic { color } => Some(MeshPass::Basic(*color)),
        Material::Shader(shader) if shader.program == ShaderProgram::Portal => {
            Some(MeshPass::Portal)
        }
        Material::Shader(_) => None,
    }
}

fn is_fireflies(materials: &MaterialBank, id: MaterialId) -> bool {
    matches!(
        materials.get(id),
        Material::Shader(shader) if shader.program == ShaderProgram::Fireflies
    )
}

fn blend_state(blending: Blending) -> wgpu::BlendState {
    match blending {
        Blending::Normal => wgpu::BlendState::REPLACE,
        Blending::Additive => {
            let add = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            wgpu::BlendState {
                color: add,
                alpha: add,
            }
        }
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    source: String,
    vertex_entry: &'a str,
    fragment_entry: &'a str,
    layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    blend: wgpu::BlendState,
    depth_write: bool,
    cull_mode: Option<wgpu::Face>,
}

fn create_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some(desc.vertex_entry),
            compilation_options: Default::default(),
            buffers: desc.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some(desc.fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: desc.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: SAMPLE_COUNT,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

/// Single-sampled pass with no depth that copies the drawing buffer onto
/// the swapchain with linear filtering.
fn create_upscale_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    texture_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("upscale_pipeline"),
        source: wgpu::ShaderSource::Wgsl(shaders::upscale().into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("upscale_pipeline"),
        bind_group_layouts: &[texture_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("upscale_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_upscale"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_upscale"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn uniform_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

/// wgpu renderer for the portal scene.
pub struct WgpuRenderer {
    gpu: Gpu,
    clear_color: Color,

    baked_pipeline: wgpu::RenderPipeline,
    basic_pipeline: wgpu::RenderPipeline,
    portal_pipeline: wgpu::RenderPipeline,
    fireflies_pipeline: wgpu::RenderPipeline,
    upscale_pipeline: wgpu::RenderPipeline,

    object_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    portal_buffer: wgpu::Buffer,
    portal_bind_group: wgpu::BindGroup,
    fireflies_buffer: wgpu::Buffer,
    fireflies_bind_group: wgpu::BindGroup,
    baked_bind_group: wgpu::BindGroup,
    /// Texture version currently bound; 0 is the white placeholder.
    baked_version: u64,

    meshes: BTreeMap<(NodeId, usize), GpuMesh>,
    particles: BTreeMap<NodeId, GpuParticles>,
    attachments: Attachments,
}

impl WgpuRenderer {
    pub fn new(gpu: Gpu) -> Self {
        let device = &gpu.device;
        let format = gpu.format();
        let all_stages = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        let camera_layout = uniform_layout(device, "camera_layout", all_stages);
        let object_layout = uniform_layout(device, "object_layout", all_stages);
        let material_layout = uniform_layout(device, "material_layout", all_stages);
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_layout"),
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

        let camera_buffer = uniform_buffer(device, "camera_buffer", size_of::<CameraUniforms>());
        let camera_bind_group =
            uniform_bind_group(device, "camera_bind_group", &camera_layout, &camera_buffer);
        let portal_buffer = uniform_buffer(device, "portal_buffer", size_of::<PortalBlock>());
        let portal_bind_group =
            uniform_bind_group(device, "portal_bind_group", &material_layout, &portal_buffer);
        let fireflies_buffer =
            uniform_buffer(device, "fireflies_buffer", size_of::<FirefliesBlock>());
        let fireflies_bind_group = uniform_bind_group(
            device,
            "fireflies_bind_group",
            &material_layout,
            &fireflies_buffer,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("baked_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let placeholder = TextureImage {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
            flip_y: false,
            color_space: ColorSpace::Srgb,
        };
        let baked_bind_group = Self::texture_bind_group(
            device,
            &gpu.queue,
            &texture_layout,
            &sampler,
            &placeholder,
        );

        let mesh_buffers = [wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
        }];
        let particle_buffers = [wgpu::VertexBufferLayout {
            array_stride: size_of::<ParticleInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32],
        }];

        let baked_pipeline = create_pipeline(
            device,
            format,
            PipelineDesc {
                label: "baked_pipeline",
                source: shaders::baked(),
                vertex_entry: "vs_mesh",
                fragment_entry: "fs_baked",
                layouts: &[&camera_layout, &object_layout, &texture_layout],
                buffers: &mesh_buffers,
                blend: blend_state(Blending::Normal),
                depth_write: true,
                cull_mode: Some(wgpu::Face::Back),
            },
        );
        let basic_pipeline = create_pipeline(
            device,
            format,
            PipelineDesc {
                label: "basic_pipeline",
                source: shaders::basic(),
                vertex_entry: "vs_mesh",
                fragment_entry: "fs_basic",
                layouts: &[&camera_layout, &object_layout],
                buffers: &mesh_buffers,
                blend: blend_state(Blending::Normal),
                depth_write: true,
                cull_mode: Some(wgpu::Face::Back),
            },
        );
        let portal_pipeline = create_pipeline(
            device,
            format,
            PipelineDesc {
                label: "portal_pipeline",
                source: shaders::portal(),
                vertex_entry: "vs_mesh",
                fragment_entry: "fs_portal",
                layouts: &[&camera_layout, &object_layout, &material_layout],
                buffers: &mesh_buffers,
                blend: blend_state(Blending::Normal),
                depth_write: true,
                cull_mode: Some(wgpu::Face::Back),
            },
        );
        let fireflies_pipeline = create_pipeline(
            device,
            format,
            PipelineDesc {
                label: "fireflies_pipeline",
                source: shaders::fireflies(),
                vertex_entry: "vs_fireflies",
                fragment_entry: "fs_fireflies",
                layouts: &[&camera_layout, &material_layout],
                buffers: &particle_buffers,
                blend: blend_state(Blending::Additive),
                depth_write: false,
                cull_mode: None,
            },
        );

        let upscale_pipeline = create_upscale_pipeline(device, format, &texture_layout);

        let size = gpu.size();
        let attachments =
            Self::create_attachments(device, format, size, size, &texture_layout, &sampler);

        Self {
            gpu,
            clear_color: Color::BLACK,
            baked_pipeline,
            basic_pipeline,
            portal_pipeline,
            fireflies_pipeline,
            upscale_pipeline,
            object_layout,
            texture_layout,
            sampler,
            camera_buffer,
            camera_bind_group,
            portal_buffer,
            portal_bind_group,
            fireflies_buffer,
            fireflies_bind_group,
            baked_bind_group,
            baked_version: 0,
            meshes: BTreeMap::new(),
            particles: BTreeMap::new(),
            attachments,
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    fn create_attachments(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        surface: (u32, u32),
        buffer: (u32, u32),
        texture_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
    ) -> Attachments {
        let (width, height) = buffer_extent(surface, buffer);
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let target = |label: &str, format: wgpu::TextureFormat| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: SAMPLE_COUNT,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&Default::default())
        };

        let upscale = ((width, height) != surface).then(|| {
            let view = device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("drawing_buffer"),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
                .create_view(&Default::default());
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("upscale_bind_group"),
                layout: texture_layout,
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
            UpscaleTarget { view, bind_group }
        });

        Attachments {
            color: target("msaa_color", format),
            depth: target("depth_texture", DEPTH_FORMAT),
            size: (width, height),
            upscale,
        }
    }

    fn texture_bind_group(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        image: &TextureImage,
    ) -> wgpu::BindGroup {
        let format = match image.color_space {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        };
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("baked_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.upload_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );
        let view = texture.create_view(&Default::default());

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("baked_bind_group"),
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
        })
    }

    /// Re-upload the baked texture when the material reports a new version.
    fn sync_baked_texture(&mut self, materials: &MaterialBank) {
        let Material::Baked {
            texture: Some(image),
            version,
        } = materials.get(materials.baked())
        else {
            return;
        };
        if *version == self.baked_version {
            return;
        }
        if image.width == 0 || image.height == 0 {
            tracing::warn!("ignoring empty baked texture");
            self.baked_version = *version;
            return;
        }
        self.baked_bind_group = Self::texture_bind_group(
            &self.gpu.device,
            &self.gpu.queue,
            &self.texture_layout,
            &self.sampler,
            image,
        );
        self.baked_version = *version;
        tracing::debug!(
            "uploaded baked texture {}x{} (version {})",
            image.width,
            image.height,
            version
        );
    }

    /// Create buffers for any scene node seen for the first time.
    fn upload_new_nodes(&mut self, scene: &Scene) {
        let device = &self.gpu.device;
        for (id, object) in scene.children() {
            match object {
                SceneObject::Model(model) => {
                    for (index, node) in model.meshes.iter().enumerate() {
                        if self.meshes.contains_key(&(id, index)) {
                            continue;
                        }
                        let Some(geometry) = &node.geometry else {
                            continue;
                        };
                        if geometry.index_count() == 0 {
                            continue;
                        }
                        let vertex_buffer =
                            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                                label: Some(node.name.as_str()),
                                contents: bytemuck::cast_slice(&mesh::vertices(geometry)),
                                usage: wgpu::BufferUsages::VERTEX,
                            });
                        let index_buffer =
                            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                                label: Some(node.name.as_str()),
                                contents: bytemuck::cast_slice(&geometry.indices),
                                usage: wgpu::BufferUsages::INDEX,
                            });
                        let object_buffer =
                            uniform_buffer(device, "object_buffer", size_of::<ObjectUniforms>());
                        let object_bind_group = uniform_bind_group(
                            device,
                            "object_bind_group",
                            &self.object_layout,
                            &object_buffer,
                        );
                        self.meshes.insert(
                            (id, index),
                            GpuMesh {
                                vertex_buffer,
                                index_buffer,
                                index_count: geometry.index_count() as u32,
                                object_buffer,
                                object_bind_group,
                            },
                        );
                        tracing::debug!("uploaded mesh {:?} of node {}", node.name, id.0);
                    }
                }
                SceneObject::Points(points) => {
                    if self.particles.contains_key(&id) || points.particles.is_empty() {
                        continue;
                    }
                    let instances = mesh::instances(&points.particles);
                    let instance_buffer =
                        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("particle_instances"),
                            contents: bytemuck::cast_slice(&instances),
                            usage: wgpu::BufferUsages::VERTEX,
                        });
                    self.particles.insert(
                        id,
                        GpuParticles {
                            instance_buffer,
                            count: instances.len() as u32,
                        },
                    );
                }
            }
        }
    }
}

impl Renderer for WgpuRenderer {
    type Frame = wgpu::TextureView;

    fn set_viewport(&mut self, viewport: Viewport) {
        self.gpu.resize(viewport.width, viewport.height);
        self.attachments = Self::create_attachments(
            &self.gpu.device,
            self.gpu.format(),
            self.gpu.size(),
            viewport.drawing_buffer_size(),
            &self.texture_layout,
            &self.sampler,
        );
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera, frame: &wgpu::TextureView) {
        self.sync_baked_texture(&scene.materials);
        self.upload_new_nodes(scene);

        let queue = &self.gpu.queue;
        let (width, height) = self.attachments.size;
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniforms::new(
                camera.view_matrix(),
                camera.projection_matrix(),
                width,
                height,
            )),
        );
        queue.write_buffer(
            &self.portal_buffer,
            0,
            bytemuck::bytes_of(&PortalBlock::from(&scene.params.portal)),
        );
        queue.write_buffer(
            &self.fireflies_buffer,
            0,
            bytemuck::bytes_of(&FirefliesBlock::from(&scene.params.fireflies)),
        );

        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for (id, object) in scene.children() {
            match object {
                SceneObject::Model(model) => {
                    for (index, node) in model.meshes.iter().enumerate() {
                        let Some(pass) = node.material.and_then(|m| mesh_pass(&scene.materials, m))
                        else {
                            continue;
                        };
                        let Some(gpu_mesh) = self.meshes.get(&(id, index)) else {
                            continue;
                        };
                        let color = match pass {
                            MeshPass::Basic(color) => color,
                            _ => Color::WHITE,
                        };
                        queue.write_buffer(
                            &gpu_mesh.object_buffer,
                            0,
                            bytemuck::bytes_of(&ObjectUniforms::new(node.transform, color)),
                        );
                        opaque.push((gpu_mesh, pass));
                    }
                }
                SceneObject::Points(points) => {
                    if !is_fireflies(&scene.materials, points.material) {
                        continue;
                    }
                    if let Some(particles) = self.particles.get(&id) {
                        transparent.push(particles);
                    }
                }
            }
        }

        let resolve_target = self
            .attachments
            .upscale
            .as_ref()
            .map_or(frame, |upscale| &upscale.view);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.attachments.color,
                    resolve_target: Some(resolve_target),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(mesh::clear_value(self.clear_color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.attachments.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for (gpu_mesh, kind) in &opaque {
                match kind {
                    MeshPass::Baked => {
                        pass.set_pipeline(&self.baked_pipeline);
                        pass.set_bind_group(2, &self.baked_bind_group, &[]);
                    }
                    MeshPass::Basic(_) => pass.set_pipeline(&self.basic_pipeline),
                    MeshPass::Portal => {
                        pass.set_pipeline(&self.portal_pipeline);
                        pass.set_bind_group(2, &self.portal_bind_group, &[]);
                    }
                }
                pass.set_bind_group(1, &gpu_mesh.object_bind_group, &[]);
                pass.set_vertex_buffer(0, gpu_mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(gpu_mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..gpu_mesh.index_count, 0, 0..1);
            }

            if !transparent.is_empty() {
                pass.set_pipeline(&self.fireflies_pipeline);
                pass.set_bind_group(1, &self.fireflies_bind_group, &[]);
                for particles in &transparent {
                    pass.set_vertex_buffer(0, particles.instance_buffer.slice(..));
                    pass.draw(0..6, 0..particles.count);
                }
            }
        }

        if let Some(upscale) = &self.attachments.upscale {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("upscale_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.upscale_pipeline);
            pass.set_bind_group(0, &upscale.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materials_select_their_pipelines() {
        let bank = MaterialBank::new();
        assert_eq!(mesh_pass(&bank, bank.baked()), Some(MeshPass::Baked));
        assert_eq!(mesh_pass(&bank, bank.portal()), Some(MeshPass::Portal));
        assert!(matches!(
            mesh_pass(&bank, bank.pole_light()),
            Some(MeshPass::Basic(_))
        ));
        // The fireflies program only draws point clouds.
        assert_eq!(mesh_pass(&bank, bank.fireflies()), None);
        assert!(is_fireflies(&bank, bank.fireflies()));
        assert!(!is_fireflies(&bank, bank.portal()));
    }

    #[test]
    fn drawing_buffer_never_exceeds_the_surface() {
        assert_eq!(buffer_extent((2560, 1440), (1707, 960)), (1707, 960));
        assert_eq!(buffer_extent((2560, 1440), (2560, 1440)), (2560, 1440));
        assert_eq!(buffer_extent((800, 600), (1600, 1200)), (800, 600));
        assert_eq!(buffer_extent((1, 1), (0, 0)), (1, 1));
    }

    #[test]
    fn additive_blending_adds_alpha_weighted_source() {
        let state = blend_state(Blending::Additive);
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(state.color.operation, wgpu::BlendOperation::Add);
        assert_eq!(blend_state(Blending::Normal), wgpu::BlendState::REPLACE);
    }
}
