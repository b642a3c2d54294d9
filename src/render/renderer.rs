//! Forward renderer for the viewer scene
//!
//! Draws every visible mesh node with its material's base color, tinted by
//! the base-color map when present. Opaque meshes go first, then blended
//! meshes back to front with depth writes off.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::raycast::Rect;
use crate::scene::{Color, ColorSpace, MeshGeometry, NodeId, PerspectiveCamera, Scene, TextureRef};
use crate::shaders::{self, ShaderWatcher, VIEWER_SHADER};
use crate::viewer::RenderSurface;

use super::gpu_context::GpuContext;
use super::vertex::MeshVertex;
use super::RenderError;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Clear color when the scene has no background
const DEFAULT_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.15,
    a: 1.0,
};

/// Ambient light when there is no environment map
const DEFAULT_AMBIENT: f32 = 0.15;

/// Per-frame uniform buffer data
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    light_pos: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
    params: [f32; 4],
}

/// Per-draw uniform buffer data
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    base_color: [f32; 4],
    material: [f32; 4],
}

struct GpuMesh {
    /// Keeps the geometry alive so its address can't be reused as a key
    _geometry: Arc<MeshGeometry>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct DrawSlot {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Base-color map the bind group was built with
    map: Option<TextureRef>,
}

struct Pipelines {
    opaque: wgpu::RenderPipeline,
    blended: wgpu::RenderPipeline,
}

/// One frame's draw list entry
struct Draw {
    node: NodeId,
    mesh_key: usize,
    depth: f32,
}

/// Render surface backed by a winit window
pub struct WgpuSurface {
    /// Kept alive for the surface's lifetime
    _window: Arc<Window>,
    gpu: GpuContext,
    surface: Option<wgpu::Surface<'static>>,
    config: wgpu::SurfaceConfiguration,

    frame_layout: wgpu::BindGroupLayout,
    draw_layout: wgpu::BindGroupLayout,
    pipelines: Pipelines,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    depth_view: wgpu::TextureView,

    meshes: HashMap<usize, GpuMesh>,
    textures: HashMap<TextureRef, Option<GpuTexture>>,
    draws: HashMap<NodeId, DrawSlot>,

    exposure: f32,
    /// Average environment radiance, keyed by environment address
    ambient: Option<(usize, Color)>,
    watcher: Option<ShaderWatcher>,
}

impl WgpuSurface {
    /// Open the GPU for `window` and build the pipelines
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let (gpu, surface) = GpuContext::new(window.clone()).await?;
        let config = gpu.surface_config(&surface, size.width, size.height);
        surface.configure(&gpu.device, &config);

        let device = &gpu.device;

        // Group 0: frame uniforms
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Viewer Frame Layout"),
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

        // Group 1: [0] draw uniforms, [1] base-color map, [2] sampler
        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Viewer Draw Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
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

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Viewer Shader"),
            source: wgpu::ShaderSource::Wgsl(VIEWER_SHADER.into()),
        });
        let pipelines = build_pipelines(device, &shader, &frame_layout, &draw_layout, config.format);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Viewer Frame Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Viewer Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Viewer Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = upload_rgba(
            device,
            &gpu.queue,
            "Viewer White Texture",
            &[255, 255, 255, 255],
            1,
            1,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let depth_view = create_depth_view(device, config.width, config.height);

        // Hot-reload only makes sense from a source checkout
        let watcher = if cfg!(debug_assertions) {
            ShaderWatcher::new(&shaders::shaders_dir())
                .map_err(|e| tracing::warn!("Shader hot-reload unavailable: {}", e))
                .ok()
        } else {
            None
        };

        Ok(Self {
            _window: window,
            gpu,
            surface: Some(surface),
            config,
            frame_layout,
            draw_layout,
            pipelines,
            frame_buffer,
            frame_bind_group,
            sampler,
            white,
            depth_view,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            draws: HashMap::new(),
            exposure: 1.0,
            ambient: None,
            watcher,
        })
    }

    /// Set tone-mapping exposure
    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.set_exposure(exposure);
        self
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        if exposure.is_finite() && exposure > 0.0 {
            self.exposure = exposure;
        }
    }

    /// Get current exposure
    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Rebuild pipelines when the shader source changed on disk
    fn poll_shader_reload(&mut self) {
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        if watcher.poll().is_none() {
            return;
        }
        let source = match shaders::load_viewer_shader() {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Failed to read viewer shader: {}", e);
                return;
            }
        };

        let device = &self.gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Viewer Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipelines = build_pipelines(
            device,
            &shader,
            &self.frame_layout,
            &self.draw_layout,
            self.config.format,
        );
        match pollster::block_on(device.pop_error_scope()) {
            Some(e) => tracing::warn!("Shader reload rejected: {}", e),
            None => {
                self.pipelines = pipelines;
                tracing::info!("Viewer shader reloaded");
            }
        }
    }

    /// Upload a geometry once; returns its cache key
    fn ensure_mesh(&mut self, geometry: &Arc<MeshGeometry>) -> usize {
        let key = Arc::as_ptr(geometry) as usize;
        let device = &self.gpu.device;
        self.meshes.entry(key).or_insert_with(|| {
            let vertices = MeshVertex::interleave(geometry);
            GpuMesh {
                _geometry: geometry.clone(),
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Viewer Vertex Buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Viewer Index Buffer"),
                    contents: bytemuck::cast_slice(&geometry.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: geometry.indices.len() as u32,
            }
        });
        key
    }

    /// Decode and upload a texture the first time it is referenced
    ///
    /// Returns whether a usable texture is cached.
    fn ensure_texture(&mut self, map: &TextureRef) -> bool {
        if let Some(cached) = self.textures.get(map) {
            return cached.is_some();
        }
        let loaded = match image::open(&map.path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let format = match map.color_space {
                    ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
                    ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
                };
                tracing::debug!("Uploaded texture {}", map.path.display());
                Some(upload_rgba(
                    &self.gpu.device,
                    &self.gpu.queue,
                    "Viewer Material Texture",
                    rgba.as_raw(),
                    rgba.width(),
                    rgba.height(),
                    format,
                ))
            }
            Err(e) => {
                tracing::warn!("Failed to load texture {}: {}", map.path.display(), e);
                None
            }
        };
        let ok = loaded.is_some();
        self.textures.insert(map.clone(), loaded);
        ok
    }

    /// Write a node's draw uniforms, rebuilding its bind group when the map changed
    fn prepare_draw(&mut self, node: NodeId, uniforms: &DrawUniforms, map: Option<&TextureRef>) {
        let map = map.filter(|m| self.ensure_texture(m)).cloned();

        let stale = self.draws.get(&node).map_or(true, |slot| slot.map != map);
        if stale {
            let device = &self.gpu.device;
            let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Viewer Draw Buffer"),
                size: std::mem::size_of::<DrawUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let view = map
                .as_ref()
                .and_then(|m| self.textures.get(m))
                .and_then(|t| t.as_ref())
                .map(|t| &t.view)
                .unwrap_or(&self.white.view);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Viewer Draw Bind Group"),
                layout: &self.draw_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            self.draws.insert(
                node,
                DrawSlot {
                    uniform_buffer,
                    bind_group,
                    map,
                },
            );
        }

        if let Some(slot) = self.draws.get(&node) {
            self.gpu
                .queue
                .write_buffer(&slot.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
        }
    }

    fn frame_uniforms(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> FrameUniforms {
        let (light_pos, light_color) = scene
            .lights
            .first()
            .map(|l| {
                let c = l.color.to_array();
                (l.position, [c[0] * l.intensity, c[1] * l.intensity, c[2] * l.intensity])
            })
            .unwrap_or((Vec3::ZERO, [0.0; 3]));
        let ambient = match scene.environment.as_ref() {
            Some(env) => {
                let key = Arc::as_ptr(env) as usize;
                match self.ambient {
                    Some((cached, color)) if cached == key => color,
                    _ => {
                        let color = env.average_radiance();
                        self.ambient = Some((key, color));
                        color
                    }
                }
            }
            None => Color::rgb(DEFAULT_AMBIENT, DEFAULT_AMBIENT, DEFAULT_AMBIENT),
        };

        FrameUniforms {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            light_pos: light_pos.extend(1.0).to_array(),
            light_color: [light_color[0], light_color[1], light_color[2], 1.0],
            ambient: [ambient.r, ambient.g, ambient.b, 1.0],
            params: [self.exposure, 0.0, 0.0, 0.0],
        }
    }

    /// Build opaque and blended draw lists for this frame
    fn collect_draws(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> (Vec<Draw>, Vec<Draw>) {
        let view = camera.view_matrix();
        let mut opaque = Vec::new();
        let mut blended = Vec::new();

        let nodes: Vec<NodeId> = scene.graph.mesh_nodes().map(|(id, _)| id).collect();
        for node in nodes {
            if !scene.graph.is_visible(node) {
                continue;
            }
            let Some(mesh) = scene.graph.node(node).and_then(|n| n.mesh()) else {
                continue;
            };
            let world: Mat4 = scene.graph.world_matrix(node);
            let material = mesh.material();
            let uniforms = DrawUniforms {
                model: world.to_cols_array_2d(),
                base_color: [material.color.r, material.color.g, material.color.b, material.opacity],
                material: [
                    material.roughness,
                    material.metalness,
                    if material.map.is_some() { 1.0 } else { 0.0 },
                    0.0,
                ],
            };
            let mesh_key = self.ensure_mesh(mesh.geometry());
            self.prepare_draw(node, &uniforms, material.map.as_ref());

            // View-space z is negative in front of the camera
            let depth = -view.transform_point3(world.w_axis.truncate()).z;
            let draw = Draw {
                node,
                mesh_key,
                depth,
            };
            if material.transparent || material.needs_blending() {
                blended.push(draw);
            } else {
                opaque.push(draw);
            }
        }
        blended.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        (opaque, blended)
    }
}

impl RenderSurface for WgpuSurface {
    fn bounds(&self) -> Rect {
        Rect::sized(self.config.width as f32, self.config.height as f32)
    }

    fn set_size(&mut self, width: u32, height: u32) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        surface.configure(&self.gpu.device, &self.config);
        self.depth_view = create_depth_view(&self.gpu.device, width, height);
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        if self.surface.is_none() {
            return;
        }
        self.poll_shader_reload();

        let frame = self.frame_uniforms(scene, camera);
        self.gpu
            .queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));
        let (opaque, blended) = self.collect_draws(scene, camera);

        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let surface_texture = match surface.get_current_texture() {
            Ok(tex) => tex,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(&self.gpu.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to get window surface: {:?}", e);
                return;
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let clear = scene
            .background
            .map(|c| wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: 1.0,
            })
            .unwrap_or(DEFAULT_CLEAR);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Viewer Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewer Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for (pipeline, draws) in [(&self.pipelines.opaque, &opaque), (&self.pipelines.blended, &blended)] {
                render_pass.set_pipeline(pipeline);
                for draw in draws {
                    let (Some(mesh), Some(slot)) = (self.meshes.get(&draw.mesh_key), self.draws.get(&draw.node))
                    else {
                        continue;
                    };
                    render_pass.set_bind_group(1, &slot.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    fn dispose(&mut self) {
        if self.surface.take().is_some() {
            self.draws.clear();
            self.meshes.clear();
            self.textures.clear();
            self.ambient = None;
            self.watcher = None;
            tracing::info!("Render surface disposed");
        }
    }
}

fn build_pipelines(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    frame_layout: &wgpu::BindGroupLayout,
    draw_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> Pipelines {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Viewer Pipeline Layout"),
        bind_group_layouts: &[frame_layout, draw_layout],
        push_constant_ranges: &[],
    });

    let build = |label: &str, blend: wgpu::BlendState, depth_write: bool| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::buffer_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Shader flips normals on back faces, so both sides shade
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_write,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    };

    Pipelines {
        opaque: build("Viewer Opaque Pipeline", wgpu::BlendState::REPLACE, true),
        blended: build("Viewer Blended Pipeline", wgpu::BlendState::ALPHA_BLENDING, false),
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Viewer Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    data: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        _texture: texture,
        view,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 96);
    }
}
