//! Headless wgpu texture backend.
//!
//! Allocates real GPU textures and draws quads into an offscreen target, so
//! the harness exercises actual driver memory management without a window.
//! The driver-style surface is kept: handles are ids, uploads return
//! nothing, and errors are captured in wgpu error scopes and surfaced
//! through the sticky [`query_error`](super::TextureBackend::query_error).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::BackendError;
use crate::texture::mip_chain_len;

use super::{QuadCorners, TextureBackend, TextureHandle};

/// Edge length of the offscreen render target.
const TARGET_SIZE: u32 = 512;

const SHADER: &str = r#"
struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) pos: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = vec4<f32>(pos, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@group(0) @binding(0) var quad_texture: texture_2d<f32>;
@group(0) @binding(1) var quad_sampler: sampler;

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    return textureSample(quad_texture, quad_sampler, in.uv);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

/// GPU-side state for one handle. `None` until the level-0 upload arrives
/// with the base dimensions; only then can the texture be sized.
struct TextureEntry {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// wgpu-based texture backend.
pub struct WgpuBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    vertex_buffer: wgpu::Buffer,
    target_view: wgpu::TextureView,
    textures: Mutex<HashMap<u64, Option<TextureEntry>>>,
    next_handle: AtomicU64,
    pending_error: Mutex<Option<BackendError>>,
}

impl WgpuBackend {
    /// Create a new headless wgpu backend.
    pub fn new() -> Result<Self, BackendError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| BackendError(format!("no compatible GPU adapter: {e}")))?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("quad-thrasher device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| BackendError(format!("device creation failed: {e}")))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("quad bind group layout"),
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quad pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Clamped edges, trilinear minification: every mip level gets
        // sampled when quads shrink.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quad sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
            compare: None,
            anisotropy_clamp: 1,
            border_color: None,
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad vertices"),
            size: (std::mem::size_of::<QuadVertex>() * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen target"),
            size: wgpu::Extent3d {
                width: TARGET_SIZE,
                height: TARGET_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            pipeline,
            bind_group_layout,
            sampler,
            vertex_buffer,
            target_view,
            textures: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(0),
            pending_error: Mutex::new(None),
        })
    }

    fn flag_error(&self, message: String) {
        let mut pending = self
            .pending_error
            .lock()
            .expect("wgpu backend mutex poisoned");
        // Sticky: keep the first error until it is queried.
        if pending.is_none() {
            *pending = Some(BackendError(message));
        }
    }

    /// Run `work` inside validation and out-of-memory error scopes, folding
    /// any captured error into the sticky error state.
    fn with_error_scopes<R>(&self, work: impl FnOnce() -> R) -> R {
        self.device
            .push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = work();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(error) = validation.or(out_of_memory) {
            self.flag_error(error.to_string());
        }
        result
    }

    /// Create the GPU texture for a handle once its base dimensions are
    /// known from the level-0 upload.
    fn realize_texture(&self, handle: TextureHandle, width: u32, height: u32) -> TextureEntry {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("thrashed texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_chain_len(width, height),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        log::trace!(
            "WgpuBackend: realized handle {} as {width}x{height}",
            handle.0
        );
        TextureEntry {
            texture,
            bind_group,
        }
    }

    fn write_level(
        &self,
        entry: &TextureEntry,
        level: u32,
        origin: wgpu::Origin3d,
        width: u32,
        height: u32,
        texels: &[u8],
    ) {
        self.with_error_scopes(|| {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &entry.texture,
                    mip_level: level,
                    origin,
                    aspect: wgpu::TextureAspect::All,
                },
                texels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width * 4),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        });
    }
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .finish()
    }
}

impl TextureBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn create_handle(&self) -> Option<TextureHandle> {
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        self.textures
            .lock()
            .expect("wgpu backend mutex poisoned")
            .insert(id, None);
        Some(TextureHandle(id))
    }

    fn upload_level(
        &self,
        handle: TextureHandle,
        level: u32,
        width: u32,
        height: u32,
        texels: &[u8],
    ) {
        let mut textures = self.textures.lock().expect("wgpu backend mutex poisoned");
        let Some(slot) = textures.get_mut(&handle.0) else {
            self.flag_error(format!("upload to unknown handle {}", handle.0));
            return;
        };
        if slot.is_none() {
            if level != 0 {
                self.flag_error(format!(
                    "level {level} uploaded before level 0 on handle {}",
                    handle.0
                ));
                return;
            }
            *slot = Some(self.realize_texture(handle, width, height));
        }
        let Some(entry) = slot.as_ref() else {
            return;
        };
        self.write_level(entry, level, wgpu::Origin3d::ZERO, width, height, texels);
    }

    fn upload_region(
        &self,
        handle: TextureHandle,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        texels: &[u8],
    ) {
        let textures = self.textures.lock().expect("wgpu backend mutex poisoned");
        let Some(Some(entry)) = textures.get(&handle.0) else {
            self.flag_error(format!("region upload to unrealized handle {}", handle.0));
            return;
        };
        self.write_level(
            entry,
            level,
            wgpu::Origin3d { x, y, z: 0 },
            width,
            height,
            texels,
        );
    }

    fn query_error(&self) -> Result<(), BackendError> {
        match self
            .pending_error
            .lock()
            .expect("wgpu backend mutex poisoned")
            .take()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn draw_quad(&self, handle: TextureHandle, corners: QuadCorners) {
        let textures = self.textures.lock().expect("wgpu backend mutex poisoned");
        let Some(Some(entry)) = textures.get(&handle.0) else {
            self.flag_error(format!("draw of unrealized handle {}", handle.0));
            return;
        };

        let vertices = [
            QuadVertex {
                position: [corners.left, corners.bottom],
                uv: [0.0, 0.0],
            },
            QuadVertex {
                position: [corners.right, corners.bottom],
                uv: [1.0, 0.0],
            },
            QuadVertex {
                position: [corners.left, corners.top],
                uv: [0.0, 1.0],
            },
            QuadVertex {
                position: [corners.right, corners.top],
                uv: [1.0, 1.0],
            },
        ];
        self.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quad draw"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &entry.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(0..4, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn delete_handle(&self, handle: TextureHandle) {
        let removed = self
            .textures
            .lock()
            .expect("wgpu backend mutex poisoned")
            .remove(&handle.0);
        match removed {
            Some(entry) => {
                if let Some(entry) = entry {
                    // Free the memory now rather than when wgpu gets around
                    // to collecting the texture.
                    entry.texture.destroy();
                }
                log::trace!("WgpuBackend: deleted handle {}", handle.0);
            }
            None => log::error!("WgpuBackend: handle {} released twice", handle.0),
        }
    }

    fn finish_frame(&self) {
        let _ = self.device.poll(wgpu::PollType::Poll);
    }
}
