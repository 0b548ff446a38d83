use crate::constants::{CLEAR_COLOR, INITIAL_EDGE_CAPACITY, INITIAL_SPRITE_CAPACITY, SPRITE_VERTS};
use cosmos_core::error::{CosmosError, Result};
use cosmos_core::scene::{
    wireframe_sphere, LineVertex, RenderBackend, SceneConfig, SceneFrame, SceneUniforms,
    SpriteInstance,
};
use std::mem::size_of;
use web_sys as web;

mod helpers;
use helpers::DynamicBuffer;

const LINE_ATTRS: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32];
const SPRITE_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x4];

fn line_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: size_of::<LineVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &LINE_ATTRS,
    }
}

fn sprite_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: size_of::<SpriteInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &SPRITE_ATTRS,
    }
}

struct GpuResources {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    line_pipeline: wgpu::RenderPipeline,
    sprite_pipeline: wgpu::RenderPipeline,
    globe: wgpu::Buffer,
    globe_vertices: u32,
    edges: DynamicBuffer,
    sprites: DynamicBuffer,
}

/// WebGPU backend for the globe scene: one line pipeline for the wireframe
/// and constellation edges, one instanced sprite pipeline for stars and glows.
pub struct GpuState {
    gpu: Option<GpuResources>,
}

impl GpuState {
    pub async fn new(canvas: &web::HtmlCanvasElement, scene: &SceneConfig) -> anyhow::Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: Some("cosmos_device"),
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        // The canvas sits over page content, so keep its background transparent.
        let alpha_mode = caps
            .alpha_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::CompositeAlphaMode::PreMultiplied)
            .or_else(|| caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(cosmos_core::SCENE_WGSL.into()),
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniforms"),
            size: size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pl"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });
        let line_pipeline = helpers::make_pipeline(
            &device,
            "line_pipeline",
            &layout,
            &shader,
            ("vs_line", "fs_line"),
            &[line_layout()],
            wgpu::PrimitiveTopology::LineList,
            format,
        );
        let sprite_pipeline = helpers::make_pipeline(
            &device,
            "sprite_pipeline",
            &layout,
            &shader,
            ("vs_sprite", "fs_sprite"),
            &[sprite_layout()],
            wgpu::PrimitiveTopology::TriangleList,
            format,
        );

        let globe_lines = wireframe_sphere(scene.globe_radius, scene.globe_segments);
        let globe =
            helpers::static_vertex_buffer(&device, "globe", bytemuck::cast_slice(&globe_lines));
        let edges = DynamicBuffer::new(
            &device,
            "constellation_edges",
            (INITIAL_EDGE_CAPACITY * 2 * size_of::<LineVertex>()) as u64,
        );
        let sprites = DynamicBuffer::new(
            &device,
            "sprites",
            (INITIAL_SPRITE_CAPACITY * size_of::<SpriteInstance>()) as u64,
        );
        log::info!(
            "[scene] WebGPU ready {}x{} {:?}, globe {} vertices",
            width,
            height,
            format,
            globe_lines.len()
        );

        Ok(Self {
            gpu: Some(GpuResources {
                surface,
                device,
                queue,
                config,
                uniform_buffer,
                bind_group,
                line_pipeline,
                sprite_pipeline,
                globe,
                globe_vertices: globe_lines.len() as u32,
                edges,
                sprites,
            }),
        })
    }
}

impl RenderBackend for GpuState {
    fn resize(&mut self, width: u32, height: u32) {
        let Some(g) = self.gpu.as_mut() else {
            return;
        };
        g.config.width = width.max(1);
        g.config.height = height.max(1);
        g.surface.configure(&g.device, &g.config);
    }

    fn render(&mut self, frame: &SceneFrame<'_>) -> Result<()> {
        let g = self
            .gpu
            .as_mut()
            .ok_or_else(|| CosmosError::BackendUnavailable("released".into()))?;
        let output = match g.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                g.surface.configure(&g.device, &g.config);
                return Err(CosmosError::FrameSkipped("surface reconfigured".into()));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return Err(CosmosError::FrameSkipped("surface timeout".into()));
            }
            Err(e) => return Err(CosmosError::BackendUnavailable(format!("{e:?}"))),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        g.queue
            .write_buffer(&g.uniform_buffer, 0, bytemuck::bytes_of(&frame.uniforms));
        g.edges
            .write(&g.device, &g.queue, bytemuck::cast_slice(frame.edges));
        g.sprites
            .write(&g.device, &g.queue, bytemuck::cast_slice(frame.sprites));

        let mut encoder = g
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_bind_group(0, &g.bind_group, &[]);

            rpass.set_pipeline(&g.line_pipeline);
            rpass.set_vertex_buffer(0, g.globe.slice(..));
            rpass.draw(0..g.globe_vertices, 0..1);
            if let Some(edges) = g.edges.slice() {
                rpass.set_vertex_buffer(0, edges);
                rpass.draw(0..frame.edges.len() as u32, 0..1);
            }

            if let Some(sprites) = g.sprites.slice() {
                rpass.set_pipeline(&g.sprite_pipeline);
                rpass.set_vertex_buffer(0, sprites);
                rpass.draw(0..SPRITE_VERTS, 0..frame.sprites.len() as u32);
            }
        }
        g.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    fn release(&mut self) {
        if let Some(g) = self.gpu.take() {
            g.edges.destroy();
            g.sprites.destroy();
            g.globe.destroy();
            g.uniform_buffer.destroy();
            log::info!("[scene] GPU resources released");
        }
    }
}
