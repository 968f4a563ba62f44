//! WGPU-based rendering engine for the viewer
//!
//! Owns the surface, device and the two pipelines: lit meshes and the
//! blended edge overlay drawn on top of them. The UI is rendered last
//! through a caller-supplied callback.

use std::sync::Arc;

use anyhow::Context;
use wgpu::{Device, TextureFormat};

use super::pipeline_manager::{PipelineConfig, PipelineManager, VertexLayout};
use crate::{
    gfx::{
        camera::camera_utils::CameraUniform,
        resources::{
            global_bindings::{update_global_ubo, EdgeUniform, GlobalUBO, UniformBindings},
            texture_resource::TextureResource,
        },
        scene::{
            edges::EdgeStyle,
            lighting::{linear_rgb_from_hex, Lighting},
            object::{object_bind_group_layout, DrawObject},
            scene::Scene,
        },
    },
    wgpu_utils::{binding_builder::BindGroupLayoutWithDesc, uniform_buffer::UniformBuffer},
};

/// First sRGB format, else whatever the surface lists first.
///
/// Shaders and clear colours work in linear space and rely on the surface
/// to encode on write.
pub fn preferred_surface_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first().copied())
}

pub const LIT_PIPELINE: &str = "Lit";
pub const EDGES_PIPELINE: &str = "Edges";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: UniformBindings,
    edge_ubo: UniformBuffer<EdgeUniform>,
    edge_bindings: UniformBindings,
    object_layout: BindGroupLayoutWithDesc,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Presents with Fifo (vsync) so per-frame camera movement runs at the
    /// display refresh rate.
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    ///
    /// # Returns
    /// Engine with both pipelines built, or the first setup failure
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = preferred_surface_format(&surface_capabilities.formats)
            .context("Surface reports no supported formats")?;
        if !format.is_srgb() {
            log::warn!("No sRGB surface format available, colours will render dark");
        }
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured: {:?}, {}x{} on {}",
            format,
            config.width,
            config.height,
            adapter.get_info().name
        );

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = UniformBindings::new(&device, &global_ubo, "Global Bind Group");

        let edge_ubo = UniformBuffer::new_with_data(&device, &EdgeUniform::from(&EdgeStyle::default()));
        let edge_bindings = UniformBindings::new(&device, &edge_ubo, "Edge Style Bind Group");

        let object_layout = object_bind_group_layout(&device);

        // Wrap device and queue in Arc for pipeline manager
        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("lit", include_str!("lit.wgsl"));
        pipeline_manager.load_shader("edges", include_str!("edges.wgsl"));

        pipeline_manager.register_pipeline(
            LIT_PIPELINE,
            PipelineConfig::default()
                .with_label("LIT")
                .with_shader("lit")
                .with_depth_stencil(depth_texture.texture.clone())
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    object_layout.layout.clone(),
                ]),
        );

        // Lines are depth-tested against the meshes but never occlude each other
        pipeline_manager.register_pipeline(
            EDGES_PIPELINE,
            PipelineConfig::default()
                .with_label("EDGES")
                .with_shader("edges")
                .with_vertex_layout(VertexLayout::Line)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_cull_mode(None)
                .with_depth_stencil(depth_texture.texture.clone())
                .with_depth_state(wgpu::CompareFunction::LessEqual, false)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    edge_bindings.bind_group_layout().clone(),
                ]),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            anyhow::bail!("Pipeline creation failed: {}", errors.join("; "));
        }

        Ok(RenderEngine {
            device: device_handle,
            config,
            format,
            surface,
            queue: queue_handle,
            depth_texture,
            pipeline_manager,
            global_ubo,
            global_bindings,
            edge_ubo,
            edge_bindings,
            object_layout,
        })
    }

    /// Uploads any meshes and overlay segments that are not on the GPU yet
    pub fn prepare_scene(&self, scene: &mut Scene) {
        scene.init_gpu_resources(&self.device, &self.object_layout);
    }

    /// Clears to the scene background, draws meshes, then edges, then the UI
    ///
    /// # Arguments
    /// * `scene` - Scene whose GPU resources were prepared this frame
    /// * `ui_callback` - Optional overlay pass recorded into the same encoder
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = self.surface.get_current_texture()?;

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let [r, g, b] = linear_rgb_from_hex(scene.background);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline(LIT_PIPELINE) {
                render_pass.set_pipeline(pipeline);

                for object in scene.objects.iter().filter(|o| o.visible) {
                    render_pass.draw_object(object);
                }
            }

            if scene.edges.style.enabled && scene.edges.vertex_count() > 0 {
                if let Some(pipeline) = self.pipeline_manager.get_pipeline(EDGES_PIPELINE) {
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(1, self.edge_bindings.bind_group(), &[]);
                    render_pass.draw_edges(&scene.edges);
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Pushes camera, light rig and edge colour to the GPU
    ///
    /// # Arguments
    /// * `camera_uniform` - Updated camera uniform data
    /// * `lighting` - Light rig, packed with linear colours
    /// * `edge_style` - Overlay colour and opacity
    pub fn update(&mut self, camera_uniform: CameraUniform, lighting: &Lighting, edge_style: &EdgeStyle) {
        update_global_ubo(&mut self.global_ubo, &self.queue, camera_uniform, lighting.to_raw());
        self.edge_ubo
            .update_content(&self.queue, EdgeUniform::from(edge_style));
    }

    /// Reconfigures the surface and recreates the depth texture
    ///
    /// # Arguments
    /// * `width` - New surface width in pixels
    /// * `height` - New surface height in pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;

        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Reconfigures the surface at its current size, after it was lost or outdated
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_srgb_surface() {
        let formats = [TextureFormat::Bgra8Unorm, TextureFormat::Bgra8UnormSrgb];
        assert_eq!(preferred_surface_format(&formats), Some(TextureFormat::Bgra8UnormSrgb));
    }

    #[test]
    fn test_falls_back_to_first_format() {
        let formats = [TextureFormat::Rgba16Float, TextureFormat::Bgra8Unorm];
        assert_eq!(preferred_surface_format(&formats), Some(TextureFormat::Rgba16Float));
        assert_eq!(preferred_surface_format(&[]), None);
    }
}
