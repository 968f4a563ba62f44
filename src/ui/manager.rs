//! ImGui integration for the viewer
//!
//! Wraps the ImGui context, the winit platform glue and the wgpu renderer.
//! The overlay is drawn after the scene, into the same surface texture.

use std::time::Instant;

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

/// ImGui vertex colours are sRGB. On an sRGB target they are linearized in
/// the shader and the surface encodes them again; otherwise they pass through.
fn renderer_config(format: TextureFormat) -> RendererConfig<'static> {
    let base = if format.is_srgb() {
        RendererConfig::new()
    } else {
        RendererConfig::new_srgb()
    };
    RendererConfig {
        texture_format: format,
        ..base
    }
}

pub struct UiManager {
    pub context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
}

impl UiManager {
    /// Sets up ImGui with a locked DPI factor; the font size is scaled by
    /// the window's own scale factor instead.
    ///
    /// # Arguments
    /// * `device` - Device the renderer allocates its buffers on
    /// * `queue` - Queue used for font atlas and buffer uploads
    /// * `output_color_format` - Format of the surface the overlay draws into
    /// * `window` - Window the platform glue attaches to
    pub fn new(
        device: &Device,
        queue: &Queue,
        output_color_format: TextureFormat,
        window: &Window,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        let font_size = (16.0 * window.scale_factor()) as f32;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        let renderer_config = renderer_config(output_color_format);
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
        }
    }

    /// Keeps ImGui's display size in step with the surface
    ///
    /// # Arguments
    /// * `width` - Surface width in pixels
    /// * `height` - Surface height in pixels
    pub fn update_display_size(&mut self, width: u32, height: u32) {
        self.context.io_mut().display_size = [width as f32, height as f32];
    }

    /// True while a panel is hovered or has keyboard focus
    pub fn wants_input(&self) -> bool {
        let io = self.context.io();
        io.want_capture_mouse || io.want_capture_keyboard
    }

    /// Feeds an input event to ImGui and reports whether the UI captured it
    ///
    /// # Arguments
    /// * `window` - Window the event belongs to
    /// * `window_id` - Its id, needed to rebuild the full winit event
    /// * `event` - Window event to forward
    ///
    /// # Returns
    /// True if a panel wants the mouse or keyboard after this event
    pub fn handle_input(&mut self, window: &Window, window_id: WindowId, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::KeyboardInput { .. }
            | WindowEvent::ModifiersChanged(_)
            | WindowEvent::Focused(_) => {
                let wrapped: Event<()> = Event::WindowEvent {
                    window_id,
                    event: event.clone(),
                };
                self.platform
                    .handle_event(self.context.io_mut(), window, &wrapped);
                self.wants_input()
            }
            _ => false,
        }
    }

    /// Starts a frame and builds the panels
    ///
    /// # Arguments
    /// * `window` - Window used for cursor and frame preparation
    /// * `run_ui` - Callback that builds this frame's panels
    ///
    /// # Returns
    /// True if ImGui wants input this frame
    pub fn update_logic<F>(&mut self, window: &Window, run_ui: F) -> bool
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::warn!("Failed to prepare UI frame: {}", e);
        }

        let ui = self.context.frame();
        run_ui(ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }

        self.wants_input()
    }

    /// Renders the last built frame on top of the scene
    ///
    /// # Arguments
    /// * `device` - Device for renderer buffer updates
    /// * `queue` - Queue for vertex and index uploads
    /// * `encoder` - Encoder that records the overlay pass
    /// * `color_attachment` - Surface view, loaded rather than cleared
    pub fn render_display_only(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        color_attachment: &TextureView,
    ) {
        let draw_data = self.context.render();

        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
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

        if let Err(e) = self
            .renderer
            .render(draw_data, queue, device, &mut render_pass)
        {
            log::error!("Failed to render UI: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_shader_follows_target_encoding() {
        let srgb = renderer_config(TextureFormat::Bgra8UnormSrgb);
        assert_eq!(srgb.texture_format, TextureFormat::Bgra8UnormSrgb);
        assert_eq!(srgb.fragment_shader_entry_point, Some("fs_main_linear"));

        let unorm = renderer_config(TextureFormat::Bgra8Unorm);
        assert_eq!(unorm.fragment_shader_entry_point, Some("fs_main_srgb"));
    }
}
