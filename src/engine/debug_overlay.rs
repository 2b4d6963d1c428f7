use egui::epaint::Shadow;

use super::hand_signal::{FingerStates, Gesture, Swipe};

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub particle_count: usize,
    pub resolution: (u32, u32),
    pub template: &'static str,
    pub expanded: bool,
    pub attracted: bool,
    pub waving: bool,
    pub glow: f32,
    /// `None` while no hand is tracked.
    pub hand: Option<HandStats>,
}

pub struct HandStats {
    pub gesture: Gesture,
    pub swipe: Swipe,
    pub proximity: f32,
    pub fingers: FingerStates,
    /// Cursor in world units.
    pub cursor: (f32, f32),
}

pub struct DebugOverlay {
    pub visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl DebugOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            visible: true,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render one egui frame on top of the particles. `stats = None` draws
    /// nothing but still runs egui so its input state stays current.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: Option<&DebugStats>,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let Some(stats) = stats else { return };
            egui::Area::new(egui::Id::new("debug_overlay"))
                .fixed_pos(egui::pos2(10.0, 10.0))
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                        .inner_margin(egui::Margin::same(8.0))
                        .rounding(4.0)
                        .show(ui, |ui: &mut egui::Ui| {
                            ui.label(format!("FPS: {}  ({:.2} ms)", stats.fps, stats.frame_time_avg_ms));
                            ui.label(format!("Particles: {}", stats.particle_count));
                            ui.label(format!(
                                "Resolution: {} x {}",
                                stats.resolution.0, stats.resolution.1
                            ));
                            ui.separator();
                            ui.label(format!("Template: {}", stats.template));
                            ui.label(format!(
                                "Expanded: {}  Attracted: {}  Waving: {}",
                                flag(stats.expanded),
                                flag(stats.attracted),
                                flag(stats.waving),
                            ));
                            ui.label(format!("Glow: {:.2}", stats.glow));
                            ui.separator();
                            match &stats.hand {
                                Some(hand) => {
                                    ui.label(format!(
                                        "Hand: {}  swipe {}",
                                        hand.gesture.as_str(),
                                        hand.swipe.as_str()
                                    ));
                                    ui.label(format!("Fingers: {}", finger_row(&hand.fingers)));
                                    ui.label(format!("Proximity: {:.2}", hand.proximity));
                                    ui.label(format!(
                                        "Cursor: ({:.1}, {:.1})",
                                        hand.cursor.0, hand.cursor.1
                                    ));
                                }
                                None => {
                                    ui.label("Hand: not detected");
                                }
                            }
                            ui.separator();
                            ui.label("1 open  2 fist  3 pinch  4 point");
                            ui.label("H hand  scroll size  F3 overlay");
                        });
                });
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn flag(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// Thumb-to-pinky extension row, e.g. "T I M - -".
fn finger_row(fingers: &FingerStates) -> String {
    [
        (fingers.thumb, 'T'),
        (fingers.index, 'I'),
        (fingers.middle, 'M'),
        (fingers.ring, 'R'),
        (fingers.pinky, 'P'),
    ]
    .iter()
    .map(|&(extended, c)| if extended { c.to_string() } else { "-".to_string() })
    .collect::<Vec<_>>()
    .join(" ")
}
