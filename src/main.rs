// Hand-driven particle cloud with INSTANCED rendering
// One quad mesh, one instance per particle, one draw call
//
// Frame loop: simulated hand → landmarks → hand signal → frame driver →
// particle engine update → instance buffer upload → draw

mod engine;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::{
    event::{Event as WinitEvent, WindowEvent, ElementState, KeyEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use engine::camera::ViewCamera;
use engine::debug_overlay::{DebugOverlay, DebugStats, HandStats};
use engine::driver::FrameDriver;
use engine::input::InputState;
use engine::sim_hand::SimulatedHand;
use engine::templates::TemplateSet;
use engine::{AppConfig, AppError, AppResult, HandSignal, HandSignalExtractor, ParticleEngine};

// ============================================================================
// VERTEX DEFINITION
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    corner: [f32; 2],
}

impl Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

// ============================================================================
// INSTANCE DATA (per-particle)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    position: [f32; 3],
    scale: f32,
    color: [f32; 4],
}

impl InstanceData {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,  // One per instance, not per vertex
            attributes: &[
                // Position + scale (location 1)
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Color (location 2)
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Pack the engine's parallel buffers into per-instance records.
fn fill_instances(out: &mut Vec<InstanceData>, particles: &ParticleEngine) {
    out.clear();
    out.extend(
        particles
            .positions()
            .chunks_exact(3)
            .zip(particles.colors().chunks_exact(3))
            .zip(particles.scales())
            .map(|((p, c), &scale)| InstanceData {
                position: [p[0], p[1], p[2]],
                scale,
                color: [c[0], c[1], c[2], 1.0],
            }),
    );
}

// Billboard quad, corners at ±1
const QUAD_VERTICES: &[Vertex] = &[
    Vertex { corner: [-1.0, -1.0] },
    Vertex { corner: [ 1.0, -1.0] },
    Vertex { corner: [ 1.0,  1.0] },
    Vertex { corner: [-1.0,  1.0] },
];

const QUAD_INDICES: &[u16] = &[0, 1, 2, 0, 2, 3];

// ============================================================================
// UNIFORM DATA
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    /// x = glow, y = point size
    params: [f32; 4],
}

impl Uniforms {
    fn new(view_proj: Mat4, glow: f32, point_size: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            params: [glow, point_size, 0.0, 0.0],
        }
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instances: Vec<InstanceData>,
    num_indices: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    overlay: DebugOverlay,

    // Hand → particles pipeline
    camera: ViewCamera,
    input: InputState,
    sim_hand: SimulatedHand,
    extractor: HandSignalExtractor,
    driver: FrameDriver,
    particles: ParticleEngine,
    /// Signal used by the last update, cursor in world units.
    last_signal: Option<HandSignal>,
    point_size: f32,
    start: Instant,

    // Frame stats
    fps: u32,
    frame_time_avg_ms: f32,
}

impl State {
    async fn new(window: Arc<Window>, app_config: &AppConfig) -> AppResult<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(AppError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(AppError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_particles.wgsl").into()),
        });

        // Particle core
        let mut rng = rand::thread_rng();
        let templates = Arc::new(TemplateSet::generate(app_config.particles.count, &mut rng));
        let particles = ParticleEngine::new(
            templates,
            app_config.behavior.clone(),
            &app_config.particles.initial_template,
            &mut rng,
        );

        let camera = ViewCamera::new();
        let aspect = config.width as f32 / config.height as f32;
        let driver = FrameDriver::new(app_config.driver.clone(), camera.visible_half_extent(aspect));

        let uniforms = Uniforms::new(camera.view_projection(aspect), 0.0, app_config.particles.point_size);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), InstanceData::desc()],  // Vertex + Instance buffers
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    // Additive: overlapping particles brighten
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent::OVER,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        // Instance buffer sized once: the particle count never changes
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (particles.count() * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let overlay = DebugOverlay::new(&window, &device, surface_format);

        log::info!(
            "Renderer ready: {} particles, {:?} adapter, format {:?}",
            particles.count(),
            adapter.get_info().backend,
            surface_format
        );

        Ok(Self {
            input: InputState::new((size.width, size.height)),
            window,
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            instances: Vec::with_capacity(particles.count()),
            num_indices: QUAD_INDICES.len() as u32,
            uniform_buffer,
            uniform_bind_group,
            overlay,
            camera,
            sim_hand: SimulatedHand::new(),
            extractor: HandSignalExtractor::new(app_config.hand.clone()),
            driver,
            particles,
            last_signal: None,
            point_size: app_config.particles.point_size,
            start: Instant::now(),
            fps: 0,
            frame_time_avg_ms: 0.0,
        })
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.driver.set_world_half_extent(self.camera.visible_half_extent(self.aspect()));
        }
    }

    /// One frame of the hand → particles pipeline.
    fn update(&mut self) {
        let time = self.start.elapsed().as_secs_f32();

        if self.input.was_key_pressed(KeyCode::F3) {
            self.overlay.toggle();
        }
        self.sim_hand.handle_input(&self.input);

        let landmarks = self.sim_hand.landmarks(self.input.mouse_normalized());
        let signal = self.extractor.process(landmarks.as_ref());
        let signal = self.driver.drive(&mut self.particles, signal, time);
        self.particles.update(time, signal.as_ref());
        self.last_signal = signal;

        self.input.end_frame();
    }

    fn debug_stats(&self) -> DebugStats {
        let behavior = self.particles.behavior();
        DebugStats {
            fps: self.fps,
            frame_time_avg_ms: self.frame_time_avg_ms,
            particle_count: self.particles.count(),
            resolution: (self.size.width, self.size.height),
            template: self.particles.target(),
            expanded: behavior.expanded(),
            attracted: behavior.attracted(),
            waving: behavior.waving(),
            glow: self.particles.glow(),
            hand: self.last_signal.map(|s| HandStats {
                gesture: s.gesture,
                swipe: s.swipe,
                proximity: s.proximity,
                fingers: s.fingers,
                cursor: (s.position.x, s.position.y),
            }),
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Upload particle buffers BEFORE creating render pass
        if self.particles.take_dirty() {
            fill_instances(&mut self.instances, &self.particles);
            self.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&self.instances),
            );
        }

        let uniforms = Uniforms::new(
            self.camera.view_projection(self.aspect()),
            self.particles.glow(),
            self.point_size,
        );
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.0,
                            b: 0.02,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));  // Instance data
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            // ONE DRAW CALL for all particles
            render_pass.draw_indexed(0..self.num_indices, 0, 0..self.particles.count() as u32);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let stats = self.overlay.visible.then(|| self.debug_stats());
        self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            stats.as_ref(),
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn run() -> AppResult<()> {
    let app_config = AppConfig::load(std::env::args().nth(1).map(PathBuf::from))?;

    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title(app_config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            app_config.window.width,
            app_config.window.height,
        ));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut state = pollster::block_on(State::new(window.clone(), &app_config))?;
    let mut frame_count = 0;
    let mut last_fps_update = Instant::now();

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let _ = state.overlay.handle_window_event(&window, event);
                state.input.process_event(event);

                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.resize(state.size)
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("GPU out of memory");
                                control_flow.exit()
                            }
                            Err(e) => log::warn!("{:?}", e),
                        }

                        frame_count += 1;
                        let now = Instant::now();
                        let elapsed = (now - last_fps_update).as_secs_f32();
                        if elapsed >= 1.0 {
                            state.fps = frame_count;
                            state.frame_time_avg_ms = elapsed * 1000.0 / frame_count as f32;
                            log::debug!(
                                "FPS: {} | Particles: {} | Template: {}",
                                frame_count,
                                state.particles.count(),
                                state.particles.target()
                            );
                            frame_count = 0;
                            last_fps_update = now;
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::BehaviorConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn instance_layout_matches_shader_locations() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 32);
        assert_eq!(std::mem::size_of::<Uniforms>(), 80);
    }

    #[test]
    fn instances_mirror_engine_buffers() {
        let mut rng = StdRng::seed_from_u64(3);
        let templates = Arc::new(TemplateSet::generate(16, &mut rng));
        let particles = ParticleEngine::new(templates, BehaviorConfig::default(), "cube", &mut rng);

        let mut instances = Vec::new();
        fill_instances(&mut instances, &particles);

        assert_eq!(instances.len(), 16);
        for (i, inst) in instances.iter().enumerate() {
            assert_eq!(&inst.position[..], &particles.positions()[i * 3..i * 3 + 3]);
            assert_eq!(&inst.color[..3], &particles.colors()[i * 3..i * 3 + 3]);
            assert_eq!(inst.scale, particles.scales()[i]);
        }
    }
}
