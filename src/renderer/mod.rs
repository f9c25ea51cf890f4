//! wgpu renderer for the terrain scene.
//!
//! One frame is a single render pass: the solid terrain, the grid lines on top
//! of it, then the egui panel.

pub mod camera;
mod pipeline;

use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::input::InputConfig;
use crate::scene::Scene;
use crate::terrain::TerrainMesh;
use crate::ui::{Ui, UiResponse};
pub use camera::Camera;
pub use pipeline::DrawPlan;
use pipeline::{
    MeshBuffers, SolidUniforms, TerrainPass, WireframeUniforms, DEPTH_FORMAT, SOLID_PASS,
    WIREFRAME_PASS,
};

/// How the terrain surface is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RenderMode {
    /// Grid lines only
    Wireframe,
    /// Elevation-colored, lit surface
    #[default]
    Solid,
    /// Surface with the grid drawn over it
    Both,
}

/// Directional light for the solid pass.
#[derive(Debug, Clone, Copy)]
pub struct LightingConfig {
    /// Points toward the light
    pub direction: Vec3,
    pub color: Vec3,
    /// 0.0 - 1.0
    pub ambient: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.5, 0.8, 0.3).normalize(),
            color: Vec3::ONE,
            ambient: 0.35,
        }
    }
}

/// Frames counted over roughly one-second windows.
struct FrameTimer {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FrameTimer {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) -> f32 {
        self.frames += 1;
        let elapsed = self.window_start.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = self.frames as f32 / elapsed;
            self.frames = 0;
            self.window_start = Instant::now();
        }
        self.fps
    }
}

fn depth_view(device: &wgpu::Device, size: PhysicalSize<u32>) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn clear_color(background: [f32; 3]) -> wgpu::Color {
    let [r, g, b] = background.map(f64::from);
    wgpu::Color { r, g, b, a: 1.0 }
}

/// Owns the GPU state for one window.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    /// Surface size in physical pixels
    pub size: PhysicalSize<u32>,
    depth: wgpu::TextureView,

    solid: TerrainPass,
    wireframe: TerrainPass,
    mesh: Option<MeshBuffers>,

    pub render_mode: RenderMode,
    pub lighting: LightingConfig,

    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    pub ui: Ui,
    frames: FrameTimer,
}

impl Renderer {
    /// Set up the surface, both terrain passes and egui for `window`.
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let inner = window.inner_size();
        let size = PhysicalSize::new(inner.width.max(1), inner.height.max(1));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no texture formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_state = egui_winit::State::new(
            egui::Context::default(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(device.limits().max_texture_dimension_2d as usize),
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: Some(DEPTH_FORMAT),
                ..Default::default()
            },
        );

        let info = adapter.get_info();
        log::info!("Renderer ready: {} ({:?}, {:?})", info.name, info.backend, format);

        Ok(Self {
            depth: depth_view(&device, size),
            solid: TerrainPass::new(&device, format, &SOLID_PASS),
            wireframe: TerrainPass::new(&device, format, &WIREFRAME_PASS),
            mesh: None,
            surface,
            device,
            queue,
            config,
            size,
            render_mode: RenderMode::default(),
            lighting: LightingConfig::default(),
            egui_state,
            egui_renderer,
            ui: Ui::new(),
            frames: FrameTimer::new(),
        })
    }

    /// Feed a window event to egui; true when egui used it.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui_state.on_window_event(window, event).consumed
    }

    /// Reconfigure the surface and depth buffer. Zero-sized (minimized)
    /// windows are ignored.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = depth_view(&self.device, new_size);
    }

    /// Copy `mesh` to the GPU, replacing any previous one.
    ///
    /// Index lists that are empty (a single row or column has no triangles,
    /// a single pixel has no lines) get no buffer and their pass is skipped.
    pub fn upload_mesh(&mut self, mesh: &TerrainMesh) {
        self.mesh = MeshBuffers::upload(&self.device, mesh);
        log::debug!(
            "Uploaded mesh: {} vertices, plan {:?}",
            mesh.vertex_count(),
            DrawPlan::for_mesh(self.render_mode, mesh)
        );
    }

    fn draw_plan(&self) -> DrawPlan {
        let (triangles, lines) = self.mesh.as_ref().map_or((0, 0), |mesh| {
            (
                mesh.triangles.as_ref().map_or(0, |b| b.len()),
                mesh.lines.as_ref().map_or(0, |b| b.len()),
            )
        });
        DrawPlan::new(self.render_mode, triangles, lines)
    }

    /// Draw one frame and run the UI.
    ///
    /// Returns the actions the UI asked for that the caller has to carry out.
    pub fn render(
        &mut self,
        window: &Window,
        scene: &mut Scene,
        input: &mut InputConfig,
    ) -> Result<UiResponse, wgpu::SurfaceError> {
        let fps = self.frames.tick();
        let frame = self.surface.get_current_texture()?;
        let target = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = self.egui_state.take_egui_input(window);
        let ctx = self.egui_state.egui_ctx().clone();
        let mut response = UiResponse::default();
        let output = ctx.run(raw_input, |ctx| {
            response = self.ui.render(
                ctx,
                scene,
                &mut self.render_mode,
                &mut self.lighting,
                input,
                fps,
            );
        });
        if response.reset_camera {
            scene.reset_camera();
        }
        self.egui_state
            .handle_platform_output(window, output.platform_output);

        // Uniforms go after the UI so panel edits show up this frame
        let aspect = self.size.width as f32 / self.size.height as f32;
        self.solid
            .write(&self.queue, &SolidUniforms::from_scene(scene, aspect, &self.lighting));
        self.wireframe
            .write(&self.queue, &WireframeUniforms::from_scene(scene, aspect));

        let paint_jobs = ctx.tessellate(output.shapes, output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.size.width, self.size.height],
            pixels_per_point: output.pixels_per_point,
        };
        for (id, delta) in &output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Frame") });
        self.egui_renderer
            .update_buffers(&self.device, &self.queue, &mut encoder, &paint_jobs, &screen);

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Frame"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(clear_color(scene.background)),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                })
                // egui_wgpu wants a 'static pass
                .forget_lifetime();

            let plan = self.draw_plan();
            if let Some(mesh) = &self.mesh {
                if let (true, Some(triangles)) = (plan.solid, &mesh.triangles) {
                    self.solid.draw(&mut pass, &mesh.vertices, triangles);
                }
                if let (true, Some(lines)) = (plan.wireframe, &mesh.lines) {
                    self.wireframe.draw(&mut pass, &mesh.vertices, lines);
                }
            }

            self.egui_renderer.render(&mut pass, &paint_jobs, &screen);
        }

        for id in &output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(response)
    }
}
