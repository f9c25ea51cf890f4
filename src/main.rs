use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{ModifiersState, PhysicalKey},
    window::{Window, WindowId},
};

use heightscape::export::{save_obj, ExportOptions, DEFAULT_EXPORT_PATH};
use heightscape::input::{shortcut, FlyControls, Shortcut};
use heightscape::renderer::{RenderMode, Renderer};
use heightscape::scene::Scene;
use heightscape::terrain::{load_heightmap, ColorScheme, MeshOptions, TerrainMesh};

#[derive(Parser, Debug)]
#[command(name = "heightscape")]
#[command(about = "Fly over a heightmap image rendered as 3D terrain")]
struct Args {
    /// Heightmap image (PNG or JPEG, at most 512x512)
    file: PathBuf,

    /// Plane size multiplier (units per pixel)
    #[arg(long, default_value = "1.0")]
    scale_plane: f32,

    /// Height multiplier applied to the red channel
    #[arg(long, default_value = "1.0")]
    scale_height: f32,

    /// Elevation color scheme
    #[arg(long, value_enum, default_value_t = ColorScheme::Terrain)]
    color_scheme: ColorScheme,

    /// Initial render mode
    #[arg(long, value_enum, default_value_t = RenderMode::Solid)]
    render_mode: RenderMode,

    /// Where OBJ exports are written
    #[arg(long, short, default_value = DEFAULT_EXPORT_PATH)]
    output: PathBuf,

    /// Write vertex colors into exported OBJ files
    #[arg(long)]
    export_colors: bool,

    /// Export the mesh and exit without opening a window
    #[arg(long)]
    headless: bool,
}

struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    scene: Scene,
    controls: FlyControls,
    modifiers: ModifiersState,
    last_update: Instant,
    render_mode: RenderMode,
    output: PathBuf,
    export_options: ExportOptions,
}

impl App {
    fn export(&mut self) {
        let status = match save_obj(&self.scene, &self.output, &self.export_options) {
            Ok(summary) => format!(
                "Saved {} ({} faces)",
                self.output.display(),
                summary.faces
            ),
            Err(e) => {
                log::error!("Export failed: {}", e);
                format!("Export failed: {}", e)
            }
        };
        if let Some(ref mut renderer) = self.renderer {
            renderer.ui.export_status = Some(status);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes().with_title("heightscape");
        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut renderer = match pollster::block_on(Renderer::new(window.clone())) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Cannot initialize GPU: {:#}", e);
                event_loop.exit();
                return;
            }
        };

        // Upload mesh to GPU
        renderer.upload_mesh(&self.scene.terrain);
        renderer.render_mode = self.render_mode;

        let size = window.inner_size();
        self.controls.set_viewport(size.width, size.height);
        self.last_update = Instant::now();

        self.window = Some(window);
        self.renderer = Some(renderer);
        log::info!("Ready to save!");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let (Some(window), Some(renderer)) = (self.window.clone(), self.renderer.as_mut()) else {
            return;
        };

        if !matches!(event, WindowEvent::RedrawRequested)
            && renderer.handle_window_event(&window, &event)
        {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match shortcut(code, state, self.modifiers.control_key()) {
                Some(Shortcut::Quit) => event_loop.exit(),
                Some(Shortcut::Export) => self.export(),
                None => {
                    self.controls
                        .handle_keyboard(code, state, &mut self.scene.camera);
                }
            },
            WindowEvent::MouseInput { state, button, .. } => {
                self.controls.handle_mouse_button(button, state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.controls
                    .handle_mouse_move(position.x as f32, position.y as f32);
            }
            WindowEvent::Focused(false) => {
                self.controls.stop();
            }
            WindowEvent::Resized(physical_size) => {
                renderer.resize(physical_size);
                self.controls
                    .set_viewport(physical_size.width, physical_size.height);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(self.last_update).as_secs_f32();
                self.last_update = now;
                self.controls.update(&mut self.scene.camera, dt);

                match renderer.render(&window, &mut self.scene, &mut self.controls.config) {
                    Ok(response) => {
                        if response.export_obj {
                            self.export();
                        }
                    }
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                    Err(e) => log::error!("Render error: {:?}", e),
                }
                window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let heightmap = match load_heightmap(&args.file) {
        Ok(heightmap) => heightmap,
        Err(e) => {
            log::error!("ERROR: {}", e);
            return Err(e.into());
        }
    };
    log::info!(
        "Loaded heightmap: {}x{}",
        heightmap.width(),
        heightmap.height()
    );

    let options = MeshOptions {
        scale_plane: args.scale_plane,
        scale_height: args.scale_height,
    };
    let mesh = TerrainMesh::from_heightmap(&heightmap, &options);
    log::info!("Max z: {}, min z: {}", mesh.elevation.max, mesh.elevation.min);
    log::info!(
        "Generated mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    let scene = Scene::new(mesh).with_color_scheme(args.color_scheme);
    let export_options = ExportOptions {
        vertex_colors: args.export_colors,
    };

    if args.headless {
        save_obj(&scene, &args.output, &export_options)?;
        return Ok(());
    }

    // Create window and run
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        window: None,
        renderer: None,
        scene,
        controls: FlyControls::new(),
        modifiers: ModifiersState::empty(),
        last_update: Instant::now(),
        render_mode: args.render_mode,
        output: args.output,
        export_options,
    };

    event_loop.run_app(&mut app)?;

    Ok(())
}
