mod events;
mod ui;

use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use portal_assets::{AssetLoadError, AssetLoader, AssetPaths};
use portal_common::{LoadedModel, TextureImage};
use portal_input::PointerState;
use portal_render::{Clock, FrameLoop, Renderer, Stage, Viewport};
use portal_render_wgpu::{Gpu, WgpuRenderer};
use portal_scene::panel::ScenePanel;
use portal_scene::scene_panel;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "portal-desktop", about = "Portal scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory the static assets are loaded from
    #[arg(long, default_value = "static")]
    assets: PathBuf,

    /// Model file, relative to the assets directory
    #[arg(long, default_value = "portal.glb")]
    model: PathBuf,

    /// Baked lighting texture, relative to the assets directory
    #[arg(long, default_value = "baked.jpg")]
    texture: PathBuf,

    /// Reject Draco-compressed models instead of decoding them
    #[arg(long)]
    no_draco: bool,
}

impl From<Cli> for AssetPaths {
    fn from(cli: Cli) -> Self {
        Self {
            root: cli.assets,
            model: cli.model,
            texture: cli.texture,
            draco: !cli.no_draco,
        }
    }
}

/// Completed background loads, delivered on the UI thread.
enum UserEvent {
    Texture(Result<TextureImage, AssetLoadError>),
    Model(Result<LoadedModel, AssetLoadError>),
}

/// Start both loads. Each completion is posted back to the event loop.
fn spawn_loads(paths: &AssetPaths, proxy: &EventLoopProxy<UserEvent>) {
    let loader = AssetLoader::from(paths);

    let texture_proxy = proxy.clone();
    loader.spawn_texture(&paths.texture, move |result| {
        if texture_proxy.send_event(UserEvent::Texture(result)).is_err() {
            tracing::debug!("event loop closed before texture arrived");
        }
    });

    let model_proxy = proxy.clone();
    loader.spawn_model(&paths.model, move |result| {
        if model_proxy.send_event(UserEvent::Model(result)).is_err() {
            tracing::debug!("event loop closed before model arrived");
        }
    });
}

struct GpuApp {
    stage: Stage,
    frames: FrameLoop<Clock>,
    panel: ScenePanel,
    pointer: PointerState,
    errors: Vec<String>,
    fatal: Option<anyhow::Error>,
    window: Option<Arc<Window>>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new() -> Self {
        let viewport = Viewport::new(1280, 720, 1.0);
        Self {
            stage: Stage::new(viewport, &mut rand::thread_rng()),
            frames: FrameLoop::new(Clock::new()),
            panel: scene_panel(),
            pointer: PointerState::new(),
            errors: Vec::new(),
            fatal: None,
            window: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn report(&mut self, error: impl std::fmt::Display) {
        tracing::error!("{error}");
        self.errors.push(error.to_string());
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.fatal = Some(error);
        event_loop.exit();
    }

    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        if let Some(renderer) = &mut self.renderer {
            let viewport = Viewport::new(size.width, size.height, scale_factor as f32);
            self.stage.resize(viewport, renderer);
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(renderer), Some(egui_winit), Some(egui_renderer)) = (
            &self.window,
            &mut self.renderer,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        ) else {
            return;
        };

        // A skipped frame is retried on the redraw `about_to_wait` requests.
        let Some(output) = surface_texture(renderer.gpu().acquire()) else {
            return;
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.frames.tick(&mut self.stage, renderer, &view);

        let raw_input = egui_winit.take_egui_input(window);
        let mut effects = Vec::new();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            effects = ui::debug_panel(ctx, &self.panel, &mut self.stage.scene.params);
            ui::error_window(ctx, &mut self.errors);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);
        for effect in effects {
            self.stage.apply_effect(effect, renderer);
        }

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let gpu = renderer.gpu();
        let (width, height) = gpu.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
    }
}

/// The frame's swapchain texture, or `None` when this frame is skipped.
fn surface_texture<T, E: std::fmt::Display>(acquired: Result<Option<T>, E>) -> Option<T> {
    match acquired {
        Ok(texture) => texture,
        Err(e) => {
            tracing::error!("{e}");
            None
        }
    }
}

impl ApplicationHandler<UserEvent> for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Portal")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let size = window.inner_size();
        let gpu = match pollster::block_on(Gpu::new(window.clone(), size.width, size.height)) {
            Ok(gpu) => gpu,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&gpu.device, gpu.format(), None, 1, false);

        let mut renderer = WgpuRenderer::new(gpu);
        renderer.set_clear_color(self.stage.scene.params.clear_color());
        self.renderer = Some(renderer);
        self.resize(size, window.scale_factor());

        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        window.request_redraw();
        self.window = Some(window);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Texture(Ok(image)) => {
                self.stage.scene.materials.set_baked_texture(image);
            }
            UserEvent::Model(Ok(model)) => {
                if let Err(e) = self.stage.scene.attach_model(model) {
                    self.report(e);
                }
            }
            UserEvent::Texture(Err(e)) | UserEvent::Model(Err(e)) => self.report(e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(egui_winit) = &mut self.egui_winit {
            let response = egui_winit.on_window_event(&window, &event);
            let is_release = matches!(
                event,
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    ..
                }
            );
            if response.consumed && !is_release {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.resize(size, window.scale_factor());
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.resize(window.inner_size(), scale_factor);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = events::pointer_button(button) {
                    match state {
                        ElementState::Pressed => self.pointer.press(button),
                        ElementState::Released => self.pointer.release(button),
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let Some(action) = self.pointer.moved(position) {
                    self.stage.navigate(action);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer.reset();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(action) = self.pointer.wheel(events::wheel_delta(delta)) {
                    self.stage.navigate(action);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("portal-desktop starting");

    let paths = AssetPaths::from(cli);
    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    spawn_loads(&paths, &event_loop.create_proxy());

    let mut app = GpuApp::new();
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_frames_yield_no_texture() {
        assert_eq!(surface_texture::<u8, String>(Ok(Some(7))), Some(7));
        assert_eq!(surface_texture::<u8, String>(Ok(None)), None);
        assert_eq!(surface_texture::<u8, _>(Err("surface out of memory")), None);
    }
}
