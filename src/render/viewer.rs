use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::carousel::Carousel;
use crate::carousel::geometry::{mat_mul, perspective, view_matrix};
use crate::config::Configuration;
use crate::error::Error;
use crate::events::InputTranslator;
use crate::render::cards::CardRenderer;
use crate::texture::testkit::BlockFace;
use crate::texture::{CardTextureGenerator, FontFace, TextFace, parse_hex_color};

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;

#[derive(Debug)]
enum ViewerEvent {
    Cancelled,
}

/// Which glyph source card bitmaps are painted with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GlyphMode {
    /// System fonts through fontdb.
    #[default]
    System,
    /// Font-free block glyphs.
    Block,
}

/// The self-rescheduling per-frame task.
///
/// While active, every presented frame asks for the next one. Cancelling
/// stops the chain after the frame in flight.
#[derive(Debug, Default)]
pub struct FrameTask {
    active: bool,
    frames: u64,
}

impl FrameTask {
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Records a finished frame; returns whether another should be requested.
    pub fn reschedule(&mut self) -> bool {
        if self.active {
            self.frames += 1;
        }
        self.active
    }

    /// Returns true if the task was running.
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// One stage of unmounting the carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TeardownStep {
    StopFrames,
    CancelSnap,
    DetachInput,
    ReleaseGpu,
}

/// Frames stop before anything they read is dropped.
const TEARDOWN_ORDER: [TeardownStep; 4] = [
    TeardownStep::StopFrames,
    TeardownStep::CancelSnap,
    TeardownStep::DetachInput,
    TeardownStep::ReleaseGpu,
];

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    cards: CardRenderer,
}

enum FrameOutcome {
    Presented,
    Skipped,
    Reconfigure,
    Fatal,
}

struct ViewerApp {
    cfg: Configuration,
    cancel: CancellationToken,
    glyph_mode: GlyphMode,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    carousel: Option<Carousel>,
    input: Option<InputTranslator>,
    frame_task: FrameTask,
    clear_color: wgpu::Color,
    setup_error: Option<anyhow::Error>,
    torn_down: bool,
}

impl ViewerApp {
    fn new(cfg: Configuration, cancel: CancellationToken, glyph_mode: GlyphMode) -> Self {
        let clear_color = clear_color(&cfg.window.background);
        Self {
            cfg,
            cancel,
            glyph_mode,
            window: None,
            gpu: None,
            carousel: None,
            input: None,
            frame_task: FrameTask::default(),
            clear_color,
            setup_error: None,
            torn_down: false,
        }
    }

    fn setup(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = WindowAttributes::default()
            .with_title(self.cfg.window.title.clone())
            .with_inner_size(LogicalSize::new(self.cfg.window.width, self.cfg.window.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(Error::from)
                .context("failed to create carousel window")?,
        );
        self.window = Some(window.clone());

        let face: Box<dyn TextFace> = match self.glyph_mode {
            GlyphMode::System => Box::new(
                FontFace::discover(&self.cfg.card.fonts).context("failed to load card fonts")?,
            ),
            GlyphMode::Block => Box::new(BlockFace),
        };
        let scale_factor = window.scale_factor();
        let mut generator = CardTextureGenerator::new(&self.cfg.card, scale_factor as f32, face);
        let carousel = Carousel::new(
            &self.cfg,
            window.inner_size(),
            &mut generator,
            &mut rand::rng(),
        );

        let gpu = init_gpu(window.clone(), &self.cfg, &carousel)?;
        self.gpu = Some(gpu);
        self.carousel = Some(carousel);
        self.input = Some(InputTranslator::new(scale_factor));
        Ok(())
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.config.width = new_size.width.max(1);
            gpu.config.height = new_size.height.max(1);
            gpu.surface.configure(&gpu.device, &gpu.config);
            debug!(
                width = gpu.config.width,
                height = gpu.config.height,
                "carousel surface resized"
            );
        }
        if let Some(carousel) = self.carousel.as_mut() {
            carousel.resize(new_size);
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let outcome = match (self.gpu.as_ref(), self.carousel.as_mut()) {
            (Some(gpu), Some(carousel)) => {
                carousel.tick(Instant::now());
                render(gpu, carousel, self.cfg.border_radius, self.clear_color)
            }
            _ => return,
        };
        match outcome {
            FrameOutcome::Presented | FrameOutcome::Skipped => {}
            FrameOutcome::Reconfigure => self.handle_resize(window.inner_size()),
            FrameOutcome::Fatal => {
                self.teardown();
                event_loop.exit();
                return;
            }
        }
        if self.frame_task.reschedule() {
            window.request_redraw();
        }
    }

    /// Runs every [`TEARDOWN_ORDER`] step once and returns the steps run;
    /// later calls run nothing.
    fn teardown(&mut self) -> &'static [TeardownStep] {
        if self.torn_down {
            return &[];
        }
        self.torn_down = true;
        for step in TEARDOWN_ORDER {
            self.teardown_step(step);
        }
        info!("carousel torn down");
        &TEARDOWN_ORDER
    }

    fn teardown_step(&mut self, step: TeardownStep) {
        match step {
            TeardownStep::StopFrames => {
                if self.frame_task.cancel() {
                    debug!(frames = self.frame_task.frames(), "frame task cancelled");
                }
            }
            TeardownStep::CancelSnap => {
                if let Some(carousel) = self.carousel.as_mut() {
                    carousel.teardown();
                }
            }
            TeardownStep::DetachInput => {
                if self.input.take().is_some() {
                    debug!("input translator detached");
                }
            }
            TeardownStep::ReleaseGpu => {
                let Some(gpu) = self.gpu.take() else {
                    return;
                };
                let GpuState {
                    surface,
                    device,
                    queue,
                    cards,
                    ..
                } = gpu;
                cards.release();
                queue.submit(std::iter::empty());
                if let Err(err) = device.poll(wgpu::PollType::Wait) {
                    warn!(error = %err, "waiting for GPU idle during teardown failed");
                }
                drop(surface);
                drop(device);
                debug!("GPU state dropped");
            }
        }
    }
}

impl ApplicationHandler<ViewerEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }

        if self.carousel.is_none() {
            if let Err(err) = self.setup(event_loop) {
                error!(error = ?err, "failed to set up carousel");
                self.setup_error = Some(err);
                event_loop.exit();
                return;
            }
        }

        if let Some(window) = self.window.as_ref() {
            self.frame_task.start();
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("carousel window close requested");
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if is_quit_key(&logical_key) => {
                info!("quit key pressed");
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => self.handle_resize(new_size),
            WindowEvent::ScaleFactorChanged {
                scale_factor,
                mut inner_size_writer,
            } => {
                if let Some(input) = self.input.as_mut() {
                    input.set_scale_factor(scale_factor);
                }
                let size = window.inner_size();
                if let Err(err) = inner_size_writer.request_inner_size(size) {
                    debug!(error = %err, "scale change size request rejected");
                }
                self.handle_resize(size);
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            other => {
                let Some(input) = self.input.as_mut() else {
                    return;
                };
                if let (Some(event), Some(carousel)) = (input.translate(&other), self.carousel.as_mut()) {
                    carousel.handle(event, Instant::now());
                }
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Cancelled => {
                info!("carousel received cancellation event");
                self.teardown();
                event_loop.exit();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

fn is_quit_key(key: &Key) -> bool {
    match key.as_ref() {
        Key::Named(NamedKey::Escape) => true,
        Key::Character(ch) => ch.eq_ignore_ascii_case("q"),
        _ => false,
    }
}

fn init_gpu(window: Arc<Window>, cfg: &Configuration, carousel: &Carousel) -> Result<GpuState> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window.clone())
        .map_err(Error::from)
        .context("failed to create surface")?;
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
    }))
    .map_err(Error::from)
    .context("failed to acquire GPU adapter")?;

    let caps = surface.get_capabilities(&adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|fmt| fmt.is_srgb())
        .or_else(|| caps.formats.first().copied())
        .ok_or_else(|| anyhow!("surface reports no supported formats"))?;

    let limits = adapter.limits();
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("carousel-device"),
        required_features: wgpu::Features::empty(),
        required_limits: limits,
        memory_hints: wgpu::MemoryHints::default(),
        trace: wgpu::Trace::default(),
    }))
    .map_err(Error::from)
    .context("failed to acquire GPU device")?;

    let size = window.inner_size();
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
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
    info!(
        width = config.width,
        height = config.height,
        format = ?config.format,
        "carousel surface configured",
    );

    let cards = CardRenderer::new(&device, &queue, format, &cfg.mesh, carousel.items());
    Ok(GpuState {
        surface,
        device,
        queue,
        config,
        cards,
    })
}

fn render(
    gpu: &GpuState,
    carousel: &Carousel,
    border_radius: f32,
    clear: wgpu::Color,
) -> FrameOutcome {
    let frame = match gpu.surface.get_current_texture() {
        Ok(frame) => frame,
        Err(SurfaceError::Outdated) | Err(SurfaceError::Lost) => {
            info!("carousel surface lost; reconfiguring");
            return FrameOutcome::Reconfigure;
        }
        Err(SurfaceError::OutOfMemory) => {
            error!("carousel surface out of memory; exiting event loop");
            return FrameOutcome::Fatal;
        }
        Err(SurfaceError::Timeout) => {
            warn!("carousel surface acquisition timed out");
            return FrameOutcome::Skipped;
        }
        Err(SurfaceError::Other) => {
            warn!("carousel surface reported an unknown error; retrying");
            return FrameOutcome::Reconfigure;
        }
    };

    let camera = carousel.camera();
    let view_proj = mat_mul(
        &perspective(
            camera.fov_degrees,
            carousel.viewport().aspect(),
            NEAR_PLANE,
            FAR_PLANE,
        ),
        &view_matrix(camera.distance),
    );
    gpu.cards
        .update(&gpu.queue, carousel.items(), &view_proj, border_radius);

    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("carousel-encoder"),
        });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("carousel-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        gpu.cards.draw(&mut pass);
    }
    gpu.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    FrameOutcome::Presented
}

/// Clear colours are linear; configured hex colours are sRGB.
fn clear_color(hex: &str) -> wgpu::Color {
    let rgba = parse_hex_color(hex).unwrap_or_else(|| {
        warn!(value = hex, "unparseable window background; using black");
        [0.0, 0.0, 0.0, 1.0]
    });
    let linear = |c: f32| -> f64 {
        let c = f64::from(c);
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: linear(rgba[0]),
        g: linear(rgba[1]),
        b: linear(rgba[2]),
        a: f64::from(rgba[3]),
    }
}

/// Open the carousel window and run it until it closes or `cancel` fires.
///
/// # Errors
/// Returns an error if the window, fonts or GPU cannot be set up, or if the
/// event loop itself fails.
pub fn run_windowed(cfg: Configuration, cancel: CancellationToken, glyph_mode: GlyphMode) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build carousel event loop")?;
    let proxy = event_loop.create_proxy();

    let cancel_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let _ = proxy.send_event(ViewerEvent::Cancelled);
        })
    };

    let mut app = ViewerApp::new(cfg, cancel, glyph_mode);
    let run_result = event_loop.run_app(&mut app);
    cancel_task.abort();

    if let Some(err) = app.setup_error.take() {
        return Err(err);
    }
    run_result.context("carousel event loop failed")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::carousel::Interaction;

    #[test]
    fn frame_task_reschedules_until_cancelled() {
        let mut task = FrameTask::default();
        assert!(!task.reschedule());
        task.start();
        assert!(task.reschedule());
        assert!(task.reschedule());
        assert!(task.cancel());
        assert!(!task.cancel());
        assert!(!task.reschedule());
        assert_eq!(task.frames(), 2);
    }

    fn mounted_app() -> ViewerApp {
        let cfg = Configuration::default();
        let mut app = ViewerApp::new(cfg.clone(), CancellationToken::new(), GlyphMode::Block);
        let mut generator = CardTextureGenerator::new(&cfg.card, 0.25, Box::new(BlockFace));
        let mut rng = StdRng::seed_from_u64(5);
        app.carousel = Some(Carousel::new(
            &cfg,
            PhysicalSize::new(1280, 550),
            &mut generator,
            &mut rng,
        ));
        app.input = Some(InputTranslator::new(1.0));
        app.frame_task.start();
        app
    }

    #[test]
    fn teardown_runs_each_step_once_in_order() {
        let mut app = mounted_app();
        let now = Instant::now();
        if let Some(carousel) = app.carousel.as_mut() {
            carousel.wheel(1.0, now);
            assert_eq!(carousel.interaction(), Interaction::PendingSnap);
        }

        let steps = app.teardown();
        assert_eq!(
            steps,
            [
                TeardownStep::StopFrames,
                TeardownStep::CancelSnap,
                TeardownStep::DetachInput,
                TeardownStep::ReleaseGpu,
            ]
        );
        assert!(!app.frame_task.is_active());
        assert!(!app.frame_task.reschedule());
        assert!(app.input.is_none());
        assert!(app.gpu.is_none());
        let carousel = app.carousel.as_mut().unwrap();
        assert!(carousel.is_torn_down());
        assert_eq!(carousel.interaction(), Interaction::Idle);
        assert!(carousel.tick(now + std::time::Duration::from_secs(1)).is_none());
    }

    #[test]
    fn second_teardown_is_a_no_op() {
        let mut app = mounted_app();
        assert_eq!(app.teardown().len(), 4);
        assert!(app.teardown().is_empty());
        assert!(app.teardown().is_empty());
        assert!(app.carousel.is_some());
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit_key(&Key::Named(NamedKey::Escape)));
        assert!(is_quit_key(&Key::Character("Q".into())));
        assert!(!is_quit_key(&Key::Character("w".into())));
    }

    #[test]
    fn background_is_linearised() {
        let white = clear_color("#ffffff");
        assert!((white.r - 1.0).abs() < 1e-9);
        let mid = clear_color("#808080");
        assert!(mid.g > 0.2 && mid.g < 0.23);
        assert_eq!(clear_color("bogus").a, 1.0);
    }
}
