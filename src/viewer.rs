//! Standalone desktop window backed by winit.
//!
//! The window plays the canvas, its title plays the status label. The model
//! loads on a worker thread and reports back over a channel.
//!
//! ```no_run
//! # use modelview::Viewer;
//! # use modelview::loader::ModelSource;
//! Viewer::builder()
//!     .with_model(ModelSource::Gltf {
//!         path: "resources/horndølbrua_2.glb".into(),
//!         decoder: None,
//!     })
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::error::ViewerError;
use crate::loader::{LoadEvent, MeshDecoder, ModelLoader, ModelSource, NativeFetcher};
use crate::options::Options;
use crate::progress::{LoadProgress, StatusLabel};
use crate::renderer::MeshRenderer;
use crate::scene::Scene;
use crate::viewport::Viewport;
use crate::{InputEvent, MouseButton};

const SCROLL_PIXELS_PER_LINE: f32 = 100.0;

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    options: Options,
    decoder: Option<Box<dyn MeshDecoder>>,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            options: Options::default(),
            decoder: None,
            title: "modelview".into(),
        }
    }

    /// Which model to load.
    #[must_use]
    pub fn with_model(mut self, model: ModelSource) -> Self {
        self.options.model = model;
        self
    }

    /// Override the default options. Keeps a model set with
    /// [`with_model`](Self::with_model) only if called before it.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Register a decoder for compressed glTF primitives.
    #[must_use]
    pub fn with_mesh_decoder(mut self, decoder: Box<dyn MeshDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Set the window title prefix.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            options: self.options,
            decoder: self.decoder,
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window showing one model.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    options: Options,
    decoder: Option<Box<dyn MeshDecoder>>,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Viewer`] if the event loop cannot start.
    pub fn run(self) -> Result<(), ViewerError> {
        let event_loop = EventLoop::new().map_err(|e| ViewerError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut loader = ModelLoader::new();
        if let Some(decoder) = self.decoder {
            loader = loader.with_mesh_decoder(decoder);
        }
        let mut app = ViewerApp {
            window: None,
            renderer: None,
            viewport: None,
            options: Some(self.options),
            loader: Some(loader),
            title: self.title,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| ViewerError::Viewer(e.to_string()))
    }
}

/// Run `source` through `loader` on a named worker thread. Progress and the
/// result arrive on the returned channel.
///
/// # Errors
///
/// Returns [`ViewerError::ThreadSpawn`] if the thread cannot be started.
pub fn spawn_load(
    loader: ModelLoader,
    source: ModelSource,
) -> Result<Receiver<LoadEvent>, ViewerError> {
    let (tx, rx) = mpsc::channel();
    let _ = std::thread::Builder::new()
        .name("model-loader".into())
        .spawn(move || {
            let progress_tx = tx.clone();
            let mut forward = move |progress: LoadProgress| {
                let _ = progress_tx.send(LoadEvent::Progress(progress));
            };
            let result = pollster::block_on(loader.load(&NativeFetcher, &source, &mut forward));
            let _ = tx.send(LoadEvent::Finished(result));
        })
        .map_err(ViewerError::ThreadSpawn)?;
    Ok(rx)
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Window title as the status label.
struct TitleLabel<'a> {
    window: &'a Window,
    prefix: &'a str,
}

impl StatusLabel for TitleLabel<'_> {
    fn set_text(&mut self, text: &str) {
        log::info!("{text}");
        self.window.set_title(&format!("{} - {text}", self.prefix));
    }
}

struct ViewerApp {
    window: Option<Arc<Window>>,
    renderer: Option<MeshRenderer>,
    viewport: Option<Viewport>,
    options: Option<Options>,
    loader: Option<ModelLoader>,
    title: String,
}

fn window_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width, inner.height)
}

impl ViewerApp {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let options = self.options.take().unwrap_or_default();

        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next());
        let attrs = if let Some(mon) = &monitor {
            let mon_size = mon.size();
            let scale = mon.scale_factor();
            let logical_w = (f64::from(mon_size.width) / scale * 0.75) as u32;
            let logical_h = (f64::from(mon_size.height) / scale * 0.75) as u32;
            Window::default_attributes()
                .with_title(&self.title)
                .with_inner_size(winit::dpi::LogicalSize::new(logical_w, logical_h))
        } else {
            Window::default_attributes().with_title(&self.title)
        };
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| ViewerError::Viewer(e.to_string()))?,
        );

        let size = window_size(window.inner_size());
        let mut viewport = Viewport::new(options, Scene::new(), size);
        let renderer = pollster::block_on(MeshRenderer::new(
            window.clone(),
            size,
            &viewport.options().display,
            viewport.camera(),
        ))?;

        let loader = self.loader.take().unwrap_or_default();
        viewport.attach_load(spawn_load(loader, viewport.options().model.clone())?);

        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.viewport = Some(viewport);
        Ok(())
    }

    fn redraw(&mut self) {
        let (Some(window), Some(renderer), Some(viewport)) =
            (&self.window, &mut self.renderer, &mut self.viewport)
        else {
            return;
        };

        if let Some((width, height)) = viewport.prepare_frame(window_size(window.inner_size())) {
            renderer.resize(width, height);
        }
        if let Some(text) = viewport.take_status_text() {
            TitleLabel {
                window,
                prefix: &self.title,
            }
            .set_text(&text);
        }

        match renderer.render(viewport.scene(), viewport.camera()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                log::debug!("surface reconfigured");
            }
            Err(e) => log::error!("render error: {e:?}"),
        }
        window.request_redraw();
    }

    fn input(&mut self, event: InputEvent) {
        if let Some(viewport) = &mut self.viewport {
            viewport.handle_input(event);
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            log::error!("failed to start viewer: {e}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            WindowEvent::MouseInput { button, state, .. } => {
                self.input(InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed: state == ElementState::Pressed,
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.input(InputEvent::CursorMoved {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / SCROLL_PIXELS_PER_LINE,
                };
                self.input(InputEvent::Scroll { delta });
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.input(InputEvent::ModifiersChanged {
                    shift: modifiers.state().shift_key(),
                });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let (PhysicalKey::Code(code), Some(viewport)) =
                    (event.physical_key, &mut self.viewport)
                {
                    let _ = viewport.handle_key(&format!("{code:?}"));
                }
            }

            _ => (),
        }
    }
}
