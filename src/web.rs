//! Browser host.
//!
//! Draws into the canvas with DOM id `c` and writes status text into the
//! element with id `l`. Uses the default [`Options`]; redraw is driven by
//! `requestAnimationFrame`, the model loads as a local future.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;

use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, WheelEvent};

use crate::input::{InputEvent, MouseButton};
use crate::loader::{HttpFetcher, LoadEvent, ModelLoader};
use crate::options::Options;
use crate::progress::{LoadProgress, StatusLabel};
use crate::renderer::MeshRenderer;
use crate::scene::Scene;
use crate::viewport::Viewport;

/// DOM id of the drawing canvas.
pub const CANVAS_ID: &str = "c";
/// DOM id of the status label.
pub const LABEL_ID: &str = "l";

const WHEEL_PIXELS_PER_NOTCH: f64 = 100.0;

/// Text content of a DOM element as the status label.
struct DomLabel(HtmlElement);

impl StatusLabel for DomLabel {
    fn set_text(&mut self, text: &str) {
        self.0.set_text_content(Some(text));
    }
}

struct WebApp {
    canvas: HtmlCanvasElement,
    label: DomLabel,
    renderer: MeshRenderer,
    viewport: Viewport,
    pixel_ratio: bool,
}

impl WebApp {
    /// Canvas CSS size in physical pixels.
    fn display_size(&self) -> (u32, u32) {
        let ratio = if self.pixel_ratio {
            web_sys::window().map_or(1.0, |w| w.device_pixel_ratio())
        } else {
            1.0
        };
        let width = (f64::from(self.canvas.client_width()) * ratio).round() as u32;
        let height = (f64::from(self.canvas.client_height()) * ratio).round() as u32;
        (width, height)
    }

    fn frame(&mut self) {
        if let Some((width, height)) = self.viewport.prepare_frame(self.display_size()) {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.renderer.resize(width, height);
        }
        if let Some(text) = self.viewport.take_status_text() {
            self.label.set_text(&text);
        }
        if let Err(e) = self.renderer.render(self.viewport.scene(), self.viewport.camera()) {
            log::warn!("frame skipped: {e:?}");
        }
    }
}

/// Entry point run when the module is instantiated.
///
/// # Errors
///
/// Never fails synchronously; start-up errors are logged.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::warn!("logger already initialised");
    }
    wasm_bindgen_futures::spawn_local(async {
        if let Err(e) = run().await {
            log::error!("failed to start viewer: {e:?}");
        }
    });
    Ok(())
}

fn element_by_id<T: JsCast>(id: &str) -> Result<T, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .ok_or_else(|| JsValue::from_str(&format!("no element with id `{id}`")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element `{id}` has the wrong type")))
}

async fn run() -> Result<(), JsValue> {
    let canvas: HtmlCanvasElement = element_by_id(CANVAS_ID)?;
    let label = DomLabel(element_by_id(LABEL_ID)?);
    let options = Options::default();

    let backing = (canvas.width(), canvas.height());
    let mut viewport = Viewport::new(options, Scene::new(), backing);
    let renderer = MeshRenderer::new(
        wgpu::SurfaceTarget::Canvas(canvas.clone()),
        backing,
        &viewport.options().display,
        viewport.camera(),
    )
    .await
    .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let (tx, rx) = mpsc::channel();
    viewport.attach_load(rx);
    let source = viewport.options().model.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let progress_tx = tx.clone();
        let mut forward = move |progress: LoadProgress| {
            let _ = progress_tx.send(LoadEvent::Progress(progress));
        };
        let result = ModelLoader::new()
            .load(&HttpFetcher, &source, &mut forward)
            .await;
        let _ = tx.send(LoadEvent::Finished(result));
    });

    let pixel_ratio = viewport.options().display.use_device_pixel_ratio;
    let app = Rc::new(RefCell::new(WebApp {
        canvas: canvas.clone(),
        label,
        renderer,
        viewport,
        pixel_ratio,
    }));
    attach_input(&canvas, &app)?;
    start_animation_loop(app)
}

fn input_closure<E: JsCast + 'static>(
    app: &Rc<RefCell<WebApp>>,
    mut f: impl FnMut(&mut WebApp, E) + 'static,
) -> Closure<dyn FnMut(E)>
where
    E: wasm_bindgen::convert::FromWasmAbi,
{
    let app = app.clone();
    Closure::wrap(Box::new(move |event: E| {
        if let Ok(mut app) = app.try_borrow_mut() {
            f(&mut app, event);
        }
    }) as Box<dyn FnMut(E)>)
}

fn listen<E>(
    target: &web_sys::EventTarget,
    kind: &str,
    closure: Closure<dyn FnMut(E)>,
) -> Result<(), JsValue>
where
    E: wasm_bindgen::convert::FromWasmAbi + 'static,
{
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

fn pointer_event(app: &mut WebApp, event: &MouseEvent) {
    let ratio = if app.pixel_ratio {
        web_sys::window().map_or(1.0, |w| w.device_pixel_ratio())
    } else {
        1.0
    };
    app.viewport.handle_input(InputEvent::ModifiersChanged {
        shift: event.shift_key(),
    });
    app.viewport.handle_input(InputEvent::CursorMoved {
        x: (f64::from(event.offset_x()) * ratio) as f32,
        y: (f64::from(event.offset_y()) * ratio) as f32,
    });
}

fn attach_input(canvas: &HtmlCanvasElement, app: &Rc<RefCell<WebApp>>) -> Result<(), JsValue> {
    let target: &web_sys::EventTarget = canvas;

    listen(
        target,
        "mousedown",
        input_closure(app, |app, event: MouseEvent| {
            pointer_event(app, &event);
            if let Some(button) = MouseButton::from_dom_index(event.button()) {
                app.viewport.handle_input(InputEvent::MouseButton {
                    button,
                    pressed: true,
                });
            }
        }),
    )?;
    listen(
        target,
        "mousemove",
        input_closure(app, |app, event: MouseEvent| pointer_event(app, &event)),
    )?;
    let release = |app: &mut WebApp, event: MouseEvent| {
        if let Some(button) = MouseButton::from_dom_index(event.button()) {
            app.viewport.handle_input(InputEvent::MouseButton {
                button,
                pressed: false,
            });
        }
    };
    listen(target, "mouseup", input_closure(app, release))?;
    listen(target, "mouseleave", input_closure(app, release))?;
    listen(
        target,
        "wheel",
        input_closure(app, |app, event: WheelEvent| {
            event.prevent_default();
            let delta = -event.delta_y() / WHEEL_PIXELS_PER_NOTCH;
            app.viewport.handle_input(InputEvent::Scroll {
                delta: delta as f32,
            });
        }),
    )?;
    listen(
        target,
        "contextmenu",
        input_closure(app, |_, event: MouseEvent| event.prevent_default()),
    )?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    listen(
        &window,
        "keydown",
        input_closure(app, |app, event: KeyboardEvent| {
            if !event.repeat() && app.viewport.handle_key(&event.code()) {
                event.prevent_default();
            }
        }),
    )
}

fn request_frame(callback: &Closure<dyn FnMut()>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let _ = window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    Ok(())
}

fn start_animation_loop(app: Rc<RefCell<WebApp>>) -> Result<(), JsValue> {
    let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let next = callback.clone();
    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        app.borrow_mut().frame();
        if let Some(cb) = next.borrow().as_ref() {
            if let Err(e) = request_frame(cb) {
                log::error!("requestAnimationFrame failed: {e:?}");
            }
        }
    }) as Box<dyn FnMut()>));

    let started = match callback.borrow().as_ref() {
        Some(cb) => request_frame(cb),
        None => Err(JsValue::from_str("animation callback missing")),
    };
    started
}
