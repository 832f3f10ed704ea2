//! Browser entry point.
//!
//! `start` wires a canvas to a [`Viewer`]: window `mousemove` and `resize`
//! listeners, asset startup on the local executor and a
//! `requestAnimationFrame` loop. Everything runs on the main thread, so the
//! viewer is shared as `Rc<RefCell<_>>` and never borrowed across an await.

mod fetch;

pub use fetch::FetchSource;

use crate::app::{load_assets, FrameDriver, Viewer};
use crate::config::ViewerConfig;
use crate::core::Context;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{window, HtmlCanvasElement, MouseEvent, Window};

const DEFAULT_CANVAS_ID: &str = "canvas";

/// Install the panic hook and route `log` to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already installed".into());
    }
}

fn window_size(window: &Window) -> (u32, u32) {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (width as u32, height as u32)
}

fn sync_canvas(canvas: &HtmlCanvasElement, viewer: &Viewer) {
    let (width, height) = viewer.renderer().drawing_buffer_size();
    canvas.set_width(width);
    canvas.set_height(height);
}

fn request_animation_frame(callback: &Closure<dyn FnMut()>) {
    let Some(window) = window() else {
        return;
    };
    if let Err(e) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {:?}", e);
    }
}

/// Start the viewer on the canvas with id `canvas_id` (default `canvas`).
///
/// `config_json` optionally overrides [`ViewerConfig`] defaults.
#[wasm_bindgen]
pub async fn start(canvas_id: Option<String>, config_json: Option<String>) -> Result<(), JsValue> {
    let canvas_id = canvas_id.unwrap_or_else(|| DEFAULT_CANVAS_ID.to_string());
    let config = match config_json {
        Some(json) => ViewerConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => ViewerConfig::default(),
    };

    let window = window().ok_or_else(|| JsValue::from_str("No window object"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("Canvas '{}' not found", canvas_id)))?
        .dyn_into()
        .map_err(|_| JsValue::from_str("Element is not a canvas"))?;

    let (width, height) = window_size(&window);
    let mut viewer = Viewer::new(config, width, height, window.device_pixel_ratio() as f32);
    sync_canvas(&canvas, &viewer);

    let (buffer_width, buffer_height) = viewer.renderer().drawing_buffer_size();
    let context = Context::new(
        wgpu::SurfaceTarget::Canvas(canvas.clone()),
        buffer_width,
        buffer_height,
        viewer.renderer().config(),
    )
    .await
    .map_err(|e| JsValue::from_str(&e.to_string()))?;
    viewer.attach_context(context);

    let viewer = Rc::new(RefCell::new(viewer));

    {
        let viewer = Rc::clone(&viewer);
        let on_move = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            viewer
                .borrow_mut()
                .on_pointer_move(event.client_x() as f32, event.client_y() as f32);
        });
        window.add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())?;
        on_move.forget();
    }

    {
        let viewer = Rc::clone(&viewer);
        let on_resize = Closure::<dyn FnMut()>::new(move || {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = window_size(&window);
            let mut viewer = viewer.borrow_mut();
            viewer.on_resize(width, height, window.device_pixel_ratio() as f32);
            sync_canvas(&canvas, &viewer);
        });
        window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
        on_resize.forget();
    }

    {
        let viewer = Rc::clone(&viewer);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = load_assets(&viewer, &FetchSource::new()).await {
                log::warn!("startup incomplete: {e}");
            }
        });
    }

    let frame: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&frame);
    let mut driver = FrameDriver::forever();
    *frame.borrow_mut() = Some(Closure::new(move || {
        driver.tick(&mut *viewer.borrow_mut());
        if let Some(callback) = next.borrow().as_ref() {
            request_animation_frame(callback);
        }
    }));
    if let Some(callback) = frame.borrow().as_ref() {
        request_animation_frame(callback);
    }

    log::info!("{} {} started on #{}", crate::NAME, crate::VERSION, canvas_id);
    Ok(())
}
