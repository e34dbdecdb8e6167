//! The `Editor` class exposed to JavaScript.
//!
//! Wraps an [`EditorSession`] together with its canvas. Input handlers
//! update the session and redraw; zoom and pan changes are eased by
//! `requestAnimationFrame` callbacks. While a zoom eases, frames only
//! stretch the last render with CSS; pixels are rendered again once the
//! animation settles.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use retouch_core::{
    AdjustmentState, CropRequest, EditorConfig, EditorSession, FilterChain, FrameStream, Point,
    RenderError, RenderTarget,
};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::canvas::CanvasTarget;
use crate::frame::{FrameSink, RafScheduler};
use crate::types::{flatten_points, JsExportResult, ViewInfo};

/// A render target that can also be moved and stretched inside its container.
pub trait Surface: RenderTarget {
    /// Offset the surface centre by `pan` and scale it by `scale` about
    /// its centre.
    fn place(&mut self, pan: Point, scale: f64) -> Result<(), RenderError>;
}

impl Surface for CanvasTarget {
    fn place(&mut self, pan: Point, scale: f64) -> Result<(), RenderError> {
        self.apply_view(pan, scale)
    }
}

/// Session plus surface, shared with the frame callbacks.
pub struct EditorInner<S> {
    session: EditorSession,
    surface: S,
    /// Zoom of the last full draw; `None` forces a redraw
    drawn_zoom: Option<f64>,
}

impl<S: Surface> EditorInner<S> {
    pub fn new(session: EditorSession, surface: S) -> Self {
        Self {
            session,
            surface,
            drawn_zoom: None,
        }
    }

    /// Force a full redraw on the next present.
    fn invalidate(&mut self) {
        self.drawn_zoom = None;
    }

    /// Bring the surface up to date with the session.
    ///
    /// Pixels are rendered when the content changed, or when the zoom
    /// differs from the last render and no animation is running. Otherwise
    /// the surface is only moved and stretched.
    fn present(&mut self) -> Result<(), RenderError> {
        let current = self.session.viewport().current();
        let stale = match self.drawn_zoom {
            None => true,
            Some(zoom) => zoom != current.zoom && !self.session.viewport().is_animating(),
        };
        if stale {
            self.session.draw(&mut self.surface)?;
            self.drawn_zoom = Some(current.zoom);
        }
        let scale = self.drawn_zoom.map_or(1.0, |zoom| current.zoom / zoom);
        self.surface.place(current.pan, scale)
    }

    /// Apply a content edit and redraw.
    fn edit(&mut self, f: impl FnOnce(&mut EditorSession)) -> Result<(), RenderError> {
        f(&mut self.session);
        self.invalidate();
        self.present()
    }
}

impl<S: Surface> FrameSink for RefCell<EditorInner<S>> {
    fn on_frame(&self, stream: FrameStream) -> bool {
        let Ok(mut inner) = self.try_borrow_mut() else {
            tracing::warn!(?stream, "frame fired while the editor was busy");
            return false;
        };
        if inner.session.on_frame(stream) {
            if let Err(e) = inner.present() {
                tracing::warn!(error = %e, "frame redraw failed");
            }
        }
        true
    }
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Interactive image editor bound to a canvas.
///
/// # Example
///
/// ```typescript
/// const editor = new Editor(canvas, { history_limit: 100 });
/// editor.set_container_size(container.clientWidth, container.clientHeight);
/// editor.load(new Uint8Array(await file.arrayBuffer()), file.type);
/// editor.set_brightness(130);
/// const result = editor.export('image/jpeg', 0.9);
/// if (result.warning) showToast(result.warning);
/// ```
#[wasm_bindgen]
pub struct Editor {
    inner: Rc<RefCell<EditorInner<CanvasTarget>>>,
}

impl Editor {
    fn with<R>(&self, f: impl FnOnce(&mut EditorInner<CanvasTarget>) -> R) -> Result<R, JsValue> {
        let mut inner = self
            .inner
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("Editor is busy"))?;
        Ok(f(&mut *inner))
    }

    fn edit(&self, f: impl FnOnce(&mut EditorSession)) -> Result<(), JsValue> {
        self.with(|inner| inner.edit(f))?.map_err(js_error)
    }

    fn adjust(&self, f: impl FnOnce(&mut AdjustmentState)) -> Result<(), JsValue> {
        self.edit(|session| session.update_adjustments(f))
    }

    fn present(&self) -> Result<(), JsValue> {
        self.with(|inner| inner.present())?.map_err(js_error)
    }
}

#[wasm_bindgen]
impl Editor {
    /// Create an editor drawing onto `canvas`.
    ///
    /// `config` is an optional object in the shape of `EditorConfig`;
    /// missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: JsValue) -> Result<Editor, JsValue> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_error)?
        };

        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<EditorInner<CanvasTarget>>>| {
            let sink: Weak<dyn FrameSink> = weak.clone();
            let session = EditorSession::new(config, Box::new(RafScheduler::new(sink)), js_sys::Date::now);
            RefCell::new(EditorInner::new(session, CanvasTarget::new(canvas)))
        });
        Ok(Editor { inner })
    }

    // ===== Image =====

    /// Load an uploaded file.
    ///
    /// Returns `false` for file types other than JPEG and PNG; throws for
    /// corrupt data.
    pub fn load(&self, bytes: &[u8], mime: &str) -> Result<bool, JsValue> {
        let loaded = self.with(|inner| inner.session.load(bytes, mime))?.map_err(js_error)?;
        if loaded {
            self.with(|inner| inner.invalidate())?;
            self.present()?;
        }
        Ok(loaded)
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> Result<bool, JsValue> {
        self.with(|inner| inner.session.has_image())
    }

    // ===== Adjustments =====

    /// Current adjustments as a plain object.
    pub fn adjustments(&self) -> Result<JsValue, JsValue> {
        let adjustments = self.with(|inner| inner.session.adjustments())?;
        serde_wasm_bindgen::to_value(&adjustments).map_err(js_error)
    }

    /// Replace every adjustment at once. Values are clamped to their ranges.
    pub fn set_adjustments(&self, value: JsValue) -> Result<(), JsValue> {
        let adjustments: AdjustmentState = serde_wasm_bindgen::from_value(value).map_err(js_error)?;
        self.edit(|session| session.set_adjustments(adjustments))
    }

    pub fn set_brightness(&self, value: f32) -> Result<(), JsValue> {
        self.adjust(|a| a.brightness = value)
    }

    pub fn set_contrast(&self, value: f32) -> Result<(), JsValue> {
        self.adjust(|a| a.contrast = value)
    }

    pub fn set_saturation(&self, value: f32) -> Result<(), JsValue> {
        self.adjust(|a| a.saturation = value)
    }

    pub fn set_grayscale(&self, enabled: bool) -> Result<(), JsValue> {
        self.adjust(|a| a.grayscale = enabled)
    }

    pub fn set_sepia(&self, enabled: bool) -> Result<(), JsValue> {
        self.adjust(|a| a.sepia = enabled)
    }

    pub fn set_blur_radius(&self, value: f32) -> Result<(), JsValue> {
        self.adjust(|a| a.blur_radius = value)
    }

    pub fn set_sharpen_amount(&self, value: f32) -> Result<(), JsValue> {
        self.adjust(|a| a.sharpen_amount = value)
    }

    /// Rotate a quarter turn clockwise.
    pub fn rotate(&self) -> Result<(), JsValue> {
        self.edit(EditorSession::rotate)
    }

    pub fn flip_horizontal(&self) -> Result<(), JsValue> {
        self.edit(EditorSession::flip_horizontal)
    }

    pub fn flip_vertical(&self) -> Result<(), JsValue> {
        self.edit(EditorSession::flip_vertical)
    }

    pub fn reset_adjustments(&self) -> Result<(), JsValue> {
        self.edit(EditorSession::reset_adjustments)
    }

    /// The CSS `filter` equivalent of the current pixel filters.
    pub fn filter_css(&self) -> Result<String, JsValue> {
        self.with(|inner| FilterChain::from_params(&inner.session.adjustments().filter_params()).to_css())
    }

    // ===== History =====

    pub fn undo(&self) -> Result<bool, JsValue> {
        let mut moved = false;
        self.edit(|session| moved = session.undo())?;
        Ok(moved)
    }

    pub fn redo(&self) -> Result<bool, JsValue> {
        let mut moved = false;
        self.edit(|session| moved = session.redo())?;
        Ok(moved)
    }

    #[wasm_bindgen(getter)]
    pub fn can_undo(&self) -> Result<bool, JsValue> {
        self.with(|inner| inner.session.can_undo())
    }

    #[wasm_bindgen(getter)]
    pub fn can_redo(&self) -> Result<bool, JsValue> {
        self.with(|inner| inner.session.can_redo())
    }

    // ===== Viewport =====

    /// Zoom currently on screen.
    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> Result<f64, JsValue> {
        self.with(|inner| inner.session.viewport().current().zoom)
    }

    /// Zoom, pan and canvas size currently on screen as a plain object.
    pub fn view_state(&self) -> Result<JsValue, JsValue> {
        let info = self.with(|inner| ViewInfo::from_session(&inner.session))?;
        serde_wasm_bindgen::to_value(&info).map_err(js_error)
    }

    pub fn set_container_size(&self, width: f64, height: f64) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().set_container_size(width, height))?;
        self.present()
    }

    pub fn zoom_in(&self) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().zoom_in())
    }

    pub fn zoom_out(&self) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().zoom_out())
    }

    pub fn set_zoom(&self, zoom: f64) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().set_zoom(zoom))
    }

    /// Wheel zoom anchored at a container-relative cursor position.
    pub fn wheel(&self, delta_y: f64, x: f64, y: f64) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().wheel(delta_y, Point::new(x, y)))
    }

    pub fn fit_to_screen(&self) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().fit_to_screen())
    }

    /// Jump to zoom 1 with no pan, without animating.
    pub fn reset_view(&self) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().reset())?;
        self.present()
    }

    pub fn begin_drag(&self, x: f64, y: f64) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().begin_drag(Point::new(x, y)))
    }

    pub fn drag_to(&self, x: f64, y: f64) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().drag_to(Point::new(x, y)))
    }

    pub fn end_drag(&self) -> Result<(), JsValue> {
        self.with(|inner| inner.session.viewport_mut().end_drag())
    }

    /// Handle a `KeyboardEvent.key`. Returns `true` if the key was used.
    pub fn handle_key(&self, key: &str) -> Result<bool, JsValue> {
        self.with(|inner| inner.session.viewport_mut().handle_key(key))
    }

    // ===== Crop =====

    pub fn set_crop_active(&self, active: bool) -> Result<(), JsValue> {
        self.with(|inner| inner.session.set_crop_active(active))
    }

    pub fn crop_pointer_down(&self, x: f64, y: f64) -> Result<bool, JsValue> {
        self.with(|inner| inner.session.crop_pointer_down(Point::new(x, y)))
    }

    pub fn crop_pointer_move(&self, x: f64, y: f64) -> Result<(), JsValue> {
        self.with(|inner| inner.session.crop_pointer_move(Point::new(x, y)))
    }

    /// Finish a crop drag.
    ///
    /// Returns the selected region `{x, y, width, height}` in image pixels,
    /// or `null` when the selection was too small.
    pub fn crop_pointer_up(&self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        match self.with(|inner| inner.session.crop_pointer_up(Point::new(x, y)))? {
            Some(request) => serde_wasm_bindgen::to_value(&request).map_err(js_error),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn crop_pointer_leave(&self) -> Result<(), JsValue> {
        self.with(|inner| inner.session.crop_pointer_leave())
    }

    /// Canvas polygon of the selection being dragged as `[x0, y0, ..., x3, y3]`,
    /// empty when nothing is selected.
    pub fn crop_overlay(&self) -> Result<Vec<f64>, JsValue> {
        self.with(|inner| {
            inner
                .session
                .crop_overlay()
                .map(|quad| flatten_points(&quad))
                .unwrap_or_default()
        })
    }

    /// Canvas polygon of an image-space region, in the same layout as
    /// `crop_overlay`.
    pub fn region_overlay(&self, region: JsValue) -> Result<Vec<f64>, JsValue> {
        let request: CropRequest = serde_wasm_bindgen::from_value(region).map_err(js_error)?;
        self.with(|inner| {
            inner
                .session
                .region_overlay(&request)
                .map(|quad| flatten_points(&quad))
                .unwrap_or_default()
        })
    }

    /// Crop to an image-space region, baking every adjustment.
    pub fn apply_crop(&self, region: JsValue) -> Result<(), JsValue> {
        let request: CropRequest = serde_wasm_bindgen::from_value(region).map_err(js_error)?;
        self.with(|inner| inner.session.apply_crop(&request))?
            .map_err(js_error)?;
        self.with(|inner| inner.invalidate())?;
        self.present()
    }

    // ===== Output =====

    /// Redraw the canvas from scratch.
    pub fn render(&self) -> Result<(), JsValue> {
        self.with(|inner| inner.invalidate())?;
        self.present()
    }

    /// Encode the edited image.
    ///
    /// # Arguments
    ///
    /// * `mime` - `image/png` or `image/jpeg`; anything else falls back to PNG
    /// * `quality` - JPEG quality in (0, 1]; defaults to the configured value
    pub fn export(&self, mime: &str, quality: Option<f64>) -> Result<JsExportResult, JsValue> {
        self.with(|inner| inner.session.export(mime, quality))?
            .map(JsExportResult::from)
            .map_err(js_error)
    }

    /// Cancel pending frames and gestures. Call before discarding the editor.
    pub fn teardown(&self) -> Result<(), JsValue> {
        self.with(|inner| inner.session.teardown())
    }
}
