//! `<canvas>` render target.

use retouch_core::{ImageAsset, Point, RenderError, RenderTarget};
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

/// CSS `transform` placing the canvas at `pan` from the container centre,
/// stretched by `scale` about its own centre.
///
/// The canvas is expected to be absolutely positioned at the container
/// centre. `scale` is 1 except while a zoom animation runs ahead of the
/// last full render.
pub fn view_transform_css(pan: Point, scale: f64) -> String {
    format!(
        "translate(calc(-50% + {}px), calc(-50% + {}px)) scale({})",
        pan.x, pan.y, scale
    )
}

fn context_error(what: &str, err: JsValue) -> RenderError {
    RenderError::ContextUnavailable(format!("{what}: {err:?}"))
}

/// Presents frames on a canvas element via `putImageData`.
///
/// The 2D context is acquired on first use and kept afterwards.
pub struct CanvasTarget {
    canvas: HtmlCanvasElement,
    context: Option<CanvasRenderingContext2d>,
}

impl CanvasTarget {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self {
            canvas,
            context: None,
        }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn context(&mut self) -> Result<&CanvasRenderingContext2d, RenderError> {
        if self.context.is_none() {
            let context = self
                .canvas
                .get_context("2d")
                .map_err(|e| context_error("getContext failed", e))?
                .ok_or_else(|| RenderError::ContextUnavailable("no 2d context".to_string()))?
                .dyn_into::<CanvasRenderingContext2d>()
                .map_err(|_| RenderError::ContextUnavailable("not a 2d context".to_string()))?;
            self.context = Some(context);
        }
        self.context
            .as_ref()
            .ok_or_else(|| RenderError::ContextUnavailable("no 2d context".to_string()))
    }

    /// Position and stretch the canvas inside its container.
    pub fn apply_view(&self, pan: Point, scale: f64) -> Result<(), RenderError> {
        self.canvas
            .style()
            .set_property("transform", &view_transform_css(pan, scale))
            .map_err(|e| context_error("style update failed", e))
    }
}

impl RenderTarget for CanvasTarget {
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        // Acquire the context first so a failure leaves the canvas untouched
        self.context()?;
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        let (width, height) = (self.canvas.width() as f64, self.canvas.height() as f64);
        self.context()?.clear_rect(0.0, 0.0, width, height);
        Ok(())
    }

    fn put_frame(&mut self, frame: &ImageAsset) -> Result<(), RenderError> {
        if frame.is_empty() {
            return Ok(());
        }
        let data = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(frame.pixels.as_slice()),
            frame.width,
            frame.height,
        )
        .map_err(|e| context_error("ImageData creation failed", e))?;

        self.context()?
            .put_image_data(&data, 0.0, 0.0)
            .map_err(|e| context_error("putImageData failed", e))
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn canvas() -> HtmlCanvasElement {
        web_sys::window()
            .unwrap()
            .document()
            .unwrap()
            .create_element("canvas")
            .unwrap()
            .dyn_into()
            .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_resize_and_put_frame() {
        let mut target = CanvasTarget::new(canvas());
        target.resize(3, 2).unwrap();
        target.clear().unwrap();
        target
            .put_frame(&ImageAsset::new(3, 2, vec![200; 24]))
            .unwrap();
        assert_eq!(target.canvas().width(), 3);
        assert_eq!(target.canvas().height(), 2);
    }
}
