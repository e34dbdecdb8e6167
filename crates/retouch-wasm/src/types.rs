//! WASM-compatible wrapper types for editor results.
//!
//! This module provides JavaScript-friendly types that wrap the core Retouch types,
//! handling the conversion between Rust and JavaScript data representations.

use retouch_core::{EditorSession, ExportOutput, Point};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// An encoded export for JavaScript.
///
/// `mime` names the format actually written, which is PNG whenever the
/// requested format failed or is unsupported. In that case `warning` holds a
/// message suitable for showing to the user.
#[wasm_bindgen]
pub struct JsExportResult {
    bytes: Vec<u8>,
    mime: String,
    warning: Option<String>,
}

#[wasm_bindgen]
impl JsExportResult {
    /// MIME type of the encoded bytes
    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.mime.clone()
    }

    /// Fallback notice, or `undefined` when the requested format was written
    #[wasm_bindgen(getter)]
    pub fn warning(&self) -> Option<String> {
        self.warning.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the encoded file as a Uint8Array.
    ///
    /// Note: This creates a copy of the data. Wrap it in a `Blob` with
    /// `mime` as the type to offer it for download.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl From<ExportOutput> for JsExportResult {
    fn from(output: ExportOutput) -> Self {
        Self {
            bytes: output.bytes,
            mime: output.mime.to_string(),
            warning: output.warning.map(|w| w.to_string()),
        }
    }
}

/// Snapshot of the on-screen view, for positioning overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct ViewInfo {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    /// Canvas size in pixels, zero without an image
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub animating: bool,
}

impl ViewInfo {
    pub(crate) fn from_session(session: &EditorSession) -> Self {
        let current = session.viewport().current();
        let (canvas_width, canvas_height) = session
            .view()
            .map(|view| view.canvas_size())
            .unwrap_or((0, 0));
        Self {
            zoom: current.zoom,
            pan_x: current.pan.x,
            pan_y: current.pan.y,
            canvas_width,
            canvas_height,
            animating: session.viewport().is_animating(),
        }
    }
}

/// Flatten a polygon into `[x0, y0, x1, y1, ...]` for a `Float64Array`.
pub(crate) fn flatten_points(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}
