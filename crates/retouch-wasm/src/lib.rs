//! Retouch WASM - WebAssembly bindings for Retouch
//!
//! This crate exposes the retouch-core editor to JavaScript/TypeScript
//! applications and wires it to the browser: a `<canvas>` render target,
//! `requestAnimationFrame` for zoom/pan easing, and console logging.
//!
//! # Module Structure
//!
//! - `editor` - The `Editor` class wrapping an editing session
//! - `canvas` - Canvas render target
//! - `frame` - `requestAnimationFrame` frame scheduler
//! - `logging` - `tracing` subscriber writing to the browser console
//! - `types` - WASM-compatible wrapper types for results
//!
//! # Usage
//!
//! ```typescript
//! import init, { Editor } from '@retouch/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new Editor(canvas, undefined);
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! if (!editor.load(bytes, file.type)) {
//!   console.warn('unsupported file type');
//! }
//! ```

use wasm_bindgen::prelude::*;

mod canvas;
mod editor;
mod frame;
mod logging;
mod types;

// Re-export public types
pub use canvas::CanvasTarget;
pub use editor::Editor;
pub use frame::{FrameSink, RafScheduler};
pub use types::JsExportResult;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logging::init();
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    retouch_core::VERSION.to_string()
}
