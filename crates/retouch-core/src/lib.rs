//! Retouch Core - raster image editor engine
//!
//! This crate provides the browser-independent core of the Retouch editor:
//! coordinate-space math for zoom, rotation and flips, the cached filter
//! pipeline, headless view rendering, the crop engine, the zoom/pan
//! controller, undo history, and the upload and export boundaries.
//!
//! [`EditorSession`] ties these together; the individual modules are usable
//! on their own.

pub mod cache;
pub mod config;
pub mod crop;
pub mod decode;
pub mod encode;
pub mod filter;
pub mod history;
pub mod luminance;
pub mod render;
pub mod session;
pub mod state;
pub mod transform;
pub mod viewport;

pub use cache::ProcessedImageCache;
pub use config::{ConfigError, EditorConfig, ExportConfig, ViewportConfig};
pub use crop::{bake_crop, overlay_polygon, CropError, CropTool};
pub use decode::{decode_upload, DecodeError, ImageAsset};
pub use encode::{export_image, EncodeError, ExportFormat, ExportOutput, ExportWarning};
pub use filter::{FilterChain, FilterEffect};
pub use history::{History, HistoryEntry};
pub use render::{FrameBuffer, InterpolationFilter, RenderError, RenderTarget, Renderer};
pub use session::EditorSession;
pub use state::{AdjustmentState, CropRequest, FilterParams, ViewportState};
pub use transform::{display_size, rotated_bounds, Point, ViewTransform};
pub use viewport::{FrameHandle, FrameScheduler, FrameStream, ManualScheduler, ViewportController};

/// Crate version, as reported to the host page.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
