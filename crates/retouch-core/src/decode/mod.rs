//! Upload boundary: turns browser file bytes into an [`ImageAsset`].
//!
//! Only JPEG and PNG are accepted. Anything else is ignored without an
//! error so that a stray drag-and-drop never disturbs the current session.
//!
//! All decoded assets are RGBA8 so that transparent PNGs survive and the
//! renderer can leave the corners of rotated canvases transparent.

mod types;
mod upload;

pub use types::{DecodeError, ImageAsset, Orientation, UploadFormat};
pub use upload::{decode_image, decode_upload, get_orientation};
