//! Editor session: the single owner of editor state.
//!
//! Wires the upload boundary, adjustments, processed-image cache, renderer,
//! crop engine, viewport and history together. Every user-visible edit goes
//! through here so history and the cache stay consistent.

use std::rc::Rc;

use crate::cache::ProcessedImageCache;
use crate::config::EditorConfig;
use crate::crop::{bake_crop, overlay_polygon, CropError, CropTool};
use crate::decode::{decode_upload, DecodeError, ImageAsset};
use crate::encode::{export_image, EncodeError, ExportFormat, ExportOutput};
use crate::history::{Clock, History};
use crate::render::{render_unzoomed, InterpolationFilter, RenderError, RenderTarget, Renderer};
use crate::state::{AdjustmentState, CropRequest};
use crate::transform::{Point, ViewTransform};
use crate::viewport::{FrameScheduler, FrameStream, ViewportController};

/// Interpolation for the zoom-1 render behind exports.
const EXPORT_FILTER: InterpolationFilter = InterpolationFilter::Lanczos3;

#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    asset: Option<Rc<ImageAsset>>,
    adjustments: AdjustmentState,
    cache: ProcessedImageCache,
    renderer: Renderer,
    crop: CropTool,
    viewport: ViewportController,
    history: History,
}

impl EditorSession {
    /// Create an empty session.
    ///
    /// # Arguments
    ///
    /// * `config` - Editor tunables
    /// * `scheduler` - Frame source for viewport animation
    /// * `clock` - Timestamp source for history entries
    pub fn new(config: EditorConfig, scheduler: Box<dyn FrameScheduler>, clock: Clock) -> Self {
        let config = config.sanitized();
        Self {
            asset: None,
            adjustments: AdjustmentState::default(),
            cache: ProcessedImageCache::new(),
            renderer: Renderer::new(InterpolationFilter::Bilinear),
            crop: CropTool::new(config.min_crop_size),
            viewport: ViewportController::new(config.viewport, scheduler),
            history: History::new(config.history_limit, clock),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ===== Image =====

    /// Decode an upload and make it the current image.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if the MIME type is not accepted; the session is left
    /// untouched. `Ok(true)` once the new image is loaded.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` for corrupt data of an accepted type. The
    /// session is left untouched.
    pub fn load(&mut self, bytes: &[u8], mime: &str) -> Result<bool, DecodeError> {
        match decode_upload(bytes, mime)? {
            Some(asset) => {
                self.load_asset(asset);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace the current image, resetting adjustments, zoom and history.
    pub fn load_asset(&mut self, asset: ImageAsset) {
        let asset = Rc::new(asset);
        tracing::info!(width = asset.width, height = asset.height, "image loaded");

        self.adjustments = AdjustmentState::default();
        self.cache.invalidate();
        self.crop.pointer_leave();
        self.history.clear();
        self.history.push(Rc::clone(&asset), self.adjustments);
        self.viewport.set_content(asset.width, asset.height, 0);
        self.viewport.reset();
        self.asset = Some(asset);
    }

    pub fn has_image(&self) -> bool {
        self.asset.is_some()
    }

    pub fn asset(&self) -> Option<&Rc<ImageAsset>> {
        self.asset.as_ref()
    }

    // ===== Adjustments =====

    pub fn adjustments(&self) -> AdjustmentState {
        self.adjustments
    }

    /// Replace the adjustments, recording a history entry if anything changed.
    ///
    /// Values are clamped into their valid ranges. Ignored without an image.
    pub fn set_adjustments(&mut self, adjustments: AdjustmentState) {
        let Some(asset) = &self.asset else {
            return;
        };
        let next = adjustments.clamped();
        if next == self.adjustments {
            return;
        }

        let rotated = next.rotation_degrees != self.adjustments.rotation_degrees;
        self.adjustments = next;
        self.history.push(Rc::clone(asset), next);
        if rotated {
            self.viewport
                .set_content(asset.width, asset.height, next.rotation_degrees);
        }
    }

    /// Edit the adjustments in place.
    pub fn update_adjustments(&mut self, edit: impl FnOnce(&mut AdjustmentState)) {
        let mut next = self.adjustments;
        edit(&mut next);
        self.set_adjustments(next);
    }

    pub fn rotate(&mut self) {
        self.update_adjustments(AdjustmentState::rotate_clockwise);
    }

    pub fn flip_horizontal(&mut self) {
        self.update_adjustments(|s| s.flip_horizontal = !s.flip_horizontal);
    }

    pub fn flip_vertical(&mut self) {
        self.update_adjustments(|s| s.flip_vertical = !s.flip_vertical);
    }

    /// Restore brightness, contrast and saturation.
    pub fn reset_adjustments(&mut self) {
        self.update_adjustments(AdjustmentState::reset_color);
    }

    // ===== History =====

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one edit. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo() else {
            return false;
        };
        let (asset, adjustments) = (Rc::clone(&entry.asset), entry.adjustments);
        self.restore(asset, adjustments);
        true
    }

    /// Step forward one edit. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo() else {
            return false;
        };
        let (asset, adjustments) = (Rc::clone(&entry.asset), entry.adjustments);
        self.restore(asset, adjustments);
        true
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn restore(&mut self, asset: Rc<ImageAsset>, adjustments: AdjustmentState) {
        self.viewport
            .set_content(asset.width, asset.height, adjustments.rotation_degrees);
        self.adjustments = adjustments;
        self.asset = Some(asset);
        self.crop.pointer_leave();
    }

    // ===== Rendering =====

    /// The filtered bitmap for the current state, from cache when possible.
    pub fn processed(&mut self) -> Option<Rc<ImageAsset>> {
        let asset = self.asset.as_ref()?;
        Some(self.cache.get_processed(asset, &self.adjustments))
    }

    /// How many times filters have been applied.
    pub fn filter_render_count(&self) -> u64 {
        self.cache.render_count()
    }

    /// The transform for the view currently on screen.
    pub fn view(&self) -> Option<ViewTransform> {
        let asset = self.asset.as_ref()?;
        Some(ViewTransform::new(
            asset.width,
            asset.height,
            &self.adjustments,
            self.viewport.current().zoom,
        ))
    }

    /// Draw the current view onto a target.
    ///
    /// # Returns
    ///
    /// The transform that was drawn, or `None` without an image.
    ///
    /// # Errors
    ///
    /// Propagates `RenderError` from the target. Editor state is never
    /// modified by a failed draw.
    pub fn draw<T: RenderTarget + ?Sized>(&mut self, target: &mut T) -> Result<Option<ViewTransform>, RenderError> {
        let Some(processed) = self.processed() else {
            return Ok(None);
        };
        let zoom = self.viewport.current().zoom;
        self.renderer
            .draw(target, &processed, &self.adjustments, zoom)
            .map(Some)
    }

    // ===== Viewport =====

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    /// Forward a fired frame to the viewport.
    ///
    /// # Returns
    ///
    /// `true` if the view changed and should be redrawn.
    pub fn on_frame(&mut self, stream: FrameStream) -> bool {
        self.viewport.on_frame(stream)
    }

    // ===== Crop =====

    pub fn crop_tool(&self) -> &CropTool {
        &self.crop
    }

    pub fn set_crop_active(&mut self, active: bool) {
        self.crop.set_active(active);
    }

    /// Start a crop drag at a container-relative pointer position.
    pub fn crop_pointer_down(&mut self, pointer: Point) -> bool {
        let Some(view) = self.view() else {
            return false;
        };
        let display = self.viewport.container_to_display(pointer);
        self.crop.pointer_down(&view, display)
    }

    pub fn crop_pointer_move(&mut self, pointer: Point) {
        if let Some(view) = self.view() {
            let display = self.viewport.container_to_display(pointer);
            self.crop.pointer_move(&view, display);
        }
    }

    /// Finish a crop drag, returning the selection if it is large enough.
    pub fn crop_pointer_up(&mut self, pointer: Point) -> Option<CropRequest> {
        let Some(view) = self.view() else {
            self.crop.pointer_leave();
            return None;
        };
        let display = self.viewport.container_to_display(pointer);
        self.crop.pointer_up(&view, display)
    }

    pub fn crop_pointer_leave(&mut self) {
        self.crop.pointer_leave();
    }

    /// Canvas polygon of the selection being dragged.
    pub fn crop_overlay(&self) -> Option<[Point; 4]> {
        let view = self.view()?;
        self.crop.overlay(&view)
    }

    /// Canvas polygon of an arbitrary image-space region.
    pub fn region_overlay(&self, request: &CropRequest) -> Option<[Point; 4]> {
        Some(overlay_polygon(&self.view()?, request))
    }

    /// Bake the current view and replace the image with the cropped region.
    ///
    /// On success adjustments return to identity, the crop is recorded in
    /// history and zoom returns to 1.
    ///
    /// # Errors
    ///
    /// Returns `CropError::InvalidRegion` for a region with no area inside
    /// the image and `CropError::NoImage` without an image. The session is
    /// unchanged on error.
    pub fn apply_crop(&mut self, request: &CropRequest) -> Result<(), CropError> {
        let processed = self.processed().ok_or(CropError::NoImage)?;
        let cropped = bake_crop(&processed, &self.adjustments, request, self.renderer.filter())?;

        let asset = Rc::new(cropped);
        self.adjustments = AdjustmentState::default();
        self.history.push(Rc::clone(&asset), self.adjustments);
        self.viewport.set_content(asset.width, asset.height, 0);
        self.viewport.reset();
        self.crop.set_active(false);

        tracing::info!(width = asset.width, height = asset.height, "crop applied");
        self.asset = Some(asset);
        Ok(())
    }

    // ===== Export =====

    /// Encode the current image with filters and geometry baked in.
    ///
    /// # Arguments
    ///
    /// * `mime` - Requested MIME type; empty selects PNG
    /// * `quality` - JPEG quality in (0, 1]; `None` uses the configured default
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::ExportFailed` without an image or when PNG
    /// encoding fails.
    pub fn export(&mut self, mime: &str, quality: Option<f64>) -> Result<ExportOutput, EncodeError> {
        let processed = self
            .processed()
            .ok_or_else(|| EncodeError::ExportFailed("no image loaded".to_string()))?;
        let (raster, _) = render_unzoomed(&processed, &self.adjustments, EXPORT_FILTER);

        export_image(
            &raster,
            &ExportFormat::from_mime(mime),
            quality,
            self.config.export.jpeg_quality,
        )
    }

    /// Cancel pending frames and abandon gestures.
    pub fn teardown(&mut self) {
        self.viewport.teardown();
        self.crop.pointer_leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FrameBuffer;
    use crate::viewport::ManualScheduler;

    fn clock() -> f64 {
        0.0
    }

    fn session() -> EditorSession {
        EditorSession::new(EditorConfig::default(), Box::new(ManualScheduler::new()), clock)
    }

    fn uniform(width: u32, height: u32, value: u8) -> ImageAsset {
        ImageAsset::new(width, height, [value, value, value, 255].repeat((width * height) as usize))
    }

    fn loaded(width: u32, height: u32) -> EditorSession {
        let mut s = session();
        s.load_asset(uniform(width, height, 100));
        s
    }

    #[test]
    fn test_empty_session() {
        let mut s = session();
        assert!(!s.has_image());
        assert!(s.processed().is_none());
        assert!(!s.undo());
        assert_eq!(s.draw(&mut FrameBuffer::new()), Ok(None));
        assert_eq!(s.apply_crop(&CropRequest { x: 0.0, y: 0.0, width: 20.0, height: 20.0 }), Err(CropError::NoImage));
        assert!(matches!(s.export("", None), Err(EncodeError::ExportFailed(_))));
    }

    #[test]
    fn test_unsupported_upload_is_ignored() {
        let mut s = loaded(10, 10);
        let before = Rc::clone(s.asset().unwrap());
        assert!(!s.load(b"GIF89a", "image/gif").unwrap());
        assert!(Rc::ptr_eq(s.asset().unwrap(), &before));
    }

    #[test]
    fn test_corrupt_upload_keeps_state() {
        let mut s = loaded(10, 10);
        s.update_adjustments(|a| a.brightness = 120.0);
        assert!(s.load(&[1, 2, 3], "image/png").is_err());
        assert_eq!(s.adjustments().brightness, 120.0);
    }

    #[test]
    fn test_set_adjustments_records_history() {
        let mut s = loaded(10, 10);
        assert!(!s.can_undo());
        s.update_adjustments(|a| a.contrast = 150.0);
        assert!(s.can_undo());
        // Unchanged values do not add entries
        s.update_adjustments(|a| a.contrast = 150.0);
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn test_adjustments_are_clamped() {
        let mut s = loaded(10, 10);
        s.update_adjustments(|a| a.brightness = 900.0);
        assert_eq!(s.adjustments().brightness, 200.0);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut s = loaded(10, 10);
        s.update_adjustments(|a| a.saturation = 0.0);
        s.rotate();
        s.flip_horizontal();
        let edited = s.adjustments();

        assert!(s.undo());
        assert!(s.undo());
        assert!(s.undo());
        assert!(s.adjustments().is_identity());
        assert!(!s.undo());

        assert!(s.redo());
        assert!(s.redo());
        assert!(s.redo());
        assert_eq!(s.adjustments(), edited);
        assert!(!s.redo());
    }

    #[test]
    fn test_reset_adjustments_keeps_geometry() {
        let mut s = loaded(10, 10);
        s.update_adjustments(|a| a.brightness = 50.0);
        s.rotate();
        s.reset_adjustments();
        assert_eq!(s.adjustments().brightness, 100.0);
        assert_eq!(s.adjustments().rotation_degrees, 90);
    }

    #[test]
    fn test_geometry_edits_reuse_processed_bitmap() {
        let mut s = loaded(20, 10);
        s.update_adjustments(|a| a.brightness = 130.0);
        let mut target = FrameBuffer::new();
        s.draw(&mut target).unwrap();
        assert_eq!(s.filter_render_count(), 1);

        s.rotate();
        s.flip_vertical();
        s.viewport_mut().zoom_in();
        s.draw(&mut target).unwrap();
        assert_eq!(s.filter_render_count(), 1);

        s.update_adjustments(|a| a.sepia = true);
        s.draw(&mut target).unwrap();
        assert_eq!(s.filter_render_count(), 2);
    }

    #[test]
    fn test_draw_sizes_target_by_rotation() {
        let mut s = loaded(20, 10);
        s.rotate();
        let mut target = FrameBuffer::new();
        let view = s.draw(&mut target).unwrap().unwrap();
        assert_eq!(view.canvas_size(), (10, 20));
        assert_eq!(target.size(), (10, 20));
    }

    #[test]
    fn test_crop_gesture_through_session() {
        let mut s = loaded(200, 100);
        s.viewport_mut().set_container_size(400.0, 300.0);
        s.set_crop_active(true);

        // Canvas sits at (100, 100) inside the container
        assert!(s.crop_pointer_down(Point::new(120.0, 110.0)));
        s.crop_pointer_move(Point::new(150.0, 150.0));
        assert!(s.crop_overlay().is_some());
        let req = s.crop_pointer_up(Point::new(180.0, 160.0)).unwrap();
        assert_eq!((req.x, req.y, req.width, req.height), (20.0, 10.0, 60.0, 50.0));
        assert!(s.crop_overlay().is_none());
    }

    #[test]
    fn test_invalid_crop_leaves_state() {
        let mut s = loaded(50, 50);
        s.update_adjustments(|a| a.brightness = 150.0);
        let before = Rc::clone(s.asset().unwrap());
        let req = CropRequest {
            x: 500.0,
            y: 500.0,
            width: 20.0,
            height: 20.0,
        };
        assert_eq!(s.apply_crop(&req), Err(CropError::InvalidRegion));
        assert!(Rc::ptr_eq(s.asset().unwrap(), &before));
        assert_eq!(s.adjustments().brightness, 150.0);
    }

    #[test]
    fn test_brighten_rotate_crop_end_to_end() {
        let mut s = loaded(800, 600);
        s.update_adjustments(|a| a.brightness = 150.0);
        s.rotate();
        s.viewport_mut().set_zoom(2.0);

        let req = CropRequest {
            x: 100.0,
            y: 100.0,
            width: 200.0,
            height: 150.0,
        };
        s.apply_crop(&req).unwrap();

        let asset = s.asset().unwrap();
        assert_eq!((asset.width, asset.height), (150, 200));
        assert!(asset.pixels.chunks_exact(4).all(|p| p == [150, 150, 150, 255]));
        assert!(s.adjustments().is_identity());
        assert_eq!(s.viewport().current().zoom, 1.0);
        assert_eq!(s.viewport().target().zoom, 1.0);
        assert_eq!(s.history().len(), 4);

        // Undo brings back the uncropped image with its adjustments
        assert!(s.undo());
        assert_eq!(s.asset().unwrap().width, 800);
        assert_eq!(s.adjustments().rotation_degrees, 90);
    }

    #[test]
    fn test_export_png_and_jpeg() {
        let mut s = loaded(30, 20);
        s.rotate();

        let png = s.export("image/png", None).unwrap();
        assert!(png.warning.is_none());
        let decoded = image::load_from_memory(&png.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 30));

        let jpeg = s.export("image/jpeg", Some(0.8)).unwrap();
        assert_eq!(jpeg.mime, "image/jpeg");
    }

    #[test]
    fn test_export_unsupported_falls_back() {
        let mut s = loaded(8, 8);
        let out = s.export("image/webp", None).unwrap();
        assert_eq!(out.mime, "image/png");
        assert!(out.warning.is_some());
    }

    #[test]
    fn test_history_limit_from_config() {
        let mut config = EditorConfig::default();
        config.history_limit = 5;
        let mut s = EditorSession::new(config, Box::new(ManualScheduler::new()), clock);
        s.load_asset(uniform(4, 4, 0));
        for i in 0..10 {
            s.update_adjustments(|a| a.brightness = 110.0 + i as f32);
        }
        assert_eq!(s.history().len(), 5);
    }

    #[test]
    fn test_new_upload_resets_everything() {
        let mut s = loaded(10, 10);
        s.update_adjustments(|a| a.grayscale = true);
        s.viewport_mut().set_zoom(3.0);
        s.load_asset(uniform(5, 5, 0));
        assert!(s.adjustments().is_identity());
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.viewport().target().zoom, 1.0);
    }
}
