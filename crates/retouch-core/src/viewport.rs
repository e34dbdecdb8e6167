//! Zoom and pan controller.
//!
//! Every input (buttons, wheel, keys, drags, fit-to-screen) only moves a
//! *target* [`ViewportState`]. A single animation loop, advanced once per
//! display frame, eases the *current* state toward the target and stops as
//! soon as the two are indistinguishable. Drags are coalesced: raw pointer
//! deltas pile up and are committed at most once per frame.
//!
//! Frames are requested through the [`FrameScheduler`] trait so the
//! controller runs identically under `requestAnimationFrame` and in tests.
//!
//! # Coordinates
//!
//! Pan is the offset of the canvas centre from the container centre, in CSS
//! pixels. The canvas itself is `rotated_bounds × zoom` pixels.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ViewportConfig;
use crate::state::ViewportState;
use crate::transform::{rotated_bounds, Point};

/// Independent frame callbacks. At most one frame is pending per stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStream {
    /// Easing of zoom and pan toward their targets
    Animation,
    /// Commit of accumulated drag deltas
    PanCommit,
}

/// Identifier of a requested frame, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Source of per-frame callbacks.
///
/// Implementations must call [`ViewportController::on_frame`] with the
/// requested stream once the frame fires.
pub trait FrameScheduler {
    /// Request a single callback on the next frame.
    ///
    /// Returns `None` if no frame could be scheduled.
    fn request_frame(&mut self, stream: FrameStream) -> Option<FrameHandle>;

    /// Cancel a previously requested frame. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler that queues frames until the owner fires them explicitly.
///
/// Clones share the same queue, so a test can keep one clone while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<ManualQueue>>,
}

#[derive(Debug, Default)]
struct ManualQueue {
    next_id: i32,
    pending: Vec<(FrameHandle, FrameStream)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Streams with a pending frame, in request order.
    pub fn pending(&self) -> Vec<FrameStream> {
        self.queue.borrow().pending.iter().map(|(_, s)| *s).collect()
    }

    /// Remove and return every pending frame.
    pub fn take_pending(&self) -> Vec<FrameStream> {
        self.queue
            .borrow_mut()
            .pending
            .drain(..)
            .map(|(_, s)| s)
            .collect()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self, stream: FrameStream) -> Option<FrameHandle> {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        let handle = FrameHandle(queue.next_id);
        queue.pending.push((handle, stream));
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queue.borrow_mut().pending.retain(|(h, _)| *h != handle);
    }
}

/// Owns the viewport state machine.
pub struct ViewportController {
    config: ViewportConfig,
    scheduler: Box<dyn FrameScheduler>,
    current: ViewportState,
    target: ViewportState,
    /// Unzoomed size of the rotated image
    content: (u32, u32),
    container: (f64, f64),
    pending_pan: Point,
    drag_origin: Option<Point>,
    animation_frame: Option<FrameHandle>,
    pan_frame: Option<FrameHandle>,
}

impl std::fmt::Debug for ViewportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportController")
            .field("current", &self.current)
            .field("target", &self.target)
            .field("content", &self.content)
            .field("container", &self.container)
            .field("pending_pan", &self.pending_pan)
            .field("animation_frame", &self.animation_frame)
            .field("pan_frame", &self.pan_frame)
            .finish_non_exhaustive()
    }
}

impl ViewportController {
    pub fn new(config: ViewportConfig, scheduler: Box<dyn FrameScheduler>) -> Self {
        Self {
            config: config.sanitized(),
            scheduler,
            current: ViewportState::default(),
            target: ViewportState::default(),
            content: (1, 1),
            container: (0.0, 0.0),
            pending_pan: Point::default(),
            drag_origin: None,
            animation_frame: None,
            pan_frame: None,
        }
    }

    /// The state currently on screen.
    pub fn current(&self) -> ViewportState {
        self.current
    }

    /// The state the animation is heading toward.
    pub fn target(&self) -> ViewportState {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.animation_frame.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// Set the image whose rotated bounds are being viewed.
    pub fn set_content(&mut self, width: u32, height: u32, rotation_degrees: u32) {
        self.content = rotated_bounds(width, height, rotation_degrees as f64);
        self.retarget(self.target);
    }

    /// Set the size of the element that hosts the canvas, in CSS pixels.
    pub fn set_container_size(&mut self, width: f64, height: f64) {
        self.container = (width.max(0.0), height.max(0.0));
        self.retarget(self.target);
    }

    /// Canvas size in CSS pixels at the given zoom.
    pub fn canvas_size(&self, zoom: f64) -> (f64, f64) {
        let scale = |v: u32| (v as f64 * zoom).round().max(1.0);
        (scale(self.content.0), scale(self.content.1))
    }

    // ===== Zoom =====

    pub fn zoom_in(&mut self) {
        self.zoom_about(self.target.zoom * self.config.zoom_in_factor, Point::default());
    }

    pub fn zoom_out(&mut self) {
        self.zoom_about(self.target.zoom * self.config.zoom_out_factor, Point::default());
    }

    /// Zoom to an absolute factor around the container centre.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom_about(zoom, Point::default());
    }

    /// Wheel zoom anchored at the cursor.
    ///
    /// # Arguments
    ///
    /// * `delta_y` - Wheel `deltaY`; negative zooms in
    /// * `cursor` - Pointer position relative to the container's top-left
    pub fn wheel(&mut self, delta_y: f64, cursor: Point) {
        if !delta_y.is_finite() {
            return;
        }
        let factor = (-delta_y * self.config.wheel_sensitivity).exp();
        let anchor = Point::new(
            cursor.x - self.container.0 / 2.0,
            cursor.y - self.container.1 / 2.0,
        );
        self.zoom_about(self.target.zoom * factor, anchor);
    }

    /// Change zoom keeping the content under `anchor` fixed.
    ///
    /// `anchor` is relative to the container centre.
    fn zoom_about(&mut self, zoom: f64, anchor: Point) {
        let old = self.target.zoom;
        let zoom = self.config.clamp_zoom(zoom);
        let ratio = zoom / old;
        let pan = Point::new(
            anchor.x - (anchor.x - self.target.pan.x) * ratio,
            anchor.y - (anchor.y - self.target.pan.y) * ratio,
        );
        self.retarget(ViewportState { zoom, pan });
    }

    /// Fit the whole rotated image inside the container, never enlarging it.
    pub fn fit_to_screen(&mut self) {
        let (cw, ch) = self.container;
        let (rw, rh) = (self.content.0 as f64, self.content.1 as f64);
        let padding = self.config.fit_padding;

        let fit = ((cw - padding) / rw).min((ch - padding) / rh).min(1.0);
        self.retarget(ViewportState {
            zoom: self.config.clamp_zoom(fit),
            pan: Point::default(),
        });
    }

    /// Jump straight to zoom 1 and no pan, dropping any animation or drag.
    pub fn reset(&mut self) {
        self.cancel_frames();
        self.pending_pan = Point::default();
        self.drag_origin = None;
        self.current = ViewportState::default();
        self.target = ViewportState::default();
    }

    // ===== Pan =====

    /// Start a pan drag at a container-relative pointer position.
    pub fn begin_drag(&mut self, pointer: Point) {
        self.drag_origin = Some(pointer);
    }

    /// Record pointer movement. The pan moves on the next frame.
    pub fn drag_to(&mut self, pointer: Point) {
        let Some(last) = self.drag_origin else {
            return;
        };
        self.pending_pan.x += pointer.x - last.x;
        self.pending_pan.y += pointer.y - last.y;
        self.drag_origin = Some(pointer);

        if self.pan_frame.is_none() {
            self.pan_frame = self.scheduler.request_frame(FrameStream::PanCommit);
        }
    }

    /// Finish the drag, committing any movement not yet applied.
    pub fn end_drag(&mut self) {
        if self.drag_origin.take().is_none() {
            return;
        }
        if let Some(handle) = self.pan_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.commit_pending_pan();
    }

    /// Pan the target by a fixed offset.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let pan = Point::new(self.target.pan.x + dx, self.target.pan.y + dy);
        self.retarget(ViewportState {
            zoom: self.target.zoom,
            pan,
        });
    }

    fn commit_pending_pan(&mut self) {
        let delta = std::mem::take(&mut self.pending_pan);
        if delta != Point::default() {
            self.pan_by(delta.x, delta.y);
        }
    }

    /// Constrain a pan so at least `pan_margin` pixels of the canvas stay
    /// inside the container on each axis.
    pub fn clamp_pan(&self, pan: Point, zoom: f64) -> Point {
        let (dw, dh) = self.canvas_size(zoom);
        let margin = self.config.pan_margin;
        let clamp_axis = |value: f64, container: f64, display: f64| {
            let half = (container + display) / 2.0;
            let (lo, hi) = (margin - half, half - margin);
            if lo > hi {
                0.0
            } else {
                value.clamp(lo, hi)
            }
        };
        Point::new(
            clamp_axis(pan.x, self.container.0, dw),
            clamp_axis(pan.y, self.container.1, dh),
        )
    }

    // ===== Keyboard =====

    /// Handle a `KeyboardEvent.key` value.
    ///
    /// # Returns
    ///
    /// `true` if the key was consumed.
    pub fn handle_key(&mut self, key: &str) -> bool {
        let step = self.config.key_pan_step;
        match key {
            "+" | "=" => self.zoom_in(),
            "-" | "_" => self.zoom_out(),
            "0" => self.fit_to_screen(),
            "ArrowLeft" => self.pan_by(-step, 0.0),
            "ArrowRight" => self.pan_by(step, 0.0),
            "ArrowUp" => self.pan_by(0.0, -step),
            "ArrowDown" => self.pan_by(0.0, step),
            _ => return false,
        }
        true
    }

    // ===== Frames =====

    /// Advance the stream whose frame just fired.
    ///
    /// # Returns
    ///
    /// `true` if the on-screen state changed and the view needs a redraw.
    pub fn on_frame(&mut self, stream: FrameStream) -> bool {
        match stream {
            FrameStream::PanCommit => {
                self.pan_frame = None;
                self.commit_pending_pan();
                false
            }
            FrameStream::Animation => {
                self.animation_frame = None;
                self.step_animation()
            }
        }
    }

    fn step_animation(&mut self) -> bool {
        let before = self.current;
        let easing = self.config.easing;
        let cur = &mut self.current;
        let tgt = self.target;

        cur.zoom += (tgt.zoom - cur.zoom) * easing;
        cur.pan.x += (tgt.pan.x - cur.pan.x) * easing;
        cur.pan.y += (tgt.pan.y - cur.pan.y) * easing;

        // A step that no longer moves has hit float resolution
        if self.is_settled() || self.current == before {
            self.current = self.target;
        } else {
            self.request_animation();
        }
        self.current != before
    }

    fn is_settled(&self) -> bool {
        (self.target.zoom - self.current.zoom).abs() < self.config.zoom_epsilon
            && self.target.pan.distance(self.current.pan) < self.config.pan_epsilon
    }

    fn retarget(&mut self, state: ViewportState) {
        let zoom = self.config.clamp_zoom(state.zoom);
        self.target = ViewportState {
            zoom,
            pan: self.clamp_pan(state.pan, zoom),
        };
        if self.target != self.current {
            self.request_animation();
        }
    }

    fn request_animation(&mut self) {
        if self.animation_frame.is_none() {
            self.animation_frame = self.scheduler.request_frame(FrameStream::Animation);
        }
    }

    fn cancel_frames(&mut self) {
        for handle in [self.animation_frame.take(), self.pan_frame.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel_frame(handle);
        }
    }

    /// Cancel every pending frame. The controller stays usable afterwards.
    pub fn teardown(&mut self) {
        self.cancel_frames();
        self.pending_pan = Point::default();
        self.drag_origin = None;
    }

    /// Map a container-relative pointer position onto the canvas.
    ///
    /// Uses the on-screen state, so the result matches what the user sees
    /// even mid-animation.
    pub fn container_to_display(&self, pointer: Point) -> Point {
        let (dw, dh) = self.canvas_size(self.current.zoom);
        let left = self.container.0 / 2.0 + self.current.pan.x - dw / 2.0;
        let top = self.container.1 / 2.0 + self.current.pan.y - dh / 2.0;
        Point::new(pointer.x - left, pointer.y - top)
    }
}

impl Drop for ViewportController {
    fn drop(&mut self) {
        self.cancel_frames();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> (ViewportController, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        let mut vp = ViewportController::new(ViewportConfig::default(), Box::new(scheduler.clone()));
        vp.set_content(800, 600, 0);
        vp.set_container_size(1000.0, 800.0);
        scheduler.take_pending();
        (vp, scheduler)
    }

    /// Fire frames until nothing is pending, returning how many ran.
    fn run_frames(vp: &mut ViewportController, scheduler: &ManualScheduler) -> usize {
        let mut count = 0;
        loop {
            let pending = scheduler.take_pending();
            if pending.is_empty() {
                return count;
            }
            for stream in pending {
                vp.on_frame(stream);
                count += 1;
            }
            assert!(count < 1000, "animation never settled");
        }
    }

    // ===== Zoom Tests =====

    #[test]
    fn test_zoom_buttons_multiply() {
        let (mut vp, _) = controller();
        vp.zoom_in();
        assert!((vp.target().zoom - 1.25).abs() < 1e-12);
        vp.zoom_out();
        assert!((vp.target().zoom - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let (mut vp, _) = controller();
        for _ in 0..50 {
            vp.zoom_in();
        }
        assert_eq!(vp.target().zoom, 5.0);
        for _ in 0..100 {
            vp.zoom_out();
        }
        assert_eq!(vp.target().zoom, 0.1);
    }

    #[test]
    fn test_wheel_is_exponential() {
        let (mut vp, _) = controller();
        vp.wheel(-100.0, Point::new(500.0, 400.0));
        assert!((vp.target().zoom - 0.15f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn test_wheel_keeps_cursor_point_fixed() {
        let (mut vp, scheduler) = controller();
        let cursor = Point::new(700.0, 500.0);
        run_frames(&mut vp, &scheduler);

        // Content under the cursor before zooming
        let before = vp.container_to_display(cursor);
        let before_frac = (before.x / 800.0, before.y / 600.0);

        vp.wheel(-200.0, cursor);
        run_frames(&mut vp, &scheduler);

        let (dw, dh) = vp.canvas_size(vp.current().zoom);
        let after = vp.container_to_display(cursor);
        assert!((after.x / dw - before_frac.0).abs() < 1e-3);
        assert!((after.y / dh - before_frac.1).abs() < 1e-3);
    }

    #[test]
    fn test_wheel_ignores_non_finite() {
        let (mut vp, _) = controller();
        vp.wheel(f64::NAN, Point::default());
        assert_eq!(vp.target(), ViewportState::default());
    }

    #[test]
    fn test_fit_to_screen() {
        let (mut vp, _) = controller();
        vp.set_container_size(440.0, 1000.0);
        vp.pan_by(30.0, 30.0);
        vp.fit_to_screen();
        // (440 - 40) / 800 = 0.5
        assert!((vp.target().zoom - 0.5).abs() < 1e-12);
        assert_eq!(vp.target().pan, Point::default());
    }

    #[test]
    fn test_fit_never_enlarges() {
        let (mut vp, _) = controller();
        vp.set_container_size(4000.0, 4000.0);
        vp.fit_to_screen();
        assert_eq!(vp.target().zoom, 1.0);
    }

    #[test]
    fn test_fit_uses_rotated_bounds() {
        let (mut vp, _) = controller();
        vp.set_content(800, 600, 90);
        vp.set_container_size(1000.0, 440.0);
        vp.fit_to_screen();
        // Rotated height is 800: (440 - 40) / 800
        assert!((vp.target().zoom - 0.5).abs() < 1e-12);
    }

    // ===== Animation Tests =====

    #[test]
    fn test_animation_eases_then_snaps() {
        let (mut vp, scheduler) = controller();
        vp.set_zoom(2.0);
        assert_eq!(scheduler.pending(), vec![FrameStream::Animation]);

        scheduler.take_pending();
        assert!(vp.on_frame(FrameStream::Animation));
        assert!((vp.current().zoom - 1.15).abs() < 1e-12);

        let frames = run_frames(&mut vp, &scheduler);
        assert!(frames > 10);
        assert_eq!(vp.current(), vp.target());
        assert!(!vp.is_animating());
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn test_zero_epsilons_still_settle() {
        let scheduler = ManualScheduler::new();
        let config = ViewportConfig {
            zoom_epsilon: 0.0,
            pan_epsilon: 0.0,
            ..ViewportConfig::default()
        };
        let mut vp = ViewportController::new(config, Box::new(scheduler.clone()));
        vp.set_content(800, 600, 0);
        vp.set_container_size(1000.0, 800.0);
        vp.set_zoom(1.37);

        run_frames(&mut vp, &scheduler);
        assert!(!vp.is_animating());
        assert_eq!(vp.current(), vp.target());
        assert_eq!(vp.current().zoom, 1.37);
    }

    #[test]
    fn test_stalled_step_snaps_to_target() {
        let (mut vp, scheduler) = controller();
        // Tiny epsilons leave the easing to stall one ulp short
        vp.config.zoom_epsilon = f64::MIN_POSITIVE;
        vp.config.pan_epsilon = f64::MIN_POSITIVE;
        vp.set_zoom(1.37);

        run_frames(&mut vp, &scheduler);
        assert!(!vp.is_animating());
        assert_eq!(vp.current().zoom, 1.37);
    }

    #[test]
    fn test_one_animation_frame_at_a_time() {
        let (mut vp, scheduler) = controller();
        vp.zoom_in();
        vp.zoom_in();
        vp.pan_by(10.0, 0.0);
        assert_eq!(scheduler.pending(), vec![FrameStream::Animation]);
    }

    #[test]
    fn test_no_frame_when_target_unchanged() {
        let (mut vp, scheduler) = controller();
        vp.set_zoom(1.0);
        assert!(scheduler.pending().is_empty());
    }

    // ===== Drag Tests =====

    #[test]
    fn test_drag_coalesces_into_one_commit() {
        let (mut vp, scheduler) = controller();
        vp.begin_drag(Point::new(100.0, 100.0));
        for i in 1..=10 {
            vp.drag_to(Point::new(100.0 + i as f64 * 3.0, 100.0));
        }
        assert_eq!(scheduler.take_pending(), vec![FrameStream::PanCommit]);
        // Target does not move until the frame fires
        assert_eq!(vp.target().pan, Point::default());

        vp.on_frame(FrameStream::PanCommit);
        assert_eq!(vp.target().pan, Point::new(30.0, 0.0));
        assert_eq!(scheduler.pending(), vec![FrameStream::Animation]);
    }

    #[test]
    fn test_end_drag_flushes_pending() {
        let (mut vp, scheduler) = controller();
        vp.begin_drag(Point::new(0.0, 0.0));
        vp.drag_to(Point::new(12.0, -8.0));
        vp.end_drag();

        assert_eq!(vp.target().pan, Point::new(12.0, -8.0));
        assert!(!vp.is_dragging());
        assert!(!scheduler.pending().contains(&FrameStream::PanCommit));
    }

    #[test]
    fn test_drag_without_begin_is_ignored() {
        let (mut vp, scheduler) = controller();
        vp.drag_to(Point::new(50.0, 50.0));
        assert!(scheduler.pending().is_empty());
    }

    // ===== Pan Clamp Tests =====

    #[test]
    fn test_pan_clamp_keeps_margin_visible() {
        let (vp, _) = controller();
        // x range: 100 - (1000 + 800) / 2 = -800 .. 800
        let p = vp.clamp_pan(Point::new(5000.0, -5000.0), 1.0);
        assert_eq!(p, Point::new(800.0, -600.0));
    }

    #[test]
    fn test_pan_clamp_collapsed_range_pins_to_zero() {
        let (mut vp, _) = controller();
        vp.set_content(10, 10, 0);
        vp.set_container_size(50.0, 50.0);
        let p = vp.clamp_pan(Point::new(20.0, -20.0), 1.0);
        assert_eq!(p, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_targets_are_always_clamped() {
        let (mut vp, _) = controller();
        vp.pan_by(100_000.0, 0.0);
        assert_eq!(vp.target().pan.x, 800.0);
    }

    // ===== Keyboard Tests =====

    #[test]
    fn test_keyboard_shortcuts() {
        let (mut vp, _) = controller();
        assert!(vp.handle_key("+"));
        assert!((vp.target().zoom - 1.25).abs() < 1e-12);
        assert!(vp.handle_key("-"));
        assert!(vp.handle_key("ArrowRight"));
        assert!(vp.handle_key("ArrowUp"));
        assert_eq!(vp.target().pan, Point::new(50.0, -50.0));
        assert!(vp.handle_key("0"));
        assert_eq!(vp.target().pan, Point::default());
        assert!(!vp.handle_key("q"));
    }

    // ===== Mapping / Lifecycle Tests =====

    #[test]
    fn test_container_to_display_centred() {
        let (vp, _) = controller();
        // 800x600 canvas centred in 1000x800 sits at (100, 100)
        assert_eq!(vp.container_to_display(Point::new(100.0, 100.0)), Point::new(0.0, 0.0));
        assert_eq!(vp.container_to_display(Point::new(500.0, 400.0)), Point::new(400.0, 300.0));
    }

    #[test]
    fn test_container_to_display_follows_pan() {
        let (mut vp, scheduler) = controller();
        vp.pan_by(50.0, 0.0);
        run_frames(&mut vp, &scheduler);
        assert_eq!(vp.container_to_display(Point::new(150.0, 100.0)), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_teardown_cancels_frames() {
        let (mut vp, scheduler) = controller();
        vp.zoom_in();
        vp.begin_drag(Point::default());
        vp.drag_to(Point::new(5.0, 5.0));
        assert_eq!(scheduler.pending().len(), 2);

        vp.teardown();
        assert!(scheduler.pending().is_empty());
        assert!(!vp.is_animating());
    }

    #[test]
    fn test_reset_jumps_to_default() {
        let (mut vp, scheduler) = controller();
        vp.set_zoom(3.0);
        vp.reset();
        assert_eq!(vp.current(), ViewportState::default());
        assert_eq!(vp.target(), ViewportState::default());
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn test_drop_cancels_frames() {
        let (mut vp, scheduler) = controller();
        vp.zoom_in();
        drop(vp);
        assert!(scheduler.pending().is_empty());
    }
}
