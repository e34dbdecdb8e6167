//! `requestAnimationFrame` scheduling for the viewport.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use retouch_core::{FrameHandle, FrameScheduler, FrameStream};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Receiver of fired frames.
pub trait FrameSink {
    /// Handle a fired frame. Returns `false` if the frame could not be
    /// taken right now and should be delivered again on the next frame.
    fn on_frame(&self, stream: FrameStream) -> bool;
}

type FrameCallback = Closure<dyn FnMut()>;

/// A queued browser frame and the callback it will invoke.
struct Pending {
    handle: FrameHandle,
    raf_id: i32,
    callback: FrameCallback,
}

/// At most one queued frame per stream.
#[derive(Default)]
struct Slots {
    next_handle: i32,
    animation: Option<Pending>,
    pan_commit: Option<Pending>,
    /// Callbacks that have already run, freed when the next frame fires
    spent: Vec<FrameCallback>,
}

impl Slots {
    fn slot(&mut self, stream: FrameStream) -> &mut Option<Pending> {
        match stream {
            FrameStream::Animation => &mut self.animation,
            FrameStream::PanCommit => &mut self.pan_commit,
        }
    }

    fn take_handle(&mut self, handle: FrameHandle) -> Option<Pending> {
        for slot in [&mut self.animation, &mut self.pan_commit] {
            if slot.as_ref().is_some_and(|p| p.handle == handle) {
                return slot.take();
            }
        }
        None
    }
}

/// Frame scheduler backed by `window.requestAnimationFrame`.
///
/// Handles stay stable across retries: a frame the sink could not take is
/// queued again under the same handle. Holds only a weak reference to its
/// sink, so a dropped editor stops receiving frames even if a callback is
/// still queued.
pub struct RafScheduler {
    sink: Weak<dyn FrameSink>,
    slots: Rc<RefCell<Slots>>,
}

impl RafScheduler {
    pub fn new(sink: Weak<dyn FrameSink>) -> Self {
        Self {
            sink,
            slots: Rc::default(),
        }
    }
}

/// Queue a browser frame for `stream` and record it under `handle`.
fn schedule(
    slots: &Rc<RefCell<Slots>>,
    sink: &Weak<dyn FrameSink>,
    stream: FrameStream,
    handle: FrameHandle,
) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };

    let callback = {
        let slots = Rc::downgrade(slots);
        let sink = sink.clone();
        Closure::<dyn FnMut()>::new(move || {
            let Some(slots) = slots.upgrade() else {
                return;
            };
            {
                let mut slots = slots.borrow_mut();
                slots.spent.clear();
                let Some(fired) = slots.take_handle(handle) else {
                    return;
                };
                // This callback is running; keep it alive until the next frame
                slots.spent.push(fired.callback);
            }

            let delivered = sink.upgrade().map_or(true, |sink| sink.on_frame(stream));
            if !delivered && !schedule(&slots, &sink, stream, handle) {
                tracing::warn!(?stream, "frame dropped after a busy retry failed");
            }
        })
    };

    match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        Ok(raf_id) => {
            let previous = slots.borrow_mut().slot(stream).replace(Pending {
                handle,
                raf_id,
                callback,
            });
            if let Some(previous) = previous {
                cancel(&previous);
            }
            true
        }
        Err(err) => {
            tracing::warn!(?stream, error = ?err, "requestAnimationFrame failed");
            false
        }
    }
}

fn cancel(pending: &Pending) {
    if let Some(window) = web_sys::window() {
        if let Err(err) = window.cancel_animation_frame(pending.raf_id) {
            tracing::debug!(handle = pending.handle.0, error = ?err, "cancelAnimationFrame failed");
        }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self, stream: FrameStream) -> Option<FrameHandle> {
        let handle = {
            let mut slots = self.slots.borrow_mut();
            slots.next_handle = slots.next_handle.wrapping_add(1);
            FrameHandle(slots.next_handle)
        };
        schedule(&self.slots, &self.sink, stream, handle).then_some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let pending = self.slots.borrow_mut().take_handle(handle);
        if let Some(pending) = pending {
            cancel(&pending);
        }
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        let mut slots = self.slots.borrow_mut();
        for pending in [slots.animation.take(), slots.pan_commit.take()]
            .into_iter()
            .flatten()
        {
            cancel(&pending);
        }
    }
}
