//! Frame Scheduler
//!
//! Once-per-frame callbacks with a relative priority (lower runs first).

use std::cell::{Cell, RefCell};
use std::fmt;

/// Priority used when none is requested.
pub const DEFAULT_PRIORITY: i32 = 0;

pub type FrameCallback = Box<dyn FnOnce()>;

/// The host's frame loop.
pub trait FrameScheduler {
    /// Run `callback` once on the next frame.
    fn request_frame(&self, priority: i32, callback: FrameCallback);

    /// Whether any callback is waiting for a frame.
    fn has_pending(&self) -> bool;
}

/// A headless frame loop driven by explicit `run_frame` calls.
///
/// Callbacks requested while a frame runs are deferred to the next frame.
#[derive(Default)]
pub struct FrameQueue {
    pending: RefCell<Vec<(i32, FrameCallback)>>,
    // Sorting is skipped until someone asks for a non-default priority.
    prioritized: Cell<bool>,
}

impl FrameQueue {
    pub fn new() -> Self {
        FrameQueue::default()
    }

    /// Run one frame. Returns the number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let mut batch = std::mem::take(&mut *self.pending.borrow_mut());
        if self.prioritized.replace(false) {
            // Stable: equal priorities keep request order
            batch.sort_by_key(|(priority, _)| *priority);
        }
        let count = batch.len();
        log::trace!("running frame with {} callbacks", count);
        for (_, callback) in batch {
            callback();
        }
        count
    }

    /// Run frames until nothing is pending, up to `max_frames`.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while self.has_pending() && frames < max_frames {
            self.run_frame();
            frames += 1;
        }
        frames
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self, priority: i32, callback: FrameCallback) {
        if priority != DEFAULT_PRIORITY {
            self.prioritized.set(true);
        }
        self.pending.borrow_mut().push((priority, callback));
    }

    fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue")
            .field("pending", &self.len())
            .field("prioritized", &self.prioritized.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> FrameCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        (log, move |name| {
            let sink = sink.clone();
            Box::new(move || sink.borrow_mut().push(name)) as FrameCallback
        })
    }

    #[test]
    fn default_priority_keeps_request_order() {
        let queue = FrameQueue::new();
        let (log, cb) = recorder();
        queue.request_frame(DEFAULT_PRIORITY, cb("a"));
        queue.request_frame(DEFAULT_PRIORITY, cb("b"));
        assert_eq!(queue.run_frame(), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn lower_priority_runs_first() {
        let queue = FrameQueue::new();
        let (log, cb) = recorder();
        queue.request_frame(DEFAULT_PRIORITY, cb("default"));
        queue.request_frame(10, cb("late"));
        queue.request_frame(-5, cb("early"));
        queue.run_frame();
        assert_eq!(*log.borrow(), vec!["early", "default", "late"]);
    }

    #[test]
    fn callbacks_requested_during_a_frame_wait_for_the_next() {
        let queue = Rc::new(FrameQueue::new());
        let (log, cb) = recorder();
        let inner = queue.clone();
        let late = cb("second");
        queue.request_frame(
            DEFAULT_PRIORITY,
            Box::new(move || inner.request_frame(DEFAULT_PRIORITY, late)),
        );
        queue.run_frame();
        assert!(log.borrow().is_empty());
        assert!(queue.has_pending());
        queue.run_frame();
        assert_eq!(*log.borrow(), vec!["second"]);
    }
}
