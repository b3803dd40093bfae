//! Host Environment
//!
//! A swappable provider of the renderer and frame scheduler, plus the
//! invalidation queue and the count of in-flight async loads.

pub mod notify;
pub mod renderer;
pub mod scheduler;
pub mod transition;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::invalidation::{Invalidate, InvalidationQueue};

pub use notify::{Notifier, Subscription};
pub use renderer::{Event, Listener, ListenerId, NodeId, NodeList, Renderer};
pub use scheduler::{FrameCallback, FrameQueue, FrameScheduler, DEFAULT_PRIORITY};
pub use transition::{NullTransition, Transition, TransitionFactory};

pub struct Environment {
    renderer: Rc<dyn Renderer>,
    scheduler: Rc<dyn FrameScheduler>,
    invalidations: Rc<InvalidationQueue>,
    notifier: Notifier,
    loading: Cell<usize>,
}

impl Environment {
    pub fn new(renderer: Rc<dyn Renderer>, scheduler: Rc<dyn FrameScheduler>) -> Rc<Self> {
        Rc::new(Environment {
            renderer,
            scheduler,
            invalidations: InvalidationQueue::new(DEFAULT_PRIORITY),
            notifier: Notifier::new(),
            loading: Cell::new(0),
        })
    }

    pub fn renderer(&self) -> &Rc<dyn Renderer> {
        &self.renderer
    }

    pub fn scheduler(&self) -> &Rc<dyn FrameScheduler> {
        &self.scheduler
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn invalidations(&self) -> &Rc<InvalidationQueue> {
        &self.invalidations
    }

    /// Queue `target` for the next invalidation pass.
    pub fn invalidate(&self, target: Rc<dyn Invalidate>) {
        self.invalidations
            .invalidate(target, self.scheduler.as_ref());
    }

    /// Run `callback` after every currently pending frame callback, or right
    /// away if nothing is pending.
    pub fn after_pending(&self, callback: FrameCallback) {
        if self.scheduler.has_pending() {
            self.scheduler.request_frame(i32::MAX, callback);
        } else {
            callback();
        }
    }

    pub fn begin_load(&self) {
        self.loading.set(self.loading.get() + 1);
    }

    pub fn end_load(&self) {
        self.loading.set(self.loading.get().saturating_sub(1));
    }

    /// Whether any async load is in progress. Hydration-style work should wait.
    pub fn is_loading(&self) -> bool {
        self.loading.get() > 0
    }

    pub fn loading_count(&self) -> usize {
        self.loading.get()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("invalidations", &self.invalidations)
            .field("loading", &self.loading.get())
            .finish()
    }
}
