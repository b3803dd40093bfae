//! Invalidation Scheduler
//!
//! Batches re-render requests into one pass per frame. A target is queued at
//! most once per pass, tracked by its own dirty flag rather than set membership.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::env::scheduler::FrameScheduler;
use crate::error::Result;

/// Something that can be marked dirty and brought up to date later.
pub trait Invalidate {
    fn dirty(&self) -> &Cell<bool>;

    /// Bring the target up to date. Called with the dirty flag already cleared.
    fn validate(&self) -> Result<()>;
}

pub struct InvalidationQueue {
    queue: RefCell<Vec<Rc<dyn Invalidate>>>,
    priority: i32,
}

impl InvalidationQueue {
    pub fn new(priority: i32) -> Rc<Self> {
        Rc::new(InvalidationQueue {
            queue: RefCell::new(Vec::new()),
            priority,
        })
    }

    /// Mark `target` dirty. The first invalidation of a cycle requests a frame.
    pub fn invalidate(self: &Rc<Self>, target: Rc<dyn Invalidate>, scheduler: &dyn FrameScheduler) {
        if target.dirty().replace(true) {
            return;
        }
        let first = {
            let mut queue = self.queue.borrow_mut();
            queue.push(target);
            queue.len() == 1
        };
        if first {
            let this = Rc::clone(self);
            scheduler.request_frame(self.priority, Box::new(move || this.drain()));
        }
    }

    /// Validate every queued target, including ones invalidated while draining.
    pub fn drain(&self) {
        let mut index = 0;
        loop {
            let next = self.queue.borrow().get(index).cloned();
            let Some(target) = next else {
                break;
            };
            target.dirty().set(false);
            if let Err(e) = target.validate() {
                log::error!("update failed during invalidation pass: {}", e);
            }
            index += 1;
        }
        log::trace!("invalidation pass validated {} targets", index);
        self.queue.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for InvalidationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationQueue")
            .field("queued", &self.len())
            .field("priority", &self.priority)
            .finish()
    }
}
