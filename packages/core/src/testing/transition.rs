//! Manual Transitions
//!
//! A transition whose callbacks a test fires explicitly, and a factory that
//! records every transition it hands out.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::context::Context;
use crate::env::renderer::NodeId;
use crate::env::transition::{PendingCallbacks, Transition, TransitionCallback, TransitionFactory};

#[derive(Default)]
pub struct ManualTransition {
    callbacks: PendingCallbacks,
    entering: RefCell<Vec<NodeId>>,
    leaving: RefCell<Vec<NodeId>>,
    started: Cell<bool>,
    finished: Cell<bool>,
}

impl ManualTransition {
    pub fn new() -> Rc<Self> {
        Rc::new(ManualTransition::default())
    }

    pub fn entering(&self) -> Vec<NodeId> {
        self.entering.borrow().clone()
    }

    pub fn leaving(&self) -> Vec<NodeId> {
        self.leaving.borrow().clone()
    }

    pub fn is_started(&self) -> bool {
        self.started.get()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }

    pub fn is_pending(&self) -> bool {
        self.callbacks.is_pending()
    }

    pub fn fire_enter(&self) {
        self.callbacks.fire_will_enter();
    }

    pub fn fire_leave(&self) {
        self.callbacks.fire_did_leave();
    }
}

impl Transition for ManualTransition {
    fn enter_nodes(&self, nodes: &[NodeId]) {
        self.entering.borrow_mut().extend_from_slice(nodes);
    }

    fn leave_nodes(&self, nodes: &[NodeId]) {
        self.leaving.borrow_mut().extend_from_slice(nodes);
    }

    fn on_will_enter(&self, callback: TransitionCallback) {
        self.callbacks.set_will_enter(callback);
    }

    fn on_did_leave(&self, callback: TransitionCallback) {
        self.callbacks.set_did_leave(callback);
    }

    fn start(&self) {
        self.started.set(true);
    }

    fn finish(&self) {
        self.finished.set(true);
        self.callbacks.fire_all();
    }
}

/// Hands out [`ManualTransition`]s and keeps them for inspection.
#[derive(Clone, Default)]
pub struct TransitionRecorder {
    created: Rc<RefCell<Vec<Rc<ManualTransition>>>>,
}

impl TransitionRecorder {
    pub fn new() -> Self {
        TransitionRecorder::default()
    }

    pub fn factory(&self) -> TransitionFactory {
        let created = self.created.clone();
        Rc::new(move |_: &Context| {
            let transition = ManualTransition::new();
            created.borrow_mut().push(transition.clone());
            transition as Rc<dyn Transition>
        })
    }

    pub fn last(&self) -> Option<Rc<ManualTransition>> {
        self.created.borrow().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.created.borrow().len()
    }
}
