//! Transition Protocol
//!
//! Blocks hand entering and leaving node sets to a transition and perform the
//! actual splice only when the transition calls back.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Context;
use crate::env::renderer::NodeId;

pub type TransitionCallback = Box<dyn FnOnce()>;

/// An animation collaborator for a subregion swap.
///
/// `finish` is the cancellation primitive: it must synchronously fire any
/// callback that has not fired yet.
pub trait Transition {
    fn enter_nodes(&self, nodes: &[NodeId]);
    fn leave_nodes(&self, nodes: &[NodeId]);
    fn on_will_enter(&self, callback: TransitionCallback);
    fn on_did_leave(&self, callback: TransitionCallback);
    fn start(&self);
    fn finish(&self);
}

/// Creates a transition for one swap.
pub type TransitionFactory = Rc<dyn Fn(&Context) -> Rc<dyn Transition>>;

/// The two callbacks a transition owes its block. Each fires at most once.
#[derive(Default)]
pub struct PendingCallbacks {
    will_enter: RefCell<Option<TransitionCallback>>,
    did_leave: RefCell<Option<TransitionCallback>>,
}

impl PendingCallbacks {
    pub fn set_will_enter(&self, callback: TransitionCallback) {
        *self.will_enter.borrow_mut() = Some(callback);
    }

    pub fn set_did_leave(&self, callback: TransitionCallback) {
        *self.did_leave.borrow_mut() = Some(callback);
    }

    pub fn fire_will_enter(&self) {
        let callback = self.will_enter.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn fire_did_leave(&self) {
        let callback = self.did_leave.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Enter first, then leave.
    pub fn fire_all(&self) {
        self.fire_will_enter();
        self.fire_did_leave();
    }

    pub fn is_pending(&self) -> bool {
        self.will_enter.borrow().is_some() || self.did_leave.borrow().is_some()
    }
}

/// Swaps immediately. Used when a block is unmounted or has no transition configured.
#[derive(Default)]
pub struct NullTransition {
    callbacks: PendingCallbacks,
}

impl NullTransition {
    pub fn new() -> Rc<dyn Transition> {
        Rc::new(NullTransition::default())
    }
}

impl Transition for NullTransition {
    fn enter_nodes(&self, _nodes: &[NodeId]) {}

    fn leave_nodes(&self, _nodes: &[NodeId]) {}

    fn on_will_enter(&self, callback: TransitionCallback) {
        self.callbacks.set_will_enter(callback);
    }

    fn on_did_leave(&self, callback: TransitionCallback) {
        self.callbacks.set_did_leave(callback);
    }

    fn start(&self) {
        self.callbacks.fire_all();
    }

    fn finish(&self) {
        self.callbacks.fire_all();
    }
}

/// Pick the transition for a swap: the configured one when mounted, otherwise a no-op.
pub(crate) fn select(
    factory: Option<&TransitionFactory>,
    mounted: bool,
    ctx: &Context,
) -> Rc<dyn Transition> {
    match factory {
        Some(factory) if mounted => factory(ctx),
        _ => NullTransition::new(),
    }
}
