//! Swap State Machine
//!
//! Replaces one piece of block content with another through the transition
//! protocol: idle, then started (enter and leave sets registered), then
//! finished once both callbacks have fired. The splice happens inside the
//! callbacks. A swap requested while one is in flight force-finishes it first,
//! so at most one transition is pending per block.

use std::cell::RefCell;
use std::rc::Rc;

use crate::env::renderer::{insert_all, remove_all, NodeId, NodeList, Renderer};
use crate::env::transition::Transition;
use crate::rendered::RenderedRef;

/// What a block currently shows.
pub enum Content {
    Empty,
    /// Bare nodes. Created by the block or handed in; never destroyed by it.
    Nodes(NodeList),
    Instance {
        instance: RenderedRef,
        /// Destroy the instance when it is superseded.
        owned: bool,
    },
}

impl Content {
    pub fn owned(instance: RenderedRef) -> Self {
        Content::Instance {
            instance,
            owned: true,
        }
    }

    pub fn nodes(&self) -> NodeList {
        match self {
            Content::Empty => NodeList::new(),
            Content::Nodes(nodes) => nodes.clone(),
            Content::Instance { instance, .. } => instance.root_nodes(),
        }
    }

    pub fn instance(&self) -> Option<&RenderedRef> {
        match self {
            Content::Instance { instance, .. } => Some(instance),
            _ => None,
        }
    }

    fn set_mounted(&self, mounted: bool) {
        if let Content::Instance { instance, .. } = self {
            instance.borrow_mut().set_mounted(mounted);
        }
    }

    /// Destroy owned instances; borrowed ones only stop publishing onto their model.
    fn release(self) {
        match self {
            Content::Instance {
                instance,
                owned: true,
            } => instance.borrow_mut().destroy(),
            Content::Instance {
                instance,
                owned: false,
            } => instance.borrow_mut().unbind(),
            Content::Empty | Content::Nodes(_) => {}
        }
    }
}

struct SwapState {
    renderer: Rc<dyn Renderer>,
    head: Option<NodeId>,
    current: Content,
    entered: bool,
    leaving: Option<Content>,
    pending: Option<Rc<dyn Transition>>,
    generation: u64,
    mounted: bool,
    /// Where entering content goes once the leaving content is gone.
    hint: Option<(NodeId, Option<NodeId>)>,
}

impl SwapState {
    fn insertion_point(&self) -> Option<(NodeId, Option<NodeId>)> {
        if let Some(leaving) = &self.leaving {
            for node in leaving.nodes() {
                if let Some(parent) = self.renderer.parent(node) {
                    return Some((parent, Some(node)));
                }
            }
        }
        if let Some(hint) = self.hint {
            return Some(hint);
        }
        let head = self.head?;
        let parent = self.renderer.parent(head)?;
        Some((parent, self.renderer.next_sibling(head)))
    }

    fn settle(&mut self) {
        if self.entered && self.leaving.is_none() {
            self.pending = None;
            self.hint = None;
        }
    }
}

/// Shared by a block and the callbacks of its pending transition.
pub struct Swapper {
    state: Rc<RefCell<SwapState>>,
}

impl Swapper {
    /// `head` is the sentinel content follows when there is nothing else to
    /// position against. The initial content is placed by the owner.
    pub fn new(renderer: Rc<dyn Renderer>, head: Option<NodeId>, initial: Content) -> Self {
        Swapper {
            state: Rc::new(RefCell::new(SwapState {
                renderer,
                head,
                current: initial,
                entered: true,
                leaving: None,
                pending: None,
                generation: 0,
                mounted: false,
                hint: None,
            })),
        }
    }

    /// Nodes currently in the output, in document order.
    pub fn root_nodes(&self) -> NodeList {
        let state = self.state.borrow();
        let mut nodes = NodeList::new();
        if state.entered {
            nodes.extend(state.current.nodes());
        }
        if let Some(leaving) = &state.leaving {
            nodes.extend(leaving.nodes());
        }
        nodes
    }

    /// The instance being shown or about to be shown.
    pub fn current(&self) -> Option<RenderedRef> {
        self.state.borrow().current.instance().cloned()
    }

    pub fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    pub fn set_mounted(&self, mounted: bool) {
        let instance = {
            let mut state = self.state.borrow_mut();
            if state.mounted == mounted {
                return;
            }
            state.mounted = mounted;
            if state.entered {
                state.current.instance().cloned()
            } else {
                None
            }
        };
        if let Some(instance) = instance {
            instance.borrow_mut().set_mounted(mounted);
        }
    }

    pub fn bind(&self) {
        if let Some(instance) = self.current() {
            instance.borrow_mut().bind();
        }
    }

    pub fn unbind(&self) {
        if let Some(instance) = self.current() {
            instance.borrow_mut().unbind();
        }
    }

    /// Replace the current content with `next` through `transition`.
    pub fn swap(&self, next: Content, transition: Rc<dyn Transition>) {
        self.finish();
        let (generation, entering, leaving) = {
            let mut state = self.state.borrow_mut();
            let old = std::mem::replace(&mut state.current, next);
            state.generation += 1;
            state.entered = false;
            state.hint = None;
            let entering = state.current.nodes();
            let leaving = old.nodes();
            state.leaving = Some(old);
            state.pending = Some(transition.clone());
            (state.generation, entering, leaving)
        };

        transition.enter_nodes(&entering);
        transition.leave_nodes(&leaving);
        let weak = Rc::downgrade(&self.state);
        transition.on_will_enter(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                will_enter(&state, generation);
            }
        }));
        let weak = Rc::downgrade(&self.state);
        transition.on_did_leave(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                did_leave(&state, generation);
            }
        }));
        transition.start();
    }

    /// Force the pending transition to completion.
    pub fn finish(&self) {
        let (pending, generation) = {
            let state = self.state.borrow();
            (state.pending.clone(), state.generation)
        };
        let Some(transition) = pending else {
            return;
        };
        transition.finish();
        // complete whatever a misbehaving transition left undone
        will_enter(&self.state, generation);
        did_leave(&self.state, generation);
    }

    pub fn destroy(&self) {
        self.finish();
        let (current, mounted) = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            (std::mem::replace(&mut state.current, Content::Empty), state.mounted)
        };
        if mounted {
            current.set_mounted(false);
        }
        current.release();
    }
}

fn will_enter(state: &Rc<RefCell<SwapState>>, generation: u64) {
    let mount = {
        let mut s = state.borrow_mut();
        if s.generation != generation || s.entered {
            return;
        }
        let nodes = s.current.nodes();
        if !nodes.is_empty() {
            if let Some((parent, reference)) = s.insertion_point() {
                insert_all(s.renderer.as_ref(), parent, &nodes, reference);
            }
        }
        s.entered = true;
        s.settle();
        if s.mounted {
            s.current.instance().cloned()
        } else {
            None
        }
    };
    if let Some(instance) = mount {
        instance.borrow_mut().set_mounted(true);
    }
}

fn did_leave(state: &Rc<RefCell<SwapState>>, generation: u64) {
    let (old, mounted) = {
        let mut s = state.borrow_mut();
        if s.generation != generation {
            return;
        }
        let Some(old) = s.leaving.take() else {
            return;
        };
        let nodes = old.nodes();
        if !s.entered {
            if let Some(last) = nodes.last() {
                if let Some(parent) = s.renderer.parent(*last) {
                    s.hint = Some((parent, s.renderer.next_sibling(*last)));
                }
            }
        }
        remove_all(s.renderer.as_ref(), &nodes);
        s.settle();
        (old, s.mounted)
    };
    if mounted {
        old.set_mounted(false);
    }
    old.release();
}
