//! Unit Operations
//!
//! The fixed operation sequences a compiled unit runs, addressed by
//! pre-resolved slot handles and indices into the unit's reference list.

pub mod create;
pub mod update;

use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::blocks::BlockFactory;
use crate::component::ComponentClass;
use crate::env::renderer::NodeList;
use crate::env::transition::TransitionFactory;
use crate::template::authored::{Callback, Handler};
use crate::value::{Html, Value};

pub use create::{CreateOp, HandlerSource};
pub use update::UpdateOp;

/// Slot of an output node created by the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeSlot(pub usize);

/// Slot of a nested rendered instance (component or block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildSlot(pub usize);

/// Slot of a markup fragment, whose node count may only be known at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentSlot(pub usize);

/// Hidden previous-value slot of one dynamic expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrevSlot(pub usize);

/// Index into the reference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefIndex(pub usize);

/// Where a piece of output sits among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Node(NodeSlot),
    Fragment(FragmentSlot),
    Child(ChildSlot),
}

/// Something a name can be exported or bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Node(NodeSlot),
    Child(ChildSlot),
}

/// A captured dynamic value.
pub enum Reference {
    Callback(Callback),
    Handler(Handler),
    Component(Rc<dyn ComponentClass>),
    Block(Rc<dyn BlockFactory>),
    Transition(TransitionFactory),
    Html { html: Html, parsed: Option<NodeList> },
    Value(Value),
}

impl Reference {
    pub fn kind(&self) -> &'static str {
        match self {
            Reference::Callback(_) => "callback",
            Reference::Handler(_) => "handler",
            Reference::Component(_) => "component",
            Reference::Block(_) => "block",
            Reference::Transition(_) => "transition",
            Reference::Html { .. } => "html",
            Reference::Value(_) => "value",
        }
    }
}

/// Publishes a node handle on the model while bound.
#[derive(Debug, Clone)]
pub struct BindOp {
    pub name: Rc<str>,
    pub target: Target,
}

bitflags! {
    /// Which lifecycle fan-outs a unit needs beyond create and update.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Lifecycle: u32 {
        const BIND = 0b0001;
        const CHILDREN = 0b0010;
        const LISTENERS = 0b0100;
        const TRANSITIONS = 0b1000;
    }
}

/// One compiled template shape.
#[derive(Default)]
pub struct Unit {
    pub refs: Vec<Reference>,
    pub create: Vec<CreateOp>,
    pub update: Vec<UpdateOp>,
    pub binds: Vec<BindOp>,
    pub exports: IndexMap<String, Target>,
    pub roots: Vec<Placement>,
    pub node_count: usize,
    pub child_count: usize,
    pub fragment_count: usize,
    pub prev_count: usize,
    pub display_count: usize,
    pub is_single_root: bool,
    pub lifecycle: Lifecycle,
}

impl Unit {
    fn reference(&self, index: RefIndex) -> &Reference {
        &self.refs[index.0]
    }

    pub fn callback(&self, index: RefIndex) -> &Callback {
        match self.reference(index) {
            Reference::Callback(callback) => callback,
            other => unreachable!("reference {} is a {}, not a callback", index.0, other.kind()),
        }
    }

    pub fn handler(&self, index: RefIndex) -> &Handler {
        match self.reference(index) {
            Reference::Handler(handler) => handler,
            other => unreachable!("reference {} is a {}, not a handler", index.0, other.kind()),
        }
    }

    pub fn component(&self, index: RefIndex) -> &Rc<dyn ComponentClass> {
        match self.reference(index) {
            Reference::Component(class) => class,
            other => unreachable!("reference {} is a {}, not a component", index.0, other.kind()),
        }
    }

    pub fn block(&self, index: RefIndex) -> &Rc<dyn BlockFactory> {
        match self.reference(index) {
            Reference::Block(factory) => factory,
            other => unreachable!("reference {} is a {}, not a block", index.0, other.kind()),
        }
    }

    pub fn transition(&self, index: RefIndex) -> &TransitionFactory {
        match self.reference(index) {
            Reference::Transition(factory) => factory,
            other => unreachable!("reference {} is a {}, not a transition", index.0, other.kind()),
        }
    }

    pub fn html(&self, index: RefIndex) -> (&Html, Option<&NodeList>) {
        match self.reference(index) {
            Reference::Html { html, parsed } => (html, parsed.as_ref()),
            other => unreachable!("reference {} is a {}, not html", index.0, other.kind()),
        }
    }

    pub fn value(&self, index: RefIndex) -> &Value {
        match self.reference(index) {
            Reference::Value(value) => value,
            other => unreachable!("reference {} is a {}, not a value", index.0, other.kind()),
        }
    }

    /// Number of dynamic expressions evaluated per update.
    pub fn expression_count(&self) -> usize {
        self.prev_count
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("nodes", &self.node_count)
            .field("children", &self.child_count)
            .field("fragments", &self.fragment_count)
            .field("expressions", &self.prev_count)
            .field("references", &self.refs.len())
            .field("create_ops", &self.create.len())
            .field("update_ops", &self.update.len())
            .field("single_root", &self.is_single_root)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
