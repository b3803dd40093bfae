//! Renderer Primitives
//!
//! The host renderer's node operations. The core never touches output nodes
//! except through this trait.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::value::{Html, Value};

/// Handle to an output node owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn new(id: usize) -> Self {
        NodeId(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// Root node lists are almost always short.
pub type NodeList = SmallVec<[NodeId; 4]>;

/// Handle to a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub usize);

/// An event dispatched to a node.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
    pub detail: Value,
}

impl Event {
    pub fn new(name: &str, target: NodeId) -> Self {
        Event {
            name: name.to_string(),
            target,
            detail: Value::Undefined,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = detail.into();
        self
    }
}

pub type Listener = Rc<dyn Fn(&Event)>;

/// Primitive node operations supplied by the host.
pub trait Renderer {
    fn create_element(&self, tag: &str) -> NodeId;
    fn create_text(&self, text: &str) -> NodeId;
    fn create_comment(&self, text: &str) -> NodeId;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&self, node: NodeId, name: &str);

    fn style(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_style(&self, node: NodeId, name: &str, value: &str);
    fn remove_style(&self, node: NodeId, name: &str);

    fn add_class(&self, node: NodeId, name: &str);
    fn remove_class(&self, node: NodeId, name: &str);

    /// Insert `node` into `parent` before `reference`, or at the end when `None`.
    /// A node that already has a parent is moved.
    fn insert_before(&self, parent: NodeId, node: NodeId, reference: Option<NodeId>);
    /// Detach `node` from its parent, if it has one.
    fn remove(&self, node: NodeId);
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Text node data, or an element's plain text content.
    fn set_text(&self, node: NodeId, text: &str);
    /// An element's content as raw markup.
    fn set_html(&self, node: NodeId, html: &Html);

    /// Parse markup into detached nodes.
    fn parse_html(&self, html: &Html) -> NodeList;
    /// Deep clone of a subtree, detached.
    fn clone_node(&self, node: NodeId) -> NodeId;

    fn add_listener(&self, node: NodeId, event: &str, listener: Listener) -> ListenerId;
    fn remove_listener(&self, node: NodeId, listener: ListenerId);
}

/// Insert every node of `nodes` before `reference` under `parent`.
pub(crate) fn insert_all(
    renderer: &dyn Renderer,
    parent: NodeId,
    nodes: &[NodeId],
    reference: Option<NodeId>,
) {
    for node in nodes {
        renderer.insert_before(parent, *node, reference);
    }
}

/// Detach every node of `nodes` that is still attached.
pub(crate) fn remove_all(renderer: &dyn Renderer, nodes: &[NodeId]) {
    for node in nodes {
        if renderer.parent(*node).is_some() {
            renderer.remove(*node);
        }
    }
}
