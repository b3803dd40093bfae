//! Rendered Instances
//!
//! The surface every live piece of output exposes: compiled template instances,
//! control-flow blocks and components alike.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::env::renderer::{NodeId, NodeList};
use crate::error::Result;
use crate::value::Value;

/// A live object owning a subregion of the output tree.
///
/// Root nodes must be re-read after every `update`, since conditional and
/// embedded content may have swapped them.
pub trait Rendered {
    /// Current root nodes, in document order.
    fn root_nodes(&self) -> NodeList;

    /// The single root node, for instances whose unit is single-root.
    fn root_node(&self) -> Option<NodeId> {
        self.root_nodes().first().copied()
    }

    fn is_single_root(&self) -> bool;

    /// Re-evaluate dynamic expressions, patching only what changed.
    fn update(&mut self) -> Result<()>;

    fn bind(&mut self) {}

    fn unbind(&mut self) {}

    /// Depth-first mount notification.
    fn set_mounted(&mut self, mounted: bool);

    /// Release output nodes. The instance is unusable afterwards.
    fn destroy(&mut self);

    /// Assign a property from an enclosing template. Ignored by default.
    fn set_property(&mut self, _name: &str, _value: Value) {}
}

/// Shared handle to a rendered instance.
#[derive(Clone)]
pub struct RenderedRef(Rc<RefCell<dyn Rendered>>);

impl RenderedRef {
    pub fn new<R: Rendered + 'static>(rendered: R) -> Self {
        RenderedRef(Rc::new(RefCell::new(rendered)))
    }

    pub fn from_box(rendered: Box<dyn Rendered>) -> Self {
        RenderedRef(Rc::new(RefCell::new(BoxedRendered(rendered))))
    }

    pub fn borrow(&self) -> Ref<'_, dyn Rendered> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn Rendered> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &RenderedRef) -> bool {
        self.addr() == other.addr()
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn root_nodes(&self) -> NodeList {
        self.0.borrow().root_nodes()
    }
}

impl fmt::Debug for RenderedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderedRef({:#x})", self.addr())
    }
}

struct BoxedRendered(Box<dyn Rendered>);

impl Rendered for BoxedRendered {
    fn root_nodes(&self) -> NodeList {
        self.0.root_nodes()
    }

    fn root_node(&self) -> Option<NodeId> {
        self.0.root_node()
    }

    fn is_single_root(&self) -> bool {
        self.0.is_single_root()
    }

    fn update(&mut self) -> Result<()> {
        self.0.update()
    }

    fn bind(&mut self) {
        self.0.bind()
    }

    fn unbind(&mut self) {
        self.0.unbind()
    }

    fn set_mounted(&mut self, mounted: bool) {
        self.0.set_mounted(mounted)
    }

    fn destroy(&mut self) {
        self.0.destroy()
    }

    fn set_property(&mut self, name: &str, value: Value) {
        self.0.set_property(name, value)
    }
}
