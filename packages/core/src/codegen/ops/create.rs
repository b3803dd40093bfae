//! Create Operations
//!
//! Run once per instance, in order. Node, child and fragment slots are
//! allocated in the same order their create ops appear.

use std::rc::Rc;

use crate::value::Value;

use super::{ChildSlot, FragmentSlot, NodeSlot, Placement, RefIndex};

/// How a listener reaches user code.
#[derive(Debug, Clone)]
pub enum HandlerSource {
    /// A handler callable.
    Handler(RefIndex),
    /// An expression callable whose result is ignored.
    Callback(RefIndex),
    /// A model method looked up by name at dispatch time.
    Method(Rc<str>),
}

#[derive(Debug, Clone)]
pub enum CreateOp {
    Element {
        node: NodeSlot,
        tag: Rc<str>,
    },
    Text {
        node: NodeSlot,
        text: Rc<str>,
    },
    Comment {
        node: NodeSlot,
        text: Rc<str>,
    },
    /// Clone pre-parsed markup, or parse it now if it was not parsed at compile time.
    Html {
        fragment: FragmentSlot,
        html: RefIndex,
    },
    Component {
        child: ChildSlot,
        class: RefIndex,
    },
    /// Invoke a nested block factory.
    Block {
        child: ChildSlot,
        factory: RefIndex,
    },
    Append {
        parent: NodeSlot,
        placement: Placement,
    },
    Attribute {
        node: NodeSlot,
        name: Rc<str>,
        value: Rc<str>,
    },
    Class {
        node: NodeSlot,
        name: Rc<str>,
    },
    Style {
        node: NodeSlot,
        name: Rc<str>,
        value: Rc<str>,
    },
    /// Literal `text`: plain text or raw markup.
    Content {
        node: NodeSlot,
        value: Value,
    },
    Property {
        child: ChildSlot,
        name: Rc<str>,
        value: RefIndex,
    },
    Listener {
        node: NodeSlot,
        event: Rc<str>,
        handler: HandlerSource,
    },
}
