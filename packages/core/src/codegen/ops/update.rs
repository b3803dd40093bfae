//! Update Operations
//!
//! Each dynamic expression owns one previous-value slot. An update evaluates
//! the expression, compares it with the slot and writes only on change.

use std::rc::Rc;

use super::{ChildSlot, NodeSlot, PrevSlot, RefIndex};

#[derive(Debug, Clone)]
pub enum UpdateOp {
    /// Text node or comment data.
    Text {
        node: NodeSlot,
        expr: RefIndex,
        prev: PrevSlot,
    },
    Attribute {
        node: NodeSlot,
        name: Rc<str>,
        expr: RefIndex,
        prev: PrevSlot,
    },
    Class {
        node: NodeSlot,
        name: Rc<str>,
        expr: RefIndex,
        prev: PrevSlot,
        transition: Option<RefIndex>,
    },
    Style {
        node: NodeSlot,
        name: Rc<str>,
        expr: RefIndex,
        prev: PrevSlot,
    },
    /// `display`: true restores, false or nullish hides, a string is explicit.
    Display {
        node: NodeSlot,
        expr: RefIndex,
        prev: PrevSlot,
        /// Index into the instance's saved display states.
        state: usize,
        transition: Option<RefIndex>,
    },
    /// Dynamic `text`: plain text or raw markup.
    Content {
        node: NodeSlot,
        expr: RefIndex,
        prev: PrevSlot,
    },
    Property {
        child: ChildSlot,
        name: Rc<str>,
        expr: RefIndex,
        prev: PrevSlot,
    },
    /// Fan out to a nested block.
    Child { child: ChildSlot },
}
