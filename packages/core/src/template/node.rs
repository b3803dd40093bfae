//! Normalized Template Nodes
//!
//! The uniform node tree produced by the normalizer and consumed once by the
//! code generator.

use std::fmt;
use std::rc::Rc;

use crate::blocks::{BlockFactory, IntegratedClass};
use crate::component::ComponentClass;
use crate::env::renderer::NodeList;
use crate::value::Html;

use super::authored::{Callback, TemplateMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    DynamicText,
    Html,
    Comment,
    Element,
    Fragment,
    Component,
    Integrated,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Text => "text",
            NodeKind::DynamicText => "dynamic text",
            NodeKind::Html => "html",
            NodeKind::Comment => "comment",
            NodeKind::Element => "element",
            NodeKind::Fragment => "fragment",
            NodeKind::Component => "component",
            NodeKind::Integrated => "integrated component",
        }
    }

    pub fn allows_children(&self) -> bool {
        matches!(self, NodeKind::Element | NodeKind::Fragment)
    }
}

/// Kind-specific payload of a normalized node.
pub enum NodeData {
    Text(Rc<str>),
    DynamicText(Callback),
    Html {
        html: Html,
        /// Detached nodes parsed at compile time, cloned per instance.
        parsed: Option<NodeList>,
    },
    Comment,
    Element {
        tag: Rc<str>,
    },
    Fragment,
    Component(Rc<dyn ComponentClass>),
    Integrated {
        class: Rc<dyn IntegratedClass>,
        factory: Rc<dyn BlockFactory>,
        /// Fields read by the class while integrating.
        consumed: Vec<String>,
    },
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Text(_) => NodeKind::Text,
            NodeData::DynamicText(_) => NodeKind::DynamicText,
            NodeData::Html { .. } => NodeKind::Html,
            NodeData::Comment => NodeKind::Comment,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Fragment => NodeKind::Fragment,
            NodeData::Component(_) => NodeKind::Component,
            NodeData::Integrated { .. } => NodeKind::Integrated,
        }
    }
}

pub struct TemplateNode {
    pub data: NodeData,
    /// Authored fields left after normalization (`type` and `child_nodes` removed).
    pub fields: TemplateMap,
    pub child_nodes: Vec<TemplateNode>,
    pub is_single_root: bool,
}

impl TemplateNode {
    pub fn new(data: NodeData, fields: TemplateMap, child_nodes: Vec<TemplateNode>) -> Self {
        let mut node = TemplateNode {
            data,
            fields,
            child_nodes,
            is_single_root: true,
        };
        node.is_single_root = node.compute_single_root();
        node
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    fn compute_single_root(&self) -> bool {
        match &self.data {
            NodeData::Fragment => {
                self.child_nodes.len() == 1 && self.child_nodes[0].is_single_root
            }
            NodeData::Html { parsed, .. } => parsed.as_ref().map_or(false, |p| p.len() == 1),
            NodeData::Component(class) => class.is_single_root(),
            NodeData::Integrated { factory, .. } => factory.is_single_root(),
            _ => true,
        }
    }
}

impl fmt::Debug for TemplateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("TemplateNode");
        s.field("kind", &self.kind());
        match &self.data {
            NodeData::Text(text) => {
                s.field("text", text);
            }
            NodeData::Element { tag } => {
                s.field("tag", tag);
            }
            NodeData::Component(class) => {
                s.field("component", &class.name());
            }
            NodeData::Integrated { class, .. } => {
                s.field("integrated", &class.name());
            }
            _ => {}
        }
        if !self.fields.is_empty() {
            s.field("fields", &self.fields);
        }
        if !self.child_nodes.is_empty() {
            s.field("child_nodes", &self.child_nodes);
        }
        s.field("is_single_root", &self.is_single_root).finish()
    }
}
