//! Ingest
//!
//! Walks a normalized node tree and emits the create, update and bind
//! operations of one compiled unit. Nested control-flow content arrives here
//! already compiled, wrapped in the block factories of integrated nodes.

use std::collections::HashSet;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::config::CompilerConfig;
use crate::error::{Result, TemplateError};
use crate::template::authored::{Template, TemplateMap};
use crate::template::node::{NodeData, NodeKind, TemplateNode};
use crate::value::Value;

use super::ops::{
    BindOp, ChildSlot, CreateOp, FragmentSlot, HandlerSource, Lifecycle, NodeSlot, Placement,
    PrevSlot, RefIndex, Reference, Target, Unit, UpdateOp,
};

pub const EXPORT: &str = "export";
pub const BIND: &str = "bind";
pub const TEXT: &str = "text";
pub const DISPLAY: &str = "display";
pub const ON_PREFIX: &str = "on_";
pub const CLASS_PREFIX: &str = "class_";
pub const STYLE_PREFIX: &str = "style_";
pub const ATTR_PREFIX: &str = "attr_";

type Placements = SmallVec<[Placement; 2]>;

/// Build the unit for `root`.
pub fn ingest_unit(root: &TemplateNode, config: &CompilerConfig) -> Result<Unit> {
    let mut ingest = Ingest {
        unit: Unit::default(),
        strict: config.strict,
        bind_names: HashSet::new(),
    };
    let roots = ingest.ingest_node(root)?;
    let mut unit = ingest.unit;
    unit.roots = roots.into_vec();
    unit.is_single_root = root.is_single_root;
    Ok(unit)
}

struct Ingest {
    unit: Unit,
    strict: bool,
    bind_names: HashSet<String>,
}

impl Ingest {
    fn alloc_node(&mut self) -> NodeSlot {
        self.unit.node_count += 1;
        NodeSlot(self.unit.node_count - 1)
    }

    fn alloc_child(&mut self) -> ChildSlot {
        self.unit.child_count += 1;
        self.unit.lifecycle |= Lifecycle::CHILDREN;
        ChildSlot(self.unit.child_count - 1)
    }

    fn alloc_fragment(&mut self) -> FragmentSlot {
        self.unit.fragment_count += 1;
        FragmentSlot(self.unit.fragment_count - 1)
    }

    fn alloc_prev(&mut self) -> PrevSlot {
        self.unit.prev_count += 1;
        PrevSlot(self.unit.prev_count - 1)
    }

    fn push_ref(&mut self, reference: Reference) -> RefIndex {
        self.unit.refs.push(reference);
        RefIndex(self.unit.refs.len() - 1)
    }

    fn create(&mut self, op: CreateOp) {
        self.unit.create.push(op);
    }

    fn update(&mut self, op: UpdateOp) {
        self.unit.update.push(op);
    }

    /// Report a field nobody recognized.
    fn unknown(&self, key: &str, kind: NodeKind) -> Result<()> {
        if self.strict {
            return Err(TemplateError::unknown_key(key, kind.name()));
        }
        log::warn!("ignoring unknown key '{}' on {} node", key, kind.name());
        Ok(())
    }

    fn ingest_node(&mut self, node: &TemplateNode) -> Result<Placements> {
        match &node.data {
            NodeData::Text(text) => {
                let slot = self.alloc_node();
                self.create(CreateOp::Text {
                    node: slot,
                    text: text.clone(),
                });
                Ok(SmallVec::from_elem(Placement::Node(slot), 1))
            }
            NodeData::DynamicText(callback) => {
                let slot = self.alloc_node();
                self.create(CreateOp::Text {
                    node: slot,
                    text: Rc::from(""),
                });
                let expr = self.push_ref(Reference::Callback(callback.clone()));
                let prev = self.alloc_prev();
                self.update(UpdateOp::Text {
                    node: slot,
                    expr,
                    prev,
                });
                Ok(SmallVec::from_elem(Placement::Node(slot), 1))
            }
            NodeData::Html { html, parsed } => {
                let fragment = self.alloc_fragment();
                let html = self.push_ref(Reference::Html {
                    html: html.clone(),
                    parsed: parsed.clone(),
                });
                self.create(CreateOp::Html { fragment, html });
                Ok(SmallVec::from_elem(Placement::Fragment(fragment), 1))
            }
            NodeData::Comment => self.ingest_comment(node),
            NodeData::Element { tag } => self.ingest_element(node, tag.clone()),
            NodeData::Fragment => {
                for key in node.fields.keys() {
                    self.unknown(key, NodeKind::Fragment)?;
                }
                let mut placements = Placements::new();
                for child in &node.child_nodes {
                    placements.extend(self.ingest_node(child)?);
                }
                Ok(placements)
            }
            NodeData::Component(class) => {
                let child = self.alloc_child();
                let class = self.push_ref(Reference::Component(class.clone()));
                self.create(CreateOp::Component { child, class });
                self.ingest_component_fields(child, &node.fields)?;
                Ok(SmallVec::from_elem(Placement::Child(child), 1))
            }
            NodeData::Integrated {
                factory, consumed, ..
            } => {
                let child = self.alloc_child();
                let factory = self.push_ref(Reference::Block(factory.clone()));
                self.create(CreateOp::Block { child, factory });
                self.update(UpdateOp::Child { child });
                for (key, value) in node.fields.iter() {
                    match key {
                        EXPORT => self.export(value, Target::Child(child))?,
                        BIND => self.bind(value, Target::Child(child))?,
                        _ if consumed.iter().any(|c| c == key) => {}
                        _ => self.unknown(key, NodeKind::Integrated)?,
                    }
                }
                Ok(SmallVec::from_elem(Placement::Child(child), 1))
            }
        }
    }

    fn ingest_comment(&mut self, node: &TemplateNode) -> Result<Placements> {
        let slot = self.alloc_node();
        let mut text: Rc<str> = Rc::from("");
        let mut dynamic = None;
        for (key, value) in node.fields.iter() {
            match (key, value) {
                (TEXT, Template::Value(v)) => text = Rc::from(v.to_text()),
                (TEXT, Template::Callback(callback)) => dynamic = Some(callback.clone()),
                (TEXT, other) => {
                    return Err(TemplateError::invalid_value(
                        TEXT,
                        format!("comment text cannot be a {}", other.describe()),
                    ))
                }
                (EXPORT, value) => self.export(value, Target::Node(slot))?,
                (BIND, value) => self.bind(value, Target::Node(slot))?,
                (key, _) => self.unknown(key, NodeKind::Comment)?,
            }
        }
        self.create(CreateOp::Comment { node: slot, text });
        if let Some(callback) = dynamic {
            let expr = self.push_ref(Reference::Callback(callback));
            let prev = self.alloc_prev();
            self.update(UpdateOp::Text {
                node: slot,
                expr,
                prev,
            });
        }
        Ok(SmallVec::from_elem(Placement::Node(slot), 1))
    }

    fn ingest_element(&mut self, node: &TemplateNode, tag: Rc<str>) -> Result<Placements> {
        let slot = self.alloc_node();
        self.create(CreateOp::Element { node: slot, tag });
        self.ingest_element_fields(slot, &node.fields)?;
        for child in &node.child_nodes {
            for placement in self.ingest_node(child)? {
                self.create(CreateOp::Append {
                    parent: slot,
                    placement,
                });
            }
        }
        Ok(SmallVec::from_elem(Placement::Node(slot), 1))
    }

    fn ingest_element_fields(&mut self, node: NodeSlot, fields: &TemplateMap) -> Result<()> {
        for (key, value) in fields.iter() {
            match key {
                EXPORT => self.export(value, Target::Node(node))?,
                BIND => self.bind(value, Target::Node(node))?,
                TEXT => self.text(node, value)?,
                DISPLAY => self.display(node, value)?,
                _ => {
                    if let Some(event) = key.strip_prefix(ON_PREFIX) {
                        self.listener(node, event, value)?;
                    } else if let Some(name) = key.strip_prefix(CLASS_PREFIX) {
                        self.class_toggle(node, key, name, value)?;
                    } else if let Some(name) = key.strip_prefix(STYLE_PREFIX) {
                        self.style(node, key, name, value)?;
                    } else if let Some(name) = key.strip_prefix(ATTR_PREFIX) {
                        self.attribute(node, key, name, value)?;
                    } else {
                        self.attribute(node, key, key, value)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn ingest_component_fields(&mut self, child: ChildSlot, fields: &TemplateMap) -> Result<()> {
        for (key, value) in fields.iter() {
            match (key, value) {
                (EXPORT, value) => self.export(value, Target::Child(child))?,
                (BIND, value) => self.bind(value, Target::Child(child))?,
                (key, Template::Value(v)) => {
                    let value = self.push_ref(Reference::Value(v.clone()));
                    self.create(CreateOp::Property {
                        child,
                        name: Rc::from(key),
                        value,
                    });
                }
                (key, Template::Callback(callback)) => {
                    let expr = self.push_ref(Reference::Callback(callback.clone()));
                    let prev = self.alloc_prev();
                    self.update(UpdateOp::Property {
                        child,
                        name: Rc::from(key),
                        expr,
                        prev,
                    });
                }
                (key, other) => {
                    return Err(TemplateError::invalid_value(
                        key,
                        format!("component properties cannot be a {}", other.describe()),
                    ))
                }
            }
        }
        Ok(())
    }

    fn name_of(key: &str, value: &Template) -> Result<String> {
        match value {
            Template::Value(Value::String(name)) if !name.is_empty() => Ok(name.to_string()),
            other => Err(TemplateError::invalid_value(
                key,
                format!("expected a name, found {}", other.describe()),
            )),
        }
    }

    fn export(&mut self, value: &Template, target: Target) -> Result<()> {
        let name = Self::name_of(EXPORT, value)?;
        if self.unit.exports.contains_key(&name) {
            return Err(TemplateError::DuplicateExport(name));
        }
        self.unit.exports.insert(name, target);
        Ok(())
    }

    fn bind(&mut self, value: &Template, target: Target) -> Result<()> {
        let name = Self::name_of(BIND, value)?;
        if !self.bind_names.insert(name.clone()) {
            return Err(TemplateError::DuplicateBind(name));
        }
        self.unit.binds.push(BindOp {
            name: Rc::from(name),
            target,
        });
        self.unit.lifecycle |= Lifecycle::BIND;
        Ok(())
    }

    fn attribute(&mut self, node: NodeSlot, key: &str, name: &str, value: &Template) -> Result<()> {
        match value {
            Template::Value(v) => {
                if let Some(text) = attribute_text(key, v)? {
                    self.create(CreateOp::Attribute {
                        node,
                        name: Rc::from(name),
                        value: Rc::from(text),
                    });
                }
            }
            Template::Callback(callback) => {
                let expr = self.push_ref(Reference::Callback(callback.clone()));
                let prev = self.alloc_prev();
                self.update(UpdateOp::Attribute {
                    node,
                    name: Rc::from(name),
                    expr,
                    prev,
                });
            }
            other => {
                return Err(TemplateError::invalid_value(
                    key,
                    format!("attributes cannot be a {}", other.describe()),
                ))
            }
        }
        Ok(())
    }

    fn class_toggle(&mut self, node: NodeSlot, key: &str, name: &str, value: &Template) -> Result<()> {
        let (value, transition) = match value {
            Template::Animated(inner, factory) => {
                let transition = self.push_ref(Reference::Transition(factory.clone()));
                self.unit.lifecycle |= Lifecycle::TRANSITIONS;
                (inner.as_ref(), Some(transition))
            }
            other => (other, None),
        };
        match value {
            Template::Value(v) => {
                if v.is_truthy() {
                    self.create(CreateOp::Class {
                        node,
                        name: Rc::from(name),
                    });
                }
            }
            Template::Callback(callback) => {
                let expr = self.push_ref(Reference::Callback(callback.clone()));
                let prev = self.alloc_prev();
                self.update(UpdateOp::Class {
                    node,
                    name: Rc::from(name),
                    expr,
                    prev,
                    transition,
                });
            }
            other => {
                return Err(TemplateError::invalid_value(
                    key,
                    format!("expected a boolean or callable, found {}", other.describe()),
                ))
            }
        }
        Ok(())
    }

    fn style(&mut self, node: NodeSlot, key: &str, name: &str, value: &Template) -> Result<()> {
        match value {
            Template::Value(v) if v.is_nullish() => {}
            Template::Value(v @ (Value::String(_) | Value::Number(_))) => {
                self.create(CreateOp::Style {
                    node,
                    name: Rc::from(name),
                    value: Rc::from(v.to_text()),
                });
            }
            Template::Callback(callback) => {
                let expr = self.push_ref(Reference::Callback(callback.clone()));
                let prev = self.alloc_prev();
                self.update(UpdateOp::Style {
                    node,
                    name: Rc::from(name),
                    expr,
                    prev,
                });
            }
            other => {
                return Err(TemplateError::invalid_value(
                    key,
                    format!("styles cannot be a {}", other.describe()),
                ))
            }
        }
        Ok(())
    }

    fn display(&mut self, node: NodeSlot, value: &Template) -> Result<()> {
        let (value, transition) = match value {
            Template::Animated(inner, factory) => {
                let transition = self.push_ref(Reference::Transition(factory.clone()));
                self.unit.lifecycle |= Lifecycle::TRANSITIONS;
                (inner.as_ref(), Some(transition))
            }
            other => (other, None),
        };
        match value {
            Template::Value(Value::Bool(true)) => {}
            Template::Value(Value::Bool(false) | Value::Null | Value::Undefined) => {
                self.create(CreateOp::Style {
                    node,
                    name: Rc::from(DISPLAY),
                    value: Rc::from("none"),
                });
            }
            Template::Value(Value::String(display)) => {
                self.create(CreateOp::Style {
                    node,
                    name: Rc::from(DISPLAY),
                    value: display.clone(),
                });
            }
            Template::Callback(callback) => {
                let expr = self.push_ref(Reference::Callback(callback.clone()));
                let prev = self.alloc_prev();
                let state = self.unit.display_count;
                self.unit.display_count += 1;
                self.update(UpdateOp::Display {
                    node,
                    expr,
                    prev,
                    state,
                    transition,
                });
            }
            other => {
                return Err(TemplateError::invalid_value(
                    DISPLAY,
                    format!("expected a boolean, string or callable, found {}", other.describe()),
                ))
            }
        }
        Ok(())
    }

    fn text(&mut self, node: NodeSlot, value: &Template) -> Result<()> {
        match value {
            Template::Value(v) if v.is_nullish() => {}
            Template::Value(v @ Value::Html(_)) => self.create(CreateOp::Content {
                node,
                value: v.clone(),
            }),
            Template::Value(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => {
                self.create(CreateOp::Content {
                    node,
                    value: Value::from(v.to_text()),
                })
            }
            Template::Callback(callback) => {
                let expr = self.push_ref(Reference::Callback(callback.clone()));
                let prev = self.alloc_prev();
                self.update(UpdateOp::Content { node, expr, prev });
            }
            other => {
                return Err(TemplateError::invalid_value(
                    TEXT,
                    format!("expected text, markup or a callable, found {}", other.describe()),
                ))
            }
        }
        Ok(())
    }

    fn listener(&mut self, node: NodeSlot, event: &str, value: &Template) -> Result<()> {
        let handler = match value {
            Template::Handler(handler) => {
                HandlerSource::Handler(self.push_ref(Reference::Handler(handler.clone())))
            }
            Template::Callback(callback) => {
                HandlerSource::Callback(self.push_ref(Reference::Callback(callback.clone())))
            }
            Template::Value(Value::String(method)) => HandlerSource::Method(method.clone()),
            _ => {
                return Err(TemplateError::InvalidHandler {
                    event: event.to_string(),
                })
            }
        };
        self.create(CreateOp::Listener {
            node,
            event: Rc::from(event),
            handler,
        });
        self.unit.lifecycle |= Lifecycle::LISTENERS;
        Ok(())
    }
}

/// Attribute text for a literal, or `None` when the attribute is omitted.
fn attribute_text(key: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Undefined | Value::Null | Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some(String::new())),
        Value::String(_) | Value::Number(_) => Ok(Some(value.to_text())),
        other => Err(TemplateError::invalid_value(
            key,
            format!("attributes cannot be a {}", other.type_name()),
        )),
    }
}
