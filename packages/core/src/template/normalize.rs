//! Template Tree Normalizer
//!
//! Turns one authored template into a uniform [`TemplateNode`] tree:
//! unwraps builders, expands shorthand types, wraps lists as fragments, runs
//! the plugin transforms, classifies each node and recurses into children.

use std::rc::Rc;

use crate::codegen::Compiler;
use crate::error::{Result, TemplateError};
use crate::value::{Html, Value};

use super::authored::{ComponentType, Template, TemplateMap, CHILD_NODES, COMMENT_TYPE, TYPE};
use super::fields::Fields;
use super::node::{NodeData, TemplateNode};
use super::plugins::unwrap_builders;
use super::shorthand::{is_shorthand, parse_shorthand};

/// Normalize `template` and everything below it.
pub fn normalize(template: Template, compiler: &Compiler) -> Result<TemplateNode> {
    let template = unwrap_builders(template);
    let template = match template {
        Template::Map(map) => Template::Map(expand_shorthand(map)?),
        Template::List(items) => Template::Map(TemplateMap::new().with(CHILD_NODES, items)),
        other => other,
    };
    let template = compiler.plugins().transform_node(template)?;
    classify(template, compiler)
}

fn classify(template: Template, compiler: &Compiler) -> Result<TemplateNode> {
    match template {
        Template::Map(map) => classify_map(map, compiler),
        // plugins may hand back a list; it is still a fragment
        Template::List(items) => {
            classify_map(TemplateMap::new().with(CHILD_NODES, items), compiler)
        }
        Template::Value(value) => classify_value(value, compiler),
        Template::Callback(callback) => Ok(leaf(NodeData::DynamicText(callback))),
        other => Err(TemplateError::invalid_value(
            "template",
            format!("a {} cannot be rendered as a node", other.describe()),
        )),
    }
}

fn leaf(data: NodeData) -> TemplateNode {
    TemplateNode::new(data, TemplateMap::new(), Vec::new())
}

fn classify_value(value: Value, compiler: &Compiler) -> Result<TemplateNode> {
    match value {
        Value::String(text) => Ok(leaf(NodeData::Text(text))),
        Value::Number(_) | Value::Bool(_) => Ok(leaf(NodeData::Text(Rc::from(value.to_text())))),
        Value::Html(html) => Ok(leaf(html_node(html, compiler))),
        other => Err(TemplateError::invalid_value(
            "template",
            format!("a {} value cannot be rendered as a node", other.type_name()),
        )),
    }
}

fn html_node(html: Html, compiler: &Compiler) -> NodeData {
    let parsed = match compiler.renderer() {
        Some(renderer) if compiler.config().eager_html => Some(renderer.parse_html(&html)),
        _ => None,
    };
    NodeData::Html { html, parsed }
}

fn classify_map(mut map: TemplateMap, compiler: &Compiler) -> Result<TemplateNode> {
    let type_ = map.remove(TYPE);
    let children = map.remove(CHILD_NODES);

    let data = match type_ {
        None => NodeData::Fragment,
        Some(Template::Component(ComponentType::Plain(class))) => NodeData::Component(class),
        Some(Template::Component(ComponentType::Integrated(class))) => {
            let fields = Fields::new(&map);
            let factory = class.integrate(&fields, compiler)?;
            let consumed = fields.consumed();
            NodeData::Integrated {
                class,
                factory,
                consumed,
            }
        }
        Some(Template::Value(Value::String(tag))) if &*tag == COMMENT_TYPE => NodeData::Comment,
        Some(Template::Value(Value::String(tag))) => NodeData::Element { tag },
        Some(other) => {
            return Err(TemplateError::invalid_value(
                TYPE,
                format!("expected a tag name or component type, found {}", other.describe()),
            ))
        }
    };

    let kind = data.kind();
    let child_nodes = match children {
        None => Vec::new(),
        Some(_) if !kind.allows_children() => {
            return Err(TemplateError::ChildNodesNotAllowed { kind: kind.name() })
        }
        Some(children) => normalize_children(children, compiler)?,
    };

    Ok(TemplateNode::new(data, map, child_nodes))
}

fn normalize_children(children: Template, compiler: &Compiler) -> Result<Vec<TemplateNode>> {
    let siblings = match unwrap_builders(children) {
        Template::List(items) => items,
        single => vec![single],
    };
    compiler
        .plugins()
        .transform_group(siblings)?
        .into_iter()
        .map(|child| normalize(child, compiler))
        .collect()
}

/// Expand a shorthand `type` into discrete fields. Explicit fields win over
/// shorthand ones, except `class`, which is merged.
fn expand_shorthand(mut map: TemplateMap) -> Result<TemplateMap> {
    let spec = match map.get(TYPE).and_then(|t| t.as_str()) {
        Some(spec) if spec != COMMENT_TYPE && is_shorthand(spec) => spec.to_string(),
        _ => return Ok(map),
    };
    let shorthand = parse_shorthand(&spec)?;
    map.insert(TYPE, shorthand.tag.as_str());

    if let Some(class) = shorthand.class() {
        match map.get("class") {
            None => {
                map.insert("class", class);
            }
            Some(Template::Value(Value::String(existing))) => {
                let merged = format!("{} {}", class, existing);
                map.insert("class", merged);
            }
            Some(_) => {
                // dynamic class keeps ownership of the attribute; toggle the static ones
                for name in &shorthand.classes {
                    let key = format!("class_{}", name);
                    if !map.contains_key(&key) {
                        map.insert(key, true);
                    }
                }
            }
        }
    }
    if let Some(id) = shorthand.id {
        if !map.contains_key("id") {
            map.insert("id", id);
        }
    }
    for (name, value) in shorthand.attributes {
        if map.contains_key(&name) {
            continue;
        }
        match value {
            Some(value) => map.insert(name, value),
            None => map.insert(name, true),
        };
    }
    Ok(map)
}
