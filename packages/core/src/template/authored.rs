//! Authored Templates
//!
//! Template data as written by hand, before normalization: mappings, lists,
//! literals, callables and component types.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::blocks::IntegratedClass;
use crate::component::ComponentClass;
use crate::context::Context;
use crate::env::renderer::Event;
use crate::env::transition::TransitionFactory;
use crate::value::{Html, Value};

/// A dynamic expression, evaluated against the model first and the context second.
pub type Callback = Rc<dyn Fn(&Value, &Context) -> Value>;

/// An event handler.
pub type Handler = Rc<dyn Fn(&Event, &Value, &Context)>;

/// Fluent authoring sugar that unwraps to ordinary template data.
pub trait TemplateBuilder {
    fn build(&self) -> Template;
}

/// The type of a component node.
#[derive(Clone)]
pub enum ComponentType {
    Plain(Rc<dyn ComponentClass>),
    Integrated(Rc<dyn IntegratedClass>),
}

impl ComponentType {
    pub fn name(&self) -> &str {
        match self {
            ComponentType::Plain(class) => class.name(),
            ComponentType::Integrated(class) => class.name(),
        }
    }
}

/// One authored template value.
#[derive(Clone)]
pub enum Template {
    /// A literal: text, markup, numbers, booleans.
    Value(Value),
    /// A list of siblings; normalizes to a fragment.
    List(Vec<Template>),
    /// A node description keyed by field name.
    Map(TemplateMap),
    /// A dynamic expression.
    Callback(Callback),
    /// A callable producing embeddable content rather than text.
    Content(Callback),
    Handler(Handler),
    Component(ComponentType),
    Transition(TransitionFactory),
    /// A value whose changes are animated through a transition.
    Animated(Box<Template>, TransitionFactory),
    Builder(Rc<dyn TemplateBuilder>),
}

impl Template {
    pub fn dynamic<V, F>(f: F) -> Template
    where
        V: Into<Value>,
        F: Fn(&Value, &Context) -> V + 'static,
    {
        Template::Callback(Rc::new(move |model: &Value, ctx: &Context| -> Value {
            f(model, ctx).into()
        }))
    }

    pub fn content<V, F>(f: F) -> Template
    where
        V: Into<Value>,
        F: Fn(&Value, &Context) -> V + 'static,
    {
        Template::Content(Rc::new(move |model: &Value, ctx: &Context| -> Value {
            f(model, ctx).into()
        }))
    }

    pub fn handler(f: impl Fn(&Event, &Value, &Context) + 'static) -> Template {
        Template::Handler(Rc::new(f))
    }

    pub fn component(class: impl ComponentClass + 'static) -> Template {
        Template::Component(ComponentType::Plain(Rc::new(class)))
    }

    pub fn integrated(class: impl IntegratedClass + 'static) -> Template {
        Template::Component(ComponentType::Integrated(Rc::new(class)))
    }

    pub fn transition(factory: TransitionFactory) -> Template {
        Template::Transition(factory)
    }

    pub fn animated(value: impl Into<Template>, factory: TransitionFactory) -> Template {
        Template::Animated(Box::new(value.into()), factory)
    }

    pub fn html(markup: &str) -> Template {
        Template::Value(Value::Html(Html::new(markup)))
    }

    pub fn as_map(&self) -> Option<&TemplateMap> {
        match self {
            Template::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Template::Value(v) => v.as_str(),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Template::Value(v) => v.type_name(),
            Template::List(_) => "list",
            Template::Map(_) => "mapping",
            Template::Callback(_) => "callable",
            Template::Content(_) => "content callable",
            Template::Handler(_) => "handler",
            Template::Component(_) => "component type",
            Template::Transition(_) => "transition",
            Template::Animated(..) => "animated value",
            Template::Builder(_) => "builder",
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Value(v) => write!(f, "{:?}", v),
            Template::List(items) => f.debug_list().entries(items.iter()).finish(),
            Template::Map(map) => write!(f, "{:?}", map),
            Template::Component(c) => write!(f, "<{}>", c.name()),
            other => write!(f, "<{}>", other.describe()),
        }
    }
}

impl From<Value> for Template {
    fn from(v: Value) -> Self {
        Template::Value(v)
    }
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Template::Value(Value::from(s))
    }
}

impl From<String> for Template {
    fn from(s: String) -> Self {
        Template::Value(Value::from(s))
    }
}

impl From<bool> for Template {
    fn from(b: bool) -> Self {
        Template::Value(Value::Bool(b))
    }
}

impl From<i32> for Template {
    fn from(n: i32) -> Self {
        Template::Value(Value::from(n))
    }
}

impl From<f64> for Template {
    fn from(n: f64) -> Self {
        Template::Value(Value::Number(n))
    }
}

impl From<Html> for Template {
    fn from(h: Html) -> Self {
        Template::Value(Value::Html(h))
    }
}

impl From<TemplateMap> for Template {
    fn from(map: TemplateMap) -> Self {
        Template::Map(map)
    }
}

impl From<Vec<Template>> for Template {
    fn from(items: Vec<Template>) -> Self {
        Template::List(items)
    }
}

impl From<ComponentType> for Template {
    fn from(c: ComponentType) -> Self {
        Template::Component(c)
    }
}

/// An ordered field mapping describing one node.
#[derive(Clone, Default)]
pub struct TemplateMap {
    entries: IndexMap<String, Template>,
}

impl TemplateMap {
    pub fn new() -> Self {
        TemplateMap::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Template>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    /// Append one entry to `child_nodes`.
    pub fn child(mut self, child: impl Into<Template>) -> Self {
        let child = child.into();
        match self.entries.get_mut(CHILD_NODES) {
            Some(Template::List(children)) => children.push(child),
            Some(existing) => {
                let first = std::mem::replace(existing, Template::List(Vec::new()));
                *existing = Template::List(vec![first, child]);
            }
            None => {
                self.entries
                    .insert(CHILD_NODES.to_string(), Template::List(vec![child]));
            }
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Template> {
        self.entries.get(key)
    }

    pub(crate) fn get_key_value(&self, key: &str) -> Option<(&String, &Template)> {
        self.entries.get_key_value(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Template>) -> Option<Template> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a field, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Template> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TemplateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// Field holding a node's type.
pub const TYPE: &str = "type";
/// Field holding a node's children.
pub const CHILD_NODES: &str = "child_nodes";
/// Type string marking a comment node.
pub const COMMENT_TYPE: &str = "#comment";

/// Start an element (or shorthand) template: `el("div.card#main")`.
pub fn el(type_spec: &str) -> TemplateMap {
    TemplateMap::new().with(TYPE, type_spec)
}

/// A comment node template.
pub fn comment(text: impl Into<Template>) -> TemplateMap {
    TemplateMap::new().with(TYPE, COMMENT_TYPE).with("text", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_appends_to_child_nodes() {
        let map = el("ul").child("a").child("b");
        match map.get(CHILD_NODES) {
            Some(Template::List(children)) => assert_eq!(children.len(), 2),
            other => panic!("unexpected child_nodes {:?}", other),
        }
    }

    #[test]
    fn child_wraps_a_single_existing_child() {
        let map = el("p").with(CHILD_NODES, "first").child("second");
        match map.get(CHILD_NODES) {
            Some(Template::List(children)) => assert_eq!(children.len(), 2),
            other => panic!("unexpected child_nodes {:?}", other),
        }
    }

    #[test]
    fn remove_keeps_order() {
        let mut map = TemplateMap::new().with("a", 1).with("b", 2).with("c", 3);
        map.remove("b");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
