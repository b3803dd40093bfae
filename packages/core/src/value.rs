//! Runtime Values
//!
//! The dynamic values templates evaluate to: models, item keys, attribute values and
//! embeddable content all share one representation.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::env::renderer::{Event, NodeId};
use crate::rendered::RenderedRef;

/// Raw markup. Compared by value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Html(Rc<str>);

impl Html {
    pub fn new(markup: impl Into<Rc<str>>) -> Self {
        Html(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Html {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Html({:?})", &*self.0)
    }
}

/// A host object a template can read from, publish back-references onto and
/// dispatch late-bound event handlers to.
pub trait Object {
    /// Read a named property.
    fn get(&self, _name: &str) -> Value {
        Value::Undefined
    }

    /// Write a named property. Returns false if the object does not accept it.
    fn set(&self, _name: &str, _value: Value) -> bool {
        false
    }

    /// Invoke a named method as an event handler. Returns false if no such method exists.
    fn invoke(&self, _method: &str, _event: &Event) -> bool {
        false
    }

    /// Render-only objects produce markup instead of live nodes.
    fn render(&self) -> Option<Html> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// A dynamic value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Html(Html),
    Node(NodeId),
    Nodes(Rc<[NodeId]>),
    List(Rc<Vec<Value>>),
    Object(Rc<dyn Object>),
    Instance(RenderedRef),
}

fn same_object(a: &Rc<dyn Object>, b: &Rc<dyn Object>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

impl Value {
    pub fn object(object: impl Object + 'static) -> Self {
        Value::Object(Rc::new(object))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn html(markup: &str) -> Self {
        Value::Html(Html::new(markup))
    }

    /// `undefined` or `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<dyn Object>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Downcast an object value to its concrete type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_object().and_then(|o| o.as_any().downcast_ref::<T>())
    }

    /// Read a property of an object value. Anything else reads as `undefined`.
    pub fn get(&self, name: &str) -> Value {
        match self {
            Value::Object(o) => o.get(name),
            _ => Value::Undefined,
        }
    }

    /// Text rendering of a primitive, as written into text nodes and attributes.
    pub fn to_text(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Html(h) => h.as_str().to_string(),
            Value::List(items) => items
                .iter()
                .map(|v| v.to_text())
                .collect::<Vec<_>>()
                .join(","),
            Value::Node(_) | Value::Nodes(_) | Value::Object(_) | Value::Instance(_) => {
                format!("{:?}", self)
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Html(_) => "html",
            Value::Node(_) => "node",
            Value::Nodes(_) => "node list",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Instance(_) => "instance",
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // NaN is equal to itself so values can key hash maps
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Html(a), Value::Html(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Nodes(a), Value::Nodes(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => same_object(a, b),
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Undefined | Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => {
                let bits = if n.is_nan() {
                    f64::NAN.to_bits()
                } else if *n == 0.0 {
                    0u64
                } else {
                    n.to_bits()
                };
                bits.hash(state);
            }
            Value::String(s) => s.hash(state),
            Value::Html(h) => h.hash(state),
            Value::Node(n) => n.hash(state),
            Value::Nodes(nodes) => nodes.hash(state),
            Value::List(items) => (Rc::as_ptr(items) as usize).hash(state),
            Value::Object(o) => (Rc::as_ptr(o) as *const () as usize).hash(state),
            Value::Instance(i) => i.addr().hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{:?}", &**s),
            Value::Html(h) => write!(f, "{:?}", h),
            Value::Node(n) => write!(f, "{:?}", n),
            Value::Nodes(nodes) => f.debug_list().entries(nodes.iter()).finish(),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(o) => write!(f, "Object({:p})", Rc::as_ptr(o) as *const ()),
            Value::Instance(i) => write!(f, "Instance({:#x})", i.addr()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<Html> for Value {
    fn from(h: Html) -> Self {
        Value::Html(h)
    }
}

impl From<NodeId> for Value {
    fn from(node: NodeId) -> Self {
        Value::Node(node)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<RenderedRef> for Value {
    fn from(instance: RenderedRef) -> Self {
        Value::Instance(instance)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::list(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                let record = Record::new();
                for (key, value) in map {
                    record.set(&key, Value::from(value));
                }
                Value::object(record)
            }
        }
    }
}

/// A method registered on a [`Record`], invoked for late-bound event handlers.
pub type Method = Rc<dyn Fn(&Record, &Event)>;

/// A general purpose model object: ordered properties plus named methods.
#[derive(Default)]
pub struct Record {
    props: RefCell<IndexMap<String, Value>>,
    methods: RefCell<IndexMap<String, Method>>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Builder-style property assignment.
    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.props.borrow_mut().insert(name.to_string(), value.into());
        self
    }

    /// Builder-style method registration.
    pub fn with_method(self, name: &str, method: impl Fn(&Record, &Event) + 'static) -> Self {
        self.methods
            .borrow_mut()
            .insert(name.to_string(), Rc::new(method));
        self
    }

    pub fn into_value(self) -> Value {
        Value::object(self)
    }

    pub fn keys(&self) -> Vec<String> {
        self.props.borrow().keys().cloned().collect()
    }
}

impl Object for Record {
    fn get(&self, name: &str) -> Value {
        self.props.borrow().get(name).cloned().unwrap_or_default()
    }

    fn set(&self, name: &str, value: Value) -> bool {
        let mut props = self.props.borrow_mut();
        if value == Value::Undefined {
            props.shift_remove(name);
        } else {
            props.insert(name.to_string(), value);
        }
        true
    }

    fn invoke(&self, method: &str, event: &Event) -> bool {
        let method = self.methods.borrow().get(method).cloned();
        match method {
            Some(method) => {
                method(self, event);
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.props.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn nan_keys_are_equal() {
        let mut set = HashSet::new();
        set.insert(Value::Number(f64::NAN));
        assert!(set.contains(&Value::Number(f64::NAN)));
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
    }

    #[test]
    fn lists_and_objects_compare_by_identity() {
        let a = Value::list(vec![Value::from(1)]);
        let b = Value::list(vec![Value::from(1)]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let o = Record::new().into_value();
        assert_eq!(o, o.clone());
        assert_ne!(o, Record::new().into_value());
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
    }

    #[test]
    fn number_text_drops_integral_fraction() {
        assert_eq!(Value::from(3).to_text(), "3");
        assert_eq!(Value::from(2.5).to_text(), "2.5");
    }

    #[test]
    fn json_objects_become_records() {
        let value = Value::from(serde_json::json!({"name": "Ada", "tags": ["a", "b"]}));
        assert_eq!(value.get("name"), Value::from("Ada"));
        assert_eq!(value.get("tags").as_list().map(|l| l.len()), Some(2));
        assert!(value.downcast_ref::<Record>().is_some());
    }

    #[test]
    fn setting_undefined_removes_property() {
        let record = Record::new().with("a", 1);
        record.set("a", Value::Undefined);
        assert!(record.keys().is_empty());
    }
}
