//! Binding Context
//!
//! Per-instance data compiled logic evaluates against.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::env::{Environment, Renderer};
use crate::value::Value;

pub struct Context {
    env: Rc<Environment>,
    model: RefCell<Value>,
    key: RefCell<Value>,
    index: Cell<usize>,
    outer: Option<Rc<Context>>,
}

impl Context {
    /// A root context.
    pub fn new(env: Rc<Environment>, model: Value) -> Rc<Self> {
        Rc::new(Context {
            env,
            model: RefCell::new(model),
            key: RefCell::new(Value::Undefined),
            index: Cell::new(0),
            outer: None,
        })
    }

    /// A context for one item of a repeat, enclosed by `outer`.
    pub fn nested(outer: &Rc<Context>, model: Value, key: Value, index: usize) -> Rc<Self> {
        Rc::new(Context {
            env: outer.env.clone(),
            model: RefCell::new(model),
            key: RefCell::new(key),
            index: Cell::new(index),
            outer: Some(outer.clone()),
        })
    }

    pub fn env(&self) -> &Rc<Environment> {
        &self.env
    }

    pub fn renderer(&self) -> &Rc<dyn Renderer> {
        self.env.renderer()
    }

    pub fn model(&self) -> Value {
        self.model.borrow().clone()
    }

    pub fn set_model(&self, model: Value) {
        *self.model.borrow_mut() = model;
    }

    /// Identity within a keyed repeat; `undefined` elsewhere.
    pub fn key(&self) -> Value {
        self.key.borrow().clone()
    }

    pub fn set_key(&self, key: Value) {
        *self.key.borrow_mut() = key;
    }

    /// Position within a repeat.
    pub fn index(&self) -> usize {
        self.index.get()
    }

    pub fn set_index(&self, index: usize) {
        self.index.set(index);
    }

    pub fn outer(&self) -> Option<&Rc<Context>> {
        self.outer.as_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("model", &*self.model.borrow())
            .field("key", &*self.key.borrow())
            .field("index", &self.index.get())
            .field("outer", &self.outer.is_some())
            .finish()
    }
}
