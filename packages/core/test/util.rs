//! Shared Test Utilities
//!
//! A mounted harness over the in-memory document plus small helpers for
//! driving models and futures by hand.

#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;
use std::pin::{pin, Pin};
use std::rc::Rc;
use std::task::{Context as TaskContext, Poll, Waker};

use trellis_core::env::{FrameQueue, NodeId};
use trellis_core::testing::{test_env, Document};
use trellis_core::{
    CompiledTemplate, Compiler, CompilerConfig, Environment, Record, Rendered, Renderer,
    Template, TemplateInstance, Value,
};

pub struct Harness {
    pub env: Rc<Environment>,
    pub doc: Rc<Document>,
    pub frames: Rc<FrameQueue>,
    pub root: NodeId,
    pub compiler: Compiler,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        let (env, doc, frames) = test_env();
        let root = doc.create_root();
        let compiler = Compiler::new(config).with_renderer(doc.clone());
        Harness {
            env,
            doc,
            frames,
            root,
            compiler,
        }
    }

    pub fn compile(&self, template: impl Into<Template>) -> CompiledTemplate {
        self.compiler.compile(template).expect("template compiles")
    }

    /// Compile, instantiate and mount under the harness root.
    pub fn render(&self, template: impl Into<Template>, model: Value) -> TemplateInstance {
        let compiled = self.compile(template);
        self.mount(&compiled, model)
    }

    pub fn mount(&self, compiled: &CompiledTemplate, model: Value) -> TemplateInstance {
        let mut instance = compiled
            .create(&self.env, model)
            .expect("instance creates");
        for node in instance.root_nodes() {
            self.doc.insert_before(self.root, node, None);
        }
        instance.set_mounted(true);
        instance
    }

    /// Markup under the root with sentinel comments removed.
    pub fn html(&self) -> String {
        strip_comments(&self.doc.inner_html(self.root))
    }

    pub fn raw_html(&self) -> String {
        self.doc.inner_html(self.root)
    }

    pub fn text(&self) -> String {
        self.doc.text_content(self.root)
    }
}

pub fn model() -> Record {
    Record::new()
}

pub fn set(model: &Value, key: &str, value: impl Into<Value>) {
    model
        .as_object()
        .expect("model is an object")
        .set(key, value.into());
}

pub fn strings(items: &[&str]) -> Value {
    Value::list(items.iter().map(|s| Value::from(*s)).collect())
}

pub fn numbers(items: &[i32]) -> Value {
    Value::list(items.iter().map(|n| Value::from(*n)).collect())
}

pub fn strip_comments(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start..].find("-->") {
            Some(end) => rest = &rest[start + end + 3..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Deterministic pseudo-random sequence for shuffle tests.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

/// Poll a pinned future once without a runtime.
pub fn poll<F: Future + ?Sized>(future: Pin<&mut F>) -> Poll<F::Output> {
    let mut cx = TaskContext::from_waker(Waker::noop());
    future.poll(&mut cx)
}

/// A future that stays pending until opened.
pub struct Gate<T>(Rc<RefCell<Option<T>>>);

impl<T> Gate<T> {
    pub fn new() -> Self {
        Gate(Rc::new(RefCell::new(None)))
    }

    pub fn open(&self, value: T) {
        *self.0.borrow_mut() = Some(value);
    }
}

impl<T> Clone for Gate<T> {
    fn clone(&self) -> Self {
        Gate(self.0.clone())
    }
}

impl<T> Future for Gate<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, _: &mut TaskContext<'_>) -> Poll<T> {
        match self.0.borrow_mut().take() {
            Some(value) => Poll::Ready(value),
            None => Poll::Pending,
        }
    }
}

/// Poll `future` once. Enough for futures that are already resolved.
pub fn poll_once<F: Future>(future: F) -> Option<F::Output> {
    let mut cx = TaskContext::from_waker(Waker::noop());
    let mut future = pin!(future);
    match future.as_mut().poll(&mut cx) {
        Poll::Ready(output) => Some(output),
        Poll::Pending => None,
    }
}
