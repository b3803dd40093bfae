//! Template Instances
//!
//! A live instantiation of a compiled unit. Runs the unit's create ops once,
//! then its update ops on every `update`, writing only what changed.

use std::collections::HashMap;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::context::Context;
use crate::env::renderer::{insert_all, Event, Listener, ListenerId, NodeId, NodeList, Renderer};
use crate::env::transition::Transition;
use crate::error::Result;
use crate::rendered::{Rendered, RenderedRef};
use crate::value::Value;

use super::ingest::DISPLAY;
use super::ops::{
    ChildSlot, CreateOp, HandlerSource, Lifecycle, NodeSlot, Placement, PrevSlot, RefIndex,
    Target, Unit, UpdateOp,
};

/// Saved state of one dynamic `display` binding.
#[derive(Debug, Clone, Default)]
struct DisplayState {
    hidden: bool,
    /// Inline display value in effect before hiding.
    prior: Option<String>,
}

pub struct TemplateInstance {
    unit: Rc<Unit>,
    ctx: Rc<Context>,
    renderer: Rc<dyn Renderer>,
    nodes: Vec<NodeId>,
    fragments: Vec<NodeList>,
    children: Vec<RenderedRef>,
    prev: Vec<Option<Value>>,
    displays: Vec<DisplayState>,
    listeners: Vec<(NodeId, ListenerId)>,
    /// In-flight class and display transitions, by expression slot.
    pending: HashMap<PrevSlot, Rc<dyn Transition>>,
    bound_model: Option<Value>,
    mounted: bool,
    destroyed: bool,
}

impl TemplateInstance {
    /// Create the output, bind and run the first update.
    pub(crate) fn new(unit: Rc<Unit>, ctx: Rc<Context>) -> Result<Self> {
        let renderer = ctx.renderer().clone();
        let mut instance = TemplateInstance {
            nodes: Vec::with_capacity(unit.node_count),
            fragments: Vec::with_capacity(unit.fragment_count),
            children: Vec::with_capacity(unit.child_count),
            prev: vec![None; unit.prev_count],
            displays: vec![DisplayState::default(); unit.display_count],
            listeners: Vec::new(),
            pending: HashMap::new(),
            bound_model: None,
            mounted: false,
            destroyed: false,
            unit,
            ctx,
            renderer,
        };
        instance.create()?;
        instance.bind();
        instance.update()?;
        Ok(instance)
    }

    pub fn context(&self) -> &Rc<Context> {
        &self.ctx
    }

    pub fn model(&self) -> Value {
        self.ctx.model()
    }

    /// Repoint to the context's current model without rebuilding anything.
    pub fn rebind(&mut self) {
        let model = self.ctx.model();
        if self.bound_model.as_ref() == Some(&model) {
            return;
        }
        self.unbind();
        self.bind();
    }

    /// Point the instance at a different model and bring it up to date.
    pub fn set_model(&mut self, model: Value) -> Result<()> {
        self.ctx.set_model(model);
        self.rebind();
        self.update()
    }

    /// The node or nested instance published under `name`.
    pub fn export(&self, name: &str) -> Option<Value> {
        self.unit.exports.get(name).map(|target| self.target_value(*target))
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn node(&self, slot: NodeSlot) -> NodeId {
        self.nodes[slot.0]
    }

    fn needs(&self, fan_out: Lifecycle) -> bool {
        self.unit.lifecycle.contains(fan_out)
    }

    fn child(&self, slot: ChildSlot) -> &RenderedRef {
        &self.children[slot.0]
    }

    fn target_value(&self, target: Target) -> Value {
        match target {
            Target::Node(slot) => Value::Node(self.node(slot)),
            Target::Child(slot) => Value::Instance(self.child(slot).clone()),
        }
    }

    fn placement_nodes(&self, placement: Placement) -> NodeList {
        match placement {
            Placement::Node(slot) => SmallVec::from_elem(self.node(slot), 1),
            Placement::Fragment(slot) => self.fragments[slot.0].clone(),
            Placement::Child(slot) => self.child(slot).root_nodes(),
        }
    }

    fn create(&mut self) -> Result<()> {
        let unit = self.unit.clone();
        let renderer = self.renderer.clone();
        for op in &unit.create {
            match op {
                CreateOp::Element { node, tag } => {
                    debug_assert_eq!(node.0, self.nodes.len());
                    self.nodes.push(renderer.create_element(tag));
                }
                CreateOp::Text { node, text } => {
                    debug_assert_eq!(node.0, self.nodes.len());
                    self.nodes.push(renderer.create_text(text));
                }
                CreateOp::Comment { node, text } => {
                    debug_assert_eq!(node.0, self.nodes.len());
                    self.nodes.push(renderer.create_comment(text));
                }
                CreateOp::Html { fragment, html } => {
                    debug_assert_eq!(fragment.0, self.fragments.len());
                    let nodes = match unit.html(*html) {
                        (_, Some(parsed)) => parsed.iter().map(|n| renderer.clone_node(*n)).collect(),
                        (html, None) => renderer.parse_html(html),
                    };
                    self.fragments.push(nodes);
                }
                CreateOp::Component { child, class } => {
                    debug_assert_eq!(child.0, self.children.len());
                    let component = unit.component(*class).create(&self.ctx)?;
                    self.children.push(component);
                }
                CreateOp::Block { child, factory } => {
                    debug_assert_eq!(child.0, self.children.len());
                    let block = unit.block(*factory).create(&self.ctx)?;
                    self.children.push(RenderedRef::from_box(block));
                }
                CreateOp::Append { parent, placement } => {
                    let nodes = self.placement_nodes(*placement);
                    insert_all(renderer.as_ref(), self.node(*parent), &nodes, None);
                }
                CreateOp::Attribute { node, name, value } => {
                    renderer.set_attribute(self.node(*node), name, value);
                }
                CreateOp::Class { node, name } => {
                    renderer.add_class(self.node(*node), name);
                }
                CreateOp::Style { node, name, value } => {
                    renderer.set_style(self.node(*node), name, value);
                }
                CreateOp::Content { node, value } => match value {
                    Value::Html(html) => renderer.set_html(self.node(*node), html),
                    other => renderer.set_text(self.node(*node), &other.to_text()),
                },
                CreateOp::Property { child, name, value } => {
                    let value = unit.value(*value).clone();
                    self.child(*child).borrow_mut().set_property(name, value);
                }
                CreateOp::Listener {
                    node,
                    event,
                    handler,
                } => {
                    let node = self.node(*node);
                    let listener = self.listener(&unit, handler);
                    let id = renderer.add_listener(node, event, listener);
                    self.listeners.push((node, id));
                }
            }
        }
        Ok(())
    }

    fn listener(&self, unit: &Unit, handler: &HandlerSource) -> Listener {
        let ctx = self.ctx.clone();
        match handler {
            HandlerSource::Handler(index) => {
                let handler = unit.handler(*index).clone();
                Rc::new(move |event: &Event| {
                    let model = ctx.model();
                    handler(event, &model, &ctx);
                })
            }
            HandlerSource::Callback(index) => {
                let callback = unit.callback(*index).clone();
                Rc::new(move |_: &Event| {
                    let model = ctx.model();
                    callback(&model, &ctx);
                })
            }
            HandlerSource::Method(method) => {
                let method = method.clone();
                Rc::new(move |event: &Event| {
                    let model = ctx.model();
                    let handled = model
                        .as_object()
                        .map_or(false, |object| object.invoke(&method, event));
                    if !handled {
                        log::warn!("model has no method '{}' for '{}' event", method, event.name);
                    }
                })
            }
        }
    }

    fn eval(&self, expr: RefIndex) -> Value {
        let model = self.ctx.model();
        (self.unit.callback(expr))(&model, &self.ctx)
    }

    /// Record `value` in its slot. Returns the previous value if it changed.
    fn changed(&mut self, slot: PrevSlot, value: &Value) -> Option<Option<Value>> {
        let prev = &mut self.prev[slot.0];
        if prev.as_ref() == Some(value) {
            return None;
        }
        Some(prev.replace(value.clone()))
    }

    fn run_updates(&mut self) -> Result<()> {
        let unit = self.unit.clone();
        let renderer = self.renderer.clone();
        for op in &unit.update {
            match op {
                UpdateOp::Text { node, expr, prev } => {
                    let value = self.eval(*expr);
                    if self.changed(*prev, &value).is_some() {
                        renderer.set_text(self.node(*node), &value.to_text());
                    }
                }
                UpdateOp::Attribute {
                    node,
                    name,
                    expr,
                    prev,
                } => {
                    let value = self.eval(*expr);
                    if self.changed(*prev, &value).is_some() {
                        let node = self.node(*node);
                        match &value {
                            Value::Undefined | Value::Null | Value::Bool(false) => {
                                renderer.remove_attribute(node, name)
                            }
                            Value::Bool(true) => renderer.set_attribute(node, name, ""),
                            other => renderer.set_attribute(node, name, &other.to_text()),
                        }
                    }
                }
                UpdateOp::Class {
                    node,
                    name,
                    expr,
                    prev,
                    transition,
                } => {
                    let on = Value::Bool(self.eval(*expr).is_truthy());
                    if let Some(previous) = self.changed(*prev, &on) {
                        let node = self.node(*node);
                        let add = on.is_truthy();
                        let apply = class_writer(renderer.clone(), node, name.clone(), add);
                        self.apply_animated(*prev, node, add, previous.is_some(), *transition, apply);
                    }
                }
                UpdateOp::Style {
                    node,
                    name,
                    expr,
                    prev,
                } => {
                    let value = self.eval(*expr);
                    if self.changed(*prev, &value).is_some() {
                        let node = self.node(*node);
                        if value.is_nullish() {
                            renderer.remove_style(node, name);
                        } else {
                            renderer.set_style(node, name, &value.to_text());
                        }
                    }
                }
                UpdateOp::Display {
                    node,
                    expr,
                    prev,
                    state,
                    transition,
                } => {
                    let value = self.eval(*expr);
                    if let Some(previous) = self.changed(*prev, &value) {
                        let node = self.node(*node);
                        let (show, apply) = self.display_writer(node, *state, &value);
                        self.apply_animated(*prev, node, show, previous.is_some(), *transition, apply);
                    }
                }
                UpdateOp::Content { node, expr, prev } => {
                    let value = self.eval(*expr);
                    if self.changed(*prev, &value).is_some() {
                        let node = self.node(*node);
                        match &value {
                            Value::Html(html) => renderer.set_html(node, html),
                            other => renderer.set_text(node, &other.to_text()),
                        }
                    }
                }
                UpdateOp::Property {
                    child,
                    name,
                    expr,
                    prev,
                } => {
                    let value = self.eval(*expr);
                    if self.changed(*prev, &value).is_some() {
                        self.child(*child).borrow_mut().set_property(name, value);
                    }
                }
                UpdateOp::Child { child } => {
                    self.child(*child).borrow_mut().update()?;
                }
            }
        }
        Ok(())
    }

    /// Work out what a `display` value does. The saved state is updated now;
    /// only the style write is deferred.
    fn display_writer(&mut self, node: NodeId, state: usize, value: &Value) -> (bool, Box<dyn FnOnce()>) {
        let renderer = self.renderer.clone();
        let state = &mut self.displays[state];
        match value {
            Value::Bool(true) => {
                let restore = if state.hidden { Some(state.prior.take()) } else { None };
                state.hidden = false;
                let apply: Box<dyn FnOnce()> = Box::new(move || match restore {
                    Some(Some(prior)) => renderer.set_style(node, DISPLAY, &prior),
                    Some(None) => renderer.remove_style(node, DISPLAY),
                    None => {}
                });
                (true, apply)
            }
            Value::String(display) => {
                state.hidden = false;
                state.prior = None;
                let display = display.clone();
                let apply: Box<dyn FnOnce()> =
                    Box::new(move || renderer.set_style(node, DISPLAY, &display));
                (true, apply)
            }
            _ => {
                if !state.hidden {
                    state.prior = renderer.style(node, DISPLAY);
                    state.hidden = true;
                }
                let apply: Box<dyn FnOnce()> =
                    Box::new(move || renderer.set_style(node, DISPLAY, "none"));
                (false, apply)
            }
        }
    }

    /// Apply a class or display change, through its transition when mounted
    /// and not the initial write.
    fn apply_animated(
        &mut self,
        slot: PrevSlot,
        node: NodeId,
        entering: bool,
        had_value: bool,
        transition: Option<RefIndex>,
        apply: Box<dyn FnOnce()>,
    ) {
        if let Some(pending) = self.pending.remove(&slot) {
            pending.finish();
        }
        let factory = match transition {
            Some(index) if self.mounted && had_value => self.unit.transition(index).clone(),
            _ => {
                apply();
                return;
            }
        };
        let transition = factory(&self.ctx);
        if entering {
            transition.enter_nodes(&[node]);
            transition.on_will_enter(apply);
            transition.on_did_leave(Box::new(|| {}));
        } else {
            transition.leave_nodes(&[node]);
            transition.on_will_enter(Box::new(|| {}));
            transition.on_did_leave(apply);
        }
        self.pending.insert(slot, transition.clone());
        transition.start();
    }

    fn finish_transitions(&mut self) {
        if !self.needs(Lifecycle::TRANSITIONS) {
            return;
        }
        for (_, transition) in self.pending.drain() {
            transition.finish();
        }
    }
}

fn class_writer(renderer: Rc<dyn Renderer>, node: NodeId, name: Rc<str>, add: bool) -> Box<dyn FnOnce()> {
    Box::new(move || {
        if add {
            renderer.add_class(node, &name);
        } else {
            renderer.remove_class(node, &name);
        }
    })
}

impl Rendered for TemplateInstance {
    fn root_nodes(&self) -> NodeList {
        let mut nodes = NodeList::new();
        if self.destroyed {
            return nodes;
        }
        for placement in &self.unit.roots {
            nodes.extend(self.placement_nodes(*placement));
        }
        nodes
    }

    fn is_single_root(&self) -> bool {
        self.unit.is_single_root
    }

    fn update(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.run_updates()
    }

    fn bind(&mut self) {
        if self.bound_model.is_some() {
            return;
        }
        let model = self.ctx.model();
        if self.needs(Lifecycle::BIND) {
            match model.as_object() {
                Some(object) => {
                    for op in &self.unit.binds {
                        object.set(&op.name, self.target_value(op.target));
                    }
                }
                None => log::warn!(
                    "cannot bind back-references onto a {} model",
                    model.type_name()
                ),
            }
        }
        self.bound_model = Some(model);
        if self.needs(Lifecycle::CHILDREN) {
            for child in &self.children {
                child.borrow_mut().bind();
            }
        }
    }

    fn unbind(&mut self) {
        let Some(model) = self.bound_model.take() else {
            return;
        };
        if self.needs(Lifecycle::BIND) {
            if let Some(object) = model.as_object() {
                for op in &self.unit.binds {
                    object.set(&op.name, Value::Undefined);
                }
            }
        }
        if self.needs(Lifecycle::CHILDREN) {
            for child in &self.children {
                child.borrow_mut().unbind();
            }
        }
    }

    fn set_mounted(&mut self, mounted: bool) {
        if self.mounted == mounted {
            return;
        }
        self.mounted = mounted;
        if !mounted {
            self.finish_transitions();
        }
        if self.needs(Lifecycle::CHILDREN) {
            for child in &self.children {
                child.borrow_mut().set_mounted(mounted);
            }
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.finish_transitions();
        self.unbind();
        if self.needs(Lifecycle::LISTENERS) {
            for (node, id) in self.listeners.drain(..) {
                self.renderer.remove_listener(node, id);
            }
        }
        if self.needs(Lifecycle::CHILDREN) {
            for child in self.children.drain(..) {
                child.borrow_mut().destroy();
            }
        }
        self.nodes.clear();
        self.fragments.clear();
        self.destroyed = true;
    }
}

impl std::fmt::Debug for TemplateInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateInstance")
            .field("unit", &self.unit)
            .field("mounted", &self.mounted)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
