//! Components
//!
//! Plain component classes instantiated by templates, and [`View`]: a host
//! for one compiled template and its model that re-renders through the
//! invalidation queue and tracks async loads.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use crate::codegen::{CompiledTemplate, TemplateInstance};
use crate::context::Context;
use crate::env::notify::Subscription;
use crate::env::renderer::{insert_all, remove_all, NodeId, NodeList};
use crate::env::Environment;
use crate::error::Result;
use crate::invalidation::Invalidate;
use crate::rendered::{Rendered, RenderedRef};
use crate::value::Value;

/// Model property set while a load is in flight.
pub const LOADING: &str = "loading";
/// Model property holding the message of the last failed load.
pub const LOAD_ERROR: &str = "load_error";

/// A component type a template can instantiate.
pub trait ComponentClass {
    fn name(&self) -> &str;

    /// Static flag, known without instantiating.
    fn is_single_root(&self) -> bool {
        true
    }

    fn create(&self, ctx: &Rc<Context>) -> Result<RenderedRef>;
}

#[derive(Default)]
struct LoadState {
    pending: usize,
    error: Option<Rc<anyhow::Error>>,
}

pub struct View {
    env: Rc<Environment>,
    ctx: Rc<Context>,
    instance: RefCell<TemplateInstance>,
    dirty: Cell<bool>,
    mounted_in: Cell<Option<NodeId>>,
    load: RefCell<LoadState>,
    subscription: RefCell<Option<Subscription>>,
    this: Weak<View>,
}

impl View {
    pub fn new(env: &Rc<Environment>, template: &CompiledTemplate, model: Value) -> Result<Rc<View>> {
        let ctx = Context::new(env.clone(), model);
        let instance = template.instantiate(&ctx)?;
        let view = Rc::new_cyclic(|this| View {
            env: env.clone(),
            ctx,
            instance: RefCell::new(instance),
            dirty: Cell::new(false),
            mounted_in: Cell::new(None),
            load: RefCell::new(LoadState::default()),
            subscription: RefCell::new(None),
            this: this.clone(),
        });
        view.subscribe();
        Ok(view)
    }

    /// Invalidate whenever the model is notified of a change.
    fn subscribe(&self) {
        let this = self.this.clone();
        let subscription = self.env.notifier().listen(
            &self.ctx.model(),
            Rc::new(move |_: &Value| {
                if let Some(view) = this.upgrade() {
                    view.invalidate();
                }
            }),
        );
        if let Some(old) = self.subscription.replace(Some(subscription)) {
            self.env.notifier().unlisten(&old);
        }
    }

    pub fn env(&self) -> &Rc<Environment> {
        &self.env
    }

    pub fn model(&self) -> Value {
        self.ctx.model()
    }

    pub fn root_nodes(&self) -> NodeList {
        self.instance.borrow().root_nodes()
    }

    pub fn export(&self, name: &str) -> Option<Value> {
        self.instance.borrow().export(name)
    }

    pub fn is_mounted(&self) -> bool {
        self.instance.borrow().is_mounted()
    }

    /// Append the view's nodes to `parent` and notify mount.
    pub fn mount(&self, parent: NodeId) {
        let renderer = self.env.renderer();
        insert_all(renderer.as_ref(), parent, &self.root_nodes(), None);
        self.mounted_in.set(Some(parent));
        self.instance.borrow_mut().set_mounted(true);
    }

    pub fn unmount(&self) {
        if self.mounted_in.take().is_none() {
            return;
        }
        remove_all(self.env.renderer().as_ref(), &self.root_nodes());
        self.instance.borrow_mut().set_mounted(false);
    }

    /// Queue the view for the next invalidation pass.
    pub fn invalidate(&self) {
        if let Some(this) = self.this.upgrade() {
            self.env.invalidate(this);
        }
    }

    pub fn update(&self) -> Result<()> {
        self.instance.borrow_mut().update()
    }

    /// Point the view at a different model without rebuilding its output.
    pub fn set_model(&self, model: Value) -> Result<()> {
        self.instance.borrow_mut().set_model(model)?;
        self.subscribe();
        Ok(())
    }

    pub fn destroy(&self) {
        if let Some(subscription) = self.subscription.take() {
            self.env.notifier().unlisten(&subscription);
        }
        self.unmount();
        self.instance.borrow_mut().destroy();
    }

    pub fn is_loading(&self) -> bool {
        self.load.borrow().pending > 0
    }

    /// The error of the most recent failed load, until the next load finishes.
    pub fn load_error(&self) -> Option<Rc<anyhow::Error>> {
        self.load.borrow().error.clone()
    }

    pub fn begin_load(&self) {
        self.load.borrow_mut().pending += 1;
        self.env.begin_load();
        self.publish_load_state();
        self.invalidate();
    }

    pub fn finish_load(&self, result: anyhow::Result<()>) {
        {
            let mut load = self.load.borrow_mut();
            load.pending = load.pending.saturating_sub(1);
            load.error = result.err().map(Rc::new);
        }
        self.env.end_load();
        self.publish_load_state();
        self.invalidate();
    }

    /// Await `future` while tracking it as a load. The view may re-render in
    /// the meantime; a failure is kept as readable state.
    pub async fn load<T, F>(&self, future: F) -> Option<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        self.begin_load();
        match future.await {
            Ok(value) => {
                self.finish_load(Ok(()));
                Some(value)
            }
            Err(e) => {
                self.finish_load(Err(e));
                None
            }
        }
    }

    fn publish_load_state(&self) {
        let model = self.ctx.model();
        let Some(object) = model.as_object() else {
            return;
        };
        let load = self.load.borrow();
        object.set(LOADING, Value::Bool(load.pending > 0));
        let error = match &load.error {
            Some(e) => Value::from(e.to_string()),
            None => Value::Undefined,
        };
        object.set(LOAD_ERROR, error);
    }
}

impl Invalidate for View {
    fn dirty(&self) -> &Cell<bool> {
        &self.dirty
    }

    fn validate(&self) -> Result<()> {
        self.update()
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("model", &self.ctx.model())
            .field("dirty", &self.dirty.get())
            .field("loading", &self.is_loading())
            .finish()
    }
}

/// Builds one [`View`] per template instance.
#[derive(Clone)]
pub struct ViewClass {
    name: String,
    template: CompiledTemplate,
    model: Rc<dyn Fn() -> Value>,
}

impl ViewClass {
    pub fn new(name: &str, template: CompiledTemplate, model: impl Fn() -> Value + 'static) -> Self {
        ViewClass {
            name: name.to_string(),
            template,
            model: Rc::new(model),
        }
    }
}

impl ComponentClass for ViewClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_single_root(&self) -> bool {
        self.template.is_single_root()
    }

    fn create(&self, ctx: &Rc<Context>) -> Result<RenderedRef> {
        let view = View::new(ctx.env(), &self.template, (self.model)())?;
        Ok(RenderedRef::new(ViewComponent { view }))
    }
}

/// A view placed by an enclosing template.
pub struct ViewComponent {
    view: Rc<View>,
}

impl ViewComponent {
    pub fn view(&self) -> &Rc<View> {
        &self.view
    }
}

impl Rendered for ViewComponent {
    fn root_nodes(&self) -> NodeList {
        self.view.root_nodes()
    }

    fn is_single_root(&self) -> bool {
        self.view.instance.borrow().is_single_root()
    }

    fn update(&mut self) -> Result<()> {
        self.view.update()
    }

    fn bind(&mut self) {
        self.view.instance.borrow_mut().bind();
    }

    fn unbind(&mut self) {
        self.view.instance.borrow_mut().unbind();
    }

    fn set_mounted(&mut self, mounted: bool) {
        self.view.instance.borrow_mut().set_mounted(mounted);
    }

    fn destroy(&mut self) {
        self.view.destroy();
    }

    fn set_property(&mut self, name: &str, value: Value) {
        let model = self.view.model();
        match model.as_object() {
            Some(object) if object.set(name, value) => self.view.invalidate(),
            _ => log::warn!("view model does not accept property '{}'", name),
        }
    }
}
