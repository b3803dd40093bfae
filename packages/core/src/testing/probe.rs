//! Probe Components
//!
//! A single-node component that counts its lifecycle, for asserting that
//! blocks build and tear down exactly what they should.

use std::cell::Cell;
use std::rc::Rc;

use crate::component::ComponentClass;
use crate::context::Context;
use crate::env::renderer::{NodeId, NodeList, Renderer};
use crate::error::Result;
use crate::rendered::{Rendered, RenderedRef};
use crate::template::authored::{Template, TemplateMap, TYPE};
use crate::value::Value;

#[derive(Debug, Default)]
struct Counts {
    created: Cell<usize>,
    destroyed: Cell<usize>,
    mounted: Cell<usize>,
}

#[derive(Clone)]
pub struct ProbeClass {
    label: Rc<str>,
    counts: Rc<Counts>,
}

impl ProbeClass {
    pub fn new(label: &str) -> Self {
        ProbeClass {
            label: Rc::from(label),
            counts: Rc::new(Counts::default()),
        }
    }

    /// A component node instantiating this probe, open for more fields.
    pub fn node(&self) -> TemplateMap {
        TemplateMap::new().with(TYPE, Template::component(self.clone()))
    }

    pub fn template(&self) -> Template {
        Template::Map(self.node())
    }

    pub fn created(&self) -> usize {
        self.counts.created.get()
    }

    pub fn destroyed(&self) -> usize {
        self.counts.destroyed.get()
    }

    /// Instances created and not yet destroyed.
    pub fn alive(&self) -> usize {
        self.created() - self.destroyed()
    }

    /// Instances currently mounted.
    pub fn mounted(&self) -> usize {
        self.counts.mounted.get()
    }
}

impl ComponentClass for ProbeClass {
    fn name(&self) -> &str {
        "Probe"
    }

    fn create(&self, ctx: &Rc<Context>) -> Result<RenderedRef> {
        let renderer = ctx.renderer().clone();
        let node = renderer.create_text(&self.label);
        self.counts.created.set(self.counts.created.get() + 1);
        Ok(RenderedRef::new(Probe {
            node,
            renderer,
            counts: self.counts.clone(),
            mounted: false,
            destroyed: false,
        }))
    }
}

struct Probe {
    node: NodeId,
    renderer: Rc<dyn Renderer>,
    counts: Rc<Counts>,
    mounted: bool,
    destroyed: bool,
}

impl Rendered for Probe {
    fn root_nodes(&self) -> NodeList {
        NodeList::from_elem(self.node, 1)
    }

    fn is_single_root(&self) -> bool {
        true
    }

    fn update(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_mounted(&mut self, mounted: bool) {
        if self.mounted == mounted {
            return;
        }
        self.mounted = mounted;
        let count = self.counts.mounted.get();
        self.counts
            .mounted
            .set(if mounted { count + 1 } else { count - 1 });
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.set_mounted(false);
        self.destroyed = true;
        self.counts.destroyed.set(self.counts.destroyed.get() + 1);
    }

    fn set_property(&mut self, name: &str, value: Value) {
        if name == "label" {
            self.renderer.set_text(self.node, &value.to_text());
        }
    }
}
