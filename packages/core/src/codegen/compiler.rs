//! Compiler
//!
//! Entry point: normalizes an authored template and specializes it into a
//! [`CompiledTemplate`]. Integrated components call back into the same
//! compiler for their nested templates.

use std::rc::Rc;

use crate::config::CompilerConfig;
use crate::context::Context;
use crate::env::renderer::Renderer;
use crate::env::Environment;
use crate::error::Result;
use crate::template::authored::Template;
use crate::template::normalize::normalize;
use crate::template::plugins::PluginRegistry;
use crate::value::Value;

use super::ingest::ingest_unit;
use super::instance::TemplateInstance;
use super::ops::{Lifecycle, Unit};

pub struct Compiler {
    config: CompilerConfig,
    plugins: PluginRegistry,
    renderer: Option<Rc<dyn Renderer>>,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Compiler {
            config,
            plugins: PluginRegistry::with_builtins(),
            renderer: None,
        }
    }

    /// Make a renderer available for compile-time markup parsing.
    pub fn with_renderer(mut self, renderer: Rc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn renderer(&self) -> Option<&Rc<dyn Renderer>> {
        self.renderer.as_ref()
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    pub fn compile(&self, template: impl Into<Template>) -> Result<CompiledTemplate> {
        let node = normalize(template.into(), self)?;
        let unit = ingest_unit(&node, &self.config)?;
        if self.config.debug {
            log::debug!("compiled unit {:?}", unit);
        }
        Ok(CompiledTemplate {
            unit: Rc::new(unit),
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(CompilerConfig::default())
    }
}

/// A template specialized into a fixed create/update operation sequence.
/// Cheap to clone; every instance shares the same unit.
#[derive(Clone)]
pub struct CompiledTemplate {
    unit: Rc<Unit>,
}

impl CompiledTemplate {
    /// Known without instantiating, so callers can pick single- or multi-node handling.
    pub fn is_single_root(&self) -> bool {
        self.unit.is_single_root
    }

    pub fn instantiate(&self, ctx: &Rc<Context>) -> Result<TemplateInstance> {
        TemplateInstance::new(self.unit.clone(), ctx.clone())
    }

    /// Instantiate against a fresh root context.
    pub fn create(&self, env: &Rc<Environment>, model: Value) -> Result<TemplateInstance> {
        self.instantiate(&Context::new(env.clone(), model))
    }

    pub fn exports(&self) -> impl Iterator<Item = &str> {
        self.unit.exports.keys().map(|k| k.as_str())
    }

    /// Dynamic expressions evaluated per update.
    pub fn expression_count(&self) -> usize {
        self.unit.expression_count()
    }

    /// Teardown and mount work instances of this template take part in.
    pub fn lifecycle(&self) -> Lifecycle {
        self.unit.lifecycle
    }
}

impl std::fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompiledTemplate({:?})", self.unit)
    }
}
