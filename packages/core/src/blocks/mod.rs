//! Control-Flow Blocks
//!
//! Runtime objects owning a dynamically changing subregion of the output:
//! conditional, repeating and content-embedding blocks. Each is reached from
//! templates as an integrated component.

pub mod embed_block;
pub mod foreach_block;
pub mod if_block;
pub mod swap;

use std::rc::Rc;

use crate::codegen::{CompiledTemplate, Compiler};
use crate::context::Context;
use crate::env::transition::TransitionFactory;
use crate::error::{Result, TemplateError};
use crate::rendered::Rendered;
use crate::template::authored::{Callback, Template};
use crate::template::fields::Fields;
use crate::value::Value;

pub use embed_block::{EmbedBlock, EmbedBlockClass};
pub use foreach_block::{ForEachBlock, ForEachBlockClass};
pub use if_block::{IfBlock, IfBlockClass};

/// Creates one runtime block per enclosing instance.
pub trait BlockFactory {
    fn is_single_root(&self) -> bool;
    fn create(&self, ctx: &Rc<Context>) -> Result<Box<dyn Rendered>>;
}

/// A component type that compiles its own fields into a block factory.
pub trait IntegratedClass {
    fn name(&self) -> &str;

    /// Read the fields this class understands. Fields left unread are
    /// reported as unknown by the code generator.
    fn integrate(&self, fields: &Fields<'_>, compiler: &Compiler) -> Result<Rc<dyn BlockFactory>>;
}

/// A block input that is either fixed or re-evaluated on every update.
#[derive(Clone)]
pub enum Source {
    Literal(Value),
    Dynamic(Callback),
}

impl Source {
    pub fn eval(&self, ctx: &Context) -> Value {
        match self {
            Source::Literal(value) => value.clone(),
            Source::Dynamic(callback) => callback(&ctx.model(), ctx),
        }
    }

    /// Evaluate against an explicit model, such as a repeat item.
    pub fn eval_with(&self, model: &Value, ctx: &Context) -> Value {
        match self {
            Source::Literal(value) => value.clone(),
            Source::Dynamic(callback) => callback(model, ctx),
        }
    }

    pub fn from_template(key: &str, template: &Template) -> Result<Source> {
        match template {
            Template::Value(value) => Ok(Source::Literal(value.clone())),
            Template::Callback(callback) => Ok(Source::Dynamic(callback.clone())),
            Template::List(items) => {
                let values = items
                    .iter()
                    .map(|item| match item {
                        Template::Value(value) => Ok(value.clone()),
                        other => Err(TemplateError::invalid_value(
                            key,
                            format!("list items must be values, found {}", other.describe()),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Source::Literal(Value::list(values)))
            }
            other => Err(TemplateError::invalid_value(
                key,
                format!("expected a value or callable, found {}", other.describe()),
            )),
        }
    }
}

pub(crate) fn callback_field(fields: &Fields<'_>, key: &str) -> Result<Option<Callback>> {
    match fields.get(key) {
        None => Ok(None),
        Some(Template::Callback(callback)) => Ok(Some(callback.clone())),
        Some(other) => Err(TemplateError::invalid_value(
            key,
            format!("expected a callable, found {}", other.describe()),
        )),
    }
}

pub(crate) fn transition_field(fields: &Fields<'_>, key: &str) -> Result<Option<TransitionFactory>> {
    match fields.get(key) {
        None => Ok(None),
        Some(Template::Transition(factory)) => Ok(Some(factory.clone())),
        Some(other) => Err(TemplateError::invalid_value(
            key,
            format!("expected a transition, found {}", other.describe()),
        )),
    }
}

pub(crate) fn template_field(
    fields: &Fields<'_>,
    key: &str,
    compiler: &Compiler,
) -> Result<Option<CompiledTemplate>> {
    match fields.get(key) {
        None => Ok(None),
        Some(template) => compiler.compile(template.clone()).map(Some),
    }
}

pub(crate) fn bool_field(fields: &Fields<'_>, key: &str, default: bool) -> Result<bool> {
    match fields.get(key) {
        None => Ok(default),
        Some(Template::Value(Value::Bool(b))) => Ok(*b),
        Some(other) => Err(TemplateError::invalid_value(
            key,
            format!("expected a boolean, found {}", other.describe()),
        )),
    }
}
