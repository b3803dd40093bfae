//! Conditional Block
//!
//! Shows the first branch whose predicate is truthy. An always-true else
//! branch is added when none is declared, so a branch always resolves.

use std::rc::Rc;

use crate::codegen::{CompiledTemplate, Compiler};
use crate::context::Context;
use crate::env::renderer::{NodeId, NodeList};
use crate::env::transition::{self, TransitionFactory};
use crate::error::{Result, TemplateError};
use crate::rendered::{Rendered, RenderedRef};
use crate::template::authored::{Callback, Template};
use crate::template::fields::Fields;
use crate::value::Value;

use super::swap::{Content, Swapper};
use super::{callback_field, transition_field, BlockFactory, IntegratedClass, Source};

pub const BRANCHES: &str = "branches";
pub const CONDITION: &str = "condition";
pub const TEMPLATE: &str = "template";
pub const KEY: &str = "key";
pub const TRANSITION: &str = "transition";

struct Branch {
    /// `None` for else branches.
    condition: Option<Source>,
    /// `None` renders nothing.
    template: Option<CompiledTemplate>,
}

pub struct IfBlockClass;

impl IntegratedClass for IfBlockClass {
    fn name(&self) -> &str {
        "IfBlock"
    }

    fn integrate(&self, fields: &Fields<'_>, compiler: &Compiler) -> Result<Rc<dyn BlockFactory>> {
        let authored = match fields.get(BRANCHES) {
            Some(Template::List(branches)) => branches.as_slice(),
            Some(other) => {
                return Err(TemplateError::invalid_value(
                    BRANCHES,
                    format!("expected a list of branches, found {}", other.describe()),
                ))
            }
            None => &[],
        };

        let mut branches = Vec::with_capacity(authored.len() + 1);
        for branch in authored {
            let map = branch.as_map().ok_or_else(|| {
                TemplateError::invalid_value(BRANCHES, "each branch must be a mapping")
            })?;
            let mut condition = None;
            let mut template = None;
            for (key, value) in map.iter() {
                match key {
                    CONDITION => condition = Some(Source::from_template(CONDITION, value)?),
                    TEMPLATE => template = Some(compiler.compile(value.clone())?),
                    other => return Err(TemplateError::unknown_key(other, "if branch")),
                }
            }
            branches.push(Branch {
                condition,
                template,
            });
        }
        if branches.last().map_or(true, |b| b.condition.is_some()) {
            branches.push(Branch {
                condition: None,
                template: None,
            });
        }

        let single_root = branches
            .iter()
            .all(|b| b.template.as_ref().map_or(false, |t| t.is_single_root()));

        Ok(Rc::new(IfFactory {
            branches: Rc::from(branches),
            key: callback_field(fields, KEY)?,
            transition: transition_field(fields, TRANSITION)?,
            single_root,
        }))
    }
}

struct IfFactory {
    branches: Rc<[Branch]>,
    key: Option<Callback>,
    transition: Option<TransitionFactory>,
    single_root: bool,
}

impl BlockFactory for IfFactory {
    fn is_single_root(&self) -> bool {
        self.single_root
    }

    fn create(&self, ctx: &Rc<Context>) -> Result<Box<dyn Rendered>> {
        let renderer = ctx.renderer().clone();
        let head = if self.single_root {
            None
        } else {
            Some(renderer.create_comment("if"))
        };
        let index = resolve(&self.branches, ctx);
        let initial = build(&self.branches[index], ctx)?;
        Ok(Box::new(IfBlock {
            branches: self.branches.clone(),
            key: eval_key(self.key.as_ref(), ctx),
            key_fn: self.key.clone(),
            transition: self.transition.clone(),
            single_root: self.single_root,
            ctx: ctx.clone(),
            swapper: Swapper::new(renderer, head, initial),
            head,
            index,
            destroyed: false,
        }))
    }
}

pub struct IfBlock {
    branches: Rc<[Branch]>,
    key_fn: Option<Callback>,
    transition: Option<TransitionFactory>,
    single_root: bool,
    ctx: Rc<Context>,
    head: Option<NodeId>,
    swapper: Swapper,
    index: usize,
    key: Value,
    destroyed: bool,
}

fn resolve(branches: &[Branch], ctx: &Context) -> usize {
    let model = ctx.model();
    for (index, branch) in branches.iter().enumerate() {
        match &branch.condition {
            None => return index,
            Some(condition) if condition.eval_with(&model, ctx).is_truthy() => return index,
            Some(_) => {}
        }
    }
    unreachable!("conditional block without an else branch")
}

fn eval_key(key: Option<&Callback>, ctx: &Context) -> Value {
    match key {
        Some(key) => key(&ctx.model(), ctx),
        None => Value::Undefined,
    }
}

fn build(branch: &Branch, ctx: &Rc<Context>) -> Result<Content> {
    match &branch.template {
        Some(template) => Ok(Content::owned(RenderedRef::new(template.instantiate(ctx)?))),
        None => Ok(Content::Empty),
    }
}

impl Rendered for IfBlock {
    fn root_nodes(&self) -> NodeList {
        let mut nodes = NodeList::new();
        if self.destroyed {
            return nodes;
        }
        nodes.extend(self.head);
        nodes.extend(self.swapper.root_nodes());
        nodes
    }

    fn is_single_root(&self) -> bool {
        self.single_root
    }

    fn update(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        let index = resolve(&self.branches, &self.ctx);
        let key = eval_key(self.key_fn.as_ref(), &self.ctx);
        if index == self.index && key == self.key {
            if let Some(current) = self.swapper.current() {
                current.borrow_mut().update()?;
            }
            return Ok(());
        }

        log::debug!("conditional block switching from branch {} to {}", self.index, index);
        // the new branch is built before the old one is torn down
        let next = build(&self.branches[index], &self.ctx)?;
        self.index = index;
        self.key = key;
        let transition = transition::select(
            self.transition.as_ref(),
            self.swapper.is_mounted(),
            &self.ctx,
        );
        self.swapper.swap(next, transition);
        Ok(())
    }

    fn bind(&mut self) {
        self.swapper.bind();
    }

    fn unbind(&mut self) {
        self.swapper.unbind();
    }

    fn set_mounted(&mut self, mounted: bool) {
        self.swapper.set_mounted(mounted);
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.swapper.destroy();
        self.destroyed = true;
    }
}
