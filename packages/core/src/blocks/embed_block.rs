//! Content-Embedding Block
//!
//! Hosts externally supplied content between two permanent sentinels: a
//! rendered instance, markup, text, bare nodes or a render-only object.

use std::rc::Rc;

use crate::codegen::{CompiledTemplate, Compiler};
use crate::context::Context;
use crate::env::renderer::{NodeId, NodeList, Renderer};
use crate::env::transition::{self, TransitionFactory};
use crate::error::{Result, TemplateError};
use crate::rendered::{Rendered, RenderedRef};
use crate::template::fields::Fields;
use crate::value::Value;

use super::swap::{Content, Swapper};
use super::{bool_field, template_field, transition_field, BlockFactory, IntegratedClass, Source};

pub const CONTENT: &str = "content";
pub const OWNS_CONTENT: &str = "owns_content";
pub const PLACEHOLDER: &str = "placeholder";
pub const TRANSITION: &str = "transition";

pub struct EmbedBlockClass;

impl IntegratedClass for EmbedBlockClass {
    fn name(&self) -> &str {
        "EmbedBlock"
    }

    fn integrate(&self, fields: &Fields<'_>, compiler: &Compiler) -> Result<Rc<dyn BlockFactory>> {
        let content = match fields.get(CONTENT) {
            Some(content) => Source::from_template(CONTENT, content)?,
            None => Source::Literal(Value::Undefined),
        };
        Ok(Rc::new(EmbedFactory(Rc::new(Embed {
            content,
            owns_content: bool_field(fields, OWNS_CONTENT, true)?,
            placeholder: template_field(fields, PLACEHOLDER, compiler)?,
            transition: transition_field(fields, TRANSITION)?,
        }))))
    }
}

struct Embed {
    content: Source,
    owns_content: bool,
    placeholder: Option<CompiledTemplate>,
    transition: Option<TransitionFactory>,
}

struct EmbedFactory(Rc<Embed>);

impl BlockFactory for EmbedFactory {
    fn is_single_root(&self) -> bool {
        false
    }

    fn create(&self, ctx: &Rc<Context>) -> Result<Box<dyn Rendered>> {
        let renderer = ctx.renderer().clone();
        let head = renderer.create_comment("embed");
        let tail = renderer.create_comment("/embed");
        let value = self.0.content.eval(ctx);
        let initial = build(&self.0, ctx, &value)?;
        Ok(Box::new(EmbedBlock {
            embed: self.0.clone(),
            ctx: ctx.clone(),
            swapper: Swapper::new(renderer, Some(head), initial),
            head,
            tail,
            value,
            destroyed: false,
        }))
    }
}

pub struct EmbedBlock {
    embed: Rc<Embed>,
    ctx: Rc<Context>,
    head: NodeId,
    tail: NodeId,
    swapper: Swapper,
    /// The value the current content was built from.
    value: Value,
    destroyed: bool,
}

impl EmbedBlock {
    /// Replace the hosted content. Equal values, and nullish over nullish, are ignored.
    pub fn set_content(&mut self, value: Value) -> Result<()> {
        if value == self.value || (value.is_nullish() && self.value.is_nullish()) {
            return Ok(());
        }
        let next = build(&self.embed, &self.ctx, &value)?;
        log::debug!(
            "embed block replacing {} content with {}",
            self.value.type_name(),
            value.type_name()
        );
        self.value = value;
        let transition = transition::select(
            self.embed.transition.as_ref(),
            self.swapper.is_mounted(),
            &self.ctx,
        );
        self.swapper.swap(next, transition);
        Ok(())
    }
}

fn build(embed: &Embed, ctx: &Rc<Context>, value: &Value) -> Result<Content> {
    let renderer: &Rc<dyn Renderer> = ctx.renderer();
    let content = match value {
        Value::Undefined | Value::Null => match &embed.placeholder {
            Some(placeholder) => Content::owned(RenderedRef::new(placeholder.instantiate(ctx)?)),
            None => Content::Empty,
        },
        Value::Instance(instance) => {
            instance.borrow_mut().bind();
            Content::Instance {
                instance: instance.clone(),
                owned: embed.owns_content,
            }
        }
        Value::Html(html) => Content::Nodes(renderer.parse_html(html)),
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            Content::Nodes(NodeList::from_elem(renderer.create_text(&value.to_text()), 1))
        }
        Value::Node(node) => Content::Nodes(NodeList::from_elem(*node, 1)),
        Value::Nodes(nodes) => Content::Nodes(nodes.iter().copied().collect()),
        Value::List(items) => {
            let nodes = items
                .iter()
                .map(|item| match item {
                    Value::Node(node) => Ok(*node),
                    other => Err(TemplateError::UnsupportedContent(format!(
                        "list containing a {}",
                        other.type_name()
                    ))),
                })
                .collect::<Result<NodeList>>()?;
            Content::Nodes(nodes)
        }
        Value::Object(object) => match object.render() {
            Some(html) => Content::Nodes(renderer.parse_html(&html)),
            None => {
                return Err(TemplateError::UnsupportedContent(
                    "object that neither renders nor exposes root nodes".to_string(),
                ))
            }
        },
    };
    Ok(content)
}

impl Rendered for EmbedBlock {
    fn root_nodes(&self) -> NodeList {
        let mut nodes = NodeList::new();
        if self.destroyed {
            return nodes;
        }
        nodes.push(self.head);
        nodes.extend(self.swapper.root_nodes());
        nodes.push(self.tail);
        nodes
    }

    fn is_single_root(&self) -> bool {
        false
    }

    fn update(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        if let Source::Dynamic(_) = self.embed.content {
            let value = self.embed.content.eval(&self.ctx);
            self.set_content(value)?;
        }
        if let Some(current) = self.swapper.current() {
            current.borrow_mut().update()?;
        }
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

    fn set_property(&mut self, name: &str, value: Value) {
        if name != CONTENT {
            log::warn!("embed block has no property '{}'", name);
            return;
        }
        if let Err(e) = self.set_content(value) {
            log::error!("failed to embed content: {}", e);
        }
    }
}
