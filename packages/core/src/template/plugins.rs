//! Plugin Transforms
//!
//! Ordered structural rewrites applied before classification. Control-flow
//! sugar (`if`/`elseif`/`else`, `foreach`, `embed`, content callables) is
//! expressed here as ordinary compositions of integrated block nodes.

use std::rc::Rc;

use crate::blocks::embed_block::{self, EmbedBlockClass};
use crate::blocks::foreach_block::{self, ForEachBlockClass};
use crate::blocks::if_block::{self, IfBlockClass};
use crate::error::{Result, TemplateError};

use super::authored::{ComponentType, Template, TemplateMap, TYPE};

pub const IF: &str = "if";
pub const ELSEIF: &str = "elseif";
pub const ELSE: &str = "else";
pub const FOREACH: &str = "foreach";
pub const EMBED: &str = "embed";

/// Runs once per sibling list.
pub trait GroupTransform {
    fn name(&self) -> &str;
    fn transform(&self, siblings: Vec<Template>) -> Result<Vec<Template>>;
}

/// Runs once per node. Returns the template unchanged when it does not apply.
pub trait NodeTransform {
    fn name(&self) -> &str;
    fn transform(&self, template: Template) -> Result<Template>;
}

pub struct PluginRegistry {
    groups: Vec<Rc<dyn GroupTransform>>,
    nodes: Vec<Rc<dyn NodeTransform>>,
}

impl PluginRegistry {
    /// A registry with no transforms at all.
    pub fn empty() -> Self {
        PluginRegistry {
            groups: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = PluginRegistry::empty();
        registry.add_group(IfChainTransform);
        registry.add_node(IfTransform);
        registry.add_node(ForEachTransform);
        registry.add_node(EmbedTransform);
        registry.add_node(ContentTransform);
        registry
    }

    pub fn add_group(&mut self, transform: impl GroupTransform + 'static) {
        self.groups.push(Rc::new(transform));
    }

    pub fn add_node(&mut self, transform: impl NodeTransform + 'static) {
        self.nodes.push(Rc::new(transform));
    }

    pub fn transform_group(&self, siblings: Vec<Template>) -> Result<Vec<Template>> {
        let mut siblings: Vec<Template> = siblings.into_iter().map(unwrap_builders).collect();
        for transform in &self.groups {
            siblings = transform.transform(siblings)?;
        }
        Ok(siblings)
    }

    pub fn transform_node(&self, template: Template) -> Result<Template> {
        let mut template = template;
        for transform in &self.nodes {
            template = unwrap_builders(transform.transform(template)?);
        }
        Ok(template)
    }

    pub fn len(&self) -> usize {
        self.groups.len() + self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        PluginRegistry::with_builtins()
    }
}

/// Replace fluent builder sugar with the data it produces.
pub(crate) fn unwrap_builders(template: Template) -> Template {
    let mut template = template;
    while let Template::Builder(builder) = template {
        template = builder.build();
    }
    template
}

fn block_map(class: ComponentType) -> TemplateMap {
    TemplateMap::new().with(TYPE, class)
}

/// The control-flow key a sibling carries, if any.
fn control_key(template: &Template) -> Result<Option<&'static str>> {
    let Some(map) = template.as_map() else {
        return Ok(None);
    };
    let found: Vec<&'static str> = [IF, ELSEIF, ELSE]
        .into_iter()
        .filter(|k| map.contains_key(k))
        .collect();
    match found.as_slice() {
        [] => Ok(None),
        [key] => Ok(Some(*key)),
        _ => Err(TemplateError::InvalidControlFlow(format!(
            "a node cannot carry more than one of {}",
            found.join("/")
        ))),
    }
}

/// Split a control-flow sibling into a branch description.
fn branch(template: Template, key: &str) -> Template {
    let mut map = match template {
        Template::Map(map) => map,
        other => return other,
    };
    let condition = map.remove(key);
    let mut branch = TemplateMap::new();
    if key != ELSE {
        if let Some(condition) = condition {
            branch.insert(if_block::CONDITION, condition);
        }
    }
    if !map.is_empty() {
        branch.insert(if_block::TEMPLATE, Template::Map(map));
    }
    Template::Map(branch)
}

fn conditional(branches: Vec<Template>) -> Template {
    let class = ComponentType::Integrated(Rc::new(IfBlockClass));
    Template::Map(block_map(class).with(if_block::BRANCHES, Template::List(branches)))
}

/// Rewrites adjacent `if`/`elseif`/`else` siblings into one conditional block.
pub struct IfChainTransform;

impl GroupTransform for IfChainTransform {
    fn name(&self) -> &str {
        "if-chain"
    }

    fn transform(&self, siblings: Vec<Template>) -> Result<Vec<Template>> {
        let mut out = Vec::with_capacity(siblings.len());
        let mut chain: Option<Vec<Template>> = None;
        for sibling in siblings {
            match control_key(&sibling)? {
                Some(IF) => {
                    if let Some(branches) = chain.take() {
                        out.push(conditional(branches));
                    }
                    chain = Some(vec![branch(sibling, IF)]);
                }
                Some(ELSEIF) => match chain.as_mut() {
                    Some(branches) => branches.push(branch(sibling, ELSEIF)),
                    None => {
                        return Err(TemplateError::InvalidControlFlow(
                            "elseif without a preceding if".to_string(),
                        ))
                    }
                },
                Some(_) => match chain.take() {
                    Some(mut branches) => {
                        branches.push(branch(sibling, ELSE));
                        out.push(conditional(branches));
                    }
                    None => {
                        return Err(TemplateError::InvalidControlFlow(
                            "else without a preceding if".to_string(),
                        ))
                    }
                },
                None => {
                    if let Some(branches) = chain.take() {
                        out.push(conditional(branches));
                    }
                    out.push(sibling);
                }
            }
        }
        if let Some(branches) = chain.take() {
            out.push(conditional(branches));
        }
        Ok(out)
    }
}

/// A lone `if` outside any sibling list, such as a template root.
pub struct IfTransform;

impl NodeTransform for IfTransform {
    fn name(&self) -> &str {
        "if"
    }

    fn transform(&self, template: Template) -> Result<Template> {
        match control_key(&template)? {
            Some(IF) => Ok(conditional(vec![branch(template, IF)])),
            Some(key) => Err(TemplateError::InvalidControlFlow(format!(
                "{} without a preceding if",
                key
            ))),
            None => Ok(template),
        }
    }
}

/// `{foreach: items, ...item template}`
pub struct ForEachTransform;

impl NodeTransform for ForEachTransform {
    fn name(&self) -> &str {
        "foreach"
    }

    fn transform(&self, template: Template) -> Result<Template> {
        let mut map = match template {
            Template::Map(map) if map.contains_key(FOREACH) => map,
            other => return Ok(other),
        };
        let spec = map.remove(FOREACH).unwrap_or(Template::Value(Default::default()));
        let class = ComponentType::Integrated(Rc::new(ForEachBlockClass));
        let mut block = block_map(class);

        match spec {
            Template::Map(options) => {
                for (key, value) in options.iter() {
                    match key {
                        foreach_block::ITEMS
                        | foreach_block::ITEM_KEY
                        | foreach_block::CONDITION
                        | foreach_block::EMPTY => {
                            block.insert(key, value.clone());
                        }
                        other => return Err(TemplateError::unknown_key(other, "foreach")),
                    }
                }
            }
            items @ (Template::Callback(_) | Template::Value(_) | Template::List(_)) => {
                block.insert(foreach_block::ITEMS, items);
            }
            other => {
                return Err(TemplateError::InvalidControlFlow(format!(
                    "foreach expects items, a callable or an options mapping, found {}",
                    other.describe()
                )))
            }
        }

        if map.is_empty() {
            return Err(TemplateError::InvalidControlFlow(
                "foreach requires an item template".to_string(),
            ));
        }
        block.insert(foreach_block::TEMPLATE, Template::Map(map));
        Ok(Template::Map(block))
    }
}

/// `{embed: content}` or `{embed: {content, owns_content, placeholder, transition}}`.
/// On an element the embedding block is appended to its children.
pub struct EmbedTransform;

impl NodeTransform for EmbedTransform {
    fn name(&self) -> &str {
        "embed"
    }

    fn transform(&self, template: Template) -> Result<Template> {
        let mut map = match template {
            Template::Map(map) if map.contains_key(EMBED) => map,
            other => return Ok(other),
        };
        let spec = map.remove(EMBED).unwrap_or(Template::Value(Default::default()));
        let class = ComponentType::Integrated(Rc::new(EmbedBlockClass));
        let mut block = block_map(class);
        // on a typed node the block becomes its last child
        let host = if map.contains_key(TYPE) {
            Some(map)
        } else {
            // leftovers stay on the block node so they are reported as unknown keys
            for (key, value) in map.iter() {
                block.insert(key, value.clone());
            }
            None
        };
        match spec {
            Template::Map(options) => {
                for (key, value) in options.iter() {
                    block.insert(key, value.clone());
                }
            }
            Template::Content(callback) => {
                block.insert(embed_block::CONTENT, Template::Callback(callback));
            }
            content => {
                block.insert(embed_block::CONTENT, content);
            }
        }
        Ok(match host {
            Some(host) => Template::Map(host.child(Template::Map(block))),
            None => Template::Map(block),
        })
    }
}

/// A bare content callable becomes an embedding block.
pub struct ContentTransform;

impl NodeTransform for ContentTransform {
    fn name(&self) -> &str {
        "content"
    }

    fn transform(&self, template: Template) -> Result<Template> {
        match template {
            Template::Content(callback) => {
                let class = ComponentType::Integrated(Rc::new(EmbedBlockClass));
                Ok(Template::Map(
                    block_map(class).with(embed_block::CONTENT, Template::Callback(callback)),
                ))
            }
            other => Ok(other),
        }
    }
}
