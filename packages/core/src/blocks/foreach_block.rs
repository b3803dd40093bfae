//! Repeating Block
//!
//! One template instance per item of a sequence. Keyed sequences are
//! reconciled with the differ so surviving items keep their instances;
//! unkeyed sequences grow and shrink at the end. Two permanent comment
//! sentinels bracket the items so there is always an insertion point.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::codegen::{CompiledTemplate, Compiler, TemplateInstance};
use crate::context::Context;
use crate::differ::{diff_keys, length_delta, EditOp};
use crate::env::renderer::{insert_all, remove_all, NodeId, NodeList, Renderer};
use crate::env::transition::NullTransition;
use crate::error::{Result, TemplateError};
use crate::rendered::{Rendered, RenderedRef};
use crate::template::authored::Callback;
use crate::template::fields::Fields;
use crate::value::Value;

use super::swap::{Content, Swapper};
use super::{callback_field, template_field, BlockFactory, IntegratedClass, Source};

pub const ITEMS: &str = "items";
pub const ITEM_KEY: &str = "item_key";
pub const CONDITION: &str = "condition";
pub const EMPTY: &str = "empty";
pub const TEMPLATE: &str = "template";

pub struct ForEachBlockClass;

impl IntegratedClass for ForEachBlockClass {
    fn name(&self) -> &str {
        "ForEachBlock"
    }

    fn integrate(&self, fields: &Fields<'_>, compiler: &Compiler) -> Result<Rc<dyn BlockFactory>> {
        let items = match fields.get(ITEMS) {
            Some(items) => Source::from_template(ITEMS, items)?,
            None => return Err(TemplateError::invalid_value(ITEMS, "a repeat needs items")),
        };
        let template = template_field(fields, TEMPLATE, compiler)?
            .ok_or_else(|| TemplateError::invalid_value(TEMPLATE, "a repeat needs an item template"))?;
        Ok(Rc::new(ForEachFactory(Rc::new(Repeat {
            items,
            item_key: callback_field(fields, ITEM_KEY)?,
            condition: callback_field(fields, CONDITION)?,
            empty: template_field(fields, EMPTY, compiler)?,
            template,
        }))))
    }
}

/// Compiled fields shared by every block created from one template node.
struct Repeat {
    items: Source,
    item_key: Option<Callback>,
    condition: Option<Callback>,
    empty: Option<CompiledTemplate>,
    template: CompiledTemplate,
}

struct ForEachFactory(Rc<Repeat>);

impl BlockFactory for ForEachFactory {
    fn is_single_root(&self) -> bool {
        false
    }

    fn create(&self, ctx: &Rc<Context>) -> Result<Box<dyn Rendered>> {
        let renderer = ctx.renderer().clone();
        let head = renderer.create_comment("foreach");
        let tail = renderer.create_comment("/foreach");
        let mut block = ForEachBlock {
            repeat: self.0.clone(),
            ctx: ctx.clone(),
            empty: Swapper::new(renderer.clone(), Some(head), Content::Empty),
            renderer,
            head,
            tail,
            items: Vec::new(),
            mounted: false,
            destroyed: false,
        };
        block.refresh()?;
        Ok(Box::new(block))
    }
}

struct Item {
    ctx: Rc<Context>,
    instance: TemplateInstance,
}

pub struct ForEachBlock {
    repeat: Rc<Repeat>,
    ctx: Rc<Context>,
    renderer: Rc<dyn Renderer>,
    head: NodeId,
    tail: NodeId,
    items: Vec<Item>,
    empty: Swapper,
    mounted: bool,
    destroyed: bool,
}

impl ForEachBlock {
    fn evaluate(&self) -> Result<Vec<Value>> {
        let source = self.repeat.items.eval(&self.ctx);
        let items = match &source {
            Value::List(items) => items.as_slice(),
            value if value.is_nullish() => &[],
            other => {
                return Err(TemplateError::invalid_value(
                    ITEMS,
                    format!("expected a list, found {}", other.type_name()),
                ))
            }
        };
        Ok(match &self.repeat.condition {
            Some(condition) => items
                .iter()
                .filter(|item| condition(item, &self.ctx).is_truthy())
                .cloned()
                .collect(),
            None => items.to_vec(),
        })
    }

    fn refresh(&mut self) -> Result<()> {
        let values = self.evaluate()?;
        let keys: Option<Vec<Value>> = self
            .repeat
            .item_key
            .as_ref()
            .map(|key| values.iter().map(|item| key(item, &self.ctx)).collect());

        let ops = match &keys {
            Some(keys) => {
                let old: Vec<Value> = self.items.iter().map(|item| item.ctx.key()).collect();
                diff_keys(&old, keys)
            }
            None => length_delta(self.items.len(), values.len()),
        };
        if !ops.is_empty() {
            log::trace!("repeat applying {} edit ops: {:?}", ops.len(), ops);
        }
        self.apply(&ops, &values, keys.as_deref())?;

        for (index, item) in self.items.iter_mut().enumerate() {
            item.ctx.set_model(values[index].clone());
            item.ctx.set_key(key_at(keys.as_deref(), index));
            item.ctx.set_index(index);
            item.instance.rebind();
            item.instance.update()?;
        }
        self.sync_empty()
    }

    fn apply(&mut self, ops: &[EditOp], values: &[Value], keys: Option<&[Value]>) -> Result<()> {
        let mut store: Vec<Option<Item>> = Vec::new();
        // items removed by the op just before, reused by an adjacent insert
        let mut spares: VecDeque<Item> = VecDeque::new();
        let result = self.apply_ops(ops, values, keys, &mut store, &mut spares);

        // detached items that were never reattached, also when an op failed
        self.flush(&mut spares);
        for item in store.into_iter().flatten() {
            self.discard(item);
        }
        result
    }

    fn apply_ops(
        &mut self,
        ops: &[EditOp],
        values: &[Value],
        keys: Option<&[Value]>,
        store: &mut Vec<Option<Item>>,
        spares: &mut VecDeque<Item>,
    ) -> Result<()> {
        for op in ops {
            match *op {
                EditOp::Insert { index, count } => {
                    let mut inserted = Vec::with_capacity(count);
                    for position in index..index + count {
                        let model = values[position].clone();
                        let key = key_at(keys, position);
                        let item = match spares.pop_front() {
                            Some(item) => {
                                item.ctx.set_model(model);
                                item.ctx.set_key(key);
                                item.ctx.set_index(position);
                                item
                            }
                            None => match self.create_item(model, key, position) {
                                Ok(item) => item,
                                Err(err) => {
                                    spares.extend(inserted);
                                    return Err(err);
                                }
                            },
                        };
                        inserted.push(item);
                    }
                    self.flush(spares);
                    self.attach(index, inserted);
                }
                EditOp::Delete { index, count } => {
                    self.flush(spares);
                    let removed: Vec<Item> = self.items.drain(index..index + count).collect();
                    for item in removed {
                        self.detach(&item);
                        spares.push_back(item);
                    }
                }
                EditOp::Store { index, count } => {
                    self.flush(spares);
                    let removed: Vec<Item> = self.items.drain(index..index + count).collect();
                    for item in removed {
                        self.detach(&item);
                        store.push(Some(item));
                    }
                }
                EditOp::Restore {
                    index,
                    count,
                    store_index,
                } => {
                    self.flush(spares);
                    let restored: Vec<Item> = store[store_index..store_index + count]
                        .iter_mut()
                        .filter_map(Option::take)
                        .collect();
                    self.attach(index, restored);
                }
            }
        }
        Ok(())
    }

    fn create_item(&self, model: Value, key: Value, index: usize) -> Result<Item> {
        let ctx = Context::nested(&self.ctx, model, key, index);
        let instance = self.repeat.template.instantiate(&ctx)?;
        Ok(Item { ctx, instance })
    }

    /// Splice `items` in at `index`, in the list and in the output.
    fn attach(&mut self, index: usize, items: Vec<Item>) {
        let reference = self.items[index..]
            .iter()
            .find_map(|item| item.instance.root_node())
            .unwrap_or(self.tail);
        if let Some(parent) = self.renderer.parent(self.tail) {
            for item in &items {
                insert_all(
                    self.renderer.as_ref(),
                    parent,
                    &item.instance.root_nodes(),
                    Some(reference),
                );
            }
        }
        let count = items.len();
        self.items.splice(index..index, items);
        if self.mounted {
            for item in &mut self.items[index..index + count] {
                item.instance.set_mounted(true);
            }
        }
    }

    fn detach(&self, item: &Item) {
        remove_all(self.renderer.as_ref(), &item.instance.root_nodes());
    }

    fn discard(&self, mut item: Item) {
        self.detach(&item);
        item.instance.set_mounted(false);
        item.instance.destroy();
    }

    fn flush(&self, spares: &mut VecDeque<Item>) {
        for item in spares.drain(..) {
            self.discard(item);
        }
    }

    /// Show the placeholder exactly when there are no items.
    fn sync_empty(&mut self) -> Result<()> {
        let Some(template) = &self.repeat.empty else {
            return Ok(());
        };
        let showing = self.empty.current().is_some();
        if self.items.is_empty() && !showing {
            let placeholder = template.instantiate(&self.ctx)?;
            self.empty
                .swap(Content::owned(RenderedRef::new(placeholder)), NullTransition::new());
        } else if !self.items.is_empty() && showing {
            self.empty.swap(Content::Empty, NullTransition::new());
        } else if let Some(current) = self.empty.current() {
            current.borrow_mut().update()?;
        }
        Ok(())
    }
}

fn key_at(keys: Option<&[Value]>, index: usize) -> Value {
    keys.map_or(Value::Undefined, |keys| keys[index].clone())
}

impl Rendered for ForEachBlock {
    fn root_nodes(&self) -> NodeList {
        let mut nodes = NodeList::new();
        if self.destroyed {
            return nodes;
        }
        nodes.push(self.head);
        nodes.extend(self.empty.root_nodes());
        for item in &self.items {
            nodes.extend(item.instance.root_nodes());
        }
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
        self.refresh()
    }

    fn bind(&mut self) {
        for item in &mut self.items {
            item.instance.bind();
        }
        self.empty.bind();
    }

    fn unbind(&mut self) {
        for item in &mut self.items {
            item.instance.unbind();
        }
        self.empty.unbind();
    }

    fn set_mounted(&mut self, mounted: bool) {
        if self.mounted == mounted {
            return;
        }
        self.mounted = mounted;
        self.empty.set_mounted(mounted);
        for item in &mut self.items {
            item.instance.set_mounted(mounted);
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.empty.destroy();
        for mut item in self.items.drain(..) {
            item.instance.destroy();
        }
        self.destroyed = true;
    }
}
