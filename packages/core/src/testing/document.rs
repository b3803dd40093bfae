//! In-Memory Document
//!
//! A headless [`Renderer`] over a flat node arena. Every mutating call bumps a
//! write counter so tests can assert that an update touched nothing.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::env::renderer::{Event, Listener, ListenerId, NodeId, NodeList, Renderer};
use crate::value::Html;

lazy_static! {
    static ref MARKUP: Regex = Regex::new(
        r#"(?s)<!--(.*?)-->|<(/?)([a-zA-Z][\w-]*)((?:\s+[^\s/>"'=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?)*)\s*(/?)>|([^<]+)"#
    )
    .unwrap();
    static ref ATTRIBUTE: Regex =
        Regex::new(r#"([^\s/>"'=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#).unwrap();
}

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

#[derive(Debug, Clone)]
enum Kind {
    Element(String),
    Text(String),
    Comment(String),
}

struct DomNode {
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attrs: IndexMap<String, String>,
    styles: IndexMap<String, String>,
    listeners: Vec<(ListenerId, String, Listener)>,
}

impl DomNode {
    fn new(kind: Kind) -> Self {
        DomNode {
            kind,
            parent: None,
            children: Vec::new(),
            attrs: IndexMap::new(),
            styles: IndexMap::new(),
            listeners: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct Document {
    nodes: RefCell<Vec<DomNode>>,
    writes: Cell<usize>,
    next_listener: Cell<usize>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// A detached element to mount output into. Not counted as a write.
    pub fn create_root(&self) -> NodeId {
        self.alloc(Kind::Element("root".to_string()))
    }

    /// Output writes performed so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn reset_writes(&self) {
        self.writes.set(0);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node.0].children.clone()
    }

    /// Element tag name; `None` for text and comments.
    pub fn tag(&self, node: NodeId) -> Option<String> {
        match &self.nodes.borrow()[node.0].kind {
            Kind::Element(tag) => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn is_comment(&self, node: NodeId) -> bool {
        matches!(self.nodes.borrow()[node.0].kind, Kind::Comment(_))
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node.0].attrs.get(name).cloned()
    }

    pub fn has_class(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, "class")
            .map_or(false, |classes| classes.split_whitespace().any(|c| c == name))
    }

    /// First element with `tag` below `root`, depth first.
    pub fn find(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.find_all(root, tag).into_iter().next()
    }

    pub fn find_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect(root, tag, &mut found);
        found
    }

    fn collect(&self, node: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        for child in self.children(node) {
            if self.tag(child).as_deref() == Some(tag) {
                found.push(child);
            }
            self.collect(child, tag, found);
        }
    }

    /// Concatenated text below `node`, ignoring comments.
    pub fn text_content(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        text_into(&nodes, node, &mut out);
        out
    }

    pub fn to_html(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        html_into(&nodes, node, &mut out);
        out
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        for child in &nodes[node.0].children {
            html_into(&nodes, *child, &mut out);
        }
        out
    }

    /// Markup of the element children only, without sentinels or text.
    pub fn element_tags(&self, node: NodeId) -> Vec<String> {
        self.children(node)
            .into_iter()
            .filter_map(|child| self.tag(child))
            .collect()
    }

    /// Deliver an event to the listeners registered on `target`. Returns the
    /// number of listeners called.
    pub fn dispatch(&self, target: NodeId, name: &str) -> usize {
        let listeners: Vec<Listener> = self.nodes.borrow()[target.0]
            .listeners
            .iter()
            .filter(|(_, event, _)| event == name)
            .map(|(_, _, listener)| listener.clone())
            .collect();
        let event = Event::new(name, target);
        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.nodes.borrow()[node.0].listeners.len()
    }

    fn alloc(&self, kind: Kind) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(DomNode::new(kind));
        NodeId(nodes.len() - 1)
    }

    fn write(&self) {
        self.writes.set(self.writes.get() + 1);
    }

    fn detach(nodes: &mut [DomNode], node: NodeId) {
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    fn replace_children(&self, node: NodeId, children: &[NodeId]) {
        let mut nodes = self.nodes.borrow_mut();
        for child in std::mem::take(&mut nodes[node.0].children) {
            nodes[child.0].parent = None;
        }
        for child in children {
            Self::detach(&mut nodes, *child);
            nodes[child.0].parent = Some(node);
            nodes[node.0].children.push(*child);
        }
    }

    fn parse(&self, markup: &str) -> NodeList {
        let mut roots = NodeList::new();
        let mut open: Vec<NodeId> = Vec::new();
        for token in MARKUP.captures_iter(markup) {
            let node = if let Some(comment) = token.get(1) {
                self.alloc(Kind::Comment(comment.as_str().to_string()))
            } else if let Some(text) = token.get(6) {
                self.alloc(Kind::Text(text.as_str().to_string()))
            } else if &token[2] == "/" {
                let tag = &token[3];
                if let Some(at) = open
                    .iter()
                    .rposition(|n| self.tag(*n).as_deref() == Some(tag))
                {
                    open.truncate(at);
                }
                continue;
            } else {
                let tag = token[3].to_ascii_lowercase();
                let element = self.alloc(Kind::Element(tag.clone()));
                for attr in ATTRIBUTE.captures_iter(&token[4]) {
                    let value = attr
                        .get(2)
                        .or_else(|| attr.get(3))
                        .or_else(|| attr.get(4))
                        .map_or("", |m| m.as_str());
                    self.nodes.borrow_mut()[element.0]
                        .attrs
                        .insert(attr[1].to_string(), value.to_string());
                }
                let self_closing = &token[5] == "/" || VOID_TAGS.contains(&tag.as_str());
                self.append_parsed(&mut roots, &open, element);
                if !self_closing {
                    open.push(element);
                }
                continue;
            };
            self.append_parsed(&mut roots, &open, node);
        }
        roots
    }

    fn append_parsed(&self, roots: &mut NodeList, open: &[NodeId], node: NodeId) {
        match open.last() {
            Some(parent) => {
                let mut nodes = self.nodes.borrow_mut();
                nodes[node.0].parent = Some(*parent);
                nodes[parent.0].children.push(node);
            }
            None => roots.push(node),
        }
    }

    fn deep_clone(&self, node: NodeId) -> NodeId {
        let (kind, attrs, styles, children) = {
            let nodes = self.nodes.borrow();
            let source = &nodes[node.0];
            (
                source.kind.clone(),
                source.attrs.clone(),
                source.styles.clone(),
                source.children.clone(),
            )
        };
        let copy = self.alloc(kind);
        {
            let mut nodes = self.nodes.borrow_mut();
            nodes[copy.0].attrs = attrs;
            nodes[copy.0].styles = styles;
        }
        for child in children {
            let child = self.deep_clone(child);
            let mut nodes = self.nodes.borrow_mut();
            nodes[child.0].parent = Some(copy);
            nodes[copy.0].children.push(child);
        }
        copy
    }
}

fn text_into(nodes: &[DomNode], node: NodeId, out: &mut String) {
    match &nodes[node.0].kind {
        Kind::Text(text) => out.push_str(text),
        Kind::Comment(_) => {}
        Kind::Element(_) => {
            for child in &nodes[node.0].children {
                text_into(nodes, *child, out);
            }
        }
    }
}

fn html_into(nodes: &[DomNode], node: NodeId, out: &mut String) {
    let dom = &nodes[node.0];
    match &dom.kind {
        Kind::Text(text) => out.push_str(text),
        Kind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Kind::Element(tag) => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in &dom.attrs {
                if value.is_empty() {
                    out.push_str(&format!(" {}", name));
                } else {
                    out.push_str(&format!(" {}=\"{}\"", name, value));
                }
            }
            if !dom.styles.is_empty() {
                let style: Vec<String> = dom
                    .styles
                    .iter()
                    .map(|(name, value)| format!("{}: {}", name, value))
                    .collect();
                out.push_str(&format!(" style=\"{}\"", style.join("; ")));
            }
            out.push('>');
            if VOID_TAGS.contains(&tag.as_str()) {
                return;
            }
            for child in &dom.children {
                html_into(nodes, *child, out);
            }
            out.push_str(&format!("</{}>", tag));
        }
    }
}

impl Renderer for Document {
    fn create_element(&self, tag: &str) -> NodeId {
        self.write();
        self.alloc(Kind::Element(tag.to_string()))
    }

    fn create_text(&self, text: &str) -> NodeId {
        self.write();
        self.alloc(Kind::Text(text.to_string()))
    }

    fn create_comment(&self, text: &str) -> NodeId {
        self.write();
        self.alloc(Kind::Comment(text.to_string()))
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.write();
        self.nodes.borrow_mut()[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        self.write();
        self.nodes.borrow_mut()[node.0].attrs.shift_remove(name);
    }

    fn style(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node.0].styles.get(name).cloned()
    }

    fn set_style(&self, node: NodeId, name: &str, value: &str) {
        self.write();
        self.nodes.borrow_mut()[node.0]
            .styles
            .insert(name.to_string(), value.to_string());
    }

    fn remove_style(&self, node: NodeId, name: &str) {
        self.write();
        self.nodes.borrow_mut()[node.0].styles.shift_remove(name);
    }

    fn add_class(&self, node: NodeId, name: &str) {
        if self.has_class(node, name) {
            return;
        }
        self.write();
        let mut nodes = self.nodes.borrow_mut();
        let classes = nodes[node.0].attrs.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(name);
    }

    fn remove_class(&self, node: NodeId, name: &str) {
        if !self.has_class(node, name) {
            return;
        }
        self.write();
        let mut nodes = self.nodes.borrow_mut();
        let attrs = &mut nodes[node.0].attrs;
        let remaining: Vec<String> = attrs
            .get("class")
            .map(|c| {
                c.split_whitespace()
                    .filter(|c| *c != name)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if remaining.is_empty() {
            attrs.shift_remove("class");
        } else {
            attrs.insert("class".to_string(), remaining.join(" "));
        }
    }

    fn insert_before(&self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        self.write();
        let mut nodes = self.nodes.borrow_mut();
        Self::detach(&mut nodes, node);
        let children = &mut nodes[parent.0].children;
        let at = reference
            .and_then(|r| children.iter().position(|c| *c == r))
            .unwrap_or(children.len());
        children.insert(at, node);
        nodes[node.0].parent = Some(parent);
    }

    fn remove(&self, node: NodeId) {
        self.write();
        Self::detach(&mut self.nodes.borrow_mut(), node);
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0].parent
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let parent = nodes[node.0].parent?;
        let siblings = &nodes[parent.0].children;
        let at = siblings.iter().position(|c| *c == node)?;
        siblings.get(at + 1).copied()
    }

    fn set_text(&self, node: NodeId, text: &str) {
        self.write();
        let is_element = {
            let mut nodes = self.nodes.borrow_mut();
            match &mut nodes[node.0].kind {
                Kind::Text(data) | Kind::Comment(data) => {
                    *data = text.to_string();
                    false
                }
                Kind::Element(_) => true,
            }
        };
        if is_element {
            let child = self.alloc(Kind::Text(text.to_string()));
            self.replace_children(node, &[child]);
        }
    }

    fn set_html(&self, node: NodeId, html: &Html) {
        self.write();
        let parsed = self.parse(html.as_str());
        self.replace_children(node, &parsed);
    }

    fn parse_html(&self, html: &Html) -> NodeList {
        self.write();
        self.parse(html.as_str())
    }

    fn clone_node(&self, node: NodeId) -> NodeId {
        self.write();
        self.deep_clone(node)
    }

    fn add_listener(&self, node: NodeId, event: &str, listener: Listener) -> ListenerId {
        self.write();
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.nodes.borrow_mut()[node.0]
            .listeners
            .push((id, event.to_string(), listener));
        id
    }

    fn remove_listener(&self, node: NodeId, listener: ListenerId) {
        self.write();
        self.nodes.borrow_mut()[node.0]
            .listeners
            .retain(|(id, _, _)| *id != listener);
    }
}
