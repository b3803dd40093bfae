//! Templates
//!
//! Authored template data and its normalization into a uniform node tree.

pub mod authored;
pub mod fields;
pub mod node;
pub mod normalize;
pub mod plugins;
pub mod shorthand;

pub use authored::{
    comment, el, Callback, ComponentType, Handler, Template, TemplateBuilder, TemplateMap,
    CHILD_NODES, COMMENT_TYPE, TYPE,
};
pub use fields::Fields;
pub use node::{NodeData, NodeKind, TemplateNode};
pub use normalize::normalize;
pub use plugins::{GroupTransform, NodeTransform, PluginRegistry};
