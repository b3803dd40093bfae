//! Errors
//!
//! Configuration errors raised while normalizing and compiling templates, and the
//! few shape errors that can only be detected once dynamic content is evaluated.

use thiserror::Error;

/// Errors produced by template compilation and block construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemplateError {
    /// A field survived known-key and plugin processing without being recognized.
    #[error("unknown key '{key}' on {kind} node")]
    UnknownKey { key: String, kind: &'static str },

    /// `child_nodes` was supplied on a node kind that cannot have children.
    #[error("child_nodes is not supported on {kind} nodes")]
    ChildNodesNotAllowed { kind: &'static str },

    /// Two nodes in the same compiled unit export the same name.
    #[error("duplicate export name '{0}'")]
    DuplicateExport(String),

    /// Two nodes in the same compiled unit bind the same back-reference name.
    #[error("duplicate bind name '{0}'")]
    DuplicateBind(String),

    /// An event handler that is neither a method name nor a callable.
    #[error("handler for '{event}' must be a method name or a callable")]
    InvalidHandler { event: String },

    /// Control-flow sugar that could not be resolved into a block.
    #[error("invalid control flow: {0}")]
    InvalidControlFlow(String),

    /// A shorthand type string (`tag.class#id attr=value`) that could not be parsed.
    #[error("invalid shorthand type '{0}'")]
    InvalidShorthand(String),

    /// A field whose value has the wrong shape.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// Content handed to an embedding block that it does not know how to host.
    #[error("unsupported embedded content: {0}")]
    UnsupportedContent(String),

    /// An operation that needs a renderer was attempted without one.
    #[error("no renderer available to {0}")]
    MissingRenderer(&'static str),
}

impl TemplateError {
    pub fn unknown_key(key: impl Into<String>, kind: &'static str) -> Self {
        TemplateError::UnknownKey {
            key: key.into(),
            kind,
        }
    }

    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        TemplateError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
