//! Trellis Core
//!
//! Compiles declarative UI templates into specialized create/update logic and
//! reconciles the output through conditional, repeating and embedding blocks.

// Core modules
pub mod config;
pub mod context;
pub mod error;
pub mod invalidation;
pub mod rendered;
pub mod value;

// Host collaborators
pub mod env;

// Compilation pipeline
pub mod codegen;
pub mod differ;
pub mod template;

// Runtime
pub mod blocks;
pub mod component;

// Headless renderer and helpers for tests
pub mod testing;

// Re-exports
pub use codegen::{CompiledTemplate, Compiler, TemplateInstance};
pub use component::{ComponentClass, View, ViewClass};
pub use config::CompilerConfig;
pub use context::Context;
pub use differ::{diff_keys, EditOp};
pub use env::{Environment, Renderer, Transition, TransitionFactory};
pub use error::{Result, TemplateError};
pub use rendered::{Rendered, RenderedRef};
pub use template::{el, Template, TemplateMap};
pub use value::{Html, Object, Record, Value};
