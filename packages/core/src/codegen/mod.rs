//! Code Generator
//!
//! Specializes normalized templates into units of typed operations, and runs
//! them as template instances.

pub mod compiler;
pub mod ingest;
pub mod instance;
pub mod ops;

pub use compiler::{CompiledTemplate, Compiler};
pub use instance::TemplateInstance;
