//! Test Tooling
//!
//! A headless environment for exercising compiled templates: an in-memory
//! document, manually driven transitions and lifecycle-counting probes.

pub mod document;
pub mod probe;
pub mod transition;

use std::rc::Rc;

use crate::env::{Environment, FrameQueue};

pub use document::Document;
pub use probe::ProbeClass;
pub use transition::{ManualTransition, TransitionRecorder};

/// An environment over a fresh [`Document`] and [`FrameQueue`].
pub fn test_env() -> (Rc<Environment>, Rc<Document>, Rc<FrameQueue>) {
    let document = Rc::new(Document::new());
    let frames = Rc::new(FrameQueue::new());
    let env = Environment::new(document.clone(), frames.clone());
    (env, document, frames)
}
