//! Minimal arena DOM for questionnaire markup: tokenizer, tree, form-control state.

mod controls;
mod document;
mod entities;
mod events;
mod tokenizer;
mod types;

pub use controls::ControlKind;
pub use document::Document;
pub use events::{DomEvent, EventType};
pub use tokenizer::tokenize;
pub use types::{Attribute, NodeId, NodeKind, Token};
