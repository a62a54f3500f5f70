//! DOM-agnostic state of questionnaire form controls.
//!
//! The DOM crate seeds a [`ControlStore`] from markup and keeps it in sync with
//! user interaction; the questionnaire engine reads and clears it when answers
//! are recorded, restored or reset.

mod id;
mod store;
mod text;

pub use id::ControlId;
pub use store::ControlStore;
pub use text::typed_text;
