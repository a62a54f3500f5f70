//! Pure questionnaire markup transform.
//!
//! Everything here is deterministic for identical inputs: wall-clock and
//! environment lookups are resolved by the caller into a [`TransformContext`]
//! before the transform runs, so the same job can execute on a worker thread or
//! inline and produce byte-identical output.

mod context;
mod error;
mod locale;
mod transform;

pub use context::{TransformContext, user_variables};
pub use error::MarkupError;
pub use locale::Locale;
pub use transform::{DEFAULT_MODULE_NAME, TransformResult, escape_html, transform};
