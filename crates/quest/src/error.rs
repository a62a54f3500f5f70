//! Error types for the questionnaire session.
//!
//! Only [`RenderError`] ever reaches the caller of `render`; every other class
//! is logged and degraded where it occurs.

pub use bus::WorkerError;
pub use markup::MarkupError;
pub use net::FetchError;

/// Rehydrating a navigation queue from persisted data failed.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("malformed navigation tree: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("cursor {cursor} is outside a path of length {len}")]
    CursorOutOfRange { cursor: usize, len: usize },

    #[error("a non-empty path needs a cursor")]
    MissingCursor,
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The worker failed or timed out and the inline fallback failed too.
    #[error("inline transform failed after worker error ({worker}): {source}")]
    Fatal {
        worker: WorkerError,
        #[source]
        source: MarkupError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("persistence backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("retrieve callback failed: {0}")]
    Retrieve(String),

    #[error("store callback failed: {0}")]
    Store(String),
}

/// Fatal initialization failure; the render did not produce a live session.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("could not transform questionnaire: {0}")]
    Transform(#[from] TransformError),

    #[error("could not fetch questionnaire content: {0}")]
    Fetch(#[from] FetchError),

    #[error("content fetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
