use core_types::RequestId;
use markup::{Locale, MarkupError, TransformContext, TransformResult};
use std::sync::mpsc::Sender;
use std::time::Duration;
use tokio::sync::oneshot;

/// Outbound payload: `[content, context, locale]`.
#[derive(Clone, Debug)]
pub struct TransformJob {
    pub request_id: RequestId,
    pub content: String,
    pub context: TransformContext,
    pub locale: Locale,
}

pub type TransformReply = Result<TransformResult, WorkerError>;

#[derive(Debug)]
pub enum WorkerCommand {
    // Main thread -> worker
    Transform {
        job: TransformJob,
        reply: oneshot::Sender<TransformReply>,
    },
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to spawn transform worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("transform worker reported an error: {0}")]
    Transform(#[from] MarkupError),

    #[error("transform worker disconnected before replying")]
    Disconnected,

    #[error("transform worker did not reply within {0:?}")]
    Timeout(Duration),
}

/// Command side of one worker. Dropping it ends the worker's loop.
pub struct WorkerBus {
    pub cmd_tx: Sender<WorkerCommand>,
}

/// An isolated transform executor. One instance serves one render.
pub trait TransformWorker: Send {
    /// Post a job. The receiver resolves at most once; it errors if the
    /// worker goes away without replying.
    fn post(&mut self, job: TransformJob) -> oneshot::Receiver<TransformReply>;

    /// Stop the worker. Idempotent; a reply still in flight is discarded.
    fn terminate(&mut self);
}

pub trait WorkerFactory: Send + Sync {
    fn spawn(&self) -> Result<Box<dyn TransformWorker>, WorkerError>;
}
