use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use bus::{
    TransformJob,
    TransformReply,
    TransformWorker,
    WorkerBus,
    WorkerCommand,
    WorkerError,
    WorkerFactory,
};
use tokio::sync::oneshot;

/// Run the transform command loop on a dedicated thread.
///
/// Each job gets exactly one reply. Once `terminated` is set, queued jobs are
/// dropped unanswered and the loop exits at the next command.
pub fn start_transform_runtime(
    cmd_rx: Receiver<WorkerCommand>,
    terminated: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("transform-worker".to_string())
        .spawn(move || {
            while let Ok(cmd) = cmd_rx.recv() {
                if terminated.load(Ordering::Acquire) {
                    break;
                }
                match cmd {
                    WorkerCommand::Transform { job, reply } => {
                        let result: TransformReply =
                            markup::transform(&job.content, &job.context, &job.locale)
                                .map_err(WorkerError::from);
                        match &result {
                            Ok(out) => log::debug!(
                                target: "runtime.transform",
                                "request {} transformed: module={} bytes={}",
                                job.request_id,
                                out.name,
                                out.content.len()
                            ),
                            Err(err) => log::debug!(
                                target: "runtime.transform",
                                "request {} failed: {err}",
                                job.request_id
                            ),
                        }
                        if terminated.load(Ordering::Acquire) {
                            break;
                        }
                        // The waiting side may have given up already.
                        let _ = reply.send(result);
                    }
                    WorkerCommand::Shutdown => break,
                }
            }
            log::trace!(target: "runtime.transform", "worker loop exited");
        })
}

/// A transform worker backed by its own OS thread.
pub struct ThreadWorker {
    bus: Option<WorkerBus>,
    terminated: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ThreadWorker {
    pub fn spawn() -> Result<Self, WorkerError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let terminated = Arc::new(AtomicBool::new(false));
        let thread = start_transform_runtime(cmd_rx, terminated.clone()).map_err(WorkerError::Spawn)?;
        Ok(Self {
            bus: Some(WorkerBus { cmd_tx }),
            terminated,
            thread: Some(thread),
        })
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

impl TransformWorker for ThreadWorker {
    fn post(&mut self, job: TransformJob) -> oneshot::Receiver<TransformReply> {
        let (reply, rx) = oneshot::channel();
        let Some(bus) = &self.bus else {
            // Dropping `reply` resolves `rx` with an error.
            return rx;
        };
        if bus.cmd_tx.send(WorkerCommand::Transform { job, reply }).is_err() {
            log::warn!(target: "runtime.transform", "worker thread is gone; job dropped");
        }
        rx
    }

    fn terminate(&mut self) {
        self.terminated.store(true, Ordering::Release);
        if let Some(bus) = self.bus.take() {
            let _ = bus.cmd_tx.send(WorkerCommand::Shutdown);
        }
        // Detach: a job mid-transform finishes on its own and its reply is discarded.
        self.thread.take();
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadWorkerFactory;

impl WorkerFactory for ThreadWorkerFactory {
    fn spawn(&self) -> Result<Box<dyn TransformWorker>, WorkerError> {
        Ok(Box::new(ThreadWorker::spawn()?))
    }
}
