//! One-shot transform dispatch with a bounded wait and inline fallback.
//!
//! The worker's reply channel is a `oneshot`, so the pending operation can be
//! resolved at most once: whichever of reply, worker error or timeout is
//! observed first decides the outcome, and a reply arriving after the timeout
//! finds its receiver dropped.

use crate::error::{TransformError, WorkerError};
use bus::{TransformJob, WorkerFactory};
use markup::TransformResult;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TRANSFORM_TIMEOUT: Duration = Duration::from_secs(10);

/// Which path produced a [`TransformResult`]. Only used for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformPath {
    Worker,
    Fallback,
}

pub struct TransformPipeline {
    factory: Arc<dyn WorkerFactory>,
    timeout: Duration,
}

impl TransformPipeline {
    pub fn new(factory: Arc<dyn WorkerFactory>, timeout: Duration) -> Self {
        Self { factory, timeout }
    }

    pub async fn run(&self, job: TransformJob) -> Result<TransformResult, TransformError> {
        self.run_traced(job).await.map(|(result, _)| result)
    }

    /// Like [`run`](Self::run), also reporting which path resolved the job.
    pub async fn run_traced(
        &self,
        job: TransformJob,
    ) -> Result<(TransformResult, TransformPath), TransformError> {
        let request_id = job.request_id;
        let worker_failure = match self.factory.spawn() {
            Ok(mut worker) => {
                let reply = worker.post(job.clone());
                let outcome = tokio::time::timeout(self.timeout, reply).await;
                worker.terminate();
                match outcome {
                    Ok(Ok(Ok(result))) => {
                        log::debug!(
                            target: "quest.transform",
                            "request {request_id} resolved by worker: module={}",
                            result.name
                        );
                        return Ok((result, TransformPath::Worker));
                    }
                    Ok(Ok(Err(err))) => err,
                    Ok(Err(_closed)) => WorkerError::Disconnected,
                    Err(_elapsed) => WorkerError::Timeout(self.timeout),
                }
            }
            Err(err) => err,
        };

        log::warn!(
            target: "quest.transform",
            "request {request_id}: {worker_failure}; falling back to inline transform"
        );
        match markup::transform(&job.content, &job.context, &job.locale) {
            Ok(result) => Ok((result, TransformPath::Fallback)),
            Err(source) => {
                log::error!(
                    target: "quest.transform",
                    "request {request_id}: inline transform failed: {source}"
                );
                Err(TransformError::Fatal {
                    worker: worker_failure,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::{TransformReply, TransformWorker};
    use chrono::NaiveDate;
    use markup::{Locale, TransformContext};
    use runtime_transform::ThreadWorkerFactory;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn job(content: &str) -> TransformJob {
        let locale = Locale::english();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        TransformJob {
            request_id: 7,
            content: content.to_string(),
            context: TransformContext::for_date(date, &locale).with_user_var("age", "42"),
            locale,
        }
    }

    #[derive(Clone, Copy)]
    enum Behaviour {
        Stall,
        Fail,
        Vanish,
    }

    /// Worker double. Stalled workers park their reply sender so a test can
    /// answer late.
    struct FakeWorker {
        behaviour: Behaviour,
        parked: Arc<Mutex<Option<oneshot::Sender<TransformReply>>>>,
        terminations: Arc<AtomicUsize>,
    }

    impl TransformWorker for FakeWorker {
        fn post(&mut self, job: TransformJob) -> oneshot::Receiver<TransformReply> {
            let (tx, rx) = oneshot::channel();
            match self.behaviour {
                Behaviour::Stall => *self.parked.lock().unwrap() = Some(tx),
                Behaviour::Fail => {
                    let err = markup::transform("[X] a\n[X] b", &job.context, &job.locale).unwrap_err();
                    let _ = tx.send(Err(WorkerError::Transform(err)));
                }
                Behaviour::Vanish => drop(tx),
            }
            rx
        }

        fn terminate(&mut self) {
            self.terminations.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeFactory {
        behaviour: Behaviour,
        parked: Arc<Mutex<Option<oneshot::Sender<TransformReply>>>>,
        terminations: Arc<AtomicUsize>,
    }

    impl FakeFactory {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                parked: Arc::default(),
                terminations: Arc::default(),
            })
        }
    }

    impl WorkerFactory for FakeFactory {
        fn spawn(&self) -> Result<Box<dyn TransformWorker>, WorkerError> {
            Ok(Box::new(FakeWorker {
                behaviour: self.behaviour,
                parked: self.parked.clone(),
                terminations: self.terminations.clone(),
            }))
        }
    }

    struct BrokenFactory;

    impl WorkerFactory for BrokenFactory {
        fn spawn(&self) -> Result<Box<dyn TransformWorker>, WorkerError> {
            Err(WorkerError::Spawn(std::io::Error::other("no threads")))
        }
    }

    #[tokio::test]
    async fn worker_and_fallback_paths_agree() {
        let content = "# Q1\n{$u:age}";
        let worker = TransformPipeline::new(Arc::new(ThreadWorkerFactory), DEFAULT_TRANSFORM_TIMEOUT);
        let fallback = TransformPipeline::new(FakeFactory::new(Behaviour::Fail), DEFAULT_TRANSFORM_TIMEOUT);

        let (a, path_a) = worker.run_traced(job(content)).await.unwrap();
        let (b, path_b) = fallback.run_traced(job(content)).await.unwrap();
        assert_eq!(path_a, TransformPath::Worker);
        assert_eq!(path_b, TransformPath::Fallback);
        assert_eq!(a, b);
        assert_eq!(a.content, "<h1>Q1</h1>\n<p>42</p>\n");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_falls_back_once_and_ignores_late_replies() {
        let factory = FakeFactory::new(Behaviour::Stall);
        let pipeline = TransformPipeline::new(factory.clone(), DEFAULT_TRANSFORM_TIMEOUT);

        let started = tokio::time::Instant::now();
        let (result, path) = pipeline.run_traced(job("[Q1] Hi")).await.unwrap();
        assert_eq!(path, TransformPath::Fallback);
        assert!(started.elapsed() >= DEFAULT_TRANSFORM_TIMEOUT);
        assert_eq!(factory.terminations.load(Ordering::SeqCst), 1);

        let late = factory.parked.lock().unwrap().take().unwrap();
        let bogus = TransformResult {
            content: "late".into(),
            name: "late".into(),
        };
        assert!(late.send(Ok(bogus)).is_err());
        assert_eq!(result.name, "Questionnaire");
        assert!(result.content.contains("id=\"Q1\""));
    }

    #[tokio::test]
    async fn disconnected_worker_falls_back() {
        let factory = FakeFactory::new(Behaviour::Vanish);
        let pipeline = TransformPipeline::new(factory.clone(), DEFAULT_TRANSFORM_TIMEOUT);
        let (_, path) = pipeline.run_traced(job("[Q1] Hi")).await.unwrap();
        assert_eq!(path, TransformPath::Fallback);
        assert_eq!(factory.terminations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn spawn_failure_falls_back() {
        let pipeline = TransformPipeline::new(Arc::new(BrokenFactory), DEFAULT_TRANSFORM_TIMEOUT);
        let result = pipeline.run(job("{\"name\":\"M\"}\n[Q1] Hi")).await.unwrap();
        assert_eq!(result.name, "M");
    }

    #[tokio::test]
    async fn failing_fallback_is_fatal() {
        let pipeline = TransformPipeline::new(FakeFactory::new(Behaviour::Fail), DEFAULT_TRANSFORM_TIMEOUT);
        let err = pipeline.run(job("[Q1] a\n|slider|")).await.unwrap_err();
        let TransformError::Fatal { worker, source } = err;
        assert!(matches!(worker, WorkerError::Transform(_)));
        assert!(matches!(source, markup::MarkupError::UnknownControl { .. }));
    }
}
