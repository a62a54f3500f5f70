mod common;

use bus::{TransformJob, TransformReply, TransformWorker, WorkerFactory};
use common::{DEMO, today};
use markup::Locale;
use quest::{TransformPath, TransformPipeline, WorkerError, precompute_context};
use runtime_transform::ThreadWorkerFactory;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// A worker whose thread never comes up.
struct DeadWorker;

impl TransformWorker for DeadWorker {
    fn post(&mut self, _job: TransformJob) -> oneshot::Receiver<TransformReply> {
        oneshot::channel().1
    }

    fn terminate(&mut self) {}
}

struct DeadFactory;

impl WorkerFactory for DeadFactory {
    fn spawn(&self) -> Result<Box<dyn TransformWorker>, WorkerError> {
        Ok(Box::new(DeadWorker))
    }
}

fn job(content: &str, locale: Locale) -> TransformJob {
    let mut values = BTreeMap::new();
    values.insert("age".to_string(), "42".to_string());
    let context = precompute_context(content, &locale, today(), Some(&values as &dyn quest::ValueResolver));
    TransformJob {
        request_id: 1,
        content: content.to_string(),
        context,
        locale,
    }
}

#[tokio::test]
async fn worker_and_inline_paths_produce_the_same_result() {
    let worker = TransformPipeline::new(Arc::new(ThreadWorkerFactory), Duration::from_secs(10));
    let inline = TransformPipeline::new(Arc::new(DeadFactory), Duration::from_secs(10));

    for content in [
        "# Q1\n{$u:age}",
        DEMO,
        "Intro *emphasis*\n[Q1] Age?\n|number|id=age|\n[Q2] Born in {#current_year}?",
    ] {
        for locale in [Locale::english(), Locale::spanish()] {
            let (a, path_a) = worker.run_traced(job(content, locale.clone())).await.unwrap();
            let (b, path_b) = inline.run_traced(job(content, locale)).await.unwrap();
            assert_eq!(path_a, TransformPath::Worker);
            assert_eq!(path_b, TransformPath::Fallback);
            assert_eq!(a, b, "{content}");
        }
    }
}

#[tokio::test]
async fn user_variable_example_renders_the_resolved_value() {
    let worker = TransformPipeline::new(Arc::new(ThreadWorkerFactory), Duration::from_secs(10));
    let result = worker.run(job("# Q1\n{$u:age}", Locale::english())).await.unwrap();
    assert_eq!(result.content, "<h1>Q1</h1>\n<p>42</p>\n");
    assert_eq!(result.name, "Questionnaire");
}

#[tokio::test]
async fn render_through_a_dead_worker_matches_the_threaded_render() {
    let threaded = quest::render(common::demo_config()).await.unwrap();
    let fallback = quest::render(
        common::demo_config()
            .with_root_id("survey")
            .with_worker_factory(Arc::new(DeadFactory))
            .with_transform_timeout(Duration::from_millis(50)),
    )
    .await
    .unwrap();

    let doc = fallback.document();
    assert_eq!(doc.element_id(doc.root()), Some("survey"));
    assert_eq!(fallback.quest_name(), threaded.quest_name());
    assert_eq!(fallback.html(), threaded.html());
}
