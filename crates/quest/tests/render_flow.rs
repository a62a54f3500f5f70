mod common;

use common::*;
use quest::{MemoryStore, PersistenceStore, RenderConfig, RenderError, TransformError};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn fresh_render_activates_the_first_question() {
    let session = render(demo_config()).await;
    let doc = session.document();

    assert_eq!(session.quest_name(), "Demo");
    assert_eq!(active(&session).as_deref(), Some("Q1"));
    assert_eq!(session.queue().len(), 1);
    assert_eq!(session.config_text(), DEMO);
    assert!(session.stylesheets().is_empty());

    let q1 = node(&session, "Q1");
    let q3 = node(&session, "Q3");
    let has_button = |q, class| {
        doc.descendants(q)
            .into_iter()
            .any(|n| doc.is_element_named(n, "button") && doc.has_class(n, class))
    };
    assert!(!has_button(q1, "previous"));
    assert!(has_button(q1, "next"));
    assert!(!has_button(q3, "next"));
    assert!(has_button(q3, "previous"));

    assert!(doc.is_hidden(node(&session, "note")));
    assert!(session.element("submitModal").is_some());
    assert!(session.element("submitModalButton").is_some());
}

#[tokio::test]
async fn confirm_attributes_are_normalized() {
    let session = render(demo_config()).await;
    let doc = session.document();
    let email = node(&session, "email");
    let email2 = node(&session, "email2");

    assert!(!doc.has_attr(email2, "confirm"));
    assert_eq!(doc.attr(email2, "data-confirm"), Some("email"));
    assert_eq!(doc.attr(email, "data-confirmation-for"), Some("email2"));
    assert_eq!(session.state().linkage.confirmation_target(email2), Some(email));
}

#[tokio::test]
async fn confirm_reference_to_a_missing_id_is_dropped() {
    let session = render(
        RenderConfig::from_text("[Q1] Mail\n|email|id=a confirm=missing|").with_today(today()),
    )
    .await;
    let a = node(&session, "a");
    assert!(!session.document().has_attr(a, "data-confirm"));
    assert!(!session.document().has_attr(a, "confirm"));
}

#[tokio::test]
async fn stored_answers_and_tree_are_restored() {
    let store = Arc::new(MemoryStore::with_entries([
        (
            "Demo".to_string(),
            json!({"Q1": "0", "Q2": ["1"], "Q2_2": "Jane", "nickname": "Jay"}),
        ),
        (
            "Demo.treeJSON".to_string(),
            json!({"path": ["Q1", "Q2"], "cursor": 1}),
        ),
    ]));
    let session = render(demo_with_store(store)).await;
    let doc = session.document();

    assert_eq!(active(&session).as_deref(), Some("Q2"));
    assert!(doc.is_checked(node(&session, "Q1_2")));
    assert!(!doc.is_checked(node(&session, "Q1_1")));
    assert!(doc.is_checked(node(&session, "Q2_1")));
    assert_eq!(doc.value(node(&session, "Q2_2")), "Jane");
    assert_eq!(doc.value(node(&session, "nickname")), "Jay");
    assert_eq!(session.answers().get("nickname"), Some(&json!("Jay")));
}

#[tokio::test]
async fn prefetched_answers_bypass_the_host_and_honor_exclusions() {
    let host = Arc::new(RecordingHost::with_prior(json!({"nickname": "FromHost"})));
    let session = render(
        demo_config()
            .with_host(host)
            .with_survey_data(json!({"nickname": "Pre", "age": "41"}))
            .with_excluded_answer_keys(["age"]),
    )
    .await;
    let doc = session.document();

    assert_eq!(doc.value(node(&session, "nickname")), "Pre");
    assert_eq!(doc.value(node(&session, "age")), "");
    assert_eq!(session.answers().get("age"), None);
}

#[tokio::test]
async fn retrieved_answers_fill_the_document() {
    let host = Arc::new(RecordingHost::with_prior(json!({"age": 33})));
    let session = render(demo_config().with_host(host)).await;
    assert_eq!(session.document().value(node(&session, "age")), "33");
}

#[tokio::test]
async fn failed_retrieve_means_no_prior_answers() {
    let host = Arc::new(RecordingHost {
        fail_retrieve: true,
        ..RecordingHost::default()
    });
    let session = render(demo_config().with_host(host)).await;
    assert!(session.answers().is_empty());
    assert_eq!(active(&session).as_deref(), Some("Q1"));
}

#[tokio::test]
async fn tree_json_may_be_text_or_an_object() {
    let text = Value::String(r#"{"path":["Q1","Q3"],"cursor":1}"#.to_string());
    let session = render(demo_config().with_tree_json(text)).await;
    assert_eq!(active(&session).as_deref(), Some("Q3"));

    let object = json!({"path": ["Q1", "Q2", "Q3"], "cursor": 1});
    let session = render(demo_config().with_tree_json(object)).await;
    assert_eq!(active(&session).as_deref(), Some("Q2"));
    assert_eq!(session.queue().len(), 3);
}

#[tokio::test]
async fn unusable_trees_start_over_at_the_first_question() {
    for tree in [
        json!({"path": ["Gone"], "cursor": 0}),
        json!({"path": ["Q1"], "cursor": 4}),
        Value::String("{not json".to_string()),
    ] {
        let session = render(demo_config().with_tree_json(tree.clone())).await;
        assert_eq!(active(&session).as_deref(), Some("Q1"), "{tree}");
        assert_eq!(session.queue().len(), 1, "{tree}");
    }
}

#[tokio::test]
async fn soccer_hook_runs_after_activation() {
    let seen = Arc::new(Mutex::new(None));
    let seen_in_hook = seen.clone();
    let session = render(
        demo_config()
            .with_delayed_parameters(vec![json!({"fn": "later"})])
            .with_soccer(Box::new(move |state: &mut quest::SessionState| {
                let active = state.active_question().and_then(|q| state.doc.element_id(q));
                *seen_in_hook.lock().unwrap() = active.map(str::to_string);
            })),
    )
    .await;
    assert_eq!(seen.lock().unwrap().as_deref(), Some("Q1"));
    assert_eq!(session.delayed_parameters(), [json!({"fn": "later"})]);
}

#[tokio::test]
async fn user_variables_are_resolved_before_transform() {
    let mut values = std::collections::BTreeMap::new();
    values.insert("firstName".to_string(), "Ada".to_string());
    let session = render(
        RenderConfig::from_text("[Q1] Hello {$u:firstName}{$u:unknown}, it is {#current_year}")
            .with_today(today())
            .with_value_resolver(Arc::new(values)),
    )
    .await;
    let heading = session.document().text_content(node(&session, "Q1"));
    assert!(heading.contains("Hello Ada, it is 2026"), "{heading}");
}

#[tokio::test]
async fn a_broken_transform_fails_the_render() {
    let result = quest::render(RenderConfig::from_text("[Q1] x\n|slider|").with_today(today())).await;
    let Err(err) = result else {
        panic!("render should fail");
    };
    assert!(matches!(err, RenderError::Transform(TransformError::Fatal { .. })), "{err}");
}

#[tokio::test]
async fn unreachable_content_fails_the_render() {
    let result = quest::render(RenderConfig::from_url("ftp://quest.test/Module.txt")).await;
    assert!(matches!(result, Err(RenderError::Fetch(_))));
}

#[tokio::test]
async fn url_content_loads_available_stylesheets_when_activated() {
    let dir = std::env::temp_dir().join(format!("questrender-css-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("Module.txt"), DEMO).unwrap();
    std::fs::write(dir.join("ActiveLogic.css"), ".question { display: none }").unwrap();
    let _ = std::fs::remove_file(dir.join("Style1.css"));
    let url = url::Url::from_file_path(dir.join("Module.txt")).unwrap();

    let session = render(
        RenderConfig::from_url(url.as_str())
            .with_today(today())
            .with_activate(true),
    )
    .await;
    assert_eq!(session.quest_name(), "Demo");
    assert_eq!(session.config_text(), DEMO);
    let sheets = session.stylesheets();
    assert_eq!(sheets.len(), 1);
    assert!(sheets[0].href.ends_with("/ActiveLogic.css"));

    let session = render(RenderConfig::from_url(url.as_str()).with_today(today())).await;
    assert!(session.stylesheets().is_empty());

    let base = url::Url::from_directory_path(&dir).unwrap();
    let session = render(
        demo_config()
            .with_base_url(base.as_str().trim_end_matches('/'))
            .with_activate(true),
    )
    .await;
    assert_eq!(session.stylesheets().len(), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn next_writes_answers_and_tree_to_the_store() {
    let store = Arc::new(MemoryStore::new());
    let mut session = render(demo_with_store(store.clone())).await;
    session.click(node(&session, "Q1_2")).await;
    session.click(button(&session, "Q1", "next")).await;

    assert_eq!(active(&session).as_deref(), Some("Q2"));
    assert_eq!(store.get("Demo").await.unwrap(), Some(json!({"Q1": "0"})));
    assert_eq!(
        store.get("Demo.treeJSON").await.unwrap(),
        Some(json!({"path": ["Q1", "Q2"], "cursor": 1}))
    );

    let again = render(demo_with_store(store)).await;
    assert_eq!(active(&again).as_deref(), Some("Q2"));
    assert!(again.document().is_checked(node(&again, "Q1_2")));
}
