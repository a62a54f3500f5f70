#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use quest::{HostCallbacks, HostError, MemoryStore, NodeId, RenderConfig, Session};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

pub const DEMO: &str = r#"{"name": "Demo"}
Please answer a few questions.
[Q1] Do you smoke?
(1) -> Q3 Yes
(0) No
[Q2] Anything else?
[1] Other: |__|
|__|id=nickname|
|number|id=age|
[Q3] How can we reach you?
|email|id=email|
|email|id=email2 confirm=email|
|__|id=note data-hidden|"#;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

pub fn demo_config() -> RenderConfig {
    RenderConfig::from_text(DEMO).with_today(today())
}

pub fn demo_with_store(store: Arc<MemoryStore>) -> RenderConfig {
    demo_config().with_store(store)
}

pub async fn render(config: RenderConfig) -> Session {
    quest::render(config).await.expect("render")
}

pub fn node(session: &Session, id: &str) -> NodeId {
    session
        .element(id)
        .unwrap_or_else(|| panic!("no element #{id}"))
}

/// The button of `question` with class `class`.
pub fn button(session: &Session, question: &str, class: &str) -> NodeId {
    let doc = session.document();
    let q = node(session, question);
    doc.descendants(q)
        .into_iter()
        .find(|&n| doc.is_element_named(n, "button") && doc.has_class(n, class))
        .unwrap_or_else(|| panic!("no .{class} button in {question}"))
}

pub fn active(session: &Session) -> Option<String> {
    session.active_question_id().map(|q| q.to_string())
}

/// Records every `store` update; `retrieve` answers with `prior`.
#[derive(Default)]
pub struct RecordingHost {
    pub prior: Option<Value>,
    pub fail_retrieve: bool,
    pub updates: Mutex<Vec<Map<String, Value>>>,
}

impl RecordingHost {
    pub fn with_prior(prior: Value) -> Self {
        Self {
            prior: Some(prior),
            ..Self::default()
        }
    }

    pub fn updates(&self) -> Vec<Map<String, Value>> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostCallbacks for RecordingHost {
    async fn retrieve(&self) -> Result<Option<Value>, HostError> {
        if self.fail_retrieve {
            return Err(HostError::Retrieve("offline".to_string()));
        }
        Ok(self.prior.clone())
    }

    async fn store(&self, update: Map<String, Value>) -> Result<(), HostError> {
        self.updates.lock().unwrap().push(update);
        Ok(())
    }
}
