//! Button intents of a submitted question container.

use crate::answers::Answers;
use crate::host::HostCallbacks;
use crate::linkage::question_of;
use crate::persist::{PersistenceStore, answers_key, tree_key};
use crate::router::clear_validation_error;
use crate::state::SessionState;
use core_types::{ButtonIntent, QuestionId};
use dom::{ControlKind, NodeId};
use serde_json::{Map, Value};
use std::sync::Arc;

pub const SUBMIT_MODAL: &str = "submitModal";
pub const MODAL_SHOWN_CLASS: &str = "show";
pub const COMPLETED_KEY: &str = "COMPLETED";
pub const COMPLETED_TS_KEY: &str = "COMPLETED_TS";

pub struct NavigationController {
    store: Arc<dyn PersistenceStore>,
    host: Option<Arc<dyn HostCallbacks>>,
}

impl NavigationController {
    pub fn new(store: Arc<dyn PersistenceStore>, host: Option<Arc<dyn HostCallbacks>>) -> Self {
        Self { store, host }
    }

    /// Act on the button that submitted `form`. Returns the recognized intent;
    /// unknown click types are logged and change nothing.
    pub async fn handle(
        &self,
        state: &mut SessionState,
        form: NodeId,
        click_type: Option<&str>,
    ) -> Option<ButtonIntent> {
        let Some(intent) = click_type.and_then(ButtonIntent::parse) else {
            log::error!(
                target: "quest.nav",
                "unknown button clicked: {:?} in {:?}",
                click_type,
                state.doc.element_id(form)
            );
            return None;
        };
        log::debug!(target: "quest.nav", "{} in {:?}", intent.as_str(), state.doc.element_id(form));

        match intent {
            ButtonIntent::Previous => self.previous(state, form).await,
            ButtonIntent::Reset => self.reset(state, form).await,
            ButtonIntent::Next => self.next(state, form).await,
            ButtonIntent::SubmitSurvey => {
                state.answers.record_within(&state.doc, form);
                show_modal(state, SUBMIT_MODAL);
            }
        }
        Some(intent)
    }

    async fn previous(&self, state: &mut SessionState, form: NodeId) {
        let removed = clear_question(state, form);
        state.queue.previous();
        self.persist(state, removed_update(&removed)).await;
        state.activate();
    }

    async fn reset(&self, state: &mut SessionState, form: NodeId) {
        let removed = clear_question(state, form);
        self.persist(state, removed_update(&removed)).await;
    }

    async fn next(&self, state: &mut SessionState, form: NodeId) {
        let keys = state.answers.record_within(&state.doc, form);
        let mut update = Map::new();
        for key in keys {
            let value = state.answers.get(&key).cloned().unwrap_or(Value::Null);
            update.insert(key, value);
        }

        match next_target(state, form) {
            Some(target) if state.queue.current_node() == Some(&target) => {
                log::debug!(target: "quest.nav", "{target} skips to itself; staying put");
            }
            Some(target) => {
                if state.queue.peek_next() == Some(&target) {
                    state.queue.next();
                } else {
                    state.queue.truncate_forward();
                    state.queue.add(target);
                }
            }
            None => log::debug!(target: "quest.nav", "no question after {:?}", state.doc.element_id(form)),
        }

        self.persist(state, update).await;
        state.activate();
    }

    /// Store the completion marker and hand the final answers to the host.
    pub async fn submit_questionnaire(&self, state: &mut SessionState) {
        for id in ["lastBackButton", "submitButton"] {
            if let Some(node) = state.doc.get_element_by_id(id) {
                state.doc.remove(node);
            }
        }
        if let Some(modal) = state.doc.get_element_by_id(SUBMIT_MODAL) {
            state.doc.remove_class(modal, MODAL_SHOWN_CLASS);
        }
        state.answers.insert(COMPLETED_KEY, Value::Bool(true));
        state.answers.insert(
            COMPLETED_TS_KEY,
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        let update = state.answers.as_map().clone();
        self.persist(state, update).await;
        log::info!(target: "quest.nav", "{}: questionnaire submitted", state.quest_name);
    }

    /// Write answers and tree to the store and forward `update` to the host.
    /// Failures are logged; the session keeps going.
    pub async fn persist(&self, state: &SessionState, update: Map<String, Value>) {
        let quest = &state.quest_name;
        if let Err(err) = self.store.set(&answers_key(quest), state.answers.to_value()).await {
            log::warn!(target: "quest.persist", "{quest}: saving answers failed: {err}");
        }
        if let Err(err) = self.store.set(&tree_key(quest), state.queue.to_value()).await {
            log::warn!(target: "quest.persist", "{quest}: saving tree failed: {err}");
        }
        if let Some(host) = &self.host
            && !update.is_empty()
            && let Err(err) = host.store(update).await
        {
            log::warn!(target: "quest.persist", "{quest}: host store failed: {err}");
        }
    }
}

/// Uncheck the choices and empty the text, number, date, month and time
/// fields of `form`, clear validation markers, and drop the answers of what
/// was cleared along with cached linked text. Email, tel, textarea and select
/// values are left alone. Returns the removed answer keys.
pub fn clear_question(state: &mut SessionState, form: NodeId) -> Vec<String> {
    let mut removed = Vec::new();
    for node in state.doc.descendants(form) {
        let kind = state.doc.control_kind(node);
        let cleared = match kind {
            k if k.is_toggle() => {
                state.doc.set_checked(node, false);
                true
            }
            ControlKind::Text | ControlKind::Number | ControlKind::Date | ControlKind::Month | ControlKind::Time => {
                state.doc.set_value(node, "");
                true
            }
            k if k.is_text_entry() || k == ControlKind::Select => false,
            _ => continue,
        };
        clear_validation_error(&mut state.doc, node);
        if cleared
            && let Some(key) = Answers::key_for(&state.doc, node)
            && state.answers.remove(&key).is_some()
        {
            removed.push(key);
        }
    }
    state.linkage.forget_within(&state.doc, form);
    removed
}

fn removed_update(keys: &[String]) -> Map<String, Value> {
    keys.iter().map(|k| (k.clone(), Value::Null)).collect()
}

/// Where `next` goes from `form`: the skip target of the first checked control
/// carrying `data-skip-to`, else the following question in document order.
pub fn next_target(state: &SessionState, form: NodeId) -> Option<QuestionId> {
    let doc = &state.doc;
    let skip = doc
        .descendants(form)
        .into_iter()
        .filter(|&n| doc.control_kind(n).is_toggle() && doc.is_checked(n))
        .find_map(|n| doc.attr(n, "data-skip-to"))
        .map(str::trim)
        .filter(|id| !id.is_empty());
    if let Some(id) = skip {
        let target = QuestionId::from(id);
        if state.question(&target).is_some() {
            return Some(target);
        }
        log::warn!(target: "quest.nav", "skip target {id} does not exist; continuing in order");
    }

    let form = question_of(doc, form).unwrap_or(form);
    let questions = state.questions();
    let pos = questions.iter().position(|&q| q == form)?;
    questions
        .get(pos + 1)
        .and_then(|&q| doc.element_id(q))
        .map(QuestionId::from)
}

fn show_modal(state: &mut SessionState, id: &str) {
    match state.doc.get_element_by_id(id) {
        Some(modal) => state.doc.add_class(modal, MODAL_SHOWN_CLASS),
        None => log::warn!(target: "quest.nav", "modal {id} is missing"),
    }
}
