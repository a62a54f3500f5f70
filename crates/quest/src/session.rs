//! A live questionnaire plus the user-agent side that drives it.
//!
//! The `click`/`type_text`/`press_key`/`blur` helpers perform the platform
//! default action and dispatch events in the order a browser would, so the
//! engine can be exercised headlessly.

use crate::answers::Answers;
use crate::controller::NavigationController;
use crate::nav_queue::NavigationQueue;
use crate::router::{EventRouter, RouteOutcome, SubmitIntent};
use crate::state::SessionState;
use core_types::QuestionId;
use dom::{ControlKind, Document, DomEvent, EventType, NodeId};
use serde_json::Value;

/// A stylesheet fetched alongside URL content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stylesheet {
    pub href: String,
    pub text: String,
}

pub struct Session {
    state: SessionState,
    router: EventRouter,
    controller: NavigationController,
    config_text: String,
    stylesheets: Vec<Stylesheet>,
    delayed_parameter_array: Vec<Value>,
    submitted: bool,
}

impl Session {
    pub(crate) fn new(
        state: SessionState,
        router: EventRouter,
        controller: NavigationController,
        config_text: String,
        stylesheets: Vec<Stylesheet>,
        delayed_parameter_array: Vec<Value>,
    ) -> Self {
        Self {
            state,
            router,
            controller,
            config_text,
            stylesheets,
            delayed_parameter_array,
            submitted: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn document(&self) -> &Document {
        &self.state.doc
    }

    pub fn quest_name(&self) -> &str {
        &self.state.quest_name
    }

    pub fn queue(&self) -> &NavigationQueue {
        &self.state.queue
    }

    pub fn answers(&self) -> &Answers {
        &self.state.answers
    }

    /// Raw questionnaire markup the session was rendered from.
    pub fn config_text(&self) -> &str {
        &self.config_text
    }

    pub fn stylesheets(&self) -> &[Stylesheet] {
        &self.stylesheets
    }

    pub fn delayed_parameters(&self) -> &[Value] {
        &self.delayed_parameter_array
    }

    /// Whether the questionnaire was confirmed and submitted.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn active_question_id(&self) -> Option<QuestionId> {
        let doc = &self.state.doc;
        self.state
            .active_question()
            .and_then(|q| doc.element_id(q))
            .map(QuestionId::from)
    }

    pub fn element(&self, id: &str) -> Option<NodeId> {
        self.state.doc.get_element_by_id(id)
    }

    /// Rendered markup of the root container, control state included.
    pub fn html(&self) -> String {
        let doc = &self.state.doc;
        doc.inner_html(doc.root())
    }

    /// Route one event and carry out any navigation it asks for.
    pub async fn dispatch(&mut self, event: DomEvent) -> RouteOutcome {
        let outcome = self.router.route(&mut self.state, &event);
        match &outcome.intent {
            Some(SubmitIntent::Navigate { form, click_type }) => {
                self.controller
                    .handle(&mut self.state, *form, click_type.as_deref())
                    .await;
            }
            Some(SubmitIntent::ConfirmSubmit) => {
                self.controller.submit_questionnaire(&mut self.state).await;
                self.submitted = true;
            }
            None => {}
        }
        outcome
    }

    // -- User agent ---

    /// Click `node`: focus moves, a toggle flips before `click` fires, `change`
    /// follows if its state changed, and a submit button submits its form.
    pub async fn click(&mut self, node: NodeId) -> RouteOutcome {
        self.move_focus(node).await;
        let changed = self.state.doc.control_kind(node).is_toggle() && self.state.doc.activate_toggle(node);
        let outcome = self.dispatch(DomEvent::click(node)).await;
        if changed {
            self.dispatch(DomEvent::new(EventType::Change, node)).await;
        }
        if !outcome.prevent_default && self.is_submit_button(node) {
            self.submit(node).await;
        }
        outcome
    }

    /// Fire `submit` on the form owning `button`, with `button` as submitter.
    pub async fn submit(&mut self, button: NodeId) -> Option<RouteOutcome> {
        let Some(form) = self.state.doc.closest_tag(button, "form") else {
            log::debug!(target: "quest.router", "{:?} is not inside a form", self.state.doc.element_id(button));
            return None;
        };
        Some(self.dispatch(DomEvent::submit(form, Some(button))).await)
    }

    /// Press and release one key on `node`. Returns the keydown outcome.
    pub async fn press_key(&mut self, node: NodeId, key: &str) -> RouteOutcome {
        self.move_focus(node).await;
        let down = self.dispatch(DomEvent::key(EventType::Keydown, node, key)).await;
        if !down.prevent_default {
            self.key_default_action(node, key).await;
        }
        self.dispatch(DomEvent::key(EventType::Keyup, node, key)).await;
        down
    }

    /// Type `text` one character at a time; `\n` is an Enter press.
    pub async fn type_text(&mut self, node: NodeId, text: &str) {
        for ch in text.chars() {
            let key = if ch == '\n' { "Enter".to_string() } else { ch.to_string() };
            self.press_key(node, &key).await;
        }
    }

    /// Select-all and delete.
    pub async fn clear_text(&mut self, node: NodeId) {
        self.move_focus(node).await;
        let down = self
            .dispatch(DomEvent::key(EventType::Keydown, node, "Backspace"))
            .await;
        if !down.prevent_default && self.state.doc.set_value(node, "") {
            self.dispatch(DomEvent::new(EventType::Input, node)).await;
        }
        self.dispatch(DomEvent::key(EventType::Keyup, node, "Backspace"))
            .await;
    }

    /// Pick `value` in a select.
    pub async fn select_option(&mut self, node: NodeId, value: &str) {
        self.move_focus(node).await;
        if self.state.doc.set_value(node, value) {
            self.dispatch(DomEvent::new(EventType::Input, node)).await;
            self.dispatch(DomEvent::new(EventType::Change, node)).await;
        }
    }

    /// Take focus away from whatever has it.
    pub async fn blur(&mut self) {
        if let Some(node) = self.state.doc.active_element() {
            self.state.doc.blur();
            if self.state.doc.is_connected(node) {
                self.dispatch(DomEvent::new(EventType::Blur, node)).await;
            }
        }
    }

    pub async fn click_id(&mut self, id: &str) -> Option<RouteOutcome> {
        let node = self.element(id)?;
        Some(self.click(node).await)
    }

    pub async fn type_into(&mut self, id: &str, text: &str) -> Option<()> {
        let node = self.element(id)?;
        self.type_text(node, text).await;
        Some(())
    }

    async fn move_focus(&mut self, node: NodeId) {
        if self.state.doc.active_element() == Some(node) {
            return;
        }
        self.blur().await;
        if is_focusable(&self.state.doc, node) {
            self.state.doc.focus(node);
        }
    }

    async fn key_default_action(&mut self, node: NodeId, key: &str) {
        let kind = self.state.doc.control_kind(node);
        if !kind.is_text_entry() {
            return;
        }
        let changed = match key {
            "Enter" if kind == ControlKind::Textarea => self.state.doc.insert_text(node, "\n"),
            "Enter" => {
                self.implicit_submit(node).await;
                return;
            }
            "Backspace" => self.state.doc.backspace(node),
            k if k.chars().count() == 1 => self.state.doc.insert_text(node, k),
            _ => return,
        };
        if changed {
            self.dispatch(DomEvent::new(EventType::Input, node)).await;
        }
    }

    /// Enter in a single-line field submits its form through the first submit button.
    async fn implicit_submit(&mut self, node: NodeId) {
        let doc = &self.state.doc;
        let Some(form) = doc.closest_tag(node, "form") else {
            return;
        };
        let submitter = doc
            .descendants(form)
            .into_iter()
            .find(|&n| self.is_submit_button(n));
        self.dispatch(DomEvent::submit(form, submitter)).await;
    }

    fn is_submit_button(&self, node: NodeId) -> bool {
        let doc = &self.state.doc;
        let ty = doc.attr(node, "type");
        if doc.is_element_named(node, "button") {
            ty.is_none_or(|t| t.eq_ignore_ascii_case("submit"))
        } else {
            doc.is_element_named(node, "input") && ty.is_some_and(|t| t.eq_ignore_ascii_case("submit"))
        }
    }
}

fn is_focusable(doc: &Document, node: NodeId) -> bool {
    ["input", "select", "textarea", "button"]
        .iter()
        .any(|tag| doc.is_element_named(node, tag))
}
