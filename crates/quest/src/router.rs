//! Delegated event routing.
//!
//! Every event reaching the root container is classified once into a closed
//! set of [`Action`]s, then each action is dispatched in order. Classification
//! is a pure function of the document and the event.

use crate::host::{FieldHooks, FieldSnapshot};
use crate::linkage::question_of;
use crate::state::SessionState;
use dom::{ControlKind, Document, DomEvent, EventType, NodeId};
use std::sync::Arc;

pub const SUBMIT_MODAL_BUTTON: &str = "submitModalButton";
pub const INVALID_CLASS: &str = "invalid";
const BLUR_STYLE: &str = "size: 20 !important";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// click on a radio/checkbox
    ToggleClicked,
    /// change on a number input that does not have focus
    RefocusNumber,
    /// change on a radio/checkbox
    ToggleChanged,
    /// keydown Enter on an input
    SuppressEnter,
    /// keydown on an `[xor]` member
    EnforceXor,
    /// keyup on `.SSN`
    FormatSsn,
    /// keyup on `input[type=tel]`
    FormatPhone,
    /// keyup/input on a text field inside a label
    LinkedTextTyped,
    /// blur on a text-like control or select
    BlurValidate,
    /// submit of a question container
    InterceptSubmit,
    /// click on the submit-confirmation modal button
    ConfirmSubmit,
}

/// Work the router cannot finish synchronously.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitIntent {
    /// A question container was submitted by a button carrying `click_type`.
    Navigate {
        form: NodeId,
        click_type: Option<String>,
    },
    /// The user confirmed submission of the whole questionnaire.
    ConfirmSubmit,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteOutcome {
    pub prevent_default: bool,
    pub intent: Option<SubmitIntent>,
}

fn is_text_like(kind: ControlKind) -> bool {
    kind.is_text_entry() || kind == ControlKind::Select
}

fn in_label(doc: &Document, node: NodeId) -> bool {
    doc.closest_tag(node, "label").is_some()
}

/// Classify `event` against the fixed dispatch table. All matching actions apply.
pub fn classify(doc: &Document, event: &DomEvent) -> Vec<Action> {
    let target = event.target;
    let kind = doc.control_kind(target);
    let mut actions = Vec::new();

    match event.event_type {
        EventType::Click => {
            if kind.is_toggle() {
                actions.push(Action::ToggleClicked);
            }
            if doc.element_id(target) == Some(SUBMIT_MODAL_BUTTON) {
                actions.push(Action::ConfirmSubmit);
            }
        }
        EventType::Change => {
            if kind == ControlKind::Number && doc.active_element() != Some(target) {
                actions.push(Action::RefocusNumber);
            }
            if kind.is_toggle() {
                actions.push(Action::ToggleChanged);
            }
        }
        EventType::Keydown => {
            if doc.is_element_named(target, "input") && event.key_is("Enter") {
                actions.push(Action::SuppressEnter);
            }
            if doc.has_attr(target, "xor") {
                actions.push(Action::EnforceXor);
            }
        }
        EventType::Keyup => {
            if doc.has_class(target, "SSN") {
                actions.push(Action::FormatSsn);
            }
            if kind == ControlKind::Tel {
                actions.push(Action::FormatPhone);
            }
            if matches!(kind, ControlKind::Text | ControlKind::Textarea) && in_label(doc, target) {
                actions.push(Action::LinkedTextTyped);
            }
        }
        EventType::Input => {
            if matches!(kind, ControlKind::Text | ControlKind::Textarea) && in_label(doc, target) {
                actions.push(Action::LinkedTextTyped);
            }
        }
        EventType::Blur => {
            if is_text_like(kind) {
                actions.push(Action::BlurValidate);
            }
        }
        EventType::Submit => {
            if question_of(doc, target).is_some() {
                actions.push(Action::InterceptSubmit);
            }
        }
    }
    actions
}

pub struct EventRouter {
    hooks: Arc<dyn FieldHooks>,
}

impl EventRouter {
    pub fn new(hooks: Arc<dyn FieldHooks>) -> Self {
        Self { hooks }
    }

    /// Classify and dispatch one event. Never suspends.
    pub fn route(&self, state: &mut SessionState, event: &DomEvent) -> RouteOutcome {
        let actions = classify(&state.doc, event);
        log::trace!(
            target: "quest.router",
            "{} on {:?}: {actions:?}",
            event.event_type.as_str(),
            state.doc.element_id(event.target)
        );
        let mut outcome = RouteOutcome::default();
        for action in actions {
            self.dispatch(state, event, action, &mut outcome);
        }
        outcome
    }

    fn dispatch(&self, state: &mut SessionState, event: &DomEvent, action: Action, outcome: &mut RouteOutcome) {
        let target = event.target;
        match action {
            Action::ToggleClicked => {
                state.answers.record_control(&state.doc, target);
                state
                    .linkage
                    .on_toggle_click(&mut state.doc, &mut state.answers, target);
            }
            Action::RefocusNumber => state.doc.focus(target),
            Action::ToggleChanged => {
                state.answers.record_control(&state.doc, target);
            }
            Action::SuppressEnter => outcome.prevent_default = true,
            Action::EnforceXor => {
                state
                    .linkage
                    .enforce_xor(&mut state.doc, &mut state.answers, target);
            }
            Action::FormatSsn => {
                if let Some(formatted) = self.hooks.format_ssn(state.doc.value(target)) {
                    state.doc.set_value(target, formatted);
                }
            }
            Action::FormatPhone => {
                if let Some(formatted) = self.hooks.format_phone(state.doc.value(target)) {
                    state.doc.set_value(target, formatted);
                }
            }
            Action::LinkedTextTyped => {
                state
                    .linkage
                    .on_typed(&mut state.doc, &mut state.answers, target);
            }
            Action::BlurValidate => {
                state.answers.record_control(&state.doc, target);
                self.validate(state, target);
                state.doc.set_attr(target, "style", BLUR_STYLE);
            }
            Action::InterceptSubmit => {
                outcome.prevent_default = true;
                let form = question_of(&state.doc, target).unwrap_or(target);
                let click_type = event
                    .submitter
                    .and_then(|s| state.doc.attr(s, "data-click-type"))
                    .map(str::to_string);
                outcome.intent = Some(SubmitIntent::Navigate { form, click_type });
            }
            Action::ConfirmSubmit => outcome.intent = Some(SubmitIntent::ConfirmSubmit),
        }
    }

    fn validate(&self, state: &mut SessionState, target: NodeId) {
        let doc = &state.doc;
        let confirms = state
            .linkage
            .confirmation_target(target)
            .map(|other| doc.value(other));
        let field = FieldSnapshot {
            id: doc.element_id(target),
            kind: doc.control_kind(target),
            value: doc.value(target),
            confirms,
        };
        match self.hooks.validate(&field) {
            Ok(()) => clear_validation_error(&mut state.doc, target),
            Err(message) => {
                log::debug!(
                    target: "quest.router",
                    "{:?} failed validation: {message}",
                    state.doc.element_id(target)
                );
                state.doc.add_class(target, INVALID_CLASS);
                state.doc.set_attr(target, "aria-invalid", "true");
                state.doc.set_attr(target, "data-error", message);
            }
        }
    }
}

pub fn clear_validation_error(doc: &mut Document, node: NodeId) {
    doc.remove_class(node, INVALID_CLASS);
    doc.remove_attr(node, "aria-invalid");
    doc.remove_attr(node, "data-error");
}
