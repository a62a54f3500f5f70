//! Derived relations between controls that the markup only implies.
//!
//! A radio/checkbox and a free-text control inside the same `<label>` are
//! linked: typing selects the choice, deselecting clears the text and
//! reselecting brings it back. The text to bring back lives in a side table
//! keyed by the text control. Confirmation pairs (`data-confirm`) and XOR
//! groups are resolved here too.

use crate::answers::Answers;
use dom::{ControlKind, Document, NodeId};
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct FieldLinkageEngine {
    last_values: HashMap<NodeId, String>,
    // confirming control -> control it must repeat
    confirm_targets: HashMap<NodeId, NodeId>,
}

impl FieldLinkageEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_value(&self, text: NodeId) -> Option<&str> {
        self.last_values.get(&text).map(String::as_str)
    }

    /// Forget cached text for every control inside `container`.
    pub fn forget_within(&mut self, doc: &Document, container: NodeId) {
        for node in doc.descendants(container) {
            self.last_values.remove(&node);
        }
    }

    /// The radio/checkbox a free-text control belongs to: the label's `for`
    /// target if that is a toggle, else the first toggle inside the label.
    pub fn pair_of(doc: &Document, text: NodeId) -> Option<NodeId> {
        let label = doc.closest_tag(text, "label")?;
        if let Some(target) = doc.attr(label, "for").and_then(|id| doc.get_element_by_id(id))
            && doc.control_kind(target).is_toggle()
        {
            return Some(target);
        }
        doc.find_descendant(label, |d, n| d.control_kind(n).is_toggle())
    }

    /// The free-text control sharing a label with `toggle`.
    pub fn dependent_of(doc: &Document, toggle: NodeId) -> Option<NodeId> {
        let label = doc.closest_tag(toggle, "label")?;
        doc.find_descendant(label, |d, n| d.control_kind(n).is_text_entry())
    }

    /// A radio/checkbox was clicked (its checked state already updated).
    ///
    /// Unchecked: cache the dependent text and clear it. Checked with a cached
    /// value: restore it. Either way the text answer is re-recorded. Radios the
    /// click deselected in the same group get their linked text cached and
    /// cleared too.
    pub fn on_toggle_click(
        &mut self,
        doc: &mut Document,
        answers: &mut Answers,
        toggle: NodeId,
    ) -> Option<NodeId> {
        if doc.control_kind(toggle) == ControlKind::Radio {
            for member in doc.radio_group(toggle) {
                if member != toggle && !doc.is_checked(member) {
                    self.stash_linked_text(doc, answers, member);
                }
            }
        }

        let text = Self::dependent_of(doc, toggle)?;
        if !doc.is_checked(toggle) {
            self.last_values.insert(text, doc.value(text).to_string());
            doc.set_value(text, "");
        } else if let Some(last) = self.last_values.get(&text) {
            doc.set_value(text, last.clone());
        }
        log::trace!(
            target: "quest.link",
            "click on {:?} synced text {:?} to {:?}",
            doc.element_id(toggle),
            doc.element_id(text),
            doc.value(text)
        );
        answers.record_control(doc, text);
        Some(text)
    }

    // An empty field keeps whatever was cached before.
    fn stash_linked_text(&mut self, doc: &mut Document, answers: &mut Answers, radio: NodeId) {
        let Some(text) = Self::dependent_of(doc, radio) else {
            return;
        };
        if doc.value(text).is_empty() {
            return;
        }
        self.last_values.insert(text, doc.value(text).to_string());
        doc.set_value(text, "");
        log::trace!(
            target: "quest.link",
            "{:?} deselected; cleared {:?}",
            doc.element_id(radio),
            doc.element_id(text)
        );
        answers.record_control(doc, text);
    }

    /// The user typed into a free-text control.
    ///
    /// Non-empty text checks the paired toggle; empty text never unchecks it.
    /// Re-running with the same value changes nothing.
    pub fn on_typed(
        &mut self,
        doc: &mut Document,
        answers: &mut Answers,
        text: NodeId,
    ) -> Option<NodeId> {
        if !matches!(doc.control_kind(text), ControlKind::Text | ControlKind::Textarea) {
            return None;
        }
        let toggle = Self::pair_of(doc, text)?;
        if !doc.value(text).is_empty() {
            doc.set_checked(toggle, true);
        }
        answers.record_control(doc, toggle);
        self.last_values.insert(text, doc.value(text).to_string());
        answers.record_control(doc, text);
        Some(toggle)
    }

    /// Typing into an XOR member empties the other members of its group
    /// within the same question.
    pub fn enforce_xor(&self, doc: &mut Document, answers: &mut Answers, target: NodeId) -> Vec<NodeId> {
        let Some(group) = doc.attr(target, "xor").map(str::to_string) else {
            return Vec::new();
        };
        let scope = question_of(doc, target).unwrap_or(doc.root());
        let others: Vec<NodeId> = doc
            .descendants(scope)
            .into_iter()
            .filter(|&n| n != target && doc.attr(n, "xor") == Some(group.as_str()))
            .collect();
        for &other in &others {
            let kind = doc.control_kind(other);
            if kind.is_toggle() {
                doc.set_checked(other, false);
            } else if kind.is_text_entry() || kind == ControlKind::Select {
                doc.set_value(other, "");
            }
            answers.record_control(doc, other);
        }
        if !others.is_empty() {
            log::debug!(target: "quest.link", "xor group {group}: cleared {} field(s)", others.len());
        }
        others
    }

    /// Normalize `confirm` to `data-confirm`, drop references to missing ids and
    /// mark each confirmed control with `data-confirmation-for`.
    pub fn normalize_confirmations(&mut self, doc: &mut Document) {
        for node in doc.elements_with_attr("confirm") {
            if let Some(target) = doc.remove_attr(node, "confirm") {
                doc.set_attr(node, "data-confirm", target);
            }
        }
        for node in doc.elements_with_attr("data-confirm") {
            let reference = doc.attr(node, "data-confirm").unwrap_or("").to_string();
            let Some(target) = doc.get_element_by_id(&reference) else {
                log::warn!(
                    target: "quest.link",
                    "cannot confirm {:?}: no element with id {reference:?}",
                    doc.element_id(node)
                );
                doc.remove_attr(node, "data-confirm");
                continue;
            };
            if let Some(id) = doc.element_id(node).map(str::to_string) {
                doc.set_attr(target, "data-confirmation-for", id);
            }
            self.confirm_targets.insert(node, target);
        }
    }

    /// The control `node` must repeat, if it is a confirmation field.
    pub fn confirmation_target(&self, node: NodeId) -> Option<NodeId> {
        self.confirm_targets.get(&node).copied()
    }
}

/// Nearest enclosing question container.
pub fn question_of(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.closest(node, |d, n| d.has_class(n, "question"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINKED: &str = r#"<form class="question" id="Q1">
<label for="Q1_1"><input type="radio" name="Q1" id="Q1_1" value="1"> Other: <input type="text" id="Q1_t"></label>
<label><input type="radio" name="Q1" id="Q1_2" value="2"> None</label>
<label><input type="checkbox" name="Q1c" id="Q1_3" value="c"> Notes <textarea id="Q1_n"></textarea></label>
</form>"#;

    fn node(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).unwrap()
    }

    #[test]
    fn pairing_prefers_label_target_then_searches_label() {
        let doc = Document::from_html("root", LINKED);
        assert_eq!(FieldLinkageEngine::pair_of(&doc, node(&doc, "Q1_t")), Some(node(&doc, "Q1_1")));
        assert_eq!(FieldLinkageEngine::pair_of(&doc, node(&doc, "Q1_n")), Some(node(&doc, "Q1_3")));
        assert_eq!(FieldLinkageEngine::dependent_of(&doc, node(&doc, "Q1_2")), None);
    }

    #[test]
    fn typing_checks_the_pair_and_emptying_does_not_uncheck() {
        let mut doc = Document::from_html("root", LINKED);
        let mut answers = Answers::new();
        let mut engine = FieldLinkageEngine::new();
        let text = node(&doc, "Q1_t");
        let radio = node(&doc, "Q1_1");

        doc.set_value(text, "J");
        engine.on_typed(&mut doc, &mut answers, text);
        assert!(doc.is_checked(radio));
        assert_eq!(answers.get("Q1"), Some(&serde_json::json!("1")));

        engine.on_typed(&mut doc, &mut answers, text);
        assert!(doc.is_checked(radio));

        doc.set_value(text, "");
        engine.on_typed(&mut doc, &mut answers, text);
        assert!(doc.is_checked(radio));
        assert_eq!(engine.last_value(text), Some(""));
    }

    #[test]
    fn unchecking_caches_and_rechecking_restores() {
        let mut doc = Document::from_html("root", LINKED);
        let mut answers = Answers::new();
        let mut engine = FieldLinkageEngine::new();
        let notes = node(&doc, "Q1_n");
        let cb = node(&doc, "Q1_3");

        doc.set_value(notes, "Jane");
        engine.on_typed(&mut doc, &mut answers, notes);
        assert!(doc.is_checked(cb));

        doc.activate_toggle(cb);
        engine.on_toggle_click(&mut doc, &mut answers, cb);
        assert_eq!(doc.value(notes), "");
        assert_eq!(answers.get("Q1_n"), None);

        doc.activate_toggle(cb);
        engine.on_toggle_click(&mut doc, &mut answers, cb);
        assert_eq!(doc.value(notes), "Jane");
        assert_eq!(answers.get("Q1_n"), Some(&serde_json::json!("Jane")));
    }

    #[test]
    fn picking_a_sibling_radio_stashes_the_linked_text() {
        let mut doc = Document::from_html("root", LINKED);
        let mut answers = Answers::new();
        let mut engine = FieldLinkageEngine::new();
        let text = node(&doc, "Q1_t");
        let other = node(&doc, "Q1_1");
        let none = node(&doc, "Q1_2");

        doc.set_value(text, "Jane");
        engine.on_typed(&mut doc, &mut answers, text);
        assert!(doc.is_checked(other));

        doc.activate_toggle(none);
        engine.on_toggle_click(&mut doc, &mut answers, none);
        assert_eq!(doc.value(text), "");
        assert_eq!(engine.last_value(text), Some("Jane"));
        assert_eq!(answers.get("Q1_t"), None);

        doc.activate_toggle(none);
        engine.on_toggle_click(&mut doc, &mut answers, none);
        assert_eq!(engine.last_value(text), Some("Jane"));

        doc.activate_toggle(other);
        engine.on_toggle_click(&mut doc, &mut answers, other);
        assert_eq!(doc.value(text), "Jane");
        assert_eq!(answers.get("Q1_t"), Some(&serde_json::json!("Jane")));
    }

    #[test]
    fn xor_clears_other_members_in_the_same_question() {
        let mut doc = Document::from_html(
            "root",
            r#"<form class="question" id="Q1"><input type="text" id="a" xor="g"><input type="number" id="b" xor="g"><input type="text" id="c" xor="h"></form>
<form class="question" id="Q2"><input type="text" id="d" xor="g"></form>"#,
        );
        let mut answers = Answers::new();
        let engine = FieldLinkageEngine::new();
        for id in ["b", "c", "d"] {
            let n = node(&doc, id);
            doc.set_value(n, "9");
        }
        let a = node(&doc, "a");
        let cleared = engine.enforce_xor(&mut doc, &mut answers, a);
        assert_eq!(cleared, vec![node(&doc, "b")]);
        assert_eq!(doc.value(node(&doc, "b")), "");
        assert_eq!(doc.value(node(&doc, "c")), "9");
        assert_eq!(doc.value(node(&doc, "d")), "9");
    }

    #[test]
    fn confirmations_are_normalized_and_missing_targets_dropped() {
        let mut doc = Document::from_html(
            "root",
            r#"<input type="email" id="e1"><input type="email" id="e2" confirm="e1"><input type="text" id="x" data-confirm="ghost">"#,
        );
        let mut engine = FieldLinkageEngine::new();
        engine.normalize_confirmations(&mut doc);

        let e1 = node(&doc, "e1");
        let e2 = node(&doc, "e2");
        let x = node(&doc, "x");
        assert!(!doc.has_attr(e2, "confirm"));
        assert_eq!(doc.attr(e2, "data-confirm"), Some("e1"));
        assert_eq!(doc.attr(e1, "data-confirmation-for"), Some("e2"));
        assert_eq!(engine.confirmation_target(e2), Some(e1));
        assert!(!doc.has_attr(x, "data-confirm"));
        assert_eq!(engine.confirmation_target(x), None);
    }
}
