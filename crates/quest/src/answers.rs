//! In-memory answers and their two-way mapping onto form controls.
//!
//! Keys follow the markup: text-like controls and lone checkboxes answer under
//! their `id`, radio and named checkbox groups under their `name`. Radios store
//! the chosen value, checkbox groups the list of checked values.

use dom::{ControlKind, Document, NodeId};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Answers {
    values: Map<String, Value>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Answer key a control reports under, if it is answerable.
    pub fn key_for(doc: &Document, control: NodeId) -> Option<String> {
        let kind = doc.control_kind(control);
        if !kind.is_answerable() {
            return None;
        }
        let name = doc.attr(control, "name").filter(|n| !n.is_empty());
        let id = doc.element_id(control);
        let key = match kind {
            ControlKind::Radio | ControlKind::Checkbox => name.or(id),
            _ => id.or(name),
        };
        key.map(str::to_string)
    }

    /// Re-read one control from the document. Returns its key.
    pub fn record_control(&mut self, doc: &Document, control: NodeId) -> Option<String> {
        let key = Self::key_for(doc, control)?;
        let value = match doc.control_kind(control) {
            ControlKind::Radio => group_members(doc, control, &key)
                .into_iter()
                .find(|&r| doc.is_checked(r))
                .map(|r| Value::String(doc.value(r).to_string())),
            ControlKind::Checkbox if doc.attr(control, "name").is_some_and(|n| !n.is_empty()) => {
                let checked: Vec<Value> = group_members(doc, control, &key)
                    .into_iter()
                    .filter(|&c| doc.is_checked(c))
                    .map(|c| Value::String(doc.value(c).to_string()))
                    .collect();
                (!checked.is_empty()).then_some(Value::Array(checked))
            }
            ControlKind::Checkbox => Some(Value::Bool(doc.is_checked(control))),
            _ => {
                let text = doc.value(control);
                (!text.is_empty()).then(|| Value::String(text.to_string()))
            }
        };
        match value {
            Some(value) => {
                self.values.insert(key.clone(), value);
            }
            None => {
                self.values.remove(&key);
            }
        }
        Some(key)
    }

    /// Re-read every control inside `container`.
    pub fn record_within(&mut self, doc: &Document, container: NodeId) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for control in doc.descendants(container) {
            if let Some(key) = self.record_control(doc, control)
                && !keys.contains(&key)
            {
                keys.push(key);
            }
        }
        keys
    }

    /// Fill the document from persisted answers and adopt them.
    ///
    /// Strings fill text-like controls by id or check group members by value,
    /// booleans set checkboxes by id, arrays check every listed group value and
    /// nested objects are restored recursively.
    pub fn restore(&mut self, doc: &mut Document, persisted: &Map<String, Value>) {
        for (key, value) in persisted {
            restore_entry(doc, key, value);
            if !value.is_object() {
                self.values.insert(key.clone(), value.clone());
            }
        }
        self.adopt_nested(persisted);
    }

    fn adopt_nested(&mut self, persisted: &Map<String, Value>) {
        for value in persisted.values() {
            if let Value::Object(inner) = value {
                for (k, v) in inner {
                    if !v.is_object() {
                        self.values.insert(k.clone(), v.clone());
                    }
                }
                self.adopt_nested(inner);
            }
        }
    }
}

fn restore_entry(doc: &mut Document, key: &str, value: &Value) {
    match value {
        Value::String(s) => restore_text_or_choice(doc, key, s),
        Value::Number(n) => restore_text_or_choice(doc, key, &n.to_string()),
        Value::Bool(checked) => {
            if let Some(node) = doc.get_element_by_id(key)
                && doc.control_kind(node).is_toggle()
            {
                doc.set_checked(node, *checked);
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => check_by_value(doc, key, s),
                    Value::Number(n) => check_by_value(doc, key, &n.to_string()),
                    _ => {}
                }
            }
        }
        Value::Object(inner) => {
            for (k, v) in inner {
                restore_entry(doc, k, v);
            }
        }
        Value::Null => {}
    }
}

fn restore_text_or_choice(doc: &mut Document, key: &str, text: &str) {
    if let Some(node) = doc.get_element_by_id(key) {
        let kind = doc.control_kind(node);
        if kind.is_text_entry() || kind == ControlKind::Select {
            doc.set_value(node, text);
            return;
        }
    }
    check_by_value(doc, key, text);
}

fn check_by_value(doc: &mut Document, name: &str, value: &str) {
    let matches: Vec<NodeId> = named_toggles(doc, name)
        .into_iter()
        .filter(|&n| doc.value(n) == value)
        .collect();
    for node in matches {
        doc.set_checked(node, true);
    }
}

fn named_toggles(doc: &Document, name: &str) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|&n| doc.control_kind(n).is_toggle() && doc.attr(n, "name") == Some(name))
        .collect()
}

/// Toggles sharing `key` with `control` inside the same question form.
fn group_members(doc: &Document, control: NodeId, key: &str) -> Vec<NodeId> {
    let scope = doc.closest_tag(control, "form").unwrap_or(doc.root());
    let kind = doc.control_kind(control);
    doc.descendants(scope)
        .into_iter()
        .filter(|&n| doc.control_kind(n) == kind && doc.attr(n, "name") == Some(key))
        .collect()
}
