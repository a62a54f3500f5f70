//! Values and checked flags of form controls.
//!
//! The store knows nothing about markup. Radio-group exclusivity, label pairing
//! and answer bookkeeping live in the layers above; every mutation reports
//! whether it changed anything so callers can keep their side effects idempotent.

use crate::id::ControlId;
use crate::text::typed_text;
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ControlState {
    text: String,
    checked: bool,
}

/// Form-control state keyed by [`ControlId`].
///
/// ```
/// use input_core::{ControlId, ControlStore};
///
/// let mut store = ControlStore::new();
/// let id = ControlId::new(1);
///
/// store.seed(id, "Ja", false);
/// store.type_text(id, "ne", false);
/// assert_eq!(store.value(id), "Jane");
/// ```
#[derive(Clone, Debug, Default)]
pub struct ControlStore {
    controls: HashMap<ControlId, ControlState>,
}

impl ControlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the markup-declared state of a control. Existing state wins, so
    /// re-seeding never discards what the user entered.
    pub fn seed(&mut self, id: ControlId, value: impl Into<String>, checked: bool) {
        self.controls.entry(id).or_insert_with(|| ControlState {
            text: value.into(),
            checked,
        });
    }

    /// Current value, `""` for unknown controls.
    pub fn value(&self, id: ControlId) -> &str {
        self.controls.get(&id).map_or("", |c| c.text.as_str())
    }

    /// Overwrite the value. Returns `true` if it changed.
    pub fn set_value(&mut self, id: ControlId, value: String) -> bool {
        let state = self.controls.entry(id).or_default();
        if state.text == value {
            return false;
        }
        state.text = value;
        true
    }

    /// Append typed text. Returns `true` if anything was inserted.
    pub fn type_text(&mut self, id: ControlId, s: &str, multiline: bool) -> bool {
        let s = typed_text(s, multiline);
        if s.is_empty() {
            return false;
        }
        self.controls.entry(id).or_default().text.push_str(&s);
        true
    }

    /// Remove the last character. Returns `true` if there was one.
    pub fn backspace(&mut self, id: ControlId) -> bool {
        self.controls
            .get_mut(&id)
            .is_some_and(|c| c.text.pop().is_some())
    }

    pub fn is_checked(&self, id: ControlId) -> bool {
        self.controls.get(&id).is_some_and(|c| c.checked)
    }

    /// Set the checked flag. Returns `true` if it changed.
    pub fn set_checked(&mut self, id: ControlId, checked: bool) -> bool {
        let state = self.controls.entry(id).or_default();
        let changed = state.checked != checked;
        state.checked = checked;
        changed
    }

    /// Flip the checked flag and return the new state.
    pub fn toggle_checked(&mut self, id: ControlId) -> bool {
        let state = self.controls.entry(id).or_default();
        state.checked = !state.checked;
        state.checked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> ControlId {
        ControlId::new(raw)
    }

    #[test]
    fn set_checked_reports_only_real_changes() {
        let mut store = ControlStore::new();
        assert!(store.set_checked(id(1), true));
        assert!(!store.set_checked(id(1), true));
        assert!(store.is_checked(id(1)));
        assert!(store.set_checked(id(1), false));
    }

    #[test]
    fn seeding_never_overwrites_user_state() {
        let mut store = ControlStore::new();
        store.seed(id(1), "seed", false);
        store.set_value(id(1), "typed".to_string());
        store.seed(id(1), "seed", true);
        assert_eq!(store.value(id(1)), "typed");
        assert!(!store.is_checked(id(1)));
    }

    #[test]
    fn typing_and_backspace_report_changes() {
        let mut store = ControlStore::new();
        assert!(store.type_text(id(1), "a\n", false));
        assert!(!store.type_text(id(1), "\n", false));
        assert!(!store.set_value(id(1), "a".to_string()));
        assert!(store.backspace(id(1)));
        assert!(!store.backspace(id(1)));
        assert!(!store.backspace(id(7)));

        store.type_text(id(2), "x\r\ny", true);
        assert_eq!(store.value(id(2)), "x\ny");
    }

    #[test]
    fn checked_state_survives_value_edits() {
        let mut store = ControlStore::new();
        store.set_checked(id(1), true);
        store.set_value(id(1), "on".to_string());
        assert!(store.is_checked(id(1)));
        assert!(!store.toggle_checked(id(1)));
        assert_eq!(store.value(id(9)), "");
    }
}
