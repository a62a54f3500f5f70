use crate::types::NodeId;
use input_core::ControlStore;
use std::collections::HashMap;

/// What a form control is, as far as questionnaire handling cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Text,
    Number,
    Email,
    Tel,
    Date,
    Month,
    Time,
    Textarea,
    Select,
    Checkbox,
    Radio,
    Button,
    Other,
}

impl ControlKind {
    /// Classify an element from its tag name and `type` attribute.
    pub fn classify(tag: &str, type_attr: Option<&str>) -> Self {
        if tag.eq_ignore_ascii_case("textarea") {
            return ControlKind::Textarea;
        }
        if tag.eq_ignore_ascii_case("select") {
            return ControlKind::Select;
        }
        if tag.eq_ignore_ascii_case("button") {
            return ControlKind::Button;
        }
        if !tag.eq_ignore_ascii_case("input") {
            return ControlKind::Other;
        }

        let ty = type_attr.map(str::trim).filter(|s| !s.is_empty());
        let Some(ty) = ty else {
            // missing type defaults to text
            return ControlKind::Text;
        };
        match ty.to_ascii_lowercase().as_str() {
            "text" => ControlKind::Text,
            "number" => ControlKind::Number,
            "email" => ControlKind::Email,
            "tel" => ControlKind::Tel,
            "date" => ControlKind::Date,
            "month" => ControlKind::Month,
            "time" => ControlKind::Time,
            "checkbox" => ControlKind::Checkbox,
            "radio" => ControlKind::Radio,
            "submit" | "button" | "reset" => ControlKind::Button,
            _ => ControlKind::Other,
        }
    }

    pub fn is_toggle(self) -> bool {
        matches!(self, ControlKind::Checkbox | ControlKind::Radio)
    }

    /// Controls whose value is a user-typed string.
    pub fn is_text_entry(self) -> bool {
        matches!(
            self,
            ControlKind::Text
                | ControlKind::Number
                | ControlKind::Email
                | ControlKind::Tel
                | ControlKind::Date
                | ControlKind::Month
                | ControlKind::Time
                | ControlKind::Textarea
        )
    }

    /// Controls that hold an answer.
    pub fn is_answerable(self) -> bool {
        self.is_toggle() || self.is_text_entry() || self == ControlKind::Select
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct RadioGroupKey {
    pub(crate) scope: NodeId,
    pub(crate) name: String,
}

/// Radio membership by (form owner, name). Used to keep groups exclusive.
#[derive(Clone, Debug, Default)]
pub(crate) struct RadioGroupIndex {
    group_by_key: HashMap<RadioGroupKey, usize>,
    group_by_radio: HashMap<NodeId, usize>,
    groups: Vec<Vec<NodeId>>,
}

impl RadioGroupIndex {
    fn ensure_group_id(&mut self, key: RadioGroupKey) -> usize {
        if let Some(id) = self.group_by_key.get(&key) {
            return *id;
        }

        let id = self.groups.len();
        self.groups.push(Vec::new());
        self.group_by_key.insert(key, id);
        id
    }

    pub(crate) fn register(&mut self, key: RadioGroupKey, radio: NodeId) -> usize {
        let group_id = self.ensure_group_id(key);

        // Last write wins; drop stale membership so toggling cannot desync.
        let prev = self.group_by_radio.insert(radio, group_id);
        if let Some(old_group) = prev.filter(|old| *old != group_id)
            && let Some(old_members) = self.groups.get_mut(old_group)
        {
            old_members.retain(|&id| id != radio);
        }
        if prev != Some(group_id)
            && let Some(members) = self.groups.get_mut(group_id)
        {
            members.push(radio);
        }
        group_id
    }

    pub(crate) fn members_of(&self, radio: NodeId) -> &[NodeId] {
        self.group_by_radio
            .get(&radio)
            .and_then(|group| self.groups.get(*group))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check `radio` and uncheck the rest of its group. Returns `true` if anything changed.
    pub(crate) fn check(&self, store: &mut ControlStore, radio: NodeId) -> bool {
        let members = self.members_of(radio);
        if members.is_empty() {
            return store.set_checked(radio.into(), true);
        }

        let mut changed = false;
        for &id in members {
            changed |= store.set_checked(id.into(), id == radio);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_defaults_missing_type_to_text() {
        assert_eq!(ControlKind::classify("input", None), ControlKind::Text);
        assert_eq!(ControlKind::classify("INPUT", Some(" ")), ControlKind::Text);
        assert_eq!(ControlKind::classify("input", Some("TEL")), ControlKind::Tel);
        assert_eq!(ControlKind::classify("input", Some("hidden")), ControlKind::Other);
        assert_eq!(ControlKind::classify("textarea", None), ControlKind::Textarea);
        assert_eq!(ControlKind::classify("div", Some("radio")), ControlKind::Other);
    }

    #[test]
    fn answerable_kinds_exclude_buttons() {
        assert!(ControlKind::Month.is_answerable());
        assert!(ControlKind::Select.is_answerable());
        assert!(!ControlKind::Select.is_text_entry());
        assert!(!ControlKind::Button.is_answerable());
    }

    #[test]
    fn checking_a_radio_unchecks_its_group() {
        let mut index = RadioGroupIndex::default();
        let key = RadioGroupKey {
            scope: NodeId(1),
            name: "g".to_string(),
        };
        index.register(key.clone(), NodeId(2));
        index.register(key, NodeId(3));

        let mut store = ControlStore::new();
        assert!(index.check(&mut store, NodeId(2)));
        assert!(index.check(&mut store, NodeId(3)));
        assert!(!store.is_checked(NodeId(2).into()));
        assert!(store.is_checked(NodeId(3).into()));
        assert!(!index.check(&mut store, NodeId(3)));
    }

    #[test]
    fn re_registering_moves_radio_between_groups() {
        let mut index = RadioGroupIndex::default();
        let a = RadioGroupKey {
            scope: NodeId(1),
            name: "a".to_string(),
        };
        let b = RadioGroupKey {
            scope: NodeId(1),
            name: "b".to_string(),
        };
        index.register(a.clone(), NodeId(2));
        index.register(a, NodeId(3));
        index.register(b, NodeId(2));

        assert_eq!(index.members_of(NodeId(3)), &[NodeId(3)]);
        assert_eq!(index.members_of(NodeId(2)), &[NodeId(2)]);
    }
}
