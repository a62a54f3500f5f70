//! Collaborators supplied by the embedding application.

use crate::error::HostError;
use async_trait::async_trait;
use dom::ControlKind;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The host's `retrieve`/`store` callbacks.
#[async_trait]
pub trait HostCallbacks: Send + Sync {
    /// Prior answers, if the host has any.
    async fn retrieve(&self) -> Result<Option<Value>, HostError>;

    /// Receive an answer update. Removed answers are sent as `null`.
    async fn store(&self, update: Map<String, Value>) -> Result<(), HostError>;
}

/// Resolves `{$u:name}` tokens before the content is transformed.
pub trait ValueResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<String>;
}

impl ValueResolver for BTreeMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// What a validation hook gets to see about the field that lost focus.
#[derive(Clone, Copy, Debug)]
pub struct FieldSnapshot<'a> {
    pub id: Option<&'a str>,
    pub kind: ControlKind,
    pub value: &'a str,
    /// Value of the field this one must repeat, for `data-confirm` pairs.
    pub confirms: Option<&'a str>,
}

/// Formatting and validation hooks run from the event router.
pub trait FieldHooks: Send + Sync {
    /// Reformatted SSN text, or `None` to leave the field alone.
    fn format_ssn(&self, _value: &str) -> Option<String> {
        None
    }

    fn format_phone(&self, _value: &str) -> Option<String> {
        None
    }

    /// `Err(message)` marks the field invalid.
    fn validate(&self, _field: &FieldSnapshot<'_>) -> Result<(), String> {
        Ok(())
    }
}

/// Leaves every field as typed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFieldHooks;

impl FieldHooks for NoFieldHooks {}

/// US-style SSN/phone grouping and confirmation matching.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicFieldHooks;

impl FieldHooks for BasicFieldHooks {
    fn format_ssn(&self, value: &str) -> Option<String> {
        group_digits(value, &[3, 2, 4])
    }

    fn format_phone(&self, value: &str) -> Option<String> {
        group_digits(value, &[3, 3, 4])
    }

    fn validate(&self, field: &FieldSnapshot<'_>) -> Result<(), String> {
        if let Some(expected) = field.confirms
            && expected != field.value
        {
            return Err("values do not match".to_string());
        }
        if field.kind == ControlKind::Email && !field.value.is_empty() && !field.value.contains('@') {
            return Err("not an email address".to_string());
        }
        Ok(())
    }
}

/// Insert `-` between digit groups as the user types. Non-digits are dropped,
/// digits beyond the last group are cut.
fn group_digits(value: &str, groups: &[usize]) -> Option<String> {
    let digits: Vec<char> = value.chars().filter(char::is_ascii_digit).collect();
    let mut out = String::new();
    let mut rest = digits.as_slice();
    for (i, &size) in groups.iter().enumerate() {
        if rest.is_empty() {
            break;
        }
        if i > 0 {
            out.push('-');
        }
        let take = size.min(rest.len());
        out.extend(&rest[..take]);
        rest = &rest[take..];
    }
    (out != value).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_ssn_and_phone_digits() {
        let hooks = BasicFieldHooks;
        assert_eq!(hooks.format_ssn("123456789").as_deref(), Some("123-45-6789"));
        assert_eq!(hooks.format_ssn("1234").as_deref(), Some("123-4"));
        assert_eq!(hooks.format_ssn("123-45"), None);
        assert_eq!(hooks.format_phone("(555) 123 4567x").as_deref(), Some("555-123-4567"));
    }

    #[test]
    fn confirmation_must_match() {
        let hooks = BasicFieldHooks;
        let field = FieldSnapshot {
            id: Some("email2"),
            kind: ControlKind::Email,
            value: "a@b.test",
            confirms: Some("a@c.test"),
        };
        assert!(hooks.validate(&field).is_err());
        assert!(hooks.validate(&FieldSnapshot { confirms: Some("a@b.test"), ..field }).is_ok());
        assert!(hooks.validate(&FieldSnapshot { value: "nope", confirms: None, ..field }).is_err());
    }
}
