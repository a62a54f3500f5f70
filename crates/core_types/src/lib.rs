use serde::{Deserialize, Serialize};
use std::fmt;

pub type RequestId = u64;

/// Identifier of a question container; matches the `id` attribute of its `<form class="question">`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QuestionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for QuestionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for QuestionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Es,
}

impl Lang {
    /// Anything other than `es` selects English, matching the host's lax selector.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("es") {
            Lang::Es
        } else {
            Lang::En
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Content,
    Stylesheet,
}

/// Semantic intent carried by the button that submitted a question container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonIntent {
    Previous,
    Reset,
    Next,
    SubmitSurvey,
}

impl ButtonIntent {
    pub fn parse(click_type: &str) -> Option<Self> {
        match click_type {
            "previous" => Some(ButtonIntent::Previous),
            "reset" => Some(ButtonIntent::Reset),
            "next" => Some(ButtonIntent::Next),
            "submitSurvey" => Some(ButtonIntent::SubmitSurvey),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ButtonIntent::Previous => "previous",
            ButtonIntent::Reset => "reset",
            ButtonIntent::Next => "next",
            ButtonIntent::SubmitSurvey => "submitSurvey",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_intent_parses_known_click_types() {
        for intent in [
            ButtonIntent::Previous,
            ButtonIntent::Reset,
            ButtonIntent::Next,
            ButtonIntent::SubmitSurvey,
        ] {
            assert_eq!(ButtonIntent::parse(intent.as_str()), Some(intent));
        }
        assert_eq!(ButtonIntent::parse("Next"), None);
        assert_eq!(ButtonIntent::parse(""), None);
    }

    #[test]
    fn lang_defaults_to_english() {
        assert_eq!(Lang::from_tag("es"), Lang::Es);
        assert_eq!(Lang::from_tag(" ES "), Lang::Es);
        assert_eq!(Lang::from_tag("fr"), Lang::En);
    }
}
