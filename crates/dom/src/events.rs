use crate::types::NodeId;

/// DOM event types the questionnaire listens for at the document level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Change,
    Keydown,
    Keyup,
    Input,
    Blur,
    Submit,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Change => "change",
            EventType::Keydown => "keydown",
            EventType::Keyup => "keyup",
            EventType::Input => "input",
            EventType::Blur => "blur",
            EventType::Submit => "submit",
        }
    }
}

/// One event as delivered to the document-level router.
///
/// For `Submit`, `target` is the form and `submitter` the button that triggered it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomEvent {
    pub event_type: EventType,
    pub target: NodeId,
    pub key: Option<String>,
    pub submitter: Option<NodeId>,
}

impl DomEvent {
    pub fn new(event_type: EventType, target: NodeId) -> Self {
        Self {
            event_type,
            target,
            key: None,
            submitter: None,
        }
    }

    pub fn click(target: NodeId) -> Self {
        Self::new(EventType::Click, target)
    }

    pub fn key(event_type: EventType, target: NodeId, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(event_type, target)
        }
    }

    pub fn submit(form: NodeId, submitter: Option<NodeId>) -> Self {
        Self {
            submitter,
            ..Self::new(EventType::Submit, form)
        }
    }

    pub fn key_is(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}
