#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("invalid module header: {0}")]
    InvalidHeader(#[source] serde_json::Error),

    #[error("question {0} is declared more than once")]
    DuplicateQuestion(String),

    #[error("unknown control kind `{kind}` in question {question}")]
    UnknownControl { question: String, kind: String },

    #[error("markup grammar failed to compile: {0}")]
    Grammar(#[from] regex::Error),
}
