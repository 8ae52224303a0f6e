use thiserror::Error;

#[derive(Error, Debug)]
pub enum LearnError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Remote store error: {0}")]
    Remote(Box<reqwest::Error>),

    #[error("{0}")]
    Validation(String),

    #[error("Please complete all fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Unknown field '{field}' for {schema}")]
    UnknownField { schema: String, field: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Failed to save {what}: {reason}")]
    Persistence { what: String, reason: String },

    #[error("{feature} requires a {required} subscription")]
    AccessDenied { feature: String, required: String },

    #[error("Please sign in to access {0}")]
    SignInRequired(String),

    #[error("Sign-in is available to users aged {0} and older")]
    AgeRestricted(u32),

    #[error("LearnError: {0}")]
    Custom(String),
}

impl LearnError {
    pub fn persistence(what: impl Into<String>, reason: impl ToString) -> Self {
        LearnError::Persistence { what: what.into(), reason: reason.to_string() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LearnError::Validation(_)
                | LearnError::MissingFields(_)
                | LearnError::UnknownField { .. }
        )
    }

    pub fn is_access(&self) -> bool {
        matches!(
            self,
            LearnError::AccessDenied { .. }
                | LearnError::SignInRequired(_)
                | LearnError::AgeRestricted(_)
        )
    }
}

impl From<std::io::Error> for LearnError {
    fn from(error: std::io::Error) -> Self {
        LearnError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for LearnError {
    fn from(error: reqwest::Error) -> Self {
        LearnError::Remote(Box::new(error))
    }
}
