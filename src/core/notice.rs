use std::fmt;

use super::LearnError;

/// Category of a user-visible notice. Every error the crate produces is
/// recovered at its boundary by turning it into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    Persistence,
    Access,
    Info,
}

/// One-shot message shown to the user (the app's alert dialog).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind, title: title.into(), message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Validation, "Missing information", message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, title, message)
    }

    pub fn is_blocking(&self) -> bool {
        self.kind != NoticeKind::Info
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

impl From<&LearnError> for Notice {
    fn from(error: &LearnError) -> Self {
        match error {
            LearnError::Validation(_)
            | LearnError::MissingFields(_)
            | LearnError::UnknownField { .. } => Notice::validation(error.to_string()),
            LearnError::AccessDenied { .. } => {
                Notice::new(NoticeKind::Access, "Premium Required", error.to_string())
            }
            LearnError::SignInRequired(_) => {
                Notice::new(NoticeKind::Access, "Sign In Required", error.to_string())
            }
            LearnError::AgeRestricted(_) => {
                Notice::new(NoticeKind::Access, "Access Restricted", error.to_string())
            }
            LearnError::NotFound { .. } => {
                Notice::new(NoticeKind::Persistence, "Error", error.to_string())
            }
            _ => Notice::new(
                NoticeKind::Persistence,
                "Error",
                format!("Something went wrong. Please try again. ({error})"),
            ),
        }
    }
}

impl From<LearnError> for Notice {
    fn from(error: LearnError) -> Self {
        Notice::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_to_notice_kinds() {
        let missing = LearnError::MissingFields(vec!["topic".into(), "initial_score".into()]);
        let notice = Notice::from(&missing);
        assert_eq!(notice.kind, NoticeKind::Validation);
        assert!(notice.message.contains("topic, initial_score"));

        let denied = LearnError::AccessDenied {
            feature: "Beliefs Journal".into(),
            required: "premium".into(),
        };
        assert_eq!(Notice::from(denied).kind, NoticeKind::Access);

        let io = LearnError::from(std::io::Error::other("disk full"));
        let notice = Notice::from(io);
        assert_eq!(notice.kind, NoticeKind::Persistence);
        assert!(notice.is_blocking());
    }
}
