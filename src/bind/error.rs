use std::fmt::Display;

use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindError {
    #[error("required key not found: {0}")]
    MissingRequired(String),

    #[error("key must be unique: {0}")]
    DuplicateKey(String),

    #[error("malformed key (missing ']'): {0}")]
    MalformedKey(String),

    #[error("unsupported type at '{key}': {reason}")]
    UnsupportedType { key: String, reason: String },

    #[error("malformed value at '{key}': {reason}")]
    MalformedValue { key: String, reason: String },

    #[error("validation failed at '{key}': {source}")]
    ValidationFailed {
        key: String,
        source: ValidationError,
    },

    #[error("type '{type_name}' marks more than one validation control flag: {flags:?}")]
    AmbiguousControlFlag {
        type_name: &'static str,
        flags: &'static [&'static str],
    },

    #[error("{}", describe_custom(.key, .message))]
    Custom {
        key: Option<String>,
        message: String,
    },
}

fn describe_custom(key: &Option<String>, message: &str) -> String {
    match key {
        Some(key) => format!("at '{key}': {message}"),
        None => message.to_string(),
    }
}

impl BindError {
    pub(crate) fn unsupported(key: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(key: &str, reason: impl Into<String>) -> Self {
        Self::MalformedValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Attaches `key` to messages raised by serde visitors that had no key at hand.
    pub(crate) fn at(self, key: &str) -> Self {
        match self {
            Self::Custom { key: None, message } => Self::Custom {
                key: Some(key.to_string()),
                message,
            },
            other => other,
        }
    }

    /// Reclassifies a keyless visitor message raised while parsing the leaf at
    /// `key` (a bad date-time, say) as a malformed value there.
    pub(crate) fn malformed_at(self, key: &str) -> Self {
        match self {
            Self::Custom { key: None, message } => Self::malformed(key, message),
            other => other,
        }
    }
}

impl serde::de::Error for BindError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom {
            key: None,
            message: msg.to_string(),
        }
    }
}
