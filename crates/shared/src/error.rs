use thiserror::Error;

/// The remote store answers failures with a plain-text body and a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into().trim().to_string(),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseDomainError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseDomainError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
