use thiserror::Error;

/// Errors that abort an audit run
#[derive(Debug, Error)]
pub enum AuditError {
    /// Missing mandatory value, unknown filter, unknown rule or parameter
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A rule parameter override could not be converted to its declared type
    #[error("invalid value {value:?} for parameter `{param}` of rule {rule}: {reason}")]
    InvalidParameter {
        rule: String,
        param: String,
        value: String,
        reason: String,
    },

    /// The tracker rejected the credentials
    #[error("authentication failed at {url}: {message}")]
    Authentication { url: String, message: String },

    /// The tracker could not be reached or answered with an error
    #[error("error accessing issue tracker at {url}, please verify the parameters: {message}")]
    Connectivity { url: String, message: String },
}

impl AuditError {
    /// True for errors raised while resolving settings, before any network call
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AuditError::Configuration(_) | AuditError::InvalidParameter { .. }
        )
    }
}
