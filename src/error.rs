use thiserror::Error;

/// Error taxonomy shared by every capability.
///
/// Wiring errors ([`ServiceError::MissingCredential`],
/// [`ServiceError::UnknownProvider`]) abort the operation that triggered them.
/// Data-plane errors ([`ServiceError::NotFound`], [`ServiceError::Remote`])
/// are returned to the immediate caller as typed failures. Call-log write
/// failures are swallowed inside the logger and never appear here.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A `${ENV:NAME}` placeholder referenced an environment variable that is
    /// unset or empty. Fatal, never retried.
    #[error("missing credential: {path} requires environment variable {var}")]
    MissingCredential { path: String, var: String },

    /// The configured provider name is not registered for the capability.
    /// Fatal, never retried. There is no fallback to a default provider.
    #[error("unknown {capability} provider: {provider:?}")]
    UnknownProvider {
        capability: &'static str,
        provider: String,
    },

    /// The referenced remote object/resource does not exist. Not retried.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing store or vendor rejected or failed a request. Retryable,
    /// but only for idempotent operations.
    #[error("remote error: {0}")]
    Remote(String),

    /// The configuration document is malformed or incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServiceError {
    /// Whether a retry could plausibly succeed. Callers must additionally
    /// check that the operation itself is idempotent before re-attempting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Remote(_))
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_variable() {
        let err = ServiceError::MissingCredential {
            path: "search_service.google_custom_search.api_key".into(),
            var: "API_KEY".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("API_KEY"));
        assert!(msg.contains("search_service"));
    }

    #[test]
    fn only_remote_errors_are_retryable() {
        assert!(ServiceError::Remote("503".into()).is_retryable());
        assert!(!ServiceError::NotFound("demo/x".into()).is_retryable());
        assert!(!ServiceError::UnknownProvider {
            capability: "storage_service",
            provider: "AWSS3".into(),
        }
        .is_retryable());
    }
}
