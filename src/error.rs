//! Error types for the smoke test
//!
//! Two families: failures that stop the run before any check executes
//! ([`InitError`]) and failures of a single cluster query ([`QueryError`]),
//! which the checks turn into verdicts.

use thiserror::Error;

/// Result of a read against the cluster facade
pub type QueryResult<T> = Result<T, QueryError>;

/// A single query against the cluster could not produce a value.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The resource (or resource type) does not exist. This is a verdict
    /// input, not a transport failure.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    /// Transport, authentication or API server failure
    #[error("kubernetes API error: {0}")]
    Kube(#[source] kube::Error),

    /// The API answered but the payload could not be interpreted
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl QueryError {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        QueryError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// True when the error means "absent" rather than "could not ask"
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound { .. })
    }

    /// Map a kube error, turning API 404 responses into [`QueryError::NotFound`]
    pub fn from_kube(err: kube::Error, kind: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 404 => {
                QueryError::not_found(kind, name)
            }
            other => QueryError::Kube(other),
        }
    }
}

/// Fatal errors raised while bootstrapping, before any check runs.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::InferConfigError),

    #[error("failed to create kubernetes client: {0}")]
    Client(#[from] kube::Error),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: "Whatever".to_string(),
            code,
        })
    }

    #[test]
    fn test_404_maps_to_not_found() {
        let err = QueryError::from_kube(api_error(404), "namespace", "druid");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "namespace 'druid' not found");
    }

    #[test]
    fn test_other_api_errors_stay_errors() {
        let err = QueryError::from_kube(api_error(403), "pods", "kube-system");
        assert!(!err.is_not_found());
        assert!(matches!(err, QueryError::Kube(_)));
    }
}
