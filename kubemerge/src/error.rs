use thiserror::Error;

/// Reasons a context import is refused. Nothing is merged when any of these
/// is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("source configuration is empty")]
    EmptySource,

    #[error("context \"{0}\" not found")]
    ContextNotFound(String),

    #[error("cluster \"{0}\" not found")]
    ClusterNotFound(String),

    #[error("auth-info \"{0}\" not found")]
    AuthInfoNotFound(String),
}
