//! Error types for substitution, graph configuration and options binding.

use thiserror::Error;

/// Boxed error accepted from user-supplied substitutions and callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure raised by a [`Substitution`](crate::Substitution) while rewriting one string.
#[derive(Debug, Error)]
pub enum SubstitutionError {
    /// A referenced variable is not defined.
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },

    /// The value contains a reference that cannot be parsed.
    #[error("malformed variable reference `{reference}`: {reason}")]
    Malformed { reference: String, reason: String },

    /// Error raised by a custom substitution.
    #[error(transparent)]
    Custom(BoxError),
}

impl SubstitutionError {
    pub fn custom(err: impl Into<BoxError>) -> Self {
        Self::Custom(err.into())
    }

    pub fn malformed(reference: &str, reason: &str) -> Self {
        Self::Malformed {
            reference: reference.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Error raised while walking a settings graph.
///
/// Locations rewritten before the failure keep their new values.
#[derive(Debug, Error)]
pub enum ConfigureError {
    /// The substitution failed on the string at `path`.
    #[error("substitution failed at `{path}`: {source}")]
    Substitution {
        path: String,
        #[source]
        source: SubstitutionError,
    },

    /// The graph nests deeper than the configured limit.
    #[error("settings graph exceeds maximum depth of {limit} at `{path}`")]
    DepthExceeded { path: String, limit: usize },
}

impl ConfigureError {
    /// Location of the node that caused the failure.
    pub fn path(&self) -> &str {
        match self {
            ConfigureError::Substitution { path, .. } | ConfigureError::DepthExceeded { path, .. } => {
                path
            }
        }
    }

    /// Recover the error raised by the substitution, if that is what failed.
    pub fn into_substitution_error(self) -> Option<SubstitutionError> {
        match self {
            ConfigureError::Substitution { source, .. } => Some(source),
            ConfigureError::DepthExceeded { .. } => None,
        }
    }
}

/// Error raised while building a settings instance from a [`ConfigSource`](crate::config::ConfigSource).
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("configuration section `{section}` not found")]
    SectionNotFound { section: String },

    #[error("failed to bind section `{section}`: {source}")]
    Bind {
        section: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Configure(#[from] ConfigureError),

    #[error("post-configure step failed for section `{section}`: {source}")]
    PostConfigure {
        section: String,
        #[source]
        source: BoxError,
    },
}
