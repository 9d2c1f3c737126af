use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::permissions::AuthorizationError;
use crate::schema::SchemaError;
use crate::submit::SubmitError;
use std::fmt;

/// Unified error type for the crate.
///
/// Each module reports its own error type; this enum lets callers that drive
/// several modules propagate any of them with `?`.
#[derive(Debug)]
pub enum FoldDomainError {
    /// Errors raised while preparing a change set
    Submit(SubmitError),

    /// A permission check failed
    Authorization(AuthorizationError),

    /// Errors in the entity model or property values
    Schema(SchemaError),

    /// Errors loading or validating configuration
    Config(ConfigError),

    /// Errors installing the logger
    Logging(LoggingError),
}

impl FoldDomainError {
    /// Whether the error was caused by the request rather than the service.
    pub fn is_client_fault(&self) -> bool {
        match self {
            Self::Submit(err) => err.is_client_fault(),
            Self::Authorization(_) => true,
            Self::Schema(SchemaError::UnknownProperty { .. })
            | Self::Schema(SchemaError::InvalidValue { .. }) => true,
            Self::Schema(_) | Self::Config(_) | Self::Logging(_) => false,
        }
    }
}

impl fmt::Display for FoldDomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submit(err) => write!(f, "Submit error: {}", err),
            Self::Authorization(err) => write!(f, "Authorization error: {}", err),
            Self::Schema(err) => write!(f, "Schema error: {}", err),
            Self::Config(err) => write!(f, "Configuration error: {}", err),
            Self::Logging(err) => write!(f, "Logging error: {}", err),
        }
    }
}

impl std::error::Error for FoldDomainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Submit(err) => Some(err),
            Self::Authorization(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
        }
    }
}

impl From<SubmitError> for FoldDomainError {
    fn from(error: SubmitError) -> Self {
        FoldDomainError::Submit(error)
    }
}

impl From<AuthorizationError> for FoldDomainError {
    fn from(error: AuthorizationError) -> Self {
        FoldDomainError::Authorization(error)
    }
}

impl From<SchemaError> for FoldDomainError {
    fn from(error: SchemaError) -> Self {
        FoldDomainError::Schema(error)
    }
}

impl From<ConfigError> for FoldDomainError {
    fn from(error: ConfigError) -> Self {
        FoldDomainError::Config(error)
    }
}

impl From<LoggingError> for FoldDomainError {
    fn from(error: LoggingError) -> Self {
        FoldDomainError::Logging(error)
    }
}

/// Result type alias for operations that can result in a FoldDomainError
pub type FoldDomainResult<T> = Result<T, FoldDomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionKind;

    #[test]
    fn classifies_client_faults() {
        let denied: FoldDomainError = AuthorizationError::new(PermissionKind::Read, "People").into();
        assert!(denied.is_client_fault());
        assert_eq!(
            denied.to_string(),
            "Authorization error: Not authorized for Read: People"
        );

        let missing: FoldDomainError = SubmitError::MissingKey {
            entity_set: "People".to_string(),
        }
        .into();
        assert!(missing.is_client_fault());

        let config: FoldDomainError = ConfigError::validation("bad").into();
        assert!(!config.is_client_fault());
    }
}
