//! Error types for Kaj Lagbe.

use serde::Serialize;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Logging error: {0}")]
    Logging(String),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Raw failure reported by an identity provider, before classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not be reached at all.
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered and refused the request.
    #[error("Identity provider rejected request: {0}")]
    Rejected(String),
}

/// Why a locally validated form was refused before any provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ValidationReason {
    /// Sign-in submitted with a blank email or password.
    MissingCredentials,
    /// Sign-up submitted with at least one blank field.
    MissingFields,
    /// Password shorter than the configured minimum.
    PasswordTooShort { min: usize },
    /// Password and confirmation differ.
    PasswordMismatch,
    /// Provider says the email is malformed.
    InvalidEmail,
    /// Provider says the password is too weak.
    WeakPassword,
}

impl std::fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "Please enter email and password"),
            Self::MissingFields => write!(f, "All fields are required"),
            Self::PasswordTooShort { min } => {
                write!(f, "Password must be at least {min} characters")
            }
            Self::PasswordMismatch => write!(f, "Passwords do not match"),
            Self::InvalidEmail => write!(f, "The email address is badly formatted"),
            Self::WeakPassword => write!(f, "The password is too weak"),
        }
    }
}

/// Classified authentication outcome surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No account exists for this email")]
    AccountNotFound,

    #[error("An account already exists for this email")]
    AccountAlreadyExists,

    #[error("Network unavailable, please try again")]
    NetworkUnavailable,

    #[error("{0}")]
    ValidationFailed(ValidationReason),

    #[error("Account created but saving the profile failed: {0}")]
    ProfileWriteFailed(String),

    #[error("Authentication failed: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Stable machine-readable kind, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountNotFound => "account_not_found",
            Self::AccountAlreadyExists => "account_already_exists",
            Self::NetworkUnavailable => "network_unavailable",
            Self::ValidationFailed(_) => "validation_failed",
            Self::ProfileWriteFailed(_) => "profile_write_failed",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Why a sign-in or sign-up submission did not start a provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejection {
    /// Another attempt is outstanding; nothing changed.
    #[error("An authentication request is already in flight")]
    InFlight,

    /// Already signed in; nothing changed.
    #[error("Already signed in")]
    AlreadyAuthenticated,

    /// The attempt ended in `Failed` with this error.
    #[error(transparent)]
    Failed(#[from] AuthError),
}

/// Request-initiation guard failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("A worker cannot request a job from themselves")]
    SelfRequestNotAllowed,
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_match_form_copy() {
        assert_eq!(
            ValidationReason::MissingFields.to_string(),
            "All fields are required"
        );
        assert_eq!(
            ValidationReason::PasswordTooShort { min: 6 }.to_string(),
            "Password must be at least 6 characters"
        );
        assert_eq!(
            ValidationReason::PasswordMismatch.to_string(),
            "Passwords do not match"
        );
    }

    #[test]
    fn auth_error_kinds_are_distinct() {
        let errors = [
            AuthError::InvalidCredentials,
            AuthError::AccountNotFound,
            AuthError::AccountAlreadyExists,
            AuthError::NetworkUnavailable,
            AuthError::ValidationFailed(ValidationReason::MissingFields),
            AuthError::ProfileWriteFailed("disk full".into()),
            AuthError::Unknown("boom".into()),
        ];
        let mut kinds: Vec<&str> = errors.iter().map(AuthError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn validation_reason_serializes_tagged() {
        let json = serde_json::to_value(ValidationReason::PasswordTooShort { min: 6 }).unwrap();
        assert_eq!(json["reason"], "password_too_short");
        assert_eq!(json["min"], 6);
    }
}
