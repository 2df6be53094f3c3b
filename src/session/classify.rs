//! Map raw identity-provider failures onto the caller-facing taxonomy.

use crate::error::{AuthError, ProviderError, ValidationReason};

const INVALID_CREDENTIALS: &[&str] = &[
    "invalid_password",
    "invalid_login_credentials",
    "wrong-password",
    "invalid-credential",
    "password is invalid",
];

const ACCOUNT_NOT_FOUND: &[&str] = &["email_not_found", "user-not-found", "no user record"];

const ACCOUNT_EXISTS: &[&str] = &["email_exists", "email-already-in-use", "already in use"];

const NETWORK: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "unreachable",
    "connection refused",
];

const INVALID_EMAIL: &[&str] = &["invalid_email", "invalid-email", "badly formatted"];

const WEAK_PASSWORD: &[&str] = &["weak_password", "weak-password"];

/// Classify a provider failure by the substrings in its detail text.
pub fn classify(err: &ProviderError) -> AuthError {
    let detail = match err {
        ProviderError::Unavailable(_) => return AuthError::NetworkUnavailable,
        ProviderError::Rejected(detail) => detail.to_lowercase(),
    };

    let hit = |patterns: &[&str]| patterns.iter().any(|p| detail.contains(p));

    if hit(INVALID_CREDENTIALS) {
        AuthError::InvalidCredentials
    } else if hit(ACCOUNT_NOT_FOUND) {
        AuthError::AccountNotFound
    } else if hit(ACCOUNT_EXISTS) {
        AuthError::AccountAlreadyExists
    } else if hit(INVALID_EMAIL) {
        AuthError::ValidationFailed(ValidationReason::InvalidEmail)
    } else if hit(WEAK_PASSWORD) {
        AuthError::ValidationFailed(ValidationReason::WeakPassword)
    } else if hit(NETWORK) {
        AuthError::NetworkUnavailable
    } else {
        AuthError::Unknown(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(detail: &str) -> ProviderError {
        ProviderError::Rejected(detail.to_string())
    }

    #[test]
    fn unavailable_is_network() {
        assert_eq!(
            classify(&ProviderError::Unavailable("dns".into())),
            AuthError::NetworkUnavailable
        );
    }

    #[test]
    fn provider_codes_map_to_kinds() {
        let cases = [
            ("INVALID_PASSWORD", AuthError::InvalidCredentials),
            ("INVALID_LOGIN_CREDENTIALS", AuthError::InvalidCredentials),
            ("auth/wrong-password", AuthError::InvalidCredentials),
            ("EMAIL_NOT_FOUND", AuthError::AccountNotFound),
            (
                "There is no user record corresponding to this identifier.",
                AuthError::AccountNotFound,
            ),
            ("EMAIL_EXISTS", AuthError::AccountAlreadyExists),
            (
                "The email address is already in use by another account.",
                AuthError::AccountAlreadyExists,
            ),
            (
                "A network error (such as timeout) has occurred",
                AuthError::NetworkUnavailable,
            ),
            (
                "INVALID_EMAIL",
                AuthError::ValidationFailed(ValidationReason::InvalidEmail),
            ),
            (
                "WEAK_PASSWORD : Password should be at least 6 characters",
                AuthError::ValidationFailed(ValidationReason::WeakPassword),
            ),
        ];
        for (detail, expected) in cases {
            assert_eq!(classify(&rejected(detail)), expected, "detail: {detail}");
        }
    }

    #[test]
    fn unmatched_is_unknown() {
        match classify(&rejected("QUOTA_EXCEEDED")) {
            AuthError::Unknown(detail) => assert_eq!(detail, "quota_exceeded"),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }
}
