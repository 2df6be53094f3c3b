//! Local validation for the sign-in and sign-up forms. Runs before any network call.

use secrecy::{ExposeSecret, SecretString};

use crate::error::ValidationReason;

/// Sign-in input that passed local checks.
#[derive(Debug)]
pub struct SignInInput {
    pub email: String,
    pub password: SecretString,
}

/// Sign-up input that passed local checks, whitespace-trimmed.
#[derive(Debug)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

/// Both fields must be non-blank. Trimmed the same way as sign-up.
pub fn validate_sign_in(email: &str, password: &SecretString) -> Result<SignInInput, ValidationReason> {
    let email = email.trim();
    let password = password.expose_secret().trim();
    if email.is_empty() || password.is_empty() {
        return Err(ValidationReason::MissingCredentials);
    }
    Ok(SignInInput {
        email: email.to_string(),
        password: SecretString::from(password.to_string()),
    })
}

/// Checks run in order: all present, long enough, confirmation matches.
pub fn validate_sign_up(
    name: &str,
    email: &str,
    password: &SecretString,
    confirm_password: &SecretString,
    min_password_len: usize,
) -> Result<SignUpInput, ValidationReason> {
    let name = name.trim();
    let email = email.trim();
    let password = password.expose_secret().trim();
    let confirm = confirm_password.expose_secret().trim();

    if name.is_empty() || email.is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(ValidationReason::MissingFields);
    }
    if password.chars().count() < min_password_len {
        return Err(ValidationReason::PasswordTooShort {
            min: min_password_len,
        });
    }
    if password != confirm {
        return Err(ValidationReason::PasswordMismatch);
    }

    Ok(SignUpInput {
        name: name.to_string(),
        email: email.to_string(),
        password: SecretString::from(password.to_string()),
    })
}
