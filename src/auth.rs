//! Input checks for the login and registration forms.
//!
//! These run before any request is made; a failure never reaches the
//! backend.

use crate::error::ClientError;
use crate::models::{Credentials, Registration};

/// Shortest password either form accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_credentials(credentials: &Credentials) -> Result<(), ClientError> {
    let email = credentials.email.trim();
    if email.is_empty() {
        return Err(ClientError::validation("Email is required"));
    }
    if !looks_like_email(email) {
        return Err(ClientError::validation("Invalid email address"));
    }
    if credentials.password.is_empty() {
        return Err(ClientError::validation("Password is required"));
    }
    check_password_length(&credentials.password)
}

pub fn validate_registration(registration: &Registration) -> Result<(), ClientError> {
    if registration.name.trim().is_empty()
        || registration.email.trim().is_empty()
        || registration.password.is_empty()
    {
        return Err(ClientError::validation("Please fill in all fields"));
    }
    if !looks_like_email(registration.email.trim()) {
        return Err(ClientError::validation("Invalid email address"));
    }
    check_password_length(&registration.password)
}

fn check_password_length(password: &str) -> Result<(), ClientError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

// one '@' with something on both sides, and a dot in the domain
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn message(result: Result<(), ClientError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn login_requires_both_fields() {
        assert_eq!(message(validate_credentials(&credentials("", "secret1"))), "Email is required");
        assert_eq!(
            message(validate_credentials(&credentials("a@b.io", ""))),
            "Password is required"
        );
    }

    #[test]
    fn login_rejects_short_passwords_and_bad_emails() {
        assert_eq!(
            message(validate_credentials(&credentials("a@b.io", "12345"))),
            "Password must be at least 6 characters"
        );
        assert_eq!(
            message(validate_credentials(&credentials("not-an-email", "123456"))),
            "Invalid email address"
        );
        assert!(validate_credentials(&credentials("ada@clinic.org", "123456")).is_ok());
    }

    #[test]
    fn registration_requires_every_field() {
        let registration = Registration {
            name: "  ".to_string(),
            email: "ada@clinic.org".to_string(),
            password: "hunter22".to_string(),
            role: Role::Patient,
        };
        assert_eq!(message(validate_registration(&registration)), "Please fill in all fields");

        let registration = Registration {
            name: "Ada".to_string(),
            ..registration
        };
        assert!(validate_registration(&registration).is_ok());
    }
}
