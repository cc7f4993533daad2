use serde::Serialize;

use super::validate_email;
use super::validate_length;
use super::ValidationError;

/// Column width of every email column in the schema
const MAX_EMAIL_LENGTH: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A parsed email address, used for subscribers, contact form senders, and the
/// sender of outgoing mail alike.
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(email: String) -> Result<Self, ValidationError> {
        let email = email.trim().to_string();
        if !validate_email(&email) {
            return Err(ValidationError::Invalid(
                "Please provide a valid email address".to_string(),
            ));
        }
        validate_length("email", &email, MAX_EMAIL_LENGTH)?;
        Ok(Self(email))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
