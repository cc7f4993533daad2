use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::validate_length;
use super::validate_required;
use super::EmailAddress;
use super::PersonName;
use super::ValidationError;

const MAX_SUBJECT_LENGTH: usize = 200;
const MAX_MESSAGE_LENGTH: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Unread,
    Read,
}

impl MessageStatus {
    pub fn parse(status: &str) -> Result<Self, ValidationError> {
        match status.trim().to_lowercase().as_str() {
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            other => Err(ValidationError::Invalid(format!(
                "{other:?} is not a valid message status (expected read or unread)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
        }
    }
}

/// Raw contact form submission. Every field is optional here so that missing
/// fields can be reported together instead of failing on the first one.
#[derive(Debug, Default, Deserialize)]
pub struct NewContactMessage {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: EmailAddress,
    pub subject: String,
    pub message: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NewContactMessage> for ContactMessage {
    type Error = ValidationError;

    fn try_from(form: NewContactMessage) -> Result<Self, Self::Error> {
        validate_required(&[
            ("first_name", form.first_name.as_deref()),
            ("last_name", form.last_name.as_deref()),
            ("email", form.email.as_deref()),
            ("subject", form.subject.as_deref()),
            ("message", form.message.as_deref()),
        ])?;

        // all present, checked above
        let subject = form.subject.unwrap_or_default().trim().to_string();
        let message = form.message.unwrap_or_default().trim().to_string();
        validate_length("subject", &subject, MAX_SUBJECT_LENGTH)?;
        validate_length("message", &message, MAX_MESSAGE_LENGTH)?;

        Ok(Self {
            id: Uuid::new_v4(),
            first_name: PersonName::parse("first_name", form.first_name.unwrap_or_default())?,
            last_name: PersonName::parse("last_name", form.last_name.unwrap_or_default())?,
            email: EmailAddress::parse(form.email.unwrap_or_default())?,
            subject,
            message,
            status: MessageStatus::Unread,
            created_at: Utc::now(),
        })
    }
}
