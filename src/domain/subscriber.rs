use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::EmailAddress;
use super::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Active,
    Inactive,
}

impl SubscriberStatus {
    pub fn parse(status: &str) -> Result<Self, ValidationError> {
        match status.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(ValidationError::Invalid(format!(
                "{other:?} is not a valid subscriber status (expected active or inactive)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// A newsletter recipient. `email` is unique across all subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: EmailAddress,
    pub status: SubscriberStatus,
    pub subscribed_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn new(
        email: EmailAddress,
        status: SubscriberStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            status,
            subscribed_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool { self.status == SubscriberStatus::Active }
}
