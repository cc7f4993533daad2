use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::ValidationError;

/// Selection rule deciding which subscribers a send is counted (and delivered)
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientsFilter {
    /// every subscriber, regardless of status
    All,
    Active,
    /// a caller-supplied list of addresses
    Custom,
}

impl RecipientsFilter {
    pub fn parse(filter: &str) -> Result<Self, ValidationError> {
        match filter.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "custom" => Ok(Self::Custom),
            other => Err(ValidationError::Invalid(format!(
                "{other:?} is not a valid recipients filter (expected all, active or custom)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Custom => "custom",
        }
    }
}

/// A sent newsletter issue. `sent_count` is a snapshot taken at send time, not
/// a live view of the subscriber table; the record is never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Newsletter {
    pub id: Uuid,
    pub topic: String,
    pub body: String,
    pub recipients: RecipientsFilter,
    pub sent_at: DateTime<Utc>,
    pub sent_count: i64,
}

/// Raw send request. `recipients` defaults to `all`; `custom_recipients` is
/// only read for `custom` sends.
#[derive(Debug, Default, Deserialize)]
pub struct NewNewsletter {
    pub topic: Option<String>,
    pub body: Option<String>,
    pub recipients: Option<String>,
    pub custom_recipients: Option<Vec<String>>,
}
