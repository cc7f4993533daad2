use std::collections::HashSet;

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use super::ValidationError;

/// First or last name of a contact form sender. Rejects empty/whitespace,
/// enforces the column width, and rejects some problematic characters.
///
/// Must be instantiated with `PersonName::parse`; the field is private to
/// prevent bypassing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonName(String);

impl PersonName {
    const MAX_LENGTH: usize = 100;

    pub fn parse(
        field: &str,
        name: String,
    ) -> Result<Self, ValidationError> {
        let name = name.trim().to_string();
        let empty = name.is_empty();
        let too_long = name.graphemes(true).count() > Self::MAX_LENGTH;
        let bad_chars: HashSet<char> = r#"/()"<>\{}"#.chars().collect();
        let bad = name.chars().any(|c| bad_chars.contains(&c));
        match !empty && !too_long && !bad {
            true => Ok(Self(name)),
            false => Err(ValidationError::Invalid(format!("Invalid {field}: {name:?}"))),
        }
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str { &self.0 }
}
