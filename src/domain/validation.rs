use unicode_segmentation::UnicodeSegmentation;
use validator::ValidateEmail;

/// Everything a caller can fix by resubmitting different input.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("{0}")]
    Invalid(String),
}

/// Full email-grammar check (RFC 5322 as implemented by `validator`). Anything
/// accepted here also contains both an `@` and a `.`.
pub fn validate_email(candidate: &str) -> bool {
    // dotless domains (`foo@localhost`) are valid per grammar, but useless for a
    // newsletter
    let domain_has_dot = candidate
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.'));
    domain_has_dot && ValidateEmail::validate_email(&candidate.to_string())
}

/// Fail with every field (in input order) that is absent or blank.
pub fn validate_required(fields: &[(&str, Option<&str>)]) -> Result<(), ValidationError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name.to_string())
        .collect();

    match missing.is_empty() {
        true => Ok(()),
        false => Err(ValidationError::MissingFields(missing)),
    }
}

/// Length is counted in graphemes, so "é" (e + combining accent) counts as one.
pub fn validate_length(
    field: &str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    match value.graphemes(true).count() > max {
        true => Err(ValidationError::Invalid(format!(
            "{field} must be at most {max} characters long"
        ))),
        false => Ok(()),
    }
}
