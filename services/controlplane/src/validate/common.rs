//! Shared field validators: names, URLs, bucket names, metadata.
use crate::model::Metadata;
use crate::validate::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

// Downstream consumers truncate names further, so the bound is tighter than
// the generic 63-character label limit.
pub(crate) const MAX_NAME_LENGTH: usize = 22;

static NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-z]([-a-z0-9]{0,61}[a-z0-9])?$").expect("name pattern must compile")
});

static BUCKET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    // Lowercase letters, digits, dots and hyphens; covers both s3 bucket and
    // azure container names.
    Regex::new(r"^[a-z0-9.\-]{3,63}$").expect("bucket pattern must compile")
});

/// Restricted DNS-label check: lowercase alphanumerics or '-', starting with
/// an alphabetic character, ending alphanumeric, at most 22 characters.
pub(crate) fn validate_name_label(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::Structural(format!(
            "'{field}' can be at most {MAX_NAME_LENGTH} characters long"
        )));
    }
    if !NAME_LABEL.is_match(value) {
        return Err(ValidationError::Structural(format!(
            "'{field}' should contain only lowercase alphanumeric characters or '-', \
             start with an alphabetic character and end with an alphanumeric character"
        )));
    }
    Ok(())
}

pub(crate) fn validate_url_field(value: &str, field: &str) -> Result<(), ValidationError> {
    if url::Url::parse(value).is_err() {
        return Err(ValidationError::Structural(format!(
            "'{field}' is an invalid URL"
        )));
    }
    Ok(())
}

pub(crate) fn validate_bucket_name(value: &str) -> Result<(), ValidationError> {
    if !BUCKET_NAME.is_match(value) {
        return Err(ValidationError::Structural("invalid bucketName".to_string()));
    }
    Ok(())
}

/// Update payloads must carry well-formed identity metadata; a present
/// resourceVersion must be numeric.
pub(crate) fn validate_metadata(metadata: &Metadata) -> Result<(), ValidationError> {
    if metadata.name.is_empty() {
        return Err(ValidationError::Structural(
            "metadata.name should not be empty".to_string(),
        ));
    }
    if metadata.namespace.is_empty() {
        return Err(ValidationError::Structural(
            "metadata.namespace should not be empty".to_string(),
        ));
    }
    if let Some(version) = &metadata.resource_version
        && version.parse::<u64>().is_err()
    {
        return Err(ValidationError::Structural(
            "invalid 'resourceVersion' value".to_string(),
        ));
    }
    Ok(())
}
