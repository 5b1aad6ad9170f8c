//! Input checks run before any remote call.

use url::Url;

use crate::models::ResourceContent;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("'{0}' is not a valid URL")]
    InvalidUrl(String),
    #[error("uploaded file is empty")]
    EmptyBlob,
}

/// Trimmed value of a required field.
pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

/// Content with a trimmed, absolute URL or a blob that has something to upload.
pub fn validate_content(content: &ResourceContent) -> Result<ResourceContent, ValidationError> {
    match content {
        ResourceContent::Url { url } => {
            let url = require("URL", url)?;
            Url::parse(url).map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;
            Ok(ResourceContent::url(url))
        }
        ResourceContent::ExternalBlob { blob } => {
            match blob.direct_url() {
                Ok(url) => {
                    Url::parse(url).map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;
                }
                Err(_) if blob.bytes().is_empty() => return Err(ValidationError::EmptyBlob),
                Err(_) => {}
            }
            Ok(content.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExternalBlob;

    #[test]
    fn test_require_trims() {
        assert_eq!(require("Name", "  CSE "), Ok("CSE"));
        assert_eq!(require("Name", "   "), Err(ValidationError::MissingField("Name")));
    }

    #[test]
    fn test_url_must_parse() {
        assert_eq!(
            validate_content(&ResourceContent::url("not-a-url")),
            Err(ValidationError::InvalidUrl("not-a-url".into()))
        );
        assert_eq!(
            validate_content(&ResourceContent::url(" https://example.com/notes.pdf ")),
            Ok(ResourceContent::url("https://example.com/notes.pdf"))
        );
        assert_eq!(
            validate_content(&ResourceContent::url("")),
            Err(ValidationError::MissingField("URL"))
        );
    }

    #[test]
    fn test_blob_needs_payload_or_url() {
        let empty = ResourceContent::blob(ExternalBlob::from_bytes(Vec::new()));
        assert_eq!(validate_content(&empty), Err(ValidationError::EmptyBlob));

        let stored = ResourceContent::blob(ExternalBlob::from_url("https://cdn.example.com/x"));
        assert!(validate_content(&stored).is_ok());
    }

    #[test]
    fn test_stored_blob_url_must_parse() {
        let stored = ResourceContent::blob(ExternalBlob::from_url("not-a-url"));
        assert_eq!(
            validate_content(&stored),
            Err(ValidationError::InvalidUrl("not-a-url".into()))
        );
    }
}
