//! Catalog hierarchy: Department > Semester > Subject > Resource.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A department owning an ordered list of semesters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub semesters: Vec<Semester>,
}

/// A semester within a department. The name usually carries a numeral used for ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

/// A subject within a semester.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// A study resource. The id is assigned by the remote backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: u64,
    pub title: String,
    pub content: ResourceContent,
}

impl Resource {
    /// URL a reader can open, if one can be resolved.
    ///
    /// Blob resources that have no direct URL yet resolve to `None`.
    pub fn resolved_url(&self) -> Option<String> {
        self.content.resolved_url()
    }
}

/// Resource payload: an external link or an uploaded blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResourceContent {
    Url {
        url: String,
    },
    ExternalBlob {
        #[serde(rename = "externalBlob")]
        blob: ExternalBlob,
    },
}

impl ResourceContent {
    pub fn url(url: impl Into<String>) -> Self {
        ResourceContent::Url { url: url.into() }
    }

    pub fn blob(blob: ExternalBlob) -> Self {
        ResourceContent::ExternalBlob { blob }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResourceContent::Url { .. } => "url",
            ResourceContent::ExternalBlob { .. } => "externalBlob",
        }
    }

    pub fn resolved_url(&self) -> Option<String> {
        match self {
            ResourceContent::Url { url } => Some(url.clone()),
            ResourceContent::ExternalBlob { blob } => match blob.direct_url() {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    tracing::debug!("Blob URL unavailable: {}", e);
                    None
                }
            },
        }
    }
}

/// Errors raised by blob accessors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BlobError {
    #[error("blob has not been uploaded and has no direct URL")]
    NotUploaded,
}

/// Callback receiving upload progress as a percentage in `0..=100`.
pub type UploadProgress = Arc<dyn Fn(u8) + Send + Sync>;

/// Externally stored blob: a byte payload plus the direct URL the storage layer resolves it to.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalBlob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    direct_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    bytes: Vec<u8>,
    #[serde(skip)]
    on_progress: Option<UploadProgress>,
}

impl ExternalBlob {
    /// Blob already stored and addressable by `url`.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            direct_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Blob awaiting upload.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Self::default()
        }
    }

    /// Attach a progress callback invoked while the blob is uploaded.
    pub fn with_upload_progress(mut self, on_progress: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn direct_url(&self) -> Result<&str, BlobError> {
        self.direct_url.as_deref().ok_or(BlobError::NotUploaded)
    }

    pub fn is_uploaded(&self) -> bool {
        self.direct_url.is_some()
    }

    /// Record where the storage layer placed the blob. Uploaded blobs stop reporting progress.
    pub fn mark_uploaded(&mut self, url: impl Into<String>) {
        self.direct_url = Some(url.into());
        self.on_progress = None;
    }

    /// Forward an upload percentage to the attached callback, clamped to 100.
    pub fn report_progress(&self, percentage: u8) {
        if let Some(on_progress) = &self.on_progress {
            on_progress(percentage.min(100));
        }
    }
}

impl fmt::Debug for ExternalBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalBlob")
            .field("direct_url", &self.direct_url)
            .field("bytes", &self.bytes.len())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl PartialEq for ExternalBlob {
    fn eq(&self, other: &Self) -> bool {
        self.direct_url == other.direct_url && self.bytes == other.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_content_serializes_with_kind_tag() {
        let url = serde_json::to_value(ResourceContent::url("https://example.com/a.pdf")).unwrap();
        assert_eq!(url["kind"], "url");
        assert_eq!(url["url"], "https://example.com/a.pdf");

        let blob = serde_json::to_value(ResourceContent::blob(ExternalBlob::from_url(
            "https://cdn.example.com/b",
        )))
        .unwrap();
        assert_eq!(blob["kind"], "externalBlob");
        assert_eq!(blob["externalBlob"]["directUrl"], "https://cdn.example.com/b");
    }

    #[test]
    fn test_department_deserializes_without_children() {
        let dept: Department = serde_json::from_str(r#"{"id":"cse","name":"Computer Science"}"#).unwrap();
        assert!(dept.semesters.is_empty());
    }

    #[test]
    fn test_unuploaded_blob_has_no_url() {
        let blob = ExternalBlob::from_bytes(vec![1, 2, 3]);
        assert_eq!(blob.direct_url(), Err(BlobError::NotUploaded));
        assert_eq!(ResourceContent::blob(blob).resolved_url(), None);
    }

    #[test]
    fn test_progress_is_forwarded_and_clamped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let blob = ExternalBlob::from_bytes(vec![0; 4])
            .with_upload_progress(move |pct| sink.lock().unwrap().push(pct));

        blob.report_progress(40);
        blob.report_progress(250);

        assert_eq!(*seen.lock().unwrap(), vec![40, 100]);
    }
}
