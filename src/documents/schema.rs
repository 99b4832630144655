use serde::{Deserialize, Serialize};

/// An attachment tracked by the realtime controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    /// Local size until extraction completes, then the server-reported byte count.
    pub size: u64,
    /// Extracted text. The backend answers per batch, so every file of a
    /// batch carries the same text.
    pub content: String,
    pub batch: u64,
}

/// A file selected for upload (the bytes themselves, not the tracked entry).
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = super::extract::guess_mime_type(&name);
        Self {
            name,
            mime_type,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Per-file metadata reported by the extraction endpoint. Both fields are
/// advisory; the local size stands in when `bytes` is missing or unusable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFileInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bytes: Option<f64>,
}

impl ExtractedFileInfo {
    pub fn byte_count(&self) -> Option<u64> {
        self.bytes
            .filter(|b| b.is_finite() && *b >= 0.0)
            .map(|b| b.round() as u64)
    }
}

/// Response of `POST /api/extract_text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    #[serde(default)]
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<ExtractedFileInfo>>,
}

/// What happened to a batch handed to the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Files that passed the extension allow-list and were sent.
    pub accepted: Vec<String>,
    /// Files dropped by the allow-list.
    pub skipped: Vec<String>,
    /// Set when the extraction request failed; the previous document text is kept.
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.accepted.is_empty()
    }
}
