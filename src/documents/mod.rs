//! Attachments: upload allow-list, MIME guessing and extraction payloads.
//!
//! Text extraction itself happens on the backend; this module only decides
//! what may be sent and describes what comes back.

pub mod extract;
pub mod schema;

pub use extract::{is_allowed, partition_uploads, read_upload, ALLOWED_EXTENSIONS};
pub use schema::{DocumentUpload, ExtractResponse, ExtractedFileInfo, UploadOutcome, UploadedFile};
