use super::schema::DocumentUpload;
use anyhow::{Context, Result};
use std::path::Path;

/// Extensions the extraction endpoint understands.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".docx", ".xlsx"];

/// Upper bound for a single attachment read from disk (20MB).
const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

pub fn is_allowed(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Split a batch into (accepted, skipped names), preserving order.
pub fn partition_uploads(files: Vec<DocumentUpload>) -> (Vec<DocumentUpload>, Vec<String>) {
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();
    for file in files {
        if is_allowed(&file.name) {
            accepted.push(file);
        } else {
            skipped.push(file.name);
        }
    }
    (accepted, skipped)
}

/// Guess MIME type from filename extension.
pub fn guess_mime_type(filename: &str) -> String {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Read an attachment from disk for upload.
pub async fn read_upload(path: &Path) -> Result<DocumentUpload> {
    let meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    if meta.len() > MAX_UPLOAD_BYTES {
        anyhow::bail!(
            "{} is {} bytes, larger than the {} byte upload limit",
            path.display(),
            meta.len(),
            MAX_UPLOAD_BYTES
        );
    }
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    Ok(DocumentUpload::new(name, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_case_insensitive() {
        assert!(is_allowed("report.docx"));
        assert!(is_allowed("BUDGET.XLSX"));
        assert!(!is_allowed("scan.pdf"));
        assert!(!is_allowed("docx"));
    }

    #[test]
    fn partition_drops_other_types() {
        let batch = vec![
            DocumentUpload::new("a.pdf", vec![1]),
            DocumentUpload::new("b.docx", vec![2]),
            DocumentUpload::new("c.xlsx", vec![3]),
        ];
        let (accepted, skipped) = partition_uploads(batch);
        let names: Vec<_> = accepted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b.docx", "c.xlsx"]);
        assert_eq!(skipped, ["a.pdf"]);
    }

    #[test]
    fn office_mime_types() {
        assert!(guess_mime_type("x.docx").contains("wordprocessingml"));
        assert!(guess_mime_type("x.xlsx").contains("spreadsheetml"));
        assert_eq!(guess_mime_type("x"), "application/octet-stream");
    }

    #[tokio::test]
    async fn read_upload_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.docx");
        std::fs::write(&path, b"PK\x03\x04").unwrap();
        let upload = read_upload(&path).await.unwrap();
        assert_eq!(upload.name, "memo.docx");
        assert_eq!(upload.size(), 4);
    }
}
