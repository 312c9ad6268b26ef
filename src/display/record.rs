//! Record display formatting
//!
//! Formats record listings and decrypted payloads for terminal output.

use crate::models::record::TIMESTAMP_FORMAT;
use crate::models::{DecryptedPayload, RecordKind, RecordSummary};

/// Characters of text shown when a payload is previewed
pub const PREVIEW_CHARS: usize = 500;

/// Human-readable byte count, e.g. `1.5 MB`
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a list of records as a table
pub fn format_record_list(summaries: &[RecordSummary]) -> String {
    if summaries.is_empty() {
        return "No stored data found.".to_string();
    }

    let label_width = summaries
        .iter()
        .map(|s| s.label.chars().count())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<label_width$}  {:<4}  {:<19}  {:>10}  {}\n",
        "Label",
        "Type",
        "Created",
        "Size",
        "File",
        label_width = label_width,
    ));

    output.push_str(&format!(
        "{:-<label_width$}  {:-<4}  {:-<19}  {:->10}  {:-<20}\n",
        "",
        "",
        "",
        "",
        "",
        label_width = label_width,
    ));

    for summary in summaries {
        let (size, file) = match &summary.file_meta {
            Some(meta) => (
                format_file_size(meta.size_bytes),
                format!("{} ({})", meta.original_name, meta.mime_type),
            ),
            None => (String::new(), String::new()),
        };

        output.push_str(&format!(
            "{:<label_width$}  {:<4}  {:<19}  {:>10}  {}\n",
            summary.label,
            summary.kind,
            summary.created_at.format(TIMESTAMP_FORMAT).to_string(),
            size,
            file,
            label_width = label_width,
        ));
    }

    output.push_str(&format!("\n{} record(s)\n", summaries.len()));
    output
}

/// Format a decrypted payload for the terminal
///
/// Text is shown in full. Files show their metadata and, when text-like, a
/// preview; binary content is never written to the terminal.
pub fn format_payload(payload: &DecryptedPayload) -> String {
    let mut output = String::new();
    output.push_str(&format!("Record: {}\n", payload.label));

    match payload.kind {
        RecordKind::Text => {
            output.push_str("  Type:     TEXT\n\n");
            match payload.as_text() {
                Ok(text) => output.push_str(text),
                Err(e) => output.push_str(&e.to_string()),
            }
            output.push('\n');
        }
        RecordKind::File => {
            output.push_str("  Type:     FILE\n");
            if let Some(meta) = &payload.file_meta {
                output.push_str(&format!("  Filename: {}\n", meta.original_name));
                output.push_str(&format!("  MIME:     {}\n", meta.mime_type));
                output.push_str(&format!("  Size:     {}\n", format_file_size(meta.size_bytes)));
            }
            match payload.text_preview(PREVIEW_CHARS) {
                Some(preview) => {
                    output.push_str("\nPreview:\n");
                    output.push_str(&preview);
                    output.push('\n');
                }
                None => output.push_str("\nBinary content, use --out to save it.\n"),
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EncryptedRecord, FileMeta};

    #[test]
    fn test_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(200 * 1024 * 1024), "200.0 MB");
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_record_list(&[]), "No stored data found.");
    }

    #[test]
    fn test_record_list() {
        let text = EncryptedRecord::text("tok".into(), "h".into());
        let file = EncryptedRecord::file(
            "tok".into(),
            "h".into(),
            FileMeta::new("a.png", Some("image/png"), 2048),
        );
        let summaries = vec![
            RecordSummary::from_record("note1", &text),
            RecordSummary::from_record("photo", &file),
        ];

        let output = format_record_list(&summaries);
        assert!(output.contains("note1"));
        assert!(output.contains("TEXT"));
        assert!(output.contains("a.png (image/png)"));
        assert!(output.contains("2.0 KB"));
        assert!(output.contains("2 record(s)"));
    }

    #[test]
    fn test_binary_payload_not_printed() {
        let payload = DecryptedPayload {
            label: "img".into(),
            kind: RecordKind::File,
            bytes: vec![0, 159, 146, 150],
            file_meta: Some(FileMeta::new("a.bin", None, 4)),
        };
        let output = format_payload(&payload);
        assert!(output.contains("application/octet-stream"));
        assert!(output.contains("Binary content"));
    }

    #[test]
    fn test_text_payload() {
        let payload = DecryptedPayload {
            label: "note1".into(),
            kind: RecordKind::Text,
            bytes: b"hello".to_vec(),
            file_meta: None,
        };
        assert!(format_payload(&payload).ends_with("hello\n"));
    }
}
