// Plain-text extraction from uploaded documents (quiz source material)

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Docx,
    Text,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(SourceKind::Pdf),
            "docx" => Ok(SourceKind::Docx),
            "txt" | "md" => Ok(SourceKind::Text),
            _ => Err(ExtractError::UnsupportedType(path.display().to_string())),
        }
    }
}

pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let kind = SourceKind::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let text = extract_text_from_bytes(&bytes, kind)?;
    debug!(path = %path.display(), chars = text.chars().count(), "extracted document text");
    Ok(text)
}

pub fn extract_text_from_bytes(bytes: &[u8], kind: SourceKind) -> Result<String, ExtractError> {
    let text = match kind {
        SourceKind::Text => String::from_utf8_lossy(bytes).into_owned(),
        SourceKind::Pdf => pdf_text(bytes)?,
        SourceKind::Docx => docx_text(bytes)?,
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text)
}

fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Paragraph text of a .docx file, one paragraph per line. Table cell
/// paragraphs are included in document order.
pub fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Docx(format!("{:?}", e)))?;
    let tree: Value = serde_json::from_str(&docx.json()).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut paragraphs = Vec::new();
    collect_paragraphs(tree.get("document").unwrap_or(&tree), &mut paragraphs);
    Ok(paragraphs.join("\n"))
}

// The docx-rs JSON tree tags every node as {"type": ..., "data": {...}}.
fn collect_paragraphs(node: &Value, out: &mut Vec<String>) {
    match node {
        Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("paragraph") => {
            let mut text = String::new();
            collect_text(&map["data"], &mut text);
            if !text.trim().is_empty() {
                out.push(text);
            }
        }
        Value::Object(map) => map.values().for_each(|v| collect_paragraphs(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_paragraphs(v, out)),
        _ => {}
    }
}

fn collect_text(node: &Value, out: &mut String) {
    match node {
        Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("text") => {
            if let Some(text) = map.get("data").and_then(|d| d.get("text")).and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        Value::Object(map) => map.values().for_each(|v| collect_text(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Cursor;

    #[test]
    fn source_kind_by_extension() {
        assert_eq!(SourceKind::from_path(Path::new("notes.PDF")).unwrap(), SourceKind::Pdf);
        assert_eq!(SourceKind::from_path(Path::new("a/b.docx")).unwrap(), SourceKind::Docx);
        assert_eq!(SourceKind::from_path(Path::new("story.txt")).unwrap(), SourceKind::Text);
        assert!(matches!(
            SourceKind::from_path(Path::new("sheet.xlsx")),
            Err(ExtractError::UnsupportedType(_))
        ));
    }

    #[test]
    fn plain_text_is_trimmed() {
        let text = extract_text_from_bytes(b"  The sun is a star.  \n", SourceKind::Text).unwrap();
        assert_eq!(text, "The sun is a star.");
    }

    #[test]
    fn blank_text_is_an_error() {
        assert!(matches!(extract_text_from_bytes(b" \n\t", SourceKind::Text), Err(ExtractError::Empty)));
    }

    #[test]
    fn garbage_pdf_is_an_error() {
        assert!(matches!(extract_text_from_bytes(b"not a pdf", SourceKind::Pdf), Err(ExtractError::Pdf(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = extract_text(Path::new("does/not/exist.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Read { .. }));
    }

    #[test]
    fn docx_paragraphs_round_trip() {
        let mut buf = Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Plants need light.")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Roots take in water.")))
            .build()
            .pack(&mut buf)
            .unwrap();

        let text = extract_text_from_bytes(&buf.into_inner(), SourceKind::Docx).unwrap();
        assert_eq!(text, "Plants need light.\nRoots take in water.");
    }
}
