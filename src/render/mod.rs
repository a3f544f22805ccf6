// Document backends. Both read the same `Worksheet` and print the same
// labels, so a PDF and a Word copy of one sheet carry the same information.

pub mod docx;
pub mod pdf;

use serde::Serialize;

use crate::error::AppError;
use crate::worksheet::Worksheet;

pub use self::docx::DocxRenderer;
pub use self::pdf::PdfRenderer;

// ============================================================================
// Shared Labels
// ============================================================================

pub const NAME_LINE: &str = "Name: ______________________";
pub const DATE_LINE: &str = "Date: ______________";
pub const SCAN_CAPTION: &str = "Scan for Answers";
pub const FIND_WORDS_HEADING: &str = "Find these words:";
const FOOTER_BRAND: &str = "Generated by worksheet-gen";

pub fn question_label(index: usize, question: &str) -> String {
    format!("{}. {}", index + 1, question)
}

pub fn answer_label(index: usize, answer: &str) -> String {
    format!("{}) {}", index + 1, answer)
}

pub fn answer_key_heading(title: &str) -> String {
    format!("ANSWER KEY: {}", title)
}

pub fn topic_line(topic: &str) -> String {
    format!("Topic: {}", topic)
}

pub fn id_line(id: &str) -> String {
    format!("ID: {}", id)
}

pub fn footer_text(worksheet: &Worksheet) -> String {
    format!("{} on {}", FOOTER_BRAND, worksheet.created.format("%Y-%m-%d"))
}

// ============================================================================
// Renderer Seam
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputFormat {
    Pdf,
    Docx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    pub fn file_extension(&self) -> &'static str {
        self.format.extension()
    }
}

pub trait DocumentRenderer {
    fn format(&self) -> OutputFormat;

    /// Renders the whole sheet (header, body, answer key) into file bytes.
    fn render(&self, worksheet: &Worksheet) -> Result<Vec<u8>, AppError>;

    fn render_document(&self, worksheet: &Worksheet) -> Result<RenderedDocument, AppError> {
        let bytes = self.render(worksheet)?;
        tracing::info!(
            format = self.format().extension(),
            bytes = bytes.len(),
            kind = worksheet.content.kind().label(),
            "rendered worksheet"
        );
        Ok(RenderedDocument {
            format: self.format(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_across_backends() {
        assert_eq!(question_label(0, "2 + 3 = ____"), "1. 2 + 3 = ____");
        assert_eq!(answer_label(4, "5"), "5) 5");
        assert_eq!(answer_key_heading("Fractions"), "ANSWER KEY: Fractions");
    }

    #[test]
    fn formats_know_their_extension() {
        assert_eq!(OutputFormat::Pdf.extension(), "pdf");
        assert_eq!(OutputFormat::Docx.extension(), "docx");
        assert!(OutputFormat::Docx.mime_type().contains("wordprocessingml"));
    }
}
