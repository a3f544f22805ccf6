// worksheet-gen: printable classroom worksheets (math drills, word problems,
// word searches, handwriting practice and quizzes) rendered as PDF and Word.

pub mod assets;
pub mod config;
pub mod error;
pub mod extract;
pub mod handwriting;
pub mod layout;
pub mod math;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod render;
pub mod service;
pub mod wordsearch;
pub mod worksheet;

pub use error::{AppError, ExtractError, ProviderError};
pub use render::{DocumentRenderer, DocxRenderer, OutputFormat, PdfRenderer, RenderedDocument};
pub use service::{ContentSource, GenerationOutcome, Subject, WorksheetRequest, WorksheetService};
pub use worksheet::{ContentKind, Worksheet, WorksheetContent};
