// Worksheet data model shared by the generators and both renderers

use ::image::DynamicImage;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::wordsearch::WordSearchPuzzle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentKind {
    MathQuestions,
    WordProblems,
    WordSearch,
    TracingLines,
    Quiz,
}

impl ContentKind {
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::MathQuestions => "Math Questions",
            ContentKind::WordProblems => "Word Problems",
            ContentKind::WordSearch => "Word Search",
            ContentKind::TracingLines => "Handwriting Practice",
            ContentKind::Quiz => "Quiz",
        }
    }

    /// Used in default output file names
    pub fn slug(self) -> &'static str {
        match self {
            ContentKind::MathQuestions => "math",
            ContentKind::WordProblems => "word-problems",
            ContentKind::WordSearch => "word-search",
            ContentKind::TracingLines => "tracing",
            ContentKind::Quiz => "quiz",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum WorksheetContent {
    MathQuestions { questions: Vec<String>, answers: Vec<String> },
    WordProblems { questions: Vec<String>, answers: Vec<String> },
    WordSearch(WordSearchPuzzle),
    TracingLines { lines: Vec<String> },
    Quiz { questions: Vec<String>, answers: Vec<String> },
}

impl WorksheetContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            WorksheetContent::MathQuestions { .. } => ContentKind::MathQuestions,
            WorksheetContent::WordProblems { .. } => ContentKind::WordProblems,
            WorksheetContent::WordSearch(_) => ContentKind::WordSearch,
            WorksheetContent::TracingLines { .. } => ContentKind::TracingLines,
            WorksheetContent::Quiz { .. } => ContentKind::Quiz,
        }
    }

    /// Display strings of the body: questions, tracing lines, or the words to find.
    pub fn items(&self) -> &[String] {
        match self {
            WorksheetContent::MathQuestions { questions, .. }
            | WorksheetContent::WordProblems { questions, .. }
            | WorksheetContent::Quiz { questions, .. } => questions,
            WorksheetContent::WordSearch(puzzle) => &puzzle.placed_words,
            WorksheetContent::TracingLines { lines } => lines,
        }
    }

    /// Answer key entries. Word searches list where each word starts;
    /// tracing sheets have none.
    pub fn answers(&self) -> Vec<String> {
        match self {
            WorksheetContent::MathQuestions { answers, .. }
            | WorksheetContent::WordProblems { answers, .. }
            | WorksheetContent::Quiz { answers, .. } => answers.clone(),
            WorksheetContent::WordSearch(puzzle) => puzzle
                .placements
                .iter()
                .map(|p| format!("{} - row {}, column {}, {}", p.word, p.row + 1, p.col + 1, p.direction.label()))
                .collect(),
            WorksheetContent::TracingLines { .. } => Vec::new(),
        }
    }
}

/// Everything a renderer needs. Rendering is a pure function of this value.
#[derive(Debug, Clone)]
pub struct Worksheet {
    pub title: String,
    pub school_name: String,
    pub topic: Option<String>,
    pub content: WorksheetContent,
    pub qr_url: Option<String>,
    pub logo: Option<DynamicImage>,
    pub worksheet_id: String,
    pub created: NaiveDate,
}

impl Worksheet {
    pub fn new(title: impl Into<String>, school_name: impl Into<String>, content: WorksheetContent) -> Self {
        Self {
            title: title.into(),
            school_name: school_name.into(),
            topic: None,
            content,
            qr_url: None,
            logo: None,
            worksheet_id: generate_short_id(),
            created: Local::now().date_naive(),
        }
    }

    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_qr_url(mut self, url: Option<String>) -> Self {
        self.qr_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn with_logo(mut self, logo: Option<DynamicImage>) -> Self {
        self.logo = logo;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.created = date;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.worksheet_id = id.into();
        self
    }
}

pub fn generate_short_id() -> String {
    let uuid = Uuid::new_v4();
    let hex = format!("{:x}", uuid);
    hex[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wordsearch::GridPlacer;

    #[test]
    fn short_id_is_eight_uppercase_hex() {
        let id = generate_short_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn tracing_sheets_have_no_answer_key() {
        let content = WorksheetContent::TracingLines { lines: vec!["abc".into()] };
        assert!(content.answers().is_empty());
        assert_eq!(content.items().len(), 1);
    }

    #[test]
    fn word_search_answers_describe_placements() {
        let puzzle = GridPlacer::new(10).with_seed(Some(4)).generate(&["sun", "moon"]);
        let placed = puzzle.placed_words.len();
        let content = WorksheetContent::WordSearch(puzzle);
        let answers = content.answers();
        assert_eq!(answers.len(), placed);
        assert!(answers.iter().all(|a| a.contains("row ") && a.contains("column ")));
        assert_eq!(content.kind().slug(), "word-search");
    }

    #[test]
    fn blank_options_are_ignored() {
        let ws = Worksheet::new("T", "S", WorksheetContent::TracingLines { lines: vec![] })
            .with_topic(Some("  ".into()))
            .with_qr_url(Some(String::new()));
        assert!(ws.topic.is_none());
        assert!(ws.qr_url.is_none());
    }
}
