// Page composition for printed worksheets.
//
// `compose` turns a `Worksheet` into a list of pages, each holding the
// drawing operations for that page in millimetres (origin bottom-left, A4).
// The PDF backend replays these operations; keeping pagination here means
// page breaks can be checked without parsing a PDF.
//
// Every sheet goes through the same sections: the header on page one, the
// body (which paginates as the running cursor reaches the bottom limit), and
// the answer key, which always starts on a fresh page.

use crate::assets::fit_within;
use crate::render::{self, FIND_WORDS_HEADING, SCAN_CAPTION};
use crate::worksheet::{ContentKind, Worksheet, WorksheetContent};

// ============================================================================
// Constants
// ============================================================================

/// A4 dimensions in mm
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// Left/right margin of the content area
pub const MARGIN_MM: f32 = 20.0;

/// Where the body starts on the first page, below the header
pub const BODY_TOP_MM: f32 = PAGE_HEIGHT_MM - 60.0;

/// Where content resumes on continuation pages
pub const CONTINUATION_TOP_MM: f32 = PAGE_HEIGHT_MM - 25.0;

/// Content never extends below this line
pub const BOTTOM_LIMIT_MM: f32 = 30.0;

/// First line of the answer list, below the answer key heading
pub const ANSWER_TOP_MM: f32 = PAGE_HEIGHT_MM - 40.0;

const BORDER_INSET_MM: f32 = 10.0;
const FOOTER_Y_MM: f32 = 14.0;
const QR_SIZE_MM: f32 = 25.0;
const LOGO_MAX_WIDTH_MM: f32 = 35.0;
const LOGO_MAX_HEIGHT_MM: f32 = 25.0;
const HEADER_INSET_MM: f32 = 15.0;

/// Questions are indented a little past the margin
const QUESTION_X_MM: f32 = 25.0;
const ANSWER_X_MM: f32 = 30.0;

/// Baseline-to-baseline distance of wrapped lines
pub const TEXT_LEADING_MM: f32 = 6.0;
const ANSWER_LEADING_MM: f32 = 5.5;
pub const ANSWER_STEP_MM: f32 = 8.0;
const ITEM_GAP_MM: f32 = 4.0;

/// Rows of handwriting practice
pub const TRACE_ROW_MM: f32 = 25.0;
const TRACE_GUIDE_HEIGHT_MM: f32 = 7.5;
const TRACE_MIN_FONT_SIZE: f32 = 12.0;

/// Word search cell pitch before shrinking to fit
pub const GRID_PITCH_MM: f32 = 8.0;
const GRID_FONT_PER_MM: f32 = 1.75;
const WORD_LIST_COLUMNS: usize = 3;
const WORD_LIST_ROW_MM: f32 = 7.0;
/// Space kept below the grid for the word list heading
const WORD_LIST_RESERVE_MM: f32 = 25.0;

/// Font sizes in points
const TITLE_FONT_SIZE: f32 = 24.0;
const SCHOOL_FONT_SIZE: f32 = 14.0;
const INFO_FONT_SIZE: f32 = 12.0;
const BODY_FONT_SIZE: f32 = 14.0;
const ANSWER_HEADING_FONT_SIZE: f32 = 20.0;
const ANSWER_FONT_SIZE: f32 = 12.0;
const TRACE_FONT_SIZE: f32 = 28.0;
const SMALL_FONT_SIZE: f32 = 8.0;
const FOOTER_FONT_SIZE: f32 = 9.0;

const PT_TO_MM: f32 = 25.4 / 72.0;

// ============================================================================
// Display List
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
pub const BLUE: Rgb = Rgb::new(0.12, 0.31, 0.61);
pub const GRID_GREY: Rgb = Rgb::new(0.7, 0.7, 0.7);
pub const TRACE_GREY: Rgb = Rgb::new(0.75, 0.75, 0.75);
pub const FOOTER_GREY: Rgb = Rgb::new(0.55, 0.55, 0.55);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Mono,
    MonoBold,
}

impl FontStyle {
    /// Average glyph advance as a fraction of the font size
    fn average_advance(self) -> f32 {
        match self {
            FontStyle::Regular => 0.5,
            FontStyle::Bold => 0.55,
            FontStyle::Mono | FontStyle::MonoBold => 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Logo,
    Qr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `x` is the left edge and `y` the baseline
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        font: FontStyle,
        color: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        /// Points
        thickness: f32,
        color: Rgb,
        /// (dash, gap) in points
        dash: Option<(i64, i64)>,
    },
    /// `(x, y)` is the bottom-left corner
    Image {
        slot: ImageSlot,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Body,
    AnswerKey,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub section: Section,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn body_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.section == Section::Body).count()
    }

    pub fn answer_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.section == Section::AnswerKey).count()
    }
}

// ============================================================================
// Text Measurement
// ============================================================================

pub fn text_width_mm(text: &str, size: f32, font: FontStyle) -> f32 {
    text.chars().count() as f32 * char_width_mm(size, font)
}

fn char_width_mm(size: f32, font: FontStyle) -> f32 {
    size * font.average_advance() * PT_TO_MM
}

/// Greedy word wrap. Words wider than a line are split across lines, which
/// also covers scripts written without spaces.
pub fn wrap_text(text: &str, max_width_mm: f32, size: f32, font: FontStyle) -> Vec<String> {
    let max_chars = ((max_width_mm / char_width_mm(size, font)).floor() as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(max_chars);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        if chars.is_empty() {
            continue;
        }

        let needed = if current_len == 0 { chars.len() } else { current_len + 1 + chars.len() };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars.iter());
        current_len += chars.len();
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Minimum vertical space per body item. Word problems leave room to work.
pub fn item_spacing_mm(kind: ContentKind) -> f32 {
    match kind {
        ContentKind::WordProblems => 30.0,
        ContentKind::Quiz => 22.0,
        _ => 15.0,
    }
}

pub fn item_height_mm(kind: ContentKind, line_count: usize) -> f32 {
    item_spacing_mm(kind).max(line_count as f32 * TEXT_LEADING_MM + ITEM_GAP_MM)
}

// ============================================================================
// Composer
// ============================================================================

struct Composer<'a> {
    worksheet: &'a Worksheet,
    pages: Vec<Page>,
    y: f32,
}

impl<'a> Composer<'a> {
    fn new(worksheet: &'a Worksheet) -> Self {
        Self {
            worksheet,
            pages: Vec::new(),
            y: CONTINUATION_TOP_MM,
        }
    }

    fn new_page(&mut self, section: Section) {
        let mut page = Page { section, ops: Vec::new() };
        push_border(&mut page.ops);
        self.pages.push(page);
        self.y = CONTINUATION_TOP_MM;
    }

    /// Starts a new page of `section` unless `height` still fits above the
    /// bottom limit.
    fn ensure_room(&mut self, height: f32, section: Section) {
        if self.y - height < BOTTOM_LIMIT_MM {
            self.new_page(section);
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, font: FontStyle, color: Rgb) {
        self.push(DrawOp::Text {
            text: text.into(),
            x,
            y,
            size,
            font,
            color,
        });
    }

    fn centered_text(&mut self, text: &str, center_x: f32, y: f32, size: f32, font: FontStyle, color: Rgb) {
        let x = center_x - text_width_mm(text, size, font) / 2.0;
        self.text(text, x, y, size, font, color);
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Rgb, dash: Option<(i64, i64)>) {
        self.push(DrawOp::Line {
            from,
            to,
            thickness,
            color,
            dash,
        });
    }

    // ------------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------------

    /// Draws the first-page header and returns where the body may start.
    fn header(&mut self) -> f32 {
        let ws = self.worksheet;
        let center = PAGE_WIDTH_MM / 2.0;
        let top = PAGE_HEIGHT_MM - HEADER_INSET_MM;

        if let Some(logo) = &ws.logo {
            let (width, height) = fit_within(logo.width(), logo.height(), LOGO_MAX_WIDTH_MM, LOGO_MAX_HEIGHT_MM);
            self.push(DrawOp::Image {
                slot: ImageSlot::Logo,
                x: HEADER_INSET_MM,
                y: top - height,
                width,
                height,
            });
        }

        if ws.qr_url.is_some() {
            let x = PAGE_WIDTH_MM - HEADER_INSET_MM - QR_SIZE_MM;
            let y = top - QR_SIZE_MM;
            self.push(DrawOp::Image {
                slot: ImageSlot::Qr,
                x,
                y,
                width: QR_SIZE_MM,
                height: QR_SIZE_MM,
            });
            self.centered_text(SCAN_CAPTION, x + QR_SIZE_MM / 2.0, y - 3.5, SMALL_FONT_SIZE, FontStyle::Regular, BLACK);
        }

        // Title sits between the logo and the QR code, at most two lines
        let title_width = PAGE_WIDTH_MM - 2.0 * (HEADER_INSET_MM + LOGO_MAX_WIDTH_MM + 5.0);
        let mut title_lines = wrap_text(&ws.title, title_width, TITLE_FONT_SIZE, FontStyle::Bold);
        if title_lines.len() > 2 {
            title_lines.truncate(2);
            title_lines[1].push_str("...");
        }

        let mut y = PAGE_HEIGHT_MM - 25.0;
        for line in &title_lines {
            self.centered_text(line, center, y, TITLE_FONT_SIZE, FontStyle::Bold, BLACK);
            y -= 10.0;
        }

        if !ws.school_name.trim().is_empty() {
            self.centered_text(&ws.school_name, center, y, SCHOOL_FONT_SIZE, FontStyle::Regular, BLUE);
            y -= 7.0;
        }

        if let Some(topic) = &ws.topic {
            let topic_line = render::topic_line(topic);
            self.centered_text(&topic_line, center, y, INFO_FONT_SIZE, FontStyle::Regular, BLACK);
            y -= 6.0;
        }

        let info_y = (y - 3.0).min(PAGE_HEIGHT_MM - 47.0);
        self.text(render::NAME_LINE, MARGIN_MM, info_y, INFO_FONT_SIZE, FontStyle::Regular, BLACK);
        self.text(render::DATE_LINE, 120.0, info_y, INFO_FONT_SIZE, FontStyle::Regular, BLACK);

        let id_text = render::id_line(&ws.worksheet_id);
        let id_x = PAGE_WIDTH_MM - MARGIN_MM - text_width_mm(&id_text, SMALL_FONT_SIZE, FontStyle::Regular);
        self.text(id_text, id_x, info_y - 6.0, SMALL_FONT_SIZE, FontStyle::Regular, FOOTER_GREY);

        BODY_TOP_MM.min(info_y - 13.0)
    }

    // ------------------------------------------------------------------------
    // Body
    // ------------------------------------------------------------------------

    fn numbered_items(&mut self, kind: ContentKind, items: &[String]) {
        let right = PAGE_WIDTH_MM - MARGIN_MM;
        for (i, item) in items.iter().enumerate() {
            let number = format!("{}.", i + 1);
            let text_x = QUESTION_X_MM + text_width_mm("000. ", BODY_FONT_SIZE, FontStyle::Regular);
            let lines = wrap_text(item, right - text_x, BODY_FONT_SIZE, FontStyle::Regular);
            let height = item_height_mm(kind, lines.len());

            self.ensure_room(height, Section::Body);
            let top = self.y;
            self.text(number, QUESTION_X_MM, top, BODY_FONT_SIZE, FontStyle::Bold, BLACK);
            for (n, line) in lines.into_iter().enumerate() {
                let y = top - n as f32 * TEXT_LEADING_MM;
                self.text(line, text_x, y, BODY_FONT_SIZE, FontStyle::Regular, BLACK);
            }
            self.y -= height;
        }
    }

    /// Letter grid with a light cell lattice. `None` cells stay empty.
    fn letter_grid(&mut self, grid: &[Vec<Option<char>>], available_height: f32) {
        let size = grid.len();
        if size == 0 {
            return;
        }
        let available_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
        let pitch = GRID_PITCH_MM
            .min(available_width / size as f32)
            .min(available_height / size as f32);
        let font_size = pitch * GRID_FONT_PER_MM;
        let width = pitch * size as f32;
        let x0 = (PAGE_WIDTH_MM - width) / 2.0;
        let top = self.y;

        for i in 0..=size {
            let offset = i as f32 * pitch;
            self.line((x0, top - offset), (x0 + width, top - offset), 0.5, GRID_GREY, None);
            self.line((x0 + offset, top), (x0 + offset, top - width), 0.5, GRID_GREY, None);
        }

        for (r, row) in grid.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(ch) = cell {
                    let letter = ch.to_string();
                    let x = x0 + c as f32 * pitch + (pitch - text_width_mm(&letter, font_size, FontStyle::MonoBold)) / 2.0;
                    let y = top - r as f32 * pitch - pitch * 0.72;
                    self.text(letter, x, y, font_size, FontStyle::MonoBold, BLACK);
                }
            }
        }

        self.y = top - width - 10.0;
    }

    fn word_list(&mut self, words: &[String]) {
        if words.is_empty() {
            return;
        }
        self.ensure_room(2.0 * WORD_LIST_ROW_MM, Section::Body);
        self.text(FIND_WORDS_HEADING, MARGIN_MM, self.y, BODY_FONT_SIZE, FontStyle::Bold, BLACK);
        self.y -= 9.0;

        let column_width = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) / WORD_LIST_COLUMNS as f32;
        for row in words.chunks(WORD_LIST_COLUMNS) {
            self.ensure_room(WORD_LIST_ROW_MM, Section::Body);
            for (i, word) in row.iter().enumerate() {
                let x = MARGIN_MM + i as f32 * column_width;
                self.text(format!("- {}", word), x, self.y, INFO_FONT_SIZE, FontStyle::Regular, BLACK);
            }
            self.y -= WORD_LIST_ROW_MM;
        }
    }

    fn tracing_rows(&mut self, lines: &[String]) {
        let width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
        for line in lines {
            let chars = line.chars().count().max(1) as f32;
            let fitting = width / (chars * FontStyle::Mono.average_advance() * PT_TO_MM);
            if fitting >= TRACE_MIN_FONT_SIZE {
                self.tracing_row(line.clone(), TRACE_FONT_SIZE.min(fitting));
            } else {
                // Too long to stay legible on one row
                for part in wrap_text(line, width, TRACE_MIN_FONT_SIZE, FontStyle::Mono) {
                    self.tracing_row(part, TRACE_MIN_FONT_SIZE);
                }
            }
        }
    }

    /// One set of guide lines with the text to trace sitting on the baseline.
    fn tracing_row(&mut self, text: String, size: f32) {
        let left = MARGIN_MM;
        let right = PAGE_WIDTH_MM - MARGIN_MM;
        self.ensure_room(TRACE_ROW_MM, Section::Body);
        let baseline = self.y - 10.0;

        self.line((left, baseline + TRACE_GUIDE_HEIGHT_MM), (right, baseline + TRACE_GUIDE_HEIGHT_MM), 1.0, BLACK, None);
        self.line((left, baseline + TRACE_GUIDE_HEIGHT_MM / 2.0), (right, baseline + TRACE_GUIDE_HEIGHT_MM / 2.0), 0.6, GRID_GREY, Some((3, 3)));
        self.line((left, baseline), (right, baseline), 1.0, BLACK, None);
        self.text(text, left, baseline, size, FontStyle::Mono, TRACE_GREY);

        self.y -= TRACE_ROW_MM;
    }

    // ------------------------------------------------------------------------
    // Answer key
    // ------------------------------------------------------------------------

    fn answer_key(&mut self, answers: &[String]) {
        self.new_page(Section::AnswerKey);
        let heading = render::answer_key_heading(&self.worksheet.title);
        self.centered_text(&heading, PAGE_WIDTH_MM / 2.0, PAGE_HEIGHT_MM - 25.0, ANSWER_HEADING_FONT_SIZE, FontStyle::Bold, BLACK);
        self.y = ANSWER_TOP_MM;

        if let WorksheetContent::WordSearch(puzzle) = &self.worksheet.content {
            let solution = puzzle.solution_grid();
            let available = self.y - BOTTOM_LIMIT_MM - WORD_LIST_RESERVE_MM;
            self.letter_grid(&solution, available);
        }

        let right = PAGE_WIDTH_MM - MARGIN_MM;
        for (i, answer) in answers.iter().enumerate() {
            let label = render::answer_label(i, answer);
            let lines = wrap_text(&label, right - ANSWER_X_MM, ANSWER_FONT_SIZE, FontStyle::Regular);
            let height = ANSWER_STEP_MM.max(lines.len() as f32 * ANSWER_LEADING_MM + 2.5);

            self.ensure_room(height, Section::AnswerKey);
            let top = self.y;
            for (n, line) in lines.into_iter().enumerate() {
                self.text(line, ANSWER_X_MM, top - n as f32 * ANSWER_LEADING_MM, ANSWER_FONT_SIZE, FontStyle::Regular, BLACK);
            }
            self.y -= height;
        }
    }

    fn footers(&mut self) {
        let total = self.pages.len();
        let base = render::footer_text(self.worksheet);
        for (i, page) in self.pages.iter_mut().enumerate() {
            let text = format!("{} - Page {} of {}", base, i + 1, total);
            let x = PAGE_WIDTH_MM / 2.0 - text_width_mm(&text, FOOTER_FONT_SIZE, FontStyle::Regular) / 2.0;
            page.ops.push(DrawOp::Text {
                text,
                x,
                y: FOOTER_Y_MM,
                size: FOOTER_FONT_SIZE,
                font: FontStyle::Regular,
                color: FOOTER_GREY,
            });
        }
    }
}

fn push_border(ops: &mut Vec<DrawOp>) {
    let (x0, y0) = (BORDER_INSET_MM, BORDER_INSET_MM);
    let (x1, y1) = (PAGE_WIDTH_MM - BORDER_INSET_MM, PAGE_HEIGHT_MM - BORDER_INSET_MM);
    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)];
    for pair in corners.windows(2) {
        ops.push(DrawOp::Line {
            from: pair[0],
            to: pair[1],
            thickness: 2.0,
            color: BLUE,
            dash: Some((6, 3)),
        });
    }
}

// ============================================================================
// Entry Point
// ============================================================================

pub fn compose(worksheet: &Worksheet) -> Layout {
    let mut composer = Composer::new(worksheet);
    composer.new_page(Section::Body);
    composer.y = composer.header();

    let content = &worksheet.content;
    match content {
        WorksheetContent::MathQuestions { questions, .. }
        | WorksheetContent::WordProblems { questions, .. }
        | WorksheetContent::Quiz { questions, .. } => composer.numbered_items(content.kind(), questions),
        WorksheetContent::WordSearch(puzzle) => {
            let cells: Vec<Vec<Option<char>>> = puzzle
                .grid
                .iter()
                .map(|row| row.iter().copied().map(Some).collect())
                .collect();
            let available = composer.y - BOTTOM_LIMIT_MM - WORD_LIST_RESERVE_MM;
            composer.letter_grid(&cells, available);
            composer.word_list(&puzzle.placed_words);
        }
        WorksheetContent::TracingLines { lines } => composer.tracing_rows(lines),
    }

    let answers = content.answers();
    if !answers.is_empty() {
        composer.answer_key(&answers);
    }

    composer.footers();
    tracing::debug!(
        pages = composer.pages.len(),
        kind = content.kind().label(),
        "worksheet composed"
    );

    Layout { pages: composer.pages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{MathFactGenerator, Operation};
    use crate::wordsearch::GridPlacer;
    use chrono::NaiveDate;

    fn sheet(content: WorksheetContent) -> Worksheet {
        Worksheet::new("Practice", "Example School", content)
            .with_date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .with_id("ABCD1234")
    }

    fn math_sheet(count: usize) -> Worksheet {
        let (questions, answers) = MathFactGenerator::new().with_seed(Some(1)).generate(Operation::Add, count, 1, 10);
        sheet(WorksheetContent::MathQuestions { questions, answers })
    }

    /// Items that fit between `top` and the bottom limit at `step` each
    fn capacity(top: f32, step: f32) -> usize {
        ((top - BOTTOM_LIMIT_MM) / step).floor() as usize
    }

    fn expected_pages(count: usize, first_top: f32, step: f32) -> usize {
        let first = capacity(first_top, step);
        let rest = capacity(CONTINUATION_TOP_MM, step);
        if count <= first {
            1
        } else {
            1 + (count - first).div_ceil(rest)
        }
    }

    #[test]
    fn short_math_sheet_is_one_body_page_plus_answer_key() {
        let layout = compose(&math_sheet(5));
        assert_eq!(layout.body_pages(), 1);
        assert_eq!(layout.answer_pages(), 1);
        assert_eq!(layout.pages[1].section, Section::AnswerKey);
    }

    #[test]
    fn math_body_paginates_by_item_height() {
        for count in [13, 14, 29, 40, 75] {
            let layout = compose(&math_sheet(count));
            let step = item_spacing_mm(ContentKind::MathQuestions);
            assert_eq!(layout.body_pages(), expected_pages(count, BODY_TOP_MM, step), "{count} questions");
        }
    }

    #[test]
    fn answer_key_starts_on_a_fresh_page_and_paginates() {
        let layout = compose(&math_sheet(40));
        let first_answer = layout
            .pages
            .iter()
            .position(|p| p.section == Section::AnswerKey)
            .unwrap();
        assert_eq!(first_answer, layout.body_pages());
        assert!(layout.pages[first_answer..].iter().all(|p| p.section == Section::AnswerKey));
        assert_eq!(layout.answer_pages(), expected_pages(40, ANSWER_TOP_MM, ANSWER_STEP_MM));

        let heading = render::answer_key_heading("Practice");
        assert!(layout.pages[first_answer].texts().any(|t| t == heading));
        assert!(layout.pages[..first_answer].iter().all(|p| !p.texts().any(|t| t == heading)));
    }

    #[test]
    fn every_question_is_drawn_once() {
        let ws = math_sheet(30);
        let layout = compose(&ws);
        let drawn: Vec<&str> = layout
            .pages
            .iter()
            .filter(|p| p.section == Section::Body)
            .flat_map(|p| p.texts())
            .collect();
        let items = ws.content.items();
        for question in items {
            let expected = items.iter().filter(|q| *q == question).count();
            assert_eq!(drawn.iter().filter(|t| **t == question).count(), expected);
        }
    }

    #[test]
    fn content_stays_above_the_bottom_limit() {
        let layout = compose(&math_sheet(60));
        for page in &layout.pages {
            for op in &page.ops {
                if let DrawOp::Text { y, text, .. } = op {
                    if !text.contains("Page ") {
                        assert!(*y >= BOTTOM_LIMIT_MM, "{text} drawn at {y}");
                    }
                }
            }
        }
    }

    #[test]
    fn word_problems_get_more_room_than_drills() {
        let questions: Vec<String> = (0..12).map(|i| format!("Problem {i}")).collect();
        let answers = questions.clone();
        let problems = compose(&sheet(WorksheetContent::WordProblems {
            questions: questions.clone(),
            answers: answers.clone(),
        }));
        let drills = compose(&sheet(WorksheetContent::MathQuestions { questions, answers }));
        assert!(problems.body_pages() > drills.body_pages());
        assert_eq!(
            problems.body_pages(),
            expected_pages(12, BODY_TOP_MM, item_spacing_mm(ContentKind::WordProblems))
        );
    }

    #[test]
    fn long_items_wrap_and_grow() {
        let long = "word ".repeat(60);
        let lines = wrap_text(&long, 150.0, BODY_FONT_SIZE, FontStyle::Regular);
        assert!(lines.len() > 1);
        assert!(item_height_mm(ContentKind::Quiz, lines.len()) >= lines.len() as f32 * TEXT_LEADING_MM);
    }

    #[test]
    fn wrap_respects_width_and_splits_long_words() {
        let max_width = 40.0;
        let lines = wrap_text("supercalifragilisticexpialidocious is long", max_width, 12.0, FontStyle::Regular);
        assert!(lines.len() >= 2);
        for line in &lines {
            assert!(text_width_mm(line, 12.0, FontStyle::Regular) <= max_width + 0.01, "{line}");
        }
        assert_eq!(lines.concat().replace(' ', ""), "supercalifragilisticexpialidociousislong");
        assert_eq!(wrap_text("", 50.0, 12.0, FontStyle::Regular), vec![String::new()]);
    }

    #[test]
    fn tracing_rows_paginate_without_answer_key() {
        let lines: Vec<String> = (0..20).map(|i| format!("line {i}")).collect();
        let layout = compose(&sheet(WorksheetContent::TracingLines { lines }));
        assert_eq!(layout.answer_pages(), 0);
        assert_eq!(layout.body_pages(), expected_pages(20, BODY_TOP_MM, TRACE_ROW_MM));

        let dashed = layout.pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { dash: Some((3, 3)), .. }))
            .count();
        assert!(dashed > 0, "tracing rows need a dashed midline");
    }

    #[test]
    fn long_tracing_lines_wrap_inside_the_margins() {
        let lines = crate::handwriting::tracing_lines("The quick brown fox jumps over the lazy dog near the river bank");
        let layout = compose(&sheet(WorksheetContent::TracingLines { lines }));
        let right = PAGE_WIDTH_MM - MARGIN_MM;

        let mut traced = Vec::new();
        for page in &layout.pages {
            for op in &page.ops {
                if let DrawOp::Text { text, x, size, font: FontStyle::Mono, .. } = op {
                    assert!(*size >= TRACE_MIN_FONT_SIZE);
                    let edge = x + text_width_mm(text, *size, FontStyle::Mono);
                    assert!(edge <= right + 0.01, "{text} ends at {edge}");
                    traced.push(text.as_str());
                }
            }
        }
        assert!(traced.len() > 1, "long line should span several rows");
        assert_eq!(traced.join(" ").matches("river bank").count(), 2);
    }

    #[test]
    fn oversized_grids_shrink_to_fit_the_margins() {
        let puzzle = GridPlacer::new(80).with_seed(Some(2)).generate(&["comet", "orbit"]);
        let layout = compose(&sheet(WorksheetContent::WordSearch(puzzle)));
        for page in &layout.pages {
            for op in &page.ops {
                if let DrawOp::Line { from, to, color, .. } = op {
                    if *color == GRID_GREY && from.1 == to.1 {
                        assert!(from.0 >= MARGIN_MM - 0.01 && to.0 <= PAGE_WIDTH_MM - MARGIN_MM + 0.01);
                    }
                }
            }
        }
    }

    #[test]
    fn word_search_grid_and_word_list_on_first_page() {
        let puzzle = GridPlacer::new(15).with_seed(Some(9)).generate(&["apple", "banana", "mango"]);
        let placed = puzzle.placed_words.clone();
        let layout = compose(&sheet(WorksheetContent::WordSearch(puzzle)));
        assert_eq!(layout.body_pages(), 1);
        assert_eq!(layout.answer_pages(), 1);

        let body: Vec<&str> = layout.pages[0].texts().collect();
        assert!(body.contains(&FIND_WORDS_HEADING));
        for word in &placed {
            assert!(body.contains(&format!("- {}", word).as_str()));
        }
        let letters = body.iter().filter(|t| t.chars().count() == 1).count();
        assert_eq!(letters, 15 * 15);
    }

    #[test]
    fn oversized_grid_shrinks_to_fit() {
        let puzzle = GridPlacer::new(40).with_seed(Some(1)).generate(&["a"]);
        let layout = compose(&sheet(WorksheetContent::WordSearch(puzzle)));
        for op in &layout.pages[0].ops {
            if let DrawOp::Line { from, to, .. } = op {
                assert!(from.0 >= MARGIN_MM - 0.01 || from.0 <= 10.01);
                assert!(to.0 <= PAGE_WIDTH_MM - MARGIN_MM + 0.01 || to.0 >= PAGE_WIDTH_MM - 10.01);
                assert!(from.1.min(to.1) >= BOTTOM_LIMIT_MM - 0.01 || from.1.min(to.1) <= 10.01);
            }
        }
    }

    #[test]
    fn header_and_footer_text() {
        let layout = compose(&math_sheet(40));
        let first: Vec<&str> = layout.pages[0].texts().collect();
        assert!(first.contains(&"Practice"));
        assert!(first.contains(&"Example School"));
        assert!(first.contains(&render::NAME_LINE));
        assert!(first.contains(&render::DATE_LINE));
        assert!(first.contains(&"ID: ABCD1234"));

        let total = layout.pages.len();
        for (i, page) in layout.pages.iter().enumerate() {
            let marker = format!("Page {} of {}", i + 1, total);
            assert!(page.texts().any(|t| t.ends_with(&marker)));
        }
    }

    #[test]
    fn qr_and_logo_only_when_provided() {
        let has = |layout: &Layout, slot: ImageSlot| {
            layout.pages[0]
                .ops
                .iter()
                .any(|op| matches!(op, DrawOp::Image { slot: s, .. } if *s == slot))
        };

        let plain = compose(&math_sheet(3));
        assert!(!has(&plain, ImageSlot::Qr));
        assert!(!has(&plain, ImageSlot::Logo));

        let logo = ::image::DynamicImage::new_rgb8(40, 20);
        let decorated = compose(
            &math_sheet(3)
                .with_qr_url(Some("https://example.com/key".into()))
                .with_logo(Some(logo)),
        );
        assert!(has(&decorated, ImageSlot::Qr));
        assert!(has(&decorated, ImageSlot::Logo));
        assert!(decorated.pages[0].texts().any(|t| t == SCAN_CAPTION));
    }

    #[test]
    fn empty_body_still_renders_a_page() {
        let layout = compose(&sheet(WorksheetContent::Quiz {
            questions: vec![],
            answers: vec![],
        }));
        assert_eq!(layout.body_pages(), 1);
        assert_eq!(layout.answer_pages(), 0);
    }
}
