// Word backend: flowing document built with docx-rs. Word paginates on its
// own, so only the answer key gets an explicit page break.

use std::io::Cursor;

use docx_rs::*;

use crate::assets::{fit_within, png_bytes, qr_image};
use crate::error::AppError;
use crate::render::{self, DocumentRenderer, OutputFormat, DATE_LINE, FIND_WORDS_HEADING, NAME_LINE, SCAN_CAPTION};
use crate::worksheet::{Worksheet, WorksheetContent};

// A4 in twentieths of a point, 2cm margins
const PAGE_WIDTH_TWIPS: u32 = 11906;
const PAGE_HEIGHT_TWIPS: u32 = 16838;
const MARGIN_TWIPS: i32 = 1134;

/// 0.8cm word search cells
const GRID_CELL_TWIPS: usize = 454;
const MATH_COLUMNS: usize = 2;
const MATH_COLUMN_TWIPS: usize = 4819;

/// Spacing after, in twips (24pt and 36pt)
const MATH_SPACING: u32 = 480;
const PROBLEM_SPACING: u32 = 720;

const EMU_PER_MM: f32 = 36_000.0;
const QR_SIZE_MM: f32 = 25.0;
const LOGO_MAX_WIDTH_MM: f32 = 35.0;
const LOGO_MAX_HEIGHT_MM: f32 = 25.0;

const SCHOOL_COLOR: &str = "1F4E9B";
const TRACE_COLOR: &str = "BFBFBF";
const FOOTER_COLOR: &str = "8C8C8C";
const MONO_FONT: &str = "Courier New";

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

impl DocxRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for DocxRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn render(&self, worksheet: &Worksheet) -> Result<Vec<u8>, AppError> {
        let mut docx = Docx::new()
            .page_size(PAGE_WIDTH_TWIPS, PAGE_HEIGHT_TWIPS)
            .page_margin(
                PageMargin::new()
                    .top(MARGIN_TWIPS)
                    .bottom(MARGIN_TWIPS)
                    .left(MARGIN_TWIPS)
                    .right(MARGIN_TWIPS),
            );

        docx = add_header(docx, worksheet)?;
        docx = add_body(docx, &worksheet.content);

        let answers = worksheet.content.answers();
        if !answers.is_empty() {
            docx = add_answer_key(docx, worksheet, &answers);
        }

        docx = docx.footer(Footer::new().add_paragraph(footer_paragraph(worksheet)));

        let mut buf = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buf)
            .map_err(|e| AppError::DocxError(e.to_string()))?;
        Ok(buf.into_inner())
    }
}

// ============================================================================
// Sections
// ============================================================================

/// "{footer} - Page N of M", with Word filling in the page fields.
fn footer_paragraph(worksheet: &Worksheet) -> Paragraph {
    let run = |text: String| Run::new().add_text(text).size(18).color(FOOTER_COLOR);
    Paragraph::new()
        .add_run(run(format!("{} - Page ", render::footer_text(worksheet))))
        .add_page_num(PageNum::new())
        .add_run(run(" of ".to_string()))
        .add_num_pages(NumPages::new())
        .align(AlignmentType::Center)
}

fn add_header(mut docx: Docx, worksheet: &Worksheet) -> Result<Docx, AppError> {
    let mut images = Paragraph::new().align(AlignmentType::Center);
    let mut has_images = false;

    if let Some(logo) = &worksheet.logo {
        let (width, height) = fit_within(logo.width(), logo.height(), LOGO_MAX_WIDTH_MM, LOGO_MAX_HEIGHT_MM);
        let pic = Pic::new(&png_bytes(logo)?).size(emu(width), emu(height));
        images = images.add_run(Run::new().add_image(pic));
        has_images = true;
    }

    if let Some(url) = &worksheet.qr_url {
        if has_images {
            images = images.add_run(Run::new().add_text("          "));
        }
        let qr = qr_image(url)?;
        let pic = Pic::new(&png_bytes(&qr)?).size(emu(QR_SIZE_MM), emu(QR_SIZE_MM));
        images = images.add_run(Run::new().add_image(pic));
        has_images = true;
    }

    if has_images {
        docx = docx.add_paragraph(images);
    }
    if worksheet.qr_url.is_some() {
        docx = docx.add_paragraph(centered(Run::new().add_text(SCAN_CAPTION).size(16)));
    }

    docx = docx.add_paragraph(centered(Run::new().add_text(worksheet.title.as_str()).bold().size(48)));

    if !worksheet.school_name.trim().is_empty() {
        docx = docx.add_paragraph(centered(
            Run::new()
                .add_text(worksheet.school_name.as_str())
                .size(28)
                .color(SCHOOL_COLOR),
        ));
    }

    if let Some(topic) = &worksheet.topic {
        docx = docx.add_paragraph(centered(Run::new().add_text(render::topic_line(topic)).size(24)));
    }

    docx = docx
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(format!("{}        {}", NAME_LINE, DATE_LINE)).size(24))
                .line_spacing(LineSpacing::new().before(240)),
        )
        .add_paragraph(
            Paragraph::new()
                .add_run(
                    Run::new()
                        .add_text(render::id_line(&worksheet.worksheet_id))
                        .size(16)
                        .color(FOOTER_COLOR),
                )
                .align(AlignmentType::Right)
                .line_spacing(LineSpacing::new().after(240)),
        );

    Ok(docx)
}

fn add_body(mut docx: Docx, content: &WorksheetContent) -> Docx {
    match content {
        WorksheetContent::MathQuestions { questions, .. } => {
            if questions.is_empty() {
                return docx;
            }
            let rows = questions
                .chunks(MATH_COLUMNS)
                .enumerate()
                .map(|(row, pair)| {
                    let mut cells: Vec<TableCell> = pair
                        .iter()
                        .enumerate()
                        .map(|(col, question)| {
                            let label = render::question_label(row * MATH_COLUMNS + col, question);
                            math_cell(Paragraph::new()
                                .add_run(Run::new().add_text(label).size(28))
                                .line_spacing(LineSpacing::new().after(MATH_SPACING)))
                        })
                        .collect();
                    while cells.len() < MATH_COLUMNS {
                        cells.push(math_cell(Paragraph::new()));
                    }
                    TableRow::new(cells)
                })
                .collect();
            docx = docx.add_table(Table::new(rows).set_grid(vec![MATH_COLUMN_TWIPS; MATH_COLUMNS]));
        }
        WorksheetContent::WordProblems { questions, .. } | WorksheetContent::Quiz { questions, .. } => {
            for (i, question) in questions.iter().enumerate() {
                docx = docx.add_paragraph(
                    Paragraph::new()
                        .add_run(Run::new().add_text(render::question_label(i, question)).size(28))
                        .line_spacing(LineSpacing::new().after(PROBLEM_SPACING)),
                );
            }
        }
        WorksheetContent::WordSearch(puzzle) => {
            let cells: Vec<Vec<Option<char>>> = puzzle
                .grid
                .iter()
                .map(|row| row.iter().copied().map(Some).collect())
                .collect();
            docx = docx.add_table(letter_table(&cells));
            docx = docx
                .add_paragraph(
                    Paragraph::new()
                        .add_run(Run::new().add_text(FIND_WORDS_HEADING).bold().size(28))
                        .line_spacing(LineSpacing::new().before(240)),
                )
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text(puzzle.placed_words.join(", ")).size(24)));
        }
        WorksheetContent::TracingLines { lines } => {
            for line in lines {
                docx = docx.add_paragraph(
                    Paragraph::new()
                        .add_run(
                            Run::new()
                                .add_text(line.as_str())
                                .size(48)
                                .color(TRACE_COLOR)
                                .fonts(RunFonts::new().ascii(MONO_FONT)),
                        )
                        .line_spacing(LineSpacing::new().after(MATH_SPACING)),
                );
            }
        }
    }
    docx
}

fn add_answer_key(mut docx: Docx, worksheet: &Worksheet, answers: &[String]) -> Docx {
    docx = docx
        .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
        .add_paragraph(centered(
            Run::new()
                .add_text(render::answer_key_heading(&worksheet.title))
                .bold()
                .size(40),
        ));

    if let WorksheetContent::WordSearch(puzzle) = &worksheet.content {
        docx = docx.add_table(letter_table(&puzzle.solution_grid()));
        docx = docx.add_paragraph(Paragraph::new());
    }

    for (i, answer) in answers.iter().enumerate() {
        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(render::answer_label(i, answer)).size(24))
                .line_spacing(LineSpacing::new().after(120)),
        );
    }
    docx
}

// ============================================================================
// Helpers
// ============================================================================

fn centered(run: Run) -> Paragraph {
    Paragraph::new().add_run(run).align(AlignmentType::Center)
}

fn emu(mm: f32) -> u32 {
    (mm * EMU_PER_MM).round() as u32
}

fn math_cell(paragraph: Paragraph) -> TableCell {
    TableCell::new()
        .add_paragraph(paragraph)
        .width(MATH_COLUMN_TWIPS, WidthType::Dxa)
}

/// Fixed-size letter grid. Empty cells keep their width so the grid stays square.
fn letter_table(grid: &[Vec<Option<char>>]) -> Table {
    let rows = grid
        .iter()
        .map(|row| {
            let cells = row
                .iter()
                .map(|cell| {
                    let mut paragraph = Paragraph::new().align(AlignmentType::Center);
                    if let Some(ch) = cell {
                        paragraph = paragraph.add_run(
                            Run::new()
                                .add_text(ch.to_string())
                                .bold()
                                .size(28)
                                .fonts(RunFonts::new().ascii(MONO_FONT)),
                        );
                    }
                    TableCell::new()
                        .add_paragraph(paragraph)
                        .width(GRID_CELL_TWIPS, WidthType::Dxa)
                })
                .collect();
            TableRow::new(cells)
        })
        .collect();

    Table::new(rows)
        .set_grid(vec![GRID_CELL_TWIPS; grid.len()])
        .align(TableAlignmentType::Center)
}
