// worksheet-gen: Generate printable worksheets as PDF and Word files

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use worksheet_gen::assets::load_logo;
use worksheet_gen::config::{AiSettings, ProviderKind, API_KEY_ENV, DEFAULT_AI_TIMEOUT_SECS};
use worksheet_gen::extract::extract_text;
use worksheet_gen::math::{check_range, Operation};
use worksheet_gen::wordsearch::{DEFAULT_GRID_SIZE, MAX_GRID_SIZE};
use worksheet_gen::{
    AppError, ContentKind, ContentSource, DocumentRenderer, DocxRenderer, OutputFormat, PdfRenderer, Subject,
    Worksheet, WorksheetRequest, WorksheetService,
};

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate printable classroom worksheets as PDF and Word files")]
struct Args {
    /// Worksheet title (defaults to the worksheet type)
    #[arg(short, long, global = true)]
    title: Option<String>,

    /// School name shown under the title
    #[arg(short, long, default_value = "", global = true)]
    school: String,

    /// Topic line for the header; also used in AI prompts
    #[arg(long, global = true)]
    topic: Option<String>,

    /// Date printed in the footer (YYYY-MM-DD format, defaults to today)
    #[arg(short, long, global = true)]
    date: Option<String>,

    /// Answer key link encoded as a QR code in the header
    #[arg(long, global = true)]
    qr_url: Option<String>,

    /// Logo image (file path or URL) to display in header top-left
    #[arg(long, global = true)]
    logo: Option<String>,

    /// TrueType font for PDF text (needed for Thai)
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Output document format
    #[arg(short, long, value_enum, default_value_t = FormatChoice::Pdf, global = true)]
    format: FormatChoice,

    /// Output filename (defaults to {type}-{date}-{title}.{ext})
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Seed for reproducible puzzles and drills
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// AI provider for word problems, exercises and quizzes
    #[arg(long, value_enum, default_value_t = ProviderKind::Gemini, global = true)]
    provider: ProviderKind,

    /// API key for the AI provider
    #[arg(long, env = API_KEY_ENV, hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Override the provider's default model
    #[arg(long, global = true)]
    model: Option<String>,

    /// Seconds to wait for the AI provider
    #[arg(long, default_value_t = DEFAULT_AI_TIMEOUT_SECS, global = true)]
    ai_timeout: u64,

    /// Print a JSON summary instead of the text report
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Arithmetic drill with an answer key
    Math {
        /// +, -, x, ÷ or a name such as "addition"
        #[arg(long, default_value = "+", value_parser = parse_operation)]
        operation: Operation,

        /// Number of questions
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,

        #[arg(long, default_value_t = 1)]
        min: i64,

        #[arg(long, default_value_t = 10)]
        max: i64,
    },
    /// Math word problems (AI, with story templates as fallback)
    WordProblems {
        #[arg(long, default_value = "P3")]
        grade: String,

        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
    /// Subject exercises (AI, with placeholders as fallback)
    Exercises {
        #[arg(long, value_enum)]
        subject: Subject,

        #[arg(long, default_value = "P3")]
        grade: String,

        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,

        /// e.g. "mix", "multiple choice", "fill in the blank"
        #[arg(long, default_value = "mix")]
        exercise_type: String,
    },
    /// Word search puzzle
    WordSearch {
        /// Words to hide (space or comma separated)
        #[arg(required = true, value_delimiter = ',')]
        words: Vec<String>,

        /// Grid size (cells per side)
        #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
        size: usize,
    },
    /// Handwriting tracing lines
    Tracing {
        /// Comma-separated words or sentences
        text: String,
    },
    /// Quiz from a document or a passage of text
    Quiz {
        /// .pdf, .docx, .txt or .md file
        #[arg(long, required_unless_present = "text", conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Passage to build the quiz from
        #[arg(long)]
        text: Option<String>,

        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatChoice {
    Pdf,
    Docx,
    Both,
}

/// Machine-readable run report for --json
#[derive(Debug, Serialize)]
struct Summary {
    files: Vec<String>,
    kind: ContentKind,
    source: ContentSource,
    worksheet_id: String,
    date: String,
    notices: Vec<String>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let args = Args::parse();
    init_tracing();

    let date = parse_date(&args.date)?;
    let logo = load_logo(&args.logo)?;
    let pdf_renderer = match &args.font {
        Some(path) => PdfRenderer::with_font_file(path)?,
        None => PdfRenderer::new(),
    };

    let topic = args.topic.clone().unwrap_or_else(|| "General".to_string());
    let request = build_request(&args.command, &topic)?;

    // Only AI-backed requests pay for the provider's connect probe
    let provider = if request.uses_ai() {
        AiSettings::new(args.provider, args.api_key.clone())
            .with_model(args.model.clone())
            .with_timeout(Duration::from_secs(args.ai_timeout))
            .connect()
    } else {
        None
    };
    let service = WorksheetService::new(provider).with_seed(args.seed);
    let outcome = service.generate(&request);

    let title = args.title.clone().unwrap_or_else(|| default_title(&args.command));
    let worksheet = Worksheet::new(title, args.school.clone(), outcome.content)
        .with_topic(args.topic.clone())
        .with_qr_url(args.qr_url.clone())
        .with_logo(logo)
        .with_date(date);

    let base = output_base(args.output.as_deref(), &worksheet);
    let docx_renderer = DocxRenderer::new();
    let renderers: Vec<&dyn DocumentRenderer> = match args.format {
        FormatChoice::Pdf => vec![&pdf_renderer as &dyn DocumentRenderer],
        FormatChoice::Docx => vec![&docx_renderer as &dyn DocumentRenderer],
        FormatChoice::Both => vec![&pdf_renderer as &dyn DocumentRenderer, &docx_renderer],
    };

    let mut files = Vec::new();
    for renderer in renderers {
        let document = renderer.render_document(&worksheet)?;
        let path = with_extension(&base, document.file_extension());
        std::fs::write(&path, &document.bytes)?;
        files.push(path.display().to_string());
    }

    if args.json {
        let summary = Summary {
            files,
            kind: worksheet.content.kind(),
            source: outcome.source,
            worksheet_id: worksheet.worksheet_id.clone(),
            date: worksheet.created.format("%Y-%m-%d").to_string(),
            notices: outcome.notices,
        };
        let json = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
        println!("{}", json);
        return Ok(());
    }

    for file in &files {
        println!("✓ Generated: {}", file);
    }
    println!("  Type: {}", worksheet.content.kind().label());
    println!("  Items: {}", worksheet.content.items().len());
    println!("  Source: {}", source_label(outcome.source));
    println!("  Worksheet ID: {}", worksheet.worksheet_id);
    for notice in &outcome.notices {
        println!("  Note: {}", notice);
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("worksheet_gen=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    s.parse()
}

fn parse_date(date_str: &Option<String>) -> Result<NaiveDate, AppError> {
    match date_str {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| AppError::DateError(s.clone())),
        None => Ok(Local::now().date_naive()),
    }
}

fn require_count(count: usize) -> Result<usize, AppError> {
    if count == 0 {
        return Err(AppError::InvalidRequest("count must be at least 1".to_string()));
    }
    Ok(count)
}

fn build_request(command: &Command, topic: &str) -> Result<WorksheetRequest, AppError> {
    let request = match command {
        Command::Math {
            operation,
            count,
            min,
            max,
        } => {
            check_range(*min, *max).map_err(AppError::InvalidRequest)?;
            WorksheetRequest::Math {
                operation: *operation,
                count: require_count(*count)?,
                min: *min,
                max: *max,
            }
        }
        Command::WordProblems { grade, count } => WorksheetRequest::WordProblems {
            topic: topic.to_string(),
            grade: grade.clone(),
            count: require_count(*count)?,
        },
        Command::Exercises {
            subject,
            grade,
            count,
            exercise_type,
        } => WorksheetRequest::Exercises {
            subject: *subject,
            topic: topic.to_string(),
            grade: grade.clone(),
            count: require_count(*count)?,
            exercise_type: exercise_type.clone(),
        },
        Command::WordSearch { words, size } => {
            if *size == 0 || *size > MAX_GRID_SIZE {
                return Err(AppError::InvalidRequest(format!(
                    "grid size must be between 1 and {}",
                    MAX_GRID_SIZE
                )));
            }
            let words = words
                .iter()
                .flat_map(|w| w.split_whitespace())
                .map(str::to_string)
                .collect();
            WorksheetRequest::WordSearch {
                words,
                grid_size: *size,
            }
        }
        Command::Tracing { text } => WorksheetRequest::Tracing { text: text.clone() },
        Command::Quiz { file, text, count } => {
            let text = match (file, text) {
                (Some(path), _) => extract_text(path)?,
                (None, Some(text)) => text.clone(),
                (None, None) => return Err(AppError::InvalidRequest("quiz needs --file or --text".to_string())),
            };
            WorksheetRequest::Quiz {
                text,
                count: require_count(*count)?,
            }
        }
    };
    Ok(request)
}

fn default_title(command: &Command) -> String {
    match command {
        Command::Math { operation, .. } => format!("{} Practice", operation.label()),
        Command::WordProblems { .. } => "Word Problems".to_string(),
        Command::Exercises { subject, .. } => format!("{} Exercises", subject.name()),
        Command::WordSearch { .. } => "Word Search".to_string(),
        Command::Tracing { .. } => "Handwriting Practice".to_string(),
        Command::Quiz { .. } => "Reading Quiz".to_string(),
    }
}

fn source_label(source: ContentSource) -> &'static str {
    match source {
        ContentSource::Ai => "AI",
        ContentSource::Template => "template (AI unavailable)",
        ContentSource::Generated => "generated",
    }
}

/// Appends the format's extension. A `.pdf` or `.docx` the user typed is
/// replaced so `-f both -o sheet.pdf` still writes `sheet.docx`; any other
/// dotted suffix is kept.
fn with_extension(base: &Path, extension: &str) -> PathBuf {
    let typed_format = base.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| {
        [OutputFormat::Pdf, OutputFormat::Docx]
            .iter()
            .any(|format| ext.eq_ignore_ascii_case(format.extension()))
    });
    let stem = if typed_format { base.with_extension("") } else { base.to_path_buf() };
    let mut name = stem.into_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Output path without extension; each renderer adds its own.
fn output_base(output: Option<&str>, worksheet: &Worksheet) -> PathBuf {
    match output {
        Some(path) => PathBuf::from(path),
        None => {
            let sanitized_title = worksheet
                .title
                .to_lowercase()
                .replace(' ', "-")
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect::<String>();
            let mut name = format!(
                "{}-{}",
                worksheet.content.kind().slug(),
                worksheet.created.format("%Y-%m-%d")
            );
            if !sanitized_title.is_empty() {
                name.push('-');
                name.push_str(&sanitized_title);
            }
            PathBuf::from(name)
        }
    }
}
