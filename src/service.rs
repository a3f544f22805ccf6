// Worksheet generation entry point.
//
// `WorksheetService::generate` routes a request to its generator. AI-backed
// requests try the configured provider first and fall back to a template
// generator when the provider is missing, not working, fails, or answers in
// an unexpected format. Generation itself never fails; problems are reported
// as notices alongside the content.

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use crate::handwriting::tracing_lines;
use crate::math::{generate_facts, MathFactGenerator, Operation};
use crate::parser::{parse_response, ParsedResponse};
use crate::prompt;
use crate::provider::AiProvider;
use crate::wordsearch::GridPlacer;
use crate::worksheet::WorksheetContent;

/// Operand range of the addition drill used when AI math is unavailable
const FALLBACK_MATH_MIN: i64 = 1;
const FALLBACK_MATH_MAX: i64 = 100;

/// Operand range for the word problem story templates
const STORY_MIN: i64 = 2;
const STORY_MAX: i64 = 20;

const BLANK: &str = "________";
const MIN_CLOZE_WORDS: usize = 4;
const MIN_CLOZE_ANSWER_CHARS: usize = 4;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum Subject {
    Math,
    Science,
    Chemistry,
    Physics,
    Biology,
    Thai,
    English,
}

impl Subject {
    pub fn name(self) -> &'static str {
        match self {
            Subject::Math => "Math",
            Subject::Science => "Science",
            Subject::Chemistry => "Chemistry",
            Subject::Physics => "Physics",
            Subject::Biology => "Biology",
            Subject::Thai => "Thai",
            Subject::English => "English",
        }
    }

    /// Placeholder question and answer used when no AI content is available.
    fn placeholder(self, topic: &str, exercise_type: &str) -> (String, String) {
        match self {
            Subject::Math | Subject::Science => (format!("คำถามเกี่ยวกับ {}", topic), format!("คำตอบสำหรับ {}", topic)),
            Subject::Chemistry => (format!("คำถามเคมีเกี่ยวกับ {}", topic), "คำตอบ".to_string()),
            Subject::Physics => (format!("คำถามฟิสิกส์เกี่ยวกับ {}", topic), "คำตอบ".to_string()),
            Subject::Biology => (format!("คำถามชีววิทยาเกี่ยวกับ {}", topic), "คำตอบ".to_string()),
            Subject::Thai => (format!("แบบฝึกหัดภาษาไทยเกี่ยวกับ {}", topic), "คำตอบ".to_string()),
            Subject::English => (format!("{} exercise about {}", exercise_type, topic), "Answer".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorksheetRequest {
    Math {
        operation: Operation,
        count: usize,
        min: i64,
        max: i64,
    },
    WordProblems {
        topic: String,
        grade: String,
        count: usize,
    },
    Exercises {
        subject: Subject,
        topic: String,
        grade: String,
        count: usize,
        exercise_type: String,
    },
    WordSearch {
        words: Vec<String>,
        grid_size: usize,
    },
    Tracing {
        text: String,
    },
    Quiz {
        text: String,
        count: usize,
    },
}

impl WorksheetRequest {
    pub fn uses_ai(&self) -> bool {
        matches!(
            self,
            WorksheetRequest::WordProblems { .. } | WorksheetRequest::Exercises { .. } | WorksheetRequest::Quiz { .. }
        )
    }
}

// ============================================================================
// Outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentSource {
    /// Parsed from the AI provider's reply
    Ai,
    /// AI-backed request served by its fallback generator
    Template,
    /// Procedural generator with no AI involvement
    Generated,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub content: WorksheetContent,
    pub source: ContentSource,
    /// Messages for the user: AI errors, fallbacks, dropped words
    pub notices: Vec<String>,
}

impl GenerationOutcome {
    fn generated(content: WorksheetContent) -> Self {
        Self {
            content,
            source: ContentSource::Generated,
            notices: Vec::new(),
        }
    }
}

// ============================================================================
// Service
// ============================================================================

pub struct WorksheetService {
    provider: Option<Box<dyn AiProvider>>,
    seed: Option<u64>,
}

impl WorksheetService {
    pub fn new(provider: Option<Box<dyn AiProvider>>) -> Self {
        Self { provider, seed: None }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn ai_available(&self) -> bool {
        self.provider.as_ref().is_some_and(|p| p.is_working())
    }

    pub fn generate(&self, request: &WorksheetRequest) -> GenerationOutcome {
        match request {
            WorksheetRequest::Math {
                operation,
                count,
                min,
                max,
            } => {
                let (questions, answers) = MathFactGenerator::new()
                    .with_seed(self.seed)
                    .generate(*operation, *count, *min, *max);
                GenerationOutcome::generated(WorksheetContent::MathQuestions { questions, answers })
            }

            WorksheetRequest::WordSearch { words, grid_size } => {
                let puzzle = GridPlacer::new(*grid_size).with_seed(self.seed).generate(words);
                let notices = puzzle
                    .dropped_words
                    .iter()
                    .map(|w| format!("'{}' did not fit in the {}x{} grid and was left out", w, grid_size, grid_size))
                    .collect();
                GenerationOutcome {
                    content: WorksheetContent::WordSearch(puzzle),
                    source: ContentSource::Generated,
                    notices,
                }
            }

            WorksheetRequest::Tracing { text } => {
                GenerationOutcome::generated(WorksheetContent::TracingLines { lines: tracing_lines(text) })
            }

            WorksheetRequest::WordProblems { topic, grade, count } => {
                let prompt = prompt::word_problem_prompt(topic, grade, *count);
                self.with_fallback(&prompt, ContentShape::WordProblems, || self.story_problems(*count))
            }

            WorksheetRequest::Exercises {
                subject,
                topic,
                grade,
                count,
                exercise_type,
            } => {
                let prompt = match subject {
                    Subject::English => prompt::english_prompt(topic, grade, *count, exercise_type),
                    _ => prompt::exercise_prompt(subject.name(), topic, grade, *count, exercise_type),
                };
                let subject = *subject;
                self.with_fallback(&prompt, ContentShape::WordProblems, || {
                    self.subject_fallback(subject, topic, *count, exercise_type)
                })
            }

            WorksheetRequest::Quiz { text, count } => {
                let prompt = prompt::quiz_prompt(text, *count);
                self.with_fallback(&prompt, ContentShape::Quiz, || {
                    let (questions, answers) = cloze_questions(text, *count);
                    WorksheetContent::Quiz { questions, answers }
                })
            }
        }
    }

    fn with_fallback(
        &self,
        prompt: &str,
        shape: ContentShape,
        fallback: impl FnOnce() -> WorksheetContent,
    ) -> GenerationOutcome {
        let mut notices = Vec::new();
        if let Some(parsed) = self.ask_ai(prompt, &mut notices) {
            return GenerationOutcome {
                content: shape.wrap(parsed),
                source: ContentSource::Ai,
                notices,
            };
        }

        info!("AI not working, using template generation");
        notices.push("AI generation unavailable, used template questions instead".to_string());
        GenerationOutcome {
            content: fallback(),
            source: ContentSource::Template,
            notices,
        }
    }

    /// One attempt at the provider. Every failure is recorded as a notice and
    /// yields `None`.
    fn ask_ai(&self, prompt: &str, notices: &mut Vec<String>) -> Option<ParsedResponse> {
        let provider = self.provider.as_deref()?;
        if !provider.is_working() {
            return None;
        }

        match provider.generate(prompt) {
            Ok(raw) => match parse_response(&raw).filter(ParsedResponse::is_usable) {
                Some(parsed) => Some(parsed),
                None => {
                    warn!(provider = provider.name(), "AI reply did not follow the Questions/Answers format");
                    notices.push(format!("{} reply could not be parsed", provider.name()));
                    None
                }
            },
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "AI generation failed");
                notices.push(format!("AI Error: {}", e));
                None
            }
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    // ------------------------------------------------------------------------
    // Template generators
    // ------------------------------------------------------------------------

    fn story_problems(&self, count: usize) -> WorksheetContent {
        let mut rng = self.rng();
        let (questions, answers) = (0..count.max(1))
            .filter_map(|i| {
                let operation = STORY_OPERATIONS[i % STORY_OPERATIONS.len()];
                let fact = generate_facts(&mut rng, operation, 1, STORY_MIN, STORY_MAX).pop()?;
                Some(story(i, operation, fact.operand_a, fact.operand_b, fact.result))
            })
            .unzip();
        WorksheetContent::WordProblems { questions, answers }
    }

    fn subject_fallback(&self, subject: Subject, topic: &str, count: usize, exercise_type: &str) -> WorksheetContent {
        let count = count.max(1);
        if subject == Subject::Math {
            let (questions, answers) = MathFactGenerator::new().with_seed(self.seed).generate(
                Operation::Add,
                count,
                FALLBACK_MATH_MIN,
                FALLBACK_MATH_MAX,
            );
            return WorksheetContent::MathQuestions { questions, answers };
        }

        let (question, answer) = subject.placeholder(topic, exercise_type);
        WorksheetContent::WordProblems {
            questions: vec![question; count],
            answers: vec![answer; count],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ContentShape {
    WordProblems,
    Quiz,
}

impl ContentShape {
    fn wrap(self, parsed: ParsedResponse) -> WorksheetContent {
        let ParsedResponse { questions, answers } = parsed;
        match self {
            ContentShape::WordProblems => WorksheetContent::WordProblems { questions, answers },
            ContentShape::Quiz => WorksheetContent::Quiz { questions, answers },
        }
    }
}

// ============================================================================
// Story Templates
// ============================================================================

const STORY_OPERATIONS: [Operation; 4] = [Operation::Add, Operation::Sub, Operation::Mul, Operation::Div];
const STORY_NAMES: [&str; 5] = ["Somchai", "Malee", "Niran", "Ploy", "Anan"];
const STORY_ITEMS: [&str; 5] = ["mangoes", "pencils", "marbles", "stickers", "oranges"];

fn story(index: usize, operation: Operation, a: i64, b: i64, result: i64) -> (String, String) {
    let name = STORY_NAMES[index % STORY_NAMES.len()];
    let item = STORY_ITEMS[(index / STORY_OPERATIONS.len()) % STORY_ITEMS.len()];
    let question = match operation {
        Operation::Add => format!(
            "{name} has {a} {item}. A friend gives {name} {b} more. How many {item} does {name} have now?"
        ),
        Operation::Sub => format!("{name} had {a} {item} and gave away {b}. How many {item} are left?"),
        Operation::Mul => format!("There are {a} bags with {b} {item} in each bag. How many {item} are there altogether?"),
        Operation::Div => format!("{name} shares {a} {item} equally among {b} friends. How many {item} does each friend get?"),
    };
    let answer = format!("{} {} {} = {} {}", a, operation.symbol(), b, result, item);
    (question, answer)
}

// ============================================================================
// Cloze Quiz
// ============================================================================

/// Fill-in-the-blank questions cut from the source text: the longest word of
/// each usable sentence is blanked out and becomes the answer.
pub fn cloze_questions(text: &str, count: usize) -> (Vec<String>, Vec<String>) {
    let mut questions = Vec::new();
    let mut answers = Vec::new();

    for sentence in split_sentences(text) {
        if questions.len() >= count.max(1) {
            break;
        }
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.len() < MIN_CLOZE_WORDS {
            continue;
        }

        let target = words
            .iter()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.chars().count() >= MIN_CLOZE_ANSWER_CHARS)
            .fold(None::<&str>, |best, w| match best {
                Some(b) if b.chars().count() >= w.chars().count() => Some(b),
                _ => Some(w),
            });

        if let Some(answer) = target {
            questions.push(format!("Fill in the blank: {}", sentence.replacen(answer, BLANK, 1)));
            answers.push(answer.to_string());
        }
    }

    if questions.is_empty() {
        questions.push("Write three facts you learned from the text.".to_string());
        answers.push("Answers will vary.".to_string());
    }
    (questions, answers)
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if matches!(ch, '.' | '!' | '?' | '\n') {
            if matches!(ch, '.' | '!' | '?') {
                current.push(ch);
            }
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        } else {
            current.push(ch);
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}
