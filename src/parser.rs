// Splits a model reply into parallel question and answer lists.
//
// The reply is expected to follow the template every prompt asks for:
//
// Questions:
// 1. ...
// 2. ...
// Answers:
// 1. ...
// 2. ...

pub const QUESTIONS_MARKER: &str = "Questions:";
pub const ANSWERS_MARKER: &str = "Answers:";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedResponse {
    pub questions: Vec<String>,
    pub answers: Vec<String>,
}

impl ParsedResponse {
    /// Both halves carry at least one entry.
    pub fn is_usable(&self) -> bool {
        !self.questions.is_empty() && !self.answers.is_empty()
    }
}

/// Returns `None` when the `Answers:` marker is missing; callers must then
/// fall back to a template generator.
pub fn parse_response(raw: &str) -> Option<ParsedResponse> {
    let mut parts = raw.split(ANSWERS_MARKER);
    let questions_half = parts.next()?;
    let answers_half = parts.next()?;

    Some(ParsedResponse {
        questions: clean_lines(questions_half),
        answers: clean_lines(answers_half),
    })
}

fn clean_lines(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_questions_header(line))
        .map(|line| strip_numbering(line).to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn is_questions_header(line: &str) -> bool {
    line.to_lowercase().starts_with(&QUESTIONS_MARKER.to_lowercase())
}

/// Drops a leading `12.` or `12)` list number.
fn strip_numbering(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return line;
    }
    let rest = &line[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(body) => body.trim_start(),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_template_reply() {
        let parsed = parse_response("Questions:\n1. Q1\n2. Q2\nAnswers:\n1. A1\n2. A2").unwrap();
        assert_eq!(parsed.questions, vec!["Q1", "Q2"]);
        assert_eq!(parsed.answers, vec!["A1", "A2"]);
    }

    #[test]
    fn missing_marker_is_none() {
        assert_eq!(parse_response("Q: what?\nA: that"), None);
        assert_eq!(parse_response(""), None);
    }

    #[test]
    fn keeps_decimals_inside_the_text() {
        let parsed = parse_response("Questions:\n1. What is 3.5 + 1.5?\nAnswers:\n1. 5.0").unwrap();
        assert_eq!(parsed.questions, vec!["What is 3.5 + 1.5?"]);
        assert_eq!(parsed.answers, vec!["5.0"]);
    }

    #[test]
    fn tolerates_blank_lines_and_paren_numbers() {
        let raw = "Here you go.\n\nquestions:\n\n1) First\n   2) Second  \n\nAnswers:\n\n1) One\n2) Two\n";
        let parsed = parse_response(raw).unwrap();
        assert_eq!(parsed.questions, vec!["Here you go.", "First", "Second"]);
        assert_eq!(parsed.answers, vec!["One", "Two"]);
    }

    #[test]
    fn unnumbered_lines_are_kept_verbatim() {
        let parsed = parse_response("Questions:\nName a colour\nAnswers:\nRed").unwrap();
        assert_eq!(parsed.questions, vec!["Name a colour"]);
        assert_eq!(parsed.answers, vec!["Red"]);
    }

    #[test]
    fn empty_halves_are_not_usable() {
        let parsed = parse_response("Questions:\nAnswers:\n").unwrap();
        assert!(!parsed.is_usable());
    }

    #[test]
    fn bare_number_is_not_stripped() {
        assert_eq!(strip_numbering("2024 was a leap year"), "2024 was a leap year");
        assert_eq!(strip_numbering("7. Seven"), "Seven");
    }
}
