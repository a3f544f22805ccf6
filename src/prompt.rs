// Prompt templates. Every template ends with the Questions:/Answers: layout
// that `parser::parse_response` understands.

/// Characters of source text sent with a quiz prompt
pub const QUIZ_TEXT_BUDGET: usize = 2000;

const ANSWER_FORMAT: &str = "Format:
Questions:
1. [question 1]
2. [question 2]
...

Answers:
1. [answer 1]
2. [answer 2]
...";

pub fn exercise_prompt(subject: &str, topic: &str, grade: &str, count: usize, exercise_type: &str) -> String {
    format!(
        "Create {count} {subject} exercises for Thai students.
Grade: {grade}
Topic: {topic}
Exercise Type: {exercise_type}

Please provide questions and answers in Thai format.
Questions should be age-appropriate and educational.

{ANSWER_FORMAT}"
    )
}

pub fn english_prompt(topic: &str, grade: &str, count: usize, exercise_type: &str) -> String {
    format!(
        "Create {count} English {exercise_type} exercises for Thai students.
Grade: {grade}
Topic: {topic}

Write every question and answer in English.

{ANSWER_FORMAT}"
    )
}

pub fn word_problem_prompt(topic: &str, grade: &str, count: usize) -> String {
    format!(
        "Create {count} math word problems for Thai students.
Grade: {grade}
Topic: {topic}

Make problems interesting and age-appropriate. Use Thai context.
Give each answer with a short explanation.

{ANSWER_FORMAT}"
    )
}

pub fn quiz_prompt(text: &str, count: usize) -> String {
    format!(
        "Create {count} quiz questions based on the following text.
Generate questions that test comprehension.

Text: {}

{ANSWER_FORMAT}",
        truncate_chars(text, QUIZ_TEXT_BUDGET)
    )
}

/// First `max` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_end_with_the_parser_layout() {
        for prompt in [
            exercise_prompt("Science", "Plants", "ป.4", 5, "mix"),
            english_prompt("Animals", "ป.1", 3, "vocabulary"),
            word_problem_prompt("Space", "ป.2", 4),
            quiz_prompt("Some text.", 2),
        ] {
            assert!(prompt.contains("Questions:\n1."));
            assert!(prompt.contains("Answers:\n1."));
        }
    }

    #[test]
    fn quiz_text_is_truncated_on_char_boundaries() {
        let text = "ก".repeat(QUIZ_TEXT_BUDGET + 50);
        let prompt = quiz_prompt(&text, 3);
        assert_eq!(prompt.matches('ก').count(), QUIZ_TEXT_BUDGET);
    }

    #[test]
    fn truncate_short_text_is_untouched() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }
}
