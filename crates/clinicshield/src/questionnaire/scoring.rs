//! Completion scoring shared by the save and read paths.
//!
//! Everything here is total: no input can fail, so scoring never blocks a save.

use super::domain::{Answer, AnswerValues, FileId, YesNoValue};

/// Read access to the three fields that can carry an answer.
pub trait AnswerLike {
    fn yes_no_value(&self) -> Option<YesNoValue>;
    fn text_value(&self) -> Option<&str>;
    fn file_id(&self) -> Option<&FileId>;
}

impl AnswerLike for Answer {
    fn yes_no_value(&self) -> Option<YesNoValue> {
        self.yes_no_value
    }

    fn text_value(&self) -> Option<&str> {
        self.text_value.as_deref()
    }

    fn file_id(&self) -> Option<&FileId> {
        self.file_id.as_ref()
    }
}

impl AnswerLike for AnswerValues {
    fn yes_no_value(&self) -> Option<YesNoValue> {
        self.yes_no_value
    }

    fn text_value(&self) -> Option<&str> {
        self.text_value.as_deref()
    }

    fn file_id(&self) -> Option<&FileId> {
        self.file_id.as_ref()
    }
}

impl<T: AnswerLike + ?Sized> AnswerLike for &T {
    fn yes_no_value(&self) -> Option<YesNoValue> {
        (**self).yes_no_value()
    }

    fn text_value(&self) -> Option<&str> {
        (**self).text_value()
    }

    fn file_id(&self) -> Option<&FileId> {
        (**self).file_id()
    }
}

/// Strips Unicode whitespace and the byte order mark from both ends.
fn trim_answer(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

/// Any one populated field is enough; fields are not cross-validated here.
pub fn is_answer_filled<A: AnswerLike + ?Sized>(answer: &A) -> bool {
    if answer.yes_no_value().is_some() {
        return true;
    }
    if answer
        .text_value()
        .is_some_and(|text| !trim_answer(text).is_empty())
    {
        return true;
    }
    answer.file_id().is_some_and(|file| !file.0.is_empty())
}

/// Trims free text, collapsing blank input to `None` rather than `Some("")`.
pub fn normalize_text_answer(value: Option<&str>) -> Option<String> {
    let trimmed = trim_answer(value.unwrap_or_default());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Percentage of filled answers over `total_item_count`, rounded half-up to
/// one decimal place.
///
/// Answers are counted as given; a caller passing more than one answer per
/// item can push the result above 100.
pub fn calculate_completion_percent<I>(total_item_count: usize, answers: I) -> f64
where
    I: IntoIterator,
    I::Item: AnswerLike,
{
    if total_item_count == 0 {
        return 0.0;
    }

    let answered = answers
        .into_iter()
        .filter(|answer| is_answer_filled(answer))
        .count();

    ((answered as f64 / total_item_count as f64) * 1000.0).round() / 10.0
}
