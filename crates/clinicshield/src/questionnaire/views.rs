use serde::Serialize;

use super::domain::{AssessmentId, EvidenceItemId, InputType, YesNoValue};

/// Everything the wizard needs to render one step.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionnaireState {
    pub assessment_id: AssessmentId,
    pub dspt_year: String,
    pub completion_percent: f64,
    pub mandatory_total: usize,
    pub mandatory_answered: usize,
    pub standards: Vec<StandardProgress>,
    pub current_standard: CurrentStandard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardProgress {
    pub number: u32,
    pub title: String,
    pub description: String,
    pub item_count: usize,
    pub answered_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentStandard {
    pub number: u32,
    pub title: String,
    pub description: String,
    pub items: Vec<QuestionView>,
}

/// An evidence item joined with the caller's current answer.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: EvidenceItemId,
    pub reference: String,
    pub input_type: InputType,
    pub plain_english_question: String,
    pub evidence_text: String,
    pub clinic_help: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    pub mandatory: bool,
    pub yes_no_value: Option<YesNoValue>,
    pub text_value: String,
}

/// Result of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SaveAnswerOutcome {
    pub completion_percent: f64,
}

/// Catalog-only overview of one standard; needs no caller context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardSummary {
    pub number: u32,
    pub title: String,
    pub description: String,
    pub item_count: usize,
    pub mandatory_count: usize,
}
