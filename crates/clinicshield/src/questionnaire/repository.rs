use chrono::{DateTime, Utc};

use super::domain::{
    Answer, Assessment, AssessmentId, EvidenceItemId, Organisation, OrganisationId, User,
    YesNoValue,
};

/// Storage abstraction standing in for the hosted data platform.
///
/// `onboard` and `record_answer` are compound operations: implementations
/// must apply each as a single atomic unit.
pub trait QuestionnaireRepository: Send + Sync {
    /// Stores the organisation, links the user to it and opens its first
    /// assessment as one atomic unit. Nothing is written when any part
    /// conflicts. Returns the records as stored.
    fn onboard(&self, onboarding: Onboarding) -> Result<Onboarding, RepositoryError>;
    fn fetch_organisation(
        &self,
        id: &OrganisationId,
    ) -> Result<Option<Organisation>, RepositoryError>;

    fn fetch_user(&self, subject: &str) -> Result<Option<User>, RepositoryError>;

    fn fetch_assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError>;
    fn find_assessment(
        &self,
        organisation_id: &OrganisationId,
        dspt_year: &str,
    ) -> Result<Option<Assessment>, RepositoryError>;

    fn answers_for(&self, assessment_id: &AssessmentId) -> Result<Vec<Answer>, RepositoryError>;

    /// Upserts the answer keyed by (assessment, evidence item), then stores
    /// `scorer` applied to the assessment's full answer set as its completion
    /// percentage. Returns the updated assessment.
    fn record_answer(
        &self,
        change: AnswerChange,
        scorer: &dyn Fn(&[Answer]) -> f64,
    ) -> Result<Assessment, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Everything onboarding writes.
#[derive(Debug, Clone)]
pub struct Onboarding {
    pub organisation: Organisation,
    /// Stored as given for a first-time subject. An existing user keeps its
    /// role and contact details and only gains the organisation link.
    pub user: User,
    pub assessment: Assessment,
}

/// The single field a save touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerPatch {
    YesNo(YesNoValue),
    /// Normalized text; blank answers are stored as an empty string.
    Text(String),
}

/// A pending write for one (assessment, evidence item) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerChange {
    pub assessment_id: AssessmentId,
    pub evidence_item_id: EvidenceItemId,
    pub patch: AnswerPatch,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl AnswerChange {
    /// Patches `existing` in place, or builds a fresh answer carrying only the
    /// patched field.
    pub fn apply(self, existing: Option<Answer>) -> Answer {
        let mut answer = existing.unwrap_or_else(|| Answer {
            assessment_id: self.assessment_id.clone(),
            evidence_item_id: self.evidence_item_id.clone(),
            yes_no_value: None,
            text_value: None,
            file_id: None,
            comments: None,
            updated_by: String::new(),
            updated_at: self.updated_at,
        });

        match self.patch {
            AnswerPatch::YesNo(value) => answer.yes_no_value = Some(value),
            AnswerPatch::Text(value) => answer.text_value = Some(value),
        }
        answer.updated_by = self.updated_by;
        answer.updated_at = self.updated_at;
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::domain::FileId;
    use chrono::TimeZone;

    fn change(patch: AnswerPatch) -> AnswerChange {
        AnswerChange {
            assessment_id: AssessmentId("asmt-1".to_string()),
            evidence_item_id: EvidenceItemId("1.1.1".to_string()),
            patch,
            updated_by: "user_2".to_string(),
            updated_at: Utc.with_ymd_and_hms(2025, 10, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn apply_creates_answer_with_only_the_patched_field() {
        let answer = change(AnswerPatch::YesNo(YesNoValue::Partial)).apply(None);
        assert_eq!(answer.yes_no_value, Some(YesNoValue::Partial));
        assert!(answer.text_value.is_none());
        assert!(answer.file_id.is_none());
        assert_eq!(answer.updated_by, "user_2");
        assert_eq!(answer.evidence_item_id.0, "1.1.1");
    }

    #[test]
    fn apply_preserves_untouched_fields_of_existing_answer() {
        let existing = Answer {
            assessment_id: AssessmentId("asmt-1".to_string()),
            evidence_item_id: EvidenceItemId("1.1.1".to_string()),
            yes_no_value: None,
            text_value: Some("old".to_string()),
            file_id: Some(FileId("file_9".to_string())),
            comments: Some("checked by IG lead".to_string()),
            updated_by: "user_1".to_string(),
            updated_at: Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
        };

        let answer = change(AnswerPatch::Text("Z1234567".to_string())).apply(Some(existing));
        assert_eq!(answer.text_value.as_deref(), Some("Z1234567"));
        assert_eq!(answer.file_id, Some(FileId("file_9".to_string())));
        assert_eq!(answer.comments.as_deref(), Some("checked by IG lead"));
        assert_eq!(answer.updated_by, "user_2");
    }
}
