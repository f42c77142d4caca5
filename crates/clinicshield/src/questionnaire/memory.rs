use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Answer, Assessment, AssessmentId, EvidenceItemId, Organisation, OrganisationId, User,
};
use super::repository::{AnswerChange, Onboarding, QuestionnaireRepository, RepositoryError};

#[derive(Debug, Default)]
struct MemoryState {
    organisations: HashMap<OrganisationId, Organisation>,
    users: HashMap<String, User>,
    assessments: HashMap<AssessmentId, Assessment>,
    answers: HashMap<(AssessmentId, EvidenceItemId), Answer>,
}

/// Process-local repository. One mutex guards every table so that `onboard`
/// and `record_answer` observe and write a consistent snapshot.
#[derive(Debug, Default, Clone)]
pub struct InMemoryQuestionnaireRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryQuestionnaireRepository {
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }

    /// Number of stored answers across all assessments.
    pub fn answer_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.answers.len())
    }
}

impl QuestionnaireRepository for InMemoryQuestionnaireRepository {
    fn onboard(&self, onboarding: Onboarding) -> Result<Onboarding, RepositoryError> {
        let Onboarding {
            organisation,
            user,
            assessment,
        } = onboarding;

        let mut state = self.lock()?;
        let duplicate_period = state.assessments.values().any(|existing| {
            existing.organisation_id == assessment.organisation_id
                && existing.dspt_year == assessment.dspt_year
        });
        if duplicate_period
            || state.organisations.contains_key(&organisation.id)
            || state.assessments.contains_key(&assessment.id)
        {
            return Err(RepositoryError::Conflict);
        }

        let user = match state.users.get(&user.subject) {
            Some(existing) => User {
                organisation_id: user.organisation_id,
                ..existing.clone()
            },
            None => user,
        };

        state
            .organisations
            .insert(organisation.id.clone(), organisation.clone());
        state.users.insert(user.subject.clone(), user.clone());
        state
            .assessments
            .insert(assessment.id.clone(), assessment.clone());

        Ok(Onboarding {
            organisation,
            user,
            assessment,
        })
    }

    fn fetch_organisation(
        &self,
        id: &OrganisationId,
    ) -> Result<Option<Organisation>, RepositoryError> {
        Ok(self.lock()?.organisations.get(id).cloned())
    }

    fn fetch_user(&self, subject: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(subject).cloned())
    }

    fn fetch_assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        Ok(self.lock()?.assessments.get(id).cloned())
    }

    fn find_assessment(
        &self,
        organisation_id: &OrganisationId,
        dspt_year: &str,
    ) -> Result<Option<Assessment>, RepositoryError> {
        Ok(self
            .lock()?
            .assessments
            .values()
            .find(|assessment| {
                &assessment.organisation_id == organisation_id && assessment.dspt_year == dspt_year
            })
            .cloned())
    }

    fn answers_for(&self, assessment_id: &AssessmentId) -> Result<Vec<Answer>, RepositoryError> {
        let state = self.lock()?;
        let mut answers: Vec<Answer> = state
            .answers
            .values()
            .filter(|answer| &answer.assessment_id == assessment_id)
            .cloned()
            .collect();
        answers.sort_by(|a, b| a.evidence_item_id.cmp(&b.evidence_item_id));
        Ok(answers)
    }

    fn record_answer(
        &self,
        change: AnswerChange,
        scorer: &dyn Fn(&[Answer]) -> f64,
    ) -> Result<Assessment, RepositoryError> {
        let mut state = self.lock()?;
        if !state.assessments.contains_key(&change.assessment_id) {
            return Err(RepositoryError::NotFound);
        }

        let assessment_id = change.assessment_id.clone();
        let updated_at = change.updated_at;
        let key = (assessment_id.clone(), change.evidence_item_id.clone());
        let existing = state.answers.remove(&key);
        state.answers.insert(key, change.apply(existing));

        let answers: Vec<Answer> = state
            .answers
            .values()
            .filter(|answer| answer.assessment_id == assessment_id)
            .cloned()
            .collect();
        let completion_percent = scorer(&answers);

        let assessment = state
            .assessments
            .get_mut(&assessment_id)
            .ok_or(RepositoryError::NotFound)?;
        assessment.completion_percent = completion_percent;
        assessment.last_activity_at = updated_at;
        Ok(assessment.clone())
    }
}
