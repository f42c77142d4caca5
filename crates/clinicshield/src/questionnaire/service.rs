use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::catalog::Catalog;
use super::domain::{
    Answer, Assessment, AssessmentId, AssessmentStatus, EvidenceItemId, Identity, InputType,
    Organisation, OrganisationId, OrganisationType, User, UserRole, YesNoValue,
};
use super::repository::{
    AnswerChange, AnswerPatch, Onboarding, QuestionnaireRepository, RepositoryError,
};
use super::scoring::{calculate_completion_percent, is_answer_filled, normalize_text_answer};
use super::views::{
    CurrentStandard, QuestionView, QuestionnaireState, SaveAnswerOutcome, StandardProgress,
    StandardSummary,
};

static ORGANISATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_organisation_id() -> OrganisationId {
    let id = ORGANISATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OrganisationId(format!("org-{id:06}"))
}

fn next_assessment_id() -> AssessmentId {
    let id = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("asmt-{id:06}"))
}

/// Payload for saving one answer. Which field is used depends on the
/// evidence item's input type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveAnswerRequest {
    pub assessment_id: AssessmentId,
    pub evidence_item_id: EvidenceItemId,
    #[serde(default)]
    pub yes_no_value: Option<YesNoValue>,
    #[serde(default)]
    pub text_value: Option<String>,
}

/// Onboarding payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewOrganisation {
    pub name: String,
    pub organisation_type: OrganisationType,
    #[serde(default)]
    pub ods_code: Option<String>,
    #[serde(default)]
    pub staff_count: Option<u32>,
}

/// A caller resolved to a local user attached to an organisation.
struct Member {
    identity: Identity,
    organisation_id: OrganisationId,
}

/// Service composing the catalog, the repository and the scoring engine.
pub struct QuestionnaireService<R> {
    repository: Arc<R>,
    catalog: Arc<Catalog>,
    dspt_year: String,
}

impl<R> QuestionnaireService<R>
where
    R: QuestionnaireRepository + 'static,
{
    pub fn new(repository: Arc<R>, catalog: Arc<Catalog>, dspt_year: impl Into<String>) -> Self {
        Self {
            repository,
            catalog,
            dspt_year: dspt_year.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn dspt_year(&self) -> &str {
        &self.dspt_year
    }

    fn member(&self, identity: Option<&Identity>) -> Result<Option<Member>, RepositoryError> {
        let Some(identity) = identity else {
            return Ok(None);
        };
        let user = self.repository.fetch_user(&identity.subject)?;
        Ok(user
            .and_then(|user| user.organisation_id)
            .map(|organisation_id| Member {
                identity: identity.clone(),
                organisation_id,
            }))
    }

    /// Persist one answer and the assessment's recomputed completion percentage.
    pub fn save_answer(
        &self,
        identity: Option<&Identity>,
        request: SaveAnswerRequest,
    ) -> Result<SaveAnswerOutcome, QuestionnaireServiceError> {
        let member = self
            .member(identity)?
            .ok_or(QuestionnaireServiceError::Unauthenticated)?;

        let assessment = self
            .repository
            .fetch_assessment(&request.assessment_id)?
            .ok_or(QuestionnaireServiceError::NotFound("assessment"))?;
        if assessment.organisation_id != member.organisation_id {
            return Err(QuestionnaireServiceError::Forbidden);
        }

        let item = self
            .catalog
            .item(&request.evidence_item_id)
            .ok_or(QuestionnaireServiceError::NotFound("evidence item"))?;

        let patch = match item.input_type {
            InputType::YesNo => {
                let value = request.yes_no_value.ok_or_else(|| {
                    QuestionnaireServiceError::Validation(
                        "yes_no questions require yes_no_value".to_string(),
                    )
                })?;
                AnswerPatch::YesNo(value)
            }
            InputType::Text => AnswerPatch::Text(
                normalize_text_answer(request.text_value.as_deref()).unwrap_or_default(),
            ),
            unsupported @ (InputType::Document | InputType::Date) => {
                return Err(QuestionnaireServiceError::UnsupportedInputType(unsupported));
            }
        };

        let total_items = self.catalog.total_items();
        let scorer = move |answers: &[Answer]| calculate_completion_percent(total_items, answers);

        let change = AnswerChange {
            assessment_id: assessment.id,
            evidence_item_id: item.id.clone(),
            patch,
            updated_by: member.identity.subject,
            updated_at: Utc::now(),
        };
        let updated = self.repository.record_answer(change, &scorer)?;

        debug!(
            assessment = %updated.id,
            evidence_item = %item.id,
            completion_percent = updated.completion_percent,
            "answer saved"
        );

        Ok(SaveAnswerOutcome {
            completion_percent: updated.completion_percent,
        })
    }

    /// Assemble the wizard state for the caller's assessment in the configured
    /// year. `None` when the caller has no organisation or assessment yet.
    pub fn questionnaire_state(
        &self,
        identity: Option<&Identity>,
        standard_number: Option<u32>,
    ) -> Result<Option<QuestionnaireState>, QuestionnaireServiceError> {
        let Some(member) = self.member(identity)? else {
            return Ok(None);
        };
        let Some(assessment) = self
            .repository
            .find_assessment(&member.organisation_id, &self.dspt_year)?
        else {
            return Ok(None);
        };
        let Some(first_standard) = self.catalog.standards().first() else {
            return Ok(None);
        };

        let answers = self.repository.answers_for(&assessment.id)?;
        let answers_by_item: HashMap<&EvidenceItemId, &Answer> = answers
            .iter()
            .map(|answer| (&answer.evidence_item_id, answer))
            .collect();

        let mut item_counts: HashMap<u32, usize> = HashMap::new();
        let mut answered_counts: HashMap<u32, usize> = HashMap::new();
        let mut mandatory_answered = 0;
        for item in self.catalog.items() {
            *item_counts.entry(item.standard_number).or_default() += 1;
            let filled = answers_by_item
                .get(&item.id)
                .is_some_and(|answer| is_answer_filled(*answer));
            if !filled {
                continue;
            }
            *answered_counts.entry(item.standard_number).or_default() += 1;
            if item.mandatory {
                mandatory_answered += 1;
            }
        }

        let selected = standard_number
            .and_then(|number| self.catalog.standard(number))
            .unwrap_or(first_standard);

        let items = self
            .catalog
            .items_for_standard(selected.number)
            .into_iter()
            .map(|item| {
                let answer = answers_by_item.get(&item.id);
                QuestionView {
                    id: item.id.clone(),
                    reference: item.reference.clone(),
                    input_type: item.input_type,
                    plain_english_question: item.plain_english_question.clone(),
                    evidence_text: item.evidence_text.clone(),
                    clinic_help: item.clinic_help.clone(),
                    tooltip: item.tooltip.clone(),
                    mandatory: item.mandatory,
                    yes_no_value: answer.and_then(|answer| answer.yes_no_value),
                    text_value: answer
                        .and_then(|answer| answer.text_value.clone())
                        .unwrap_or_default(),
                }
            })
            .collect();

        let standards = self
            .catalog
            .standards()
            .iter()
            .map(|standard| StandardProgress {
                number: standard.number,
                title: standard.title.clone(),
                description: standard.description.clone(),
                item_count: item_counts.get(&standard.number).copied().unwrap_or(0),
                answered_count: answered_counts.get(&standard.number).copied().unwrap_or(0),
            })
            .collect();

        Ok(Some(QuestionnaireState {
            assessment_id: assessment.id,
            dspt_year: assessment.dspt_year,
            completion_percent: calculate_completion_percent(self.catalog.total_items(), &answers),
            mandatory_total: self.catalog.mandatory_items(),
            mandatory_answered,
            standards,
            current_standard: CurrentStandard {
                number: selected.number,
                title: selected.title.clone(),
                description: selected.description.clone(),
                items,
            },
        }))
    }

    /// Create an organisation, link the caller to it and open an assessment
    /// for the configured year.
    pub fn create_organisation(
        &self,
        identity: Option<&Identity>,
        request: NewOrganisation,
    ) -> Result<Organisation, QuestionnaireServiceError> {
        let identity = identity.ok_or(QuestionnaireServiceError::Unauthenticated)?;

        let name = request.name.trim();
        if name.is_empty() {
            return Err(QuestionnaireServiceError::Validation(
                "organisation name must not be blank".to_string(),
            ));
        }

        let organisation_id = next_organisation_id();
        let stored = self.repository.onboard(Onboarding {
            organisation: Organisation {
                id: organisation_id.clone(),
                name: name.to_string(),
                organisation_type: request.organisation_type,
                ods_code: normalize_text_answer(request.ods_code.as_deref()),
                ico_registration_number: None,
                staff_count: request.staff_count,
                onboarding_complete: true,
                created_by: identity.subject.clone(),
            },
            user: User {
                subject: identity.subject.clone(),
                email: identity.email.clone().unwrap_or_default(),
                name: identity.name.clone(),
                organisation_id: Some(organisation_id.clone()),
                role: UserRole::PracticeManager,
            },
            assessment: Assessment {
                id: next_assessment_id(),
                organisation_id,
                dspt_year: self.dspt_year.clone(),
                status: AssessmentStatus::InProgress,
                completion_percent: 0.0,
                last_activity_at: Utc::now(),
            },
        })?;

        info!(
            organisation = %stored.organisation.id,
            assessment = %stored.assessment.id,
            dspt_year = %stored.assessment.dspt_year,
            "organisation onboarded"
        );

        Ok(stored.organisation)
    }

    /// The caller's organisation, if they have joined one.
    pub fn current_organisation(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Option<Organisation>, QuestionnaireServiceError> {
        let Some(member) = self.member(identity)? else {
            return Ok(None);
        };
        Ok(self.repository.fetch_organisation(&member.organisation_id)?)
    }

    /// Catalog overview for unauthenticated pages.
    pub fn standard_summaries(&self) -> Vec<StandardSummary> {
        self.catalog
            .standards()
            .iter()
            .map(|standard| {
                let items = self.catalog.items_for_standard(standard.number);
                StandardSummary {
                    number: standard.number,
                    title: standard.title.clone(),
                    description: standard.description.clone(),
                    item_count: items.len(),
                    mandatory_count: items.iter().filter(|item| item.mandatory).count(),
                }
            })
            .collect()
    }
}

/// Wizard step from a `?standard=` query value. Reads the leading digits after
/// an optional `+`, so `4abc` and `+4` are 4. Absent, non-numeric and values
/// below 1 fall back to 1.
pub fn parse_standard_number(raw: Option<&str>) -> u32 {
    let Some(value) = raw else {
        return 1;
    };
    let value = value.trim();
    let digits: String = value
        .strip_prefix('+')
        .unwrap_or(value)
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    match digits.parse::<u32>() {
        Ok(number) if number >= 1 => number,
        Ok(_) => 1,
        Err(_) if digits.is_empty() => 1,
        Err(_) => u32::MAX,
    }
}

/// Error raised by the questionnaire service.
#[derive(Debug, thiserror::Error)]
pub enum QuestionnaireServiceError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("input type \"{0}\" is not supported")]
    UnsupportedInputType(InputType),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
