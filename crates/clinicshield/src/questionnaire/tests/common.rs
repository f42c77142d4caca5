use std::io::Cursor;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::questionnaire::catalog::{Catalog, CatalogImporter};
use crate::questionnaire::domain::{
    Answer, Assessment, AssessmentId, Identity, Organisation, OrganisationId, OrganisationType,
    User,
};
use crate::questionnaire::memory::InMemoryQuestionnaireRepository;
use crate::questionnaire::repository::{
    AnswerChange, Onboarding, QuestionnaireRepository, RepositoryError,
};
use crate::questionnaire::service::{NewOrganisation, QuestionnaireService};

pub(super) const DSPT_YEAR: &str = "2025-26";

/// Two standards, five items: one of each input type plus a second yes/no.
pub(super) const SMALL_CATALOG: &str = "\
standard_number,standard_title,standard_description,assertion_ref,assertion_title,evidence_ref,input_type,mandatory,approaching_mandatory,new_in_v8,exemptions,evidence_text,tooltip,plain_english_question,clinic_help,change_from_v7
1,Personal Confidential Data,Confidentiality,1.1,Lawfulness,1.1.1,yes_no,true,true,false,,Is there a DPO?,,Do you have a DPO?,Name your DPO.,
1,Personal Confidential Data,Confidentiality,1.1,Lawfulness,1.1.2,text,true,false,false,,ICO number?,Register with the ICO.,What is your ICO number?,Check the ICO site.,
1,Personal Confidential Data,Confidentiality,1.2,Records,1.2.1,document,false,false,false,iso27001,Upload the IAR,,Upload your IAR,Asset register.,
2,Staff Responsibilities,Staff,2.1,Contracts,2.1.1,date,false,false,true,,Last review date?,,When did you last review?,Pick a date.,
2,Staff Responsibilities,Staff,2.1,Contracts,2.1.2,yes_no,false,false,false,,Staff sign?,,Do staff sign?,Contracts.,
";

pub(super) fn small_catalog() -> Arc<Catalog> {
    Arc::new(CatalogImporter::from_reader(Cursor::new(SMALL_CATALOG)).expect("small catalog parses"))
}

pub(super) fn identity(subject: &str) -> Identity {
    Identity {
        subject: subject.to_string(),
        email: Some(format!("{subject}@example.nhs.uk")),
        name: Some("Practice Manager".to_string()),
    }
}

pub(super) fn build_service() -> (
    QuestionnaireService<InMemoryQuestionnaireRepository>,
    Arc<InMemoryQuestionnaireRepository>,
) {
    let repository = Arc::new(InMemoryQuestionnaireRepository::default());
    let service = QuestionnaireService::new(repository.clone(), small_catalog(), DSPT_YEAR);
    (service, repository)
}

pub(super) fn new_practice(name: &str) -> NewOrganisation {
    NewOrganisation {
        name: name.to_string(),
        organisation_type: OrganisationType::Gp,
        ods_code: Some(" A81001 ".to_string()),
        staff_count: Some(14),
    }
}

/// Onboards `subject` and returns their organisation and assessment.
pub(super) fn onboard<R>(
    service: &QuestionnaireService<R>,
    repository: &R,
    subject: &str,
) -> (Organisation, AssessmentId)
where
    R: QuestionnaireRepository + 'static,
{
    let organisation = service
        .create_organisation(Some(&identity(subject)), new_practice("Riverside Surgery"))
        .expect("organisation created");
    let assessment = repository
        .find_assessment(&organisation.id, DSPT_YEAR)
        .expect("lookup succeeds")
        .expect("assessment opened");
    (organisation, assessment.id)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Knows one member but fails every read and write past the user lookup.
pub(super) struct UnavailableRepository;

impl QuestionnaireRepository for UnavailableRepository {
    fn onboard(&self, _onboarding: Onboarding) -> Result<Onboarding, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_organisation(
        &self,
        _id: &OrganisationId,
    ) -> Result<Option<Organisation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_user(&self, subject: &str) -> Result<Option<User>, RepositoryError> {
        Ok(Some(User {
            subject: subject.to_string(),
            email: String::new(),
            name: None,
            organisation_id: Some(OrganisationId("org-offline".to_string())),
            role: crate::questionnaire::domain::UserRole::Viewer,
        }))
    }

    fn fetch_assessment(&self, _id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_assessment(
        &self,
        _organisation_id: &OrganisationId,
        _dspt_year: &str,
    ) -> Result<Option<Assessment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn answers_for(&self, _assessment_id: &AssessmentId) -> Result<Vec<Answer>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_answer(
        &self,
        _change: AnswerChange,
        _scorer: &dyn Fn(&[Answer]) -> f64,
    ) -> Result<Assessment, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
