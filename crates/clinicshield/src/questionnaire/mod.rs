//! DSPT questionnaire: catalog, completion scoring, answer persistence and the
//! HTTP surface used by the guided wizard.

pub mod catalog;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use catalog::{Catalog, CatalogImportError, CatalogImporter, SeedSummary};
pub use domain::{
    Answer, AnswerValues, Assertion, Assessment, AssessmentId, AssessmentStatus, EvidenceItem,
    EvidenceItemId, Exemption, FileId, Identity, InputType, Organisation, OrganisationId,
    OrganisationType, Standard, User, UserRole, YesNoValue,
};
pub use memory::InMemoryQuestionnaireRepository;
pub use repository::{
    AnswerChange, AnswerPatch, Onboarding, QuestionnaireRepository, RepositoryError,
};
pub use router::{identity_from_headers, questionnaire_router};
pub use scoring::{calculate_completion_percent, is_answer_filled, normalize_text_answer, AnswerLike};
pub use service::{
    parse_standard_number, NewOrganisation, QuestionnaireService, QuestionnaireServiceError,
    SaveAnswerRequest,
};
pub use views::{
    CurrentStandard, QuestionView, QuestionnaireState, SaveAnswerOutcome, StandardProgress,
    StandardSummary,
};
