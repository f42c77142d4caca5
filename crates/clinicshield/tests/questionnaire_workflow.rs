//! End-to-end questionnaire scenarios against the embedded DSPT v8 GP catalog,
//! driven only through the public service facade.

use std::sync::Arc;

use clinicshield::questionnaire::{
    AssessmentId, Catalog, EvidenceItemId, Identity, InMemoryQuestionnaireRepository, InputType,
    NewOrganisation, OrganisationType, QuestionnaireService, QuestionnaireServiceError,
    SaveAnswerRequest, YesNoValue,
};

const YEAR: &str = "2025-26";

fn service() -> QuestionnaireService<InMemoryQuestionnaireRepository> {
    let catalog = Catalog::dspt_v8_gp().expect("embedded catalog loads");
    QuestionnaireService::new(
        Arc::new(InMemoryQuestionnaireRepository::default()),
        Arc::new(catalog),
        YEAR,
    )
}

fn onboard(
    service: &QuestionnaireService<InMemoryQuestionnaireRepository>,
    identity: &Identity,
) -> AssessmentId {
    service
        .create_organisation(
            Some(identity),
            NewOrganisation {
                name: "Riverside Surgery".to_string(),
                organisation_type: OrganisationType::Gp,
                ods_code: Some("Y01234".to_string()),
                staff_count: Some(18),
            },
        )
        .expect("organisation created");

    service
        .questionnaire_state(Some(identity), None)
        .expect("state loads")
        .expect("assessment opened")
        .assessment_id
}

fn text(assessment: &AssessmentId, item: &str, value: &str) -> SaveAnswerRequest {
    SaveAnswerRequest {
        assessment_id: assessment.clone(),
        evidence_item_id: EvidenceItemId(item.to_string()),
        yes_no_value: None,
        text_value: Some(value.to_string()),
    }
}

fn yes_no(assessment: &AssessmentId, item: &str, value: YesNoValue) -> SaveAnswerRequest {
    SaveAnswerRequest {
        assessment_id: assessment.clone(),
        evidence_item_id: EvidenceItemId(item.to_string()),
        yes_no_value: Some(value),
        text_value: None,
    }
}

#[test]
fn a_new_practice_starts_on_the_first_standard_with_nothing_answered() {
    let service = service();
    let identity = Identity::new("user_riverside");
    onboard(&service, &identity);

    let state = service
        .questionnaire_state(Some(&identity), None)
        .expect("state loads")
        .expect("state present");

    assert_eq!(state.dspt_year, YEAR);
    assert_eq!(state.completion_percent, 0.0);
    assert_eq!(state.mandatory_total, 29);
    assert_eq!(state.mandatory_answered, 0);
    assert_eq!(state.standards.len(), 10);
    assert_eq!(state.current_standard.number, 1);
    assert_eq!(state.current_standard.items.len(), 13);
    assert_eq!(state.current_standard.items[0].reference, "1.1.1");
    assert_eq!(state.current_standard.items[0].input_type, InputType::Text);
}

#[test]
fn answering_items_moves_completion_in_forty_fifths() {
    let service = service();
    let identity = Identity::new("user_progress");
    let assessment = onboard(&service, &identity);

    let outcome = service
        .save_answer(Some(&identity), text(&assessment, "1.1.1", "Dr A. Shah"))
        .expect("text answer saved");
    assert_eq!(outcome.completion_percent, 2.2);

    let outcome = service
        .save_answer(
            Some(&identity),
            yes_no(&assessment, "1.2.4", YesNoValue::Partial),
        )
        .expect("yes/no answer saved");
    assert_eq!(outcome.completion_percent, 4.4);

    let outcome = service
        .save_answer(Some(&identity), yes_no(&assessment, "1.2.4", YesNoValue::Yes))
        .expect("answer overwritten");
    assert_eq!(outcome.completion_percent, 4.4);

    let state = service
        .questionnaire_state(Some(&identity), Some(1))
        .expect("state loads")
        .expect("state present");
    assert_eq!(state.completion_percent, 4.4);
    assert_eq!(state.mandatory_answered, 2);
    assert_eq!(state.standards[0].answered_count, 2);
    let answered = state
        .current_standard
        .items
        .iter()
        .find(|question| question.reference == "1.2.4")
        .expect("1.2.4 listed");
    assert_eq!(answered.yes_no_value, Some(YesNoValue::Yes));
}

#[test]
fn clearing_a_text_answer_removes_its_credit() {
    let service = service();
    let identity = Identity::new("user_clearing");
    let assessment = onboard(&service, &identity);

    service
        .save_answer(Some(&identity), text(&assessment, "1.1.5", "Annual review"))
        .expect("answer saved");
    let outcome = service
        .save_answer(Some(&identity), text(&assessment, "1.1.5", "   "))
        .expect("answer cleared");

    assert_eq!(outcome.completion_percent, 0.0);
}

#[test]
fn document_items_cannot_be_answered_yet() {
    let service = service();
    let identity = Identity::new("user_documents");
    let assessment = onboard(&service, &identity);

    let result = service.save_answer(Some(&identity), text(&assessment, "1.1.2", "policy.pdf"));

    assert!(matches!(
        result,
        Err(QuestionnaireServiceError::UnsupportedInputType(InputType::Document))
    ));
}

#[test]
fn practices_cannot_answer_each_others_assessments() {
    let service = service();
    let owner = Identity::new("user_owner_practice");
    let other = Identity::new("user_other_practice");
    let assessment = onboard(&service, &owner);
    onboard(&service, &other);

    let result = service.save_answer(
        Some(&other),
        yes_no(&assessment, "1.2.4", YesNoValue::Yes),
    );

    assert!(matches!(result, Err(QuestionnaireServiceError::Forbidden)));
}
