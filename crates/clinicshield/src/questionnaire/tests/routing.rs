use super::common::*;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::questionnaire::domain::{AssessmentId, EvidenceItemId, YesNoValue};
use crate::questionnaire::router::{
    self, identity_from_headers, questionnaire_router, StateQuery, SUBJECT_HEADER,
};
use crate::questionnaire::service::{QuestionnaireService, SaveAnswerRequest};

fn subject_headers(subject: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        SUBJECT_HEADER,
        HeaderValue::from_str(subject).expect("valid header"),
    );
    headers
}

fn json_request(method: Method, uri: &str, subject: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(subject) = subject {
        builder = builder.header(SUBJECT_HEADER, subject);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

#[test]
fn identity_requires_a_non_blank_subject() {
    assert!(identity_from_headers(&HeaderMap::new()).is_none());
    assert!(identity_from_headers(&subject_headers("   ")).is_none());

    let mut headers = subject_headers("user_1");
    headers.insert("x-user-email", HeaderValue::from_static("pm@example.nhs.uk"));
    let identity = identity_from_headers(&headers).expect("identity present");
    assert_eq!(identity.subject, "user_1");
    assert_eq!(identity.email.as_deref(), Some("pm@example.nhs.uk"));
    assert!(identity.name.is_none());
}

#[tokio::test]
async fn save_handler_returns_unauthorized_without_identity() {
    let (service, _) = build_service();

    let response = router::save_answer_handler(
        State(Arc::new(service)),
        HeaderMap::new(),
        axum::Json(SaveAnswerRequest {
            assessment_id: AssessmentId("asmt-1".to_string()),
            evidence_item_id: EvidenceItemId("1.1.1".to_string()),
            yes_no_value: Some(YesNoValue::Yes),
            text_value: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("not authenticated"));
}

#[tokio::test]
async fn save_handler_maps_validation_errors_to_unprocessable() {
    let (service, repository) = build_service();
    let (_, assessment) = onboard(&service, repository.as_ref(), "user_owner");

    let response = router::save_answer_handler(
        State(Arc::new(service)),
        subject_headers("user_owner"),
        axum::Json(SaveAnswerRequest {
            assessment_id: assessment,
            evidence_item_id: EvidenceItemId("1.1.1".to_string()),
            yes_no_value: None,
            text_value: Some("yes".to_string()),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn save_handler_returns_internal_error_on_repository_failure() {
    let service = QuestionnaireService::new(
        Arc::new(UnavailableRepository),
        small_catalog(),
        DSPT_YEAR,
    );

    let response = router::save_answer_handler(
        State(Arc::new(service)),
        subject_headers("user_offline"),
        axum::Json(SaveAnswerRequest {
            assessment_id: AssessmentId("asmt-1".to_string()),
            evidence_item_id: EvidenceItemId("1.1.1".to_string()),
            yes_no_value: Some(YesNoValue::Yes),
            text_value: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn state_handler_returns_null_for_new_users() {
    let (service, _) = build_service();

    let response = router::state_handler(
        State(Arc::new(service)),
        subject_headers("user_new"),
        Query(StateQuery::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await, Value::Null);
}

#[tokio::test]
async fn onboarding_then_answering_through_the_router() {
    let (service, _) = build_service();
    let app = questionnaire_router(Arc::new(service));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/organisations",
            Some("user_router"),
            json!({ "name": "Hillside Practice", "organisation_type": "gp" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let organisation = read_json_body(response).await;
    assert_eq!(organisation["name"], json!("Hillside Practice"));

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/v1/questionnaire?standard=abc")
                .header(SUBJECT_HEADER, "user_router")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let state = read_json_body(response).await;
    assert_eq!(state["current_standard"]["number"], json!(1));
    assert_eq!(state["completion_percent"], json!(0.0));
    let assessment_id = state["assessment_id"]
        .as_str()
        .expect("assessment id")
        .to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/questionnaire/answers",
            Some("user_router"),
            json!({
                "assessment_id": assessment_id,
                "evidence_item_id": "1.1.1",
                "yes_no_value": "not_sure",
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = read_json_body(response).await;
    assert_eq!(outcome["completion_percent"], json!(20.0));

    let response = app
        .oneshot(
            Request::get("/api/v1/organisations/current")
                .header(SUBJECT_HEADER, "user_router")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let current = read_json_body(response).await;
    assert_eq!(current["id"], organisation["id"]);
}

#[tokio::test]
async fn unsupported_input_types_are_rejected_through_the_router() {
    let (service, repository) = build_service();
    let (_, assessment) = onboard(&service, repository.as_ref(), "user_owner");
    let app = questionnaire_router(Arc::new(service));

    let response = app
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/questionnaire/answers",
            Some("user_owner"),
            json!({
                "assessment_id": assessment.0,
                "evidence_item_id": "1.2.1",
                "text_value": "iar.pdf",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("document"));
}

#[tokio::test]
async fn catalog_standards_are_public() {
    let (service, _) = build_service();
    let app = questionnaire_router(Arc::new(service));

    let response = app
        .oneshot(
            Request::get("/api/v1/catalog/standards")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total_items"], json!(5));
    assert_eq!(payload["dspt_year"], json!(DSPT_YEAR));
    assert_eq!(payload["standards"].as_array().map(Vec::len), Some(2));
}
