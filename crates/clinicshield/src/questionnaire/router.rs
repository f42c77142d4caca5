use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::domain::Identity;
use super::repository::{QuestionnaireRepository, RepositoryError};
use super::service::{
    parse_standard_number, NewOrganisation, QuestionnaireService, QuestionnaireServiceError,
    SaveAnswerRequest,
};

/// Header carrying the authenticated subject, set by the upstream auth proxy.
pub const SUBJECT_HEADER: &str = "x-user-subject";
pub const EMAIL_HEADER: &str = "x-user-email";
pub const NAME_HEADER: &str = "x-user-name";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StateQuery {
    #[serde(default)]
    pub(crate) standard: Option<String>,
}

/// Router builder exposing the questionnaire, onboarding and catalog endpoints.
pub fn questionnaire_router<R>(service: Arc<QuestionnaireService<R>>) -> Router
where
    R: QuestionnaireRepository + 'static,
{
    Router::new()
        .route("/api/v1/questionnaire", get(state_handler::<R>))
        .route("/api/v1/questionnaire/answers", put(save_answer_handler::<R>))
        .route("/api/v1/organisations", post(create_organisation_handler::<R>))
        .route(
            "/api/v1/organisations/current",
            get(current_organisation_handler::<R>),
        )
        .route("/api/v1/catalog/standards", get(standards_handler::<R>))
        .with_state(service)
}

/// Reads the caller identity from request headers. A missing or blank
/// subject means the request is anonymous.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<Identity> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    header(SUBJECT_HEADER).map(|subject| Identity {
        subject,
        email: header(EMAIL_HEADER),
        name: header(NAME_HEADER),
    })
}

pub(crate) async fn state_handler<R>(
    State(service): State<Arc<QuestionnaireService<R>>>,
    headers: HeaderMap,
    Query(query): Query<StateQuery>,
) -> Response
where
    R: QuestionnaireRepository + 'static,
{
    let identity = identity_from_headers(&headers);
    let standard = parse_standard_number(query.standard.as_deref());
    match service.questionnaire_state(identity.as_ref(), Some(standard)) {
        Ok(state) => (StatusCode::OK, axum::Json(state)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn save_answer_handler<R>(
    State(service): State<Arc<QuestionnaireService<R>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<SaveAnswerRequest>,
) -> Response
where
    R: QuestionnaireRepository + 'static,
{
    let identity = identity_from_headers(&headers);
    match service.save_answer(identity.as_ref(), request) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_organisation_handler<R>(
    State(service): State<Arc<QuestionnaireService<R>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<NewOrganisation>,
) -> Response
where
    R: QuestionnaireRepository + 'static,
{
    let identity = identity_from_headers(&headers);
    match service.create_organisation(identity.as_ref(), request) {
        Ok(organisation) => (StatusCode::CREATED, axum::Json(organisation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn current_organisation_handler<R>(
    State(service): State<Arc<QuestionnaireService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: QuestionnaireRepository + 'static,
{
    let identity = identity_from_headers(&headers);
    match service.current_organisation(identity.as_ref()) {
        Ok(organisation) => (StatusCode::OK, axum::Json(organisation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn standards_handler<R>(
    State(service): State<Arc<QuestionnaireService<R>>>,
) -> Response
where
    R: QuestionnaireRepository + 'static,
{
    let payload = json!({
        "dspt_year": service.dspt_year(),
        "total_items": service.catalog().total_items(),
        "standards": service.standard_summaries(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) fn error_response(error: QuestionnaireServiceError) -> Response {
    let status = match &error {
        QuestionnaireServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        QuestionnaireServiceError::Forbidden => StatusCode::FORBIDDEN,
        QuestionnaireServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        QuestionnaireServiceError::Validation(_)
        | QuestionnaireServiceError::UnsupportedInputType(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QuestionnaireServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        QuestionnaireServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        QuestionnaireServiceError::Repository(RepositoryError::Unavailable(_)) => {
            warn!(%error, "repository unavailable");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
