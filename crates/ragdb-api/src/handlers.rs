use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use ragdb_pipeline::Source;

use crate::error::ApiError;
use crate::server::AppState;
use crate::user::{NewUser, User};

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct CreatedResponse {
    message: String,
    result: User,
}

#[derive(Deserialize)]
pub(crate) struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<Source>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    index_loaded: bool,
}

fn rejected(rejection: &JsonRejection) -> ApiError {
    ApiError::Rejected { status: rejection.status(), message: rejection.body_text() }
}

pub(crate) async fn hello_handler() -> impl IntoResponse {
    Json(MessageResponse { message: "Hello world! Remembering axum again".into() })
}

pub(crate) async fn hello_name_handler(Path(name): Path<String>) -> impl IntoResponse {
    Json(MessageResponse { message: format!("Hello {name}") })
}

pub(crate) async fn create_user_handler(
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new_user) = payload.map_err(|r| rejected(&r))?;
    let user = new_user.validate().map_err(ApiError::Validation)?;
    tracing::info!(username = %user.username, "user created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { message: format!("User '{}' created!", user.username), result: user }),
    ))
}

pub(crate) async fn ask_handler(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|r| rejected(&r))?;
    let answerer = state.answerer.as_ref().ok_or(ApiError::NoContext)?;
    let answer = answerer.ask(&req.question).await.map_err(|e| ApiError::Upstream(format!("{e:#}")))?;
    Ok(Json(AskResponse { answer: answer.text, sources: answer.sources }))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        index_loaded: state.answerer.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse { status: "ok", uptime_secs: 42, index_loaded: false };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
    }
}
