use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::error::AppError;
use crate::forms::{self, wizard, FormSchema, FormValues, StepError};
use crate::models::FormKind;
use crate::state::SharedState;
use crate::submission::{parser, pipeline};

#[derive(Serialize)]
pub struct FormSummary {
    pub kind: FormKind,
    pub slug: String,
    pub title: &'static str,
    pub description: &'static str,
    pub collection: &'static str,
    pub steps: usize,
}

pub(crate) fn parse_kind(kind: &str) -> Result<FormKind, AppError> {
    FormKind::parse(kind).ok_or_else(|| AppError::NotFound(format!("Unknown form: {kind}")))
}

pub async fn list_forms() -> Json<Vec<FormSummary>> {
    Json(
        forms::catalog::all()
            .iter()
            .map(|schema| FormSummary {
                kind: schema.kind,
                slug: schema.kind.slug(),
                title: schema.title,
                description: schema.description,
                collection: schema.kind.collection().as_str(),
                steps: schema.steps.len(),
            })
            .collect(),
    )
}

pub async fn get_form(Path(kind): Path<String>) -> Result<Json<&'static FormSchema>, AppError> {
    Ok(Json(forms::schema(parse_kind(&kind)?)))
}

/// Validate one wizard step. The body holds everything entered so far, so branching
/// conditions on earlier steps resolve the same way the final submit will.
pub async fn validate_step(
    Path((kind, step)): Path<(String, String)>,
    Json(values): Json<FormValues>,
) -> Result<Json<serde_json::Value>, AppError> {
    let schema = forms::schema(parse_kind(&kind)?);
    match wizard::next_step(schema, &step, &values) {
        Ok(next) => Ok(Json(json!({
            "valid": true,
            "next_step": next.map(|s| s.id),
        }))),
        Err(StepError::UnknownStep(id)) => Err(AppError::NotFound(format!("Unknown step: {id}"))),
        Err(StepError::Invalid(errors)) => Err(AppError::Validation(errors)),
    }
}

/// Parse any of the accepted body encodings into fields and files.
pub(crate) async fn read_body(
    state: &SharedState,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<parser::ParsedBody, AppError> {
    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok());

    if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        parser::parse_multipart(headers, body, state.config.max_upload_size)
            .await
            .map_err(AppError::BadRequest)
    } else {
        parser::parse_body(content_type, &body).map_err(AppError::BadRequest)
    }
}

pub async fn submit(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    let parsed = read_body(&state, &headers, body).await?;

    let result = pipeline::run(&state, kind, &headers, Some(addr.ip()), parsed).await?;

    if result.spam {
        // Bots get the same shape of answer as a real success, minus the id
        return Ok((StatusCode::OK, Json(json!({ "status": "ok" }))).into_response());
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "created",
            "submission_id": result.submission_id,
        })),
    )
        .into_response())
}
