use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::submissions::ListFilter;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Collection, FormKind, Status, Submission};
use crate::review;
use crate::state::SharedState;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

#[derive(Deserialize, Default)]
pub struct ListParams {
    pub collection: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListParams {
    /// Blank query values (from an untouched select box) mean "no filter".
    pub fn filter(&self) -> Result<ListFilter, AppError> {
        fn non_empty(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }

        let collection = non_empty(&self.collection)
            .map(|c| {
                Collection::parse(c)
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown collection: {c}")))
            })
            .transpose()?;
        let kind = non_empty(&self.kind)
            .map(|k| FormKind::parse(k).ok_or_else(|| AppError::BadRequest(format!("Unknown form: {k}"))))
            .transpose()?;
        let status = non_empty(&self.status)
            .map(|s| Status::parse(s).ok_or_else(|| AppError::BadRequest(format!("Unknown status: {s}"))))
            .transpose()?;

        Ok(ListFilter {
            collection,
            kind,
            status,
            search: non_empty(&self.search).map(str::to_string),
        })
    }

    /// `(page, per_page, offset)` with page >= 1 and per_page clamped to 1..=100.
    pub fn page(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        (page, per_page, (page - 1) * per_page)
    }
}

pub fn total_pages(total: i64, per_page: i64) -> i64 {
    (total + per_page - 1) / per_page
}

#[derive(Deserialize)]
pub struct ExportParams {
    pub collection: Option<String>,
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Deserialize)]
pub struct NotesUpdate {
    pub notes: Option<String>,
}

pub(crate) async fn load(state: &SharedState, id: Uuid) -> Result<Submission, AppError> {
    db::submissions::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let filter = params.filter()?;
    let (page, per_page, offset) = params.page();

    let submissions = db::submissions::list(&state.pool, &filter, Some(per_page), offset).await?;
    let total = db::submissions::count(&state.pool, &filter).await?;

    Ok(Json(json!({
        "submissions": submissions,
        "total": total,
        "page": page,
        "per_page": per_page,
        "total_pages": total_pages(total, per_page),
    })))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let submission = load(&state, id).await?;
    let attachments = db::attachments::list_by_submission(&state.pool, id).await?;
    Ok(Json(json!({
        "submission": submission,
        "attachments": attachments,
    })))
}

pub(crate) async fn apply_status(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
    requested: &str,
) -> Result<Submission, AppError> {
    let current = load(state, id).await?;
    let status = review::check_status(&current, requested)?;

    let updated = db::submissions::update_status(&state.pool, id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "submission.status_changed",
        "submission",
        Some(id),
        Some(json!({ "from": current.status, "to": updated.status })),
    )
    .await;

    Ok(updated)
}

pub async fn update_status(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<Submission>, AppError> {
    Ok(Json(apply_status(&state, &auth, id, &req.status).await?))
}

pub(crate) async fn apply_notes(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
    notes: Option<&str>,
) -> Result<Submission, AppError> {
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    let updated = db::submissions::update_notes(&state.pool, id, notes)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "submission.notes_updated",
        "submission",
        Some(id),
        None,
    )
    .await;

    Ok(updated)
}

pub async fn update_notes(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NotesUpdate>,
) -> Result<Json<Submission>, AppError> {
    Ok(Json(apply_notes(&state, &auth, id, req.notes.as_deref()).await?))
}

pub(crate) async fn remove(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<review::DeleteOutcome, AppError> {
    auth.require_admin()?;

    let outcome = review::delete_submission(&state.pool, state.storage.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "submission.deleted",
        "submission",
        Some(id),
        Some(json!(outcome)),
    )
    .await;

    Ok(outcome)
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = remove(&state, &auth, id).await?;
    Ok(Json(json!({
        "message": "Deleted",
        "files_removed": outcome.files_removed,
        "files_failed": outcome.files_failed,
    })))
}

pub async fn export(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let collection = params
        .collection
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|c| {
            Collection::parse(c).ok_or_else(|| AppError::BadRequest(format!("Unknown collection: {c}")))
        })
        .transpose()?;

    let format = params.format.as_deref().unwrap_or("json");
    if !matches!(format, "csv" | "json") {
        return Err(AppError::BadRequest(format!("Unknown export format: {format}")));
    }

    let filter = ListFilter {
        collection,
        ..ListFilter::default()
    };
    let submissions = db::submissions::list(&state.pool, &filter, None, 0).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "submissions.exported",
        "submission",
        None,
        Some(json!({
            "collection": collection.map(|c| c.as_str()),
            "count": submissions.len(),
        })),
    )
    .await;

    let stem = collection.map(|c| c.as_str()).unwrap_or("submissions");
    if format == "csv" {
        let csv = export_csv(&submissions);
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{stem}.csv\""),
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(submissions).into_response())
    }
}

pub(crate) fn export_csv(submissions: &[Submission]) -> String {
    use std::fmt::Write;
    let mut csv = String::new();

    // Union of form keys in first-seen order
    let mut keys: Vec<String> = Vec::new();
    for sub in submissions {
        if let Some(obj) = sub.form_data.as_object() {
            for key in obj.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
    }

    let _ = write!(csv, "id,collection,kind,status,submitted_at,processed_at,notes");
    for key in &keys {
        let _ = write!(csv, ",{}", csv_escape(key));
    }
    let _ = writeln!(csv);

    for sub in submissions {
        let _ = write!(
            csv,
            "{},{},{},{},{},{},{}",
            sub.id,
            sub.collection,
            sub.kind,
            sub.status,
            sub.submitted_at.to_rfc3339(),
            sub.processed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            csv_escape(sub.notes.as_deref().unwrap_or("")),
        );
        for key in &keys {
            let val = sub
                .form_data
                .get(key)
                .map(|v| match v {
                    serde_json::Value::String(s) => csv_escape(s),
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::Object(obj) => obj
                        .get("filename")
                        .and_then(|f| f.as_str())
                        .map(csv_escape)
                        .unwrap_or_else(|| csv_escape(&v.to_string())),
                    other => csv_escape(&other.to_string()),
                })
                .unwrap_or_default();
            let _ = write!(csv, ",{val}");
        }
        let _ = writeln!(csv);
    }

    csv
}

fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub async fn stats(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let counts = db::submissions::status_counts(&state.pool).await?;

    let collections: Vec<serde_json::Value> = Collection::ALL
        .into_iter()
        .map(|collection| {
            let rows = counts.iter().filter(|c| c.collection == collection.as_str());
            let mut by_status = serde_json::Map::new();
            let mut total = 0;
            for status in collection.allowed_statuses() {
                by_status.insert(status.as_str().to_string(), json!(0));
            }
            for row in rows {
                by_status.insert(row.status.clone(), json!(row.count));
                total += row.count;
            }
            json!({
                "collection": collection.as_str(),
                "label": collection.label(),
                "total": total,
                "by_status": by_status,
            })
        })
        .collect();

    Ok(Json(json!({ "collections": collections })))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(form_data: serde_json::Value) -> Submission {
        Submission {
            id: Uuid::now_v7(),
            collection: "donations".to_string(),
            kind: "donation".to_string(),
            form_data,
            status: "pending".to_string(),
            notes: Some("called back, \"ok\"".to_string()),
            metadata: json!({}),
            submitted_at: Utc::now(),
            processed_at: None,
        }
    }

    #[test]
    fn csv_has_union_of_keys_and_escapes() {
        let csv = export_csv(&[
            row(json!({ "donor_name": "Cruz, Ana", "amount": 50 })),
            row(json!({ "proof_of_payment": { "attachment_id": "x", "filename": "r.png" } })),
        ]);
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.ends_with(",notes,amount,donor_name,proof_of_payment"));
        let first = lines.next().unwrap();
        assert!(first.contains(",50,\"Cruz, Ana\","));
        assert!(first.contains("\"called back, \"\"ok\"\"\""));
        assert!(lines.next().unwrap().ends_with(",,,r.png"));
    }

    #[test]
    fn paging_is_clamped() {
        let params = ListParams {
            page: Some(0),
            per_page: Some(1000),
            ..ListParams::default()
        };
        assert_eq!(params.page(), (1, 100, 0));
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(41, 20), 3);
    }

    #[test]
    fn blank_filters_are_ignored_and_bad_ones_rejected() {
        let params = ListParams {
            collection: Some(String::new()),
            status: Some("pending".to_string()),
            ..ListParams::default()
        };
        let filter = params.filter().unwrap();
        assert!(filter.collection.is_none());
        assert_eq!(filter.status, Some(Status::Pending));

        let bad = ListParams {
            kind: Some("exorcism".to_string()),
            ..ListParams::default()
        };
        assert!(matches!(bad.filter(), Err(AppError::BadRequest(_))));
    }
}
