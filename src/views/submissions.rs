use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use uuid::Uuid;

use super::public::ChoiceView;
use super::render;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::forms;
use crate::models::{Attachment, Collection, Status, Submission};
use crate::present::{self, FieldGroup};
use crate::review;
use crate::routes::submissions::{self as api, total_pages, ListParams};
use crate::state::SharedState;

pub(crate) struct RowView {
    pub id: String,
    pub headline: String,
    pub kind_label: &'static str,
    pub status: String,
    pub status_label: &'static str,
    pub submitted_at: String,
    pub email: String,
}

fn kind_label(sub: &Submission) -> &'static str {
    sub.form_kind().map(|k| k.label()).unwrap_or("Unknown form")
}

fn status_label(sub: &Submission) -> &'static str {
    sub.status().map(Status::label).unwrap_or("Unknown")
}

pub(crate) fn row_view(sub: &Submission) -> RowView {
    RowView {
        id: sub.id.to_string(),
        headline: present::headline(sub),
        kind_label: kind_label(sub),
        status: sub.status.clone(),
        status_label: status_label(sub),
        submitted_at: present::format_timestamp(&sub.submitted_at),
        email: sub.contact_email().unwrap_or_default().to_string(),
    }
}

#[derive(Template)]
#[template(path = "admin/list.html")]
struct ListTemplate {
    parish_name: String,
    user_name: String,
    is_admin: bool,
    slug: &'static str,
    label: &'static str,
    rows: Vec<RowView>,
    kind_options: Vec<ChoiceView>,
    status_options: Vec<ChoiceView>,
    search: String,
    total: i64,
    page: i64,
    total_pages: i64,
    prev_link: Option<String>,
    next_link: Option<String>,
}

struct AttachmentView {
    id: String,
    filename: String,
    content_type: String,
    size: String,
}

fn attachment_view(a: &Attachment) -> AttachmentView {
    AttachmentView {
        id: a.id.to_string(),
        filename: a.filename.clone(),
        content_type: a.content_type.clone(),
        size: human_size(a.size_bytes),
    }
}

fn human_size(bytes: i64) -> String {
    match bytes {
        b if b < 1024 => format!("{b} B"),
        b if b < 1024 * 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
    }
}

#[derive(Template)]
#[template(path = "admin/detail.html")]
struct DetailTemplate {
    parish_name: String,
    user_name: String,
    is_admin: bool,
    id: String,
    headline: String,
    kind_label: &'static str,
    collection_slug: String,
    collection_label: &'static str,
    status: String,
    status_label: &'static str,
    submitted_at: String,
    processed_at: Option<String>,
    notes: String,
    groups: Vec<FieldGroup>,
    attachments: Vec<AttachmentView>,
    status_options: Vec<ChoiceView>,
    mailto: Option<String>,
    email: Option<String>,
    ip: String,
    user_agent: String,
}

#[derive(Template)]
#[template(path = "admin/print.html")]
struct PrintTemplate {
    parish_name: String,
    id: String,
    headline: String,
    kind_label: &'static str,
    status_label: &'static str,
    submitted_at: String,
    processed_at: Option<String>,
    notes: Option<String>,
    groups: Vec<FieldGroup>,
    printed_at: String,
}

#[derive(Deserialize)]
pub struct StatusForm {
    pub status: String,
}

#[derive(Deserialize)]
pub struct NotesForm {
    pub notes: Option<String>,
}

fn parse_collection(slug: &str) -> Result<Collection, AppError> {
    Collection::parse(slug).ok_or_else(|| AppError::NotFound(format!("Unknown collection: {slug}")))
}

fn page_link(slug: &str, params: &ListParams, page: i64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in [
        ("kind", &params.kind),
        ("status", &params.status),
        ("search", &params.search),
    ] {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            query.append_pair(key, v);
        }
    }
    query.append_pair("page", &page.to_string());
    format!("/admin/collections/{slug}?{}", query.finish())
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let collection = parse_collection(&slug)?;

    let mut filter = params.filter()?;
    filter.collection = Some(collection);
    // A kind from another collection would silently match nothing
    if filter.kind.is_some_and(|k| k.collection() != collection) {
        filter.kind = None;
    }
    let (page, per_page, offset) = params.page();

    let submissions = db::submissions::list(&state.pool, &filter, Some(per_page), offset).await?;
    let total = db::submissions::count(&state.pool, &filter).await?;
    let pages = total_pages(total, per_page);

    let kind_options = collection
        .kinds()
        .map(|k| ChoiceView {
            value: k.as_str().to_string(),
            label: k.label().to_string(),
            selected: filter.kind == Some(k),
        })
        .collect();
    let status_options = review::status_choices(collection)
        .into_iter()
        .map(|s| ChoiceView {
            value: s.as_str().to_string(),
            label: s.label().to_string(),
            selected: filter.status == Some(s),
        })
        .collect();

    render(&ListTemplate {
        parish_name: state.config.parish_name.clone(),
        user_name: auth.name.clone(),
        is_admin: auth.is_admin(),
        slug: collection.as_str(),
        label: collection.label(),
        rows: submissions.iter().map(row_view).collect(),
        kind_options,
        status_options,
        search: filter.search.clone().unwrap_or_default(),
        total,
        page,
        total_pages: pages,
        prev_link: (page > 1).then(|| page_link(collection.as_str(), &params, page - 1)),
        next_link: (page < pages).then(|| page_link(collection.as_str(), &params, page + 1)),
    })
}

pub async fn detail(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sub = api::load(&state, id).await?;
    let attachments = db::attachments::list_by_submission(&state.pool, id).await?;
    let kind = sub.form_kind();
    let collection = sub.collection();

    let headline = present::headline(&sub);
    let email = sub.contact_email().map(str::to_string);
    let mailto = email.as_deref().map(|to| {
        let label = kind.map(|k| k.label()).unwrap_or("parish");
        present::mailto_link(
            to,
            &format!("Your {label} request - {}", state.config.parish_name),
            &format!("Dear {headline},\n\nThank you for contacting {}.\n\n", state.config.parish_name),
        )
    });

    let status_options = collection
        .map(review::status_choices)
        .unwrap_or_default()
        .into_iter()
        .map(|s| ChoiceView {
            value: s.as_str().to_string(),
            label: s.label().to_string(),
            selected: s.as_str() == sub.status,
        })
        .collect();

    let meta = |key: &str| {
        sub.metadata
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    render(&DetailTemplate {
        parish_name: state.config.parish_name.clone(),
        user_name: auth.name.clone(),
        is_admin: auth.is_admin(),
        id: sub.id.to_string(),
        kind_label: kind_label(&sub),
        collection_slug: sub.collection.clone(),
        collection_label: collection.map(|c| c.label()).unwrap_or("Submissions"),
        status: sub.status.clone(),
        status_label: status_label(&sub),
        submitted_at: present::format_timestamp(&sub.submitted_at),
        processed_at: sub.processed_at.as_ref().map(present::format_timestamp),
        notes: sub.notes.clone().unwrap_or_default(),
        groups: present::group_fields(kind.map(forms::schema), &sub.form_data),
        attachments: attachments.iter().map(attachment_view).collect(),
        status_options,
        mailto,
        email,
        ip: meta("ip"),
        user_agent: meta("user_agent"),
        headline,
    })
}

pub async fn print(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sub = api::load(&state, id).await?;

    render(&PrintTemplate {
        parish_name: state.config.parish_name.clone(),
        id: sub.id.to_string(),
        headline: present::headline(&sub),
        kind_label: kind_label(&sub),
        status_label: status_label(&sub),
        submitted_at: present::format_timestamp(&sub.submitted_at),
        processed_at: sub.processed_at.as_ref().map(present::format_timestamp),
        notes: sub.notes.clone(),
        groups: present::group_fields(sub.form_kind().map(forms::schema), &sub.form_data),
        printed_at: present::format_timestamp(&chrono::Utc::now()),
    })
}

fn back_to(id: Uuid) -> Response {
    Redirect::to(&format!("/admin/submissions/{id}")).into_response()
}

pub async fn update_status(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    api::apply_status(&state, &auth, id, &form.status).await?;
    Ok(back_to(id))
}

pub async fn update_notes(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Form(form): Form<NotesForm>,
) -> Result<Response, AppError> {
    api::apply_notes(&state, &auth, id, form.notes.as_deref()).await?;
    Ok(back_to(id))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let sub = api::load(&state, id).await?;
    api::remove(&state, &auth, id).await?;
    Ok(Redirect::to(&format!("/admin/collections/{}", sub.collection)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_human() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn page_links_keep_filters() {
        let params = ListParams {
            status: Some("pending".to_string()),
            search: Some("Cruz family".to_string()),
            ..ListParams::default()
        };
        assert_eq!(
            page_link("sacraments", &params, 2),
            "/admin/collections/sacraments?status=pending&search=Cruz+family&page=2"
        );
    }
}
