use askama::Template;
use axum::extract::State;
use axum::response::IntoResponse;

use super::render;
use super::submissions::{row_view, RowView};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::submissions::ListFilter;
use crate::error::AppError;
use crate::models::{Collection, Status};
use crate::state::SharedState;

const RECENT_LIMIT: i64 = 10;

struct StatusCount {
    label: &'static str,
    count: i64,
}

struct CollectionCard {
    slug: &'static str,
    label: &'static str,
    total: i64,
    pending: i64,
    statuses: Vec<StatusCount>,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    parish_name: String,
    user_name: String,
    is_admin: bool,
    cards: Vec<CollectionCard>,
    recent: Vec<RowView>,
}

pub async fn index(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let counts = db::submissions::status_counts(&state.pool).await?;

    let cards = Collection::ALL
        .into_iter()
        .map(|collection| {
            let count_of = |status: Status| {
                counts
                    .iter()
                    .find(|c| c.collection == collection.as_str() && c.status == status.as_str())
                    .map(|c| c.count)
                    .unwrap_or(0)
            };
            let statuses: Vec<StatusCount> = collection
                .allowed_statuses()
                .iter()
                .map(|s| StatusCount {
                    label: s.label(),
                    count: count_of(*s),
                })
                .collect();
            CollectionCard {
                slug: collection.as_str(),
                label: collection.label(),
                total: statuses.iter().map(|s| s.count).sum(),
                pending: count_of(Status::Pending),
                statuses,
            }
        })
        .collect();

    let pending = ListFilter {
        status: Some(Status::Pending),
        ..ListFilter::default()
    };
    let recent = db::submissions::list(&state.pool, &pending, Some(RECENT_LIMIT), 0)
        .await?
        .iter()
        .map(row_view)
        .collect();

    render(&DashboardTemplate {
        parish_name: state.config.parish_name.clone(),
        user_name: auth.name.clone(),
        is_admin: auth.is_admin(),
        cards,
        recent,
    })
}
