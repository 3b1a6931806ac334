use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Collection, FormKind, NewSubmission, Status, Submission};

/// Insert a new submission. The status column is never taken from the caller.
pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    new: &NewSubmission,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "INSERT INTO submissions (id, collection, kind, form_data, status, metadata)
         VALUES ($1, $2, $3, $4, 'pending', $5) RETURNING *",
    )
    .bind(new.id)
    .bind(new.kind.collection().as_str())
    .bind(new.kind.as_str())
    .bind(&new.form_data)
    .bind(&new.metadata)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, Default, Clone)]
pub struct ListFilter {
    pub collection: Option<Collection>,
    pub kind: Option<FormKind>,
    pub status: Option<Status>,
    pub search: Option<String>,
}

impl ListFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE true");
        if let Some(collection) = self.collection {
            qb.push(" AND collection = ").push_bind(collection.as_str());
        }
        if let Some(kind) = self.kind {
            qb.push(" AND kind = ").push_bind(kind.as_str());
        }
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = contains_pattern(search.trim());
            // values only; keys like `email` would otherwise match every row
            qb.push(
                " AND (EXISTS (SELECT 1 FROM jsonb_each_text(form_data) AS f(key, value) WHERE f.value ILIKE ",
            )
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\') OR coalesce(notes, '') ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
        }
    }
}

/// `%term%` with LIKE wildcards in the term taken literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Newest first. `limit` of `None` returns every match (exports).
pub async fn list(
    pool: &PgPool,
    filter: &ListFilter,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<Submission>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM submissions");
    filter.push_where(&mut qb);
    qb.push(" ORDER BY submitted_at DESC, id DESC");
    if let Some(limit) = limit {
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
    }
    qb.build_query_as::<Submission>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &ListFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM submissions");
    filter.push_where(&mut qb);
    let row: (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(row.0)
}

/// Set the status. `processed_at` follows it: stamped when leaving pending, cleared when returning.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: Status,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "UPDATE submissions
         SET status = $2,
             processed_at = CASE WHEN $2 = 'pending' THEN NULL ELSE now() END
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await
}

pub async fn update_notes(
    pool: &PgPool,
    id: Uuid,
    notes: Option<&str>,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("UPDATE submissions SET notes = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(notes)
        .fetch_optional(pool)
        .await
}

/// Attachment rows go with it through the foreign key cascade.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct StatusCount {
    pub collection: String,
    pub status: String,
    pub count: i64,
}

pub async fn status_counts(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as::<_, StatusCount>(
        "SELECT collection, status, COUNT(*) AS count FROM submissions
         GROUP BY collection, status ORDER BY collection, status",
    )
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ana cruz"), "%ana cruz%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }
}
