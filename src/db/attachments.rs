use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Attachment;

pub struct NewAttachment<'a> {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub field: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub size_bytes: i64,
    pub storage_key: &'a str,
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    new: &NewAttachment<'_>,
) -> Result<Attachment, sqlx::Error> {
    sqlx::query_as::<_, Attachment>(
        "INSERT INTO attachments (id, submission_id, field, filename, content_type, size_bytes, storage_key)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(new.id)
    .bind(new.submission_id)
    .bind(new.field)
    .bind(new.filename)
    .bind(new.content_type)
    .bind(new.size_bytes)
    .bind(new.storage_key)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Attachment>, sqlx::Error> {
    sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_submission(
    pool: &PgPool,
    submission_id: Uuid,
) -> Result<Vec<Attachment>, sqlx::Error> {
    sqlx::query_as::<_, Attachment>(
        "SELECT * FROM attachments WHERE submission_id = $1 ORDER BY created_at",
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await
}
