use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::{Collection, Status, Submission};
use crate::storage::BlobStore;

/// Parse a requested status and make sure the record's collection allows it.
pub fn check_status(submission: &Submission, requested: &str) -> Result<Status, AppError> {
    let status = Status::parse(requested)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {requested}")))?;
    let collection = submission.collection().ok_or_else(|| {
        AppError::Internal(format!(
            "Submission {} has unknown collection {}",
            submission.id, submission.collection
        ))
    })?;

    if collection.allows(status) {
        Ok(status)
    } else {
        Err(AppError::BadRequest(format!(
            "Status '{status}' is not used for {}",
            collection.label().to_lowercase()
        )))
    }
}

/// Statuses a reviewer can pick for a collection, for select boxes.
pub fn status_choices(collection: Collection) -> Vec<Status> {
    collection.allowed_statuses().to_vec()
}

/// Remove stored blobs one by one. Failures are logged and counted, never raised.
pub async fn remove_blobs(store: &dyn BlobStore, keys: &[String]) -> usize {
    let mut failures = 0;
    for key in keys {
        if let Err(e) = store.delete(key).await {
            failures += 1;
            tracing::warn!("Failed to delete stored file {key} from {}: {e}", store.name());
        }
    }
    failures
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DeleteOutcome {
    pub files_removed: usize,
    pub files_failed: usize,
}

/// Delete a submission and its uploaded files. File removal is best effort and never
/// blocks the document delete. `None` when the submission did not exist.
pub async fn delete_submission(
    pool: &PgPool,
    store: &dyn BlobStore,
    id: Uuid,
) -> Result<Option<DeleteOutcome>, AppError> {
    if db::submissions::find_by_id(pool, id).await?.is_none() {
        return Ok(None);
    }

    let attachments = db::attachments::list_by_submission(pool, id).await?;
    let keys: Vec<String> = attachments.iter().map(|a| a.storage_key.clone()).collect();
    let files_failed = remove_blobs(store, &keys).await;

    if !db::submissions::delete(pool, id).await? {
        // Someone else deleted it between our read and our delete
        return Ok(None);
    }

    let outcome = DeleteOutcome {
        files_removed: attachments.len() - files_failed,
        files_failed,
    };
    tracing::info!(
        "Deleted submission {id} ({} file(s) removed, {} failed)",
        outcome.files_removed,
        outcome.files_failed
    );
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryBlobStore;

    fn submission(collection: &str) -> Submission {
        Submission {
            id: Uuid::now_v7(),
            collection: collection.to_string(),
            kind: "contact".to_string(),
            form_data: json!({}),
            status: "pending".to_string(),
            notes: None,
            metadata: json!({}),
            submitted_at: Utc::now(),
            processed_at: None,
        }
    }

    #[test]
    fn status_must_belong_to_collection() {
        let contact = submission("contacts");
        assert_eq!(check_status(&contact, "completed").unwrap(), Status::Completed);
        assert!(matches!(check_status(&contact, "approved"), Err(AppError::BadRequest(_))));
        assert!(matches!(check_status(&contact, "archived"), Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn blob_removal_tolerates_failures() {
        let store = MemoryBlobStore::new();
        for key in ["donations/s/a-1.png", "donations/s/b-2.png"] {
            store
                .put(key, Bytes::from_static(b"img"), "image/png")
                .await
                .unwrap();
        }
        store.fail_delete_of("donations/s/a-1.png");

        let keys = vec!["donations/s/a-1.png".to_string(), "donations/s/b-2.png".to_string()];
        let failed = remove_blobs(&store, &keys).await;
        assert_eq!(failed, 1);
        assert!(store.contains("donations/s/a-1.png"));
        assert!(!store.contains("donations/s/b-2.png"));
    }
}
