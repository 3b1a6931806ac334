use std::net::IpAddr;

use axum::http::HeaderMap;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db;
use crate::db::attachments::NewAttachment;
use crate::error::AppError;
use crate::forms::{self, wizard, FieldKind};
use crate::models::{FormKind, NewSubmission, Submission};
use crate::review;
use crate::state::SharedState;
use crate::storage;

use super::honeypot;
use super::metadata;
use super::parser::{ParsedBody, UploadedFile};

#[derive(Debug)]
pub struct PipelineResult {
    pub submission_id: Option<Uuid>,
    pub spam: bool,
}

struct StoredFile {
    attachment_id: Uuid,
    key: String,
    upload: UploadedFile,
}

/// Reject file parts that don't belong to a file field of this form or aren't an accepted type.
fn check_uploads(state: &SharedState, kind: FormKind, files: &[UploadedFile]) -> Result<(), AppError> {
    let schema = forms::schema(kind);
    for (i, file) in files.iter().enumerate() {
        if files[..i].iter().any(|f| f.field == file.field) {
            return Err(AppError::BadRequest(format!(
                "Only one file may be uploaded for {}",
                file.field
            )));
        }
        match schema.field(&file.field) {
            Some((_, def)) if def.kind == FieldKind::File => {}
            _ => {
                return Err(AppError::BadRequest(format!(
                    "Unexpected file field: {}",
                    file.field
                )));
            }
        }
        if !state.config.accepts_upload_type(&file.content_type) {
            return Err(AppError::BadRequest(format!(
                "Files of type {} are not accepted",
                file.content_type
            )));
        }
        if file.bytes.len() > state.config.max_upload_size {
            return Err(AppError::BadRequest(format!(
                "File '{}' is too large",
                file.filename
            )));
        }
    }
    Ok(())
}

/// Upload files one after another. On any failure, what was already stored is removed.
async fn store_files(
    state: &SharedState,
    kind: FormKind,
    submission_id: Uuid,
    files: Vec<UploadedFile>,
) -> Result<Vec<StoredFile>, AppError> {
    let mut stored: Vec<StoredFile> = Vec::with_capacity(files.len());
    for upload in files {
        let attachment_id = Uuid::now_v7();
        let key = storage::object_key(kind.collection(), submission_id, attachment_id, &upload.filename);
        if let Err(e) = state
            .storage
            .put(&key, upload.bytes.clone(), &upload.content_type)
            .await
        {
            let keys: Vec<String> = stored.iter().map(|s| s.key.clone()).collect();
            review::remove_blobs(state.storage.as_ref(), &keys).await;
            return Err(e.into());
        }
        stored.push(StoredFile {
            attachment_id,
            key,
            upload,
        });
    }
    Ok(stored)
}

async fn persist(
    state: &SharedState,
    new: &NewSubmission,
    stored: &[StoredFile],
) -> Result<Submission, sqlx::Error> {
    let mut tx = state.pool.begin().await?;
    let submission = db::submissions::create(&mut *tx, new).await?;
    for file in stored {
        db::attachments::create(
            &mut *tx,
            &NewAttachment {
                id: file.attachment_id,
                submission_id: submission.id,
                field: &file.upload.field,
                filename: &file.upload.filename,
                content_type: &file.upload.content_type,
                size_bytes: file.upload.bytes.len() as i64,
                storage_key: &file.key,
            },
        )
        .await?;
    }
    tx.commit().await?;
    Ok(submission)
}

/// Public submit path: rate limit, honeypot, server-side wizard validation, file storage,
/// insert as `pending`, then notify the office in the background.
pub async fn run(
    state: &SharedState,
    kind: FormKind,
    headers: &HeaderMap,
    peer_addr: Option<IpAddr>,
    body: ParsedBody,
) -> Result<PipelineResult, AppError> {
    let ip = metadata::client_ip(headers, peer_addr, &state.config.trusted_proxies);
    state
        .submission_limiter
        .check(
            kind,
            ip,
            state.config.submission_rate_limit,
            state.config.submission_rate_window_secs,
        )
        .map_err(AppError::RateLimited)?;

    let ParsedBody { mut fields, files } = body;

    if honeypot::is_spam(&fields) {
        tracing::info!("Honeypot tripped on {kind} form from {ip}");
        return Ok(PipelineResult {
            submission_id: None,
            spam: true,
        });
    }

    check_uploads(state, kind, &files)?;
    // File fields are only ever filled from real uploads
    let schema = forms::schema(kind);
    for def in schema.fields().filter(|f| f.kind == FieldKind::File) {
        fields.remove(def.name);
    }
    for file in &files {
        fields.insert(file.field.clone(), json!({ "filename": file.filename }));
    }

    wizard::validate_all(schema, &fields).map_err(AppError::Validation)?;
    let mut form_data = wizard::normalize(schema, &fields);

    let submission_id = Uuid::now_v7();
    let stored = store_files(state, kind, submission_id, files).await?;
    for file in &stored {
        form_data.insert(
            file.upload.field.clone(),
            json!({
                "attachment_id": file.attachment_id,
                "filename": file.upload.filename,
            }),
        );
    }

    let new = NewSubmission {
        id: submission_id,
        kind,
        form_data: Value::Object(form_data),
        metadata: metadata::extract(headers, peer_addr, &state.config.trusted_proxies).to_json(),
    };

    let submission = match persist(state, &new, &stored).await {
        Ok(s) => s,
        Err(e) => {
            let keys: Vec<String> = stored.iter().map(|s| s.key.clone()).collect();
            review::remove_blobs(state.storage.as_ref(), &keys).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        "New {kind} submission {} with {} attachment(s)",
        submission.id,
        stored.len()
    );

    notify_office(state, submission.clone());

    Ok(PipelineResult {
        submission_id: Some(submission.id),
        spam: false,
    })
}

fn notify_office(state: &SharedState, submission: Submission) {
    let (Some(mailer), Some(office)) = (state.system_mailer.clone(), state.config.office_email.clone())
    else {
        return;
    };
    let base_url = state.config.base_url.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer
            .send_submission_received(&office, &submission, &base_url)
            .await
        {
            tracing::error!("Failed to send submission notice for {}: {e}", submission.id);
        }
    });
}
