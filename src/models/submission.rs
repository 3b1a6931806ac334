use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kind::{Collection, FormKind, Status};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub collection: String,
    pub kind: String,
    pub form_data: serde_json::Value,
    pub status: String,
    pub notes: Option<String>,
    pub metadata: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn collection(&self) -> Option<Collection> {
        Collection::parse(&self.collection)
    }

    pub fn form_kind(&self) -> Option<FormKind> {
        FormKind::parse(&self.kind)
    }

    pub fn status(&self) -> Option<Status> {
        Status::parse(&self.status)
    }

    /// First email-typed value found in the form data, used for contacting the submitter.
    pub fn contact_email(&self) -> Option<&str> {
        let obj = self.form_data.as_object()?;
        ["email", "contact_email", "parent_email", "groom_email", "bride_email"]
            .iter()
            .find_map(|key| {
                obj.get(*key)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
            })
    }
}

/// A submission about to be inserted. Status is not part of it: new rows are always pending.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub id: Uuid,
    pub kind: FormKind,
    pub form_data: serde_json::Value,
    pub metadata: serde_json::Value,
}
