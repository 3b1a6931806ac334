//! Turning stored form data into what reviewers read: labelled, grouped by wizard step,
//! with booleans, dates and file references rendered for humans.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::forms::wizard::{is_visible, parse_bool, parse_iso_date};
use crate::forms::{FieldKind, FormSchema};
use crate::models::Submission;

pub const NOT_PROVIDED: &str = "Not provided";
pub const EXTRA_GROUP_TITLE: &str = "Additional Information";

#[derive(Debug, Clone, Serialize)]
pub struct FieldRow {
    pub key: String,
    pub label: String,
    pub value: String,
    pub attachment_id: Option<String>,
    pub multiline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldGroup {
    pub title: String,
    pub rows: Vec<FieldRow>,
}

/// `child_first_name` -> `Child First Name`
pub fn humanize_key(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `2024-03-03` or a full RFC 3339 timestamp -> `March 3, 2024`. Anything else is `None`.
pub fn format_date(s: &str) -> Option<String> {
    parse_iso_date(s)
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive()))
        .map(|d| d.format("%B %-d, %Y").to_string())
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y %H:%M UTC").to_string()
}

fn format_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

/// Render one stored value. `kind` is the schema type when the key is known.
pub fn format_value(kind: Option<FieldKind>, value: &Value) -> String {
    match value {
        Value::Null => NOT_PROVIDED.to_string(),
        Value::Bool(b) => yes_no(*b).to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) if s.trim().is_empty() => NOT_PROVIDED.to_string(),
        Value::String(s) => match kind {
            Some(FieldKind::Boolean) => parse_bool(value)
                .map(|b| yes_no(b).to_string())
                .unwrap_or_else(|| s.clone()),
            Some(FieldKind::Date) | None => format_date(s).unwrap_or_else(|| s.clone()),
            _ => s.clone(),
        },
        Value::Array(items) if items.is_empty() => NOT_PROVIDED.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|v| format_value(None, v))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(obj) => obj
            .get("filename")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

fn attachment_id(value: &Value) -> Option<String> {
    value
        .get("attachment_id")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// One group per visible wizard step, in wizard order; keys the schema doesn't know
/// land in a trailing "Additional Information" group.
pub fn group_fields(schema: Option<&FormSchema>, form_data: &Value) -> Vec<FieldGroup> {
    let empty = serde_json::Map::new();
    let data = form_data.as_object().unwrap_or(&empty);
    let mut groups = Vec::new();

    if let Some(schema) = schema {
        for step in schema.steps.iter().filter(|s| is_visible(s, data)) {
            let rows: Vec<FieldRow> = step
                .fields
                .iter()
                .map(|def| {
                    let value = data.get(def.name).unwrap_or(&Value::Null);
                    FieldRow {
                        key: def.name.to_string(),
                        label: def.label.to_string(),
                        value: format_value(Some(def.kind), value),
                        attachment_id: attachment_id(value),
                        multiline: def.kind == FieldKind::TextArea,
                    }
                })
                .collect();
            groups.push(FieldGroup {
                title: step.title.to_string(),
                rows,
            });
        }
    }

    let extras: Vec<FieldRow> = data
        .iter()
        .filter(|(key, _)| schema.is_none_or(|s| s.field(key).is_none()))
        .map(|(key, value)| FieldRow {
            key: key.clone(),
            label: humanize_key(key),
            value: format_value(None, value),
            attachment_id: attachment_id(value),
            multiline: value.as_str().is_some_and(|s| s.contains('\n') || s.len() > 120),
        })
        .collect();
    if !extras.is_empty() {
        groups.push(FieldGroup {
            title: EXTRA_GROUP_TITLE.to_string(),
            rows: extras,
        });
    }

    groups
}

fn encode_component(s: &str) -> String {
    // mailto wants %20, not the + that form encoding produces; literal + is already %2B
    form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `mailto:` deep link for replying to a submitter from the dashboard.
pub fn mailto_link(email: &str, subject: &str, body: &str) -> String {
    let email = email.trim();
    let address = match email.split_once('@') {
        Some((local, domain)) => format!("{}@{}", encode_component(local), encode_component(domain)),
        None => encode_component(email),
    };
    let mut link = format!("mailto:{address}");
    let mut sep = '?';
    for (name, value) in [("subject", subject), ("body", body)] {
        if !value.is_empty() {
            link.push(sep);
            link.push_str(name);
            link.push('=');
            link.push_str(&encode_component(value));
            sep = '&';
        }
    }
    link
}

const NAME_KEYS: &[&str] = &[
    "child_first_name",
    "child_full_name",
    "candidate_full_name",
    "groom_full_name",
    "patient_name",
    "deceased_name",
    "donor_name",
    "full_name",
    "head_of_household",
    "name",
    "offered_for",
    "contact_name",
];

/// Short human handle for list rows: the most identifying name-like field.
pub fn headline(submission: &Submission) -> String {
    let Some(data) = submission.form_data.as_object() else {
        return NOT_PROVIDED.to_string();
    };
    let name = NAME_KEYS.iter().find_map(|k| {
        data.get(*k)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    });

    match (name, data.get("child_last_name").and_then(Value::as_str)) {
        (Some(first), Some(last)) if data.contains_key("child_first_name") => {
            format!("{first} {last}")
        }
        (Some(name), _) => name.to_string(),
        (None, _) => submission.contact_email().unwrap_or(NOT_PROVIDED).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::forms::schema;
    use crate::models::FormKind;

    #[test]
    fn booleans_render_yes_no() {
        assert_eq!(format_value(None, &json!(true)), "Yes");
        assert_eq!(format_value(None, &json!(false)), "No");
        assert_eq!(format_value(Some(FieldKind::Boolean), &json!("on")), "Yes");
        assert_eq!(format_value(Some(FieldKind::Boolean), &json!("false")), "No");
    }

    #[test]
    fn dates_render_long_form() {
        assert_eq!(format_value(Some(FieldKind::Date), &json!("2024-03-03")), "March 3, 2024");
        assert_eq!(format_value(None, &json!("2024-12-25T10:00:00Z")), "December 25, 2024");
        assert_eq!(format_value(Some(FieldKind::Text), &json!("2024-03-03")), "2024-03-03");
    }

    #[test]
    fn text_starting_with_a_date_is_kept_whole() {
        let prose = "2024-03-03 was when we first met the priest";
        assert_eq!(format_value(None, &json!(prose)), prose);
        assert_eq!(format_value(None, &json!("2024-3-3")), "2024-3-3");
        assert_eq!(format_date("2024-03-03 10:00"), None);
    }

    #[test]
    fn blanks_and_files() {
        assert_eq!(format_value(None, &json!("")), NOT_PROVIDED);
        assert_eq!(format_value(None, &Value::Null), NOT_PROVIDED);
        assert_eq!(
            format_value(Some(FieldKind::File), &json!({ "attachment_id": "x", "filename": "receipt.pdf" })),
            "receipt.pdf"
        );
        assert_eq!(format_value(None, &json!(1500.0)), "1500");
        assert_eq!(format_value(None, &json!(12.5)), "12.5");
    }

    #[test]
    fn humanizes_keys() {
        assert_eq!(humanize_key("child_first_name"), "Child First Name");
        assert_eq!(humanize_key("proof-of-payment"), "Proof Of Payment");
        assert_eq!(humanize_key("x"), "X");
    }

    #[test]
    fn groups_follow_visible_steps_then_extras() {
        let form = schema(FormKind::Wedding);
        let data = json!({
            "groom_full_name": "Juan",
            "previously_married": false,
            "legacy_field": "kept"
        });
        let groups = group_fields(Some(form), &data);

        let titles: Vec<&str> = groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles.first(), Some(&"Groom"));
        assert!(!titles.contains(&"Previous Marriage"));
        assert_eq!(titles.last(), Some(&EXTRA_GROUP_TITLE));

        let history = groups.iter().find(|g| g.title == "Marital History").unwrap();
        assert_eq!(history.rows[0].value, "No");
        let extra = groups.last().unwrap();
        assert_eq!(extra.rows[0].label, "Legacy Field");
    }

    #[test]
    fn groups_without_schema_are_all_extras() {
        let groups = group_fields(None, &json!({ "a_b": 1 }));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rows[0].label, "A B");
    }

    #[test]
    fn mailto_encodes_spaces_as_percent20() {
        let link = mailto_link("ana@example.org", "Your Baptism request", "Hello Ana & family+friends");
        assert_eq!(
            link,
            "mailto:ana@example.org?subject=Your%20Baptism%20request&body=Hello%20Ana%20%26%20family%2Bfriends"
        );
        assert_eq!(mailto_link("a@b.co", "", ""), "mailto:a@b.co");
    }

    #[test]
    fn mailto_address_cannot_add_headers() {
        let link = mailto_link("ana@example.org?bcc=spy%40evil.io", "Hi", "");
        assert_eq!(link, "mailto:ana@example.org%3Fbcc%3Dspy%2540evil.io?subject=Hi");
    }

    fn with_data(form_data: Value) -> Submission {
        Submission {
            id: uuid::Uuid::now_v7(),
            collection: "volunteers".to_string(),
            kind: "membership".to_string(),
            form_data,
            status: "pending".to_string(),
            notes: None,
            metadata: json!({}),
            submitted_at: Utc::now(),
            processed_at: None,
        }
    }

    #[test]
    fn headline_skips_blank_name_fields() {
        let s = with_data(json!({
            "groom_full_name": "  ",
            "full_name": "Ana Cruz",
            "email": "a@b.co"
        }));
        assert_eq!(headline(&s), "Ana Cruz");

        let s = with_data(json!({ "full_name": "", "email": "a@b.co" }));
        assert_eq!(headline(&s), "a@b.co");
    }
}
