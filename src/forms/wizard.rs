use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::schema::{Condition, FieldDef, FieldKind, FormSchema, Step};

pub type FormValues = Map<String, Value>;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

const MAX_TEXT_LEN: usize = 500;
const MAX_TEXTAREA_LEN: usize = 5000;

/// Keys only the review side may write; stripped from anything the public sends.
const RESERVED_KEYS: &[&str] = &["status", "notes", "processed_at", "submitted_at", "id"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(def: &FieldDef, message: impl Into<String>) -> Self {
        Self {
            field: def.name.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepError {
    UnknownStep(String),
    Invalid(Vec<FieldError>),
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepError::UnknownStep(id) => write!(f, "Unknown step: {id}"),
            StepError::Invalid(errors) => write!(f, "{} field(s) need attention", errors.len()),
        }
    }
}

/// Checkbox-style parsing shared by validation, normalization and branching.
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Some(true),
            "false" | "off" | "no" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        _ => false,
    }
}

fn condition_holds(cond: &Condition, values: &FormValues) -> bool {
    let Some(value) = values.get(cond.field) else {
        return false;
    };
    match cond.equals {
        "true" | "false" => parse_bool(value).map(|b| b.to_string()).as_deref() == Some(cond.equals),
        expected => value.as_str().map(str::trim) == Some(expected),
    }
}

pub fn is_visible(step: &Step, values: &FormValues) -> bool {
    step.show_if
        .as_ref()
        .is_none_or(|cond| condition_holds(cond, values))
}

/// Steps the user will actually walk through given the answers so far.
pub fn visible_steps<'a>(schema: &'a FormSchema, values: &FormValues) -> Vec<&'a Step> {
    schema.steps.iter().filter(|s| is_visible(s, values)).collect()
}

/// Check one field. Blank optional fields are always fine.
/// Strict `YYYY-MM-DD`: zero-padded, unsigned, and a real calendar date.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    if !DATE_RE.is_match(s) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn validate_field(def: &FieldDef, value: Option<&Value>) -> Option<FieldError> {
    if is_blank(value) {
        return def
            .required
            .then(|| FieldError::new(def, format!("{} is required", def.label)));
    }
    let value = value?;

    match def.kind {
        FieldKind::Boolean => match parse_bool(value) {
            None => Some(FieldError::new(def, format!("{} must be yes or no", def.label))),
            Some(false) if def.required => {
                Some(FieldError::new(def, format!("{} must be checked", def.label)))
            }
            Some(_) => None,
        },
        FieldKind::Number => {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match parsed {
                Some(n) if n.is_finite() && n >= 0.0 => None,
                Some(_) => Some(FieldError::new(def, format!("{} cannot be negative", def.label))),
                None => Some(FieldError::new(def, format!("{} must be a number", def.label))),
            }
        }
        FieldKind::File => match value {
            Value::String(_) => None,
            Value::Object(o) if o.get("filename").and_then(Value::as_str).is_some() => None,
            _ => Some(FieldError::new(def, format!("{} must be an uploaded file", def.label))),
        },
        _ => {
            let Some(s) = value.as_str().map(str::trim) else {
                return Some(FieldError::new(def, format!("{} must be text", def.label)));
            };
            validate_text(def, s)
        }
    }
}

fn validate_text(def: &FieldDef, s: &str) -> Option<FieldError> {
    match def.kind {
        FieldKind::Email if !EMAIL_RE.is_match(s) => Some(FieldError::new(
            def,
            format!("{} must be a valid email address", def.label),
        )),
        FieldKind::Phone => {
            let allowed = s
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));
            let digits = s.chars().filter(char::is_ascii_digit).count();
            (!allowed || digits < 7).then(|| {
                FieldError::new(def, format!("{} must be a valid phone number", def.label))
            })
        }
        FieldKind::Date if parse_iso_date(s).is_none() => Some(FieldError::new(
            def,
            format!("{} must be a date (YYYY-MM-DD)", def.label),
        )),
        FieldKind::Select if !def.options.contains(&s) => Some(FieldError::new(
            def,
            format!("{} must be one of: {}", def.label, def.options.join(", ")),
        )),
        FieldKind::Text | FieldKind::Select if s.chars().count() > MAX_TEXT_LEN => Some(
            FieldError::new(def, format!("{} is too long", def.label)),
        ),
        FieldKind::TextArea if s.chars().count() > MAX_TEXTAREA_LEN => Some(FieldError::new(
            def,
            format!("{} is too long", def.label),
        )),
        _ => None,
    }
}

pub fn validate_step(step: &Step, values: &FormValues) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = step
        .fields
        .iter()
        .filter_map(|def| validate_field(def, values.get(def.name)))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate `current` and move forward. A wizard never advances past an invalid step;
/// `Ok(None)` means `current` was the last visible step.
pub fn next_step<'a>(
    schema: &'a FormSchema,
    current: &str,
    values: &FormValues,
) -> Result<Option<&'a Step>, StepError> {
    let index = schema
        .step_index(current)
        .ok_or_else(|| StepError::UnknownStep(current.to_string()))?;
    validate_step(&schema.steps[index], values).map_err(StepError::Invalid)?;

    Ok(schema.steps[index + 1..]
        .iter()
        .find(|s| is_visible(s, values)))
}

/// Step before `current`, skipping hidden ones. Going back never validates.
pub fn previous_step<'a>(
    schema: &'a FormSchema,
    current: &str,
    values: &FormValues,
) -> Option<&'a Step> {
    let index = schema.step_index(current)?;
    schema.steps[..index]
        .iter()
        .rev()
        .find(|s| is_visible(s, values))
}

/// Server-side check of a whole submission: every visible step must pass.
pub fn validate_all(schema: &FormSchema, values: &FormValues) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = visible_steps(schema, values)
        .into_iter()
        .filter_map(|step| validate_step(step, values).err())
        .flatten()
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Shape raw input into what gets persisted: only fields of visible steps, strings
/// trimmed, booleans as JSON booleans, numbers as JSON numbers where they parse.
/// Unknown keys, the honeypot and review-only keys are dropped.
pub fn normalize(schema: &FormSchema, raw: &FormValues) -> FormValues {
    let mut out = Map::new();
    for step in visible_steps(schema, raw) {
        for def in &step.fields {
            if RESERVED_KEYS.contains(&def.name) {
                continue;
            }
            let value = raw.get(def.name);
            let normalized = match (def.kind, value) {
                (FieldKind::Boolean, Some(v)) => Value::Bool(parse_bool(v).unwrap_or(false)),
                (FieldKind::Boolean, None) => Value::Bool(false),
                (_, None) | (_, Some(Value::Null)) => continue,
                (FieldKind::Number, Some(Value::String(s))) => match s.trim().parse::<f64>() {
                    Ok(n) => serde_json::Number::from_f64(n)
                        .map(Value::Number)
                        .unwrap_or_else(|| Value::String(s.trim().to_string())),
                    Err(_) => Value::String(s.trim().to_string()),
                },
                (_, Some(Value::String(s))) => {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    Value::String(trimmed.to_string())
                }
                (_, Some(other)) => other.clone(),
            };
            out.insert(def.name.to_string(), normalized);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::forms::schema;
    use crate::models::FormKind;

    fn values(v: Value) -> FormValues {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn wizard_does_not_advance_past_invalid_step() {
        let form = schema(FormKind::Contact);
        let vals = values(json!({ "name": "Maria", "email": "not-an-email" }));

        let err = next_step(form, "message", &vals).unwrap_err();
        let StepError::Invalid(errors) = err else {
            panic!("expected field errors");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"subject"));
        assert!(fields.contains(&"message"));
        assert!(!fields.contains(&"phone"));
    }

    #[test]
    fn last_valid_step_returns_none() {
        let form = schema(FormKind::Contact);
        let vals = values(json!({
            "name": "Maria",
            "email": "maria@example.org",
            "subject": "Bulletin",
            "message": "When is the deadline?"
        }));
        assert!(next_step(form, "message", &vals).unwrap().is_none());
    }

    #[test]
    fn unknown_step_is_reported() {
        let form = schema(FormKind::Contact);
        let err = next_step(form, "nope", &FormValues::new()).unwrap_err();
        assert_eq!(err, StepError::UnknownStep("nope".to_string()));
    }

    #[test]
    fn wedding_branches_on_previous_marriage() {
        let form = schema(FormKind::Wedding);

        let first_time = values(json!({ "previously_married": "off" }));
        let next = next_step(form, "history", &first_time).unwrap().unwrap();
        assert_eq!(next.id, "ceremony");

        let remarrying = values(json!({ "previously_married": "on" }));
        let next = next_step(form, "history", &remarrying).unwrap().unwrap();
        assert_eq!(next.id, "annulment");

        let back = previous_step(form, "ceremony", &first_time).unwrap();
        assert_eq!(back.id, "history");
    }

    #[test]
    fn hidden_steps_are_not_validated() {
        let form = schema(FormKind::Wedding);
        let vals = values(json!({ "previously_married": false }));
        let errors = validate_all(form, &vals).unwrap_err();
        assert!(errors.iter().all(|e| e.field != "previous_marriage_details"));

        let vals = values(json!({ "previously_married": true }));
        let errors = validate_all(form, &vals).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "previous_marriage_details"));
    }

    #[test]
    fn required_checkbox_must_be_checked() {
        let def = FieldDef::boolean("consent", "Consent").required();
        assert!(validate_field(&def, Some(&json!("off"))).is_some());
        assert!(validate_field(&def, Some(&json!("on"))).is_none());
        assert!(validate_field(&def, None).is_some());
    }

    #[test]
    fn typed_fields_are_checked() {
        let date = FieldDef::date("d", "Date");
        assert!(validate_field(&date, Some(&json!("2024-02-30"))).is_some());
        assert!(validate_field(&date, Some(&json!("2024-02-29"))).is_none());
        assert!(validate_field(&date, Some(&json!("2024-3-5"))).is_some());
        assert!(validate_field(&date, Some(&json!("+2024-03-05"))).is_some());

        let phone = FieldDef::phone("p", "Phone");
        assert!(validate_field(&phone, Some(&json!("+63 (2) 8123-4567"))).is_none());
        assert!(validate_field(&phone, Some(&json!("12ab"))).is_some());
        assert!(validate_field(&phone, Some(&json!("812.4567"))).is_some());
        assert!(validate_field(&phone, Some(&json!("123 456"))).is_some());
        assert!(validate_field(&phone, Some(&json!("+00 1234 5678 9012 3456"))).is_none());

        let amount = FieldDef::number("a", "Amount");
        assert!(validate_field(&amount, Some(&json!("-5"))).is_some());
        assert!(validate_field(&amount, Some(&json!(250))).is_none());

        let pick = FieldDef::select("s", "Size", &["S", "M"]);
        assert!(validate_field(&pick, Some(&json!("XL"))).is_some());

        // optional and blank is fine whatever the type
        assert!(validate_field(&date, Some(&json!("  "))).is_none());
    }

    #[test]
    fn normalize_drops_unknown_and_reserved_keys() {
        let form = schema(FormKind::Contact);
        let raw = values(json!({
            "name": "  Jose ",
            "email": "jose@example.org",
            "subject": "Hi",
            "message": "Hello",
            "status": "approved",
            "website": "http://spam",
            "injected": "x"
        }));
        let out = normalize(form, &raw);
        assert_eq!(out.get("name"), Some(&json!("Jose")));
        assert!(out.get("status").is_none());
        assert!(out.get("website").is_none());
        assert!(out.get("injected").is_none());
    }

    #[test]
    fn normalize_coerces_checkboxes_and_numbers() {
        let form = schema(FormKind::Donation);
        let raw = values(json!({ "anonymous": "on", "amount": "1500.50" }));
        let out = normalize(form, &raw);
        assert_eq!(out.get("anonymous"), Some(&json!(true)));
        assert_eq!(out.get("amount"), Some(&json!(1500.5)));

        let out = normalize(form, &FormValues::new());
        assert_eq!(out.get("anonymous"), Some(&json!(false)));
    }
}
