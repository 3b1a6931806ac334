use std::net::SocketAddr;

use askama::Template;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;

use super::render;
use crate::error::AppError;
use crate::forms::wizard::{is_visible, parse_bool};
use crate::forms::{self, FieldDef, FieldError, FieldKind, FormSchema, FormValues};
use crate::models::Collection;
use crate::routes::public::{parse_kind, read_body};
use crate::state::SharedState;
use crate::submission::{honeypot, pipeline};

struct FormLink {
    slug: String,
    title: &'static str,
    description: &'static str,
}

struct FormGroup {
    label: &'static str,
    forms: Vec<FormLink>,
}

#[derive(Template)]
#[template(path = "public/home.html")]
struct HomeTemplate {
    parish_name: String,
    groups: Vec<FormGroup>,
}

pub(crate) struct ChoiceView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

struct FieldView {
    name: &'static str,
    label: &'static str,
    input_type: &'static str,
    is_textarea: bool,
    is_select: bool,
    is_checkbox: bool,
    is_file: bool,
    required: bool,
    help: Option<&'static str>,
    value: String,
    checked: bool,
    options: Vec<ChoiceView>,
    error: Option<String>,
}

struct StepView {
    id: &'static str,
    number: usize,
    title: &'static str,
    current: bool,
    visible: bool,
    show_field: &'static str,
    show_equals: &'static str,
    fields: Vec<FieldView>,
}

#[derive(Template)]
#[template(path = "public/form.html")]
struct FormTemplate {
    parish_name: String,
    slug: String,
    title: &'static str,
    description: &'static str,
    multipart: bool,
    honeypot: &'static str,
    error: Option<String>,
    steps: Vec<StepView>,
}

#[derive(Template)]
#[template(path = "public/thanks.html")]
struct ThanksTemplate {
    parish_name: String,
    title: &'static str,
    reference: Option<String>,
    office_email: Option<String>,
}

#[derive(Deserialize)]
pub struct StepQuery {
    pub step: Option<String>,
}

pub async fn home(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let groups = Collection::ALL
        .into_iter()
        .map(|collection| FormGroup {
            label: collection.label(),
            forms: collection
                .kinds()
                .map(|kind| {
                    let schema = forms::schema(kind);
                    FormLink {
                        slug: kind.slug(),
                        title: schema.title,
                        description: schema.description,
                    }
                })
                .collect(),
        })
        .collect();

    render(&HomeTemplate {
        parish_name: state.config.parish_name.clone(),
        groups,
    })
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn field_view(def: &FieldDef, values: &FormValues, errors: &[FieldError]) -> FieldView {
    let value = values.get(def.name);
    let current = display_value(value);
    FieldView {
        name: def.name,
        label: def.label,
        input_type: def.kind.input_type(),
        is_textarea: def.kind == FieldKind::TextArea,
        is_select: def.kind == FieldKind::Select,
        is_checkbox: def.kind == FieldKind::Boolean,
        is_file: def.kind == FieldKind::File,
        required: def.required,
        help: def.help,
        checked: value.and_then(parse_bool) == Some(true),
        options: def
            .options
            .iter()
            .map(|opt| ChoiceView {
                value: opt.to_string(),
                label: opt.to_string(),
                selected: *opt == current,
            })
            .collect(),
        value: current,
        error: errors
            .iter()
            .find(|e| e.field == def.name)
            .map(|e| e.message.clone()),
    }
}

/// Lay the schema out for the page. The current step is the requested one, else the
/// first step with an error, else the first step.
fn step_views(
    schema: &FormSchema,
    values: &FormValues,
    errors: &[FieldError],
    requested: Option<&str>,
) -> Vec<StepView> {
    let first_error_step = errors
        .first()
        .and_then(|e| schema.field(&e.field))
        .map(|(step, _)| step.id);
    let current = requested
        .filter(|id| schema.step(id).is_some())
        .or(first_error_step)
        .or(schema.steps.first().map(|s| s.id));

    schema
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| StepView {
            id: step.id,
            number: i + 1,
            title: step.title,
            current: Some(step.id) == current,
            visible: is_visible(step, values),
            show_field: step.show_if.as_ref().map(|c| c.field).unwrap_or(""),
            show_equals: step.show_if.as_ref().map(|c| c.equals).unwrap_or(""),
            fields: step
                .fields
                .iter()
                .map(|def| field_view(def, values, errors))
                .collect(),
        })
        .collect()
}

fn form_page(
    state: &SharedState,
    schema: &'static FormSchema,
    values: &FormValues,
    errors: &[FieldError],
    requested_step: Option<&str>,
    error: Option<String>,
) -> FormTemplate {
    FormTemplate {
        parish_name: state.config.parish_name.clone(),
        slug: schema.kind.slug(),
        title: schema.title,
        description: schema.description,
        multipart: schema.has_file_fields(),
        honeypot: honeypot::FIELD,
        error,
        steps: step_views(schema, values, errors, requested_step),
    }
}

pub async fn form(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    Query(q): Query<StepQuery>,
) -> Result<impl IntoResponse, AppError> {
    let schema = forms::schema(parse_kind(&kind)?);
    render(&form_page(
        &state,
        schema,
        &FormValues::new(),
        &[],
        q.step.as_deref(),
        None,
    ))
}

/// Plain HTML post of the whole wizard. Validation problems re-render the form with the
/// visitor's answers kept and the first failing step opened.
pub async fn submit(
    State(state): State<SharedState>,
    Path(kind): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    let schema = forms::schema(kind);
    let parsed = read_body(&state, &headers, body).await?;
    let values = parsed.fields.clone();

    let rerender = |status: StatusCode, errors: &[FieldError], message: String| -> Result<Response, AppError> {
        let page = form_page(&state, schema, &values, errors, None, Some(message));
        Ok((status, render(&page)?).into_response())
    };

    match pipeline::run(&state, kind, &headers, Some(addr.ip()), parsed).await {
        Ok(result) => render(&ThanksTemplate {
            parish_name: state.config.parish_name.clone(),
            title: schema.title,
            reference: result.submission_id.map(|id| id.to_string()),
            office_email: state.config.office_email.clone(),
        })
        .map(IntoResponse::into_response),
        Err(AppError::Validation(errors)) => rerender(
            StatusCode::UNPROCESSABLE_ENTITY,
            &errors,
            "Please correct the highlighted fields.".to_string(),
        ),
        Err(AppError::BadRequest(message)) => rerender(StatusCode::BAD_REQUEST, &[], message),
        Err(AppError::RateLimited(secs)) => rerender(
            StatusCode::TOO_MANY_REQUESTS,
            &[],
            format!("You have sent several requests in a short time. Please try again in {secs} seconds."),
        ),
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::FormKind;

    fn values(v: Value) -> FormValues {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn first_error_step_is_opened() {
        let schema = forms::schema(FormKind::Wedding);
        let errors = vec![FieldError {
            field: "bride_full_name".to_string(),
            message: "is required".to_string(),
        }];
        let steps = step_views(schema, &FormValues::new(), &errors, None);
        let current: Vec<&str> = steps.iter().filter(|s| s.current).map(|s| s.id).collect();
        assert_eq!(current, vec![schema.field("bride_full_name").unwrap().0.id]);
    }

    #[test]
    fn unknown_requested_step_falls_back_to_first() {
        let schema = forms::schema(FormKind::Contact);
        let steps = step_views(schema, &FormValues::new(), &[], Some("nope"));
        assert!(steps[0].current);
        assert_eq!(steps.iter().filter(|s| s.current).count(), 1);
    }

    #[test]
    fn conditional_steps_follow_answers() {
        let schema = forms::schema(FormKind::Wedding);
        let hidden = step_views(schema, &values(json!({ "previously_married": "off" })), &[], None);
        let shown = step_views(schema, &values(json!({ "previously_married": "on" })), &[], None);
        let conditional = |steps: &[StepView]| {
            steps
                .iter()
                .find(|s| !s.show_field.is_empty())
                .map(|s| s.visible)
        };
        assert_eq!(conditional(&hidden), Some(false));
        assert_eq!(conditional(&shown), Some(true));
    }

    #[test]
    fn field_views_keep_answers() {
        let schema = forms::schema(FormKind::Wedding);
        let (_, def) = schema.field("previously_married").unwrap();
        let view = field_view(def, &values(json!({ "previously_married": "on" })), &[]);
        assert!(view.is_checkbox);
        assert!(view.checked);
    }
}
