use serde::Serialize;

use crate::models::FormKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Email,
    Phone,
    Date,
    Number,
    Boolean,
    Select,
    File,
}

impl FieldKind {
    /// HTML `<input type>` used by the server-rendered wizard.
    pub fn input_type(self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::TextArea | FieldKind::Select => "text",
            FieldKind::Email => "email",
            FieldKind::Phone => "tel",
            FieldKind::Date => "date",
            FieldKind::Number => "number",
            FieldKind::Boolean => "checkbox",
            FieldKind::File => "file",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
}

impl FieldDef {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            options: Vec::new(),
            help: None,
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn textarea(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::TextArea)
    }

    pub fn email(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Email)
    }

    pub fn phone(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Phone)
    }

    pub fn date(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    pub fn number(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub fn boolean(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Boolean)
    }

    pub fn file(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::File)
    }

    pub fn select(name: &'static str, label: &'static str, options: &[&'static str]) -> Self {
        let mut def = Self::new(name, label, FieldKind::Select);
        def.options = options.to_vec();
        def
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

/// Branching rule: the step is shown only when `field` currently holds `equals`.
/// Booleans compare as `"true"` / `"false"`.
#[derive(Debug, Clone, Serialize)]
pub struct Condition {
    pub field: &'static str,
    pub equals: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub id: &'static str,
    pub title: &'static str,
    pub fields: Vec<FieldDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_if: Option<Condition>,
}

impl Step {
    pub fn new(id: &'static str, title: &'static str, fields: Vec<FieldDef>) -> Self {
        Self {
            id,
            title,
            fields,
            show_if: None,
        }
    }

    pub fn shown_when(mut self, field: &'static str, equals: &'static str) -> Self {
        self.show_if = Some(Condition { field, equals });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub kind: FormKind,
    pub title: &'static str,
    pub description: &'static str,
    pub steps: Vec<Step>,
}

impl FormSchema {
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_index(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Field definition and the step that owns it.
    pub fn field(&self, name: &str) -> Option<(&Step, &FieldDef)> {
        self.steps
            .iter()
            .find_map(|step| step.field(name).map(|f| (step, f)))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.steps.iter().flat_map(|s| s.fields.iter())
    }

    pub fn has_file_fields(&self) -> bool {
        self.fields().any(|f| f.kind == FieldKind::File)
    }
}
