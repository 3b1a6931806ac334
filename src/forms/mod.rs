pub mod catalog;
pub mod schema;
pub mod wizard;

pub use catalog::schema;
pub use schema::{Condition, FieldDef, FieldKind, FormSchema, Step};
pub use wizard::{FieldError, FormValues, StepError};
