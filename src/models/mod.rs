pub mod attachment;
pub mod audit_event;
pub mod kind;
pub mod password_reset_token;
pub mod refresh_token;
pub mod submission;
pub mod user;

pub use attachment::Attachment;
pub use audit_event::AuditEvent;
pub use kind::{Collection, FormKind, Role, Status};
pub use password_reset_token::PasswordResetToken;
pub use refresh_token::RefreshToken;
pub use submission::{NewSubmission, Submission};
pub use user::AdminUser;
