pub mod attachments;
pub mod audit;
pub mod password_reset_tokens;
pub mod refresh_tokens;
pub mod submissions;
pub mod users;
