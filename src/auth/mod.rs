pub mod errors;
pub mod extractor;
pub mod jwt;
pub mod password;

pub use errors::AuthErrorCode;
pub use extractor::AuthUser;
