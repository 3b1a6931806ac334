use axum::http::StatusCode;
use serde::Serialize;

/// Sign-in failures as the admin UI shows them. Each code maps to one fixed sentence so
/// the login form never leaks which half of the credentials was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthErrorCode {
    InvalidCredential,
    UserNotFound,
    WrongPassword,
    TooManyRequests,
    MissingToken,
    InvalidToken,
    TokenExpired,
    TokenReused,
    WeakPassword,
    EmailInUse,
    InvalidEmail,
    RegistrationClosed,
}

impl AuthErrorCode {
    pub fn code(self) -> &'static str {
        match self {
            AuthErrorCode::InvalidCredential => "auth/invalid-credential",
            AuthErrorCode::UserNotFound => "auth/user-not-found",
            AuthErrorCode::WrongPassword => "auth/wrong-password",
            AuthErrorCode::TooManyRequests => "auth/too-many-requests",
            AuthErrorCode::MissingToken => "auth/missing-token",
            AuthErrorCode::InvalidToken => "auth/invalid-token",
            AuthErrorCode::TokenExpired => "auth/token-expired",
            AuthErrorCode::TokenReused => "auth/token-reused",
            AuthErrorCode::WeakPassword => "auth/weak-password",
            AuthErrorCode::EmailInUse => "auth/email-already-in-use",
            AuthErrorCode::InvalidEmail => "auth/invalid-email",
            AuthErrorCode::RegistrationClosed => "auth/registration-closed",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            // Account existence is never revealed
            AuthErrorCode::InvalidCredential
            | AuthErrorCode::UserNotFound
            | AuthErrorCode::WrongPassword => "Invalid email or password.",
            AuthErrorCode::TooManyRequests => {
                "Too many failed login attempts. Please try again later."
            }
            AuthErrorCode::MissingToken => "Please sign in to continue.",
            AuthErrorCode::InvalidToken => "Your session is invalid. Please sign in again.",
            AuthErrorCode::TokenExpired => "Your session has expired. Please sign in again.",
            AuthErrorCode::TokenReused => {
                "Session reuse detected. All sessions have been signed out."
            }
            AuthErrorCode::WeakPassword => "Password must be at least 8 characters.",
            AuthErrorCode::EmailInUse => "An account with this email already exists.",
            AuthErrorCode::InvalidEmail => "Please enter a valid email address.",
            AuthErrorCode::RegistrationClosed => {
                "Registration is closed. Ask a parish administrator for an account."
            }
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            AuthErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthErrorCode::WeakPassword | AuthErrorCode::InvalidEmail => StatusCode::BAD_REQUEST,
            AuthErrorCode::EmailInUse => StatusCode::CONFLICT,
            AuthErrorCode::RegistrationClosed => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Reverse lookup for codes arriving from the login form's query string.
    pub fn from_code(code: &str) -> Option<Self> {
        ALL_CODES.iter().copied().find(|c| c.code() == code)
    }
}

const ALL_CODES: [AuthErrorCode; 12] = [
    AuthErrorCode::InvalidCredential,
    AuthErrorCode::UserNotFound,
    AuthErrorCode::WrongPassword,
    AuthErrorCode::TooManyRequests,
    AuthErrorCode::MissingToken,
    AuthErrorCode::InvalidToken,
    AuthErrorCode::TokenExpired,
    AuthErrorCode::TokenReused,
    AuthErrorCode::WeakPassword,
    AuthErrorCode::EmailInUse,
    AuthErrorCode::InvalidEmail,
    AuthErrorCode::RegistrationClosed,
];

/// Message for an arbitrary code string; unknown codes get a generic sentence.
pub fn message_for(code: &str) -> &'static str {
    AuthErrorCode::from_code(code)
        .map(AuthErrorCode::message)
        .unwrap_or("Sign-in failed. Please try again.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_message() {
        assert_eq!(
            AuthErrorCode::UserNotFound.message(),
            AuthErrorCode::WrongPassword.message()
        );
    }

    #[test]
    fn codes_round_trip() {
        for code in ALL_CODES {
            assert_eq!(AuthErrorCode::from_code(code.code()), Some(code));
        }
    }

    #[test]
    fn unknown_codes_fall_back() {
        assert_eq!(message_for("auth/network-request-failed"), "Sign-in failed. Please try again.");
        assert_eq!(message_for("auth/too-many-requests"), AuthErrorCode::TooManyRequests.message());
    }
}
