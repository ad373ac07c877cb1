//! Error taxonomy shared by the API client, session and storefront context.

use std::collections::BTreeMap;

use thiserror::Error;

/// Field name to message, as reported by backend validation.
pub type FieldErrors = BTreeMap<String, String>;

const SERVER_ERROR: &str = "Server error. Please try again later.";
const CONNECTIVITY_ERROR: &str =
    "Unable to connect to the server. Please check your internet connection.";

/// Failure of a single backend call, classified by HTTP outcome.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad form input rejected by the backend (400/422 with field errors).
    #[error("{message}")]
    Validation {
        /// Top-level message from the backend.
        message: String,
        /// Per-field messages.
        fields: FieldErrors,
    },
    /// 401: missing, invalid or expired credentials.
    #[error("{}", .message.as_deref().unwrap_or("Unauthorized"))]
    Unauthorized {
        /// Backend message, if any.
        message: Option<String>,
    },
    /// 404.
    #[error("{}", .message.as_deref().unwrap_or("Not found"))]
    NotFound {
        /// Backend message, if any.
        message: Option<String>,
    },
    /// 5xx.
    #[error("server error ({status})")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Backend message, if any.
        message: Option<String>,
    },
    /// No response was received.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// The backend answered but refused the action (`success: false` or another 4xx).
    #[error("{message}")]
    Rejected {
        /// HTTP status when the refusal was not a 2xx.
        status: Option<u16>,
        /// Backend message or a generic one.
        message: String,
    },
    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the error means the current token is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Field-level validation messages, empty for other kinds.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }

    /// Message supplied by the backend, if any.
    pub fn server_message(&self) -> Option<&str> {
        let message = match self {
            ApiError::Validation { message, .. } | ApiError::Rejected { message, .. } => {
                Some(message.as_str())
            }
            ApiError::Unauthorized { message }
            | ApiError::NotFound { message }
            | ApiError::Server { message, .. } => message.as_deref(),
            ApiError::Network(_) | ApiError::Decode(_) => None,
        };
        message.filter(|message| !message.trim().is_empty())
    }

    /// Human readable text: field errors, then server message, then generic status text.
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(fields) = self.field_errors() {
            return fields
                .iter()
                .map(|(field, message)| format!("{field}: {message}"))
                .collect::<Vec<_>>()
                .join("; ");
        }
        if let Some(message) = self.server_message() {
            return message.to_string();
        }
        match self {
            ApiError::Unauthorized { .. } => "Please log in again.".to_string(),
            ApiError::NotFound { .. } => "The requested item was not found.".to_string(),
            ApiError::Server { .. } => SERVER_ERROR.to_string(),
            ApiError::Network(_) => CONNECTIVITY_ERROR.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Outcome of a failed login or signup, already phrased for the user.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// 401 on the credential exchange.
    #[error("Invalid email or password.")]
    InvalidCredentials,
    /// 404 on the credential exchange.
    #[error("User not found. Please sign up.")]
    UserNotFound,
    /// 5xx.
    #[error("Server error. Please try again later.")]
    Server,
    /// No response received.
    #[error("Unable to connect to the server. Please check your internet connection.")]
    Connectivity,
    /// Any other refusal, carrying the most specific message available.
    #[error("{0}")]
    Rejected(String),
    /// Signup form rejected field by field.
    #[error("{message}")]
    Validation {
        /// Summary message.
        message: String,
        /// Per-field messages.
        fields: FieldErrors,
    },
}

impl SessionError {
    /// Classify a failure of the sign-in exchange or the follow-up profile fetch.
    pub fn from_login(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } => SessionError::InvalidCredentials,
            ApiError::NotFound { .. } => SessionError::UserNotFound,
            ApiError::Server { .. } => SessionError::Server,
            ApiError::Network(_) => SessionError::Connectivity,
            ApiError::Validation { message, fields } => SessionError::Validation { message, fields },
            other => {
                SessionError::Rejected(other.user_message("Login failed. Please try again."))
            }
        }
    }

    /// Classify a failure of the signup call.
    pub fn from_signup(err: ApiError) -> Self {
        match err {
            ApiError::Validation { message, fields } => SessionError::Validation { message, fields },
            ApiError::Server { .. } => SessionError::Server,
            ApiError::Network(_) => SessionError::Connectivity,
            other => SessionError::Rejected(
                other.user_message("Signup failed. Please check your information and try again."),
            ),
        }
    }

    /// Field errors for signup validation failures.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            SessionError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

/// Failure of a storefront action (booking, payment, owner tools).
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action needs a signed-in user.
    #[error("Please log in to continue.")]
    NotAuthenticated,
    /// The action needs a hotel owner.
    #[error("Only hotel owners can do that.")]
    Forbidden,
    /// Local input check failed before any request was made.
    #[error("{0}")]
    Invalid(String),
    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ActionError {
    /// Text for the notice bar; backend failures fall back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ActionError::Api(err) => err.user_message(fallback),
            other => other.to_string(),
        }
    }

    /// Whether the backend rejected the current token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ActionError::Api(err) if err.is_unauthorized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_take_precedence_over_message() {
        let mut fields = FieldErrors::new();
        fields.insert("email".to_string(), "Email already exists".to_string());
        let err = ApiError::Validation {
            message: "Validation failed".to_string(),
            fields,
        };
        assert_eq!(err.user_message("fallback"), "email: Email already exists");
    }

    #[test]
    fn server_message_beats_generic_status_text() {
        let err = ApiError::Server {
            status: 503,
            message: Some("Maintenance window".to_string()),
        };
        assert_eq!(err.user_message("fallback"), "Maintenance window");

        let err = ApiError::Server {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message("fallback"), SERVER_ERROR);

        let err = ApiError::Decode("missing rooms".to_string());
        assert_eq!(err.user_message("Failed to load rooms"), "Failed to load rooms");
    }

    #[test]
    fn login_classification_follows_status() {
        let unauthorized = ApiError::Unauthorized {
            message: Some("bad password".to_string()),
        };
        assert_eq!(
            SessionError::from_login(unauthorized).to_string(),
            "Invalid email or password."
        );
        assert_eq!(
            SessionError::from_login(ApiError::NotFound { message: None }),
            SessionError::UserNotFound
        );
        assert_eq!(
            SessionError::from_login(ApiError::Server {
                status: 502,
                message: None
            }),
            SessionError::Server
        );
        assert_eq!(
            SessionError::from_login(ApiError::Rejected {
                status: None,
                message: "Account locked".to_string()
            }),
            SessionError::Rejected("Account locked".to_string())
        );
    }

    #[test]
    fn signup_keeps_field_errors_distinct() {
        let mut fields = FieldErrors::new();
        fields.insert("password".to_string(), "Too short".to_string());
        let err = SessionError::from_signup(ApiError::Validation {
            message: "Invalid input".to_string(),
            fields,
        });
        assert_eq!(
            err.field_errors().and_then(|f| f.get("password")).map(String::as_str),
            Some("Too short")
        );

        let generic = SessionError::from_signup(ApiError::Rejected {
            status: Some(409),
            message: "Email taken".to_string(),
        });
        assert!(generic.field_errors().is_none());
        assert_eq!(generic.to_string(), "Email taken");
    }
}
