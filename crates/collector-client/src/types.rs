//! Request/response shapes for the collector REST API.

use serde::{Deserialize, Serialize};

use patwari_core::masterdata::Assignment;

/// `POST /auth/login` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Authenticated user identity carried in the login response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

/// `POST /auth/login` response. The token is attached as a bearer header on
/// every subsequent request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthenticatedUser,
}

/// `GET /surveyor/my-assignments` response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentsResponse {
    pub assignments: Vec<Assignment>,
}

/// Collector failure body: `{message, errors?}` on validation failures,
/// `{error}` on generic ones.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorResponse {
    /// Flatten the body into one displayable message.
    pub fn display_message(&self) -> String {
        let base = self
            .message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "request failed".to_string());
        match &self.errors {
            Some(details) => format!("{base}: {details}"),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_with_field_errors_flattens() {
        let body: ApiErrorResponse = serde_json::from_str(
            r#"{"message":"Validation failed","errors":[{"field":"wardId"}]}"#,
        )
        .unwrap();
        let message = body.display_message();
        assert!(message.starts_with("Validation failed"));
        assert!(message.contains("wardId"));
    }

    #[test]
    fn plain_error_body_is_used_verbatim() {
        let body: ApiErrorResponse = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(body.display_message(), "boom");
    }
}
