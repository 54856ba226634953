//! Uniform response envelopes shared by every endpoint.

use serde::Serialize;

/// `{ success, message, object?, errors? }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, object: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            object: Some(object),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            object: None,
            errors: None,
        }
    }

    pub fn failure(message: impl Into<String>, errors: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            message: message.into(),
            object: None,
            errors,
        }
    }
}

/// List envelope; `object` is always present, possibly empty.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub object: Vec<T>,
    pub page_number: i64,
    pub page_size: i64,
    pub total_size: i64,
}
