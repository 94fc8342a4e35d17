use poem_openapi::{
    types::{ParseFromJSON, ToJSON},
    Object,
};
use serde::Deserialize;
use serde_json::Value;

use crate::core::error::ServiceError;

#[derive(Object, Deserialize)]
pub struct BadRequestResponse {
    pub message: String,
}

#[derive(Object, Deserialize)]
pub struct UnauthorizedResponse {
    pub message: String,
}

impl Default for UnauthorizedResponse {
    fn default() -> Self {
        Self {
            message: "Invalid or expired session".to_string(),
        }
    }
}

#[derive(Object, Deserialize)]
pub struct ForbiddenResponse {
    pub message: String,
}

impl Default for ForbiddenResponse {
    fn default() -> Self {
        Self {
            message: "Staff access required".to_string(),
        }
    }
}

#[derive(Object, Deserialize)]
pub struct NotFoundResponse {
    pub message: String,
}

#[derive(Object, Deserialize)]
pub struct InternalServerErrorResponse {
    pub module: String,
    pub function: String,
    pub step: String,
    pub error: String,
}

impl InternalServerErrorResponse {
    pub fn new(module: &str, function: &str, step: &str, error: &str) -> Self {
        tracing::error!("{}::{} failed at '{}': {}", module, function, step, error);
        Self {
            module: module.to_string(),
            function: function.to_string(),
            step: step.to_string(),
            error: error.to_string(),
        }
    }
}

/// Error body of the provider-backed endpoints.
#[derive(Object, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[oai(skip_serializing_if_is_none)]
    pub etype: Option<String>,
    #[oai(skip_serializing_if_is_none)]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn message(error: &str) -> Self {
        Self {
            error: error.to_string(),
            etype: None,
            details: None,
        }
    }
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        let etype = err.status().is_server_error().then(|| err.kind().to_string());
        Self {
            error: err.to_string(),
            etype,
            details: err.details().cloned(),
        }
    }
}

#[derive(Object, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Object, Deserialize)]
pub struct PaginateResponse<T: ParseFromJSON + ToJSON> {
    pub counts: u32,
    pub page: u32,
    pub page_count: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}
