use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::Display;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Defines the connector's custom error types.
///
/// Validation and business variants are the machine-readable part of the
/// contract with the host platform: they always carry a stable code and, for
/// validation, the offending parameter.
///
#[derive(Debug, Error)]
pub enum Error {
    #[error("Error: {0}")]
    Any(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Authentication error: {0}")]
    Auth(AuthError),
    #[error("Validation error on '{parameter}': {reason}")]
    Validation {
        parameter: String,
        reason: ValidationError,
        value: Option<String>,
    },
    #[error("Business error: {0}")]
    Business(BusinessError),
    #[error("Header convert error: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderValue),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to set logger: {0}")]
    Logger(#[from] tracing_log::log::SetLoggerError),
    #[error("IO error: {0}")]
    InputOutput(#[from] std::io::Error),
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tracing::dispatcher::SetGlobalDefaultError),
    #[error("Address parse error: {0}")]
    ParseAddr(#[from] std::net::AddrParseError),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Builds a validation error on `parameter` without contextual value.
    ///
    pub fn validation(parameter: &str, reason: ValidationError) -> Self {
        Self::Validation {
            parameter: parameter.to_owned(),
            reason,
            value: None,
        }
    }

    /// Builds a validation error on `parameter` carrying the rejected value,
    /// e.g. the identifier of a VM that does not exist.
    ///
    pub fn validation_with(parameter: &str, reason: ValidationError, value: &str) -> Self {
        Self::Validation {
            parameter: parameter.to_owned(),
            reason,
            value: Some(value.to_owned()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation {
                parameter,
                reason,
                value,
            } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "parameter": parameter,
                    "code": reason.to_string(),
                    "value": value,
                })),
            )
                .into_response(),
            Error::Business(code) => (
                StatusCode::CONFLICT,
                Json(json!({ "code": code.to_string() })),
            )
                .into_response(),
            Error::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {what}")).into_response(),
            Error::Auth(_) | Error::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                "Authorization token is missing or invalid!".to_owned(),
            )
                .into_response(),
            error => {
                tracing::error!(target: "error", %error, "Unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error!".to_owned(),
                )
                    .into_response()
            }
        }
    }
}

/// Represents authentication-related errors of inbound callers.
///
#[derive(Debug, Display)]
pub enum AuthError {
    Token,
}

/// Reason codes attached to a validation error.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ValidationError {
    #[display("required")]
    Required,
    #[display("vcloud-login")]
    Login,
    #[display("vcloud-vm")]
    UnknownVm,
    #[display("vcloud-admin")]
    NotAdmin,
}

/// Business rule codes.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BusinessError {
    #[display("vm-operation-execute")]
    VmOperationExecute,
}
