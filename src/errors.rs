use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::HttpResponse;
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(_) => AppError::NotFound(e.to_string()),
            DomainError::Validation { message, details } => AppError::Validation { message, details },
            DomainError::InsufficientStock {
                ref product,
                requested,
                available,
            } => AppError::Validation {
                details: Some(json!({
                    "product": product,
                    "requested": requested,
                    "available": available,
                })),
                message: e.to_string(),
            },
            DomainError::InvalidTransition { .. } => AppError::bad_request(e.to_string()),
            DomainError::Unauthorized(msg) => AppError::Unauthorized(msg),
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::DuplicateOrderNumber(_) => AppError::Conflict(e.to_string()),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation {
            message: "Validation failed".to_string(),
            details: serde_json::to_value(&e).ok(),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (message, details) = match self {
            AppError::Validation { message, details } => (message.clone(), details.clone()),
            AppError::Internal(detail) => {
                log::error!("internal error: {detail}");
                ("Internal server error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        HttpResponse::build(self.status_code()).json(envelope(&message, details))
    }
}

fn envelope(message: &str, details: Option<Value>) -> Value {
    let mut error = json!({ "message": message });
    if let Some(details) = details {
        error["details"] = details;
    }
    json!({ "success": false, "error": error })
}

/// `ErrorHandlers` hook that puts the cause of an internal error back into
/// the 500 envelope. Only wired in outside production.
pub fn with_internal_details<B>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let detail = match res.response().error().and_then(|e| e.as_error::<AppError>()) {
        Some(AppError::Internal(detail)) => detail.clone(),
        _ => return Ok(ErrorHandlerResponse::Response(res.map_into_left_body())),
    };
    let (req, res) = res.into_parts();
    let res = HttpResponse::build(res.status()).json(envelope(
        "Internal server error",
        Some(Value::String(detail)),
    ));
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, res).map_into_right_body(),
    ))
}
