//! 统一错误类型
//!
//! 所有业务错误都归结为 `AppError`，并通过 actix-web 的 `ResponseError`
//! 转换为统一的错误响应信封

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error as ThisError;

use crate::models::{ApiErrorResponse, FieldError};

#[derive(ThisError, Debug)]
pub enum AppError {
    /// 请求参数缺失或格式错误（400）
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    /// 资源不存在（404）
    #[error("{0}")]
    NotFound(String),

    /// 资源冲突，例如股票代码重复（409）
    #[error("{0}")]
    Conflict(String),

    /// 未预期的内部错误（500）
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn stock_not_found(stock_code: &str) -> Self {
        AppError::NotFound(format!("Stock {} not found", stock_code))
    }

    /// 错误代码，对应响应中的 `error.code`
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let details = match self {
            AppError::Validation { details, .. } if !details.is_empty() => Some(details.clone()),
            _ => None,
        };
        let body = ApiErrorResponse::new(self.code(), self.to_string(), details);
        HttpResponse::build(self.status_code()).json(body)
    }
}
