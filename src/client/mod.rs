//! API 客户端
//!
//! 供前端或脚本调用后端接口的类型化 HTTP 客户端

mod api;

pub use api::{StockApiClient, DEFAULT_BASE_URL, REQUEST_TIMEOUT};

use thiserror::Error;

use crate::models::FieldError;

/// 无法取得具体错误信息时的提示
pub const UNKNOWN_ERROR_MESSAGE: &str = "發生未知錯誤";

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// 客户端错误
#[derive(Debug, Error)]
pub enum ClientError {
    /// 请求已发出但没有收到回应（连线失败、超时等）
    #[error("無法連線至伺服器: {0}")]
    Transport(#[source] reqwest::Error),

    /// 服务器返回错误状态
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Vec<FieldError>,
    },

    #[error("回應格式錯誤: {0}")]
    Decode(String),

    #[error("無效的 API 位址: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// 适合直接显示给用户的错误信息
    pub fn error_message(&self) -> String {
        let message = match self {
            ClientError::Api { message, .. } => message.trim().to_string(),
            other => other.to_string(),
        };
        if message.is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// HTTP 状态码，仅服务器返回错误时有值
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 错误代码，如 NOT_FOUND、VALIDATION_ERROR
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}
