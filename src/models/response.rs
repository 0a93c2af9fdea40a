//! 通用 API 响应模型
//!
//! 定义统一的 API 响应格式

use chrono::Utc;
use chrono_tz::Asia::Taipei;
use serde::{Deserialize, Serialize};

/// 获取台北时间（UTC+8）
pub fn get_taipei_time() -> chrono::DateTime<chrono_tz::Tz> {
    Utc::now().with_timezone(&Taipei)
}

/// 响应元数据
///
/// 分页相关字段只在列表接口中出现
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// 响应时间戳（台北时间，ISO 8601 格式）
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
}

impl ResponseMeta {
    pub fn now() -> Self {
        Self {
            timestamp: get_taipei_time().to_rfc3339(),
            page: None,
            page_size: None,
            total_count: None,
            total_pages: None,
        }
    }

    pub fn paged<T>(page: &Page<T>) -> Self {
        Self {
            page: Some(page.page),
            page_size: Some(page.page_size),
            total_count: Some(page.total_count),
            total_pages: Some(page.total_pages),
            ..Self::now()
        }
    }
}

/// 统一 API 成功响应结构
///
/// 所有成功接口返回：
/// - success: 恒为 true
/// - data: 响应数据
/// - meta: 时间戳及分页信息
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: Some(ResponseMeta::now()),
        }
    }

    /// 创建带分页信息的成功响应
    pub fn paged(page: Page<T>) -> ApiResponse<Vec<T>> {
        let meta = ResponseMeta::paged(&page);
        ApiResponse {
            success: true,
            data: page.items,
            meta: Some(meta),
        }
    }
}

/// 字段级校验错误
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 错误详情
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// 统一 API 错误响应结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl ApiErrorResponse {
    /// 创建错误响应
    pub fn new(code: &str, message: impl Into<String>, details: Option<Vec<FieldError>>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message: message.into(),
                details,
            },
            meta: Some(ResponseMeta::now()),
        }
    }
}

/// 分页结果
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: usize,
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    /// 从完整结果集切出指定页，越界页返回空列表
    pub fn slice(all: &[T], page: u32, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let total_count = all.len();
        let total_pages = total_count.div_ceil(page_size as usize);

        let items = if page == 0 {
            Vec::new()
        } else {
            let start = (page as usize - 1).saturating_mul(page_size as usize);
            all.iter().skip(start).take(page_size as usize).cloned().collect()
        };

        Self {
            items,
            page,
            page_size,
            total_count,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slice() {
        let all: Vec<u32> = (1..=45).collect();

        let first = Page::slice(&all, 1, 20);
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.total_count, 45);
        assert_eq!(first.total_pages, 3);

        let last = Page::slice(&all, 3, 20);
        assert_eq!(last.items, vec![41, 42, 43, 44, 45]);

        assert!(Page::slice(&all, 4, 20).items.is_empty());
        assert!(Page::slice(&all, 0, 20).items.is_empty());
    }

    #[test]
    fn test_page_slice_empty() {
        let empty: Vec<u32> = Vec::new();
        let page = Page::slice(&empty, 1, 20);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_meta_timestamp_is_taipei() {
        let meta = ResponseMeta::now();
        assert!(meta.timestamp.ends_with("+08:00"));
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ApiErrorResponse::new("NOT_FOUND", "Stock 1234 not found", None);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"].get("details").is_none());
    }
}
