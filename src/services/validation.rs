//! 请求校验工具
//!
//! 收集字段级错误，最后统一转换为 `AppError::Validation`

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::models::FieldError;

static STOCK_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z]{1,10}$").expect("Failed to compile stock code regex"));
static TRADE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Failed to compile trade date regex"));

/// 股票代码：1 到 10 位英数字（如 2330、00878、1101B）
pub fn is_valid_stock_code(code: &str) -> bool {
    STOCK_CODE.is_match(code)
}

/// 解析 YYYY-MM-DD 格式日期
pub fn parse_trade_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if !TRADE_DATE.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// 解析路径中的日期参数
pub fn require_date(field: &str, raw: &str) -> AppResult<NaiveDate> {
    parse_trade_date(raw).ok_or_else(|| AppError::Validation {
        message: format!("Invalid {}: {}", field, raw),
        details: vec![FieldError::new(field, "must be a valid date in YYYY-MM-DD format")],
    })
}

#[derive(Debug, Default)]
pub struct Validator {
    details: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.details.push(FieldError::new(field, message));
        }
    }

    /// 价格、金额等浮点字段必须为有限的非负数
    pub fn non_negative(&mut self, field: &str, value: f64) {
        self.check(value.is_finite() && value >= 0.0, field, "must be a non-negative number");
    }

    pub fn trade_date(&mut self, raw: &str) -> Option<NaiveDate> {
        let parsed = parse_trade_date(raw);
        self.check(
            parsed.is_some(),
            "tradeDate",
            "must be a valid date in YYYY-MM-DD format",
        );
        parsed
    }

    pub fn is_valid(&self) -> bool {
        self.details.is_empty()
    }

    pub fn finish(self, message: &str) -> AppResult<()> {
        if self.details.is_empty() {
            return Ok(());
        }
        Err(AppError::Validation {
            message: message.to_string(),
            details: self.details,
        })
    }
}
