//! 显示用格式化函数
//!
//! 所有函数都是纯函数且不会失败：缺值、NaN 或无法解析的输入一律返回 `-`。
//! 带时区的时间戳统一换算为台湾时间（UTC+08:00）显示。

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Asia::Taipei;
use serde::Serialize;

/// 缺值时的显示文字
pub const MISSING: &str = "-";
/// 默认小数位数
pub const DEFAULT_DECIMALS: usize = 2;
/// 默认货币符号
pub const DEFAULT_CURRENCY: &str = "NT$";
/// 1 张 = 1000 股
pub const SHARES_PER_LOT: f64 = 1000.0;

// ==================== 数字 ====================

/// 千分位格式，最多保留 3 位小数
///
/// `format_number(Some(1234567.0))` => `"1,234,567"`
pub fn format_number(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => group_number(v, 3),
        None => MISSING.to_string(),
    }
}

/// 金额，`format_currency(Some(1234567.0), "NT$")` => `"NT$ 1,234,567"`
pub fn format_currency(amount: Option<f64>, currency: &str) -> String {
    match finite(amount) {
        Some(v) => format!("{} {}", currency, group_number(v, 3)),
        None => MISSING.to_string(),
    }
}

/// 比例转百分比，`format_percent(Some(0.1234), 2)` => `"12.34%"`
pub fn format_percent(value: Option<f64>, decimals: usize) -> String {
    match finite(value) {
        Some(v) => format!("{:.*}%", decimals, v * 100.0),
        None => MISSING.to_string(),
    }
}

/// 大数字缩写（K / M / B）
pub fn format_large_number(value: Option<f64>, decimals: usize) -> String {
    let Some(v) = finite(value) else {
        return MISSING.to_string();
    };
    let sign = if v < 0.0 { "-" } else { "" };
    let abs = v.abs();
    let (scaled, suffix) = if abs >= 1e9 {
        (abs / 1e9, "B")
    } else if abs >= 1e6 {
        (abs / 1e6, "M")
    } else if abs >= 1e3 {
        (abs / 1e3, "K")
    } else {
        (abs, "")
    };
    format!("{}{:.*}{}", sign, decimals, scaled, suffix)
}

/// 成交量（股）转张数，无条件舍去
///
/// `format_volume(Some(1_000_000.0))` => `"1,000 張"`
pub fn format_volume(shares: Option<f64>) -> String {
    match finite(shares) {
        Some(v) => format!("{} 張", group_number((v / SHARES_PER_LOT).floor(), 0)),
        None => MISSING.to_string(),
    }
}

/// 成交金额换算为亿元或万元
pub fn format_trading_value(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) if v >= 1e8 => format!("{:.2} 億", v / 1e8),
        Some(v) if v >= 1e4 => format!("{:.2} 萬", v / 1e4),
        Some(v) => group_number(v, 3),
        None => MISSING.to_string(),
    }
}

/// 涨跌幅（比例），前值为 0 或无效时返回 None
pub fn calculate_change_percent(previous: f64, current: f64) -> Option<f64> {
    if !previous.is_finite() || previous == 0.0 || !current.is_finite() {
        return None;
    }
    Some((current - previous) / previous)
}

// ==================== 涨跌 ====================

/// 涨跌方向，对应前端的颜色样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeTone {
    Positive,
    Negative,
    Neutral,
}

impl ChangeTone {
    fn of(value: f64) -> Self {
        if value > 0.0 {
            ChangeTone::Positive
        } else if value < 0.0 {
            ChangeTone::Negative
        } else {
            ChangeTone::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeTone::Positive => "positive",
            ChangeTone::Negative => "negative",
            ChangeTone::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedChange {
    pub text: String,
    pub tone: ChangeTone,
}

impl FormattedChange {
    fn missing() -> Self {
        Self {
            text: MISSING.to_string(),
            tone: ChangeTone::Neutral,
        }
    }
}

/// 带正负号的涨跌，`format_change(Some(5.5), 2)` => `"+5.50"`
pub fn format_change(value: Option<f64>, decimals: usize) -> FormattedChange {
    match finite(value) {
        Some(v) => signed(v, decimals, ""),
        None => FormattedChange::missing(),
    }
}

/// 带正负号的涨跌幅，`format_change_percent(Some(0.055), 2)` => `"+5.50%"`
pub fn format_change_percent(value: Option<f64>, decimals: usize) -> FormattedChange {
    match finite(value) {
        Some(v) => signed(v * 100.0, decimals, "%"),
        None => FormattedChange::missing(),
    }
}

fn signed(value: f64, decimals: usize, suffix: &str) -> FormattedChange {
    // 统一 -0.0
    let value = if value == 0.0 { 0.0 } else { value };
    let sign = if value > 0.0 { "+" } else { "" };
    FormattedChange {
        text: format!("{}{:.*}{}", sign, decimals, value, suffix),
        tone: ChangeTone::of(value),
    }
}

// ==================== 日期时间 ====================

/// 日期显示格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePattern {
    /// YYYY/MM/DD
    #[default]
    Slash,
    /// YYYY-MM-DD
    Dash,
    /// MM/DD
    MonthDay,
    /// YYYY年MM月DD日
    Chinese,
}

impl DatePattern {
    /// 依样式名称解析，未知名称使用默认格式
    pub fn parse(name: &str) -> Self {
        match name {
            "YYYY-MM-DD" => DatePattern::Dash,
            "MM/DD" => DatePattern::MonthDay,
            "YYYY年MM月DD日" => DatePattern::Chinese,
            _ => DatePattern::Slash,
        }
    }

    fn chrono_format(&self) -> &'static str {
        match self {
            DatePattern::Slash => "%Y/%m/%d",
            DatePattern::Dash => "%Y-%m-%d",
            DatePattern::MonthDay => "%m/%d",
            DatePattern::Chinese => "%Y年%m月%d日",
        }
    }
}

/// 格式化日期，`format_date(Some("2026-02-03"), DatePattern::Slash)` => `"2026/02/03"`
pub fn format_date(input: Option<&str>, pattern: DatePattern) -> String {
    match input.and_then(parse_local) {
        Some(dt) => dt.format(pattern.chrono_format()).to_string(),
        None => MISSING.to_string(),
    }
}

/// 格式化日期时间为 `YYYY/MM/DD HH:mm`
pub fn format_date_time(input: Option<&str>) -> String {
    match input.and_then(parse_local) {
        Some(dt) => dt.format("%Y/%m/%d %H:%M").to_string(),
        None => MISSING.to_string(),
    }
}

/// 相对于当前时间的描述
pub fn format_relative_time(input: Option<&str>) -> String {
    format_relative_time_at(input, Utc::now())
}

/// 相对于 `now` 的描述：剛剛 / N 分鐘前 / N 小時前 / N 天前，超过一周显示日期
pub fn format_relative_time_at(input: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(instant) = input.and_then(parse_instant) else {
        return MISSING.to_string();
    };

    let seconds = (now - instant).num_seconds();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if seconds < 60 {
        "剛剛".to_string()
    } else if minutes < 60 {
        format!("{} 分鐘前", minutes)
    } else if hours < 24 {
        format!("{} 小時前", hours)
    } else if days < 7 {
        format!("{} 天前", days)
    } else {
        format_date(input, DatePattern::default())
    }
}

/// 解析为台湾本地时间；带时区的时间戳先换算
fn parse_local(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Taipei).naive_local());
    }
    parse_naive(s)
}

/// 解析为绝对时间；不带时区的输入视为台湾时间
fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = parse_naive(s)?;
    Taipei
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ==================== 文字 ====================

/// 股票代码去空白并转大写
pub fn format_stock_code(code: Option<&str>) -> String {
    match code.map(str::trim) {
        Some(code) if !code.is_empty() => code.to_uppercase(),
        _ => MISSING.to_string(),
    }
}

/// 超过 `max_chars` 个字符时截断并加上 `...`
pub fn truncate_text(text: Option<&str>, max_chars: usize) -> String {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return MISSING.to_string();
    };
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

// ==================== 内部工具 ====================

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// 千分位分组，最多保留 `max_decimals` 位小数并去掉末尾的 0
fn group_number(value: f64, max_decimals: usize) -> String {
    let fixed = format!("{:.*}", max_decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut out = String::new();
    if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(None), "-");
        assert_eq!(format_number(Some(f64::NAN)), "-");
        assert_eq!(format_number(Some(1234567.0)), "1,234,567");
        assert_eq!(format_number(Some(1234.5678)), "1,234.568");
        assert_eq!(format_number(Some(-1234.5)), "-1,234.5");
        assert_eq!(format_number(Some(-0.0)), "0");
        assert_eq!(format_number(Some(999.0)), "999");
    }

    #[test]
    fn test_format_currency_and_percent() {
        assert_eq!(format_currency(Some(1234567.0), DEFAULT_CURRENCY), "NT$ 1,234,567");
        assert_eq!(format_currency(Some(10.0), "US$"), "US$ 10");
        assert_eq!(format_currency(None, DEFAULT_CURRENCY), "-");
        assert_eq!(format_percent(Some(0.1234), 2), "12.34%");
        assert_eq!(format_percent(Some(0.5), 0), "50%");
        assert_eq!(format_percent(None, 2), "-");
    }

    #[test]
    fn test_format_change_percent() {
        let up = format_change_percent(Some(0.055), DEFAULT_DECIMALS);
        assert_eq!(up.text, "+5.50%");
        assert_eq!(up.tone, ChangeTone::Positive);

        let down = format_change_percent(Some(-0.02), DEFAULT_DECIMALS);
        assert_eq!(down.text, "-2.00%");
        assert_eq!(down.tone, ChangeTone::Negative);

        let flat = format_change_percent(Some(0.0), DEFAULT_DECIMALS);
        assert_eq!(flat.text, "0.00%");
        assert_eq!(flat.tone, ChangeTone::Neutral);

        let neg_zero = format_change_percent(Some(-0.0), DEFAULT_DECIMALS);
        assert_eq!(neg_zero.text, "0.00%");
        assert_eq!(neg_zero.tone, ChangeTone::Neutral);

        assert_eq!(format_change_percent(None, 2).text, "-");
    }

    #[test]
    fn test_format_change() {
        let up = format_change(Some(5.5), 2);
        assert_eq!(up.text, "+5.50");
        assert_eq!(up.tone.as_str(), "positive");
        assert_eq!(format_change(Some(-3.0), 1).text, "-3.0");
        assert_eq!(serde_json::to_value(ChangeTone::Negative).unwrap(), "negative");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2026-02-03"), DatePattern::Slash), "2026/02/03");
        assert_eq!(format_date(Some("2026-02-03"), DatePattern::Dash), "2026-02-03");
        assert_eq!(format_date(Some("2026-02-03"), DatePattern::MonthDay), "02/03");
        assert_eq!(format_date(Some("2026-02-03"), DatePattern::Chinese), "2026年02月03日");
        assert_eq!(format_date(Some("2026-02-03"), DatePattern::parse("unknown")), "2026/02/03");
        assert_eq!(format_date(Some("not a date"), DatePattern::Slash), "-");
        assert_eq!(format_date(None, DatePattern::Slash), "-");

        // UTC 晚上 8 点已是台湾隔天
        assert_eq!(format_date(Some("2026-02-03T20:00:00Z"), DatePattern::Slash), "2026/02/04");
    }

    #[test]
    fn test_format_date_time() {
        assert_eq!(format_date_time(Some("2026-02-03T10:30:00")), "2026/02/03 10:30");
        assert_eq!(format_date_time(Some("2026-02-03T02:30:00.123Z")), "2026/02/03 10:30");
        assert_eq!(format_date_time(Some("2026-02-03T10:30:00+08:00")), "2026/02/03 10:30");
        assert_eq!(format_date_time(Some("")), "-");
    }

    #[test]
    fn test_format_relative_time() {
        // 台湾时间 2026-02-03 10:30
        let now = Utc.with_ymd_and_hms(2026, 2, 3, 2, 30, 0).unwrap();
        let at = |s: &str| format_relative_time_at(Some(s), now);

        assert_eq!(at("2026-02-03T10:29:30"), "剛剛");
        assert_eq!(at("2026-02-03T10:00:00"), "30 分鐘前");
        assert_eq!(at("2026-02-03T02:00:00Z"), "30 分鐘前");
        assert_eq!(at("2026-02-03T07:30:00"), "3 小時前");
        assert_eq!(at("2026-02-02T10:00:00"), "1 天前");
        assert_eq!(at("2026-01-01T10:00:00"), "2026/01/01");
        assert_eq!(format_relative_time_at(None, now), "-");
    }

    #[test]
    fn test_large_numbers_and_market_units() {
        assert_eq!(format_large_number(Some(1234567.0), 2), "1.23M");
        assert_eq!(format_large_number(Some(-1500.0), 2), "-1.50K");
        assert_eq!(format_large_number(Some(2.5e9), 1), "2.5B");
        assert_eq!(format_large_number(Some(999.0), 2), "999.00");

        assert_eq!(format_volume(Some(1_000_000.0)), "1,000 張");
        assert_eq!(format_volume(Some(1500.0)), "1 張");
        assert_eq!(format_volume(None), "-");

        assert_eq!(format_trading_value(Some(123456789.0)), "1.23 億");
        assert_eq!(format_trading_value(Some(56789.0)), "5.68 萬");
        assert_eq!(format_trading_value(Some(1234.5)), "1,234.5");
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(format_stock_code(Some(" 2330 ")), "2330");
        assert_eq!(format_stock_code(Some("00631l")), "00631L");
        assert_eq!(format_stock_code(None), "-");

        assert_eq!(truncate_text(Some("這是一段很長的文字"), 6), "這是一段很長...");
        assert_eq!(truncate_text(Some("短"), 6), "短");
        assert_eq!(truncate_text(Some(""), 6), "-");
    }

    #[test]
    fn test_calculate_change_percent() {
        let pct = calculate_change_percent(100.0, 110.0).unwrap();
        assert!((pct - 0.1).abs() < 1e-12);
        assert_eq!(calculate_change_percent(0.0, 110.0), None);
        assert_eq!(calculate_change_percent(f64::NAN, 1.0), None);
    }
}
