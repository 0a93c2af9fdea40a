//! 每日市场数据模型
//!
//! 包含每日交易资料、三大法人买卖超、融资融券三类按日记录

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 按 (股票, 交易日) 唯一的每日记录
pub trait DailyRecord: Clone {
    /// 数据集名称，用于错误信息
    const KIND: &'static str;

    fn stock_id(&self) -> &str;
    fn trade_date(&self) -> NaiveDate;
    /// 入库时分配 id 与创建时间
    fn assign_identity(&mut self, id: String, created_at: DateTime<Utc>);
}

// ==================== 每日交易资料 ====================

/// 每日交易资料
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTradingData {
    pub id: String,
    pub stock_id: String,
    pub trade_date: NaiveDate,
    /// 开盘价
    pub opening_price: f64,
    /// 收盘价
    pub closing_price: f64,
    /// 最高价
    pub highest_price: f64,
    /// 最低价
    pub lowest_price: f64,
    /// 成交量（股）
    pub trading_volume: u64,
    /// 成交金额（元）
    pub trading_value: f64,
    /// 成交笔数
    pub transaction_count: u64,
    /// 涨跌
    #[serde(default)]
    pub change: Option<f64>,
    /// 涨跌幅（比率，0.055 即 5.5%）
    #[serde(default)]
    pub change_percent: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl DailyRecord for DailyTradingData {
    const KIND: &'static str = "Trading data";

    fn stock_id(&self) -> &str {
        &self.stock_id
    }
    fn trade_date(&self) -> NaiveDate {
        self.trade_date
    }
    fn assign_identity(&mut self, id: String, created_at: DateTime<Utc>) {
        self.id = id;
        self.created_at = created_at;
    }
}

/// 新增交易资料请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingDataInput {
    pub trade_date: String,
    pub opening_price: f64,
    pub closing_price: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub trading_volume: u64,
    pub trading_value: f64,
    pub transaction_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
}

// ==================== 三大法人资料 ====================

/// 三大法人买卖超
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionalInvestor {
    pub id: String,
    pub stock_id: String,
    pub trade_date: NaiveDate,
    /// 外资买进（股）
    pub foreign_buy: u64,
    pub foreign_sell: u64,
    pub foreign_net: i64,
    /// 投信
    pub investment_trust_buy: u64,
    pub investment_trust_sell: u64,
    pub investment_trust_net: i64,
    /// 自营商
    pub dealer_buy: u64,
    pub dealer_sell: u64,
    pub dealer_net: i64,
    /// 三大法人买卖超合计
    pub total_net: i64,
    pub created_at: DateTime<Utc>,
}

impl DailyRecord for InstitutionalInvestor {
    const KIND: &'static str = "Institutional data";

    fn stock_id(&self) -> &str {
        &self.stock_id
    }
    fn trade_date(&self) -> NaiveDate {
        self.trade_date
    }
    fn assign_identity(&mut self, id: String, created_at: DateTime<Utc>) {
        self.id = id;
        self.created_at = created_at;
    }
}

/// 新增法人资料请求体，买卖超字段可省略由系统推导
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionalInput {
    pub trade_date: String,
    pub foreign_buy: u64,
    pub foreign_sell: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_net: Option<i64>,
    pub investment_trust_buy: u64,
    pub investment_trust_sell: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_trust_net: Option<i64>,
    pub dealer_buy: u64,
    pub dealer_sell: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer_net: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_net: Option<i64>,
}

// ==================== 融资融券资料 ====================

/// 融资融券
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarginTrading {
    pub id: String,
    pub stock_id: String,
    pub trade_date: NaiveDate,
    /// 融资买进（股）
    pub margin_buy: u64,
    pub margin_sell: u64,
    /// 融资余额
    pub margin_balance: u64,
    pub margin_change: i64,
    /// 融券卖出（股）
    pub short_sell: u64,
    /// 融券买进
    pub short_cover: u64,
    pub short_balance: u64,
    pub short_change: i64,
    #[serde(default)]
    pub margin_quota: Option<u64>,
    #[serde(default)]
    pub short_quota: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl DailyRecord for MarginTrading {
    const KIND: &'static str = "Margin data";

    fn stock_id(&self) -> &str {
        &self.stock_id
    }
    fn trade_date(&self) -> NaiveDate {
        self.trade_date
    }
    fn assign_identity(&mut self, id: String, created_at: DateTime<Utc>) {
        self.id = id;
        self.created_at = created_at;
    }
}

/// 新增融资融券请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginInput {
    pub trade_date: String,
    pub margin_buy: u64,
    pub margin_sell: u64,
    pub margin_balance: u64,
    pub margin_change: i64,
    pub short_sell: u64,
    pub short_cover: u64,
    pub short_balance: u64,
    pub short_change: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_quota: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_quota: Option<u64>,
}

// ==================== 查询参数 ====================

/// 日期区间查询参数（YYYY-MM-DD）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl DateRangeQuery {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// 单日查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// 排行查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}
