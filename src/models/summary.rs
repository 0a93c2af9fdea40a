//! 综合查询模型
//!
//! 组合视图，不单独存储

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DailyTradingData, InstitutionalInvestor, MarginTrading, Stock};

/// 股票完整资料
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockCompleteData {
    pub stock: Stock,
    pub trading_data: Option<DailyTradingData>,
    pub institutional: Option<InstitutionalInvestor>,
    pub margin: Option<MarginTrading>,
}

/// 市场概况
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    pub total_stocks: usize,
    pub trading_volume: u64,
    pub trading_value: f64,
    /// 上涨家数
    pub advancers: usize,
    /// 下跌家数
    pub decliners: usize,
    /// 平盘家数
    pub unchanged: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionalTopItem {
    pub stock: Stock,
    pub net_buying: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarginTopItem {
    pub stock: Stock,
    pub margin_change: i64,
    pub short_change: i64,
}

/// 仪表板摘要
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// 统计所用交易日，无交易资料时为 null
    pub trade_date: Option<NaiveDate>,
    pub market_overview: MarketOverview,
    pub top_gainers: Vec<StockCompleteData>,
    pub top_losers: Vec<StockCompleteData>,
    pub top_volume: Vec<StockCompleteData>,
    pub institutional_top: Vec<InstitutionalTopItem>,
    pub margin_top: Vec<MarginTopItem>,
}

/// 法人买卖超排行项目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstitutionalRanking {
    pub stock: Stock,
    pub institutional: InstitutionalInvestor,
}

/// 融资融券排行项目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarginRanking {
    pub stock: Stock,
    pub margin: MarginTrading,
}

/// 区间统计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockStatistics {
    pub stock_code: String,
    /// 统计期间，如 2026-02-01~2026-02-05
    pub period: String,
    pub avg_volume: f64,
    pub avg_price: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub total_institutional_net: i64,
    pub total_margin_change: i64,
    pub total_short_change: i64,
}
