//! 股票数据模型
//!
//! 定义股票基本资料及其请求参数

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 市场别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MarketType {
    /// 上市（证交所）
    #[default]
    #[serde(rename = "上市")]
    Listed,
    /// 上柜（柜买中心）
    #[serde(rename = "上櫃")]
    Otc,
    /// 兴柜
    #[serde(rename = "興櫃")]
    Emerging,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Listed => "上市",
            MarketType::Otc => "上櫃",
            MarketType::Emerging => "興櫃",
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "上市" => Ok(MarketType::Listed),
            "上櫃" => Ok(MarketType::Otc),
            "興櫃" => Ok(MarketType::Emerging),
            other => Err(format!("unknown market type: {}", other)),
        }
    }
}

/// 股票基本资料
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: String,
    /// 股票代码（如 2330）
    pub stock_code: String,
    /// 股票名称（如 台積電）
    pub stock_name: String,
    /// 产业别
    #[serde(default)]
    pub industry: Option<String>,
    /// 市场别
    #[serde(default)]
    pub market_type: Option<MarketType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新增股票请求体
///
/// 必填字段也用 Option 接收，以便返回统一的校验错误
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockRequest {
    pub stock_code: Option<String>,
    pub stock_name: Option<String>,
    pub industry: Option<String>,
    pub market_type: Option<MarketType>,
}

/// 更新股票请求体
///
/// 只接受可修改字段，其他字段一律拒绝
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateStockRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_type: Option<MarketType>,
}

/// 校验通过后的新股票
#[derive(Debug, Clone)]
pub struct NewStock {
    pub stock_code: String,
    pub stock_name: String,
    pub industry: Option<String>,
    pub market_type: MarketType,
}

/// 校验通过后的股票变更
#[derive(Debug, Clone, Default)]
pub struct StockChanges {
    pub stock_name: Option<String>,
    /// Some(None) 表示清空产业别
    pub industry: Option<Option<String>>,
    pub market_type: Option<MarketType>,
}

/// 排序字段
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StockSortField {
    StockCode,
    StockName,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// 股票列表查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuery {
    /// 搜索股票代码或名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// 筛选产业别
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// 筛选市场别
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_type: Option<MarketType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<StockSortField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// 存储层使用的股票过滤条件
#[derive(Debug, Clone, Default)]
pub struct StockFilter {
    pub search: Option<String>,
    pub industry: Option<String>,
    pub market_type: Option<MarketType>,
    pub sort_by: Option<StockSortField>,
    pub sort_order: SortOrder,
}

impl StockFilter {
    pub fn matches(&self, stock: &Stock) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = stock.stock_code.to_lowercase().contains(&term)
                || stock.stock_name.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if let Some(industry) = &self.industry {
            if stock.industry.as_deref() != Some(industry.as_str()) {
                return false;
            }
        }
        if let Some(market_type) = self.market_type {
            if stock.market_type != Some(market_type) {
                return false;
            }
        }
        true
    }

    /// 按排序条件就地排序；未指定排序字段时保持插入顺序
    pub fn sort(&self, stocks: &mut [Stock]) {
        let Some(field) = self.sort_by else {
            return;
        };
        stocks.sort_by(|a, b| {
            let ordering = match field {
                StockSortField::StockCode => a.stock_code.cmp(&b.stock_code),
                StockSortField::StockName => a.stock_name.cmp(&b.stock_name),
                StockSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            match self.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(code: &str, name: &str, industry: &str) -> Stock {
        let now = Utc::now();
        Stock {
            id: code.to_string(),
            stock_code: code.to_string(),
            stock_name: name.to_string(),
            industry: Some(industry.to_string()),
            market_type: Some(MarketType::Listed),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_market_type_serde() {
        let json = serde_json::to_string(&MarketType::Otc).unwrap();
        assert_eq!(json, "\"上櫃\"");
        let parsed: MarketType = serde_json::from_str("\"興櫃\"").unwrap();
        assert_eq!(parsed, MarketType::Emerging);
        assert!("上市".parse::<MarketType>().is_ok());
        assert!("NASDAQ".parse::<MarketType>().is_err());
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let filter = StockFilter {
            search: Some("tsm".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&stock("2330", "TSMC", "半導體")));
        assert!(!filter.matches(&stock("2317", "鴻海", "電子")));

        let by_code = StockFilter {
            search: Some("23".to_string()),
            ..Default::default()
        };
        assert!(by_code.matches(&stock("2317", "鴻海", "電子")));
    }

    #[test]
    fn test_filter_sort_desc() {
        let mut stocks = vec![stock("2317", "鴻海", "電子"), stock("2882", "國泰金", "金融"), stock("2330", "台積電", "半導體")];
        let filter = StockFilter {
            sort_by: Some(StockSortField::StockCode),
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        filter.sort(&mut stocks);
        let codes: Vec<&str> = stocks.iter().map(|s| s.stock_code.as_str()).collect();
        assert_eq!(codes, vec!["2882", "2330", "2317"]);
    }

    #[test]
    fn test_update_request_rejects_protected_fields() {
        let result: Result<UpdateStockRequest, _> =
            serde_json::from_str(r#"{"stockName":"新名稱","id":"99"}"#);
        assert!(result.is_err());

        let ok: UpdateStockRequest = serde_json::from_str(r#"{"stockName":"新名稱"}"#).unwrap();
        assert_eq!(ok.stock_name.as_deref(), Some("新名稱"));
    }
}
