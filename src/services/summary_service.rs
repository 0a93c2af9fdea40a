//! 综合查询服务
//!
//! 股票完整资料、仪表板摘要、法人/融资融券排行与区间统计

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::AppResult;
use crate::models::{
    DashboardSummary, DateRangeQuery, InstitutionalRanking, InstitutionalTopItem, MarginRanking,
    MarginTopItem, MarketOverview, Stock, StockCompleteData, StockStatistics,
};
use crate::services::market_data_service::validate_range;
use crate::services::store::Repository;

/// 仪表板每个排行的笔数
pub const DASHBOARD_TOP_N: usize = 5;
pub const DEFAULT_RANKING_LIMIT: usize = 10;
pub const MAX_RANKING_LIMIT: usize = 100;

/// 取得股票完整资料
///
/// 指定日期时取该日记录，否则取各资料集最新一笔
pub fn get_complete_data(
    repo: &dyn Repository,
    stock_code: &str,
    date: Option<NaiveDate>,
) -> AppResult<StockCompleteData> {
    let stock = repo.get_stock(stock_code)?;
    Ok(complete_for(repo, stock, date))
}

fn complete_for(repo: &dyn Repository, stock: Stock, date: Option<NaiveDate>) -> StockCompleteData {
    let range = DateRangeQuery {
        start_date: date,
        end_date: date,
    };
    StockCompleteData {
        trading_data: repo.list_trading(&stock.id, &range).pop(),
        institutional: repo.list_institutional(&stock.id, &range).pop(),
        margin: repo.list_margin(&stock.id, &range).pop(),
        stock,
    }
}

/// 仪表板摘要，未指定日期时取最新交易日
pub fn dashboard_summary(repo: &dyn Repository, date: Option<NaiveDate>) -> DashboardSummary {
    let stocks = repo.all_stocks();
    let mut summary = DashboardSummary {
        trade_date: None,
        market_overview: MarketOverview {
            total_stocks: stocks.len(),
            ..Default::default()
        },
        top_gainers: Vec::new(),
        top_losers: Vec::new(),
        top_volume: Vec::new(),
        institutional_top: Vec::new(),
        margin_top: Vec::new(),
    };

    let Some(date) = date.or_else(|| repo.latest_trade_date()) else {
        return summary;
    };
    summary.trade_date = Some(date);

    let by_id: HashMap<&str, &Stock> = stocks.iter().map(|s| (s.id.as_str(), s)).collect();
    let trading = repo.trading_on(date);
    let institutional = repo.institutional_on(date);
    let margin = repo.margin_on(date);

    let overview = &mut summary.market_overview;
    for record in &trading {
        overview.trading_volume = overview.trading_volume.saturating_add(record.trading_volume);
        overview.trading_value += record.trading_value;
        match record.change.map(|c| c.partial_cmp(&0.0)) {
            Some(Some(Ordering::Greater)) => overview.advancers += 1,
            Some(Some(Ordering::Less)) => overview.decliners += 1,
            _ => overview.unchanged += 1,
        }
    }

    let joined = |stock_id: &str| -> Option<StockCompleteData> {
        let stock = (*by_id.get(stock_id)?).clone();
        Some(StockCompleteData {
            trading_data: trading.iter().find(|r| r.stock_id == stock_id).cloned(),
            institutional: institutional.iter().find(|r| r.stock_id == stock_id).cloned(),
            margin: margin.iter().find(|r| r.stock_id == stock_id).cloned(),
            stock,
        })
    };

    let mut gainers: Vec<_> = trading
        .iter()
        .filter(|r| r.change_percent.map_or(false, |p| p > 0.0))
        .collect();
    gainers.sort_by(|a, b| desc(a.change_percent, b.change_percent));
    summary.top_gainers = gainers
        .iter()
        .filter_map(|r| joined(&r.stock_id))
        .take(DASHBOARD_TOP_N)
        .collect();

    let mut losers: Vec<_> = trading
        .iter()
        .filter(|r| r.change_percent.map_or(false, |p| p < 0.0))
        .collect();
    losers.sort_by(|a, b| desc(b.change_percent, a.change_percent));
    summary.top_losers = losers
        .iter()
        .filter_map(|r| joined(&r.stock_id))
        .take(DASHBOARD_TOP_N)
        .collect();

    let mut by_volume: Vec<_> = trading.iter().collect();
    by_volume.sort_by(|a, b| b.trading_volume.cmp(&a.trading_volume));
    summary.top_volume = by_volume
        .iter()
        .filter_map(|r| joined(&r.stock_id))
        .take(DASHBOARD_TOP_N)
        .collect();

    summary.institutional_top = rank_institutional(&by_id, institutional.clone(), DASHBOARD_TOP_N)
        .into_iter()
        .map(|item| InstitutionalTopItem {
            net_buying: item.institutional.total_net,
            stock: item.stock,
        })
        .collect();

    summary.margin_top = rank_margin(&by_id, margin.clone(), DASHBOARD_TOP_N)
        .into_iter()
        .map(|item| MarginTopItem {
            margin_change: item.margin.margin_change,
            short_change: item.margin.short_change,
            stock: item.stock,
        })
        .collect();

    summary
}

/// 法人买卖超排行（依合计买卖超由高到低）
pub fn institutional_summary(
    repo: &dyn Repository,
    date: Option<NaiveDate>,
    limit: Option<usize>,
) -> Vec<InstitutionalRanking> {
    let Some(date) = date.or_else(|| repo.latest_trade_date()) else {
        return Vec::new();
    };
    let stocks = repo.all_stocks();
    let by_id: HashMap<&str, &Stock> = stocks.iter().map(|s| (s.id.as_str(), s)).collect();
    rank_institutional(&by_id, repo.institutional_on(date), clamp_limit(limit))
}

/// 融资融券排行（依融资增减由高到低）
pub fn margin_summary(
    repo: &dyn Repository,
    date: Option<NaiveDate>,
    limit: Option<usize>,
) -> Vec<MarginRanking> {
    let Some(date) = date.or_else(|| repo.latest_trade_date()) else {
        return Vec::new();
    };
    let stocks = repo.all_stocks();
    let by_id: HashMap<&str, &Stock> = stocks.iter().map(|s| (s.id.as_str(), s)).collect();
    rank_margin(&by_id, repo.margin_on(date), clamp_limit(limit))
}

/// 区间统计
pub fn stock_statistics(
    repo: &dyn Repository,
    stock_code: &str,
    range: &DateRangeQuery,
) -> AppResult<StockStatistics> {
    validate_range(range)?;
    let stock = repo.get_stock(stock_code)?;

    let trading = repo.list_trading(&stock.id, range);
    let institutional = repo.list_institutional(&stock.id, range);
    let margin = repo.list_margin(&stock.id, range);

    let start = range
        .start_date
        .or_else(|| trading.first().map(|r| r.trade_date));
    let end = range.end_date.or_else(|| trading.last().map(|r| r.trade_date));
    let period = format!(
        "{}~{}",
        start.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
        end.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    );

    let mut statistics = StockStatistics {
        stock_code: stock.stock_code,
        period,
        avg_volume: 0.0,
        avg_price: 0.0,
        highest_price: 0.0,
        lowest_price: 0.0,
        price_change: 0.0,
        price_change_percent: 0.0,
        total_institutional_net: saturating_total(institutional.iter().map(|r| r.total_net)),
        total_margin_change: saturating_total(margin.iter().map(|r| r.margin_change)),
        total_short_change: saturating_total(margin.iter().map(|r| r.short_change)),
    };

    if let (Some(first), Some(last)) = (trading.first(), trading.last()) {
        let count = trading.len() as f64;
        statistics.avg_volume = trading.iter().map(|r| r.trading_volume as f64).sum::<f64>() / count;
        statistics.avg_price = trading.iter().map(|r| r.closing_price).sum::<f64>() / count;
        statistics.highest_price = trading
            .iter()
            .map(|r| r.highest_price)
            .fold(f64::MIN, f64::max);
        statistics.lowest_price = trading
            .iter()
            .map(|r| r.lowest_price)
            .fold(f64::MAX, f64::min);
        statistics.price_change = last.closing_price - first.closing_price;
        if first.closing_price > 0.0 {
            statistics.price_change_percent = statistics.price_change / first.closing_price;
        }
    }

    Ok(statistics)
}

fn rank_institutional(
    by_id: &HashMap<&str, &Stock>,
    mut records: Vec<crate::models::InstitutionalInvestor>,
    limit: usize,
) -> Vec<InstitutionalRanking> {
    records.sort_by(|a, b| b.total_net.cmp(&a.total_net));
    records
        .into_iter()
        .filter_map(|institutional| {
            let stock = (*by_id.get(institutional.stock_id.as_str())?).clone();
            Some(InstitutionalRanking { stock, institutional })
        })
        .take(limit)
        .collect()
}

fn rank_margin(
    by_id: &HashMap<&str, &Stock>,
    mut records: Vec<crate::models::MarginTrading>,
    limit: usize,
) -> Vec<MarginRanking> {
    records.sort_by(|a, b| b.margin_change.cmp(&a.margin_change));
    records
        .into_iter()
        .filter_map(|margin| {
            let stock = (*by_id.get(margin.stock_id.as_str())?).clone();
            Some(MarginRanking { stock, margin })
        })
        .take(limit)
        .collect()
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_RANKING_LIMIT)
        .clamp(1, MAX_RANKING_LIMIT)
}

/// 累加时在 i64 边界处截断
fn saturating_total(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0i64, i64::saturating_add)
}

/// 由大到小比较可选浮点数
fn desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
