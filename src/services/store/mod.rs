//! 数据存储层
//!
//! `Repository` 是处理器唯一依赖的存储接口，提供两种实现：
//! - `MemoryStore`：纯内存存储
//! - `JsonFileStore`：每次写入后将完整快照保存为 JSON 文件
//!
//! 两者共享 `StoreState` 上的业务操作，区别只在于状态如何加锁与落盘。
//! 每个写操作在同一把写锁内完成"检查 + 写入"，保证股票代码唯一、
//! 每日记录按 (股票, 交易日) 唯一。

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};
use crate::models::{
    DailyRecord, DailyTradingData, DateRangeQuery, InstitutionalInvestor, MarginTrading,
    MarketType, NewStock, Page, Stock, StockChanges, StockFilter,
};

/// 存储接口
pub trait Repository: Send + Sync {
    // ==================== 股票 ====================

    /// 按过滤条件分页列出股票
    fn list_stocks(&self, filter: &StockFilter, page: u32, page_size: u32) -> Page<Stock>;
    /// 全部股票（插入顺序）
    fn all_stocks(&self) -> Vec<Stock>;
    fn get_stock(&self, stock_code: &str) -> AppResult<Stock>;
    fn create_stock(&self, new_stock: NewStock) -> AppResult<Stock>;
    fn update_stock(&self, stock_code: &str, changes: StockChanges) -> AppResult<Stock>;
    /// 删除股票并级联删除其所有每日记录
    fn delete_stock(&self, stock_code: &str) -> AppResult<()>;

    // ==================== 每日记录 ====================

    fn list_trading(&self, stock_id: &str, range: &DateRangeQuery) -> Vec<DailyTradingData>;
    fn trading_on(&self, date: NaiveDate) -> Vec<DailyTradingData>;
    /// 写入交易资料；未提供涨跌与涨跌幅时依前一笔收盘价推导，
    /// 并重算下一交易日的推导值
    fn insert_trading(&self, record: DailyTradingData) -> AppResult<DailyTradingData>;

    fn list_institutional(&self, stock_id: &str, range: &DateRangeQuery) -> Vec<InstitutionalInvestor>;
    fn institutional_on(&self, date: NaiveDate) -> Vec<InstitutionalInvestor>;
    fn insert_institutional(&self, record: InstitutionalInvestor) -> AppResult<InstitutionalInvestor>;

    fn list_margin(&self, stock_id: &str, range: &DateRangeQuery) -> Vec<MarginTrading>;
    fn margin_on(&self, date: NaiveDate) -> Vec<MarginTrading>;
    fn insert_margin(&self, record: MarginTrading) -> AppResult<MarginTrading>;

    /// 交易资料中最新的交易日
    fn latest_trade_date(&self) -> Option<NaiveDate>;
}

/// 状态后端：决定 `StoreState` 如何读取与提交
pub trait StateBackend: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R;
    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> AppResult<R>) -> AppResult<R>;
}

impl<B: StateBackend> Repository for B {
    fn list_stocks(&self, filter: &StockFilter, page: u32, page_size: u32) -> Page<Stock> {
        self.read(|state| {
            let mut matched: Vec<Stock> = state
                .stocks
                .iter()
                .filter(|stock| filter.matches(stock))
                .cloned()
                .collect();
            filter.sort(&mut matched);
            Page::slice(&matched, page, page_size)
        })
    }

    fn all_stocks(&self) -> Vec<Stock> {
        self.read(|state| state.stocks.clone())
    }

    fn get_stock(&self, stock_code: &str) -> AppResult<Stock> {
        self.read(|state| {
            state
                .find_stock(stock_code)
                .cloned()
                .ok_or_else(|| AppError::stock_not_found(stock_code))
        })
    }

    fn create_stock(&self, new_stock: NewStock) -> AppResult<Stock> {
        self.write(|state| state.create_stock(new_stock))
    }

    fn update_stock(&self, stock_code: &str, changes: StockChanges) -> AppResult<Stock> {
        self.write(|state| state.update_stock(stock_code, changes))
    }

    fn delete_stock(&self, stock_code: &str) -> AppResult<()> {
        self.write(|state| state.delete_stock(stock_code))
    }

    fn list_trading(&self, stock_id: &str, range: &DateRangeQuery) -> Vec<DailyTradingData> {
        self.read(|state| list_daily(&state.trading, stock_id, range))
    }

    fn trading_on(&self, date: NaiveDate) -> Vec<DailyTradingData> {
        self.read(|state| records_on(&state.trading, date))
    }

    fn insert_trading(&self, record: DailyTradingData) -> AppResult<DailyTradingData> {
        self.write(|state| state.insert_trading(record))
    }

    fn list_institutional(&self, stock_id: &str, range: &DateRangeQuery) -> Vec<InstitutionalInvestor> {
        self.read(|state| list_daily(&state.institutional, stock_id, range))
    }

    fn institutional_on(&self, date: NaiveDate) -> Vec<InstitutionalInvestor> {
        self.read(|state| records_on(&state.institutional, date))
    }

    fn insert_institutional(&self, record: InstitutionalInvestor) -> AppResult<InstitutionalInvestor> {
        self.write(|state| {
            state.ensure_unique(&state.institutional, &record)?;
            let id = state.allocate_id();
            Ok(push_daily(&mut state.institutional, id, record))
        })
    }

    fn list_margin(&self, stock_id: &str, range: &DateRangeQuery) -> Vec<MarginTrading> {
        self.read(|state| list_daily(&state.margin, stock_id, range))
    }

    fn margin_on(&self, date: NaiveDate) -> Vec<MarginTrading> {
        self.read(|state| records_on(&state.margin, date))
    }

    fn insert_margin(&self, record: MarginTrading) -> AppResult<MarginTrading> {
        self.write(|state| {
            state.ensure_unique(&state.margin, &record)?;
            let id = state.allocate_id();
            Ok(push_daily(&mut state.margin, id, record))
        })
    }

    fn latest_trade_date(&self) -> Option<NaiveDate> {
        self.read(|state| state.trading.iter().map(|r| r.trade_date).max())
    }
}

/// 存储的完整状态，也是 JSON 快照的格式
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    stocks: Vec<Stock>,
    #[serde(default)]
    trading: Vec<DailyTradingData>,
    #[serde(default)]
    institutional: Vec<InstitutionalInvestor>,
    #[serde(default)]
    margin: Vec<MarginTrading>,
    /// 涨跌由存储推导（而非请求提供）的交易资料 id
    #[serde(default)]
    derived_changes: BTreeSet<String>,
}

impl StoreState {
    /// 预置的示例股票
    pub fn demo() -> Self {
        let mut state = Self::default();
        let seeds = [
            ("2330", "台積電", "半導體"),
            ("2317", "鴻海", "電子"),
            ("2454", "聯發科", "半導體"),
            ("2881", "富邦金", "金融"),
            ("2882", "國泰金", "金融"),
        ];
        for (code, name, industry) in seeds {
            // 种子数据代码互不重复，不会冲突
            let _ = state.create_stock(NewStock {
                stock_code: code.to_string(),
                stock_name: name.to_string(),
                industry: Some(industry.to_string()),
                market_type: MarketType::Listed,
            });
        }
        state
    }

    pub fn stock_count(&self) -> usize {
        self.stocks.len()
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn find_stock(&self, stock_code: &str) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.stock_code == stock_code)
    }

    fn stock_code_of<'a>(&'a self, stock_id: &'a str) -> &'a str {
        self.stocks
            .iter()
            .find(|s| s.id == stock_id)
            .map(|s| s.stock_code.as_str())
            .unwrap_or(stock_id)
    }

    fn create_stock(&mut self, new_stock: NewStock) -> AppResult<Stock> {
        if self.find_stock(&new_stock.stock_code).is_some() {
            return Err(AppError::Conflict(format!(
                "Stock {} already exists",
                new_stock.stock_code
            )));
        }

        let now = Utc::now();
        let stock = Stock {
            id: self.allocate_id(),
            stock_code: new_stock.stock_code,
            stock_name: new_stock.stock_name,
            industry: new_stock.industry,
            market_type: Some(new_stock.market_type),
            created_at: now,
            updated_at: now,
        };
        self.stocks.push(stock.clone());
        Ok(stock)
    }

    fn update_stock(&mut self, stock_code: &str, changes: StockChanges) -> AppResult<Stock> {
        let stock = self
            .stocks
            .iter_mut()
            .find(|s| s.stock_code == stock_code)
            .ok_or_else(|| AppError::stock_not_found(stock_code))?;

        if let Some(name) = changes.stock_name {
            stock.stock_name = name;
        }
        if let Some(industry) = changes.industry {
            stock.industry = industry;
        }
        if let Some(market_type) = changes.market_type {
            stock.market_type = Some(market_type);
        }
        // 系统时钟回拨时也不让 updatedAt 倒退
        stock.updated_at = Utc::now().max(stock.updated_at);

        Ok(stock.clone())
    }

    fn delete_stock(&mut self, stock_code: &str) -> AppResult<()> {
        let index = self
            .stocks
            .iter()
            .position(|s| s.stock_code == stock_code)
            .ok_or_else(|| AppError::stock_not_found(stock_code))?;

        let removed = self.stocks.remove(index);
        self.trading.retain(|r| r.stock_id != removed.id);
        self.institutional.retain(|r| r.stock_id != removed.id);
        self.margin.retain(|r| r.stock_id != removed.id);
        let trading = &self.trading;
        self.derived_changes
            .retain(|id| trading.iter().any(|r| &r.id == id));

        log::info!("已删除股票 {} 及其每日记录", removed.stock_code);
        Ok(())
    }

    fn insert_trading(&mut self, mut record: DailyTradingData) -> AppResult<DailyTradingData> {
        self.ensure_unique(&self.trading, &record)?;

        let derived = record.change.is_none() && record.change_percent.is_none();
        if derived {
            if let Some(previous_close) = self.previous_close(&record.stock_id, record.trade_date) {
                apply_change(&mut record, previous_close);
            }
        }

        let id = self.allocate_id();
        let stored = push_daily(&mut self.trading, id, record);
        if derived {
            self.derived_changes.insert(stored.id.clone());
        }

        // 补登较早的交易日时，下一交易日的推导值改以本笔收盘价为基准
        let next = self
            .trading
            .iter_mut()
            .filter(|r| r.stock_id == stored.stock_id && r.trade_date > stored.trade_date)
            .min_by_key(|r| r.trade_date);
        if let Some(next) = next {
            if self.derived_changes.contains(&next.id) {
                apply_change(next, stored.closing_price);
            }
        }

        Ok(stored)
    }

    fn previous_close(&self, stock_id: &str, before: NaiveDate) -> Option<f64> {
        self.trading
            .iter()
            .filter(|r| r.stock_id == stock_id && r.trade_date < before)
            .max_by_key(|r| r.trade_date)
            .map(|r| r.closing_price)
    }

    fn ensure_unique<T: DailyRecord>(&self, table: &[T], record: &T) -> AppResult<()> {
        let exists = table
            .iter()
            .any(|r| r.stock_id() == record.stock_id() && r.trade_date() == record.trade_date());
        if exists {
            return Err(AppError::Conflict(format!(
                "{} for stock {} on {} already exists",
                T::KIND,
                self.stock_code_of(record.stock_id()),
                record.trade_date()
            )));
        }
        Ok(())
    }
}

// ==================== 每日记录通用操作 ====================

fn apply_change(record: &mut DailyTradingData, previous_close: f64) {
    let change = record.closing_price - previous_close;
    record.change = Some(change);
    record.change_percent = (previous_close > 0.0).then(|| change / previous_close);
}

fn push_daily<T: DailyRecord>(table: &mut Vec<T>, id: String, mut record: T) -> T {
    record.assign_identity(id, Utc::now());
    table.push(record.clone());
    record
}

/// 单只股票在日期区间内的记录，按交易日升序
fn list_daily<T: DailyRecord>(table: &[T], stock_id: &str, range: &DateRangeQuery) -> Vec<T> {
    let mut records: Vec<T> = table
        .iter()
        .filter(|r| r.stock_id() == stock_id && range.contains(r.trade_date()))
        .cloned()
        .collect();
    records.sort_by_key(|r| r.trade_date());
    records
}

fn records_on<T: DailyRecord>(table: &[T], date: NaiveDate) -> Vec<T> {
    table.iter().filter(|r| r.trade_date() == date).cloned().collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub fn trading(stock_id: &str, day: &str, close: f64) -> DailyTradingData {
        DailyTradingData {
            id: String::new(),
            stock_id: stock_id.to_string(),
            trade_date: date(day),
            opening_price: close,
            closing_price: close,
            highest_price: close + 5.0,
            lowest_price: close - 5.0,
            trading_volume: 1_000_000,
            trading_value: close * 1_000_000.0,
            transaction_count: 1_000,
            change: None,
            change_percent: None,
            created_at: Utc::now(),
        }
    }

    fn new_stock(code: &str) -> NewStock {
        NewStock {
            stock_code: code.to_string(),
            stock_name: format!("Test {}", code),
            industry: None,
            market_type: MarketType::Listed,
        }
    }

    #[test]
    fn test_demo_state() {
        let store = MemoryStore::from_state(StoreState::demo());
        let stocks = store.all_stocks();
        assert_eq!(stocks.len(), 5);
        assert_eq!(stocks[0].stock_code, "2330");
        assert_eq!(stocks[0].id, "1");
        assert_eq!(stocks[4].stock_code, "2882");
    }

    #[test]
    fn test_create_duplicate_is_conflict() {
        let store = MemoryStore::new();
        store.create_stock(new_stock("9999")).unwrap();
        let err = store.create_stock(new_stock("9999")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_update_keeps_created_at() {
        let store = MemoryStore::new();
        let created = store.create_stock(new_stock("9999")).unwrap();
        let updated = store
            .update_stock(
                "9999",
                StockChanges {
                    stock_name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.stock_name, "Renamed");
        assert_eq!(updated.id, created.id);
    }

    #[test]
    fn test_delete_cascades_daily_records() {
        let store = MemoryStore::new();
        let stock = store.create_stock(new_stock("9999")).unwrap();
        let other = store.create_stock(new_stock("8888")).unwrap();
        store.insert_trading(trading(&stock.id, "2026-02-02", 100.0)).unwrap();
        store.insert_trading(trading(&other.id, "2026-02-02", 50.0)).unwrap();

        store.delete_stock("9999").unwrap();

        assert!(matches!(store.get_stock("9999"), Err(AppError::NotFound(_))));
        assert!(store.list_trading(&stock.id, &DateRangeQuery::default()).is_empty());
        assert_eq!(store.trading_on(date("2026-02-02")).len(), 1);
    }

    #[test]
    fn test_insert_trading_unique_per_day() {
        let store = MemoryStore::new();
        let stock = store.create_stock(new_stock("9999")).unwrap();
        store.insert_trading(trading(&stock.id, "2026-02-02", 100.0)).unwrap();
        let err = store
            .insert_trading(trading(&stock.id, "2026-02-02", 101.0))
            .unwrap_err();
        match err {
            AppError::Conflict(message) => assert!(message.contains("9999")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_insert_trading_derives_change() {
        let store = MemoryStore::new();
        let stock = store.create_stock(new_stock("9999")).unwrap();
        let first = store.insert_trading(trading(&stock.id, "2026-02-02", 100.0)).unwrap();
        assert_eq!(first.change, None);

        let second = store.insert_trading(trading(&stock.id, "2026-02-03", 110.0)).unwrap();
        assert_eq!(second.change, Some(10.0));
        let percent = second.change_percent.unwrap();
        assert!((percent - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_backfilled_day_rederives_next_change() {
        let store = MemoryStore::new();
        let stock = store.create_stock(new_stock("9999")).unwrap();
        store.insert_trading(trading(&stock.id, "2026-02-02", 100.0)).unwrap();
        let third = store.insert_trading(trading(&stock.id, "2026-02-04", 120.0)).unwrap();
        assert_eq!(third.change, Some(20.0));

        store.insert_trading(trading(&stock.id, "2026-02-03", 110.0)).unwrap();
        let records = store.list_trading(&stock.id, &DateRangeQuery::default());
        assert_eq!(records[2].trade_date, date("2026-02-04"));
        assert_eq!(records[2].change, Some(10.0));
        assert!((records[2].change_percent.unwrap() - 10.0 / 110.0).abs() < 1e-9);

        // 首笔没有前值，补登更早一天后得到涨跌
        store.insert_trading(trading(&stock.id, "2026-02-01", 90.0)).unwrap();
        let records = store.list_trading(&stock.id, &DateRangeQuery::default());
        assert_eq!(records[1].trade_date, date("2026-02-02"));
        assert_eq!(records[1].change, Some(10.0));
    }

    #[test]
    fn test_backfill_keeps_supplied_change() {
        let store = MemoryStore::new();
        let stock = store.create_stock(new_stock("9999")).unwrap();
        let mut supplied = trading(&stock.id, "2026-02-04", 120.0);
        supplied.change = Some(5.0);
        supplied.change_percent = Some(0.05);
        store.insert_trading(supplied).unwrap();

        store.insert_trading(trading(&stock.id, "2026-02-03", 110.0)).unwrap();
        let records = store.list_trading(&stock.id, &DateRangeQuery::default());
        assert_eq!(records[1].change, Some(5.0));
        assert_eq!(records[1].change_percent, Some(0.05));
    }

    #[test]
    fn test_list_daily_sorted_and_ranged() {
        let store = MemoryStore::new();
        let stock = store.create_stock(new_stock("9999")).unwrap();
        for day in ["2026-02-05", "2026-02-02", "2026-02-04"] {
            store.insert_trading(trading(&stock.id, day, 100.0)).unwrap();
        }
        let range = DateRangeQuery {
            start_date: Some(date("2026-02-03")),
            end_date: None,
        };
        let records = store.list_trading(&stock.id, &range);
        let days: Vec<NaiveDate> = records.iter().map(|r| r.trade_date).collect();
        assert_eq!(days, vec![date("2026-02-04"), date("2026-02-05")]);
        assert_eq!(store.latest_trade_date(), Some(date("2026-02-05")));
    }
}
