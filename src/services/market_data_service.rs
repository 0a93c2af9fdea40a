//! 每日市场数据服务
//!
//! 交易资料、三大法人、融资融券的查询与新增。
//! 新增时校验：
//! - tradeDate 为 YYYY-MM-DD
//! - 价格与金额非负，且 最低价 <= 开盘价、收盘价 <= 最高价
//! - 法人买卖超 = 买进 - 卖出，合计 = 三者之和
//! - 同一股票同一交易日只能有一笔（由存储层在写锁内检查）

use chrono::{NaiveDate, Utc};

use crate::error::{AppError, AppResult};
use crate::models::{
    DailyTradingData, DateRangeQuery, FieldError, InstitutionalInput, InstitutionalInvestor,
    MarginInput, MarginTrading, TradingDataInput,
};
use crate::services::store::Repository;
use crate::services::validation::Validator;

/// 校验日期区间
pub fn validate_range(range: &DateRangeQuery) -> AppResult<()> {
    if let (Some(start), Some(end)) = (range.start_date, range.end_date) {
        if start > end {
            return Err(AppError::Validation {
                message: "startDate must not be after endDate".to_string(),
                details: vec![FieldError::new("startDate", "must not be after endDate")],
            });
        }
    }
    Ok(())
}

// ==================== 每日交易资料 ====================

pub fn list_trading(
    repo: &dyn Repository,
    stock_code: &str,
    range: &DateRangeQuery,
) -> AppResult<Vec<DailyTradingData>> {
    validate_range(range)?;
    let stock = repo.get_stock(stock_code)?;
    Ok(repo.list_trading(&stock.id, range))
}

pub fn trading_on(repo: &dyn Repository, date: NaiveDate) -> Vec<DailyTradingData> {
    repo.trading_on(date)
}

pub fn create_trading(
    repo: &dyn Repository,
    stock_code: &str,
    input: TradingDataInput,
) -> AppResult<DailyTradingData> {
    let stock = repo.get_stock(stock_code)?;

    let mut validator = Validator::new();
    let trade_date = validator.trade_date(&input.trade_date);
    validator.non_negative("openingPrice", input.opening_price);
    validator.non_negative("closingPrice", input.closing_price);
    validator.non_negative("highestPrice", input.highest_price);
    validator.non_negative("lowestPrice", input.lowest_price);
    validator.non_negative("tradingValue", input.trading_value);

    if validator.is_valid() {
        let low = input.lowest_price;
        let high = input.highest_price;
        validator.check(low <= high, "lowestPrice", "must not exceed highestPrice");
        validator.check(
            (low..=high).contains(&input.opening_price),
            "openingPrice",
            "must be between lowestPrice and highestPrice",
        );
        validator.check(
            (low..=high).contains(&input.closing_price),
            "closingPrice",
            "must be between lowestPrice and highestPrice",
        );
    }
    if let Some(change) = input.change {
        validator.check(change.is_finite(), "change", "must be a finite number");
    }
    if let Some(percent) = input.change_percent {
        validator.check(percent.is_finite(), "changePercent", "must be a finite number");
    }
    validator.finish("Invalid trading data")?;

    let Some(trade_date) = trade_date else {
        return Err(AppError::validation("Invalid trading data"));
    };

    let record = repo.insert_trading(DailyTradingData {
        id: String::new(),
        stock_id: stock.id,
        trade_date,
        opening_price: input.opening_price,
        closing_price: input.closing_price,
        highest_price: input.highest_price,
        lowest_price: input.lowest_price,
        trading_volume: input.trading_volume,
        trading_value: input.trading_value,
        transaction_count: input.transaction_count,
        change: input.change,
        change_percent: input.change_percent,
        created_at: Utc::now(),
    })?;

    log::info!("新增 {} {} 交易资料", stock_code, record.trade_date);
    Ok(record)
}

// ==================== 三大法人资料 ====================

pub fn list_institutional(
    repo: &dyn Repository,
    stock_code: &str,
    range: &DateRangeQuery,
) -> AppResult<Vec<InstitutionalInvestor>> {
    validate_range(range)?;
    let stock = repo.get_stock(stock_code)?;
    Ok(repo.list_institutional(&stock.id, range))
}

pub fn institutional_on(repo: &dyn Repository, date: NaiveDate) -> Vec<InstitutionalInvestor> {
    repo.institutional_on(date)
}

/// 计算或核对单一法人的买卖超
fn resolve_net(
    validator: &mut Validator,
    field: &str,
    buy: u64,
    sell: u64,
    provided: Option<i64>,
) -> i64 {
    let expected = i128::from(buy) - i128::from(sell);
    let Ok(expected) = i64::try_from(expected) else {
        validator.check(false, field, "is out of range");
        return 0;
    };
    if let Some(net) = provided {
        validator.check(net == expected, field, "must equal buy minus sell");
    }
    expected
}

pub fn create_institutional(
    repo: &dyn Repository,
    stock_code: &str,
    input: InstitutionalInput,
) -> AppResult<InstitutionalInvestor> {
    let stock = repo.get_stock(stock_code)?;

    let mut validator = Validator::new();
    let trade_date = validator.trade_date(&input.trade_date);
    let foreign_net = resolve_net(
        &mut validator,
        "foreignNet",
        input.foreign_buy,
        input.foreign_sell,
        input.foreign_net,
    );
    let investment_trust_net = resolve_net(
        &mut validator,
        "investmentTrustNet",
        input.investment_trust_buy,
        input.investment_trust_sell,
        input.investment_trust_net,
    );
    let dealer_net = resolve_net(
        &mut validator,
        "dealerNet",
        input.dealer_buy,
        input.dealer_sell,
        input.dealer_net,
    );

    let total_net = foreign_net
        .checked_add(investment_trust_net)
        .and_then(|sum| sum.checked_add(dealer_net));
    validator.check(total_net.is_some(), "totalNet", "is out of range");
    let total_net = total_net.unwrap_or_default();
    if let Some(provided) = input.total_net {
        validator.check(
            provided == total_net,
            "totalNet",
            "must equal foreignNet + investmentTrustNet + dealerNet",
        );
    }
    validator.finish("Invalid institutional data")?;

    let Some(trade_date) = trade_date else {
        return Err(AppError::validation("Invalid institutional data"));
    };

    let record = repo.insert_institutional(InstitutionalInvestor {
        id: String::new(),
        stock_id: stock.id,
        trade_date,
        foreign_buy: input.foreign_buy,
        foreign_sell: input.foreign_sell,
        foreign_net,
        investment_trust_buy: input.investment_trust_buy,
        investment_trust_sell: input.investment_trust_sell,
        investment_trust_net,
        dealer_buy: input.dealer_buy,
        dealer_sell: input.dealer_sell,
        dealer_net,
        total_net,
        created_at: Utc::now(),
    })?;

    log::info!("新增 {} {} 法人资料", stock_code, record.trade_date);
    Ok(record)
}

// ==================== 融资融券资料 ====================

pub fn list_margin(
    repo: &dyn Repository,
    stock_code: &str,
    range: &DateRangeQuery,
) -> AppResult<Vec<MarginTrading>> {
    validate_range(range)?;
    let stock = repo.get_stock(stock_code)?;
    Ok(repo.list_margin(&stock.id, range))
}

pub fn margin_on(repo: &dyn Repository, date: NaiveDate) -> Vec<MarginTrading> {
    repo.margin_on(date)
}

pub fn create_margin(
    repo: &dyn Repository,
    stock_code: &str,
    input: MarginInput,
) -> AppResult<MarginTrading> {
    let stock = repo.get_stock(stock_code)?;

    // 计数字段为无符号整数，非负由反序列化保证
    let mut validator = Validator::new();
    let trade_date = validator.trade_date(&input.trade_date);
    validator.finish("Invalid margin data")?;

    let Some(trade_date) = trade_date else {
        return Err(AppError::validation("Invalid margin data"));
    };

    let record = repo.insert_margin(MarginTrading {
        id: String::new(),
        stock_id: stock.id,
        trade_date,
        margin_buy: input.margin_buy,
        margin_sell: input.margin_sell,
        margin_balance: input.margin_balance,
        margin_change: input.margin_change,
        short_sell: input.short_sell,
        short_cover: input.short_cover,
        short_balance: input.short_balance,
        short_change: input.short_change,
        margin_quota: input.margin_quota,
        short_quota: input.short_quota,
        created_at: Utc::now(),
    })?;

    log::info!("新增 {} {} 融资融券资料", stock_code, record.trade_date);
    Ok(record)
}
