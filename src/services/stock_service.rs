//! 股票管理服务
//!
//! 校验请求参数后调用存储层

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateStockRequest, FieldError, NewStock, Page, Stock, StockChanges, StockFilter, StockQuery,
    UpdateStockRequest,
};
use crate::services::store::Repository;
use crate::services::validation::is_valid_stock_code;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 取得股票清单（搜索 + 筛选 + 分页）
pub fn list_stocks(repo: &dyn Repository, query: &StockQuery) -> Page<Stock> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let filter = StockFilter {
        search: non_blank(query.search.as_deref()),
        industry: non_blank(query.industry.as_deref()),
        market_type: query.market_type,
        sort_by: query.sort_by,
        sort_order: query.sort_order.unwrap_or_default(),
    };

    repo.list_stocks(&filter, page, page_size)
}

/// 取得特定股票
pub fn get_stock(repo: &dyn Repository, stock_code: &str) -> AppResult<Stock> {
    repo.get_stock(stock_code)
}

/// 新增股票
pub fn create_stock(repo: &dyn Repository, request: CreateStockRequest) -> AppResult<Stock> {
    let stock_code = non_blank(request.stock_code.as_deref());
    let stock_name = non_blank(request.stock_name.as_deref());

    let (stock_code, stock_name) = match (stock_code, stock_name) {
        (Some(code), Some(name)) => (code, name),
        (code, name) => {
            let mut details = Vec::new();
            if code.is_none() {
                details.push(FieldError::new("stockCode", "is required"));
            }
            if name.is_none() {
                details.push(FieldError::new("stockName", "is required"));
            }
            return Err(AppError::Validation {
                message: "Stock code and name are required".to_string(),
                details,
            });
        }
    };

    if !is_valid_stock_code(&stock_code) {
        return Err(AppError::Validation {
            message: format!("Invalid stock code: {}", stock_code),
            details: vec![FieldError::new(
                "stockCode",
                "must be 1-10 ASCII letters or digits",
            )],
        });
    }

    let stock = repo.create_stock(NewStock {
        stock_code,
        stock_name,
        industry: non_blank(request.industry.as_deref()),
        market_type: request.market_type.unwrap_or_default(),
    })?;

    log::info!("新增股票 {} {}", stock.stock_code, stock.stock_name);
    Ok(stock)
}

/// 更新股票资讯（只允许修改名称、产业别、市场别）
pub fn update_stock(
    repo: &dyn Repository,
    stock_code: &str,
    request: UpdateStockRequest,
) -> AppResult<Stock> {
    if let Some(code) = request.stock_code.as_deref() {
        if code.trim() != stock_code {
            return Err(AppError::Validation {
                message: "Stock code cannot be changed".to_string(),
                details: vec![FieldError::new("stockCode", "is immutable")],
            });
        }
    }

    let stock_name = match request.stock_name.as_deref() {
        Some(name) => match non_blank(Some(name)) {
            Some(name) => Some(name),
            None => {
                return Err(AppError::Validation {
                    message: "Stock name cannot be empty".to_string(),
                    details: vec![FieldError::new("stockName", "must not be blank")],
                })
            }
        },
        None => None,
    };

    let changes = StockChanges {
        stock_name,
        industry: request
            .industry
            .as_deref()
            .map(|industry| non_blank(Some(industry))),
        market_type: request.market_type,
    };

    repo.update_stock(stock_code, changes)
}

/// 删除股票（级联删除每日记录）
pub fn delete_stock(repo: &dyn Repository, stock_code: &str) -> AppResult<()> {
    repo.delete_stock(stock_code)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
