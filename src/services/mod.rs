//! 业务逻辑服务模块
//!
//! 封装请求校验、数据存取和汇总逻辑

pub mod market_data_service; // 每日交易/法人/融资融券
pub mod stock_service; // 股票管理
pub mod store; // 存储层
pub mod summary_service; // 综合查询与统计
pub mod validation;

use std::sync::Arc;

use self::store::Repository;

/// 处理器共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }
}
