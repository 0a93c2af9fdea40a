//! 台股资料 API 客户端
//!
//! ## 功能
//! - 股票管理：清单、搜索、新增、更新、删除
//! - 每日资料：交易、三大法人、融资融券的查询与新增
//! - 综合查询：完整资料、仪表板摘要、排行与区间统计

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::env;
use std::time::Duration;
use url::Url;

use super::{ClientError, ClientResult, UNKNOWN_ERROR_MESSAGE};
use crate::handlers::health::HealthStatus;
use crate::models::{
    ApiErrorResponse, ApiResponse, CreateStockRequest, DailyTradingData, DashboardSummary,
    DateQuery, DateRangeQuery, InstitutionalInput, InstitutionalInvestor, InstitutionalRanking,
    MarginInput, MarginRanking, MarginTrading, RankingQuery, Stock, StockCompleteData, StockQuery,
    StockStatistics, TradingDataInput, UpdateStockRequest,
};

/// 默认 API 位址
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";
/// 请求超时
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// 搜索时返回的笔数
const SEARCH_PAGE_SIZE: u32 = 10;

/// 台股资料 API 客户端
pub struct StockApiClient {
    /// HTTP 客户端
    client: Client,
    /// API 根位址，如 http://localhost:3000/api/v1
    base_url: Url,
}

impl StockApiClient {
    /// 创建指向 `base_url` 的客户端
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self { client, base_url })
    }

    /// 从环境变量 API_BASE_URL（或 VITE_API_BASE_URL）读取位址
    pub fn from_env() -> ClientResult<Self> {
        let base_url = env::var("API_BASE_URL")
            .or_else(|_| env::var("VITE_API_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn health(&self) -> ClientResult<HealthStatus> {
        self.get(&["health"]).await
    }

    // ==================== 股票管理 ====================

    /// 取得股票清单，返回完整信封以便读取分页信息
    pub async fn list_stocks(&self, query: &StockQuery) -> ClientResult<ApiResponse<Vec<Stock>>> {
        let request = self.client.get(self.endpoint(&["stocks"])?).query(query);
        self.send(request).await
    }

    /// 按代码或名称搜索股票
    pub async fn search_stocks(&self, keyword: &str) -> ClientResult<Vec<Stock>> {
        let query = StockQuery {
            search: Some(keyword.to_string()),
            page_size: Some(SEARCH_PAGE_SIZE),
            ..Default::default()
        };
        Ok(self.list_stocks(&query).await?.data)
    }

    pub async fn get_stock(&self, stock_code: &str) -> ClientResult<Stock> {
        self.get(&["stocks", stock_code]).await
    }

    pub async fn create_stock(&self, request: &CreateStockRequest) -> ClientResult<Stock> {
        let request = self.client.post(self.endpoint(&["stocks"])?).json(request);
        Ok(self.send(request).await?.data)
    }

    pub async fn update_stock(
        &self,
        stock_code: &str,
        request: &UpdateStockRequest,
    ) -> ClientResult<Stock> {
        let request = self
            .client
            .put(self.endpoint(&["stocks", stock_code])?)
            .json(request);
        Ok(self.send(request).await?.data)
    }

    pub async fn delete_stock(&self, stock_code: &str) -> ClientResult<()> {
        let request = self.client.delete(self.endpoint(&["stocks", stock_code])?);
        let response = self.dispatch(request).await?;
        Self::check_status(response).await.map(|_| ())
    }

    // ==================== 每日交易资料 ====================

    pub async fn get_trading_data(
        &self,
        stock_code: &str,
        range: &DateRangeQuery,
    ) -> ClientResult<Vec<DailyTradingData>> {
        self.get_with(&["stocks", stock_code, "trading"], range).await
    }

    pub async fn create_trading_data(
        &self,
        stock_code: &str,
        input: &TradingDataInput,
    ) -> ClientResult<DailyTradingData> {
        self.post(&["stocks", stock_code, "trading"], input).await
    }

    pub async fn get_trading_data_by_date(&self, date: NaiveDate) -> ClientResult<Vec<DailyTradingData>> {
        self.get(&["trading", "date", date.to_string().as_str()]).await
    }

    // ==================== 三大法人 ====================

    pub async fn get_institutional_data(
        &self,
        stock_code: &str,
        range: &DateRangeQuery,
    ) -> ClientResult<Vec<InstitutionalInvestor>> {
        self.get_with(&["stocks", stock_code, "institutional"], range).await
    }

    pub async fn create_institutional_data(
        &self,
        stock_code: &str,
        input: &InstitutionalInput,
    ) -> ClientResult<InstitutionalInvestor> {
        self.post(&["stocks", stock_code, "institutional"], input).await
    }

    pub async fn get_institutional_data_by_date(
        &self,
        date: NaiveDate,
    ) -> ClientResult<Vec<InstitutionalInvestor>> {
        self.get(&["institutional", "date", date.to_string().as_str()]).await
    }

    pub async fn get_institutional_summary(
        &self,
        query: &RankingQuery,
    ) -> ClientResult<Vec<InstitutionalRanking>> {
        self.get_with(&["institutional", "summary"], query).await
    }

    // ==================== 融资融券 ====================

    pub async fn get_margin_data(
        &self,
        stock_code: &str,
        range: &DateRangeQuery,
    ) -> ClientResult<Vec<MarginTrading>> {
        self.get_with(&["stocks", stock_code, "margin"], range).await
    }

    pub async fn create_margin_data(
        &self,
        stock_code: &str,
        input: &MarginInput,
    ) -> ClientResult<MarginTrading> {
        self.post(&["stocks", stock_code, "margin"], input).await
    }

    pub async fn get_margin_data_by_date(&self, date: NaiveDate) -> ClientResult<Vec<MarginTrading>> {
        self.get(&["margin", "date", date.to_string().as_str()]).await
    }

    pub async fn get_margin_summary(&self, query: &RankingQuery) -> ClientResult<Vec<MarginRanking>> {
        self.get_with(&["margin", "summary"], query).await
    }

    // ==================== 综合查询 ====================

    pub async fn get_stock_complete_data(
        &self,
        stock_code: &str,
        date: Option<NaiveDate>,
    ) -> ClientResult<StockCompleteData> {
        self.get_with(&["stocks", stock_code, "complete"], &DateQuery { date })
            .await
    }

    pub async fn get_dashboard_summary(&self, date: Option<NaiveDate>) -> ClientResult<DashboardSummary> {
        self.get_with(&["dashboard", "summary"], &DateQuery { date }).await
    }

    pub async fn get_stock_statistics(
        &self,
        stock_code: &str,
        range: &DateRangeQuery,
    ) -> ClientResult<StockStatistics> {
        self.get_with(&["stocks", stock_code, "statistics"], range).await
    }

    // ==================== 内部请求工具 ====================

    /// 在根位址后追加路径段，段内特殊字符会被编码
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let request = self.client.get(self.endpoint(segments)?);
        Ok(self.send(request).await?.data)
    }

    async fn get_with<T, Q>(&self, segments: &[&str], query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let request = self.client.get(self.endpoint(segments)?).query(query);
        Ok(self.send(request).await?.data)
    }

    async fn post<T, B>(&self, segments: &[&str], body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let request = self.client.post(self.endpoint(segments)?).json(body);
        Ok(self.send(request).await?.data)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<ApiResponse<T>> {
        let response = self.dispatch(request).await?;
        let bytes = Self::check_status(response).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            log::error!("解析 API 回應失败: {}", e);
            ClientError::Decode(e.to_string())
        })
    }

    async fn dispatch(&self, request: RequestBuilder) -> ClientResult<Response> {
        request.send().await.map_err(|e| {
            log::error!("未收到 API 回應: {}", e);
            ClientError::Transport(e)
        })
    }

    /// 读取响应体；非 2xx 状态转换为 `ClientError::Api`
    async fn check_status(response: Response) -> ClientResult<Vec<u8>> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(ClientError::Transport)?;
        if status.is_success() {
            return Ok(bytes.to_vec());
        }
        Err(api_error(status, &bytes))
    }
}

/// 将错误响应转换为 `ClientError::Api`，非标准响应体时用状态码说明代替
fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
    let error = match serde_json::from_slice::<ApiErrorResponse>(body) {
        Ok(envelope) => ClientError::Api {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
            details: envelope.error.details.unwrap_or_default(),
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            code: format!("HTTP_{}", status.as_u16()),
            message: status
                .canonical_reason()
                .unwrap_or(UNKNOWN_ERROR_MESSAGE)
                .to_string(),
            details: Vec::new(),
        },
    };

    match status {
        StatusCode::UNAUTHORIZED => log::warn!("API 未授权: {}", error),
        StatusCode::FORBIDDEN => log::warn!("API 禁止存取: {}", error),
        StatusCode::NOT_FOUND => log::warn!("API 资源不存在: {}", error),
        s if s.is_server_error() => log::error!("API 服务器错误 {}: {}", s.as_u16(), error),
        s => log::warn!("API 错误 {}: {}", s.as_u16(), error),
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::handlers::build_app;
    use crate::services::market_data_service::tests::{institutional_input, margin_input, trading_input};
    use crate::services::store::MemoryStore;
    use crate::services::AppState;
    use actix_web::{dev::ServerHandle, HttpServer};
    use std::sync::Arc;

    /// 在随机端口启动一个带示例数据的服务器
    fn spawn_server() -> (StockApiClient, ServerHandle) {
        let state = AppState::new(Arc::new(MemoryStore::with_demo_data()));
        let config = AppConfig::default();
        let server = HttpServer::new(move || build_app(state.clone(), &config))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let client = StockApiClient::new(&format!("http://{}/api/v1", addr)).unwrap();
        (client, handle)
    }

    #[actix_web::test]
    async fn test_stock_crud() {
        println!("\n========== 测试股票增删改查 ==========");
        let (client, handle) = spawn_server();

        assert_eq!(client.health().await.unwrap().status, "ok");

        let created = client
            .create_stock(&CreateStockRequest {
                stock_code: Some("9999".to_string()),
                stock_name: Some("Test Co".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        println!("  新增: {} {}", created.stock_code, created.stock_name);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(client.get_stock("9999").await.unwrap(), created);

        let updated = client
            .update_stock(
                "9999",
                &UpdateStockRequest {
                    stock_name: Some("Renamed Co".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.stock_name, "Renamed Co");
        assert_eq!(updated.created_at, created.created_at);

        let page = client
            .list_stocks(&StockQuery {
                page_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        let meta = page.meta.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(meta.total_count, Some(6));
        assert_eq!(meta.total_pages, Some(3));

        let found = client.search_stocks("renamed").await.unwrap();
        assert_eq!(found.len(), 1);

        client.delete_stock("9999").await.unwrap();
        let err = client.get_stock("9999").await.unwrap_err();
        println!("  删除后查询: {}", err.error_message());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.code(), Some("NOT_FOUND"));
        assert_eq!(err.error_message(), "Stock 9999 not found");

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_validation_error_details() {
        let (client, handle) = spawn_server();

        let err = client
            .create_stock(&CreateStockRequest {
                stock_code: Some("8888".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        match &err {
            ClientError::Api { status, code, details, .. } => {
                assert_eq!(*status, 400);
                assert_eq!(code, "VALIDATION_ERROR");
                assert!(details.iter().any(|d| d.field == "stockName"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_market_data_and_summaries() {
        println!("\n========== 测试每日资料与综合查询 ==========");
        let (client, handle) = spawn_server();
        let day = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();

        let trading = client
            .create_trading_data("2330", &trading_input("2026-02-03", 1000.0, 1010.0, 1015.0, 995.0))
            .await
            .unwrap();
        assert_eq!(trading.trade_date, day);
        client
            .create_institutional_data("2330", &institutional_input("2026-02-03", (5_000, 1_000), (0, 0), (0, 0)))
            .await
            .unwrap();
        client
            .create_margin_data("2330", &margin_input("2026-02-03", 300, -20))
            .await
            .unwrap();

        let duplicate = client
            .create_trading_data("2330", &trading_input("2026-02-03", 1000.0, 1010.0, 1015.0, 995.0))
            .await
            .unwrap_err();
        assert_eq!(duplicate.status(), Some(409));

        let range = DateRangeQuery {
            start_date: Some(day),
            end_date: Some(day),
        };
        assert_eq!(client.get_trading_data("2330", &range).await.unwrap(), vec![trading]);
        assert_eq!(client.get_institutional_data("2330", &range).await.unwrap()[0].total_net, 4_000);
        assert_eq!(client.get_margin_data("2330", &range).await.unwrap()[0].margin_change, 300);
        assert_eq!(client.get_trading_data_by_date(day).await.unwrap().len(), 1);
        assert_eq!(client.get_institutional_data_by_date(day).await.unwrap().len(), 1);
        assert_eq!(client.get_margin_data_by_date(day).await.unwrap().len(), 1);

        let complete = client.get_stock_complete_data("2330", Some(day)).await.unwrap();
        assert!(complete.trading_data.is_some() && complete.institutional.is_some() && complete.margin.is_some());

        let summary = client.get_dashboard_summary(None).await.unwrap();
        println!("  仪表板交易日: {:?}", summary.trade_date);
        assert_eq!(summary.trade_date, Some(day));
        assert_eq!(summary.institutional_top[0].net_buying, 4_000);

        let ranking = client.get_institutional_summary(&RankingQuery::default()).await.unwrap();
        assert_eq!(ranking[0].stock.stock_code, "2330");
        let margin = client
            .get_margin_summary(&RankingQuery {
                date: Some(day),
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(margin.len(), 1);

        let statistics = client.get_stock_statistics("2330", &range).await.unwrap();
        assert_eq!(statistics.avg_price, 1010.0);
        assert_eq!(statistics.total_short_change, -20);

        handle.stop(true).await;
    }

    #[tokio::test]
    async fn test_transport_error() {
        let client = StockApiClient::new("http://127.0.0.1:1/api/v1").unwrap();
        let err = client.get_stock("2330").await.unwrap_err();
        println!("  连线失败: {}", err.error_message());
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_base_url() {
        assert!(matches!(StockApiClient::new("not a url"), Err(ClientError::InvalidBaseUrl(_))));
        assert!(matches!(StockApiClient::new("mailto:ops@example.com"), Err(ClientError::InvalidBaseUrl(_))));

        let client = StockApiClient::new("http://localhost:3000/api/v1/").unwrap();
        let url = client.endpoint(&["stocks", "00631L"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/v1/stocks/00631L");

        let url = client.endpoint(&["stocks", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/v1/stocks/a%2Fb");
    }

    #[test]
    fn test_error_message_fallback() {
        let err = ClientError::Api {
            status: 500,
            code: "INTERNAL_ERROR".to_string(),
            message: "  ".to_string(),
            details: Vec::new(),
        };
        assert_eq!(err.error_message(), UNKNOWN_ERROR_MESSAGE);

        let err = api_error(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.code(), Some("HTTP_502"));
        assert_eq!(err.error_message(), "Bad Gateway");
    }
}
