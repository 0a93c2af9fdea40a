//! 每日市场数据接口处理器
//!
//! ## API 列表
//!
//! ### 每日交易资料
//! - GET /stocks/{stock_code}/trading?startDate=&endDate=
//! - POST /stocks/{stock_code}/trading
//! - GET /trading/date/{date}
//!
//! ### 三大法人
//! - GET /stocks/{stock_code}/institutional?startDate=&endDate=
//! - POST /stocks/{stock_code}/institutional
//! - GET /institutional/date/{date}
//! - GET /institutional/summary?date=&limit=
//!
//! ### 融资融券
//! - GET /stocks/{stock_code}/margin?startDate=&endDate=
//! - POST /stocks/{stock_code}/margin
//! - GET /margin/date/{date}
//! - GET /margin/summary?date=&limit=

use actix_web::{web, HttpResponse};

use super::not_found;
use crate::error::AppError;
use crate::models::{
    ApiResponse, DateRangeQuery, InstitutionalInput, MarginInput, RankingQuery, TradingDataInput,
};
use crate::services::validation::require_date;
use crate::services::{market_data_service, summary_service, AppState};

// ==================== 每日交易资料 ====================

pub async fn get_trading_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, AppError> {
    let records = market_data_service::list_trading(state.repo.as_ref(), &path, &query)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn create_trading_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<TradingDataInput>,
) -> Result<HttpResponse, AppError> {
    let record = market_data_service::create_trading(state.repo.as_ref(), &path, body.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::success(record)))
}

pub async fn get_trading_by_date(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let date = require_date("date", &path)?;
    let records = market_data_service::trading_on(state.repo.as_ref(), date);
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

// ==================== 三大法人资料 ====================

pub async fn get_institutional_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, AppError> {
    let records = market_data_service::list_institutional(state.repo.as_ref(), &path, &query)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn create_institutional_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<InstitutionalInput>,
) -> Result<HttpResponse, AppError> {
    let record =
        market_data_service::create_institutional(state.repo.as_ref(), &path, body.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::success(record)))
}

pub async fn get_institutional_by_date(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let date = require_date("date", &path)?;
    let records = market_data_service::institutional_on(state.repo.as_ref(), date);
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn get_institutional_summary(
    state: web::Data<AppState>,
    query: web::Query<RankingQuery>,
) -> Result<HttpResponse, AppError> {
    let ranking = summary_service::institutional_summary(state.repo.as_ref(), query.date, query.limit);
    Ok(HttpResponse::Ok().json(ApiResponse::success(ranking)))
}

// ==================== 融资融券资料 ====================

pub async fn get_margin_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, AppError> {
    let records = market_data_service::list_margin(state.repo.as_ref(), &path, &query)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn create_margin_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<MarginInput>,
) -> Result<HttpResponse, AppError> {
    let record = market_data_service::create_margin(state.repo.as_ref(), &path, body.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::success(record)))
}

pub async fn get_margin_by_date(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let date = require_date("date", &path)?;
    let records = market_data_service::margin_on(state.repo.as_ref(), date);
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn get_margin_summary(
    state: web::Data<AppState>,
    query: web::Query<RankingQuery>,
) -> Result<HttpResponse, AppError> {
    let ranking = summary_service::margin_summary(state.repo.as_ref(), query.date, query.limit);
    Ok(HttpResponse::Ok().json(ApiResponse::success(ranking)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/stocks/{stock_code}/trading")
            .route(web::get().to(get_trading_data))
            .route(web::post().to(create_trading_data))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/stocks/{stock_code}/institutional")
            .route(web::get().to(get_institutional_data))
            .route(web::post().to(create_institutional_data))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/stocks/{stock_code}/margin")
            .route(web::get().to(get_margin_data))
            .route(web::post().to(create_margin_data))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/trading/date/{date}")
            .route(web::get().to(get_trading_by_date))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/institutional/date/{date}")
            .route(web::get().to(get_institutional_by_date))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/institutional/summary")
            .route(web::get().to(get_institutional_summary))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/margin/date/{date}")
            .route(web::get().to(get_margin_by_date))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/margin/summary")
            .route(web::get().to(get_margin_summary))
            .default_service(web::to(not_found)),
    );
}
