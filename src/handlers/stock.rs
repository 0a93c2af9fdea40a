//! 股票接口处理器
//!
//! ## API 列表
//! - GET /stocks - 取得股票清单（search, page, pageSize, industry, marketType, sortBy, sortOrder）
//! - POST /stocks - 新增股票
//! - GET /stocks/{stock_code} - 取得特定股票
//! - PUT /stocks/{stock_code} - 更新股票资讯
//! - DELETE /stocks/{stock_code} - 删除股票
//! - GET /stocks/{stock_code}/complete - 股票完整资料
//! - GET /stocks/{stock_code}/statistics - 区间统计

use actix_web::{web, HttpResponse};

use super::not_found;
use crate::error::AppError;
use crate::models::{
    ApiResponse, CreateStockRequest, DateQuery, DateRangeQuery, StockQuery, UpdateStockRequest,
};
use crate::services::{stock_service, summary_service, AppState};

pub async fn list_stocks(
    state: web::Data<AppState>,
    query: web::Query<StockQuery>,
) -> Result<HttpResponse, AppError> {
    let page = stock_service::list_stocks(state.repo.as_ref(), &query);
    Ok(HttpResponse::Ok().json(ApiResponse::paged(page)))
}

pub async fn get_stock(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let stock = stock_service::get_stock(state.repo.as_ref(), &path)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stock)))
}

pub async fn create_stock(
    state: web::Data<AppState>,
    body: web::Json<CreateStockRequest>,
) -> Result<HttpResponse, AppError> {
    let stock = stock_service::create_stock(state.repo.as_ref(), body.into_inner())?;
    Ok(HttpResponse::Created().json(ApiResponse::success(stock)))
}

pub async fn update_stock(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateStockRequest>,
) -> Result<HttpResponse, AppError> {
    let stock = stock_service::update_stock(state.repo.as_ref(), &path, body.into_inner())?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stock)))
}

pub async fn delete_stock(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    stock_service::delete_stock(state.repo.as_ref(), &path)?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_complete_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse, AppError> {
    let data = summary_service::get_complete_data(state.repo.as_ref(), &path, query.date)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

pub async fn get_statistics(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, AppError> {
    let statistics = summary_service::stock_statistics(state.repo.as_ref(), &path, &query)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(statistics)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/stocks")
            .route(web::get().to(list_stocks))
            .route(web::post().to(create_stock))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/stocks/{stock_code}")
            .route(web::get().to(get_stock))
            .route(web::put().to(update_stock))
            .route(web::delete().to(delete_stock))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/stocks/{stock_code}/complete")
            .route(web::get().to(get_complete_data))
            .default_service(web::to(not_found)),
    )
    .service(
        web::resource("/stocks/{stock_code}/statistics")
            .route(web::get().to(get_statistics))
            .default_service(web::to(not_found)),
    );
}
