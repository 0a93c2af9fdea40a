use actix_web::{web, HttpResponse};

use super::not_found;
use crate::error::AppError;
use crate::models::{ApiResponse, DateQuery};
use crate::services::{summary_service, AppState};

/// 仪表板摘要
///
/// GET /api/v1/dashboard/summary?date=2026-02-03
pub async fn get_dashboard_summary(
    state: web::Data<AppState>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse, AppError> {
    let summary = summary_service::dashboard_summary(state.repo.as_ref(), query.date);
    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/dashboard/summary")
            .route(web::get().to(get_dashboard_summary))
            .default_service(web::to(not_found)),
    );
}
