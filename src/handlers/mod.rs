pub mod dashboard;
pub mod health;
pub mod market_data;
pub mod stock;

use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::{header, Method},
    middleware::Logger,
    web, App, Error, HttpRequest, HttpResponse,
};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::ErrorGuard;
use crate::services::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error));

    // 根路径健康检查供负载均衡探测
    health::config(cfg);

    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(stock::config)
            .configure(market_data::config)
            .configure(dashboard::config),
    );
}

/// 组装完整应用：路由、共享状态和中间件
pub fn build_app(
    state: AppState,
    settings: &AppConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .configure(config)
        .default_service(web::to(not_found))
        .wrap(ErrorGuard::new(!settings.environment.is_production()))
        .wrap(cors(&settings.cors.allowed_origin))
        .wrap(Logger::new("%r %s %Dms"))
}

/// 只允许配置的前端来源携带凭证跨域访问
fn cors(allowed_origin: &str) -> Cors {
    let cors = if allowed_origin == "*" {
        Cors::default().allow_any_origin()
    } else {
        Cors::default().allowed_origin(allowed_origin)
    };
    cors.allowed_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
    .supports_credentials()
    .max_age(86400)
}

/// 未匹配的路由
pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("Route not found".to_string()))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    AppError::validation(format!("Invalid request body: {}", err)).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    AppError::validation(format!("Invalid query parameters: {}", err)).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> Error {
    AppError::validation(format!("Invalid path parameters: {}", err)).into()
}
