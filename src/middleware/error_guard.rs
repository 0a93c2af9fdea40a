//! 兜底错误中间件
//!
//! 记录所有 500 响应背后的错误；生产环境下把错误信息替换为通用文字

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::models::ApiErrorResponse;

/// 生产环境对外显示的错误信息
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

pub struct ErrorGuard {
    expose_internal: bool,
}

impl ErrorGuard {
    /// `expose_internal` 为 false 时隐藏内部错误信息
    pub fn new(expose_internal: bool) -> Self {
        Self { expose_internal }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ErrorGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ErrorGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ErrorGuardService {
            service: Rc::new(service),
            expose_internal: self.expose_internal,
        })
    }
}

pub struct ErrorGuardService<S> {
    service: Rc<S>,
    expose_internal: bool,
}

impl<S, B> Service<ServiceRequest> for ErrorGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let expose_internal = self.expose_internal;

        Box::pin(async move {
            let res = service.call(req).await?;
            if res.status() != StatusCode::INTERNAL_SERVER_ERROR {
                return Ok(res.map_into_left_body());
            }

            let detail = res
                .response()
                .error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            log::error!(
                "{} {} 内部错误: {}",
                res.request().method(),
                res.request().path(),
                detail
            );

            if expose_internal {
                return Ok(res.map_into_left_body());
            }

            let (req, _) = res.into_parts();
            let response = HttpResponse::InternalServerError().json(ApiErrorResponse::new(
                "INTERNAL_ERROR",
                GENERIC_ERROR_MESSAGE,
                None,
            ));
            Ok(ServiceResponse::new(req, response).map_into_right_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use actix_web::{test, web, App};
    use serde_json::Value;

    async fn boom() -> Result<HttpResponse, AppError> {
        Err(AppError::Internal(anyhow::anyhow!("disk quota exceeded")))
    }

    #[actix_web::test]
    async fn test_redacts_internal_errors() {
        let app = test::init_service(
            App::new()
                .wrap(ErrorGuard::new(false))
                .route("/boom", web::get().to(boom)),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/boom").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], GENERIC_ERROR_MESSAGE);
    }

    #[actix_web::test]
    async fn test_exposes_internal_errors_outside_production() {
        let app = test::init_service(
            App::new()
                .wrap(ErrorGuard::new(true))
                .route("/boom", web::get().to(boom)),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/boom").to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "disk quota exceeded");
    }
}
