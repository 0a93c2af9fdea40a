//! 台股资料后端服务
//!
//! 启动 HTTP 服务器，默认监听 0.0.0.0:3000

use actix_web::HttpServer;
use env_logger::Env;
use std::io;
use std::sync::Arc;

use twstock_backend::config::AppConfig;
use twstock_backend::handlers;
use twstock_backend::services::store::{JsonFileStore, MemoryStore, Repository};
use twstock_backend::services::AppState;

/// 应用程序入口
#[actix_web::main]
async fn main() -> io::Result<()> {
    // 载入 .env，文件不存在时忽略
    dotenv::dotenv().ok();

    // 初始化日志系统，默认日志级别为 info
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load();
    let repo = open_store(&config)?;
    let state = AppState::new(repo);

    log::info!("启动台股资料后端服务");
    log::info!("运行环境: {}", config.environment.as_str());
    log::info!("CORS 允许来源: {}", config.cors.allowed_origin);
    log::info!("API: http://{}/api/v1", config.bind_addr());

    let app_config = config.clone();
    let mut server = HttpServer::new(move || handlers::build_app(state.clone(), &app_config));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(config.bind_addr())?.run().await
}

/// 依配置选择存储实现
fn open_store(config: &AppConfig) -> io::Result<Arc<dyn Repository>> {
    match &config.store.data_file {
        Some(path) => {
            let store = JsonFileStore::open(path, config.store.seed_demo_data)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{:#}", e)))?;
            log::info!("使用 JSON 文件存储: {}", store.path().display());
            Ok(Arc::new(store))
        }
        None => {
            log::info!("使用内存存储");
            if config.store.seed_demo_data {
                Ok(Arc::new(MemoryStore::with_demo_data()))
            } else {
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}
