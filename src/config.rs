//! 配置模块
//!
//! 先从 JSON 文件加载，再由环境变量覆盖：
//! - HOST / PORT：监听地址
//! - FRONTEND_URL：CORS 允许的来源
//! - APP_ENV（或 NODE_ENV）：运行环境，production 时隐藏内部错误信息
//! - DATA_FILE：设置后改用 JSON 文件存储
//! - SEED_DEMO_DATA：是否预置示例股票

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 允许的前端来源
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON 数据文件路径（为空则使用内存存储）
    #[serde(default)]
    pub data_file: Option<String>,
    /// 是否预置示例股票
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
}

/// 运行环境
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// 存储配置
    #[serde(default)]
    pub store: StoreConfig,
    /// 运行环境
    #[serde(default)]
    pub environment: Environment,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_allowed_origin() -> String { "http://localhost:5173".to_string() }
fn default_seed_demo_data() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            seed_demo_data: default_seed_demo_data(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置：文件优先，失败则使用默认值，最后应用环境变量
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    fn load_file() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        Self::default()
    }

    /// 应用环境变量覆盖，`lookup` 便于测试时注入
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|v| !v.trim().is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => log::warn!("忽略无效的 PORT: {}", port),
            }
        }
        if let Some(origin) = lookup("FRONTEND_URL").filter(|v| !v.trim().is_empty()) {
            self.cors.allowed_origin = origin;
        }
        if let Some(mode) = lookup("APP_ENV").or_else(|| lookup("NODE_ENV")) {
            match Environment::parse(&mode) {
                Some(environment) => self.environment = environment,
                None => log::warn!("忽略未知的运行环境: {}", mode),
            }
        }
        if let Some(path) = lookup("DATA_FILE") {
            let path = path.trim().to_string();
            self.store.data_file = if path.is_empty() { None } else { Some(path) };
        }
        if let Some(seed) = lookup("SEED_DEMO_DATA") {
            self.store.seed_demo_data = matches!(seed.trim(), "1" | "true" | "yes");
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
