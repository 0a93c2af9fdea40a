//! 台股资料后端服务
//!
//! 提供股票基本资料、每日交易、三大法人与融资融券的 RESTful API，
//! 以及对应的类型化客户端和前端显示用格式化工具

pub mod client; // API 客户端
pub mod config; // 配置
pub mod error; // 错误类型
pub mod handlers; // HTTP 请求处理器
pub mod middleware; // 中间件
pub mod models; // 数据模型定义
pub mod services; // 业务逻辑服务
pub mod utils; // 格式化工具
