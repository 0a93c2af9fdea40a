//! 工具函数模块

pub mod formatters; // 前端显示用格式化

pub use formatters::*;
