//! 中间件

mod error_guard;

pub use error_guard::{ErrorGuard, GENERIC_ERROR_MESSAGE};
