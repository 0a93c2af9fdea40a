//! 内存存储

use parking_lot::RwLock;

use super::{StateBackend, StoreState};
use crate::error::AppResult;

/// 纯内存存储，进程退出即丢失
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// 空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置示例股票的存储
    pub fn with_demo_data() -> Self {
        Self::from_state(StoreState::demo())
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

impl StateBackend for MemoryStore {
    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&*self.state.read())
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> AppResult<R>) -> AppResult<R> {
        f(&mut *self.state.write())
    }
}
