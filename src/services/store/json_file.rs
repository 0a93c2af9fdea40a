//! JSON 文件存储
//!
//! 启动时载入快照，每次写操作成功后整体覆写快照文件。
//! 写入先落到临时文件再 rename，快照写失败时内存状态不变。

use anyhow::Context;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};

use super::{StateBackend, StoreState};
use crate::error::{AppError, AppResult};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl JsonFileStore {
    /// 打开快照文件；文件不存在时以空状态（或示例数据）新建
    pub fn open<P: AsRef<Path>>(path: P, seed_demo_data: bool) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("读取数据文件 {} 失败", path.display()))?;
            let state: StoreState = serde_json::from_str(&content)
                .with_context(|| format!("解析数据文件 {} 失败", path.display()))?;
            log::info!("从 {} 载入 {} 只股票", path.display(), state.stock_count());
            state
        } else {
            let state = if seed_demo_data {
                StoreState::demo()
            } else {
                StoreState::default()
            };
            write_snapshot(&path, &state)?;
            log::info!("新建数据文件 {}", path.display());
            state
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateBackend for JsonFileStore {
    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&*self.state.read())
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> AppResult<R>) -> AppResult<R> {
        let mut guard = self.state.write();
        let mut next = guard.clone();
        let output = f(&mut next)?;
        write_snapshot(&self.path, &next).map_err(AppError::Internal)?;
        *guard = next;
        Ok(output)
    }
}

fn write_snapshot(path: &Path, state: &StoreState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建目录 {} 失败", parent.display()))?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_vec_pretty(state)?;
    fs::write(&tmp, content).with_context(|| format!("写入 {} 失败", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("替换 {} 失败", path.display()))?;
    Ok(())
}
