//! 浏览器会话 - 基础设施层
//!
//! 打开 → 使用 → 持久化/关闭。会话状态以 JSON 文件保存，供下次运行复用登录状态。

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use super::page_driver::{PageDriver, StorageState};
use crate::error::{AppError, AppResult};

pub struct BrowserSession<P: PageDriver> {
    page: P,
    state_path: PathBuf,
}

impl<P: PageDriver> BrowserSession<P> {
    /// 包装页面并恢复已保存的会话状态
    ///
    /// 会话文件损坏时记录警告并以全新会话继续
    pub async fn open(page: P, state_path: impl Into<PathBuf>) -> Result<Self> {
        let state_path = state_path.into();

        match load_state(&state_path).await {
            Ok(Some(state)) => {
                page.restore_storage_state(&state).await?;
                info!("已加载会话文件: {}", state_path.display());
            }
            Ok(None) => debug!("会话文件不存在，使用新会话: {}", state_path.display()),
            Err(e) => warn!("会话文件不可用，使用新会话: {}", e),
        }

        Ok(Self { page, state_path })
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// 把当前存储状态写回会话文件
    pub async fn persist(&self) -> Result<()> {
        let state = self.page.storage_state().await?;
        save_state(&self.state_path, &state).await?;
        info!(
            "会话已保存: {} ({} 个 cookie)",
            self.state_path.display(),
            state.cookies.len()
        );
        Ok(())
    }

    /// 保存会话并关闭页面
    pub async fn close(self) -> Result<()> {
        let persisted = self.persist().await;
        self.page.close().await?;
        persisted
    }
}

pub async fn load_state(path: &Path) -> AppResult<Option<StorageState>> {
    let path_str = path.display().to_string();
    if !tokio::fs::try_exists(path)
        .await
        .map_err(|e| AppError::file(&path_str, e))?
    {
        return Ok(None);
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file(&path_str, e))?;
    let state = serde_json::from_str(&content).map_err(|e| AppError::Session {
        path: path_str,
        message: e.to_string(),
    })?;
    Ok(Some(state))
}

pub async fn save_state(path: &Path, state: &StorageState) -> AppResult<()> {
    let content = serde_json::to_string(state)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::file(path.display().to_string(), e))
}
