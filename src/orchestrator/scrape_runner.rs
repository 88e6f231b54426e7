//! 抓取运行器 - 编排层
//!
//! ## 职责
//!
//! 整个抓取运行的入口，负责资源管理和顺序调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：打开数据库并建表、启动浏览器
//! 2. **加载输入**：读取 CSV（解析失败直接终止）
//! 3. **逐站点处理**：恢复会话 → 登录 → 保存会话
//! 4. **逐行处理**：按输入顺序处理前 `max_rows` 行，行间固定等待
//! 5. **资源清理**：保存会话、关闭页面和浏览器
//! 6. **全局统计**：新增 / 更新 / 无数据 / 失败
//!
//! 行与行之间没有并发，同一时间只操作一个页面。

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{BrowserSession, ChromePage, PageDriver};
use crate::models::BasicCompanyInfo;
use crate::orchestrator::row_processor::{process_row, RowStats};
use crate::sites::{self, SiteAdapter};
use crate::storage::RecordStore;
use crate::tabular;
use crate::utils::logging;
use crate::workflow::RowCtx;

/// 应用主结构
pub struct App {
    config: Config,
    store: RecordStore,
    browser: Arc<Browser>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let store = RecordStore::open(&config.database_path)
            .with_context(|| format!("无法打开数据库: {}", config.database_path.display()))?;
        store.ensure_schema()?;

        let browser = browser::launch_browser(&config).await?;

        Ok(Self {
            config,
            store,
            browser: Arc::new(browser),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(self, input_path: &Path) -> Result<RowStats> {
        let rows = tabular::load_input(input_path)
            .with_context(|| format!("无法读取输入文件: {}", input_path.display()))?;
        let selected = select_rows(&rows, self.config.max_rows);

        logging::log_startup(&input_path.display().to_string(), selected.len(), rows.len());

        let mut stats = RowStats::default();
        let outcome = self.run_all_sites(selected, &mut stats).await;
        let database = self.config.database_path.display().to_string();

        self.shutdown().await;
        outcome?;

        logging::print_final_stats(
            stats.inserted,
            stats.updated,
            stats.no_data,
            stats.failed,
            &database,
        );
        Ok(stats)
    }

    async fn run_all_sites(&self, rows: &[BasicCompanyInfo], stats: &mut RowStats) -> Result<()> {
        if rows.is_empty() {
            warn!("⚠️ 输入文件没有数据行，程序结束");
            return Ok(());
        }

        for adapter in sites::all_sites() {
            self.run_site(adapter, rows, stats).await?;
        }
        Ok(())
    }

    /// 处理单个站点的全部行
    async fn run_site(
        &self,
        adapter: &'static dyn SiteAdapter,
        rows: &[BasicCompanyInfo],
        stats: &mut RowStats,
    ) -> Result<()> {
        logging::log_adapter_start(adapter.key(), adapter.session_file());

        let page = ChromePage::open(self.browser.clone(), self.config.timeouts.poll_interval).await?;
        let session = BrowserSession::open(page, adapter.session_file()).await?;

        let result =
            run_site_rows(&session, adapter, rows, &self.store, &self.config, stats).await;

        // 出错时也要保存会话并关闭页面
        if let Err(e) = session.close().await {
            warn!("关闭会话失败: {:#}", e);
        }
        result
    }

    /// 关闭浏览器
    async fn shutdown(self) {
        match Arc::try_unwrap(self.browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    error!("关闭浏览器失败: {}", e);
                }
                match browser.wait().await {
                    Ok(status) => debug!("浏览器进程已退出: {:?}", status),
                    Err(e) => debug!("等待浏览器进程退出失败: {}", e),
                }
                info!("浏览器已关闭");
            }
            Err(_) => warn!("浏览器仍被引用，跳过关闭"),
        }
    }
}

/// 按输入顺序取前 `max_rows` 行
pub fn select_rows(rows: &[BasicCompanyInfo], max_rows: usize) -> &[BasicCompanyInfo] {
    &rows[..rows.len().min(max_rows)]
}

/// 在一个已打开的会话里处理某个站点的全部行
///
/// 先登录（站点需要时）并保存会话，再逐行处理；行间等待 `row_delay`，最后一行之后不等待。
/// 会话保存失败或数据库错误会终止该站点的处理。
pub async fn run_site_rows<P: PageDriver>(
    session: &BrowserSession<P>,
    adapter: &dyn SiteAdapter,
    rows: &[BasicCompanyInfo],
    store: &RecordStore,
    config: &Config,
    stats: &mut RowStats,
) -> Result<()> {
    let page: &dyn PageDriver = session.page();

    if let Some(login_url) = adapter.login_url() {
        let outcome = adapter
            .login(page, login_url, config.credentials.as_ref(), &config.timeouts)
            .await
            .with_context(|| format!("[{}] 登录失败", adapter.key()))?;
        info!("[{}] 登录结果: {:?}", adapter.key(), outcome);
        sleep(config.timeouts.login_settle).await;
    }
    session.persist().await?;

    let total = rows.len();
    for (index, row) in rows.iter().enumerate() {
        let row_index = index + 1;
        logging::log_row_start(row_index, total, &row.translated_name);

        let ctx = RowCtx::new(adapter.key(), row_index, total, row.translated_name.clone());
        let result = process_row(page, adapter, row, &ctx, store, config).await?;
        stats.record(&result);

        if row_index < total {
            sleep(config.timeouts.row_delay).await;
        }
    }
    Ok(())
}
