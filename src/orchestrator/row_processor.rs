//! 单行处理器 - 编排层
//!
//! 一行输入 = 打开搜索页 → 站点提取流程 → 写入数据库。
//! 提取阶段的任何错误都只影响这一行；数据库错误向上传播并终止运行。

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::PageDriver;
use crate::models::BasicCompanyInfo;
use crate::sites::SiteAdapter;
use crate::storage::{RecordStore, UpsertOutcome};
use crate::utils::truncate_text;
use crate::workflow::{ExtractionOutcome, ExtractionReport, RowCtx};

/// 单行处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowResult {
    pub outcome: ExtractionOutcome,
    pub upsert: UpsertOutcome,
}

/// 行处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RowStats {
    pub inserted: usize,
    pub updated: usize,
    pub no_data: usize,
    pub failed: usize,
}

impl RowStats {
    pub fn record(&mut self, result: &RowResult) {
        match result.upsert {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
        if result.outcome.is_no_data() {
            self.no_data += 1;
        } else if result.outcome == ExtractionOutcome::Failed {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// 处理一行输入
///
/// # 参数
/// - `page`: 当前站点会话的页面
/// - `adapter`: 站点适配器
/// - `row`: 输入行
/// - `ctx`: 行上下文（用于日志）
/// - `store`: 记录存储
/// - `config`: 配置
pub async fn process_row(
    page: &dyn PageDriver,
    adapter: &dyn SiteAdapter,
    row: &BasicCompanyInfo,
    ctx: &RowCtx,
    store: &RecordStore,
    config: &Config,
) -> Result<RowResult> {
    let url = adapter.search_url().build(&row.translated_name);
    info!("{} 打开搜索页: {}", ctx, url);

    let report = match page.goto(&url).await {
        Ok(()) => {
            adapter
                .extract(page, &config.timeouts, config.pdf_dir.as_deref())
                .await
        }
        Err(e) => {
            error!("{} 打开搜索页失败: {:#}", ctx, e);
            ExtractionReport::failed()
        }
    };

    match report.outcome {
        ExtractionOutcome::Completed => info!(
            "{} ✓ 提取完成: {}",
            ctx,
            truncate_text(&report.record.display_name, 60)
        ),
        ExtractionOutcome::Failed => warn!("{} ⚠️ 提取失败，保存已获取的部分数据", ctx),
        outcome => info!("{} ∅ 没有数据 ({:?})", ctx, outcome),
    }

    let upsert = store
        .upsert(row, &report.record)
        .with_context(|| format!("保存记录失败: {}", row.translated_name))?;

    Ok(RowResult {
        outcome: report.outcome,
        upsert,
    })
}
