//! 公司数据提取流程 - 流程层
//!
//! 在已加载的搜索页上执行：
//! 1. 等待搜索结果或 "No results" 提示（有超时）
//! 2. 取第一个搜索结果
//! 3. 先订阅网络响应，再打开详情页
//! 4. 在固定时长内收集响应，再等待详情页标题
//! 5. （可选）导出 PDF
//!
//! 任意一步出错都不会中断整体运行：记录日志并返回已经捕获到的部分数据。

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::config::TimeoutPolicy;
use crate::infrastructure::{PageDriver, ResponseFeed};
use crate::models::CompanyFinancialsAndRelations;
use crate::sites::{SearchLayout, SiteAdapter};

/// 提取流程的终止状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// 搜索结果和 "No results" 都没有在超时内出现
    SearchTimedOut,
    /// 站点明确表示没有结果
    NoResults,
    /// 结果网格存在但没有可用链接
    EmptyResultList,
    /// 详情页流程走完
    Completed,
    /// 中途出错，记录中只有部分数据
    Failed,
}

impl ExtractionOutcome {
    /// 是否属于"没有数据"而不是出错
    pub fn is_no_data(self) -> bool {
        matches!(
            self,
            ExtractionOutcome::SearchTimedOut
                | ExtractionOutcome::NoResults
                | ExtractionOutcome::EmptyResultList
        )
    }
}

/// 提取结果
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub outcome: ExtractionOutcome,
    pub record: CompanyFinancialsAndRelations,
}

impl ExtractionReport {
    /// 流程没能开始时使用的空结果
    pub fn failed() -> Self {
        Self {
            outcome: ExtractionOutcome::Failed,
            record: CompanyFinancialsAndRelations::default(),
        }
    }
}

/// 执行提取流程，永不返回错误
pub async fn run_extraction(
    adapter: &dyn SiteAdapter,
    page: &dyn PageDriver,
    policy: &TimeoutPolicy,
    pdf_dir: Option<&Path>,
) -> ExtractionReport {
    let mut record = CompanyFinancialsAndRelations::default();

    let outcome = match drive(adapter, page, policy, pdf_dir, &mut record).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("提取过程出错，保留已捕获的数据: {:#}", e);
            ExtractionOutcome::Failed
        }
    };

    ExtractionReport { outcome, record }
}

async fn drive(
    adapter: &dyn SiteAdapter,
    page: &dyn PageDriver,
    policy: &TimeoutPolicy,
    pdf_dir: Option<&Path>,
    record: &mut CompanyFinancialsAndRelations,
) -> Result<ExtractionOutcome> {
    let layout = adapter.layout();

    // ========== ① 等待搜索结果 ==========
    let appeared = page
        .wait_for_any(&[layout.results, layout.no_results], policy.search_timeout)
        .await?;
    if appeared.is_none() {
        warn!("既没有搜索结果也没有 \"No results\" 提示 (等待 {:?})", policy.search_timeout);
        return Ok(ExtractionOutcome::SearchTimedOut);
    }
    if page.is_present(&layout.no_results).await? {
        info!("没有搜索结果");
        return Ok(ExtractionOutcome::NoResults);
    }
    info!("搜索结果已加载");

    // ========== ② 选择第一个结果 ==========
    let hits = page
        .collect_links(layout.result_item, layout.result_label)
        .await?;
    let total_hits = hits.len();
    let Some(first) = hits.into_iter().next() else {
        info!("搜索结果列表为空");
        return Ok(ExtractionOutcome::EmptyResultList);
    };
    info!("共 {} 个搜索结果，打开第一个: {} ({})", total_hits, first.label, first.url);

    // ========== ③ 打开详情页并拦截响应 ==========
    let mut feed = page.observe_responses().await?;
    page.goto(&first.url).await?;
    info!("详情页已打开");

    // ========== ④ 等待响应稳定 ==========
    let captured = collect_for(adapter, &mut feed, policy.settle_delay, record).await;
    debug!("等待期间处理了 {} 个响应", captured);

    match page
        .wait_for_any(&[layout.detail_heading], policy.heading_timeout)
        .await?
    {
        Some(_) => info!("详情页加载完成"),
        None => warn!("等待详情页标题超时 ({:?})", policy.heading_timeout),
    }
    drain_ready(adapter, &mut feed, record);

    // ========== ⑤ 导出 PDF ==========
    if let Some(dir) = pdf_dir {
        capture_pdf(layout, page, policy, dir, record).await;
        drain_ready(adapter, &mut feed, record);
    }

    Ok(ExtractionOutcome::Completed)
}

/// 在 `window` 时长内持续处理到达的响应
async fn collect_for(
    adapter: &dyn SiteAdapter,
    feed: &mut ResponseFeed,
    window: Duration,
    record: &mut CompanyFinancialsAndRelations,
) -> usize {
    let deadline = Instant::now() + window;
    let mut seen = 0;
    loop {
        match timeout_at(deadline, feed.recv()).await {
            Ok(Some(response)) => {
                adapter.interpret(&response, record);
                seen += 1;
            }
            // 发送端已关闭，不会再有新响应
            Ok(None) => break,
            Err(_) => break,
        }
    }
    seen
}

/// 处理已经到达、尚未处理的响应
fn drain_ready(
    adapter: &dyn SiteAdapter,
    feed: &mut ResponseFeed,
    record: &mut CompanyFinancialsAndRelations,
) {
    while let Ok(response) = feed.try_recv() {
        adapter.interpret(&response, record);
    }
}

async fn capture_pdf(
    layout: &SearchLayout,
    page: &dyn PageDriver,
    policy: &TimeoutPolicy,
    dir: &Path,
    record: &mut CompanyFinancialsAndRelations,
) {
    if record.display_name.is_empty() {
        warn!("未获取到公司名称，跳过 PDF 导出");
        return;
    }

    let file_name = pdf_file_name(&record.display_name);
    let path = dir.join(&file_name);

    match page
        .capture_popup_pdf(
            layout.export_trigger,
            policy.popup_timeout,
            policy.pdf_render_delay,
            &path,
        )
        .await
    {
        Ok(()) => {
            info!("PDF 已保存到 {}", path.display());
            record.pdf_link = format!("/pdfs/{}", file_name);
        }
        Err(e) => error!("PDF 导出失败: {:#}", e),
    }
}

/// 由公司名称生成 PDF 文件名，替换路径中不允许的字符
pub fn pdf_file_name(display_name: &str) -> String {
    let safe: String = display_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}.pdf", safe)
}
