//! Chrome 页面 - 基础设施层
//!
//! 持有 chromiumoxide 的 Page，实现 `PageDriver`

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use super::page_driver::{
    is_json_content_type, js_string, ObservedResponse, OriginStorage, PageDriver, PageProbe,
    ResponseFeed, SearchHit, StorageState,
};

/// A4 纸张尺寸（英寸）
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;

pub struct ChromePage {
    browser: Arc<Browser>,
    page: Page,
    poll_interval: Duration,
    /// 等待页面到达对应 origin 后再写入的 localStorage
    pending_local_storage: Mutex<Vec<OriginStorage>>,
}

impl ChromePage {
    /// 在浏览器中新建一个空白页面
    pub async fn open(browser: Arc<Browser>, poll_interval: Duration) -> Result<Self> {
        let page = browser.new_page("about:blank").await.map_err(|e| {
            error!("创建新页面失败: {}", e);
            e
        })?;
        debug!("已创建空白页面");
        Ok(Self {
            browser,
            page,
            poll_interval,
            pending_local_storage: Mutex::new(Vec::new()),
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 页面跳转中执行脚本可能失败，按未命中处理
    async fn probe(&self, probe: &PageProbe) -> bool {
        match self.eval_as::<bool>(probe.script()).await {
            Ok(hit) => hit,
            Err(e) => {
                debug!("探测 {:?} 失败: {}", probe, e);
                false
            }
        }
    }

    async fn apply_pending_local_storage(&self) -> Result<()> {
        if self.pending_local_storage.lock().await.is_empty() {
            return Ok(());
        }

        let origin: String = self.eval_as("location.origin").await?;
        let matched: Vec<OriginStorage> = {
            let mut pending = self.pending_local_storage.lock().await;
            let (matched, rest): (Vec<_>, Vec<_>) =
                pending.drain(..).partition(|storage| storage.origin == origin);
            *pending = rest;
            matched
        };

        for storage in matched {
            let entries = serde_json::to_string(&storage.local_storage)?;
            self.eval(format!(
                "(() => {{ for (const e of {}) localStorage.setItem(e.name, e.value); return true; }})()",
                entries
            ))
            .await?;
            info!("已恢复 {} 的 localStorage ({} 项)", origin, storage.local_storage.len());
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(|e| {
            error!("导航到 {} 失败: {}", url, e);
            e
        })?;
        debug!("已导航到: {}", url);

        if let Err(e) = self.apply_pending_local_storage().await {
            warn!("恢复 localStorage 失败: {}", e);
        }
        Ok(())
    }

    async fn wait_for_any(&self, probes: &[PageProbe], timeout: Duration) -> Result<Option<usize>> {
        let deadline = Instant::now() + timeout;
        loop {
            for (index, probe) in probes.iter().enumerate() {
                if self.probe(probe).await {
                    return Ok(Some(index));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn is_present(&self, probe: &PageProbe) -> Result<bool> {
        self.eval_as::<bool>(probe.script()).await
    }

    async fn collect_links(&self, item_selector: &str, label_selector: &str) -> Result<Vec<SearchHit>> {
        let js_code = format!(
            r#"
            (() => Array.from(document.querySelectorAll({}), (el) => {{
                const link = el.querySelector('a');
                const label = el.querySelector({});
                return link && label
                    ? {{ label: (label.textContent || '').trim(), url: link.href }}
                    : null;
            }}).filter(Boolean))()
            "#,
            js_string(item_selector),
            js_string(label_selector),
        );
        self.eval_as(js_code).await
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到输入框: {}", selector))?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到元素: {}", selector))?
            .click()
            .await?;
        Ok(())
    }

    async fn observe_responses(&self) -> Result<ResponseFeed> {
        let mut received = self.page.event_listener::<EventResponseReceived>().await?;
        let mut finished = self.page.event_listener::<EventLoadingFinished>().await?;
        let page = self.page.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        // 响应头先到，响应体要等 loadingFinished 之后才能读取；
        // 两个事件流分开投递，loadingFinished 可能先被取到
        tokio::spawn(async move {
            let mut matcher = ResponseMatcher::default();
            loop {
                let ready = tokio::select! {
                    biased;
                    event = received.next() => {
                        let Some(event) = event else { break };
                        let json = is_json_content_type(&event.response.mime_type);
                        matcher
                            .on_received(
                                event.request_id.clone(),
                                json,
                                (event.response.url.clone(), event.response.mime_type.clone()),
                            )
                            .map(|meta| (event.request_id.clone(), meta))
                    }
                    event = finished.next() => {
                        let Some(event) = event else { break };
                        matcher
                            .on_finished(event.request_id.clone())
                            .map(|meta| (event.request_id.clone(), meta))
                    }
                };
                if let Some((request_id, meta)) = ready {
                    if !forward_body(&page, &tx, request_id, meta).await {
                        break;
                    }
                }
                if tx.is_closed() {
                    break;
                }
            }
            debug!("响应监听已结束");
        });

        Ok(rx)
    }

    async fn capture_popup_pdf(
        &self,
        trigger_selector: &str,
        popup_timeout: Duration,
        render_delay: Duration,
        output: &Path,
    ) -> Result<()> {
        let before: HashSet<_> = self
            .browser
            .pages()
            .await?
            .iter()
            .map(|p| p.target_id().clone())
            .collect();

        self.click(trigger_selector).await?;

        let deadline = Instant::now() + popup_timeout;
        let popup = loop {
            let opened = self
                .browser
                .pages()
                .await?
                .into_iter()
                .find(|p| !before.contains(p.target_id()));
            if let Some(popup) = opened {
                break popup;
            }
            if Instant::now() >= deadline {
                anyhow::bail!("等待导出标签页超时 ({:?})", popup_timeout);
            }
            sleep(self.poll_interval).await;
        };
        info!("导出标签页已打开");

        if let Err(e) = popup.wait_for_navigation().await {
            debug!("等待导出标签页加载失败: {}", e);
        }
        sleep(render_delay).await;

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("无法创建目录: {}", parent.display()))?;
        }

        let params = PrintToPdfParams {
            print_background: Some(true),
            paper_width: Some(A4_WIDTH_IN),
            paper_height: Some(A4_HEIGHT_IN),
            ..Default::default()
        };
        let saved = popup.save_pdf(params, output).await;

        if let Err(e) = popup.close().await {
            debug!("关闭导出标签页失败: {}", e);
        }

        saved.with_context(|| format!("保存 PDF 失败: {}", output.display()))?;
        Ok(())
    }

    async fn storage_state(&self) -> Result<StorageState> {
        let cookies = self
            .page
            .get_cookies()
            .await?
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let current: OriginStorage = self
            .eval_as(
                r#"(() => ({
                    origin: location.origin,
                    localStorage: Object.keys(localStorage).map((name) => ({ name, value: localStorage.getItem(name) || '' })),
                }))()"#,
            )
            .await
            .unwrap_or_else(|e| {
                debug!("读取 localStorage 失败: {}", e);
                OriginStorage {
                    origin: String::new(),
                    local_storage: Vec::new(),
                }
            });

        let mut origins: Vec<OriginStorage> = self.pending_local_storage.lock().await.clone();
        if !current.local_storage.is_empty() && current.origin.starts_with("http") {
            origins.retain(|o| o.origin != current.origin);
            origins.push(current);
        }

        Ok(StorageState { cookies, origins })
    }

    async fn restore_storage_state(&self, state: &StorageState) -> Result<()> {
        let cookies: Vec<CookieParam> = state
            .cookies
            .iter()
            .filter_map(|cookie| {
                let mut cookie = cookie.clone();
                // 会话 cookie 的 expires 为 -1，写回时去掉
                if cookie.get("expires").and_then(|v| v.as_f64()).is_some_and(|v| v <= 0.0) {
                    if let Some(fields) = cookie.as_object_mut() {
                        fields.remove("expires");
                    }
                }
                match serde_json::from_value::<CookieParam>(cookie) {
                    Ok(param) => Some(param),
                    Err(e) => {
                        warn!("忽略无法恢复的 cookie: {}", e);
                        None
                    }
                }
            })
            .collect();

        let cookie_count = cookies.len();
        if !cookies.is_empty() {
            self.page.set_cookies(cookies).await?;
        }
        *self.pending_local_storage.lock().await = state.origins.clone();

        info!(
            "已恢复会话: {} 个 cookie, {} 个 origin 的 localStorage 待写入",
            cookie_count,
            state.origins.len()
        );
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.page.clone().close().await?;
        Ok(())
    }
}

/// 把 responseReceived 与 loadingFinished 按 request id 配对
///
/// 两个事件分属不同的流，到达顺序不保证；任一顺序下都在两者齐全时返回一次元数据
struct ResponseMatcher<K, M> {
    awaiting_finish: HashMap<K, M>,
    finished_early: HashSet<K>,
    skipped: HashSet<K>,
}

impl<K, M> Default for ResponseMatcher<K, M> {
    fn default() -> Self {
        Self {
            awaiting_finish: HashMap::new(),
            finished_early: HashSet::new(),
            skipped: HashSet::new(),
        }
    }
}

impl<K: Hash + Eq, M> ResponseMatcher<K, M> {
    /// 响应头到达；`wanted` 为 false 的响应只做记录以便丢弃对应的完成事件
    fn on_received(&mut self, id: K, wanted: bool, meta: M) -> Option<M> {
        let already_finished = self.finished_early.remove(&id);
        if !wanted {
            if !already_finished {
                self.skipped.insert(id);
            }
            return None;
        }
        if already_finished {
            return Some(meta);
        }
        self.awaiting_finish.insert(id, meta);
        None
    }

    /// 响应体已可读取
    fn on_finished(&mut self, id: K) -> Option<M> {
        if let Some(meta) = self.awaiting_finish.remove(&id) {
            return Some(meta);
        }
        if !self.skipped.remove(&id) {
            self.finished_early.insert(id);
        }
        None
    }
}

/// 读取响应体并推送给监听方，接收端已关闭时返回 false
async fn forward_body(
    page: &Page,
    tx: &mpsc::UnboundedSender<ObservedResponse>,
    request_id: RequestId,
    (url, content_type): (String, String),
) -> bool {
    match page.execute(GetResponseBodyParams::new(request_id)).await {
        Ok(response) if !response.result.base64_encoded => {
            let observed = ObservedResponse {
                url,
                content_type,
                body: response.result.body.clone(),
            };
            tx.send(observed).is_ok()
        }
        Ok(_) => {
            debug!("跳过 base64 编码的响应: {}", url);
            true
        }
        Err(e) => {
            debug!("读取响应体失败 ({}): {}", url, e);
            true
        }
    }
}
