//! 集成测试公用的脚本化页面
//!
//! `ScriptedPage` 按预设脚本回答探测、返回搜索结果，并在导航到详情页时推送响应。
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

use company_scrape::config::TimeoutPolicy;
use company_scrape::infrastructure::{
    ObservedResponse, PageDriver, PageProbe, ResponseFeed, SearchHit, StorageState,
};

#[derive(Default)]
pub struct ScriptedPage {
    present: Mutex<Vec<PageProbe>>,
    hits: Vec<SearchHit>,
    detail_responses: Vec<ObservedResponse>,
    feed: Mutex<Option<mpsc::UnboundedSender<ObservedResponse>>>,
    marker_after_submit: Option<PageProbe>,
    failing_goto: Option<String>,
    failing_pdf: bool,
    pub gotos: Mutex<Vec<String>>,
    pub fills: Mutex<Vec<(String, String)>>,
    pub clicks: Mutex<Vec<String>>,
    pub pdfs: Mutex<Vec<PathBuf>>,
    pub state: Mutex<StorageState>,
    pub closed: Mutex<bool>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 页面上始终存在的元素
    pub fn with_present(self, probe: PageProbe) -> Self {
        self.present.lock().unwrap().push(probe);
        self
    }

    pub fn with_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.hits = hits;
        self
    }

    /// 订阅响应之后的下一次导航会推送这些响应
    pub fn with_responses(mut self, responses: Vec<ObservedResponse>) -> Self {
        self.detail_responses = responses;
        self
    }

    /// 提交登录表单后出现的已登录标志
    pub fn signs_in_on_submit(mut self, marker: PageProbe) -> Self {
        self.marker_after_submit = Some(marker);
        self
    }

    /// 导航到以 `prefix` 开头的 URL 时失败
    pub fn failing_goto(mut self, prefix: &str) -> Self {
        self.failing_goto = Some(prefix.to_string());
        self
    }

    pub fn failing_pdf(mut self) -> Self {
        self.failing_pdf = true;
        self
    }

    pub fn with_state(self, state: StorageState) -> Self {
        *self.state.lock().unwrap() = state;
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.gotos.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.gotos.lock().unwrap().push(url.to_string());
        if let Some(prefix) = &self.failing_goto {
            if url.starts_with(prefix.as_str()) {
                bail!("navigation failed: {}", url);
            }
        }

        // 推送完毕后丢弃发送端，订阅方随即收到结束信号
        if let Some(sender) = self.feed.lock().unwrap().take() {
            for response in &self.detail_responses {
                let _ = sender.send(response.clone());
            }
        }
        Ok(())
    }

    async fn wait_for_any(&self, probes: &[PageProbe], timeout: Duration) -> Result<Option<usize>> {
        let found = {
            let present = self.present.lock().unwrap();
            probes.iter().position(|probe| present.contains(probe))
        };
        if found.is_none() {
            tokio::time::sleep(timeout).await;
        }
        Ok(found)
    }

    async fn is_present(&self, probe: &PageProbe) -> Result<bool> {
        Ok(self.present.lock().unwrap().contains(probe))
    }

    async fn collect_links(&self, _item: &str, _label: &str) -> Result<Vec<SearchHit>> {
        Ok(self.hits.clone())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.fills
            .lock()
            .unwrap()
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.clicks.lock().unwrap().push(selector.to_string());
        if let Some(marker) = self.marker_after_submit {
            self.present.lock().unwrap().push(marker);
        }
        Ok(())
    }

    async fn observe_responses(&self) -> Result<ResponseFeed> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.feed.lock().unwrap() = Some(sender);
        Ok(receiver)
    }

    async fn capture_popup_pdf(
        &self,
        _trigger: &str,
        _popup_timeout: Duration,
        _render_delay: Duration,
        output: &Path,
    ) -> Result<()> {
        if self.failing_pdf {
            bail!("popup did not open");
        }
        self.pdfs.lock().unwrap().push(output.to_path_buf());
        Ok(())
    }

    async fn storage_state(&self) -> Result<StorageState> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn restore_storage_state(&self, state: &StorageState) -> Result<()> {
        *self.state.lock().unwrap() = state.clone();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// 毫秒级的等待时间，测试不必等上几秒
pub fn fast_policy() -> TimeoutPolicy {
    let short = Duration::from_millis(20);
    TimeoutPolicy {
        search_timeout: short,
        settle_delay: Duration::from_millis(50),
        heading_timeout: short,
        popup_timeout: short,
        pdf_render_delay: short,
        login_settle: Duration::from_millis(5),
        row_delay: Duration::from_millis(5),
        poll_interval: Duration::from_millis(5),
    }
}

pub fn json_response(url: &str, body: JsonValue) -> ObservedResponse {
    ObservedResponse {
        url: url.to_string(),
        content_type: "application/json; charset=utf-8".to_string(),
        body: body.to_string(),
    }
}

pub fn detail_hit(name: &str) -> SearchHit {
    SearchHit {
        label: name.to_string(),
        url: format!("https://platform.wirescreen.ai/entity/{}", name.to_lowercase()),
    }
}

pub fn temp_path(prefix: &str, name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "company_scrape_{}_{}_{}",
        prefix,
        std::process::id(),
        name
    ))
}
