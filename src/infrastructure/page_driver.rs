//! 页面驱动能力 - 基础设施层
//!
//! 流程层只通过 `PageDriver` 操作页面，不直接接触 chromiumoxide。
//! 这样提取流程可以用脚本化的假页面来测试。

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

/// 页面上要探测的元素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageProbe {
    /// CSS 选择器匹配到任意元素
    Selector(&'static str),
    /// 匹配到的元素中有文本包含 `text`
    SelectorWithText {
        selector: &'static str,
        text: &'static str,
    },
}

impl PageProbe {
    /// 编译成返回布尔值的 JS 表达式
    pub fn script(&self) -> String {
        match self {
            PageProbe::Selector(selector) => format!(
                "!!document.querySelector({})",
                js_string(selector)
            ),
            PageProbe::SelectorWithText { selector, text } => format!(
                "Array.from(document.querySelectorAll({})).some(el => (el.textContent || '').includes({}))",
                js_string(selector),
                js_string(text)
            ),
        }
    }
}

pub(crate) fn js_string(value: &str) -> String {
    JsonValue::String(value.to_string()).to_string()
}

/// 搜索结果中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub label: String,
    pub url: String,
}

/// 页面加载过程中观察到的一个网络响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    pub url: String,
    pub content_type: String,
    pub body: String,
}

impl ObservedResponse {
    pub fn is_json(&self) -> bool {
        is_json_content_type(&self.content_type)
    }
}

pub fn is_json_content_type(content_type: &str) -> bool {
    content_type.contains("application/json")
}

/// 响应订阅，发送端由页面实现持有
pub type ResponseFeed = mpsc::UnboundedReceiver<ObservedResponse>;

/// 某个 origin 下的 localStorage 条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginStorage {
    pub origin: String,
    pub local_storage: Vec<StorageEntry>,
}

/// 可持久化的浏览器存储状态（cookies + localStorage）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<JsonValue>,
    #[serde(default)]
    pub origins: Vec<OriginStorage>,
}

/// 页面操作能力
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到指定 URL
    async fn goto(&self, url: &str) -> Result<()>;

    /// 轮询直到任一探测命中，返回命中的下标；超时返回 `None`
    async fn wait_for_any(&self, probes: &[PageProbe], timeout: Duration) -> Result<Option<usize>>;

    async fn is_present(&self, probe: &PageProbe) -> Result<bool>;

    /// 对每个 `item_selector` 元素取第一个链接和第一个 `label_selector` 文本
    async fn collect_links(&self, item_selector: &str, label_selector: &str) -> Result<Vec<SearchHit>>;

    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// 订阅之后到达的 JSON 响应
    async fn observe_responses(&self) -> Result<ResponseFeed>;

    /// 点击 `trigger_selector` 打开新标签页，等待渲染后打印为 PDF
    async fn capture_popup_pdf(
        &self,
        trigger_selector: &str,
        popup_timeout: Duration,
        render_delay: Duration,
        output: &Path,
    ) -> Result<()>;

    async fn storage_state(&self) -> Result<StorageState>;

    async fn restore_storage_state(&self, state: &StorageState) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
