//! 站点适配器 - 业务能力层
//!
//! 每个适配器描述一个外部站点：如何构造搜索 URL、如何登录、
//! 页面长什么样（选择器）、以及如何解读拦截到的网络响应。

pub mod wirescreen;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{Credentials, TimeoutPolicy};
use crate::infrastructure::{ObservedResponse, PageDriver, PageProbe};
use crate::models::CompanyFinancialsAndRelations;
use crate::workflow::ExtractionReport;

pub use wirescreen::WireScreen;

/// 搜索 URL 构造方式
#[derive(Clone, Copy)]
pub enum SearchUrl {
    /// 在前缀后拼接带引号的搜索词
    Prefix(&'static str),
    /// 自定义构造函数
    Custom(fn(&str) -> String),
}

impl SearchUrl {
    pub fn build(&self, search_term: &str) -> String {
        match self {
            SearchUrl::Prefix(prefix) => {
                let quoted = format!("\"{}\"", search_term);
                format!("{}{}", prefix, urlencoding::encode(&quoted))
            }
            SearchUrl::Custom(build) => build(search_term),
        }
    }
}

/// 搜索页与详情页的页面结构
#[derive(Debug, Clone, Copy)]
pub struct SearchLayout {
    /// 搜索结果网格
    pub results: PageProbe,
    /// "无结果"提示
    pub no_results: PageProbe,
    /// 每个搜索结果项
    pub result_item: &'static str,
    /// 结果项内的名称元素
    pub result_label: &'static str,
    /// 详情页加载完成的标志
    pub detail_heading: PageProbe,
    /// 打开导出标签页的按钮
    pub export_trigger: &'static str,
}

/// 登录表单结构
#[derive(Debug, Clone, Copy)]
pub struct LoginForm {
    /// 已登录时页面上存在的元素
    pub signed_in_marker: PageProbe,
    pub username_field: &'static str,
    pub password_field: &'static str,
    pub submit_button: &'static str,
}

/// 登录结果
///
/// 区分"确认已登录"和"提交后未能确认"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// 站点无需登录
    NotRequired,
    /// 会话仍然有效，未提交凭据
    AlreadyAuthenticated,
    /// 提交凭据后确认已登录
    Verified,
    /// 提交了凭据但没看到已登录标志
    Assumed,
    /// 需要登录但没有配置凭据
    MissingCredentials,
}

impl LoginOutcome {
    pub fn is_verified(self) -> bool {
        matches!(
            self,
            LoginOutcome::NotRequired | LoginOutcome::AlreadyAuthenticated | LoginOutcome::Verified
        )
    }
}

/// 站点适配器能力
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn key(&self) -> &'static str;

    fn search_url(&self) -> SearchUrl;

    fn login_url(&self) -> Option<&'static str> {
        None
    }

    /// 会话状态文件路径
    fn session_file(&self) -> &'static str;

    fn layout(&self) -> &SearchLayout;

    /// 解读一个拦截到的响应并更新结果
    fn interpret(&self, response: &ObservedResponse, record: &mut CompanyFinancialsAndRelations);

    async fn login(
        &self,
        page: &dyn PageDriver,
        login_url: &str,
        credentials: Option<&Credentials>,
        policy: &TimeoutPolicy,
    ) -> Result<LoginOutcome>;

    /// 在已加载的搜索页上提取公司数据
    async fn extract(
        &self,
        page: &dyn PageDriver,
        policy: &TimeoutPolicy,
        pdf_dir: Option<&Path>,
    ) -> ExtractionReport;
}

/// 站点注册表
pub static SITES: phf::Map<&'static str, &'static dyn SiteAdapter> = phf::phf_map! {
    "wirescreen" => &WireScreen as &'static dyn SiteAdapter,
};

/// 按 key 查找站点
pub fn site(key: &str) -> Option<&'static dyn SiteAdapter> {
    SITES.get(key).copied()
}

/// 全部站点，按 key 排序
pub fn all_sites() -> Vec<&'static dyn SiteAdapter> {
    let mut sites: Vec<&'static dyn SiteAdapter> = SITES.values().copied().collect();
    sites.sort_by_key(|site| site.key());
    sites
}
