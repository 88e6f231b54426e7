//! WireScreen 站点适配器
//!
//! 搜索公司时页面要么显示 "No results"，要么显示匹配的公司列表。
//! 有结果时打开第一项的详情页，并从详情页发出的 JSON 请求中还原公司数据。

pub mod responses;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use super::{LoginForm, LoginOutcome, SearchLayout, SearchUrl, SiteAdapter};
use crate::config::{Credentials, TimeoutPolicy};
use crate::infrastructure::{ObservedResponse, PageDriver, PageProbe};
use crate::models::CompanyFinancialsAndRelations;
use crate::workflow::{extraction, login, ExtractionReport};

pub use responses::{interpret_response, ResponseSection, SectionPayload};

const SEARCH_URL: &str = "https://platform.wirescreen.ai/search?q=";
const LOGIN_URL: &str = "https://platform.wirescreen.ai/signin";
const SESSION_FILE: &str = "wirescreen_context.json";

const RESULT_ITEM: &str = ".MuiGrid-root.MuiGrid-item";

pub const LAYOUT: SearchLayout = SearchLayout {
    results: PageProbe::Selector(RESULT_ITEM),
    no_results: PageProbe::SelectorWithText {
        selector: "h2",
        text: "No results",
    },
    result_item: RESULT_ITEM,
    result_label: "p",
    detail_heading: PageProbe::Selector("#overview h1"),
    export_trigger: "#export a",
};

pub const LOGIN_FORM: LoginForm = LoginForm {
    signed_in_marker: PageProbe::Selector(".fa-circle-user"),
    username_field: "#name",
    password_field: "#password",
    submit_button: ".MuiButton-containedPrimary",
};

pub struct WireScreen;

#[async_trait]
impl SiteAdapter for WireScreen {
    fn key(&self) -> &'static str {
        "wirescreen"
    }

    fn search_url(&self) -> SearchUrl {
        SearchUrl::Prefix(SEARCH_URL)
    }

    fn login_url(&self) -> Option<&'static str> {
        Some(LOGIN_URL)
    }

    fn session_file(&self) -> &'static str {
        SESSION_FILE
    }

    fn layout(&self) -> &SearchLayout {
        &LAYOUT
    }

    fn interpret(&self, response: &ObservedResponse, record: &mut CompanyFinancialsAndRelations) {
        interpret_response(response, record);
    }

    async fn login(
        &self,
        page: &dyn PageDriver,
        login_url: &str,
        credentials: Option<&Credentials>,
        policy: &TimeoutPolicy,
    ) -> Result<LoginOutcome> {
        login::run_login(page, login_url, &LOGIN_FORM, credentials, policy).await
    }

    async fn extract(
        &self,
        page: &dyn PageDriver,
        policy: &TimeoutPolicy,
        pdf_dir: Option<&Path>,
    ) -> ExtractionReport {
        extraction::run_extraction(self, page, policy, pdf_dir).await
    }
}
