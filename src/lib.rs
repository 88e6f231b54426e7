//! # Company Scrape
//!
//! 按输入 CSV 中的公司名称，在外部情报站点上搜索公司，抓取股权、交易等数据，
//! 写入本地 SQLite 数据库，并可另行导出为 CSV。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面能力接口，流程层只依赖它
//! - `ChromePage` - chromiumoxide 实现，负责响应拦截和 PDF 导出
//! - `BrowserSession` - 会话状态的恢复与保存
//!
//! ### ② 数据层（Storage / Tabular）
//! - `storage/` - SQLite 记录存储，按 `translated_name` upsert
//! - `tabular/` - 输入 CSV 读取，导出时展平 JSON 列
//!
//! ### ③ 站点与流程层（Sites / Workflow）
//! - `sites/` - 站点注册表，每个适配器描述一个站点
//! - `workflow/` - 提取流程和登录流程
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/scrape_runner` - 逐站点、逐行顺序处理
//! - `orchestrator/row_processor` - 处理单行并写库
//! - `orchestrator/export_runner` - 导出运行
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod sites;
pub mod storage;
pub mod tabular;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::launch_browser;
pub use config::{Config, Credentials, TimeoutPolicy};
pub use error::{AppError, AppResult};
pub use infrastructure::{BrowserSession, ChromePage, PageDriver};
pub use models::{BasicCompanyInfo, CompanyFinancialsAndRelations, CompanyRecord};
pub use orchestrator::{process_row, run_export, App};
pub use sites::{SiteAdapter, SITES};
pub use storage::{RecordStore, UpsertOutcome};
pub use workflow::{ExtractionOutcome, ExtractionReport, RowCtx};
