//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `scrape_runner` - 抓取运行器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 持有数据库和浏览器
//! - 逐站点、逐行顺序调度
//! - 输出全局统计信息
//!
//! ### `row_processor` - 单行处理器
//! - 打开搜索页，委托站点适配器提取
//! - 把结果写入数据库
//!
//! ### `export_runner` - 导出运行器
//! - 独立运行，把数据库记录导出为 CSV
//!
//! ## 层次关系
//!
//! ```text
//! scrape_runner (处理 Vec<BasicCompanyInfo>，每个站点一个会话)
//!     ↓
//! row_processor (处理单行)
//!     ↓
//! sites::SiteAdapter → workflow (提取 / 登录流程)
//!     ↓
//! infrastructure (PageDriver / BrowserSession)
//! ```

pub mod export_runner;
pub mod row_processor;
pub mod scrape_runner;

// 重新导出主要类型
pub use export_runner::run_export;
pub use row_processor::{process_row, RowResult, RowStats};
pub use scrape_runner::{run_site_rows, select_rows, App};
