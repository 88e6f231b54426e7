//! 导出运行器 - 编排层
//!
//! 读取数据库全部记录，写出 `search_results-YYYY-MM-DD.csv`

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::Config;
use crate::storage::RecordStore;
use crate::tabular;

/// 导出全部记录，返回输出文件路径
pub fn run_export(config: &Config, date: NaiveDate) -> Result<PathBuf> {
    let store = RecordStore::open(&config.database_path)
        .with_context(|| format!("无法打开数据库: {}", config.database_path.display()))?;
    store.ensure_schema()?;

    let records = store.all_records()?;
    if records.is_empty() {
        warn!("⚠️ 数据库中没有记录，只写出表头");
    }

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("无法创建输出目录: {}", config.output_dir.display()))?;

    let path = config.output_dir.join(tabular::export_file_name(date));
    tabular::export_records(&path, &records)?;

    info!("✓ 导出完成: {}", path.display());
    Ok(path)
}
