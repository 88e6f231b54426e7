//! 导出 - 把数据库记录写成便于阅读的 CSV
//!
//! JSON 列在写出前被"展平"为字符串；解析失败的值原样输出。

use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::CompanyRecord;

/// 导出文件名：`search_results-YYYY-MM-DD.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("search_results-{}.csv", date.format("%Y-%m-%d"))
}

/// 写出表头和全部记录
pub fn export_records(path: impl AsRef<Path>, records: &[CompanyRecord]) -> AppResult<()> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let export_err = |e: csv::Error| AppError::Export {
        path: path_str.clone(),
        source: e,
    };

    let mut wtr = csv::Writer::from_path(path).map_err(export_err)?;
    wtr.write_record(CompanyRecord::COLUMNS).map_err(export_err)?;

    for record in records {
        let row: Vec<String> = record
            .columns()
            .iter()
            .map(|(column, raw)| flatten_column(column, raw))
            .collect();
        wtr.write_record(&row).map_err(export_err)?;
    }

    wtr.flush().map_err(|e| AppError::file(&path_str, e))?;
    info!("已导出 {} 条记录到 {}", records.len(), path_str);
    Ok(())
}

/// 展平单个列的值
///
/// - 空值 → 空串
/// - 非 JSON 或非数组 → 原值
/// - `flags` → 元素以 "; " 连接
/// - `historical_shareholders` → `"名称" (期: 值, ...)` 以 "; " 连接
/// - 其他数组 → 对象取各字段值以 ":" 连接，元素以 "; " 连接
pub fn flatten_column(column: &str, raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let items = match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Array(items)) => items,
        _ => return raw.to_string(),
    };

    match column {
        "flags" => items.iter().map(render_scalar).collect::<Vec<_>>().join("; "),
        "historical_shareholders" => summarize_historical_shareholders(&items),
        _ => items
            .iter()
            .map(|item| match item {
                JsonValue::Object(fields) => fields
                    .values()
                    .map(render_scalar)
                    .collect::<Vec<_>>()
                    .join(":"),
                other => render_scalar(other),
            })
            .collect::<Vec<_>>()
            .join("; "),
    }
}

fn summarize_historical_shareholders(entries: &[JsonValue]) -> String {
    entries
        .iter()
        .map(|entry| {
            let name = entry
                .get("name")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("Unknown");

            let periods = entry
                .as_object()
                .map(|fields| {
                    fields
                        .iter()
                        .filter(|(key, value)| key.as_str() != "name" && !value.is_null())
                        .map(|(key, value)| format!("{}: {}", key, render_scalar(value)))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();

            format!("\"{}\" ({})", name, periods)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// 字符串不带引号，null 为空，其余按 JSON 文本输出
fn render_scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
