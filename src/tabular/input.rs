use std::fs::File;
use std::path::Path;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::BasicCompanyInfo;

/// 读取输入 CSV
///
/// 按表头列名映射字段，保持文件中的行顺序。只去掉表头两端的空白，字段值原样保留。
/// 文件无法读取或任意一行格式错误都会返回 `AppError::Parse`。
pub fn load_input(path: impl AsRef<Path>) -> AppResult<Vec<BasicCompanyInfo>> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    let file = File::open(path).map_err(|e| AppError::parse(&path_str, csv::Error::from(e)))?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in rdr.deserialize::<BasicCompanyInfo>() {
        rows.push(record.map_err(|e| AppError::parse(&path_str, e))?);
    }

    info!("从 {} 读取到 {} 家公司", path_str, rows.len());
    Ok(rows)
}
