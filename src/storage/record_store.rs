//! 公司记录存储 - 基础设施层
//!
//! 单表 SQLite 存储，以 `translated_name` 为键。
//! 重复抓取同一家公司时整列覆盖结果字段，不做合并。

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::{BasicCompanyInfo, CompanyFinancialsAndRelations, CompanyRecord};

/// upsert 实际执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// 打开（必要时创建）数据库文件
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        debug!("打开数据库: {}", path.display());
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// 内存数据库，主要用于测试
    pub fn open_in_memory() -> AppResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// 幂等地创建数据表
    pub fn ensure_schema(&self) -> AppResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS company (
                original_chinese_name TEXT NOT NULL,
                translated_name TEXT NOT NULL UNIQUE,
                location_eng TEXT,
                display_name TEXT,
                retrieval_date TEXT,
                flags JSON,
                government_ownership_fraction TEXT,
                historical_shareholders JSON,
                investments JSON,
                direct_shareholders JSON,
                beneficial_owners JSON,
                customers JSON,
                suppliers JSON,
                pdf_link TEXT
            );
            "#,
        )?;
        Ok(())
    }

    /// 按 translated_name 精确查找
    pub fn find_by_key(&self, translated_name: &str) -> AppResult<Option<CompanyRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT * FROM company WHERE translated_name = ?1",
                [translated_name],
                read_record,
            )
            .optional()?;
        Ok(record)
    }

    /// 已存在则覆盖全部结果列，否则插入新行
    pub fn upsert(
        &self,
        info: &BasicCompanyInfo,
        result: &CompanyFinancialsAndRelations,
    ) -> AppResult<UpsertOutcome> {
        let columns = EncodedResult::encode(result)?;

        if self.find_by_key(&info.translated_name)?.is_some() {
            info!("更新记录: {}", info.translated_name);
            self.conn.execute(
                r#"
                UPDATE company
                SET
                    display_name = ?1,
                    retrieval_date = ?2,
                    flags = ?3,
                    government_ownership_fraction = ?4,
                    historical_shareholders = ?5,
                    investments = ?6,
                    direct_shareholders = ?7,
                    beneficial_owners = ?8,
                    customers = ?9,
                    suppliers = ?10,
                    pdf_link = ?11
                WHERE translated_name = ?12
                "#,
                params![
                    result.display_name,
                    result.retrieval_date,
                    columns.flags,
                    result.government_ownership_fraction,
                    columns.historical_shareholders,
                    columns.investments,
                    columns.direct_shareholders,
                    columns.beneficial_owners,
                    columns.customers,
                    columns.suppliers,
                    result.pdf_link,
                    info.translated_name,
                ],
            )?;
            return Ok(UpsertOutcome::Updated);
        }

        info!("插入记录: {}", info.translated_name);
        self.conn.execute(
            r#"
            INSERT INTO company (
                original_chinese_name,
                translated_name,
                location_eng,
                display_name,
                retrieval_date,
                flags,
                government_ownership_fraction,
                historical_shareholders,
                investments,
                direct_shareholders,
                beneficial_owners,
                customers,
                suppliers,
                pdf_link
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                info.original_chinese_name,
                info.translated_name,
                info.location_eng,
                result.display_name,
                result.retrieval_date,
                columns.flags,
                result.government_ownership_fraction,
                columns.historical_shareholders,
                columns.investments,
                columns.direct_shareholders,
                columns.beneficial_owners,
                columns.customers,
                columns.suppliers,
                result.pdf_link,
            ],
        )?;
        Ok(UpsertOutcome::Inserted)
    }

    /// 全表读取，按插入顺序
    pub fn all_records(&self) -> AppResult<Vec<CompanyRecord>> {
        let mut stmt = self.conn.prepare("SELECT * FROM company ORDER BY rowid")?;
        let records = stmt
            .query_map([], read_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> AppResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM company", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// 列表字段编码后的文本
struct EncodedResult {
    flags: String,
    historical_shareholders: String,
    investments: String,
    direct_shareholders: String,
    beneficial_owners: String,
    customers: String,
    suppliers: String,
}

impl EncodedResult {
    fn encode(result: &CompanyFinancialsAndRelations) -> AppResult<Self> {
        Ok(Self {
            flags: encode_list(&result.flags)?,
            historical_shareholders: encode_list(&result.historical_shareholders)?,
            investments: encode_list(&result.investments)?,
            direct_shareholders: encode_list(&result.direct_shareholders)?,
            beneficial_owners: encode_list(&result.beneficial_owners)?,
            customers: encode_list(&result.customers)?,
            suppliers: encode_list(&result.suppliers)?,
        })
    }
}

/// 空列表存为空串而不是 "[]"，导出时依赖这一点
pub fn encode_list<T: Serialize>(items: &[T]) -> AppResult<String> {
    if items.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(items)?)
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<CompanyRecord> {
    let text = |name: &str| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(name)?.unwrap_or_default())
    };
    Ok(CompanyRecord {
        original_chinese_name: text("original_chinese_name")?,
        translated_name: text("translated_name")?,
        location_eng: text("location_eng")?,
        display_name: text("display_name")?,
        retrieval_date: text("retrieval_date")?,
        flags: text("flags")?,
        government_ownership_fraction: text("government_ownership_fraction")?,
        historical_shareholders: text("historical_shareholders")?,
        investments: text("investments")?,
        direct_shareholders: text("direct_shareholders")?,
        beneficial_owners: text("beneficial_owners")?,
        customers: text("customers")?,
        suppliers: text("suppliers")?,
        pdf_link: text("pdf_link")?,
    })
}
