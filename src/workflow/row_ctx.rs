//! 行处理上下文
//!
//! 封装"我正在用哪个站点处理第几家公司"这一信息

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 站点 key
    pub site_key: &'static str,

    /// 行号（从1开始，仅用于日志显示）
    pub row_index: usize,

    /// 本次处理的总行数
    pub total_rows: usize,

    /// 公司英文名（记录主键）
    pub translated_name: String,
}

impl RowCtx {
    pub fn new(
        site_key: &'static str,
        row_index: usize,
        total_rows: usize,
        translated_name: impl Into<String>,
    ) -> Self {
        Self {
            site_key,
            row_index,
            total_rows,
            translated_name: translated_name.into(),
        }
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} #{}/{} {}]",
            self.site_key, self.row_index, self.total_rows, self.translated_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefix() {
        let ctx = RowCtx::new("wirescreen", 3, 200, "Acme");
        assert_eq!(ctx.to_string(), "[wirescreen #3/200 Acme]");
    }
}
