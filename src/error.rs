use thiserror::Error;

/// 应用程序错误类型
///
/// 存储层和表格层返回 `AppResult`，流程层统一使用 `anyhow::Result`
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入文件无法读取或格式错误（致命，终止本次运行）
    #[error("输入文件解析失败 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// 导出文件写入失败
    #[error("导出文件写入失败 ({path}): {source}")]
    Export {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// 文件操作错误
    #[error("文件操作失败 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 数据库错误
    #[error("数据库错误: {0}")]
    Storage(#[from] rusqlite::Error),

    /// JSON 序列化 / 反序列化失败
    #[error("JSON处理失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// 会话状态文件错误
    #[error("会话状态错误 ({path}): {message}")]
    Session { path: String, message: String },
}

impl AppError {
    /// 创建输入解析错误
    pub fn parse(path: impl Into<String>, source: csv::Error) -> Self {
        AppError::Parse {
            path: path.into(),
            source,
        }
    }

    /// 创建文件操作错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
