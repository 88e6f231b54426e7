use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 站点登录凭据
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 等待与超时策略
///
/// 所有固定延迟都集中在这里，测试中可以替换成很小的值
#[derive(Clone, Debug)]
pub struct TimeoutPolicy {
    /// 等待搜索结果或 "No results" 出现的上限
    pub search_timeout: Duration,
    /// 打开详情页后持续收集网络响应的时长
    pub settle_delay: Duration,
    /// 等待详情页标题的上限
    pub heading_timeout: Duration,
    /// 等待导出标签页弹出的上限
    pub popup_timeout: Duration,
    /// 导出标签页加载后渲染 PDF 前的等待
    pub pdf_render_delay: Duration,
    /// 登录前后的等待
    pub login_settle: Duration,
    /// 两行之间的限速等待
    pub row_delay: Duration,
    /// 轮询页面元素的间隔
    pub poll_interval: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            search_timeout: Duration::from_millis(6000),
            settle_delay: Duration::from_millis(6000),
            heading_timeout: Duration::from_millis(8000),
            popup_timeout: Duration::from_millis(10000),
            pdf_render_delay: Duration::from_millis(8000),
            login_settle: Duration::from_millis(2000),
            row_delay: Duration::from_millis(5000),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite 数据库文件
    pub database_path: PathBuf,
    /// 导出目录
    pub output_dir: PathBuf,
    /// PDF 保存目录，未设置时跳过 PDF 导出
    pub pdf_dir: Option<PathBuf>,
    /// 是否无头模式运行浏览器
    pub headless: bool,
    /// 自定义 Chrome 可执行文件路径
    pub chrome_executable: Option<PathBuf>,
    /// 每个站点最多处理的行数
    pub max_rows: usize,
    /// 站点登录凭据
    pub credentials: Option<Credentials>,
    pub timeouts: TimeoutPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("database.db"),
            output_dir: PathBuf::from("output"),
            pdf_dir: None,
            headless: false,
            chrome_executable: None,
            max_rows: 200,
            credentials: None,
            timeouts: TimeoutPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        let t = default.timeouts;
        Self {
            database_path: std::env::var("DATABASE_PATH").map(PathBuf::from).unwrap_or(default.database_path),
            output_dir: std::env::var("OUTPUT_DIR").map(PathBuf::from).unwrap_or(default.output_dir),
            pdf_dir: non_empty_var("PDF_PATH").map(PathBuf::from),
            headless: parsed_var("HEADLESS").unwrap_or(default.headless),
            chrome_executable: non_empty_var("CHROME_PATH").map(PathBuf::from),
            max_rows: parsed_var("MAX_ROWS").unwrap_or(default.max_rows),
            credentials: match (non_empty_var("WIRESCREEN_USERNAME"), non_empty_var("PASSWORD")) {
                (Some(username), Some(password)) => Some(Credentials { username, password }),
                _ => None,
            },
            timeouts: TimeoutPolicy {
                search_timeout: millis_var("SEARCH_TIMEOUT_MS").unwrap_or(t.search_timeout),
                settle_delay: millis_var("SETTLE_DELAY_MS").unwrap_or(t.settle_delay),
                heading_timeout: millis_var("HEADING_TIMEOUT_MS").unwrap_or(t.heading_timeout),
                popup_timeout: millis_var("POPUP_TIMEOUT_MS").unwrap_or(t.popup_timeout),
                pdf_render_delay: millis_var("PDF_RENDER_DELAY_MS").unwrap_or(t.pdf_render_delay),
                login_settle: millis_var("LOGIN_SETTLE_MS").unwrap_or(t.login_settle),
                row_delay: millis_var("ROW_DELAY_MS").unwrap_or(t.row_delay),
                poll_interval: millis_var("POLL_INTERVAL_MS").unwrap_or(t.poll_interval),
            },
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn millis_var(name: &str) -> Option<Duration> {
    parsed_var::<u64>(name).map(Duration::from_millis)
}
