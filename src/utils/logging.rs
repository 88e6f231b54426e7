/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器
///
/// 优先使用 `RUST_LOG`，未设置时默认 `info`。重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `input`: 输入文件路径
/// - `rows`: 本次处理的行数
/// - `total`: 输入文件中的总行数
pub fn log_startup(input: &str, rows: usize, total: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 公司信息抓取");
    info!("📁 输入文件: {}", input);
    info!("📋 处理 {}/{} 行", rows, total);
    info!("{}", "=".repeat(60));
}

/// 记录站点开始处理
pub fn log_adapter_start(site_key: &str, session_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("🌐 开始处理站点: {}", site_key);
    info!("💾 会话文件: {}", session_file);
    info!("{}", "=".repeat(60));
}

pub fn log_row_start(row_index: usize, total: usize, translated_name: &str) {
    info!("\n{}", "─".repeat(60));
    info!("🔍 [{}/{}] {}", row_index, total, translated_name);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `inserted`: 新插入的记录数
/// - `updated`: 覆盖更新的记录数
/// - `no_data`: 没有搜索结果的行数
/// - `failed`: 提取出错的行数
/// - `database`: 数据库文件路径
pub fn print_final_stats(
    inserted: usize,
    updated: usize,
    no_data: usize,
    failed: usize,
    database: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🆕 新增: {}", inserted);
    info!("♻️ 更新: {}", updated);
    info!("∅ 无数据: {}", no_data);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n数据已保存至: {}", database);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
