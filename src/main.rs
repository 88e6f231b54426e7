use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use company_scrape::utils::logging;
use company_scrape::{App, Config};

#[derive(Parser, Debug)]
#[command(name = "company_scrape", about = "Search companies listed in a CSV file and store the results")]
struct Cli {
    /// CSV file with original_chinese_name, translated_name, location_eng columns
    #[arg(value_name = "PATH")]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // 初始化日志
    logging::init();

    let cli = Cli::parse();
    let Some(input) = cli.input else {
        println!("Please provide a path to a csv file.");
        return Ok(());
    };

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    App::initialize(config).await?.run(&input).await?;

    Ok(())
}
