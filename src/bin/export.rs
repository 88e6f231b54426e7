use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use company_scrape::utils::logging;
use company_scrape::{run_export, Config};

#[derive(Parser, Debug)]
#[command(name = "export", about = "Export stored company records to a dated CSV file")]
struct Cli {
    /// SQLite database to read (defaults to DATABASE_PATH or database.db)
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Directory for the CSV file (defaults to OUTPUT_DIR or output)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let path = run_export(&config, chrono::Utc::now().date_naive())?;
    println!("{}", path.display());
    Ok(())
}
