use anyhow::Result;
use clap::Parser;
use tracing::error;

use clip_uploader::cli::{Cli, Commands};
use clip_uploader::utils::logging;
use clip_uploader::{App, ClipPreparer, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logging::init(&config.log_file, cli.verbose || config.verbose_logging);

    let result = run(cli.command(), config).await;
    if let Err(e) = &result {
        error!("❌ 运行终止: {}", e);
    }
    result
}

async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Upload => {
            App::initialize(config).await?.run().await?;
        }
        Commands::Prepare => {
            ClipPreparer::new(&config).run().await?;
        }
    }
    Ok(())
}
