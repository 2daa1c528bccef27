use anyhow::Result;
use clap::Parser;
use khata::cli::Cli;
use khata::config::Config;
use khata::logger::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    let cli = Cli::parse();
    init_logger(cli.log_level(&config), config.log_dir.as_deref());

    cli.run(config).await
}
