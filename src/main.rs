use bank_rates_lib::config::{Cli, RunConfig};
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // .env may carry RUST_LOG
    dotenvy::dotenv().ok();
    bank_rates_lib::init_logging();

    let config = RunConfig::from_cli(Cli::parse());
    bank_rates_lib::run(config).await?;
    Ok(())
}
