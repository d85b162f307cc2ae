//! CLI entry point for consistent-hash-rs.

use clap::Parser;
use cli::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    let result = config.run()?;
    println!("{result}");
    Ok(())
}
