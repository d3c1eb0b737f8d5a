mod cli;
mod engine;
mod error;
mod model;
mod orchestrator;
mod storage;
mod text_summary;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = cli::Cli::parse();
    let is_batch = args.is_batch();

    match cli::run(args).await {
        Ok(()) => {
            // Explicit exit code for scripted (batch) runs
            if is_batch {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            if is_batch {
                eprintln!("{e:#}");
                std::process::exit(1);
            } else {
                Err(e)
            }
        }
    }
}
