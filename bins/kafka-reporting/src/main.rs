mod cmd;
mod config;
mod env;
mod error;

use clap::Parser;
use config::{Cli, Commands, Effective};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let eff = match Effective::new(&cli) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Archive(args) => cmd::archive::run(args, &eff).await,
        Commands::Get(args) => cmd::get::run(args, &eff).await,
        Commands::Status(_) => cmd::status::run(&eff).await,
        Commands::HelloWorld(args) => cmd::hello_world::run(args, &eff).await,
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
