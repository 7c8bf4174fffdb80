use clap::Parser;
use rootly_bff::cli::utils::{error_code, output_error};
use rootly_bff::cli::{Cli, OutputFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("ROOTLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = OutputFormat::from_cli(&cli);

    if let Err(e) = rootly_bff::cli::run(cli).await {
        let message = match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => format!("{e:?}"),
            _ => e.to_string(),
        };
        output_error(&output, &message, error_code(&e).as_deref())?;
        std::process::exit(1);
    }

    Ok(())
}
