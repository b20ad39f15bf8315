#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use triad_bench::config::BenchConfig;
use triad_bench::runner::BenchmarkRunner;

#[derive(Parser)]
#[command(name = "triad", version, about = "LLM benchmark: analyze -> solve -> verify")]
struct Cli {
    /// Provider configuration file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Directory of prompt JSON files
    #[arg(long, default_value = "prompts")]
    prompts_dir: PathBuf,

    /// List available prompt files and exit
    #[arg(long)]
    list: bool,

    /// Run only the named prompt file
    #[arg(long)]
    prompt: Option<String>,

    /// Re-run combinations that already completed
    #[arg(long)]
    rerun: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = BenchConfig::load(&cli.config, &cli.prompts_dir)?;

    if cli.list {
        println!("Available prompt files:");
        for name in config.available_prompts() {
            println!("  {name}");
        }
        return Ok(());
    }

    if let Some(name) = &cli.prompt {
        if !config.select_prompt(name) {
            eprintln!("unknown prompt file: {name}");
            eprintln!("available: {}", config.available_prompts().join(", "));
            return Err("prompt not found".into());
        }
    }

    if config.available_prompts().is_empty() {
        return Err(format!(
            "no prompt files found in {}",
            cli.prompts_dir.display()
        )
        .into());
    }

    let mut runner = BenchmarkRunner::new(config, cli.rerun);
    let report = runner.run().await?;
    tracing::info!(
        snapshot = %report.snapshot_path.display(),
        successful = report.summary.successful,
        failed = report.summary.failed,
        "benchmark complete"
    );
    Ok(())
}
