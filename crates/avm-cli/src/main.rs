mod aggregate;
mod analyze;
mod collect;
mod patterns;
mod report;
mod shared;

use std::path::PathBuf;

use avm_core::Scope;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "avm")]
#[command(about = "Brand visibility metrics for LLM answers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the match patterns generated for a brand name
    Patterns {
        name: String,

        /// Extra aliases matched in addition to the generated patterns
        #[arg(long = "alias")]
        aliases: Vec<String>,
    },
    /// Analyze one saved answer offline and print its metrics as JSON
    Analyze {
        /// File holding the raw answer text
        #[arg(long)]
        file: PathBuf,

        #[arg(long, default_value = "manual")]
        platform: String,

        #[arg(long)]
        topic: Option<String>,

        #[arg(long)]
        persona: Option<String>,

        /// Prompt that produced the answer, stored with the record
        #[arg(long, default_value = "")]
        prompt: String,
    },
    /// Ask every configured platform every prompt, analyze, and store the results
    Collect {
        /// Restrict collection to one platform id
        #[arg(long)]
        platform: Option<String>,

        /// Print the prompt × platform plan without calling any platform
        #[arg(long)]
        dry_run: bool,
    },
    /// Recompute and replace aggregated metrics for every scope
    Aggregate,
    /// Print ranked metrics for one scope
    Report {
        #[arg(long, default_value = "overall")]
        scope: Scope,

        /// Partition value; defaults to `all` for the overall scope
        #[arg(long)]
        value: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = avm_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Patterns { name, aliases }) => {
            patterns::run_patterns(&name, &aliases);
        }
        Some(Commands::Analyze {
            file,
            platform,
            topic,
            persona,
            prompt,
        }) => {
            let request = analyze::AnalyzeRequest {
                file,
                platform,
                topic,
                persona,
                prompt,
            };
            analyze::run_analyze(&config, &request)?;
        }
        Some(Commands::Collect { platform, dry_run }) => {
            collect::run_collect(&config, platform.as_deref(), dry_run).await?;
        }
        Some(Commands::Aggregate) => {
            let pool = shared::connect_database(&config).await?;
            aggregate::run_aggregate(&pool, &config).await?;
        }
        Some(Commands::Report { scope, value, json }) => {
            let pool = shared::connect_database(&config).await?;
            report::run_report(&pool, scope, value.as_deref(), json).await?;
        }
        None => println!("avm: no command given; see `avm --help`"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
