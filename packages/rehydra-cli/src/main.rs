use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rehydra_conformance::{ReferenceSut, basic_cases};
use rehydra_harness::{Runner, RunnerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rehydra")]
#[command(about = "Hydration conformance runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the conformance corpus against the reference engine
    Run {
        /// Only run cases whose name contains this text
        #[arg(long)]
        filter: Option<String>,
        /// Skip re-applying each step's arguments a second time
        #[arg(long)]
        no_idempotence: bool,
        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List registered cases in run order
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let registry = basic_cases()?;
    tracing::debug!(cases = registry.len(), "loaded conformance corpus");

    match cli.command {
        Commands::List => {
            for case in registry.iter() {
                let marker = if case.is_skipped() { " (skip)" } else { "" };
                println!("{}{marker}", case.name());
            }
        }
        Commands::Run {
            filter,
            no_idempotence,
            format,
        } => {
            let runner = Runner::new(RunnerConfig {
                filter,
                verify_idempotence: !no_idempotence,
            });
            let reports = runner.run(&registry, &mut ReferenceSut::new());
            match format {
                Format::Text => println!("{reports}"),
                Format::Json => println!("{}", serde_json::to_string_pretty(&reports.to_json())?),
            }

            let summary = reports.summary();
            if summary.failed > 0 {
                anyhow::bail!("{} of {} cases failed", summary.failed, reports.reports.len());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "rehydra",
            "run",
            "--filter",
            "array",
            "--no-idempotence",
            "--format",
            "json",
        ]);
        let Commands::Run {
            filter,
            no_idempotence,
            format,
        } = cli.command
        else {
            panic!("expected the run command");
        };
        assert_eq!(filter.as_deref(), Some("array"));
        assert!(no_idempotence);
        assert!(matches!(format, Format::Json));
    }
}
