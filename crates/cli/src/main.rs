use {
    clap::{Parser, Subcommand},
    std::path::PathBuf,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    dmbridge_config::{DEFAULT_PROFILE, Profile},
    dmbridge_metrics::MetricsRecorderConfig,
};

mod bridge_commands;

#[derive(Parser)]
#[command(name = "dmbridge", about = "dmbridge: mirror Discord DMs into a guild channel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Profile name. Each profile has its own config and database.
    #[arg(long, global = true, env = "DMBRIDGE_PROFILE", default_value = DEFAULT_PROFILE)]
    profile: String,

    /// Custom data directory (overrides the platform default).
    #[arg(long, global = true, env = "DMBRIDGE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Serve Prometheus metrics on this address.
    #[cfg(feature = "prometheus")]
    #[arg(long, global = true, env = "DMBRIDGE_METRICS_ADDR")]
    metrics_addr: Option<std::net::SocketAddr>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the bridge (default when no subcommand is provided).
    Run,
    /// Create the profile directory and a config template.
    Init,
    /// Drop records whose mirror was deleted while the bridge was offline.
    Reconcile {
        /// Maximum number of records to check, oldest first.
        #[arg(long, default_value_t = 1000)]
        limit: usize,
        /// Report what would be pruned without deleting anything.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn init_metrics(cli: &Cli) -> anyhow::Result<()> {
    #[cfg(feature = "prometheus")]
    let listen = cli.metrics_addr;
    #[cfg(not(feature = "prometheus"))]
    let listen = None;

    dmbridge_metrics::init_metrics(MetricsRecorderConfig {
        listen,
        global_labels: vec![("profile".into(), cli.profile.clone())],
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        profile = %cli.profile,
        "dmbridge starting"
    );

    let profile = Profile::resolve(cli.data_dir.as_deref(), &cli.profile)?;

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Run => {
            init_metrics(&cli)?;
            bridge_commands::run(&profile).await
        },
        Commands::Init => bridge_commands::init(&profile),
        Commands::Reconcile {
            limit,
            dry_run,
            json,
        } => bridge_commands::reconcile(&profile, *limit, *dry_run, *json).await,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["dmbridge"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.profile, DEFAULT_PROFILE);
        assert_eq!(cli.log_level, "info");
        assert!(!cli.json_logs);
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "dmbridge",
            "reconcile",
            "--dry-run",
            "--limit",
            "50",
            "--profile",
            "work",
            "--data-dir",
            "/tmp/dmbridge",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Reconcile {
                limit: 50,
                dry_run: true,
                json: false,
            })
        );
        assert_eq!(cli.profile, "work");
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/dmbridge")));
    }

    #[test]
    fn reconcile_defaults() {
        let cli = Cli::try_parse_from(["dmbridge", "reconcile"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Reconcile {
                limit: 1000,
                dry_run: false,
                json: false,
            })
        );
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["dmbridge", "serve"]).is_err());
    }
}
