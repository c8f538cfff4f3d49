mod commands;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use ecoquest_engine::{
    EngineConfig, Notification, PersistenceMode, ProofSubmission, RecordingNotifier, Session,
    StorageProfileClient,
};
use ecoquest_storage::FileStorage;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// EcoQuest sustainability challenge tracker.
#[derive(Parser)]
#[command(name = "ecoquest", version, about = "EcoQuest sustainability challenge tracker")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress notifications and non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Enable debug logging on stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Directory holding progress and account records
    #[arg(long, global = true, default_value = ".ecoquest")]
    data_dir: PathBuf,

    /// Engine config file (default: <data-dir>/ecoquest.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available challenges
    Challenges,

    /// Show a challenge's tasks and progress
    Show {
        /// Challenge id, e.g. water-conservation
        challenge: String,
    },

    /// Start a challenge
    Start {
        /// Challenge id
        challenge: String,
    },

    /// Complete a task
    Complete {
        /// Challenge id
        challenge: String,
        /// Task id, e.g. tooth-brushing
        task: String,
        /// Data or text proof
        #[arg(long, conflicts_with = "photo")]
        proof: Option<String>,
        /// Confirm a photo was taken
        #[arg(long)]
        photo: bool,
    },

    /// Show points, level, impact and badges
    Account,

    /// Reset the account and all challenge progress
    Reset {
        /// Skip confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to start runtime: {}", e), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    if let Err(msg) = rt.block_on(run(&cli)) {
        report_error(&msg, cli.output, cli.quiet);
        process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<(), String> {
    if let Commands::Challenges = cli.command {
        commands::catalog::cmd_challenges(cli.output);
        return Ok(());
    }

    let notifier = Arc::new(RecordingNotifier::new());
    let session = open_session(cli, notifier.clone()).await?;

    let result = match &cli.command {
        Commands::Challenges => Ok(()),
        Commands::Show { challenge } => {
            commands::catalog::cmd_show(&session, challenge, cli.output).await
        }
        Commands::Start { challenge } => {
            commands::progress::cmd_start(&session, challenge, cli.output).await
        }
        Commands::Complete {
            challenge,
            task,
            proof,
            photo,
        } => {
            let submission = match (proof, photo) {
                (Some(text), _) => Some(ProofSubmission::text(text.clone())),
                (None, true) => Some(ProofSubmission::photo()),
                (None, false) => None,
            };
            commands::progress::cmd_complete(&session, challenge, task, submission, cli.output)
                .await
        }
        Commands::Account => commands::account::cmd_account(&session, cli.output).await,
        Commands::Reset { yes } => commands::account::cmd_reset(&session, *yes, cli.output).await,
    };

    session.shutdown().await;
    if !cli.quiet && cli.output == OutputFormat::Text {
        print_notifications(&notifier.drain());
    }
    result
}

async fn open_session(cli: &Cli, notifier: Arc<RecordingNotifier>) -> Result<Session, String> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("ecoquest.toml"));
    let config = EngineConfig::load(&config_path).map_err(|e| e.to_string())?;
    let storage = open_storage(&cli.data_dir).await?;

    let mut builder = Session::builder()
        .storage(Arc::new(storage))
        .notifier(notifier);
    if config.persistence.mode == PersistenceMode::Remote {
        let profiles = open_storage(&cli.data_dir.join("profiles")).await?;
        builder = builder.profile_client(Arc::new(StorageProfileClient::new(Arc::new(profiles))));
    }
    builder
        .config(config)
        .start()
        .await
        .map_err(|e| e.to_string())
}

async fn open_storage(dir: &Path) -> Result<FileStorage, String> {
    FileStorage::open(dir)
        .await
        .map_err(|e| format!("could not open data directory '{}': {}", dir.display(), e))
}

fn print_notifications(notifications: &[Notification]) {
    for n in notifications {
        println!("{}: {}", n.title, n.description);
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

pub(crate) fn print_json(value: &serde_json::Value) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e));
    println!("{}", pretty);
}
