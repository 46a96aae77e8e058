//! ADP Ingest - Archival deposit tool

use adp_common::logging::{init_logging, LogConfig, LogLevel};
use adp_common::Report;
use adp_ingest::config::IngestConfig;
use adp_ingest::engine::{IngestEngine, IngestOptions};
use adp_ingest::registrar::client::RegistrarClient;
use adp_ingest::repository::client::RepositoryClient;
use adp_ingest::transaction::IngestLock;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "adp-ingest")]
#[command(author, version, about = "ADP archival deposit tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Deposit a submission package into the repository
    Deposit {
        /// Package root directory
        package: PathBuf,

        /// Version records whose titles already exist instead of failing
        #[arg(short, long)]
        update: bool,

        /// Make files public by default when no mapping document exists
        #[arg(long)]
        public_files: bool,

        /// Split private files into dedicated sibling records
        #[arg(long)]
        separate_private: bool,

        /// Walk into children of up-to-date records
        #[arg(long)]
        full_walk: bool,

        /// Leave everything in draft state
        #[arg(long)]
        no_publish: bool,

        /// Identifier prefix; overrides ADP_IDENTIFIER_PREFIX
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Download a published record tree
    Download {
        /// Record id to download
        record: String,

        /// Output directory
        #[arg(short, long, default_value = "./download")]
        output: PathBuf,
    },

    /// Delete every draft record owned by this account
    DeleteDrafts,
}

/// Logging settings come from the environment; the verbose flag is an
/// explicit request and wins over it, and the binary picks its own file
/// prefix unless the environment set one.
fn resolve_log_config(verbose: bool) -> Result<LogConfig> {
    let mut config = LogConfig::from_env()?;
    if config.log_file_prefix == LogConfig::default().log_file_prefix {
        config.log_file_prefix = "adp-ingest".to_string();
    }
    if verbose {
        config.level = LogLevel::Debug;
    }
    Ok(config)
}

fn build_engine(config: &IngestConfig) -> Result<IngestEngine> {
    let repository = RepositoryClient::new(
        config.repository_url.clone(),
        config.repository_token.clone(),
    )?;
    let mut builder = IngestEngine::builder(repository)
        .lock(IngestLock::new(Duration::from_secs(config.lock_timeout_secs)));

    if let (Some(url), Some(user), Some(password)) = (
        config.registrar_url.clone(),
        config.registrar_user.clone(),
        config.registrar_password.clone(),
    ) {
        builder = builder.registrar(RegistrarClient::new(url, user, password)?);
    }
    Ok(builder.build())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = resolve_log_config(cli.verbose)?;
    init_logging(&log_config)?;

    let config = IngestConfig::from_env()?;
    let engine = build_engine(&config)?;
    let mut report = Report::new();

    let result = match cli.command {
        Command::Deposit {
            package,
            update,
            public_files,
            separate_private,
            full_walk,
            no_publish,
            prefix,
        } => {
            let options = IngestOptions {
                files_public_by_default: public_files,
                separate_private_records: separate_private,
                update_existing: update,
                skip_unchanged_subtrees: !full_walk,
                publish_records: !no_publish,
                publish_identifiers: !no_publish,
                identifier_prefix: prefix.or_else(|| config.identifier_prefix.clone()),
                depositor: config.depositor.clone(),
            };
            info!(package = %package.display(), "depositing package");
            engine
                .deposit(&package, &options, &mut report)
                .await
                .map(|root| info!(%root, "deposit finished"))
        },
        Command::Download { record, output } => {
            info!(record, "downloading record tree");
            engine
                .download(&record, &output, &mut report)
                .await
                .map(|files| info!(files, "download finished"))
        },
        Command::DeleteDrafts => engine
            .delete_drafts(&mut report)
            .await
            .map(|count| info!(count, "drafts deleted")),
    };

    print!("{}", report.summary());
    result?;
    Ok(())
}
