//! ledger-node — the ledger service binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the persistent store
//!   2. Seed the default holder type if the store is fresh
//!   3. Spawn the background sweeper and collapse tasks
//!   4. Start the HTTP API server
//!
//! `sweep` and `collapse` subcommands run a single pass against an existing
//! store and exit, for driving the same operations from an external
//! scheduler instead of the built-in background tasks.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use ledger_auth::HmacConfig;
use ledger_core::HolderType;
use ledger_store::Store;

#[derive(Parser, Debug)]
#[command(name = "ledger-node", version, about = "Multi-tenant in-game currency ledger")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory for the persistent store.
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = "~/.ledger/data")]
    data_dir: PathBuf,

    /// HTTP listen address.
    #[arg(long, env = "LEDGER_BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind_addr: SocketAddr,

    /// Slug of the holder type created for holders on first write if none is given.
    #[arg(long, env = "CURRENCY_DEFAULT_HOLDER_TYPE_SLUG", default_value = "player")]
    default_holder_type_slug: String,

    /// Default auto-reject timeout, in seconds, for create requests that omit one.
    #[arg(long, env = "DEFAULT_AUTO_REJECT_TIMEDELTA", default_value_t = 900)]
    default_auto_reject_seconds: i64,

    /// Skip HMAC signature validation entirely (test/dev convenience).
    #[arg(long, env = "ENABLE_HMAC_VALIDATION", default_value_t = true)]
    enable_hmac_validation: bool,

    /// Allowed clock skew, in seconds, between a request's timestamp and now.
    #[arg(long, env = "HMAC_TIMESTAMP_DEVIATION", default_value_t = 30)]
    hmac_timestamp_deviation: i64,

    /// Hash algorithm backing HMAC signatures. Only "sha256" is implemented.
    #[arg(long, env = "HMAC_HASH_TYPE", default_value = "sha256")]
    hmac_hash_type: String,

    #[arg(long, env = "SERVICE_HEADER", default_value = "X-SERVICE")]
    service_header: String,

    #[arg(long, env = "HMAC_SIGNATURE_HEADER", default_value = "X-SIGNATURE")]
    hmac_signature_header: String,

    #[arg(long, env = "HMAC_TIMESTAMP_HEADER", default_value = "X-SIGNATURE-TIMESTAMP")]
    hmac_timestamp_header: String,

    #[arg(long, env = "BATTLEMETRICS_SIGNATURE_REGEX", default_value = r"s=([A-Za-z0-9_]+)")]
    battlemetrics_signature_regex: String,

    #[arg(long, env = "BATTLEMETRICS_TIMESTAMP_REGEX", default_value = r"t=([\w\-:.+]+)")]
    battlemetrics_timestamp_regex: String,

    /// How many days of confirmed/rejected history the collapse background
    /// task leaves untouched.
    #[arg(long, env = "COLLAPSE_OLDER_THAN_DAYS", default_value_t = 365)]
    collapse_older_than_days: i64,

    /// How often, in seconds, the background sweeper task runs. The
    /// background collapse task runs at this interval or hourly, whichever
    /// is longer.
    #[arg(long, env = "BACKGROUND_INTERVAL_SECONDS", default_value_t = 60)]
    background_interval_seconds: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reject every PENDING transaction past its deadline, once, then exit.
    Sweep,
    /// Run the collapse procedure for the given services, once, then exit.
    Collapse {
        /// Service names to collapse history for.
        #[arg(long, value_delimiter = ',')]
        services: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ledger=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    if args.hmac_hash_type != "sha256" {
        warn!(requested = %args.hmac_hash_type, "only sha256 is implemented; ignoring HMAC_HASH_TYPE");
    }

    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let store = Arc::new(Store::open(&data_dir).context("opening store")?);

    if store.get_holder_type(&args.default_holder_type_slug)?.is_none() {
        info!(slug = %args.default_holder_type_slug, "seeding default holder type");
        store.put_holder_type(&HolderType::new(&args.default_holder_type_slug))?;
    }

    match args.command {
        Some(Command::Sweep) => {
            let report = ledger_engine::sweep_all(&store)?;
            info!(
                adjustments = report.rejected_adjustments.len(),
                transfers = report.rejected_transfers.len(),
                exchanges = report.rejected_exchanges.len(),
                "sweep complete"
            );
            return Ok(());
        }
        Some(Command::Collapse { services }) => {
            let created = ledger_engine::collapse_old_transactions(
                &store,
                chrono::Duration::days(args.collapse_older_than_days),
                &services,
                5,
            )?;
            info!(summaries_created = created.len(), "collapse complete");
            return Ok(());
        }
        None => {}
    }

    let hmac_config = Arc::new(HmacConfig {
        enable_hmac_validation: args.enable_hmac_validation,
        timestamp_deviation: chrono::Duration::seconds(args.hmac_timestamp_deviation),
        service_header: args.service_header,
        signature_header: args.hmac_signature_header,
        timestamp_header: args.hmac_timestamp_header,
        battlemetrics_signature_regex: args.battlemetrics_signature_regex,
        battlemetrics_timestamp_regex: args.battlemetrics_timestamp_regex,
    });

    let state = ledger_api::AppState::new(Arc::clone(&store), hmac_config)
        .with_default_auto_reject(chrono::Duration::seconds(args.default_auto_reject_seconds));

    spawn_background_tasks(
        Arc::clone(&store),
        args.background_interval_seconds,
        args.collapse_older_than_days,
    );

    info!("ledger node ready");
    ledger_api::serve(state, args.bind_addr).await
}

/// The host process's choice of trigger for the sweeper and collapse
/// procedure: a fixed-interval ticker. An external scheduler can drive the
/// same operations instead via the `sweep`/`collapse` subcommands.
fn spawn_background_tasks(store: Arc<Store>, interval_seconds: u64, collapse_older_than_days: i64) {
    let sweep_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_seconds));
        loop {
            ticker.tick().await;
            match ledger_engine::sweep_all(&sweep_store) {
                Ok(report) => {
                    let total = report.rejected_adjustments.len()
                        + report.rejected_transfers.len()
                        + report.rejected_exchanges.len();
                    if total > 0 {
                        info!(total, "background sweep rejected outdated transactions");
                    }
                }
                Err(e) => warn!(error = %e, "background sweep failed"),
            }
        }
    });

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_seconds.max(3600)));
        loop {
            ticker.tick().await;
            let service_names: Vec<String> = match store.iter_services() {
                Ok(services) => services.into_iter().map(|s| s.name).collect(),
                Err(e) => {
                    warn!(error = %e, "background collapse failed to list services");
                    continue;
                }
            };
            match ledger_engine::collapse_old_transactions(
                &store,
                chrono::Duration::days(collapse_older_than_days),
                &service_names,
                5,
            ) {
                Ok(created) if !created.is_empty() => {
                    info!(summaries_created = created.len(), "background collapse ran")
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "background collapse failed"),
            }
        }
    });
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
