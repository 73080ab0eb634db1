//! BucketSend CLI entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bucketsend_channels::{CopyGenClient, TemplateGenerator, TwilioSender};
use bucketsend_core::config::BucketSendConfig;
use bucketsend_core::traits::MessageGenerator;
use bucketsend_core::types::{OwnerProfile, SendCandidate, SmartBucket, BUCKET_STATUS_ACTIVE};
use bucketsend_engine::{run_pipeline, Collaborators};
use bucketsend_gateway::AppState;
use bucketsend_scheduler::week::iso_week_string;
use bucketsend_store::SqliteStore;

#[derive(Parser)]
#[command(name = "bucketsend", version, about = "Batch-window SMS nudge dispatcher")]
struct Cli {
    /// Config file path (default: ~/.bucketsend/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP trigger gateway (default).
    Serve,
    /// Run the pipeline once and print the report as JSON.
    Run,
    /// Insert a demo bucket and profile for the current ISO week.
    Seed,
}

fn load_config(cli: &Cli) -> anyhow::Result<BucketSendConfig> {
    match &cli.config {
        Some(path) => BucketSendConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => BucketSendConfig::load().context("loading config"),
    }
}

/// Wire the production collaborators: SQLite stores, Twilio, and the
/// copy generator (falling back to the local template when no
/// generation endpoint is configured).
fn wire_collaborators(config: &BucketSendConfig) -> anyhow::Result<(Collaborators, Arc<SqliteStore>)> {
    let store = Arc::new(
        SqliteStore::open(&config.store.db_path()).context("opening bucket store")?,
    );

    let copygen: Arc<dyn MessageGenerator> = if config.copygen.endpoint.is_empty() {
        tracing::warn!("⚠️ No copygen endpoint configured, using the local template generator");
        Arc::new(TemplateGenerator::default())
    } else {
        Arc::new(CopyGenClient::new(config.copygen.clone()))
    };

    let collaborators = Collaborators {
        buckets: store.clone(),
        ledger: store.clone(),
        profiles: store.clone(),
        aggregates: store.clone(),
        copygen,
        sms: Arc::new(TwilioSender::new(config.sms.clone())),
    };
    Ok((collaborators, store))
}

fn seed_demo(config: &BucketSendConfig, store: &SqliteStore) -> anyhow::Result<()> {
    let tz: chrono_tz::Tz = config
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone {}", config.timezone))?;
    let today = chrono::Utc::now().with_timezone(&tz).date_naive();
    let iso_week = iso_week_string(today);

    store.put_profile(
        "demo-owner",
        &OwnerProfile {
            full_name: "Demo Barber".into(),
            email: "demo@example.com".into(),
            phone: "+15550100".into(),
            username: "demo-shop".into(),
        },
    )?;
    store.put_bucket(&SmartBucket {
        id: "demo-bucket".into(),
        user_id: "demo-owner".into(),
        iso_week: iso_week.clone(),
        status: BUCKET_STATUS_ACTIVE.into(),
        clients: vec![
            SendCandidate {
                client_id: "demo-client-1".into(),
                name: "Alex".into(),
                phone: "+15550101".into(),
                bucket_tag: "Any-day|Any-time".into(),
                nudge_token: Some("demo-token".into()),
            },
            SendCandidate {
                client_id: "demo-client-2".into(),
                name: "Sam".into(),
                phone: "+15550102".into(),
                bucket_tag: "Friday|Night".into(),
                nudge_token: None,
            },
        ],
        messages_failed: vec![],
    })?;

    println!("Seeded demo bucket for {iso_week}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let (collaborators, store) = wire_collaborators(&config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let state = AppState {
                config: Arc::new(config),
                collaborators,
                start_time: std::time::Instant::now(),
            };
            bucketsend_gateway::serve(state).await.context("gateway failed")?;
        }
        Command::Run => {
            let report = run_pipeline(&config, &collaborators).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Seed => {
            seed_demo(&config, &store)?;
        }
    }

    Ok(())
}
