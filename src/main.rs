//! `kraken-import` CLI
//!
//! - `accounts`: list configured accounts and their checkpoints
//! - `fetch`: import history for one or all accounts, writing normalized
//!   records to stdout as JSON lines

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

use kraken_import::config::{AccountConfig, AppConfig, CheckpointStore};
use kraken_import::fetcher::Fetcher;
use kraken_import::host::{HostBoundary, LocalHost};
use kraken_import::http::{KrakenHttp, RateLimiter};
use kraken_import::logging::{self, LogConfig};
use kraken_import::submit::{JsonLinesSubmitter, Submitter};

#[derive(Parser)]
#[command(name = "kraken-import")]
#[command(about = "Import Kraken trades, transfers and ledger history")]
#[command(version)]
struct Cli {
    /// YAML config file; `KRAKEN_IMPORT__*` variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured accounts
    Accounts,
    /// Fetch new history and print normalized records
    Fetch(FetchArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Account id or label
    #[arg(short, long, conflicts_with = "all")]
    account: Option<String>,

    /// Fetch every configured account
    #[arg(long)]
    all: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    logging::init(LogConfig::from_env(config.debug)).map_err(|e| anyhow!(e))?;

    let host = LocalHost::new(config.clone());
    host.start().await?;

    let result = match cli.command {
        Commands::Accounts => list_accounts(&host).await,
        Commands::Fetch(args) => fetch(&config, &host, args).await,
    };

    host.stop().await?;
    result
}

async fn list_accounts(host: &LocalHost) -> Result<()> {
    let checkpoints = host.config().checkpoints();
    for account in host.settings().await? {
        let last = checkpoints
            .get(&account)?
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!("{}\t{}\t{}", account.id, account.label, last);
    }
    Ok(())
}

async fn fetch(config: &AppConfig, host: &LocalHost, args: FetchArgs) -> Result<()> {
    let accounts = host.settings().await?;
    let selected: Vec<AccountConfig> = match (&args.account, args.all) {
        (Some(key), _) => vec![config.account(key)?.clone()],
        (None, true) => accounts,
        (None, false) if accounts.len() == 1 => accounts,
        (None, false) => bail!("{} accounts configured, pass --account or --all", accounts.len()),
    };

    // One budget for every account fetched by this process.
    let limiter = Arc::new(config.rate_limit.limiter());
    let submitter: Arc<dyn Submitter> = Arc::new(JsonLinesSubmitter::stdout());
    let checkpoints = config.checkpoints();

    let mut tasks = JoinSet::new();
    for account in selected {
        let config = config.clone();
        let limiter = limiter.clone();
        let submitter = submitter.clone();
        let checkpoints = checkpoints.clone();
        tasks.spawn(async move {
            let label = account.label.clone();
            let result = fetch_account(&config, &account, limiter, submitter, &checkpoints).await;
            (label, result)
        });
    }

    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        let (label, result) = joined?;
        if let Err(e) = result {
            tracing::error!(account = %label, "{:#}", e);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} account(s) failed", failed);
    }
    Ok(())
}

async fn fetch_account(
    config: &AppConfig,
    account: &AccountConfig,
    limiter: Arc<RateLimiter>,
    submitter: Arc<dyn Submitter>,
    checkpoints: &CheckpointStore,
) -> Result<()> {
    let http = KrakenHttp::builder()
        .base_url(&config.api_url)
        .signer(account.signer()?)
        .build()?;

    let fetcher = Fetcher::builder(account.label.clone(), http, submitter)
        .limiter(limiter)
        .cache_dir(config.cache_dir.clone())
        .plugin(config.plugin.clone())
        .build()
        .await
        .with_context(|| format!("loading asset directory for {}", account.label))?;

    let checkpoint = checkpoints.get(account)?;
    let report = fetcher.run(checkpoint).await?;

    if report.is_complete() {
        checkpoints.set(&account.id, report.started_at)?;
        tracing::info!(
            account = %account.label,
            transfers = report.ledger.processed,
            conversions = report.ledger.synthesized,
            trades = report.trades.processed,
            "Checkpoint advanced"
        );
    } else {
        tracing::warn!(account = %account.label, "Run stopped early, checkpoint kept");
    }
    Ok(())
}
