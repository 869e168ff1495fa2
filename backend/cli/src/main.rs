use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info};

use innkeep_channels::{ChannelDeps, TelegramChannel};
use innkeep_docscan::VisionOcr;
use innkeep_gateway::GatewayState;
use innkeep_pms::PmsClient;
use innkeep_scheduler::DigestScheduler;
use innkeep_store::CacheStore;

#[derive(Parser)]
#[command(name = "innkeep")]
#[command(about = "innkeep — property-management automation daemon")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon: Telegram channel, webhook gateway, daily digest
    Serve {
        /// Port to bind the HTTP gateway to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check whether a local daemon is up
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = innkeep_config::from_env();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            let problems = innkeep_config::validate(&config);
            if !problems.is_empty() {
                eprintln!("Configuration problems:");
                for problem in &problems {
                    eprintln!("  - {problem}");
                }
                std::process::exit(1);
            }
            run_server(config).await?;
        }
        Commands::Status => {
            let url = format!("http://localhost:{}/api/health", config.port);
            match reqwest::get(&url).await {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("innkeep is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: innkeep_config::InnkeepConfig) -> Result<()> {
    let _log_guard = innkeep_logging::init(&config.log_dir, &config.log_level);
    info!(config = ?innkeep_config::redacted(&config), "Starting innkeep");

    let store = Arc::new(CacheStore::open(&config.db_path).context("open cache store")?);
    let pms = PmsClient::new(&config.pms_api_url, &config.pms_api_key);
    let ocr = config.vision_api_key.as_deref().map(VisionOcr::new);
    if ocr.is_none() {
        info!("VISION_API_KEY not set — document scanning disabled");
    }

    let deps = Arc::new(ChannelDeps::new(
        pms,
        Arc::clone(&store),
        ocr,
        config.telegram_allowed_users.clone(),
        &config.checkin_property_slug,
    ));
    let channel = TelegramChannel::new(&config.telegram_bot_token, Arc::clone(&deps));
    let bot = channel.bot();

    // Gateway pushes new-reservation notices through this channel.
    let (notice_tx, notice_rx) = mpsc::channel(64);
    TelegramChannel::spawn_notice_loop(
        bot.clone(),
        config.telegram_allowed_users.clone(),
        notice_rx,
    );

    // Daily digest trigger.
    let (digest_tx, digest_rx) = mpsc::channel(4);
    let scheduler = DigestScheduler::new(&config.digest_cron, digest_tx)
        .context("configure digest scheduler")?;
    info!(next = ?scheduler.next_fire(), "Daily digest scheduled");
    tokio::spawn(scheduler.run());
    TelegramChannel::spawn_digest_loop(bot, Arc::clone(&deps), digest_rx);

    // HTTP gateway.
    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .context("parse gateway bind address")?;
    let gateway_state = GatewayState {
        store,
        webhook_token: config.pms_webhook_token.clone(),
        notices: Some(notice_tx),
    };
    tokio::spawn(async move {
        if let Err(e) = innkeep_gateway::start_server(addr, gateway_state).await {
            error!(error = %e, "Gateway server failed");
        }
    });

    // The Telegram dispatcher runs in the foreground and handles ctrl-c.
    channel.run().await
}
