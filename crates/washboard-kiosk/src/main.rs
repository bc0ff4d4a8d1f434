//! Washboard kiosk entry point.
//!
//! # Usage
//!
//! ```bash
//! washboard-kiosk --server https://laundry.example --token <bearer-token>
//! ```

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use washboard_app::{App, Runtime};
use washboard_client::{FileKv, RestService, StaticTokenProvider};
use washboard_kiosk::{driver::KioskDriver, services::KioskServices};

/// Laundry room status board
#[derive(Parser, Debug)]
#[command(name = "washboard-kiosk")]
#[command(about = "Terminal status board for a shared laundry room")]
#[command(version)]
struct Args {
    /// Base URL of the laundry service
    #[arg(short, long)]
    server: String,

    /// Bearer token for the service
    #[arg(short, long)]
    token: String,

    /// Status WebSocket URL (derived from --server when omitted)
    #[arg(long)]
    channel: Option<String>,

    /// Pre-provisioned push notification token
    #[arg(long)]
    push_token: Option<String>,

    /// Laundry room id
    #[arg(long, default_value = "1")]
    room_id: u32,

    /// Directory for persisted subscription flags
    #[arg(long, default_value = "washboard-data")]
    data_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Derive the status channel URL from the HTTP base URL.
fn derive_channel_url(server: &str) -> String {
    let base = server.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    format!("{ws_base}/status_update")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let channel_url = args.channel.unwrap_or_else(|| derive_channel_url(&args.server));
    tracing::info!(server = %args.server, channel = %channel_url, "washboard kiosk starting");

    let kv = FileKv::open(std::path::Path::new(&args.data_dir).join("flags.json"))?;
    let app = App::new(Box::new(kv));

    let rest = RestService::new(&args.server, &args.token, args.room_id)?;
    let services = KioskServices::new(rest, StaticTokenProvider::new(args.push_token));
    let driver = KioskDriver::new(channel_url, args.token);

    Runtime::new(driver, app, services).run().await?;
    Ok(())
}
