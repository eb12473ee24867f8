use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use suprss::api::HttpTransport;
use suprss::config::Config;
use suprss::navigation::BrowserNavigator;
use suprss::notify::ChannelSink;
use suprss::util::parse_server_url;
use suprss::{ControllerOptions, FeedController};
use tokio::sync::mpsc;

mod app;
mod ui;

use app::App;
use ui::Exit;

/// Get the config directory path (~/.config/suprss/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("suprss"))
}

#[derive(Parser, Debug)]
#[command(name = "suprss", about = "Terminal client for a SUPRSS server")]
struct Args {
    /// Server base URL (overrides server_url in the config file)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Config file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// The TUI owns the terminal, so logs only go to a file. Without
/// `--log-file`, `RUST_LOG` alone selects `suprss.log` in the config dir.
fn init_logging(log_file: Option<&Path>, config_dir: &Path) -> Result<()> {
    let path = match log_file {
        Some(path) => path.to_path_buf(),
        None if std::env::var_os("RUST_LOG").is_some() => config_dir.join("suprss.log"),
        None => return Ok(()),
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file '{}'", path.display()))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("suprss=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // The config may hold a session cookie: user-only access.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            eprintln!(
                "Warning: failed to restrict permissions on {}: {}",
                config_dir.display(),
                e
            );
        }
    }

    init_logging(args.log_file.as_deref(), &config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;
    if let Some(server) = args.server {
        config.server_url = server;
    }
    tracing::debug!(config = ?config, "Effective configuration");

    let base_url = parse_server_url(&config.server_url)
        .with_context(|| format!("Invalid server URL '{}'", config.server_url))?;

    let cookie = config.session_cookie();
    let transport = HttpTransport::new(base_url.clone(), cookie.as_ref(), config.request_timeout())
        .context("Failed to create HTTP client")?;

    let (notify_tx, notify_rx) = mpsc::channel(32);
    let navigator = Arc::new(BrowserNavigator::new(base_url.clone()));
    let controller = Arc::new(FeedController::new(
        Arc::new(transport),
        Arc::new(ChannelSink::new(notify_tx)),
        navigator.clone(),
        ControllerOptions {
            redirect_delay: config.redirect_delay(),
            stale_after: config.stale_after(),
        },
    ));

    tracing::info!(server = %base_url, "Starting");
    let mut app = App::new(controller, navigator, config.notification_ttl());

    match ui::run(&mut app, notify_rx).await? {
        Exit::Quit => println!("Goodbye!"),
        Exit::Redirected(target) => {
            let url = base_url
                .join(&target)
                .map(|u| u.to_string())
                .unwrap_or(target);
            println!("Continue in your browser: {}", url);
            println!(
                "Once signed in, put the session cookie in {} or {}.",
                config_path.display(),
                suprss::config::SESSION_COOKIE_ENV
            );
        }
    }
    Ok(())
}
