use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::event::EventStream;
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::{select, sync::mpsc, time};

use ftpnav::{
    App, AppEvent, ChannelObserver, ConfigManager, ConfigOverrides, FtpConnector, Result,
    SessionController, init_panic_hook, init_tracing, restore_tui, spawn_controller,
};

/// Browse a remote FTP server and download files from it.
#[derive(Parser, Debug)]
#[command(name = "ftpnav", version, about)]
struct Args {
    /// Server host name or address
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(long)]
    port: Option<u16>,

    /// Login name
    #[arg(long)]
    user: Option<String>,

    /// Login password
    #[arg(long, env = "FTPNAV_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Configuration file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where downloaded files are written
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `ftpnav=trace`
    #[arg(long)]
    log_level: Option<String>,

    /// Connect right after start-up
    #[arg(long)]
    connect: bool,

    /// Write the effective configuration (without password) and continue
    #[arg(long)]
    save_config: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            username: self.user.clone(),
            password: self.password.clone(),
            download_dir: self.download_dir.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

/// Keyboard events and a 250ms tick, forwarded into the app channel.
fn spawn_input(tx: mpsc::UnboundedSender<AppEvent>) {
    let mut ticker = time::interval(Duration::from_millis(250));
    let mut event_stream = EventStream::new();
    tokio::spawn(async move {
        loop {
            let event = select! {
                event_result = event_stream.next() => match event_result {
                    None => break,
                    Some(Err(e)) => {
                        tracing::error!("Terminal input error: {}", e);
                        break;
                    }
                    Some(Ok(event)) => AppEvent::Input(event),
                },
                _ = ticker.tick() => AppEvent::Tick,
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut manager = match &args.config {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    manager.apply(args.overrides());
    if args.save_config {
        manager.save()?;
        eprintln!("Configuration written to {}", manager.path().display());
    }

    let config = manager.config().clone();
    let _log_guard = init_tracing(&config.settings.log_level)?;
    init_panic_hook();
    let credentials = config.credentials()?;
    let download_dir = config.download_dir();
    tracing::info!(
        "Starting ftpnav for {} (downloads to {})",
        credentials.host_port(),
        download_dir.display()
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let connector = FtpConnector::new(
        config.settings.connect_timeout(),
        config.settings.io_timeout(),
    );
    let observer = ChannelObserver::new(tx.clone(), download_dir);
    let controller = SessionController::new(connector, Box::new(observer))
        .with_history_limit(config.settings.history_limit);
    let (handle, worker) = spawn_controller(controller, tx.clone());

    spawn_input(tx);

    let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let mut app = App::new(terminal, handle.clone(), credentials);
    app.init_terminal()?;
    if args.connect {
        app.connect();
    }

    let res = app.run(&mut rx).await;

    restore_tui()?;

    // Closing the window ends the session.
    if handle.shutdown().is_ok() && time::timeout(Duration::from_secs(5), worker).await.is_err() {
        tracing::warn!("Controller worker did not stop in time");
    }
    tracing::info!("ftpnav exiting");

    res
}
