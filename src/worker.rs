//! Runs the controller on its own task so the UI never waits on the network.
//!
//! Commands are handled strictly one after another; anything sent while an
//! operation is running queues behind it. Results come back as
//! [`SessionEvent`]s.

use std::path::PathBuf;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::controller::{ConnectionState, SessionController, SessionObserver, StatusLevel};
use crate::error::{AppError, Result};
use crate::events::{AppEvent, SessionEvent};
use crate::listing::{DirectoryEntry, DirectoryListing, NameExtremes};
use crate::path::RemotePath;
use crate::remote::{Connector, Credentials};
use crate::transfer::CancelSlot;

#[derive(Debug)]
pub enum Command {
    Connect(Credentials),
    Disconnect,
    Select(DirectoryEntry),
    Back,
    Up,
    Reload,
    AnalyzeNames(RemotePath),
    Shutdown,
}

/// Forwards controller callbacks to the UI event channel. Downloads go to
/// `download_dir`.
pub struct ChannelObserver {
    events: mpsc::UnboundedSender<AppEvent>,
    download_dir: PathBuf,
}

impl ChannelObserver {
    pub fn new(events: mpsc::UnboundedSender<AppEvent>, download_dir: PathBuf) -> Self {
        Self {
            events,
            download_dir,
        }
    }

    fn emit(&self, event: SessionEvent) {
        // The UI may already be gone during shutdown.
        let _ = self.events.send(AppEvent::Session(event));
    }
}

impl SessionObserver for ChannelObserver {
    fn on_listing(&mut self, listing: Option<&DirectoryListing>) {
        self.emit(SessionEvent::Listing(listing.cloned()));
    }

    fn on_status(&mut self, level: StatusLevel, message: &str) {
        self.emit(SessionEvent::Status {
            level,
            message: message.to_string(),
            at: Local::now(),
        });
    }

    fn on_state(&mut self, state: ConnectionState) {
        self.emit(SessionEvent::State(state));
    }

    fn prompt_save_destination(&mut self, file_name: &str) -> Option<PathBuf> {
        Some(self.download_dir.join(file_name))
    }
}

/// Cheap, cloneable command sender for the controller task.
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancelSlot,
}

impl ControllerHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| AppError::ConnectionClosed)
    }

    pub fn connect(&self, credentials: Credentials) -> Result<()> {
        self.send(Command::Connect(credentials))
    }

    /// Aborts a running download first so the disconnect does not wait for it.
    pub fn disconnect(&self) -> Result<()> {
        if self.cancel.cancel() {
            info!("Disconnect requested during transfer; cancelling it");
        }
        self.send(Command::Disconnect)
    }

    pub fn select(&self, entry: DirectoryEntry) -> Result<()> {
        self.send(Command::Select(entry))
    }

    pub fn back(&self) -> Result<()> {
        self.send(Command::Back)
    }

    pub fn up(&self) -> Result<()> {
        self.send(Command::Up)
    }

    pub fn reload(&self) -> Result<()> {
        self.send(Command::Reload)
    }

    pub fn analyze_names(&self, path: RemotePath) -> Result<()> {
        self.send(Command::AnalyzeNames(path))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.cancel.cancel();
        self.send(Command::Shutdown)
    }

    pub fn transfer_in_flight(&self) -> bool {
        self.cancel.is_armed()
    }
}

/// Move `controller` onto a tokio task.
pub fn spawn_controller<C>(
    controller: SessionController<C>,
    events: mpsc::UnboundedSender<AppEvent>,
) -> (ControllerHandle, JoinHandle<()>)
where
    C: Connector + 'static,
    C::Session: 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = ControllerHandle {
        commands: tx,
        cancel: controller.cancel_slot(),
    };
    let task = tokio::spawn(run(controller, rx, events));
    (handle, task)
}

fn name_report(path: &RemotePath, extremes: Option<&NameExtremes>) -> String {
    match extremes {
        Some(found) => format!(
            "Directory names under {path}\nLongest: '{}' ({} characters)\nShortest: '{}' ({} characters)",
            found.longest,
            found.longest.chars().count(),
            found.shortest,
            found.shortest.chars().count()
        ),
        None => format!("No directories under {path}"),
    }
}

async fn run<C: Connector>(
    mut controller: SessionController<C>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<AppEvent>,
) {
    while let Some(command) = commands.recv().await {
        debug!("worker: {:?}", command);
        let result = match command {
            Command::Connect(credentials) => controller.connect(credentials).await,
            Command::Disconnect => {
                controller.disconnect().await;
                Ok(())
            }
            Command::Select(entry) => controller.select_entry(&entry).await,
            Command::Back => controller.navigate_back().await,
            Command::Up => controller.navigate_up().await,
            Command::Reload => controller.reload().await,
            Command::AnalyzeNames(path) => controller
                .analyze_directory_names(&path)
                .await
                .map(|extremes| {
                    let report = name_report(&path, extremes.as_ref());
                    let _ = events.send(AppEvent::Session(SessionEvent::Report(report)));
                }),
            Command::Shutdown => break,
        };

        // Failures already reached the UI through the observer.
        if let Err(err) = result {
            debug!("worker: command failed: {}", err);
        }
        let _ = events.send(AppEvent::Session(SessionEvent::Idle));
    }

    controller.disconnect().await;
    info!("Controller worker stopped");
    let _ = events.send(AppEvent::Session(SessionEvent::Stopped));
}
