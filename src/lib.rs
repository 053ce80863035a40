mod app;
mod config;
mod controller;
mod error;
mod events;
mod history;
mod key_event;
mod listing;
mod path;
mod remote;
mod transfer;
mod ui;
mod utils;
mod worker;

// Re-export commonly used types
pub use app::App;
pub use config::{AppSettings, Config, ConfigManager, ConfigOverrides, ServerSettings};
pub use controller::{ConnectionState, SessionController, SessionObserver, StatusLevel};
pub use error::{AppError, NavigationError, Result};
pub use events::{AppEvent, SessionEvent};
pub use history::NavigationHistory;
pub use listing::{DirectoryEntry, DirectoryListing, EntryKind, NameExtremes, format_size};
pub use path::RemotePath;
pub use remote::{Connector, Credentials, FtpConnector, RemoteEntry, RemoteKind, RemoteSession};
pub use transfer::{CancelSlot, TransferCoordinator, TransferReport};
pub use utils::{init_panic_hook, init_tracing, restore_tui};
pub use worker::{ChannelObserver, Command, ControllerHandle, spawn_controller};
