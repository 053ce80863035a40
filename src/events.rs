use chrono::{DateTime, Local};
use crossterm::event::Event;

use crate::controller::{ConnectionState, StatusLevel};
use crate::listing::DirectoryListing;

#[derive(Debug)]
pub enum AppEvent {
    Input(Event),
    Tick,
    Session(SessionEvent),
}

/// Everything the controller worker reports back to the UI.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Listing(Option<DirectoryListing>),
    Status {
        level: StatusLevel,
        message: String,
        at: DateTime<Local>,
    },
    State(ConnectionState),
    Report(String), // Result text for the info popup
    Idle,    // The last queued command has finished
    Stopped, // Worker task exited
}
