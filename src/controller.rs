//! Session and navigation state machine.
//!
//! The controller owns the remote session, the current path and listing and
//! the back history. Every navigation funnels through one refresh step,
//! which commits path and listing together or not at all.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::error::{AppError, NavigationError, Result};
use crate::history::NavigationHistory;
use crate::listing::{DirectoryEntry, DirectoryListing, EntryKind, NameExtremes, format_size};
use crate::path::RemotePath;
use crate::remote::{Connector, Credentials, RemoteEntry, RemoteSession};
use crate::transfer::{CancelSlot, TransferCoordinator, TransferReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnecting => "Disconnecting",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// Callbacks into the presentation layer.
pub trait SessionObserver: Send {
    /// The current listing changed; `None` once the session is gone.
    fn on_listing(&mut self, listing: Option<&DirectoryListing>);

    fn on_status(&mut self, level: StatusLevel, message: &str);

    fn on_state(&mut self, _state: ConnectionState) {}

    /// Where to save `file_name`; `None` cancels the download.
    fn prompt_save_destination(&mut self, file_name: &str) -> Option<PathBuf>;
}

/// Path and listing as of the last successful load. Replaced as a whole.
#[derive(Debug, Clone, Default)]
struct NavState {
    path: RemotePath,
    listing: Option<DirectoryListing>,
}

impl NavState {
    fn loaded(path: RemotePath, listing: DirectoryListing) -> Self {
        Self {
            path,
            listing: Some(listing),
        }
    }
}

struct ActiveSession<S> {
    session: S,
    credentials: Credentials,
}

pub struct SessionController<C: Connector> {
    connector: C,
    state: ConnectionState,
    session: Option<ActiveSession<C::Session>>,
    nav: NavState,
    history: NavigationHistory,
    transfers: TransferCoordinator,
    observer: Box<dyn SessionObserver>,
}

impl<C: Connector> SessionController<C> {
    pub fn new(connector: C, observer: Box<dyn SessionObserver>) -> Self {
        Self {
            connector,
            state: ConnectionState::Disconnected,
            session: None,
            nav: NavState::default(),
            history: NavigationHistory::new(),
            transfers: TransferCoordinator::default(),
            observer,
        }
    }

    /// Cap the back history; `0` keeps it unbounded.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = NavigationHistory::with_limit(limit);
        self
    }

    /// Shared handle that aborts the download in flight.
    pub fn cancel_slot(&self) -> CancelSlot {
        self.transfers.cancel_slot().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.session.is_some()
    }

    pub fn current_path(&self) -> &RemotePath {
        &self.nav.path
    }

    pub fn listing(&self) -> Option<&DirectoryListing> {
        self.nav.listing.as_ref()
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    /// `host:port` of the live session.
    pub fn endpoint(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.credentials.host_port())
    }

    /// Open a session and load `/`.
    ///
    /// A failed connect leaves the controller `Disconnected`. If the
    /// connection succeeds but the first listing fails, the controller stays
    /// `Connected` without a listing and the listing error is returned.
    pub async fn connect(&mut self, credentials: Credentials) -> Result<()> {
        if self.state != ConnectionState::Disconnected {
            return Err(self.report(NavigationError::AlreadyConnected.into()));
        }
        if let Err(err) = credentials.validate() {
            return Err(self.report(err));
        }

        let endpoint = credentials.host_port();
        self.set_state(ConnectionState::Connecting);
        self.status(&format!("Connecting to {endpoint}..."));

        let session = match self.connector.connect(&credentials).await {
            Ok(session) => session,
            Err(err) => {
                let err = match err {
                    AppError::ConnectionError(_) => err,
                    other => AppError::ConnectionError(other.to_string()),
                };
                self.set_state(ConnectionState::Disconnected);
                return Err(self.report(err));
            }
        };

        self.session = Some(ActiveSession {
            session,
            credentials,
        });
        self.nav = NavState::default();
        self.history.clear();
        self.set_state(ConnectionState::Connected);
        self.status(&format!("Connected to {endpoint}"));

        self.refresh(RemotePath::root()).await
    }

    /// Close the session and forget all navigation state. Failures while
    /// closing are logged only. No-op when already disconnected.
    pub async fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected && self.session.is_none() {
            debug!("disconnect: already disconnected");
            return;
        }

        self.set_state(ConnectionState::Disconnecting);
        if self.transfers.cancel_slot().cancel() {
            info!("Cancelled in-flight transfer");
        }

        if let Some(active) = self.session.take() {
            let endpoint = active.credentials.host_port();
            if let Err(err) = active.session.disconnect().await {
                warn!("Error while closing session to {}: {}", endpoint, err);
            }
        }

        self.reset();
        self.status("Disconnected from FTP server");
    }

    /// Re-list the current directory. History is untouched.
    pub async fn reload(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let path = self.nav.path.clone();
        self.refresh(path).await
    }

    /// Descend into the directory `name` of the current listing.
    ///
    /// The current path is pushed before the listing is attempted, so a
    /// failed load leaves a history entry pointing at the unchanged path.
    pub async fn navigate_into(&mut self, name: &str) -> Result<()> {
        self.ensure_connected()?;
        let kind = self
            .nav
            .listing
            .as_ref()
            .and_then(|listing| listing.find(name))
            .map(|entry| entry.kind);

        match kind {
            Some(EntryKind::Directory) => {}
            Some(_) => {
                return Err(self.report(NavigationError::NotADirectory(name.to_string()).into()));
            }
            None => {
                return Err(self.report(NavigationError::NoSuchEntry(name.to_string()).into()));
            }
        }

        let target = self.nav.path.child(name);
        self.history.push(self.nav.path.clone());
        self.refresh(target).await
    }

    pub async fn navigate_up(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let Some(parent) = self.nav.path.parent() else {
            return Err(self.report(NavigationError::AtRoot.into()));
        };

        self.history.push(self.nav.path.clone());
        self.refresh(parent).await
    }

    /// Return to the most recently left path. The path being left is not
    /// recorded anywhere, and the popped entry is consumed even when the
    /// load fails. Empty history is a no-op.
    pub async fn navigate_back(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let Some(previous) = self.history.pop() else {
            debug!("navigate_back: history is empty");
            return Ok(());
        };

        self.refresh(previous).await
    }

    /// Act on a listing row: go up, descend, or download.
    pub async fn select_entry(&mut self, entry: &DirectoryEntry) -> Result<()> {
        match entry.kind {
            EntryKind::ParentMarker => self.navigate_up().await,
            EntryKind::Directory => self.navigate_into(&entry.name).await,
            EntryKind::File { .. } => {
                self.ensure_connected()?;
                match self.observer.prompt_save_destination(&entry.name) {
                    Some(destination) => self.download(&entry.name, &destination).await.map(|_| ()),
                    None => {
                        self.status("Download cancelled");
                        Ok(())
                    }
                }
            }
        }
    }

    /// Download `file_name` from the current directory to `destination`.
    pub async fn download(&mut self, file_name: &str, destination: &Path) -> Result<TransferReport> {
        self.ensure_connected()?;
        let remote = self.nav.path.child(file_name);
        self.status(&format!("Downloading {remote}..."));

        let result = match self.session.as_ref() {
            Some(active) => {
                self.transfers
                    .download(&active.session, &self.nav.path, file_name, destination)
                    .await
            }
            None => Err(NavigationError::NotConnected.into()),
        };

        match result {
            Ok(report) => {
                self.status(&format!(
                    "Download complete: {} ({})",
                    file_name,
                    format_size(report.bytes)
                ));
                Ok(report)
            }
            Err(err) => {
                if err.is_connection_lost() {
                    self.connection_lost(&err);
                }
                self.observer
                    .on_status(StatusLevel::Error, &format!("Download aborted: {err}"));
                error!("Download of {} failed: {}", remote, err);
                Err(err)
            }
        }
    }

    /// Report the longest and shortest directory names under `path` without
    /// moving there.
    pub async fn analyze_directory_names(&mut self, path: &RemotePath) -> Result<Option<NameExtremes>> {
        self.ensure_connected()?;
        let entries = self.list(path).await?;
        let extremes = DirectoryListing::build(path.clone(), entries).directory_name_extremes();

        match &extremes {
            Some(found) => {
                self.status(&format!(
                    "Longest directory name: '{}' ({} characters)",
                    found.longest,
                    found.longest.chars().count()
                ));
                self.status(&format!(
                    "Shortest directory name: '{}' ({} characters)",
                    found.shortest,
                    found.shortest.chars().count()
                ));
            }
            None => debug!("No directories under {}", path),
        }
        Ok(extremes)
    }

    /// Load `path` and, on success, make it current together with its
    /// listing. On failure nothing changes.
    async fn refresh(&mut self, path: RemotePath) -> Result<()> {
        let entries = self.list(&path).await?;
        let listing = DirectoryListing::build(path.clone(), entries);
        self.nav = NavState::loaded(path, listing);
        self.observer.on_listing(self.nav.listing.as_ref());
        self.status(&format!("Current path: {}", self.nav.path));
        Ok(())
    }

    async fn list(&mut self, path: &RemotePath) -> Result<Vec<RemoteEntry>> {
        let result = match self.session.as_ref() {
            Some(active) => active.session.list_dir(path).await,
            None => Err(NavigationError::NotConnected.into()),
        };

        result.map_err(|err| {
            if err.is_connection_lost() {
                self.connection_lost(&err);
                return self.report(err);
            }
            let err = match err {
                AppError::ListingError { .. } | AppError::Navigation(_) => err,
                other => AppError::listing(path.as_str(), other),
            };
            self.report(err)
        })
    }

    fn ensure_connected(&mut self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(self.report(NavigationError::NotConnected.into()))
        }
    }

    /// The transport is gone: drop the session without talking to it.
    fn connection_lost(&mut self, err: &AppError) {
        warn!("Session lost: {}", err);
        self.transfers.cancel_slot().cancel();
        self.session = None;
        self.reset();
    }

    fn reset(&mut self) {
        self.nav = NavState::default();
        self.history.clear();
        self.observer.on_listing(None);
        self.set_state(ConnectionState::Disconnected);
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            info!("Session state: {} -> {}", self.state, state);
            self.state = state;
            self.observer.on_state(state);
        }
    }

    fn status(&mut self, message: &str) {
        info!("{}", message);
        self.observer.on_status(StatusLevel::Info, message);
    }

    fn report(&mut self, err: AppError) -> AppError {
        error!("{}", err);
        self.observer.on_status(StatusLevel::Error, &err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::FakeConnector;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        statuses: Vec<(StatusLevel, String)>,
        listings: Vec<Option<DirectoryListing>>,
        states: Vec<ConnectionState>,
        save_dir: Option<PathBuf>,
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Recorded>>);

    impl SessionObserver for Recorder {
        fn on_listing(&mut self, listing: Option<&DirectoryListing>) {
            self.0.lock().unwrap().listings.push(listing.cloned());
        }

        fn on_status(&mut self, level: StatusLevel, message: &str) {
            self.0
                .lock()
                .unwrap()
                .statuses
                .push((level, message.to_string()));
        }

        fn on_state(&mut self, state: ConnectionState) {
            self.0.lock().unwrap().states.push(state);
        }

        fn prompt_save_destination(&mut self, file_name: &str) -> Option<PathBuf> {
            self.0
                .lock()
                .unwrap()
                .save_dir
                .as_ref()
                .map(|dir| dir.join(file_name))
        }
    }

    impl Recorder {
        fn errors(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .statuses
                .iter()
                .filter(|(level, _)| *level == StatusLevel::Error)
                .map(|(_, msg)| msg.clone())
                .collect()
        }

        fn infos(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .statuses
                .iter()
                .filter(|(level, _)| *level == StatusLevel::Info)
                .map(|(_, msg)| msg.clone())
                .collect()
        }
    }

    fn creds() -> Credentials {
        Credentials::new("127.0.0.1", 21, "user", "secret")
    }

    fn p(s: &str) -> RemotePath {
        RemotePath::new(s).unwrap()
    }

    fn history(controller: &SessionController<FakeConnector>) -> Vec<String> {
        controller.history().iter().map(|p| p.to_string()).collect()
    }

    async fn connected() -> (SessionController<FakeConnector>, FakeConnector, Recorder) {
        let fake = FakeConnector::with_sample_tree();
        let recorder = Recorder::default();
        let mut controller = SessionController::new(fake.clone(), Box::new(recorder.clone()));
        controller.connect(creds()).await.unwrap();
        (controller, fake, recorder)
    }

    fn test_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("ftpnav_controller_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_connect_loads_root_without_parent_marker() {
        let (controller, fake, recorder) = connected().await;

        assert_eq!(controller.state(), ConnectionState::Connected);
        assert_eq!(controller.current_path().as_str(), "/");
        let listing = controller.listing().unwrap();
        assert!(!listing.has_parent_marker());
        let names: Vec<&str> = listing.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "readme.txt", "pub"]);
        assert_eq!(controller.endpoint().as_deref(), Some("127.0.0.1:21"));
        assert_eq!(fake.list_calls(), vec!["/"]);

        let states = recorder.0.lock().unwrap().states.clone();
        assert_eq!(
            states,
            vec![ConnectionState::Connecting, ConnectionState::Connected]
        );
        assert!(recorder.infos().contains(&"Current path: /".to_string()));
    }

    #[tokio::test]
    async fn test_connect_failure_returns_to_disconnected() {
        let fake = FakeConnector::with_sample_tree();
        fake.state().fail_connect = Some("530 Login incorrect".to_string());
        let recorder = Recorder::default();
        let mut controller = SessionController::new(fake.clone(), Box::new(recorder.clone()));

        let err = controller.connect(creds()).await.unwrap_err();

        assert!(matches!(err, AppError::ConnectionError(_)));
        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert!(controller.listing().is_none());
        assert!(fake.list_calls().is_empty());
        assert_eq!(recorder.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_twice_is_rejected() {
        let (mut controller, fake, _) = connected().await;
        let err = controller.connect(creds()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Navigation(NavigationError::AlreadyConnected)
        ));
        assert_eq!(fake.state().connects, 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_credentials() {
        let fake = FakeConnector::default();
        let mut controller = SessionController::new(fake.clone(), Box::new(Recorder::default()));
        let err = controller
            .connect(Credentials::new("", 21, "user", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(fake.state().connects, 0);
        assert_eq!(controller.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_initial_listing_failure_stays_connected() {
        let fake = FakeConnector::with_sample_tree();
        fake.state().failing_lists.insert("/".to_string());
        let mut controller = SessionController::new(fake, Box::new(Recorder::default()));

        let err = controller.connect(creds()).await.unwrap_err();

        assert!(matches!(err, AppError::ListingError { .. }));
        assert_eq!(controller.state(), ConnectionState::Connected);
        assert!(controller.listing().is_none());
    }

    #[tokio::test]
    async fn test_disconnect_without_listing() {
        let fake = FakeConnector::with_sample_tree();
        fake.state().failing_lists.insert("/".to_string());
        let recorder = Recorder::default();
        let mut controller = SessionController::new(fake.clone(), Box::new(recorder.clone()));
        controller.connect(creds()).await.unwrap_err();

        controller.disconnect().await;

        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert_eq!(controller.current_path().as_str(), "/");
        assert!(controller.history().is_empty());
        assert!(controller.listing().is_none());
        assert_eq!(fake.state().disconnects, 1);
        assert!(
            recorder
                .infos()
                .contains(&"Disconnected from FTP server".to_string())
        );

        controller.disconnect().await;
        assert_eq!(fake.state().disconnects, 1);
    }

    #[tokio::test]
    async fn test_navigate_into_directory() {
        let (mut controller, _, _) = connected().await;

        controller.navigate_into("docs").await.unwrap();

        assert_eq!(controller.current_path().as_str(), "/docs");
        let listing = controller.listing().unwrap();
        assert_eq!(listing.path().as_str(), "/docs");
        assert!(listing.entries()[0].is_parent_marker());
        assert_eq!(history(&controller), vec!["/"]);
    }

    #[tokio::test]
    async fn test_navigate_into_file_is_rejected_without_remote_call() {
        let (mut controller, fake, recorder) = connected().await;

        let err = controller.navigate_into("readme.txt").await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Navigation(NavigationError::NotADirectory(_))
        ));
        let err = controller.navigate_into("missing").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Navigation(NavigationError::NoSuchEntry(_))
        ));
        assert_eq!(fake.list_calls(), vec!["/"]);
        assert!(controller.history().is_empty());
        assert_eq!(recorder.errors().len(), 2);
    }

    #[tokio::test]
    async fn test_navigate_up_pushes_history() {
        let (mut controller, _, _) = connected().await;
        controller.navigate_into("docs").await.unwrap();

        controller.navigate_up().await.unwrap();

        assert_eq!(controller.current_path().as_str(), "/");
        assert!(!controller.listing().unwrap().has_parent_marker());
        assert_eq!(history(&controller), vec!["/", "/docs"]);
    }

    #[tokio::test]
    async fn test_navigate_up_at_root_is_rejected() {
        let (mut controller, fake, _) = connected().await;
        let err = controller.navigate_up().await.unwrap_err();
        assert!(matches!(err, AppError::Navigation(NavigationError::AtRoot)));
        assert_eq!(fake.list_calls().len(), 1);
        assert!(controller.history().is_empty());
    }

    #[tokio::test]
    async fn test_navigate_back_does_not_record_left_path() {
        let (mut controller, _, _) = connected().await;
        controller.navigate_into("docs").await.unwrap();
        controller.navigate_into("img").await.unwrap();
        assert_eq!(history(&controller), vec!["/", "/docs"]);

        controller.navigate_back().await.unwrap();
        assert_eq!(controller.current_path().as_str(), "/docs");
        assert_eq!(history(&controller), vec!["/"]);

        controller.navigate_back().await.unwrap();
        assert_eq!(controller.current_path().as_str(), "/");
        assert!(controller.history().is_empty());
    }

    #[tokio::test]
    async fn test_navigate_back_with_empty_history_is_noop() {
        let (mut controller, fake, recorder) = connected().await;
        let errors_before = recorder.errors().len();

        controller.navigate_back().await.unwrap();

        assert_eq!(controller.current_path().as_str(), "/");
        assert_eq!(fake.list_calls().len(), 1);
        assert_eq!(recorder.errors().len(), errors_before);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_good_state() {
        let (mut controller, fake, recorder) = connected().await;
        let before = controller.listing().cloned();
        fake.state().failing_lists.insert("/docs".to_string());

        let err = controller.navigate_into("docs").await.unwrap_err();

        assert!(matches!(err, AppError::ListingError { .. }));
        assert_eq!(controller.state(), ConnectionState::Connected);
        assert_eq!(controller.current_path().as_str(), "/");
        assert_eq!(controller.listing().cloned(), before);
        // The push happens before the attempt and is not rolled back.
        assert_eq!(history(&controller), vec!["/"]);
        assert_eq!(recorder.errors().len(), 1);

        fake.state().failing_lists.clear();
        controller.navigate_into("docs").await.unwrap();
        assert_eq!(controller.current_path().as_str(), "/docs");
    }

    #[tokio::test]
    async fn test_failed_back_consumes_history_entry() {
        let (mut controller, fake, _) = connected().await;
        controller.navigate_into("docs").await.unwrap();
        fake.state().failing_lists.insert("/".to_string());

        let err = controller.navigate_back().await.unwrap_err();

        assert!(matches!(err, AppError::ListingError { .. }));
        assert_eq!(controller.state(), ConnectionState::Connected);
        assert_eq!(controller.current_path().as_str(), "/docs");
        assert!(controller.history().is_empty());

        // Nothing left to go back to.
        fake.state().failing_lists.clear();
        controller.navigate_back().await.unwrap();
        assert_eq!(controller.current_path().as_str(), "/docs");
    }

    #[tokio::test]
    async fn test_reload_relists_current_path() {
        let (mut controller, fake, _) = connected().await;
        controller.navigate_into("pub").await.unwrap();
        fake.add_file("/pub", "new.bin", b"1234");

        controller.reload().await.unwrap();

        let listing = controller.listing().unwrap();
        assert_eq!(listing.find("new.bin").unwrap().size(), Some(4));
        assert_eq!(history(&controller), vec!["/"]);
    }

    #[tokio::test]
    async fn test_disconnect_resets_everything() {
        let (mut controller, fake, recorder) = connected().await;
        controller.navigate_into("docs").await.unwrap();

        controller.disconnect().await;

        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert_eq!(controller.current_path().as_str(), "/");
        assert!(controller.history().is_empty());
        assert!(controller.listing().is_none());
        assert_eq!(fake.state().disconnects, 1);
        assert_eq!(recorder.0.lock().unwrap().listings.last(), Some(&None));

        let statuses_before = recorder.0.lock().unwrap().statuses.len();
        controller.disconnect().await;
        assert_eq!(fake.state().disconnects, 1);
        assert_eq!(recorder.0.lock().unwrap().statuses.len(), statuses_before);
    }

    #[tokio::test]
    async fn test_disconnect_swallows_close_errors() {
        let (mut controller, fake, recorder) = connected().await;
        fake.state().fail_disconnect = true;
        let errors_before = recorder.errors().len();

        controller.disconnect().await;

        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert_eq!(recorder.errors().len(), errors_before);
    }

    #[tokio::test]
    async fn test_reconnect_after_disconnect() {
        let (mut controller, fake, _) = connected().await;
        controller.navigate_into("docs").await.unwrap();
        controller.disconnect().await;

        controller.connect(creds()).await.unwrap();

        assert_eq!(controller.current_path().as_str(), "/");
        assert!(controller.history().is_empty());
        assert_eq!(fake.state().connects, 2);
    }

    #[tokio::test]
    async fn test_dead_transport_disconnects() {
        let (mut controller, fake, _) = connected().await;
        controller.navigate_into("docs").await.unwrap();
        fake.state().dead = true;

        let err = controller.navigate_into("img").await.unwrap_err();

        assert!(err.is_connection_lost());
        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert!(controller.listing().is_none());
        assert!(controller.history().is_empty());
        assert_eq!(controller.current_path().as_str(), "/");
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let mut controller =
            SessionController::new(FakeConnector::default(), Box::new(Recorder::default()));

        for err in [
            controller.navigate_back().await.unwrap_err(),
            controller.navigate_up().await.unwrap_err(),
            controller.navigate_into("docs").await.unwrap_err(),
            controller.reload().await.unwrap_err(),
            controller
                .download("a.txt", Path::new("/tmp/a.txt"))
                .await
                .unwrap_err(),
        ] {
            assert!(matches!(
                err,
                AppError::Navigation(NavigationError::NotConnected)
            ));
        }
    }

    #[tokio::test]
    async fn test_select_entry_dispatch() {
        let (mut controller, _, recorder) = connected().await;
        let dir = test_dir("select");
        recorder.0.lock().unwrap().save_dir = Some(dir.clone());

        controller
            .select_entry(&DirectoryEntry::directory("docs"))
            .await
            .unwrap();
        assert_eq!(controller.current_path().as_str(), "/docs");

        let file = controller.listing().unwrap().find("guide.pdf").cloned().unwrap();
        controller.select_entry(&file).await.unwrap();
        assert_eq!(std::fs::read(dir.join("guide.pdf")).unwrap(), b"%PDF-1.7 fake");
        assert_eq!(controller.current_path().as_str(), "/docs");

        let parent = controller.listing().unwrap().entries()[0].clone();
        controller.select_entry(&parent).await.unwrap();
        assert_eq!(controller.current_path().as_str(), "/");
        assert_eq!(history(&controller), vec!["/", "/docs"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_select_file_with_cancelled_prompt_is_noop() {
        let (mut controller, _, recorder) = connected().await;

        controller
            .select_entry(&DirectoryEntry::file("readme.txt", 11))
            .await
            .unwrap();

        assert!(recorder.infos().contains(&"Download cancelled".to_string()));
        assert_eq!(controller.current_path().as_str(), "/");
    }

    #[tokio::test]
    async fn test_transfer_failure_keeps_session() {
        let (mut controller, fake, recorder) = connected().await;
        fake.state().fail_transfers = true;
        let dir = test_dir("transfer_fail");

        let err = controller
            .download("readme.txt", &dir.join("readme.txt"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TransferError(_)));
        assert_eq!(controller.state(), ConnectionState::Connected);
        assert!(recorder.errors().iter().any(|e| e.starts_with("Download aborted")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_transfer_on_dead_transport_disconnects() {
        let (mut controller, fake, _) = connected().await;
        fake.state().dead = true;
        let dir = test_dir("transfer_dead");

        let err = controller
            .download("readme.txt", &dir.join("readme.txt"))
            .await
            .unwrap_err();

        assert!(err.is_connection_lost());
        assert_eq!(controller.state(), ConnectionState::Disconnected);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_analyze_directory_names_keeps_navigation() {
        let (mut controller, _, recorder) = connected().await;
        controller.navigate_into("docs").await.unwrap();

        let extremes = controller
            .analyze_directory_names(&RemotePath::root())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(extremes.longest, "docs");
        assert_eq!(extremes.shortest, "pub");
        assert_eq!(controller.current_path().as_str(), "/docs");
        assert!(
            recorder
                .infos()
                .contains(&"Longest directory name: 'docs' (4 characters)".to_string())
        );

        let none = controller.analyze_directory_names(&p("/pub")).await.unwrap();
        assert_eq!(none, None);
    }

    #[tokio::test]
    async fn test_history_limit_applies() {
        let fake = FakeConnector::with_sample_tree();
        let mut controller =
            SessionController::new(fake, Box::new(Recorder::default())).with_history_limit(1);
        controller.connect(creds()).await.unwrap();
        controller.navigate_into("docs").await.unwrap();
        controller.navigate_into("img").await.unwrap();

        assert_eq!(history(&controller), vec!["/docs"]);
    }
}
