//! In-memory collaborator for tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use super::{Connector, Credentials, RemoteEntry, RemoteSession};
use crate::error::{AppError, Result};
use crate::path::{RemotePath, child_of};

#[derive(Debug, Default)]
pub struct FakeState {
    pub dirs: HashMap<String, Vec<RemoteEntry>>,
    pub files: HashMap<String, Vec<u8>>,
    pub fail_connect: Option<String>,
    pub failing_lists: HashSet<String>,
    pub fail_transfers: bool,
    pub fail_disconnect: bool,
    /// Downloads write half the file then wait for cancellation.
    pub stall_transfers: bool,
    pub dead: bool,
    pub list_calls: Vec<String>,
    pub connects: usize,
    pub disconnects: usize,
}

#[derive(Clone, Debug, Default)]
pub struct FakeConnector {
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    /// ```text
    /// /
    /// ├── docs/
    /// │   ├── guide.pdf
    /// │   └── img/
    /// │       └── logo.png
    /// ├── readme.txt
    /// └── pub/
    /// ```
    pub fn with_sample_tree() -> Self {
        let fake = Self::default();
        fake.add_dir("/", "docs");
        fake.add_file("/", "readme.txt", b"hello world");
        fake.add_dir("/", "pub");
        fake.add_file("/docs", "guide.pdf", b"%PDF-1.7 fake");
        fake.add_dir("/docs", "img");
        fake.add_file("/docs/img", "logo.png", b"\x89PNG");
        fake
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_dir(&self, parent: &str, name: &str) {
        let mut state = self.state();
        state
            .dirs
            .entry(parent.to_string())
            .or_default()
            .push(RemoteEntry::directory(name));
        state.dirs.entry(child_of(parent, name)).or_default();
    }

    pub fn add_file(&self, parent: &str, name: &str, contents: &[u8]) {
        let mut state = self.state();
        state
            .dirs
            .entry(parent.to_string())
            .or_default()
            .push(RemoteEntry::file(name, contents.len() as u64));
        state
            .files
            .insert(child_of(parent, name), contents.to_vec());
    }

    pub fn list_calls(&self) -> Vec<String> {
        self.state().list_calls.clone()
    }
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, _credentials: &Credentials) -> Result<FakeSession> {
        let mut state = self.state();
        if let Some(reason) = &state.fail_connect {
            return Err(AppError::ConnectionError(reason.clone()));
        }
        state.connects += 1;
        state.dead = false;
        Ok(FakeSession {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

impl RemoteSession for FakeSession {
    async fn list_dir(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>> {
        let mut state = self.state();
        state.list_calls.push(path.to_string());
        if state.dead {
            return Err(AppError::ConnectionLost("connection reset by peer".to_string()));
        }
        if state.failing_lists.contains(path.as_str()) {
            return Err(AppError::listing(path.as_str(), "421 Service not available"));
        }
        state
            .dirs
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| AppError::listing(path.as_str(), "550 No such directory"))
    }

    async fn download(
        &self,
        remote: &RemotePath,
        local: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let (contents, stall) = {
            let state = self.state();
            if state.dead {
                return Err(AppError::ConnectionLost("broken pipe".to_string()));
            }
            if state.fail_transfers {
                return Err(AppError::TransferError("426 Transfer aborted".to_string()));
            }
            let contents = state
                .files
                .get(remote.as_str())
                .cloned()
                .ok_or_else(|| AppError::TransferError("550 No such file".to_string()))?;
            (contents, state.stall_transfers)
        };

        if stall {
            tokio::fs::write(local, &contents[..contents.len() / 2]).await?;
            cancel.cancelled().await;
            return Err(AppError::ConnectionClosed);
        }

        tokio::fs::write(local, &contents).await?;
        Ok(contents.len() as u64)
    }

    async fn disconnect(self) -> Result<()> {
        let mut state = self.state();
        state.disconnects += 1;
        if state.fail_disconnect {
            return Err(AppError::ConnectionError("quit failed".to_string()));
        }
        Ok(())
    }
}
