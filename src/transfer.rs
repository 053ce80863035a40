//! Single-file downloads against the active session.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AppError, NavigationError, Result};
use crate::path::RemotePath;
use crate::remote::RemoteSession;

/// Holds the cancellation token of the transfer currently in flight, if
/// any. Clones share the slot, so another task can abort the transfer.
#[derive(Clone, Debug, Default)]
pub struct CancelSlot {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl CancelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh token for a transfer that is about to start.
    pub fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut current) = self.current.lock() {
            *current = Some(token.clone());
        }
        token
    }

    pub fn disarm(&self) {
        if let Ok(mut current) = self.current.lock() {
            *current = None;
        }
    }

    /// Cancel the in-flight transfer. Returns false when nothing was running.
    pub fn cancel(&self) -> bool {
        match self.current.lock() {
            Ok(current) => match current.as_ref() {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.current.lock().map(|c| c.is_some()).unwrap_or(false)
    }
}

/// Outcome of a finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub remote: RemotePath,
    pub local: PathBuf,
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Where bytes land until the transfer completes.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

#[derive(Clone, Debug, Default)]
pub struct TransferCoordinator {
    slot: CancelSlot,
}

impl TransferCoordinator {
    pub fn cancel_slot(&self) -> &CancelSlot {
        &self.slot
    }

    /// Download `file_name` from `current_dir` into `destination`.
    ///
    /// Data is written next to `destination` with a `.part` suffix and only
    /// renamed into place once complete, so a failure never leaves a
    /// truncated file behind and never clobbers an existing one.
    pub async fn download<S: RemoteSession>(
        &self,
        session: &S,
        current_dir: &RemotePath,
        file_name: &str,
        destination: &Path,
    ) -> Result<TransferReport> {
        if file_name.is_empty() || file_name.contains('/') {
            return Err(NavigationError::InvalidName(file_name.to_string()).into());
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::TransferError(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let remote = current_dir.child(file_name);
        let partial = partial_path(destination);
        info!("Downloading {} -> {}", remote, destination.display());

        let token = self.slot.arm();
        let started = Instant::now();
        let result = session.download(&remote, &partial, &token).await;
        self.slot.disarm();

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                discard_partial(&partial).await;
                return Err(match err {
                    AppError::TransferError(_)
                    | AppError::ConnectionLost(_)
                    | AppError::ConnectionClosed => err,
                    other => AppError::TransferError(other.to_string()),
                });
            }
        };

        if let Err(e) = tokio::fs::rename(&partial, destination).await {
            discard_partial(&partial).await;
            return Err(AppError::TransferError(format!(
                "cannot move download into {}: {e}",
                destination.display()
            )));
        }

        let report = TransferReport {
            remote,
            local: destination.to_path_buf(),
            bytes,
            elapsed: started.elapsed(),
        };
        debug!("Download finished: {:?}", report);
        Ok(report)
    }
}

async fn discard_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => debug!("Removed partial download {}", partial.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", partial.display(), e),
    }
}
