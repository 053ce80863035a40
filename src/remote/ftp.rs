//! FTP implementation of the remote-session collaborator.
//!
//! `suppaftp`'s blocking client runs on tokio's blocking pool; the control
//! connection lives behind a mutex that only blocking tasks ever lock.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::list_parser::parse_listing;
use super::{Connector, Credentials, RemoteEntry, RemoteSession};
use crate::error::{AppError, Result};
use crate::path::RemotePath;

const CHUNK_SIZE: usize = 64 * 1024;

/// Opens [`FtpSession`]s.
#[derive(Clone, Debug)]
pub struct FtpConnector {
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl FtpConnector {
    pub fn new(connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            io_timeout,
        }
    }
}

impl Default for FtpConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(20), Duration::from_secs(60))
    }
}

/// One logged-in FTP control connection.
pub struct FtpSession {
    stream: Arc<Mutex<FtpStream>>,
    endpoint: String,
}

/// Socket level failures mean the control connection is gone.
fn classify(err: FtpError, otherwise: impl FnOnce(String) -> AppError) -> AppError {
    match err {
        FtpError::ConnectionError(io) => AppError::ConnectionLost(io.to_string()),
        other => otherwise(other.to_string()),
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::ConnectionLost(format!("FTP worker stopped: {e}")))?
}

fn lock(stream: &Mutex<FtpStream>) -> Result<std::sync::MutexGuard<'_, FtpStream>> {
    stream
        .lock()
        .map_err(|_| AppError::ConnectionLost("FTP session state poisoned".to_string()))
}

/// Copy the data connection into `file` until EOF or cancellation.
fn copy_stream(
    reader: &mut impl Read,
    file: &mut impl Write,
    cancel: &CancellationToken,
) -> Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Err(AppError::ConnectionClosed);
        }
        let n = reader
            .read(&mut buf)
            .map_err(|e| AppError::TransferError(format!("read error: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| AppError::TransferError(format!("write error: {e}")))?;
        total += n as u64;
    }
    file.flush()
        .map_err(|e| AppError::TransferError(format!("write error: {e}")))?;
    Ok(total)
}

impl Connector for FtpConnector {
    type Session = FtpSession;

    async fn connect(&self, credentials: &Credentials) -> Result<FtpSession> {
        let endpoint = credentials.host_port();
        let username = credentials.username.clone();
        let password = credentials.password.clone();
        let io_timeout = self.io_timeout;
        info!("FTP: connecting to {} as {}", endpoint, username);

        let addr = endpoint.clone();
        let attempt = tokio::time::timeout(
            self.connect_timeout,
            tokio::task::spawn_blocking(move || -> Result<FtpStream> {
                let mut ftp = FtpStream::connect(&addr)
                    .map_err(|e| AppError::ConnectionError(format!("connect failed: {e}")))?;

                ftp.get_ref().set_read_timeout(Some(io_timeout)).ok();
                ftp.get_ref().set_write_timeout(Some(io_timeout)).ok();

                ftp.login(&username, &password)
                    .map_err(|e| AppError::ConnectionError(format!("login failed: {e}")))?;
                ftp.transfer_type(FileType::Binary).map_err(|e| {
                    AppError::ConnectionError(format!("failed to set binary mode: {e}"))
                })?;
                Ok(ftp)
            }),
        )
        .await;

        let stream = match attempt {
            Ok(Ok(inner)) => inner?,
            Ok(Err(e)) => return Err(AppError::ConnectionError(format!("task error: {e}"))),
            Err(_) => {
                return Err(AppError::ConnectionError(format!(
                    "timed out after {}s",
                    self.connect_timeout.as_secs()
                )));
            }
        };

        info!("FTP: connected to {}", endpoint);
        Ok(FtpSession {
            stream: Arc::new(Mutex::new(stream)),
            endpoint,
        })
    }
}

impl RemoteSession for FtpSession {
    async fn list_dir(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>> {
        debug!("FTP list: {} {}", self.endpoint, path);
        let stream = Arc::clone(&self.stream);
        let target = path.to_string();

        run_blocking(move || {
            let mut ftp = lock(&stream)?;
            let lines = ftp
                .list(Some(target.as_str()))
                .map_err(|e| classify(e, |reason| AppError::listing(target.clone(), reason)))?;
            let entries = parse_listing(&lines);
            debug!("FTP list {}: {} entries", target, entries.len());
            Ok(entries)
        })
        .await
    }

    async fn download(
        &self,
        remote: &RemotePath,
        local: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        debug!("FTP retr: {} -> {}", remote, local.display());
        let stream = Arc::clone(&self.stream);
        let source = remote.to_string();
        let destination: PathBuf = local.to_path_buf();
        let cancel = cancel.clone();

        run_blocking(move || {
            // Local file first: nothing may fail between RETR and its reply.
            let mut file = File::create(&destination).map_err(|e| {
                AppError::TransferError(format!("cannot create {}: {e}", destination.display()))
            })?;

            let mut ftp = lock(&stream)?;
            let mut reader = ftp
                .retr_as_stream(&source)
                .map_err(|e| classify(e, AppError::TransferError))?;

            match copy_stream(&mut reader, &mut file, &cancel) {
                Ok(total) => {
                    ftp.finalize_retr_stream(reader)
                        .map_err(|e| classify(e, AppError::TransferError))?;
                    Ok(total)
                }
                Err(err) => {
                    if let Err(e) = ftp.abort(reader) {
                        error!("FTP abort of {} failed: {}", source, e);
                        return Err(AppError::ConnectionLost(format!(
                            "control connection out of sync after aborted transfer: {e}"
                        )));
                    }
                    debug!("FTP retr {} aborted: {}", source, err);
                    Err(err)
                }
            }
        })
        .await
    }

    async fn disconnect(self) -> Result<()> {
        let endpoint = self.endpoint.clone();
        let stream = self.stream;
        run_blocking(move || {
            let mut ftp = lock(&stream)?;
            ftp.quit().map_err(|e| {
                error!("FTP quit failed for {}: {}", endpoint, e);
                AppError::ConnectionError(format!("quit failed: {e}"))
            })
        })
        .await
    }
}
