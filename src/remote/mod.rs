//! The remote-session collaborator.
//!
//! The controller only talks to a server through these traits; [`ftp`]
//! provides the real implementation.

use std::fmt;
use std::future::Future;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::path::RemotePath;

#[cfg(test)]
pub mod fake;
pub mod ftp;
pub mod list_parser;

pub use ftp::FtpConnector;

/// Endpoint plus login for one connection attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Host cannot be empty".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(AppError::ValidationError(
                "Port must be greater than 0".to_string(),
            ));
        }

        if self.username.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// Keep passwords out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    File,
    Directory,
}

/// One item as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: RemoteKind,
    pub size: u64,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: RemoteKind::File,
            size,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RemoteKind::Directory,
            size: 0,
        }
    }
}

/// Opens sessions.
pub trait Connector: Send + Sync {
    type Session: RemoteSession;

    fn connect(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// An authenticated connection.
///
/// Errors meaning "the transport is dead" must be reported as
/// [`AppError::ConnectionLost`]; everything else keeps the session usable.
pub trait RemoteSession: Send + Sync {
    /// Entries of `path` in server order.
    fn list_dir(&self, path: &RemotePath) -> impl Future<Output = Result<Vec<RemoteEntry>>> + Send;

    /// Stream `remote` into the local file `local`, returning the byte count.
    /// Fails with [`AppError::ConnectionClosed`] once `cancel` fires.
    fn download(
        &self,
        remote: &RemotePath,
        local: &Path,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<u64>> + Send;

    fn disconnect(self) -> impl Future<Output = Result<()>> + Send;
}
