//! Snapshot of one remote directory.

use crate::path::RemotePath;
use crate::remote::{RemoteEntry, RemoteKind};

pub const PARENT_MARKER_NAME: &str = "..";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File { size: u64 },
    Directory,
    /// Synthetic row that leads one level up; no remote item backs it.
    ParentMarker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn parent_marker() -> Self {
        Self {
            name: PARENT_MARKER_NAME.to_string(),
            kind: EntryKind::ParentMarker,
        }
    }

    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File { size },
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    pub fn is_parent_marker(&self) -> bool {
        matches!(self.kind, EntryKind::ParentMarker)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    pub fn size(&self) -> Option<u64> {
        match self.kind {
            EntryKind::File { size } => Some(size),
            EntryKind::Directory | EntryKind::ParentMarker => None,
        }
    }
}

impl From<RemoteEntry> for DirectoryEntry {
    fn from(entry: RemoteEntry) -> Self {
        let kind = match entry.kind {
            RemoteKind::File => EntryKind::File { size: entry.size },
            RemoteKind::Directory => EntryKind::Directory,
        };
        Self {
            name: entry.name,
            kind,
        }
    }
}

/// Longest and shortest directory names of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameExtremes {
    pub longest: String,
    pub shortest: String,
}

/// Entries of one directory, in server order, behind an optional parent
/// marker. Never edited in place: every load builds a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    path: RemotePath,
    entries: Vec<DirectoryEntry>,
}

impl DirectoryListing {
    /// The parent marker comes first unless `path` is the root. Remote
    /// entries keep the order the server sent them in.
    pub fn build(path: RemotePath, remote_entries: Vec<RemoteEntry>) -> Self {
        let mut entries = Vec::with_capacity(remote_entries.len() + 1);
        if !path.is_root() {
            entries.push(DirectoryEntry::parent_marker());
        }
        entries.extend(remote_entries.into_iter().map(DirectoryEntry::from));
        Self { path, entries }
    }

    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&DirectoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_parent_marker(&self) -> bool {
        self.entries.first().is_some_and(DirectoryEntry::is_parent_marker)
    }

    /// Entries backed by a remote item.
    pub fn remote_entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter().filter(|e| !e.is_parent_marker())
    }

    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        self.remote_entries().find(|e| e.name == name)
    }

    /// `None` without subdirectories. Ties go to the entry listed first.
    pub fn directory_name_extremes(&self) -> Option<NameExtremes> {
        let mut dirs = self.remote_entries().filter(|e| e.is_directory());
        let first = dirs.next()?;
        let (mut longest, mut shortest) = (first, first);
        for dir in dirs {
            let len = dir.name.chars().count();
            if len > longest.name.chars().count() {
                longest = dir;
            }
            if len < shortest.name.chars().count() {
                shortest = dir;
            }
        }
        Some(NameExtremes {
            longest: longest.name.clone(),
            shortest: shortest.name.clone(),
        })
    }
}

/// `1536` -> `"1 KB"`. Whole units only, capped at GB.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes;
    let mut order = 0;
    while value >= 1024 && order < UNITS.len() - 1 {
        order += 1;
        value /= 1024;
    }
    format!("{} {}", value, UNITS[order])
}
