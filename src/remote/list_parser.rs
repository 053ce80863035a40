//! Parsing of FTP `LIST` output.
//!
//! Line parsing is done by `suppaftp::list::File`, which understands the two
//! layouts nearly every server uses:
//!
//! ```text
//! drwxr-xr-x 2 owner group 4096 Jan 1 12:00 dirname
//! -rw-r--r-- 1 owner group 12345 Jan 1 12:00 file name.txt
//! 01-01-24  12:00PM       <DIR>          dirname
//! 01-01-24  12:00PM                12345 file.txt
//! ```

use std::str::FromStr;

use suppaftp::list::File;
use tracing::trace;

use super::RemoteEntry;

/// Parse a full `LIST` response, keeping server order and dropping `.`,
/// `..`, `total` lines and anything unrecognised.
pub fn parse_listing<I, S>(lines: I) -> Vec<RemoteEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| parse_list_line(line.as_ref()))
        .collect()
}

/// Symlinks come back as files named after the link itself.
pub fn parse_list_line(line: &str) -> Option<RemoteEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let file = match File::from_str(line) {
        Ok(file) => file,
        Err(e) => {
            trace!("Skipping LIST line {:?}: {:?}", line, e);
            return None;
        }
    };

    let name = file.name();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }

    if file.is_directory() {
        Some(RemoteEntry::directory(name))
    } else {
        Some(RemoteEntry::file(name, file.size() as u64))
    }
}
