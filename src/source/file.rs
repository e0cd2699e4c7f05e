//! File-based live channel.
//!
//! Replays a snapshot from a JSON file. Useful for demos, offline review of
//! a captured snapshot, and the non-interactive export mode.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::Value;

use super::{ChannelEvent, LiveChannel};
use crate::error::ChannelError;

/// A live channel that reads snapshots from a JSON file.
///
/// The file counts as connected while it is readable. Every
/// `request_update` re-reads it, and a newer modification time pushes a
/// fresh snapshot without being asked.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    connected: bool,
    update_requested: bool,
    last_modified: Option<SystemTime>,
    pending: VecDeque<ChannelEvent>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            connected: false,
            update_requested: false,
            last_modified: None,
            pending: VecDeque::new(),
        }
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file once.
    pub fn read_snapshot(&self) -> Result<Value, String> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| format!("Read error: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Parse error: {}", e))
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn load(&mut self) {
        match self.read_snapshot() {
            Ok(value) => {
                if !self.connected {
                    self.connected = true;
                    self.pending.push_back(ChannelEvent::Connected);
                }
                self.pending.push_back(ChannelEvent::ClusterUpdate(value));
            }
            Err(e) => {
                if self.connected {
                    self.connected = false;
                    self.pending.push_back(ChannelEvent::Disconnected);
                } else {
                    self.pending.push_back(ChannelEvent::ConnectError(e));
                }
            }
        }
    }
}

impl LiveChannel for FileSource {
    fn poll(&mut self) -> Option<ChannelEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        let current_modified = self.modified_time();
        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,        // First poll, always read
            (Some(_), None) => false, // File disappeared, keep what we have
            (Some(last), Some(current)) => current > last,
        };

        if file_changed || self.update_requested {
            self.update_requested = false;
            // Record even when unreadable so a broken file is reported once
            self.last_modified = current_modified.or(Some(SystemTime::UNIX_EPOCH));
            self.load();
        }

        self.pending.pop_front()
    }

    fn request_update(&mut self) -> Result<(), ChannelError> {
        self.update_requested = true;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
