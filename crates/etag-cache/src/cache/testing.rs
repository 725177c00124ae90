//! In-memory storage and scripted transport for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use super::error::TransportError;
use super::storage::CacheStorage;
use super::transport::{CancelToken, Transport, TransportResponse};

#[derive(Default)]
pub struct MemoryStorage {
    files: RefCell<HashMap<PathBuf, String>>,
    dirs: RefCell<HashSet<PathBuf>>,
    failing_reads: RefCell<HashSet<PathBuf>>,
    failing_writes: RefCell<HashSet<PathBuf>>,
    failing_nonblank_writes: RefCell<HashSet<PathBuf>>,
    failing_dirs: RefCell<HashSet<PathBuf>>,
}

impl MemoryStorage {
    pub fn insert(&self, path: &Path, text: &str) {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), text.to_string());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn has_dir(&self, dir: &Path) -> bool {
        self.dirs.borrow().contains(dir)
    }

    pub fn is_untouched(&self) -> bool {
        self.files.borrow().is_empty() && self.dirs.borrow().is_empty()
    }

    pub fn fail_reads_from(&self, path: &Path) {
        self.failing_reads.borrow_mut().insert(path.to_path_buf());
    }

    pub fn fail_writes_to(&self, path: &Path) {
        self.failing_writes.borrow_mut().insert(path.to_path_buf());
    }

    /// Fail writes to `path` unless the text is empty.
    pub fn fail_nonblank_writes_to(&self, path: &Path) {
        self.failing_nonblank_writes
            .borrow_mut()
            .insert(path.to_path_buf());
    }

    pub fn fail_create_dir(&self, dir: &Path) {
        self.failing_dirs.borrow_mut().insert(dir.to_path_buf());
    }
}

impl CacheStorage for MemoryStorage {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        if self.failing_dirs.borrow().contains(dir) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        self.dirs.borrow_mut().insert(dir.to_path_buf());
        Ok(())
    }

    fn read_text(&self, path: &Path) -> io::Result<Option<String>> {
        if self.failing_reads.borrow().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        Ok(self.get(path))
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        let rejects_text =
            !text.is_empty() && self.failing_nonblank_writes.borrow().contains(path);
        if rejects_text || self.failing_writes.borrow().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        self.insert(path, text);
        Ok(())
    }
}

/// A request observed by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct SeenRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl SeenRequest {
    pub fn if_none_match(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| *name == "if-none-match")
            .map(|(_, value)| value.as_str())
    }
}

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<TransportResponse, TransportError>>>,
    seen: RefCell<Vec<SeenRequest>>,
}

impl ScriptedTransport {
    pub fn reply(self, reply: Result<TransportResponse, TransportError>) -> Self {
        self.replies.borrow_mut().push_back(reply);
        self
    }

    pub fn ok(self, response: TransportResponse) -> Self {
        self.reply(Ok(response))
    }

    pub fn json(self, body: &str, etag: Option<&str>) -> Self {
        let mut response = TransportResponse::new(200).with_body(body);
        if let Some(etag) = etag {
            response = response.with_header("ETag", etag);
        }
        self.ok(response)
    }

    pub fn refused(self) -> Self {
        self.reply(Err(TransportError::Connection(
            "connection refused".to_string(),
        )))
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        cancel: &CancelToken,
    ) -> Result<TransportResponse, TransportError> {
        self.seen.borrow_mut().push(SeenRequest {
            url: url.to_string(),
            headers: headers.to_vec(),
        });
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("no scripted reply".to_string())))
    }
}
