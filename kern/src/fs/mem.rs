use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use spin::Mutex;

use kernel_api::{OsError, OsResult};

use crate::fs::{File, FileSystem};

type Contents = Arc<Mutex<Vec<u8>>>;

/// A file system held entirely in memory.
///
/// `with_max_file_size` caps every file; writes past the cap are cut short,
/// which is how storage exhaustion shows up to callers.
pub struct MemFileSystem {
    files: Mutex<HashMap<String, Contents>>,
    max_file_size: Option<usize>,
}

impl MemFileSystem {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            max_file_size: None,
        }
    }

    pub fn with_max_file_size(max: usize) -> Self {
        Self { max_file_size: Some(max), ..Self::new() }
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// A copy of the contents of `name`.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().get(name).map(|c| c.lock().clone())
    }

    /// Replaces the contents of `name`, creating it if needed.
    pub fn put(&self, name: &str, bytes: &[u8]) {
        let contents = Arc::new(Mutex::new(bytes.to_vec()));
        self.files.lock().insert(String::from(name), contents);
    }

    pub fn truncate(&self, name: &str, len: usize) -> OsResult<()> {
        let files = self.files.lock();
        let contents = files.get(name).ok_or(OsError::NoEntry)?;
        contents.lock().truncate(len);
        Ok(())
    }
}

impl Default for MemFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Read,
    Write,
}

struct MemFile {
    contents: Contents,
    offset: usize,
    mode: Mode,
    max_size: Option<usize>,
}

impl File for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> OsResult<usize> {
        if self.mode != Mode::Read {
            return Err(OsError::NoAccess);
        }
        let contents = self.contents.lock();
        if self.offset >= contents.len() {
            return Ok(0);
        }
        let len = core::cmp::min(buf.len(), contents.len() - self.offset);
        buf[..len].copy_from_slice(&contents[self.offset..self.offset + len]);
        self.offset += len;
        Ok(len)
    }

    fn write(&mut self, buf: &[u8]) -> OsResult<usize> {
        if self.mode != Mode::Write {
            return Err(OsError::NoAccess);
        }
        let room = match self.max_size {
            Some(max) => max.saturating_sub(self.offset),
            None => buf.len(),
        };
        let len = core::cmp::min(buf.len(), room);

        let mut contents = self.contents.lock();
        let end = self.offset + len;
        if contents.len() < end {
            contents.resize(end, 0);
        }
        contents[self.offset..end].copy_from_slice(&buf[..len]);
        self.offset = end;
        Ok(len)
    }

    fn size(&self) -> OsResult<u64> {
        Ok(self.contents.lock().len() as u64)
    }
}

impl FileSystem for MemFileSystem {
    fn create(&self, name: &str) -> OsResult<Box<dyn File>> {
        if name.is_empty() {
            return Err(OsError::InvalidArgument);
        }
        let contents: Contents = Arc::new(Mutex::new(Vec::new()));
        self.files.lock().insert(String::from(name), contents.clone());
        Ok(Box::new(MemFile { contents, offset: 0, mode: Mode::Write, max_size: self.max_file_size }))
    }

    fn open(&self, name: &str) -> OsResult<Box<dyn File>> {
        let contents = self.files.lock().get(name).cloned().ok_or(OsError::NoEntry)?;
        Ok(Box::new(MemFile { contents, offset: 0, mode: Mode::Read, max_size: None }))
    }

    fn remove(&self, name: &str) -> OsResult<()> {
        self.files.lock().remove(name).map(|_| ()).ok_or(OsError::NoEntry)
    }
}
