//! Named persistent files, as seen by the snapshot service.

use alloc::boxed::Box;

use kernel_api::OsResult;

mod mem;

pub use self::mem::MemFileSystem;

/// An open file with a cursor.
///
/// Transfers report how many bytes actually moved; a count smaller than the
/// buffer is a short transfer and is left for the caller to judge.
pub trait File: Send {
    /// Reads from the cursor. Returns `0` at end of file.
    fn read(&mut self, buf: &mut [u8]) -> OsResult<usize>;

    /// Writes at the cursor.
    fn write(&mut self, buf: &[u8]) -> OsResult<usize>;

    /// Current length of the file in bytes.
    fn size(&self) -> OsResult<u64>;

    /// Makes written data durable.
    fn sync(&mut self) -> OsResult<()> {
        Ok(())
    }
}

pub trait FileSystem: Send + Sync {
    /// Creates `name`, truncating any existing file, and opens it for writing.
    fn create(&self, name: &str) -> OsResult<Box<dyn File>>;

    /// Opens an existing file for reading. Fails with `NoEntry` if absent.
    fn open(&self, name: &str) -> OsResult<Box<dyn File>>;

    /// Removes `name`. Fails with `NoEntry` if absent.
    fn remove(&self, name: &str) -> OsResult<()>;

    fn exists(&self, name: &str) -> bool {
        self.open(name).is_ok()
    }
}
