use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use kernel::fs::{File, FileSystem};
use kernel_api::{OsError, OsResult};

fn os_error(e: io::Error) -> OsError {
    match e.kind() {
        io::ErrorKind::NotFound => OsError::NoEntry,
        io::ErrorKind::PermissionDenied => OsError::NoAccess,
        io::ErrorKind::AlreadyExists => OsError::FileExists,
        io::ErrorKind::UnexpectedEof => OsError::IoErrorEof,
        io::ErrorKind::InvalidData => OsError::IoErrorInvalidData,
        io::ErrorKind::InvalidInput => OsError::IoErrorInvalidInput,
        _ => OsError::IoError,
    }
}

/// Snapshot artifacts stored as plain files in one host directory.
pub struct HostFileSystem {
    root: PathBuf,
}

impl HostFileSystem {
    pub fn new<P: Into<PathBuf>>(root: P) -> HostFileSystem {
        HostFileSystem { root: root.into() }
    }

    fn path(&self, name: &str) -> OsResult<PathBuf> {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(OsError::InvalidArgument);
        }
        Ok(self.root.join(name))
    }
}

struct HostFile {
    file: fs::File,
}

impl File for HostFile {
    fn read(&mut self, mut buf: &mut [u8]) -> OsResult<usize> {
        let mut total = 0;
        while !buf.is_empty() {
            match self.file.read(buf) {
                Ok(0) => break,
                Ok(n) => {
                    total += n;
                    buf = &mut buf[n..];
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(os_error(e)),
            }
        }
        Ok(total)
    }

    fn write(&mut self, buf: &[u8]) -> OsResult<usize> {
        self.file.write_all(buf).map_err(os_error)?;
        Ok(buf.len())
    }

    fn size(&self) -> OsResult<u64> {
        self.file.metadata().map(|m| m.len()).map_err(os_error)
    }

    fn sync(&mut self) -> OsResult<()> {
        self.file.sync_all().map_err(os_error)
    }
}

impl FileSystem for HostFileSystem {
    fn create(&self, name: &str) -> OsResult<Box<dyn File>> {
        let file = fs::File::create(self.path(name)?).map_err(os_error)?;
        Ok(Box::new(HostFile { file }))
    }

    fn open(&self, name: &str) -> OsResult<Box<dyn File>> {
        let file = fs::File::open(self.path(name)?).map_err(os_error)?;
        Ok(Box::new(HostFile { file }))
    }

    fn remove(&self, name: &str) -> OsResult<()> {
        fs::remove_file(self.path(name)?).map_err(os_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use kernel::config::Config;
    use kernel::Kernel;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snapctl-{}-{}", name, std::process::id()));
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn files_round_trip() {
        let dir = scratch("files");
        let fs = HostFileSystem::new(&dir);

        let mut file = fs.create("page_file").unwrap();
        assert_eq!(file.write(b"abc").unwrap(), 3);
        file.sync().unwrap();
        drop(file);

        let mut file = fs.open("page_file").unwrap();
        assert_eq!(file.size(), Ok(3));
        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");

        assert!(fs.exists("page_file"));
        fs.remove("page_file").unwrap();
        assert_eq!(fs.open("page_file").err(), Some(OsError::NoEntry));
        assert_eq!(fs.remove("page_file"), Err(OsError::NoEntry));
        assert_eq!(fs.create("../escape").err(), Some(OsError::InvalidArgument));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn kernel_snapshot_survives_on_disk() {
        let dir = scratch("kernel");
        let host: Arc<dyn FileSystem> = Arc::new(HostFileSystem::new(&dir));

        let writer = Kernel::new(Config::default().frames(8), host.clone());
        let pid = writer.spawn("disk", b"on disk").unwrap();
        writer.checkpoint(pid).unwrap();

        // a different kernel instance reads it back
        let reader = Kernel::new(Config::default().frames(8), host);
        let restored = reader.restore().unwrap();
        let name = reader.with_process(restored, |p, _| p.name.clone()).unwrap();
        assert_eq!(name, "disk");
        assert!(!dir.join("snapshot_manifest").exists());

        fs::remove_dir_all(&dir).ok();
    }
}
