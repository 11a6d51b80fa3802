use alloc::boxed::Box;

use kernel_api::OsError;
use snapshot_core::{Artifact, ArtifactNames, Manifest, Record};

use crate::checkpoint::capture::{capture_context, capture_descriptor, capture_trapframe};
use crate::checkpoint::{CheckpointError, FrameExtractor};
use crate::fs::{File, FileSystem};
use crate::process::Process;
use crate::vm::PhysicalMemory;

/// Accounting for one completed checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointSummary {
    /// Bytes written to the page, flag, context, trap frame and descriptor
    /// artifacts.
    pub bytes: usize,
    pub pages: usize,
    /// Pages whose flags allow user access.
    pub user_pages: usize,
}

/// An artifact opened for one direction of transfer. Every transfer must move
/// the whole buffer in one call; anything less is a `ShortTransfer`.
pub(crate) struct ArtifactFile {
    artifact: Artifact,
    file: Box<dyn File>,
}

impl ArtifactFile {
    pub(crate) fn create(fs: &dyn FileSystem, names: &ArtifactNames, artifact: Artifact) -> Result<Self, CheckpointError> {
        let file = fs.create(&names.name(artifact))
            .map_err(|error| CheckpointError::Artifact { artifact, error })?;
        Ok(ArtifactFile { artifact, file })
    }

    pub(crate) fn open(fs: &dyn FileSystem, names: &ArtifactNames, artifact: Artifact) -> Result<Self, CheckpointError> {
        let file = fs.open(&names.name(artifact)).map_err(|error| match error {
            OsError::NoEntry => CheckpointError::MissingOrTruncated { artifact, len: None },
            error => CheckpointError::Artifact { artifact, error },
        })?;
        Ok(ArtifactFile { artifact, file })
    }

    pub(crate) fn size(&self) -> Result<u64, CheckpointError> {
        let artifact = self.artifact;
        self.file.size().map_err(|error| CheckpointError::Artifact { artifact, error })
    }

    pub(crate) fn write(&mut self, buf: &[u8]) -> Result<usize, CheckpointError> {
        let artifact = self.artifact;
        let actual = self.file.write(buf)
            .map_err(|error| CheckpointError::Artifact { artifact, error })?;
        if actual != buf.len() {
            warn!("{}: wrote {} of {} bytes", artifact, actual, buf.len());
            return Err(CheckpointError::ShortTransfer { artifact, expected: buf.len(), actual });
        }
        Ok(actual)
    }

    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), CheckpointError> {
        let artifact = self.artifact;
        let actual = self.file.read(buf)
            .map_err(|error| CheckpointError::Artifact { artifact, error })?;
        if actual != buf.len() {
            warn!("{}: read {} of {} bytes", artifact, actual, buf.len());
            return Err(CheckpointError::ShortTransfer { artifact, expected: buf.len(), actual });
        }
        Ok(())
    }

    pub(crate) fn sync(&mut self) -> Result<(), CheckpointError> {
        let artifact = self.artifact;
        self.file.sync().map_err(|error| CheckpointError::Artifact { artifact, error })
    }
}

fn remove_stale_manifest(fs: &dyn FileSystem, names: &ArtifactNames) -> Result<(), CheckpointError> {
    match fs.remove(&names.name(Artifact::Manifest)) {
        Ok(()) => {
            debug!("removed stale {}", names.name(Artifact::Manifest));
            Ok(())
        }
        Err(OsError::NoEntry) => Ok(()),
        Err(error) => Err(CheckpointError::Artifact { artifact: Artifact::Manifest, error }),
    }
}

/// Writes a complete snapshot of `process` to `fs`.
///
/// The caller must hold whatever keeps `process` from running or changing
/// its address space for the whole call. Pages are written in lockstep with
/// their flag words, then the context, trap frame and descriptor records.
/// The manifest is written last; a snapshot without one is incomplete and is
/// never restored. Artifacts written before a failure are left in place.
pub fn write_snapshot(fs: &dyn FileSystem, names: &ArtifactNames, process: &Process,
                      memory: &PhysicalMemory) -> Result<CheckpointSummary, CheckpointError> {
    remove_stale_manifest(fs, names)?;

    let mut pages = ArtifactFile::create(fs, names, Artifact::Pages)?;
    let mut flags = ArtifactFile::create(fs, names, Artifact::Flags)?;
    let mut context = ArtifactFile::create(fs, names, Artifact::Context)?;
    let mut trapframe = ArtifactFile::create(fs, names, Artifact::TrapFrame)?;
    let mut descriptor = ArtifactFile::create(fs, names, Artifact::Descriptor)?;

    let mut summary = CheckpointSummary { bytes: 0, pages: 0, user_pages: 0 };

    for frame in FrameExtractor::new(&process.vmap, memory, process.size) {
        let frame = frame?;
        summary.bytes += pages.write(frame.content)?;
        summary.bytes += flags.write(&frame.flags.to_word())?;
        summary.pages += 1;
        if frame.flags.is_user() {
            summary.user_pages += 1;
        }
    }

    summary.bytes += context.write(&capture_context(process).encode())?;
    summary.bytes += trapframe.write(&capture_trapframe(process).encode())?;
    let captured = capture_descriptor(process);
    summary.bytes += descriptor.write(&captured.encode())?;

    for file in [&mut pages, &mut flags, &mut context, &mut trapframe, &mut descriptor].iter_mut() {
        file.sync()?;
    }
    debug!("pid {}: five artifacts written ({} bytes)", process.pid, summary.bytes);

    let manifest = Manifest {
        pid: process.pid,
        name: process.name.clone(),
        state: captured.state,
        size: process.size as u64,
        page_count: summary.pages as u64,
        user_pages: summary.user_pages as u64,
        bytes: summary.bytes as u64,
        ..Manifest::new()
    };
    let encoded = manifest.encode()
        .map_err(|error| CheckpointError::Corrupt { artifact: Artifact::Manifest, error })?;
    let mut commit = ArtifactFile::create(fs, names, Artifact::Manifest)?;
    commit.write(&encoded)?;
    commit.sync()?;

    info!("checkpoint pid {} '{}': {} pages ({} user), {} bytes",
          process.pid, process.name, summary.pages, summary.user_pages, summary.bytes);

    Ok(summary)
}
