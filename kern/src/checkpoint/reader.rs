use alloc::vec::Vec;

use snapshot_core::{Artifact, ArtifactNames, ExecutionContext, Manifest, PageBuf, PageFlags,
                    ProcessDescriptor, ProcessSnapshot, Record, TrapFrame, PAGE_SIZE};

use crate::checkpoint::writer::ArtifactFile;
use crate::checkpoint::CheckpointError;
use crate::fs::FileSystem;

/// Opens `artifact` and checks that its length is a whole number of records.
/// Returns the file and the number of records it holds.
fn open_checked(fs: &dyn FileSystem, names: &ArtifactNames, artifact: Artifact)
                -> Result<(ArtifactFile, usize), CheckpointError> {
    let file = ArtifactFile::open(fs, names, artifact)?;
    let len = file.size()?;

    let count = match artifact.record_size() {
        Some(size) => {
            let size = size as u64;
            let whole = len % size == 0;
            if !whole || (artifact.is_single_record() && len != size) {
                warn!("{}: {} bytes is not a whole number of {}-byte records", artifact, len, size);
                return Err(CheckpointError::MissingOrTruncated { artifact, len: Some(len) });
            }
            (len / size) as usize
        }
        None => {
            if len == 0 {
                return Err(CheckpointError::MissingOrTruncated { artifact, len: Some(0) });
            }
            1
        }
    };

    Ok((file, count))
}

fn read_all(file: &mut ArtifactFile) -> Result<Vec<u8>, CheckpointError> {
    let mut buf = vec![0u8; file.size()? as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_record<T: Record>(fs: &dyn FileSystem, names: &ArtifactNames, artifact: Artifact)
                          -> Result<T, CheckpointError> {
    let (mut file, _) = open_checked(fs, names, artifact)?;
    let bytes = read_all(&mut file)?;
    T::decode(&bytes).map_err(|error| CheckpointError::Corrupt { artifact, error })
}

/// Reads a complete snapshot back from `fs`.
///
/// A snapshot without a manifest is still being written (or was never
/// finished) and is reported missing. Every other artifact must be present
/// and a whole number of records long. Counts are not cross-checked here;
/// see [`ProcessSnapshot::record_counts`].
pub fn read_snapshot(fs: &dyn FileSystem, names: &ArtifactNames) -> Result<ProcessSnapshot, CheckpointError> {
    let (mut file, _) = open_checked(fs, names, Artifact::Manifest)?;
    let manifest = Manifest::decode(&read_all(&mut file)?)
        .map_err(|error| CheckpointError::Corrupt { artifact: Artifact::Manifest, error })?;

    let (mut page_file, page_count) = open_checked(fs, names, Artifact::Pages)?;
    let (mut flag_file, flag_count) = open_checked(fs, names, Artifact::Flags)?;

    let mut pages = Vec::with_capacity(page_count);
    for _ in 0..page_count {
        let mut page = PageBuf::zeroed();
        page_file.read_exact(&mut page)?;
        pages.push(page);
    }

    let words = read_all(&mut flag_file)?;
    let flags: Vec<PageFlags> = words.chunks(PageFlags::WORD_SIZE)
        .map(PageFlags::from_word)
        .collect();
    debug_assert_eq!(flags.len(), flag_count);

    let context: ExecutionContext = read_record(fs, names, Artifact::Context)?;
    let trapframe: TrapFrame = read_record(fs, names, Artifact::TrapFrame)?;
    let descriptor: ProcessDescriptor = read_record(fs, names, Artifact::Descriptor)?;

    debug!("read snapshot of pid {} '{}': {} pages, {} flag words ({} bytes of pages)",
           descriptor.pid, descriptor.name(), pages.len(), flags.len(), pages.len() * PAGE_SIZE);

    Ok(ProcessSnapshot { pages, flags, context, trapframe, descriptor, manifest })
}
