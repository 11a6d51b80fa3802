use core::fmt;

use kernel_api::OsError;
use snapshot_core::Artifact;

use crate::process::Id;
use crate::vm::VirtualAddr;

/// Why a page below the recorded address-space size could not be captured.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Inconsistency {
    /// The page table has no entry for the page.
    NotMapped,
    /// The entry exists but its present bit is clear.
    NotPresent,
    /// The entry names a physical frame that is not allocated.
    NoFrame,
}

#[derive(Debug)]
pub enum CheckpointError {
    /// Creating, opening, reading, writing, syncing or removing an artifact failed.
    Artifact { artifact: Artifact, error: OsError },
    /// A transfer on an artifact moved fewer bytes than requested.
    ShortTransfer { artifact: Artifact, expected: usize, actual: usize },
    /// The page walk hit a hole below the recorded size.
    InconsistentAddressSpace { va: VirtualAddr, reason: Inconsistency },
    /// An artifact is absent (`len` is `None`) or its length is not a whole
    /// number of records.
    MissingOrTruncated { artifact: Artifact, len: Option<u64> },
    /// An artifact has the right length but does not decode.
    Corrupt { artifact: Artifact, error: snapshot_core::Error },
    /// Not enough frames to materialise the restored pages.
    AllocationExhausted { pages: usize },
    /// The page stream, flag stream, descriptor and manifest disagree on the
    /// number of pages.
    RecordCountMismatch { pages: usize, flags: usize, expected: usize },
    NoSuchProcess(Id),
    /// Any other failure reported by the process subsystem.
    Process(OsError),
}

impl CheckpointError {
    /// The status reported to user space for this error.
    pub fn as_os_error(&self) -> OsError {
        use CheckpointError::*;
        match self {
            Artifact { .. } => OsError::IoError,
            ShortTransfer { .. } => OsError::IoErrorEof,
            InconsistentAddressSpace { .. } => OsError::BadAddress,
            MissingOrTruncated { .. } => OsError::NoEntry,
            Corrupt { .. } | RecordCountMismatch { .. } => OsError::IoErrorInvalidData,
            AllocationExhausted { .. } => OsError::NoMemory,
            NoSuchProcess(_) => OsError::InvalidArgument,
            Process(e) => *e,
        }
    }
}

impl From<OsError> for CheckpointError {
    fn from(e: OsError) -> Self {
        CheckpointError::Process(e)
    }
}

impl From<CheckpointError> for OsError {
    fn from(e: CheckpointError) -> Self {
        e.as_os_error()
    }
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CheckpointError::*;
        match self {
            Artifact { artifact, error } => write!(f, "{}: {}", artifact, error),
            ShortTransfer { artifact, expected, actual } =>
                write!(f, "{}: short transfer ({} of {} bytes)", artifact, actual, expected),
            InconsistentAddressSpace { va, reason } =>
                write!(f, "inconsistent address space at {}: {:?}", va, reason),
            MissingOrTruncated { artifact, len: None } => write!(f, "{}: missing", artifact),
            MissingOrTruncated { artifact, len: Some(len) } =>
                write!(f, "{}: truncated ({} bytes)", artifact, len),
            Corrupt { artifact, error } => write!(f, "{}: {}", artifact, error),
            AllocationExhausted { pages } => write!(f, "out of frames restoring {} pages", pages),
            RecordCountMismatch { pages, flags, expected } =>
                write!(f, "record count mismatch: {} pages, {} flags, {} expected", pages, flags, expected),
            NoSuchProcess(pid) => write!(f, "no process with pid {}", pid),
            Process(e) => write!(f, "process: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn maps_to_user_visible_status() {
        let missing = CheckpointError::MissingOrTruncated { artifact: Artifact::Flags, len: None };
        assert_eq!(missing.as_os_error(), OsError::NoEntry);
        assert_eq!(missing.to_string(), "flag_file: missing");

        let gap = CheckpointError::InconsistentAddressSpace {
            va: VirtualAddr::from(0x1000usize),
            reason: Inconsistency::NotPresent,
        };
        assert_eq!(OsError::from(gap), OsError::BadAddress);

        assert_eq!(CheckpointError::from(OsError::NoVmSpace).as_os_error(), OsError::NoVmSpace);
        assert_eq!(CheckpointError::AllocationExhausted { pages: 3 }.as_os_error(), OsError::NoMemory);
    }
}
