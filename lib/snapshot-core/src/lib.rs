#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate alloc;

#[macro_use]
extern crate serde;

pub mod artifact;
pub mod bundle;
mod descriptor;
mod error;
mod flags;
pub mod manifest;
mod page;
mod record;
pub mod wire;

pub use self::artifact::{Artifact, ArtifactNames};
pub use self::bundle::{ProcessSnapshot, RecordCounts};
pub use self::descriptor::{ProcessDescriptor, SnapState, NAME_LEN};
pub use self::error::Error;
pub use self::flags::PageFlags;
pub use self::manifest::Manifest;
pub use self::page::PageBuf;
pub use self::record::{ExecutionContext, Record, TrapFrame};

/// Size of one page (and one physical frame) in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Version stamped into every record header and the manifest.
pub const FORMAT_VERSION: u16 = 1;

pub type Result<T> = core::result::Result<T, Error>;

/// Number of pages needed to cover `length` bytes.
pub fn pages_required(length: u64) -> u64 {
    if length == 0 {
        return 0;
    }
    ((length - 1) / PAGE_SIZE as u64) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_required_rounds_up() {
        assert_eq!(pages_required(0), 0);
        assert_eq!(pages_required(1), 1);
        assert_eq!(pages_required(PAGE_SIZE as u64), 1);
        assert_eq!(pages_required(PAGE_SIZE as u64 + 1), 2);
        assert_eq!(pages_required(3 * PAGE_SIZE as u64), 3);
    }
}
