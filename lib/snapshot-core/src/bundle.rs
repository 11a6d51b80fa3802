use alloc::vec::Vec;
use core::fmt;

use crate::{ExecutionContext, Manifest, PageBuf, PageFlags, ProcessDescriptor, TrapFrame};

/// Everything read back from one complete snapshot.
///
/// `pages` and `flags` are index-aligned: entry `i` describes the page at
/// virtual address `i * PAGE_SIZE`.
#[derive(Clone, Default)]
pub struct ProcessSnapshot {
    pub pages: Vec<PageBuf>,
    pub flags: Vec<PageFlags>,
    pub context: ExecutionContext,
    pub trapframe: TrapFrame,
    pub descriptor: ProcessDescriptor,
    pub manifest: Manifest,
}

/// Record counts a snapshot claims in each of the places that carry one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordCounts {
    pub pages: usize,
    pub flags: usize,
    /// Derived from the descriptor's address-space size.
    pub expected: usize,
    pub manifest: usize,
}

impl RecordCounts {
    pub fn is_consistent(&self) -> bool {
        self.pages == self.flags && self.pages == self.expected && self.pages == self.manifest
    }
}

impl ProcessSnapshot {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn user_pages(&self) -> usize {
        self.flags.iter().filter(|f| f.is_user()).count()
    }

    pub fn record_counts(&self) -> RecordCounts {
        RecordCounts {
            pages: self.pages.len(),
            flags: self.flags.len(),
            expected: self.descriptor.page_count(),
            manifest: self.manifest.page_count as usize,
        }
    }
}

impl fmt::Debug for ProcessSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSnapshot")
            .field("pages", &self.pages.len())
            .field("flags", &"<omitted>")
            .field("context", &self.context)
            .field("trapframe", &"<omitted>")
            .field("descriptor", &self.descriptor)
            .field("manifest", &self.manifest)
            .finish()
    }
}
