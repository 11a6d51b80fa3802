use alloc::boxed::Box;
use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::PAGE_SIZE;

/// The contents of one page.
#[derive(Clone, PartialEq, Eq)]
pub struct PageBuf(Box<[u8; PAGE_SIZE]>);

impl PageBuf {
    pub fn zeroed() -> Self {
        PageBuf(Box::new([0; PAGE_SIZE]))
    }

    pub fn filled(byte: u8) -> Self {
        PageBuf(Box::new([byte; PAGE_SIZE]))
    }

    /// Copies a full page out of `bytes`. Returns `None` unless `bytes` is
    /// exactly one page long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PAGE_SIZE {
            return None;
        }
        let mut page = Self::zeroed();
        page.copy_from_slice(bytes);
        Some(page)
    }
}

impl Deref for PageBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl DerefMut for PageBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.0[..]
    }
}

impl fmt::Debug for PageBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageBuf(<{} bytes>)", PAGE_SIZE)
    }
}
