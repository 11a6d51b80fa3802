use alloc::collections::BTreeMap;

use kernel_api::{OsError, OsResult};
use snapshot_core::PageFlags;

use crate::param::{PAGE_MASK, PAGE_SIZE};
use crate::vm::{PhysicalAddr, VirtualAddr};

/// A page-table entry: frame address in the high bits, flags in the low 12.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawEntry(u64);

impl RawEntry {
    const ADDR_MASK: u64 = !PageFlags::MASK;

    pub fn new(pa: PhysicalAddr, flags: PageFlags) -> RawEntry {
        RawEntry((pa.as_u64() & Self::ADDR_MASK) | flags.bits())
    }

    pub fn addr(&self) -> PhysicalAddr {
        PhysicalAddr::from(self.0 & Self::ADDR_MASK)
    }

    pub fn flags(&self) -> PageFlags {
        PageFlags::from_entry(self.0)
    }

    pub fn is_present(&self) -> bool {
        self.flags().is_present()
    }

    pub fn set_flags(&mut self, flags: PageFlags) {
        self.0 = (self.0 & Self::ADDR_MASK) | flags.bits();
    }
}

impl core::fmt::Debug for RawEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "RawEntry({} {:?})", self.addr(), self.flags())
    }
}

/// The user half of a process's address space.
pub struct UserPageTable {
    entries: BTreeMap<usize, RawEntry>,
}

impl UserPageTable {
    pub fn new() -> UserPageTable {
        UserPageTable { entries: BTreeMap::new() }
    }

    fn locate(va: VirtualAddr) -> usize {
        (va.as_usize() & PAGE_MASK) / PAGE_SIZE
    }

    /// Looks up the entry covering `va`. `None` means no mapping exists.
    pub fn walk(&self, va: VirtualAddr) -> Option<&RawEntry> {
        self.entries.get(&Self::locate(va))
    }

    pub fn walk_mut(&mut self, va: VirtualAddr) -> Option<&mut RawEntry> {
        self.entries.get_mut(&Self::locate(va))
    }

    /// Maps the page containing `va` to the frame at `pa`.
    ///
    /// Fails with `InvalidArgument` if the page is already mapped.
    pub fn map(&mut self, va: VirtualAddr, pa: PhysicalAddr, flags: PageFlags) -> OsResult<()> {
        if !pa.is_aligned(PAGE_SIZE) {
            return Err(OsError::InvalidArgument);
        }
        let index = Self::locate(va);
        if self.entries.contains_key(&index) {
            return Err(OsError::InvalidArgument);
        }
        self.entries.insert(index, RawEntry::new(pa, flags));
        Ok(())
    }

    pub fn unmap(&mut self, va: VirtualAddr) -> Option<RawEntry> {
        self.entries.remove(&Self::locate(va))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Mapped pages in ascending virtual-address order.
    pub fn iter(&self) -> impl Iterator<Item=(VirtualAddr, &RawEntry)> {
        self.entries.iter().map(|(index, entry)| (VirtualAddr::from(index * PAGE_SIZE), entry))
    }
}

impl Default for UserPageTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_rounds_down_to_the_page() {
        let mut table = UserPageTable::new();
        let pa = PhysicalAddr::from(0x20_0000usize);
        table.map(VirtualAddr::from(PAGE_SIZE), pa, PageFlags::PRESENT | PageFlags::USER).unwrap();

        let entry = table.walk(VirtualAddr::from(PAGE_SIZE + 17)).unwrap();
        assert_eq!(entry.addr(), pa);
        assert_eq!(entry.flags().bits(), 0b101);
        assert!(table.walk(VirtualAddr::from(0usize)).is_none());
        assert!(table.walk(VirtualAddr::from(PAGE_SIZE)).unwrap().is_present());
    }

    #[test]
    fn remapping_is_refused() {
        let mut table = UserPageTable::new();
        let pa = PhysicalAddr::from(0x20_0000usize);
        table.map(VirtualAddr::from(0usize), pa, PageFlags::PRESENT).unwrap();
        assert_eq!(table.map(VirtualAddr::from(0usize), pa, PageFlags::PRESENT), Err(OsError::InvalidArgument));
        assert_eq!(table.map(VirtualAddr::from(PAGE_SIZE), PhysicalAddr::from(3usize), PageFlags::PRESENT),
                   Err(OsError::InvalidArgument));
    }

    #[test]
    fn clearing_present_keeps_the_mapping() {
        let mut table = UserPageTable::new();
        let pa = PhysicalAddr::from(0x20_0000usize);
        table.map(VirtualAddr::from(0usize), pa, PageFlags::PRESENT | PageFlags::WRITABLE).unwrap();
        table.walk_mut(VirtualAddr::from(0usize)).unwrap().set_flags(PageFlags::WRITABLE);

        let entry = table.walk(VirtualAddr::from(0usize)).unwrap();
        assert!(!entry.is_present());
        assert_eq!(entry.addr(), pa);
    }
}
