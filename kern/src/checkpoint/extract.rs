use crate::checkpoint::{CheckpointError, Inconsistency};
use crate::param::PAGE_SIZE;
use crate::vm::{PhysicalMemory, UserPageTable, VirtualAddr};
use snapshot_core::PageFlags;

/// One captured page: its contents as seen through the kernel's view of
/// physical memory, and the flag word from its page-table entry.
#[derive(Debug)]
pub struct Frame<'a> {
    pub va: VirtualAddr,
    pub content: &'a [u8],
    pub flags: PageFlags,
}

/// Walks a page table over `[0, size)` one page at a time, in ascending
/// virtual address order.
///
/// Every page below `size` must be mapped and present. The first page that is
/// not yields an `InconsistentAddressSpace` error, after which the iterator is
/// exhausted. The page table is never modified.
pub struct FrameExtractor<'a> {
    vmap: &'a UserPageTable,
    memory: &'a PhysicalMemory,
    next: usize,
    size: usize,
    failed: bool,
}

impl<'a> FrameExtractor<'a> {
    pub fn new(vmap: &'a UserPageTable, memory: &'a PhysicalMemory, size: usize) -> FrameExtractor<'a> {
        FrameExtractor { vmap, memory, next: 0, size, failed: false }
    }

    fn extract(&self, va: VirtualAddr) -> Result<Frame<'a>, Inconsistency> {
        let entry = self.vmap.walk(va).ok_or(Inconsistency::NotMapped)?;
        if !entry.is_present() {
            return Err(Inconsistency::NotPresent);
        }
        let content = self.memory.frame(entry.addr()).ok_or(Inconsistency::NoFrame)?;
        Ok(Frame { va, content, flags: entry.flags() })
    }
}

impl<'a> Iterator for FrameExtractor<'a> {
    type Item = Result<Frame<'a>, CheckpointError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= self.size {
            return None;
        }

        let va = VirtualAddr::from(self.next);
        self.next += PAGE_SIZE;

        match self.extract(va) {
            Ok(frame) => {
                trace!("extract {} flags={:?}", va, frame.flags);
                Some(Ok(frame))
            }
            Err(reason) => {
                error!("address space inconsistent at {}: {:?} (size {:#x})", va, reason, self.size);
                self.failed = true;
                Some(Err(CheckpointError::InconsistentAddressSpace { va, reason }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = (self.size.saturating_sub(self.next) + PAGE_SIZE - 1) / PAGE_SIZE;
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;
    use crate::process::Process;

    fn urw() -> PageFlags {
        PageFlags::PRESENT | PageFlags::USER | PageFlags::WRITABLE
    }

    #[test]
    fn yields_pages_in_address_order() {
        let mut memory = PhysicalMemory::new(4);
        let mut p = Process::new(String::from("p"));
        p.grow(&mut memory, 3 * PAGE_SIZE, urw()).unwrap();
        for i in 0..3usize {
            p.copy_in(&mut memory, VirtualAddr::from(i * PAGE_SIZE), &[i as u8 + 1]).unwrap();
        }

        let frames: Vec<_> = FrameExtractor::new(&p.vmap, &memory, p.size)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.va.as_usize(), i * PAGE_SIZE);
            assert_eq!(frame.content[0], i as u8 + 1);
            assert_eq!(frame.content.len(), PAGE_SIZE);
            assert_eq!(frame.flags, urw());
        }
    }

    #[test]
    fn partial_last_page_is_included() {
        let mut memory = PhysicalMemory::new(4);
        let mut p = Process::new(String::from("p"));
        p.grow(&mut memory, PAGE_SIZE + 1, urw()).unwrap();
        assert_eq!(FrameExtractor::new(&p.vmap, &memory, p.size).count(), 2);
        assert_eq!(FrameExtractor::new(&p.vmap, &memory, 0).count(), 0);
    }

    #[test]
    fn stops_at_first_gap() {
        let mut memory = PhysicalMemory::new(4);
        let mut p = Process::new(String::from("p"));
        p.grow(&mut memory, 3 * PAGE_SIZE, urw()).unwrap();
        let entry = p.vmap.unmap(VirtualAddr::from(PAGE_SIZE)).unwrap();
        memory.free(entry.addr());

        let mut walk = FrameExtractor::new(&p.vmap, &memory, p.size);
        assert!(walk.next().unwrap().is_ok());
        match walk.next() {
            Some(Err(CheckpointError::InconsistentAddressSpace { va, reason })) => {
                assert_eq!(va.as_usize(), PAGE_SIZE);
                assert_eq!(reason, Inconsistency::NotMapped);
            }
            other => panic!("unexpected {:?}", other.map(|r| r.map(|f| f.va))),
        }
        assert!(walk.next().is_none());
    }

    #[test]
    fn clear_present_bit_is_a_gap() {
        let mut memory = PhysicalMemory::new(4);
        let mut p = Process::new(String::from("p"));
        p.grow(&mut memory, PAGE_SIZE, urw()).unwrap();
        p.vmap.walk_mut(VirtualAddr::from(0usize)).unwrap()
            .set_flags(PageFlags::USER | PageFlags::WRITABLE);

        let result: Result<Vec<_>, _> = FrameExtractor::new(&p.vmap, &memory, p.size).collect();
        match result {
            Err(CheckpointError::InconsistentAddressSpace { reason, .. }) =>
                assert_eq!(reason, Inconsistency::NotPresent),
            _ => panic!("gap not reported"),
        }
    }
}
