use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::param::{PAGE_SIZE, PHYS_BASE};
use crate::vm::PhysicalAddr;

/// One physical frame.
#[repr(C)]
pub struct Page([u8; PAGE_SIZE]);

impl Page {
    fn zeroed() -> Box<Page> {
        Box::new(Page([0; PAGE_SIZE]))
    }
}

/// A fixed pool of physical frames.
///
/// Frames are materialised lazily, so a large pool costs nothing until it is
/// used. Physical addresses start at `PHYS_BASE` and are frame aligned.
pub struct PhysicalMemory {
    frames: Vec<Option<Box<Page>>>,
    free: Vec<usize>,
    capacity: usize,
    allocated: usize,
}

impl PhysicalMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::new(),
            free: Vec::new(),
            capacity,
            allocated: 0,
        }
    }

    fn index(&self, pa: PhysicalAddr) -> Option<usize> {
        let pa = pa.as_usize();
        if pa < PHYS_BASE || pa % PAGE_SIZE != 0 {
            return None;
        }
        let index = (pa - PHYS_BASE) / PAGE_SIZE;
        match self.frames.get(index) {
            Some(Some(_)) => Some(index),
            _ => None,
        }
    }

    fn address(index: usize) -> PhysicalAddr {
        PhysicalAddr::from(PHYS_BASE + index * PAGE_SIZE)
    }

    /// Allocates a zeroed frame. Returns `None` when the pool is exhausted.
    pub fn alloc(&mut self) -> Option<PhysicalAddr> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.frames.len() < self.capacity => {
                self.frames.push(None);
                self.frames.len() - 1
            }
            None => return None,
        };

        self.frames[index] = Some(Page::zeroed());
        self.allocated += 1;
        Some(Self::address(index))
    }

    /// Returns a frame to the pool.
    ///
    /// # Panics
    ///
    /// Panics if `pa` does not name an allocated frame.
    pub fn free(&mut self, pa: PhysicalAddr) {
        let index = match self.index(pa) {
            Some(index) => index,
            None => panic!("free: {} is not an allocated frame", pa),
        };
        self.frames[index] = None;
        self.free.push(index);
        self.allocated -= 1;
    }

    /// Kernel view of the frame at `pa`.
    pub fn frame(&self, pa: PhysicalAddr) -> Option<&[u8]> {
        let index = self.index(pa)?;
        self.frames[index].as_ref().map(|page| &page.0[..])
    }

    pub fn frame_mut(&mut self, pa: PhysicalAddr) -> Option<&mut [u8]> {
        let index = self.index(pa)?;
        self.frames[index].as_mut().map(|page| &mut page.0[..])
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn allocated(&self) -> usize {
        self.allocated
    }

    pub fn available(&self) -> usize {
        self.capacity - self.allocated
    }
}
