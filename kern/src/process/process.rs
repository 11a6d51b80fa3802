use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use kernel_api::{OsError, OsResult};
use snapshot_core::{ExecutionContext, PageFlags, TrapFrame};

use crate::param::{PAGE_MASK, PAGE_SIZE};
use crate::process::State;
use crate::vm::{PhysicalMemory, UserPageTable, VirtualAddr};

/// Type alias for the type of a process ID.
pub type Id = u64;

/// A structure that represents the complete state of a process.
pub struct Process {
    pub pid: Id,
    pub parent: Id,
    /// Size of the address space in bytes. Every page below it is mapped.
    pub size: usize,
    /// Registers saved when the kernel last switched away from the process.
    pub context: Box<ExecutionContext>,
    /// The saved trap frame of a process.
    pub tf: Box<TrapFrame>,
    /// The page table describing the Virtual Memory of the process
    pub vmap: Box<UserPageTable>,
    /// The scheduling state of the process.
    pub state: State,
    pub name: String,
    pub killed: bool,
}

fn page_round_up(len: usize) -> usize {
    (len + PAGE_SIZE - 1) & PAGE_MASK
}

impl Process {
    /// Creates an `Embryo` process with zeroed registers and an empty
    /// address space. The pid is assigned when it joins the process table.
    pub fn new(name: String) -> Process {
        Process {
            pid: 0,
            parent: 0,
            size: 0,
            context: Box::new(ExecutionContext::default()),
            tf: Box::new(TrapFrame::default()),
            vmap: Box::new(UserPageTable::new()),
            state: State::Embryo,
            name,
            killed: false,
        }
    }

    /// Extends the address space by `len` bytes, backing new pages with
    /// zeroed frames mapped with `flags`. Returns the previous size.
    ///
    /// Nothing is left mapped if the frame pool runs dry part way through.
    pub fn grow(&mut self, memory: &mut PhysicalMemory, len: usize, flags: PageFlags) -> OsResult<usize> {
        let old = self.size;
        let new = old.checked_add(len).ok_or(OsError::NoVmSpace)?;

        let mut mapped: Vec<VirtualAddr> = Vec::new();
        let mut base = page_round_up(old);
        while base < new {
            let va = VirtualAddr::from(base);
            let result = match memory.alloc() {
                Some(pa) => self.vmap.map(va, pa, flags).map_err(|e| {
                    memory.free(pa);
                    e
                }),
                None => Err(OsError::NoMemory),
            };

            if let Err(e) = result {
                for va in mapped {
                    if let Some(entry) = self.vmap.unmap(va) {
                        memory.free(entry.addr());
                    }
                }
                return Err(e);
            }

            mapped.push(va);
            base += PAGE_SIZE;
        }

        self.size = new;
        Ok(old)
    }

    /// Unmaps every page and returns its frame to `memory`.
    pub fn release_memory(&mut self, memory: &mut PhysicalMemory) {
        let mapped: Vec<VirtualAddr> = self.vmap.iter().map(|(va, _)| va).collect();
        for va in mapped {
            if let Some(entry) = self.vmap.unmap(va) {
                memory.free(entry.addr());
            }
        }
        self.size = 0;
    }

    /// Copies `buf` into the address space starting at `va`.
    pub fn copy_in(&mut self, memory: &mut PhysicalMemory, va: VirtualAddr, mut buf: &[u8]) -> OsResult<()> {
        self.check_range(va, buf.len())?;

        let mut base = va & VirtualAddr::from(PAGE_MASK);
        let mut offset = (va - base).as_usize();

        while buf.len() > 0 {
            let pa = self.vmap.walk(base).ok_or(OsError::BadAddress)?.addr();
            let mut page = memory.frame_mut(pa).ok_or(OsError::BadAddress)?;
            // offset is always less than page size.
            if offset > 0 {
                page = &mut page[offset..];
                offset = 0;
            }

            let len = core::cmp::min(page.len(), buf.len());
            page[..len].copy_from_slice(&buf[..len]);
            buf = &buf[len..];
            base = base + VirtualAddr::from(PAGE_SIZE);
        }

        Ok(())
    }

    /// Copies bytes starting at `va` out of the address space into `buf`.
    pub fn copy_out(&self, memory: &PhysicalMemory, va: VirtualAddr, mut buf: &mut [u8]) -> OsResult<()> {
        self.check_range(va, buf.len())?;

        let mut base = va & VirtualAddr::from(PAGE_MASK);
        let mut offset = (va - base).as_usize();

        while buf.len() > 0 {
            let pa = self.vmap.walk(base).ok_or(OsError::BadAddress)?.addr();
            let mut page = memory.frame(pa).ok_or(OsError::BadAddress)?;
            if offset > 0 {
                page = &page[offset..];
                offset = 0;
            }

            let len = core::cmp::min(page.len(), buf.len());
            buf[..len].copy_from_slice(&page[..len]);
            buf = &mut buf[len..];
            base = base + VirtualAddr::from(PAGE_SIZE);
        }

        Ok(())
    }

    fn check_range(&self, va: VirtualAddr, len: usize) -> OsResult<()> {
        match va.as_usize().checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(OsError::BadAddress),
        }
    }

    /// Returns `true` if this process is ready to be scheduled.
    pub fn is_ready(&self) -> bool {
        self.state == State::Ready && !self.killed
    }
}
