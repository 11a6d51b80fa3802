//! Process duplication: building a new address space either from a live
//! process or from page contents supplied by the caller.

use alloc::string::String;

use kernel_api::{OsError, OsResult};
use snapshot_core::{PageBuf, PageFlags};

use crate::param::PAGE_SIZE;
use crate::process::{Id, Process, State, Table};
use crate::vm::{PhysicalMemory, VirtualAddr};

fn install_page(process: &mut Process, memory: &mut PhysicalMemory, va: VirtualAddr,
                content: &[u8], flags: PageFlags) -> OsResult<()> {
    let pa = memory.alloc().ok_or(OsError::NoMemory)?;
    match memory.frame_mut(pa) {
        Some(frame) => frame.copy_from_slice(content),
        None => {
            memory.free(pa);
            return Err(OsError::BadAddress);
        }
    }
    if let Err(e) = process.vmap.map(va, pa, flags) {
        memory.free(pa);
        return Err(e);
    }
    Ok(())
}

fn admit(table: &mut Table, memory: &mut PhysicalMemory, mut process: Process) -> OsResult<Id> {
    // the table only refuses when it is full; give the frames back first
    if table.is_full() {
        process.release_memory(memory);
        return Err(OsError::NoSpace);
    }
    table.add(process)
}

/// Creates a copy of `parent` with its own copy of every page.
///
/// The child starts `Ready`, with the parent's trap frame and `x0` cleared so
/// it can tell itself apart from the parent.
pub fn fork(table: &mut Table, memory: &mut PhysicalMemory, parent: Id) -> OsResult<Id> {
    let src = table.get(parent).ok_or(OsError::InvalidProcess)?;
    if table.is_full() {
        return Err(OsError::NoSpace);
    }

    let mut child = Process::new(src.name.clone());
    child.parent = parent;
    *child.context = *src.context;
    *child.tf = *src.tf;
    child.tf.regs[0] = 0;

    for base in (0..src.size).step_by(PAGE_SIZE) {
        let va = VirtualAddr::from(base);
        let copied = src.vmap.walk(va)
            .filter(|entry| entry.is_present())
            .and_then(|entry| {
                let content = PageBuf::from_slice(memory.frame(entry.addr())?)?;
                Some((content, entry.flags()))
            });

        let result = match copied {
            Some((content, flags)) => install_page(&mut child, memory, va, &content, flags),
            None => Err(OsError::BadAddress),
        };
        if let Err(e) = result {
            child.release_memory(memory);
            return Err(e);
        }
        child.size = base + PAGE_SIZE;
    }
    child.size = src.size;
    child.state = State::Ready;

    admit(table, memory, child)
}

/// Materialises a new process whose page `i` holds `pages[i]` mapped with
/// `flags[i]`. The process is left as an `Embryo`; the caller decides when it
/// becomes runnable.
///
/// Fails with `NoMemory` if frames run out; every frame already taken is
/// returned first. A full table fails with `NoSpace` before any frame is taken.
pub fn create_from_pages(table: &mut Table, memory: &mut PhysicalMemory, pages: &[PageBuf],
                         flags: &[PageFlags], name: String) -> OsResult<Id> {
    if pages.len() != flags.len() {
        return Err(OsError::InvalidArgument);
    }
    if table.is_full() {
        return Err(OsError::NoSpace);
    }

    let mut process = Process::new(name);
    for (i, (content, flags)) in pages.iter().zip(flags.iter()).enumerate() {
        let va = VirtualAddr::from(i * PAGE_SIZE);
        if let Err(e) = install_page(&mut process, memory, va, content, *flags) {
            process.release_memory(memory);
            return Err(e);
        }
        process.size = (i + 1) * PAGE_SIZE;
    }

    admit(table, memory, process)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessTable;

    fn urw() -> PageFlags {
        PageFlags::PRESENT | PageFlags::USER | PageFlags::WRITABLE
    }

    #[test]
    fn fork_copies_pages_and_flags() {
        let table = ProcessTable::new(4);
        let mut memory = PhysicalMemory::new(8);
        let mut t = table.lock();

        let mut parent = Process::new(String::from("counter"));
        parent.grow(&mut memory, PAGE_SIZE, urw()).unwrap();
        parent.grow(&mut memory, PAGE_SIZE, PageFlags::PRESENT | PageFlags::USER).unwrap();
        parent.copy_in(&mut memory, VirtualAddr::from(10usize), b"parent").unwrap();
        parent.tf.regs[0] = 77;
        parent.tf.elr = 0x40;
        let pid = t.add(parent).unwrap();

        let child = fork(&mut t, &mut memory, pid).unwrap();
        let child = t.get(child).unwrap();
        assert_eq!(child.parent, pid);
        assert_eq!(child.size, 2 * PAGE_SIZE);
        assert_eq!(child.state, State::Ready);
        assert_eq!(child.tf.regs[0], 0);
        assert_eq!(child.tf.elr, 0x40);
        assert_eq!(child.vmap.walk(VirtualAddr::from(PAGE_SIZE)).unwrap().flags().bits(), 0b101);

        let mut buf = [0u8; 6];
        child.copy_out(&memory, VirtualAddr::from(10usize), &mut buf).unwrap();
        assert_eq!(&buf, b"parent");

        // separate frames
        let parent_pa = t.get(pid).unwrap().vmap.walk(VirtualAddr::from(0usize)).unwrap().addr();
        assert_ne!(child.vmap.walk(VirtualAddr::from(0usize)).unwrap().addr(), parent_pa);
    }

    #[test]
    fn create_from_pages_rolls_back_on_exhaustion() {
        let table = ProcessTable::new(4);
        let mut memory = PhysicalMemory::new(2);
        let mut t = table.lock();

        let pages = vec![PageBuf::filled(1), PageBuf::filled(2), PageBuf::filled(3)];
        let flags = vec![urw(); 3];
        assert_eq!(create_from_pages(&mut t, &mut memory, &pages, &flags, String::from("big")),
                   Err(OsError::NoMemory));
        assert_eq!(memory.allocated(), 0);
        assert_eq!(t.len(), 0);

        assert_eq!(create_from_pages(&mut t, &mut memory, &pages[..2], &flags, String::from("bad")),
                   Err(OsError::InvalidArgument));

        let id = create_from_pages(&mut t, &mut memory, &pages[..2], &flags[..2], String::from("ok")).unwrap();
        let p = t.get(id).unwrap();
        assert_eq!(p.state, State::Embryo);
        assert_eq!(p.size, 2 * PAGE_SIZE);
        let mut byte = [0u8; 1];
        p.copy_out(&memory, VirtualAddr::from(PAGE_SIZE + 5), &mut byte).unwrap();
        assert_eq!(byte[0], 2);
    }

    #[test]
    fn full_table_gives_frames_back() {
        let table = ProcessTable::new(1);
        let mut memory = PhysicalMemory::new(4);
        let mut t = table.lock();
        t.add(Process::new(String::from("init"))).unwrap();

        let pages = vec![PageBuf::zeroed()];
        assert_eq!(create_from_pages(&mut t, &mut memory, &pages, &[urw()], String::from("x")),
                   Err(OsError::NoSpace));
        assert_eq!(memory.allocated(), 0);

        let init = t.ids()[0];
        assert_eq!(fork(&mut t, &mut memory, init), Err(OsError::NoSpace));
        assert_eq!(memory.allocated(), 0);
    }
}
