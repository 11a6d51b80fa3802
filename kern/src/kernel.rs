use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;

use spin::Mutex;

use kernel_api::{OsError, OsResult};
use snapshot_core::{Artifact, ExecutionContext, PageBuf, PageFlags, ProcessDescriptor, TrapFrame};

use crate::checkpoint::{self, CheckpointError, CheckpointSummary, EmbryoProcess, ProcessFactory};
use crate::config::{AfterCheckpoint, Config};
use crate::fs::FileSystem;
use crate::logger;
use crate::param::{PAGE_SIZE, USER_IMG_BASE, USER_STACK_PAGES};
use crate::process::{self, Id, Process, ProcessTable, State, Table};
use crate::vm::{PhysicalMemory, VirtualAddr};

/// The parts of the machine the snapshot service works against: physical
/// memory, the process table and persistent storage.
///
/// Locks are always taken in the order artifacts, process table, memory.
pub struct Kernel {
    processes: Arc<ProcessTable>,
    memory: Mutex<PhysicalMemory>,
    fs: Arc<dyn FileSystem>,
    /// Held for the whole of a checkpoint or restore; the artifact set has one
    /// owner at a time.
    artifacts: Mutex<()>,
    config: Config,
}

impl Kernel {
    pub fn new(config: Config, fs: Arc<dyn FileSystem>) -> Kernel {
        logger::register_global_logger();
        info!("kernel: {} frames, {} process slots, snapshots at '{}*'",
              config.frames, config.max_processes, config.artifacts.prefix());

        Kernel {
            processes: Arc::new(ProcessTable::new(config.max_processes)),
            memory: Mutex::new(PhysicalMemory::new(config.frames)),
            fs,
            artifacts: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn process_table(&self) -> &Arc<ProcessTable> {
        &self.processes
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Enter a critical region holding the process table and physical memory.
    fn critical<F, R>(&self, f: F) -> R
        where
            F: FnOnce(&mut Table, &mut PhysicalMemory) -> R,
    {
        let mut table = self.processes.lock();
        let mut memory = self.memory.lock();
        f(&mut table, &mut memory)
    }

    /// Number of frames currently allocated.
    pub fn frames_in_use(&self) -> usize {
        self.memory.lock().allocated()
    }

    /// Loads a flat `image` at `USER_IMG_BASE` and makes it runnable.
    ///
    /// The image is followed by an inaccessible guard page and then the user
    /// stack. Execution starts at the first byte of the image with the stack
    /// pointer at the top of the address space.
    pub fn spawn(&self, name: &str, image: &[u8]) -> OsResult<Id> {
        self.critical(|table, memory| {
            if table.is_full() {
                return Err(OsError::NoSpace);
            }

            let mut p = Process::new(String::from(name));
            if let Err(e) = load_image(&mut p, memory, image) {
                p.release_memory(memory);
                return Err(e);
            }
            p.state = State::Ready;

            let id = table.add(p)?;
            debug!("spawned '{}' as pid {}", name, id);
            Ok(id)
        })
    }

    /// Creates a runnable process whose page `i` holds `pages[i]` mapped with
    /// `flags[i]`.
    pub fn spawn_from_pages(&self, name: &str, pages: &[PageBuf], flags: &[PageFlags]) -> OsResult<Id> {
        self.critical(|table, memory| {
            let id = process::create_from_pages(table, memory, pages, flags, String::from(name))?;
            if let Some(p) = table.get_mut(id) {
                p.state = State::Ready;
            }
            Ok(id)
        })
    }

    pub fn fork(&self, parent: Id) -> OsResult<Id> {
        self.critical(|table, memory| process::fork(table, memory, parent))
    }

    pub fn kill(&self, pid: Id) -> OsResult<()> {
        self.processes.critical(|table| table.kill(pid))
    }

    pub fn reap(&self, pid: Id) -> OsResult<()> {
        self.critical(|table, memory| table.reap(pid, memory))
    }

    pub fn with_process<F, R>(&self, pid: Id, f: F) -> Option<R>
        where
            F: FnOnce(&Process, &PhysicalMemory) -> R,
    {
        self.critical(|table, memory| table.get(pid).map(|p| f(p, memory)))
    }

    pub fn with_process_mut<F, R>(&self, pid: Id, f: F) -> Option<R>
        where
            F: FnOnce(&mut Process, &mut PhysicalMemory) -> R,
    {
        self.critical(|table, memory| table.get_mut(pid).map(|p| f(p, memory)))
    }

    /// Saves the live trap frame of `pid`, as done on every kernel entry.
    pub fn store_trapframe(&self, pid: Id, tf: &TrapFrame) -> OsResult<()> {
        self.with_process_mut(pid, |p, _| *p.tf = *tf).ok_or(OsError::InvalidProcess)
    }

    /// Writes a snapshot of `pid` to the configured artifacts.
    ///
    /// The process table and physical memory stay locked from before the page
    /// walk until the manifest is on disk, so `pid` can neither run nor have
    /// its address space changed while it is captured.
    pub fn checkpoint(&self, pid: Id) -> Result<CheckpointSummary, CheckpointError> {
        let _artifacts = self.artifacts.lock();
        let fs = self.fs.as_ref();
        let names = &self.config.artifacts;
        let after = self.config.after_checkpoint;

        self.critical(|table, memory| {
            let process = table.get(pid).ok_or(CheckpointError::NoSuchProcess(pid))?;
            let summary = checkpoint::write_snapshot(fs, names, process, memory)?;

            if after == AfterCheckpoint::Terminate {
                table.kill(pid)?;
                table.reap(pid, memory)?;
                info!("pid {} terminated after checkpoint", pid);
            }
            Ok(summary)
        })
    }

    /// Builds a new runnable process from the configured artifacts and
    /// returns its id.
    pub fn restore(&self) -> Result<Id, CheckpointError> {
        let _artifacts = self.artifacts.lock();
        let names = &self.config.artifacts;

        let snapshot = checkpoint::read_snapshot(self.fs.as_ref(), names)?;
        let pid = checkpoint::restore(self, &snapshot)?;

        if self.config.consume_on_restore {
            let manifest = names.name(Artifact::Manifest);
            if let Err(e) = self.fs.remove(&manifest) {
                warn!("restored pid {} but could not consume {}: {}", pid, manifest, e);
            }
        }
        Ok(pid)
    }
}

fn load_image(p: &mut Process, memory: &mut PhysicalMemory, image: &[u8]) -> OsResult<()> {
    let urw = PageFlags::PRESENT | PageFlags::USER | PageFlags::WRITABLE;
    let pages = (core::cmp::max(image.len(), 1) + PAGE_SIZE - 1) / PAGE_SIZE;

    p.grow(memory, pages * PAGE_SIZE, urw)?;
    p.copy_in(memory, VirtualAddr::from(USER_IMG_BASE), image)?;
    // guard page: mapped, but not reachable from user mode
    p.grow(memory, PAGE_SIZE, PageFlags::PRESENT | PageFlags::WRITABLE)?;
    p.grow(memory, USER_STACK_PAGES * PAGE_SIZE, urw)?;

    p.tf.elr = USER_IMG_BASE as u64;
    p.tf.sp = p.size as u64;
    Ok(())
}

/// A process created by the kernel for a restore that has not been handed to
/// the scheduler yet.
struct KernelEmbryo<'a> {
    kernel: &'a Kernel,
    id: Id,
    committed: bool,
}

impl<'a> KernelEmbryo<'a> {
    fn update<F: FnOnce(&mut Process)>(&self, f: F) -> Result<(), CheckpointError> {
        self.kernel.with_process_mut(self.id, |p, _| f(p)).ok_or_else(|| {
            warn!("embryo pid {} vanished", self.id);
            CheckpointError::NoSuchProcess(self.id)
        })
    }
}

impl<'a> EmbryoProcess for KernelEmbryo<'a> {
    fn id(&self) -> Id {
        self.id
    }

    fn adopt(&mut self, descriptor: &ProcessDescriptor) -> Result<(), CheckpointError> {
        self.update(|p| {
            p.name = String::from(descriptor.name());
            p.size = descriptor.size as usize;
        })
    }

    fn set_context(&mut self, context: &ExecutionContext) -> Result<(), CheckpointError> {
        self.update(|p| *p.context = *context)
    }

    fn set_trapframe(&mut self, tf: &TrapFrame) -> Result<(), CheckpointError> {
        self.update(|p| *p.tf = *tf)
    }

    fn make_runnable(mut self: Box<Self>) -> Result<Id, CheckpointError> {
        self.update(|p| p.state = State::Ready)?;
        self.committed = true;
        Ok(self.id)
    }
}

impl<'a> Drop for KernelEmbryo<'a> {
    fn drop(&mut self) {
        if !self.committed {
            debug!("discarding embryo pid {}", self.id);
            self.kernel.reap(self.id).ok();
        }
    }
}

impl ProcessFactory for Kernel {
    fn create_process_from_pages(&self, pages: &[PageBuf], flags: &[PageFlags])
                                 -> Result<Box<dyn EmbryoProcess + '_>, CheckpointError> {
        let id = self.critical(|table, memory| {
            process::create_from_pages(table, memory, pages, flags, String::from("restore"))
        }).map_err(|e| match e {
            OsError::NoMemory => {
                warn!("no frames left to restore {} pages", pages.len());
                CheckpointError::AllocationExhausted { pages: pages.len() }
            }
            OsError::NoSpace => {
                warn!("process table full, cannot restore");
                CheckpointError::Process(OsError::NoSpace)
            }
            e => CheckpointError::Process(e),
        })?;

        Ok(Box::new(KernelEmbryo { kernel: self, id, committed: false }))
    }
}
