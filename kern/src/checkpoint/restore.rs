use alloc::boxed::Box;

use snapshot_core::{ExecutionContext, PageBuf, PageFlags, ProcessDescriptor, ProcessSnapshot, TrapFrame};

use crate::checkpoint::CheckpointError;
use crate::process::Id;

/// A process that has an address space but has never run.
///
/// Dropping an embryo without calling `make_runnable` must destroy it and
/// release its frames.
pub trait EmbryoProcess {
    fn id(&self) -> Id;

    /// Takes over the name and address-space size recorded in `descriptor`.
    /// Identity, parentage and any recorded addresses are never adopted.
    fn adopt(&mut self, descriptor: &ProcessDescriptor) -> Result<(), CheckpointError>;

    fn set_context(&mut self, context: &ExecutionContext) -> Result<(), CheckpointError>;

    fn set_trapframe(&mut self, tf: &TrapFrame) -> Result<(), CheckpointError>;

    /// Hands the process to the scheduler and returns its id.
    fn make_runnable(self: Box<Self>) -> Result<Id, CheckpointError>;
}

/// Builds new processes from page contents supplied by the caller.
pub trait ProcessFactory {
    /// Creates an embryo whose page `i` holds `pages[i]` mapped with
    /// `flags[i]`. Fails with `AllocationExhausted` if frames run out, having
    /// released everything it took. Any other refusal, such as a full process
    /// table, is reported as `Process`.
    fn create_process_from_pages(&self, pages: &[PageBuf], flags: &[PageFlags])
                                 -> Result<Box<dyn EmbryoProcess + '_>, CheckpointError>;
}

/// Manufactures a runnable process from `snapshot` and returns its new id.
///
/// The new process resumes with exactly the captured registers, pages and
/// flags. Nothing is created unless the page stream, flag stream, descriptor
/// and manifest all agree on the page count.
pub fn restore(factory: &dyn ProcessFactory, snapshot: &ProcessSnapshot) -> Result<Id, CheckpointError> {
    let counts = snapshot.record_counts();
    if !counts.is_consistent() {
        error!("refusing to restore: {:?}", counts);
        return Err(CheckpointError::RecordCountMismatch {
            pages: counts.pages,
            flags: counts.flags,
            expected: counts.expected,
        });
    }

    let mut embryo = factory.create_process_from_pages(&snapshot.pages, &snapshot.flags)?;
    embryo.adopt(&snapshot.descriptor)?;
    embryo.set_context(&snapshot.context)?;
    embryo.set_trapframe(&snapshot.trapframe)?;
    let pid = embryo.make_runnable()?;

    info!("restored '{}' (was pid {}) as pid {}: {} pages, pc={:#x} sp={:#x}",
          snapshot.descriptor.name(), snapshot.descriptor.pid, pid, counts.pages,
          snapshot.trapframe.pc(), snapshot.trapframe.stack_pointer());

    Ok(pid)
}
