//! Copies of a process's kernel-resident state, ready to be encoded.

use snapshot_core::{ExecutionContext, ProcessDescriptor, TrapFrame};

use crate::process::Process;

pub fn capture_context(process: &Process) -> ExecutionContext {
    *process.context
}

pub fn capture_trapframe(process: &Process) -> TrapFrame {
    *process.tf
}

/// The process control block as a location-independent descriptor.
pub fn capture_descriptor(process: &Process) -> ProcessDescriptor {
    let mut descriptor = ProcessDescriptor {
        pid: process.pid,
        parent: process.parent,
        size: process.size as u64,
        state: process.state.into(),
        killed: process.killed,
        ..ProcessDescriptor::default()
    };
    descriptor.set_name(&process.name);
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use snapshot_core::SnapState;
    use crate::process::State;

    #[test]
    fn descriptor_carries_identity_and_shape() {
        let mut p = Process::new(String::from("a-rather-long-process-name"));
        p.pid = 7;
        p.parent = 2;
        p.size = 8192;
        p.state = State::Running;
        p.context.lr = 0xdead;
        p.tf.elr = 0x400;

        let d = capture_descriptor(&p);
        assert_eq!(d.pid, 7);
        assert_eq!(d.parent, 2);
        assert_eq!(d.size, 8192);
        assert_eq!(d.state, SnapState::Running);
        assert_eq!(d.name(), "a-rather-long-p");
        assert_eq!(d.page_count(), 2);

        assert_eq!(capture_context(&p).lr, 0xdead);
        assert_eq!(capture_trapframe(&p).pc(), 0x400);
        // capturing leaves the process untouched
        assert_eq!(p.name, "a-rather-long-process-name");
    }
}
