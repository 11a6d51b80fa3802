use kernel_api::*;

use crate::process::Id;
use crate::traps::TrapFrame;
use crate::Kernel;

fn set_result(tf: &mut TrapFrame, regs: &[u64]) {
    for (i, v) in regs.iter().enumerate() {
        tf.regs[i] = *v;
    }
}

fn set_err(tf: &mut TrapFrame, res: OsError) {
    tf.regs[STATUS_REG] = res as u64;
}

/// Checkpoint a process.
///
/// This system call takes one parameter: the pid of the process to save, or
/// `0` for the calling process.
///
/// In addition to the usual status value, this system call returns one
/// parameter: the number of bytes written.
///
/// When the caller saves itself, its trap frame is stored first with the call
/// already completed with a result of `0`, so a restored copy resumes right
/// after this call and can tell that it is the copy. Saving another process
/// captures that process's trap frame as it was last stored.
pub fn sys_save_proc(kernel: &Kernel, caller: Id, tf: &mut TrapFrame) {
    let target = match tf.regs[0] {
        0 => caller,
        pid => pid,
    };

    if target == caller {
        let mut saved = *tf;
        set_result(&mut saved, &[0]);
        set_err(&mut saved, OsError::Ok);
        if let Err(e) = kernel.store_trapframe(caller, &saved) {
            set_err(tf, e);
            return;
        }
    }

    match kernel.checkpoint(target) {
        Ok(summary) => {
            set_result(tf, &[summary.bytes as u64]);
            set_err(tf, OsError::Ok);
        }
        Err(e) => {
            warn!("saveProc({}) from pid {} failed: {}", target, caller, e);
            set_err(tf, e.into());
        }
    }
}

/// Restore the saved process.
///
/// This system call does not take parameter.
///
/// In addition to the usual status value, this system call returns one
/// parameter: the pid of the restored process.
pub fn sys_load_proc(kernel: &Kernel, caller: Id, tf: &mut TrapFrame) {
    match kernel.restore() {
        Ok(pid) => {
            set_result(tf, &[pid]);
            set_err(tf, OsError::Ok);
        }
        Err(e) => {
            warn!("loadProc from pid {} failed: {}", caller, e);
            set_err(tf, e.into());
        }
    }
}

pub fn handle_syscall(kernel: &Kernel, caller: Id, num: u16, tf: &mut TrapFrame) {
    match num as usize {
        NR_SAVE_PROC => sys_save_proc(kernel, caller, tf),
        NR_LOAD_PROC => sys_load_proc(kernel, caller, tf),
        _ => {
            warn!("Unknown syscall: {}", num);
            set_err(tf, OsError::InvalidArgument);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;

    use crate::config::Config;
    use crate::fs::{FileSystem, MemFileSystem};

    fn kernel() -> (Kernel, Arc<MemFileSystem>) {
        let fs = Arc::new(MemFileSystem::new());
        let kernel = Kernel::new(Config::default().frames(32), fs.clone());
        (kernel, fs)
    }

    #[test]
    fn save_then_load_through_the_syscall_table() {
        let (kernel, fs) = kernel();
        let pid = kernel.spawn("counter", &[0xaa; 100]).unwrap();

        let mut tf = TrapFrame::default();
        tf.elr = 0x24;
        handle_syscall(&kernel, pid, NR_SAVE_PROC as u16, &mut tf);
        assert_eq!(OsError::from(tf.regs[STATUS_REG]), OsError::Ok);
        assert!(tf.regs[0] > 0);
        assert!(fs.exists("snapshot_manifest"));

        let mut tf = TrapFrame::default();
        handle_syscall(&kernel, pid, NR_LOAD_PROC as u16, &mut tf);
        assert_eq!(OsError::from(tf.regs[STATUS_REG]), OsError::Ok);
        let restored = tf.regs[0];
        assert_ne!(restored, pid);

        // the copy resumes after saveProc, seeing a result of 0
        let (pc, x0, status) = kernel.with_process(restored, |p, _| {
            (p.tf.elr, p.tf.regs[0], p.tf.regs[STATUS_REG])
        }).unwrap();
        assert_eq!(pc, 0x24);
        assert_eq!(x0, 0);
        assert_eq!(OsError::from(status), OsError::Ok);
    }

    #[test]
    fn saving_another_process_leaves_the_caller_alone() {
        let (kernel, _fs) = kernel();
        let caller = kernel.spawn("shell", &[1; 8]).unwrap();
        let target = kernel.spawn("worker", &[2; 8]).unwrap();
        kernel.with_process_mut(target, |p, _| p.tf.regs[0] = 55).unwrap();
        let before = kernel.with_process(caller, |p, _| *p.tf).unwrap();

        let mut tf = TrapFrame::default();
        tf.regs[0] = target;
        tf.elr = 0x80;
        handle_syscall(&kernel, caller, NR_SAVE_PROC as u16, &mut tf);
        assert_eq!(OsError::from(tf.regs[STATUS_REG]), OsError::Ok);
        assert_eq!(kernel.with_process(caller, |p, _| *p.tf).unwrap(), before);

        let mut tf = TrapFrame::default();
        handle_syscall(&kernel, caller, NR_LOAD_PROC as u16, &mut tf);
        let restored = tf.regs[0];
        let (name, x0) = kernel.with_process(restored, |p, _| (p.name.clone(), p.tf.regs[0])).unwrap();
        assert_eq!(name, "worker");
        assert_eq!(x0, 55);
    }

    #[test]
    fn failures_are_reported_in_the_status_register() {
        let (kernel, _fs) = kernel();
        let pid = kernel.spawn("idle", &[]).unwrap();

        let mut tf = TrapFrame::default();
        handle_syscall(&kernel, pid, NR_LOAD_PROC as u16, &mut tf);
        assert_eq!(OsError::from(tf.regs[STATUS_REG]), OsError::NoEntry);

        let mut tf = TrapFrame::default();
        tf.regs[0] = 999;
        handle_syscall(&kernel, pid, NR_SAVE_PROC as u16, &mut tf);
        assert_eq!(OsError::from(tf.regs[STATUS_REG]), OsError::InvalidArgument);

        let mut tf = TrapFrame::default();
        handle_syscall(&kernel, 999, NR_SAVE_PROC as u16, &mut tf);
        assert_eq!(OsError::from(tf.regs[STATUS_REG]), OsError::InvalidProcess);

        let mut tf = TrapFrame::default();
        handle_syscall(&kernel, pid, 4242, &mut tf);
        assert_eq!(OsError::from(tf.regs[STATUS_REG]), OsError::InvalidArgument);
    }
}
