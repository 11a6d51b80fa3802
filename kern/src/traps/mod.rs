//! Kernel entry from user mode.

mod syscall;

pub use snapshot_core::TrapFrame;

pub use self::syscall::{handle_syscall, sys_load_proc, sys_save_proc};
