pub use snapshot_core::PAGE_SIZE;

pub const PAGE_MASK: usize = !(PAGE_SIZE - 1);

/// Maximum number of live processes.
pub const NPROC: usize = 64;

/// Default number of physical frames (4 MiB).
pub const NFRAMES: usize = 1024;

/// Physical address of the first allocatable frame.
pub const PHYS_BASE: usize = 0x0010_0000;

/// User images are loaded at the bottom of the address space.
pub const USER_IMG_BASE: usize = 0;

/// Pages of user stack placed directly above a loaded image.
pub const USER_STACK_PAGES: usize = 1;

/// Capacity of the kernel log ring, in lines.
pub const CONSOLE_LINES: usize = 256;
