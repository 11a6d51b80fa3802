pub use self::address::{PhysicalAddr, VirtualAddr};
pub use self::memory::{Page, PhysicalMemory};
pub use self::pagetable::{RawEntry, UserPageTable};

mod address;
mod memory;
mod pagetable;
