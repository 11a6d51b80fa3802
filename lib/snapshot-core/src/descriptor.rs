use core::fmt;

use crate::record::Record;
use crate::wire::{WireReader, WireWriter};
use crate::{pages_required, Error, Result};

pub const NAME_LEN: usize = 16;

/// Lifecycle state of a process as stored in a snapshot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapState {
    /// Allocated but not yet runnable.
    Embryo = 0,
    /// The process is ready to be scheduled.
    Ready = 1,
    /// The process is waiting on an event to occur before it can be scheduled.
    Waiting = 2,
    /// The process is currently running.
    Running = 3,
    /// The process has exited and waits to be reaped.
    Zombie = 4,
}

impl SnapState {
    fn from_u8(v: u8) -> Result<Self> {
        use SnapState::*;
        Ok(match v {
            0 => Embryo,
            1 => Ready,
            2 => Waiting,
            3 => Running,
            4 => Zombie,
            _ => return Err(Error::InvalidField("state")),
        })
    }
}

impl Default for SnapState {
    fn default() -> Self {
        SnapState::Embryo
    }
}

/// Control-block metadata of a checkpointed process.
///
/// Only location-independent fields are kept. The addresses of the context,
/// trap frame and page table are meaningless outside the kernel that wrote
/// them, so they are never part of the record.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProcessDescriptor {
    pub pid: u64,
    pub parent: u64,
    /// Size of the address space in bytes.
    pub size: u64,
    pub state: SnapState,
    pub killed: bool,
    pub name: [u8; NAME_LEN],
}

impl ProcessDescriptor {
    /// The name up to its first NUL byte.
    pub fn name(&self) -> &str {
        let end = self.name.iter().position(|b| *b == 0).unwrap_or(NAME_LEN);
        core::str::from_utf8(&self.name[..end]).unwrap_or("?")
    }

    /// Stores `name`, truncated so that a terminating NUL always fits.
    pub fn set_name(&mut self, name: &str) {
        let mut len = core::cmp::min(name.len(), NAME_LEN - 1);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        self.name = [0; NAME_LEN];
        self.name[..len].copy_from_slice(&name.as_bytes()[..len]);
    }

    /// Number of pages the address space spans.
    pub fn page_count(&self) -> usize {
        pages_required(self.size) as usize
    }
}

impl fmt::Debug for ProcessDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessDescriptor")
            .field("pid", &self.pid)
            .field("parent", &self.parent)
            .field("size", &self.size)
            .field("state", &self.state)
            .field("killed", &self.killed)
            .field("name", &self.name())
            .finish()
    }
}

impl Record for ProcessDescriptor {
    const MAGIC: u32 = u32::from_le_bytes(*b"PRC1");
    const BODY_SIZE: usize = 3 * 8 + 8 + NAME_LEN;

    fn encode_body(&self, w: &mut WireWriter<'_>) {
        w.put_u64(self.pid);
        w.put_u64(self.parent);
        w.put_u64(self.size);
        w.put_u8(self.state as u8);
        w.put_u8(self.killed as u8);
        w.put_bytes(&[0; 6]);
        w.put_bytes(&self.name);
    }

    fn decode_body(r: &mut WireReader<'_>) -> Result<Self> {
        let pid = r.get_u64();
        let parent = r.get_u64();
        let size = r.get_u64();
        let state = SnapState::from_u8(r.get_u8())?;
        let killed = match r.get_u8() {
            0 => false,
            1 => true,
            _ => return Err(Error::InvalidField("killed")),
        };
        r.take(6);
        let mut name = [0u8; NAME_LEN];
        name.copy_from_slice(r.take(NAME_LEN));

        Ok(ProcessDescriptor { pid, parent, size, state, killed, name })
    }
}
