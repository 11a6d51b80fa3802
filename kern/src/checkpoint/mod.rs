//! The process snapshot service: checkpointing a live process to a set of
//! named artifacts and building a fresh process back from them.

mod capture;
mod error;
mod extract;
mod reader;
mod restore;
mod writer;


pub use self::capture::{capture_context, capture_descriptor, capture_trapframe};
pub use self::error::{CheckpointError, Inconsistency};
pub use self::extract::{Frame, FrameExtractor};
pub use self::reader::read_snapshot;
pub use self::restore::{restore, EmbryoProcess, ProcessFactory};
pub use self::writer::{write_snapshot, CheckpointSummary};
