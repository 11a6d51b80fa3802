#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate alloc;
#[macro_use]
extern crate log;

pub mod checkpoint;
pub mod collections;
pub mod config;
pub mod console;
pub mod fs;
mod kernel;
pub mod logger;
pub mod param;
pub mod process;
pub mod traps;
pub mod vm;

pub use crate::kernel::Kernel;
