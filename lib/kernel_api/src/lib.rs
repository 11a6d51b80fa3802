#![cfg_attr(not(test), no_std)]

use core::fmt;

pub type OsResult<T> = core::result::Result<T, OsError>;

#[repr(u64)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OsError {
    Unknown = 0,
    Ok = 1,

    NoEntry = 10,
    NoMemory = 20,
    NoVmSpace = 30,
    NoAccess = 40,
    BadAddress = 50,
    FileExists = 60,
    NoSpace = 70,
    InvalidProcess = 80,

    IoError = 101,
    IoErrorEof = 102,
    IoErrorInvalidData = 103,
    IoErrorInvalidInput = 104,

    InvalidArgument = 200,
}

impl core::convert::From<u64> for OsError {
    fn from(e: u64) -> Self {
        match e {
            1 => OsError::Ok,

            10 => OsError::NoEntry,
            20 => OsError::NoMemory,
            30 => OsError::NoVmSpace,
            40 => OsError::NoAccess,
            50 => OsError::BadAddress,
            60 => OsError::FileExists,
            70 => OsError::NoSpace,
            80 => OsError::InvalidProcess,

            101 => OsError::IoError,
            102 => OsError::IoErrorEof,
            103 => OsError::IoErrorInvalidData,
            104 => OsError::IoErrorInvalidInput,

            200 => OsError::InvalidArgument,

            _ => OsError::Unknown,
        }
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub const NR_SAVE_PROC: usize = 22;
pub const NR_LOAD_PROC: usize = 23;

/// Register that carries the status code of a system call.
pub const STATUS_REG: usize = 7;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_survive_the_register_round_trip() {
        for e in [OsError::Ok, OsError::NoEntry, OsError::NoMemory, OsError::BadAddress,
                  OsError::IoErrorEof, OsError::IoErrorInvalidData, OsError::InvalidArgument].iter() {
            assert_eq!(OsError::from(*e as u64), *e);
        }
        assert_eq!(OsError::from(9999), OsError::Unknown);
    }
}
