use core::fmt;

#[derive(Debug)]
pub enum Error {
    Serde(serde_cbor::Error),
    Length { expected: usize, found: usize },
    BadMagic { expected: u32, found: u32 },
    UnsupportedVersion(u16),
    InvalidField(&'static str),
}

impl From<serde_cbor::Error> for Error {
    fn from(e: serde_cbor::Error) -> Self {
        Error::Serde(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Serde(e) => write!(f, "cbor: {}", e),
            Error::Length { expected, found } => write!(f, "expected {} bytes, found {}", expected, found),
            Error::BadMagic { expected, found } => write!(f, "bad magic 0x{:08x} (expected 0x{:08x})", found, expected),
            Error::UnsupportedVersion(v) => write!(f, "unsupported format version {}", v),
            Error::InvalidField(name) => write!(f, "invalid value for field `{}`", name),
        }
    }
}
