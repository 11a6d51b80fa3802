use alloc::string::String;
use alloc::vec::Vec;

use crate::{Error, Result, SnapState, FORMAT_VERSION};

const MANIFEST_MAGIC: [u8; 8] = [0xec, 0xfb, 0x27, 0x3f, 0x06, 0x34, 0x14, 0x8c];

/// Summary written after every other artifact of a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u16,
    pub pid: u64,
    pub name: String,
    pub state: SnapState,
    /// Address-space size in bytes.
    pub size: u64,
    pub page_count: u64,
    pub user_pages: u64,
    /// Bytes written across the page, flag and record artifacts.
    pub bytes: u64,
}

impl Manifest {
    pub fn new() -> Self {
        Self { version: FORMAT_VERSION, ..Self::default() }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = serde_cbor::to_vec(self)?;

        let mut encoded: Vec<u8> = Vec::with_capacity(MANIFEST_MAGIC.len() + body.len());
        encoded.extend(MANIFEST_MAGIC.iter());
        encoded.extend(body.iter());
        Ok(encoded)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MANIFEST_MAGIC.len() {
            return Err(Error::Length { expected: MANIFEST_MAGIC.len(), found: bytes.len() });
        }

        if bytes.iter().take(8).zip(MANIFEST_MAGIC.iter()).any(|(a, b)| *a != *b) {
            let mut found = [0u8; 4];
            found.copy_from_slice(&bytes[..4]);
            let mut expected = [0u8; 4];
            expected.copy_from_slice(&MANIFEST_MAGIC[..4]);
            return Err(Error::BadMagic {
                expected: u32::from_le_bytes(expected),
                found: u32::from_le_bytes(found),
            });
        }

        let manifest: Manifest = serde_cbor::from_slice(&bytes[MANIFEST_MAGIC.len()..])?;
        if manifest.version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(manifest.version));
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_is_magic_prefixed_cbor() {
        let mut manifest = Manifest::new();
        manifest.pid = 2;
        manifest.name = String::from("counter");
        manifest.page_count = 3;
        manifest.state = SnapState::Ready;

        let bytes = manifest.encode().unwrap();
        assert_eq!(&bytes[..8], &MANIFEST_MAGIC);
        assert_eq!(Manifest::decode(&bytes).unwrap(), manifest);
    }

    #[test]
    fn garbage_is_not_a_manifest() {
        assert!(matches!(Manifest::decode(&[1, 2, 3]), Err(Error::Length { .. })));
        assert!(matches!(Manifest::decode(&[0u8; 32]), Err(Error::BadMagic { .. })));

        let mut bytes = Manifest::new().encode().unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(Manifest::decode(&bytes), Err(Error::Serde(_))));
    }
}
