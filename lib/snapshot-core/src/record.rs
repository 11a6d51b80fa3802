use alloc::vec::Vec;

use crate::wire::{WireReader, WireWriter};
use crate::{Error, Result, FORMAT_VERSION};

/// `magic: u32 | version: u16 | reserved: u16`
pub const HEADER_SIZE: usize = 8;

/// A fixed-size snapshot record with an explicit little-endian layout.
///
/// The encoded form never depends on how the compiler lays out the in-memory
/// structure: every field is written at a fixed offset after the header.
pub trait Record: Sized {
    const MAGIC: u32;
    const BODY_SIZE: usize;
    const SIZE: usize = HEADER_SIZE + Self::BODY_SIZE;

    fn encode_body(&self, w: &mut WireWriter<'_>);

    fn decode_body(r: &mut WireReader<'_>) -> Result<Self>;

    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        let mut w = WireWriter::new(&mut buf);
        w.put_u32(Self::MAGIC);
        w.put_u16(FORMAT_VERSION);
        w.put_u16(0);
        self.encode_body(&mut w);
        debug_assert_eq!(w.position(), Self::SIZE);
        buf
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(Error::Length { expected: Self::SIZE, found: bytes.len() });
        }

        let mut r = WireReader::new(bytes);
        let magic = r.get_u32();
        if magic != Self::MAGIC {
            return Err(Error::BadMagic { expected: Self::MAGIC, found: magic });
        }
        let version = r.get_u16();
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let _reserved = r.get_u16();

        Self::decode_body(&mut r)
    }
}

/// Callee-saved registers stored when the kernel switches away from a process.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    /// x19 through x29.
    pub regs: [u64; 11],
    pub lr: u64,
    pub sp: u64,
}

impl Record for ExecutionContext {
    const MAGIC: u32 = u32::from_le_bytes(*b"CTX1");
    const BODY_SIZE: usize = 13 * 8;

    fn encode_body(&self, w: &mut WireWriter<'_>) {
        for reg in self.regs.iter() {
            w.put_u64(*reg);
        }
        w.put_u64(self.lr);
        w.put_u64(self.sp);
    }

    fn decode_body(r: &mut WireReader<'_>) -> Result<Self> {
        let mut ctx = ExecutionContext::default();
        for reg in ctx.regs.iter_mut() {
            *reg = r.get_u64();
        }
        ctx.lr = r.get_u64();
        ctx.sp = r.get_u64();
        Ok(ctx)
    }
}

/// Register state saved on the most recent exception entry.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct TrapFrame {
    /// Saved program counter.
    pub elr: u64,
    pub spsr: u64,
    /// Saved user stack pointer.
    pub sp: u64,
    pub tpidr: u64,
    pub simd: [u128; 32],
    pub regs: [u64; 31],
}

impl TrapFrame {
    pub fn pc(&self) -> u64 {
        self.elr
    }

    pub fn stack_pointer(&self) -> u64 {
        self.sp
    }
}

impl Record for TrapFrame {
    const MAGIC: u32 = u32::from_le_bytes(*b"TRF1");
    const BODY_SIZE: usize = 4 * 8 + 32 * 16 + 31 * 8;

    fn encode_body(&self, w: &mut WireWriter<'_>) {
        w.put_u64(self.elr);
        w.put_u64(self.spsr);
        w.put_u64(self.sp);
        w.put_u64(self.tpidr);
        for q in self.simd.iter() {
            w.put_u128(*q);
        }
        for reg in self.regs.iter() {
            w.put_u64(*reg);
        }
    }

    fn decode_body(r: &mut WireReader<'_>) -> Result<Self> {
        let mut tf = TrapFrame::default();
        tf.elr = r.get_u64();
        tf.spsr = r.get_u64();
        tf.sp = r.get_u64();
        tf.tpidr = r.get_u64();
        for q in tf.simd.iter_mut() {
            *q = r.get_u128();
        }
        for reg in tf.regs.iter_mut() {
            *reg = r.get_u64();
        }
        Ok(tf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> TrapFrame {
        let mut tf = TrapFrame::default();
        tf.elr = 0x1234;
        tf.spsr = 0x3c0;
        tf.sp = 0x2000;
        tf.tpidr = 7;
        tf.simd[31] = u128::max_value() - 1;
        for (i, reg) in tf.regs.iter_mut().enumerate() {
            *reg = (i as u64) << 32 | 0xdead;
        }
        tf
    }

    #[test]
    fn encoded_layout_is_fixed() {
        let tf = sample_frame();
        let bytes = tf.encode();
        assert_eq!(bytes.len(), TrapFrame::SIZE);
        assert_eq!(&bytes[0..4], b"TRF1");
        assert_eq!(&bytes[4..6], &FORMAT_VERSION.to_le_bytes());
        // elr is the first body field
        assert_eq!(&bytes[8..16], &0x1234u64.to_le_bytes());
        assert_eq!(TrapFrame::decode(&bytes).unwrap(), tf);
    }

    #[test]
    fn context_keeps_every_register() {
        let ctx = ExecutionContext { regs: [3; 11], lr: 0xffff_0000_0008_0000, sp: 0x8_0000 };
        let decoded = ExecutionContext::decode(&ctx.encode()).unwrap();
        assert_eq!(decoded, ctx);
        assert_eq!(ExecutionContext::SIZE, HEADER_SIZE + 104);
    }

    #[test]
    fn decode_rejects_wrong_length_and_magic() {
        let bytes = ExecutionContext::default().encode();
        match ExecutionContext::decode(&bytes[..bytes.len() - 1]) {
            Err(Error::Length { expected, found }) => {
                assert_eq!(expected, ExecutionContext::SIZE);
                assert_eq!(found, ExecutionContext::SIZE - 1);
            }
            other => panic!("unexpected: {:?}", other),
        }

        // a trap frame is not a context even when sizes are forced to match
        let mut forged = bytes.clone();
        forged[0..4].copy_from_slice(b"TRF1");
        assert!(matches!(ExecutionContext::decode(&forged), Err(Error::BadMagic { .. })));
    }

    #[test]
    fn decode_rejects_future_versions() {
        let mut bytes = sample_frame().encode();
        bytes[4..6].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        assert!(matches!(TrapFrame::decode(&bytes), Err(Error::UnsupportedVersion(v)) if v == FORMAT_VERSION + 1));
    }
}
