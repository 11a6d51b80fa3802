//! Little-endian cursors used by the fixed-offset record codecs.
//!
//! Callers check the buffer length up front, so the cursors index directly.

pub struct WireWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WireWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    pub fn put_u8(&mut self, v: u8) {
        self.put_bytes(&[v]);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.put_bytes(&v.to_le_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.put_bytes(&v.to_le_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.put_bytes(&v.to_le_bytes());
    }

    pub fn put_u128(&mut self, v: u128) {
        self.put_bytes(&v.to_le_bytes());
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

macro_rules! get_le {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> $ty {
            let mut raw = [0u8; core::mem::size_of::<$ty>()];
            let bytes = self.take(core::mem::size_of::<$ty>());
            raw.copy_from_slice(bytes);
            <$ty>::from_le_bytes(raw)
        }
    };
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn take(&mut self, len: usize) -> &'a [u8] {
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        bytes
    }

    pub fn get_u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    get_le!(get_u16, u16);
    get_le!(get_u32, u32);
    get_le!(get_u64, u64);
    get_le!(get_u128, u128);

    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_is_little_endian() {
        let mut buf = [0u8; 7];
        let mut w = WireWriter::new(&mut buf);
        w.put_u8(0xaa);
        w.put_u16(0x0102);
        w.put_u32(0x0a0b_0c0d);
        assert_eq!(w.position(), 7);
        assert_eq!(buf, [0xaa, 0x02, 0x01, 0x0d, 0x0c, 0x0b, 0x0a]);

        let mut r = WireReader::new(&buf);
        assert_eq!(r.get_u8(), 0xaa);
        assert_eq!(r.get_u16(), 0x0102);
        assert_eq!(r.get_u32(), 0x0a0b_0c0d);
        assert_eq!(r.position(), 7);
    }
}
