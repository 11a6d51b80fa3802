use core::fmt;

bitflags::bitflags! {
    /// Protection bits of one page-table entry.
    ///
    /// Bits this type does not name are carried through untouched.
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u64 {
        const PRESENT  = 1 << 0;
        const WRITABLE = 1 << 1;
        const USER     = 1 << 2;

        // keep the rest of the low part of an entry
        const _ = 0xfff;
    }
}

impl PageFlags {
    /// Size of one entry in the flag stream.
    pub const WORD_SIZE: usize = 8;

    /// All bits that may live in the low part of an entry.
    pub const MASK: u64 = 0xfff;

    /// Keeps the low part of a raw page-table entry, named or not.
    pub const fn from_entry(entry: u64) -> Self {
        Self::from_bits_retain(entry & Self::MASK)
    }

    pub fn is_present(self) -> bool {
        self.contains(Self::PRESENT)
    }

    pub fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    pub fn is_user(self) -> bool {
        self.contains(Self::USER)
    }

    pub fn to_word(self) -> [u8; Self::WORD_SIZE] {
        self.bits().to_le_bytes()
    }

    /// Decodes one flag-stream entry. `word` must be `WORD_SIZE` bytes long.
    pub fn from_word(word: &[u8]) -> Self {
        let mut raw = [0u8; Self::WORD_SIZE];
        raw.copy_from_slice(word);
        Self::from_entry(u64::from_le_bytes(raw))
    }
}

impl fmt::Debug for PageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageFlags({}{}{} {:#05b})",
               if self.is_present() { "P" } else { "-" },
               if self.is_writable() { "W" } else { "-" },
               if self.is_user() { "U" } else { "-" },
               self.bits())
    }
}
