use core::fmt;
use core::ops::{Add, BitAnd, Sub};

macro_rules! impl_address {
    ($T:ident) => {
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $T(usize);

        impl $T {
            pub const fn new(addr: usize) -> $T {
                $T(addr)
            }

            pub fn as_usize(&self) -> usize {
                self.0
            }

            pub fn as_u64(&self) -> u64 {
                self.0 as u64
            }

            pub fn is_aligned(&self, align: usize) -> bool {
                self.0 % align == 0
            }
        }

        impl From<usize> for $T {
            fn from(raw: usize) -> $T {
                $T(raw)
            }
        }

        impl From<u64> for $T {
            fn from(raw: u64) -> $T {
                $T(raw as usize)
            }
        }

        impl Add for $T {
            type Output = $T;

            fn add(self, rhs: $T) -> $T {
                $T(self.0 + rhs.0)
            }
        }

        impl Sub for $T {
            type Output = $T;

            fn sub(self, rhs: $T) -> $T {
                $T(self.0 - rhs.0)
            }
        }

        impl BitAnd for $T {
            type Output = $T;

            fn bitand(self, rhs: $T) -> $T {
                $T(self.0 & rhs.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($T), self.0)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };
}

impl_address!(VirtualAddr);
impl_address!(PhysicalAddr);
