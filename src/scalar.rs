//! Fixed-width little-endian values that can be stored inline in a table or a vector.

use std::fmt::Debug;

use byteorder::{ByteOrder, LittleEndian};

/// A fixed-size value stored inline, always little-endian on the wire.
///
/// `write_le` and `read_le` are handed slices of exactly `SIZE` bytes.
pub trait Scalar: Copy + PartialEq + Debug {
    const SIZE: usize;
    fn write_le(self, dst: &mut [u8]);
    fn read_le(src: &[u8]) -> Self;
}

impl Scalar for u8 {
    const SIZE: usize = 1;
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self;
    }
    fn read_le(src: &[u8]) -> Self {
        src[0]
    }
}

impl Scalar for i8 {
    const SIZE: usize = 1;
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }
    fn read_le(src: &[u8]) -> Self {
        src[0] as i8
    }
}

impl Scalar for bool {
    const SIZE: usize = 1;
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }
    fn read_le(src: &[u8]) -> Self {
        src[0] != 0
    }
}

macro_rules! impl_scalar {
    ($($ty:ty, $size:expr, $read:ident, $write:ident;)+) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = $size;
                fn write_le(self, dst: &mut [u8]) {
                    LittleEndian::$write(dst, self)
                }
                fn read_le(src: &[u8]) -> Self {
                    LittleEndian::$read(src)
                }
            }
        )+
    };
}

impl_scalar! {
    u16, 2, read_u16, write_u16;
    i16, 2, read_i16, write_i16;
    u32, 4, read_u32, write_u32;
    i32, 4, read_i32, write_i32;
    u64, 8, read_u64, write_u64;
    i64, 8, read_i64, write_i64;
    f32, 4, read_f32, write_f32;
    f64, 8, read_f64, write_f64;
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode<T: Scalar>(v: T) -> Vec<u8> {
        let mut buf = vec![0u8; T::SIZE];
        v.write_le(&mut buf);
        buf
    }

    #[test]
    fn little_endian_layout() {
        assert_eq!(encode(0x1234u16), &[0x34, 0x12]);
        assert_eq!(encode(-2i16), &[0xfe, 0xff]);
        assert_eq!(encode(0x0102_0304u32), &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(encode(1.0f32), &[0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(encode(-1i8), &[0xff]);
        assert_eq!(encode(true), &[0x01]);
    }

    #[test]
    fn bool_reads_any_nonzero_as_true() {
        assert!(bool::read_le(&[0x02]));
        assert!(!bool::read_le(&[0x00]));
    }

    #[test]
    fn read_back() {
        assert_eq!(i32::read_le(&encode(i32::MIN)), i32::MIN);
        assert_eq!(u64::read_le(&encode(u64::MAX - 7)), u64::MAX - 7);
        assert_eq!(f64::read_le(&encode(-0.25f64)), -0.25);
    }
}
