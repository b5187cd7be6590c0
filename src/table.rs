//! Zero-copy reading.
//!
//! Nothing is decoded up front. A [`Table`] is a position in a buffer; each accessor looks up
//! the field's slot in the table's vtable and either returns the default (slot absent) or reads
//! the value in place. References are stored as offsets relative to where they're stored, so a
//! finished buffer can be copied or moved as an opaque block.
//!
//! Views are only handed out by [`root`] and [`root_with_opts`], after the buffer has passed
//! the [`Verifier`], so accessors never need to fail. The verifier doesn't look inside opaque
//! tables or at slots its schema doesn't know, so every read is still bounds-checked: bytes past
//! the end of the buffer read as zero, and an out-of-range string reads as empty.

use std::{fmt, iter::FusedIterator, marker::PhantomData};

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    builder::{VOffset, SIZE_UOFFSET},
    error::Result,
    scalar::Scalar,
    schema::{field_index_to_voffset, Entity, Field},
    verifier::{Verifier, VerifierOptions},
};

static ZEROS: [u8; 8] = [0; 8];

/// The `len` bytes at `loc`, or zeroes if they aren't all inside `buf`. `len` is at most 8.
#[inline]
pub(crate) fn bytes_at(buf: &[u8], loc: usize, len: usize) -> &[u8] {
    loc.checked_add(len)
        .and_then(|end| buf.get(loc..end))
        .unwrap_or(&ZEROS[..len])
}

#[inline]
pub(crate) fn read_uoffset(buf: &[u8], loc: usize) -> usize {
    LittleEndian::read_u32(bytes_at(buf, loc, SIZE_UOFFSET)) as usize
}

/// Something that can be read out of a buffer at a position.
pub trait Follow<'a> {
    type Inner;
    fn follow(buf: &'a [u8], loc: usize) -> Self::Inner;
}

/// Something stored directly in a vector's body, `SIZE` bytes per element.
pub trait Inline<'a>: Follow<'a> {
    const SIZE: usize;
}

macro_rules! follow_scalar {
    ($($ty:ty),+) => {
        $(
            impl<'a> Follow<'a> for $ty {
                type Inner = $ty;
                fn follow(buf: &'a [u8], loc: usize) -> $ty {
                    <$ty as Scalar>::read_le(bytes_at(buf, loc, <$ty as Scalar>::SIZE))
                }
            }

            impl<'a> Inline<'a> for $ty {
                const SIZE: usize = <$ty as Scalar>::SIZE;
            }
        )+
    };
}

follow_scalar!(u8, i8, bool, u16, i16, u32, i32, u64, i64, f32, f64);

/// A 32-bit forward offset to a `T`.
pub struct ForwardsUOffset<T>(PhantomData<T>);

impl<'a, T: Follow<'a>> Follow<'a> for ForwardsUOffset<T> {
    type Inner = T::Inner;
    fn follow(buf: &'a [u8], loc: usize) -> T::Inner {
        T::follow(buf, loc.saturating_add(read_uoffset(buf, loc)))
    }
}

impl<'a, T: Follow<'a>> Inline<'a> for ForwardsUOffset<T> {
    const SIZE: usize = SIZE_UOFFSET;
}

impl<'a> Follow<'a> for &'a str {
    type Inner = &'a str;
    fn follow(buf: &'a [u8], loc: usize) -> &'a str {
        let len = read_uoffset(buf, loc);
        let start = loc.saturating_add(SIZE_UOFFSET);
        start
            .checked_add(len)
            .and_then(|end| buf.get(start..end))
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or_default()
    }
}

/// A table's vtable: the slot-to-position map shared by tables with the same layout.
#[derive(Clone, Copy)]
pub struct VTable<'a> {
    buf: &'a [u8],
    loc: usize,
}

impl<'a> VTable<'a> {
    /// Length of the vtable in bytes.
    pub fn num_bytes(&self) -> usize {
        LittleEndian::read_u16(bytes_at(self.buf, self.loc, 2)) as usize
    }

    /// Length of the table's inline part in bytes, including the leading soffset.
    pub fn object_inline_num_bytes(&self) -> usize {
        LittleEndian::read_u16(bytes_at(self.buf, self.loc.saturating_add(2), 2)) as usize
    }

    /// Position of a field relative to the table start, or 0 if it's absent. Slots past the
    /// end of the vtable were added to the schema after the writer was built, and read as
    /// absent.
    pub fn get(&self, voffset: VOffset) -> VOffset {
        let voffset = voffset as usize;
        if voffset + 2 > self.num_bytes() {
            return 0;
        }
        LittleEndian::read_u16(bytes_at(self.buf, self.loc.saturating_add(voffset), 2))
    }
}

/// An encoded table.
#[derive(Clone, Copy, PartialEq)]
pub struct Table<'a> {
    buf: &'a [u8],
    loc: usize,
}

impl<'a> Table<'a> {
    pub(crate) fn new(buf: &'a [u8], loc: usize) -> Self {
        Self { buf, loc }
    }

    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    pub fn loc(&self) -> usize {
        self.loc
    }

    pub fn vtable(&self) -> VTable<'a> {
        let soffset = LittleEndian::read_i32(bytes_at(self.buf, self.loc, 4));
        // A vtable before the start of the buffer reads as empty.
        let loc = (self.loc as i64)
            .checked_sub(soffset as i64)
            .and_then(|loc| usize::try_from(loc).ok())
            .unwrap_or(usize::MAX);
        VTable { buf: self.buf, loc }
    }

    /// Absolute position of a field, if present.
    pub fn field_loc(&self, slot: VOffset) -> Option<usize> {
        match self.vtable().get(field_index_to_voffset(slot)) {
            0 => None,
            voffset => Some(self.loc.saturating_add(voffset as usize)),
        }
    }

    pub fn is_present(&self, slot: VOffset) -> bool {
        self.field_loc(slot).is_some()
    }

    /// Read a scalar field, or its default when absent.
    pub fn scalar<T: Scalar>(&self, field: &Field<T>) -> T {
        self.scalar_at(field.slot, field.default)
    }

    pub fn scalar_at<T: Scalar>(&self, slot: VOffset, default: T) -> T {
        match self.field_loc(slot) {
            Some(loc) => T::read_le(bytes_at(self.buf, loc, T::SIZE)),
            None => default,
        }
    }

    /// Read any field, typically a `ForwardsUOffset` to a string, vector or table.
    pub fn get<T: Follow<'a>>(&self, slot: VOffset) -> Option<T::Inner> {
        self.field_loc(slot).map(|loc| T::follow(self.buf, loc))
    }
}

impl<'a> Follow<'a> for Table<'a> {
    type Inner = Table<'a>;
    fn follow(buf: &'a [u8], loc: usize) -> Table<'a> {
        Table::new(buf, loc)
    }
}

impl<'a> fmt::Debug for Table<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Table")
            .field("loc", &self.loc)
            .field("buf_len", &self.buf.len())
            .finish()
    }
}

const EMPTY_VECTOR: [u8; 4] = [0; 4];

/// A length-prefixed vector of `T`.
pub struct Vector<'a, T> {
    buf: &'a [u8],
    loc: usize,
    _marker: PhantomData<T>,
}

impl<'a, T> Clone for Vector<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Vector<'a, T> {}

impl<'a, T> Vector<'a, T> {
    /// A vector with no elements, for absent fields.
    pub fn empty() -> Self {
        Self {
            buf: &EMPTY_VECTOR,
            loc: 0,
            _marker: PhantomData,
        }
    }

}

impl<'a, T: Inline<'a>> Vector<'a, T> {
    /// Number of elements. A stored count larger than the rest of the buffer can hold is cut
    /// down to the elements that fit.
    pub fn len(&self) -> usize {
        let room = self
            .buf
            .len()
            .saturating_sub(self.loc.saturating_add(SIZE_UOFFSET));
        read_uoffset(self.buf, self.loc).min(room / T::SIZE)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, idx: usize) -> Option<T::Inner> {
        if idx >= self.len() {
            return None;
        }
        Some(T::follow(self.buf, self.loc + SIZE_UOFFSET + idx * T::SIZE))
    }

    pub fn iter(&self) -> VectorIter<'a, T> {
        VectorIter {
            vec: *self,
            front: 0,
            back: self.len(),
        }
    }
}

impl<'a, T> Follow<'a> for Vector<'a, T> {
    type Inner = Vector<'a, T>;
    fn follow(buf: &'a [u8], loc: usize) -> Vector<'a, T> {
        Vector {
            buf,
            loc,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: Inline<'a>> fmt::Debug for Vector<'a, T>
where
    T::Inner: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T: Inline<'a>> IntoIterator for Vector<'a, T> {
    type Item = T::Inner;
    type IntoIter = VectorIter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct VectorIter<'a, T> {
    vec: Vector<'a, T>,
    front: usize,
    back: usize,
}

impl<'a, T: Inline<'a>> Iterator for VectorIter<'a, T> {
    type Item = T::Inner;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.vec.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.back - self.front;
        (left, Some(left))
    }
}

impl<'a, T: Inline<'a>> DoubleEndedIterator for VectorIter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.vec.get(self.back)
    }
}

impl<'a, T: Inline<'a>> ExactSizeIterator for VectorIter<'a, T> {}

impl<'a, T: Inline<'a>> FusedIterator for VectorIter<'a, T> {}

/// Verify `buf` as a finished buffer rooted at an `E` table and return a view of the root.
///
/// Only the buffer's structure is checked: required fields that are missing read as absent.
/// Use [`root_with_opts`] with `check_required` set to reject them.
pub fn root<E: Entity>(buf: &[u8]) -> Result<E::View<'_>> {
    root_with_opts::<E>(buf, &VerifierOptions::default())
}

pub fn root_with_opts<'a, E: Entity>(
    buf: &'a [u8],
    opts: &VerifierOptions,
) -> Result<E::View<'a>> {
    let loc = Verifier::new(buf, opts).verify_root(E::SCHEMA)?;
    Ok(<E::View<'a>>::from(Table::new(buf, loc)))
}
