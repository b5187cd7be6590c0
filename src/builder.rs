//! Back-to-front buffer builder.
//!
//! Data is written from the end of an arena towards its start, so every child (string, vector,
//! nested table) is complete before the table that points at it begins. Offsets handed out by
//! the builder are measured from the end of the arena, which keeps them valid while the arena
//! grows.
//!
//! Build order is enforced by the borrow checker: a [`TableWriter`] holds the builder mutably, so
//! strings and vectors for a table must be created before [`Builder::start_table`] is called.

use std::marker::PhantomData;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    scalar::Scalar,
    schema::{field_index_to_voffset, Entity, Field, RefField, TableSchema, MAX_SLOT},
    MAX_BUFFER_SIZE,
};

pub type UOffset = u32;
pub type SOffset = i32;
pub type VOffset = u16;

pub const SIZE_UOFFSET: usize = 4;
pub const SIZE_SOFFSET: usize = 4;
pub const SIZE_VOFFSET: usize = 2;

/// Number of bytes needed to pad `buf_size` up to a multiple of `scalar_size` (a power of two).
#[inline]
pub(crate) fn padding_bytes(buf_size: usize, scalar_size: usize) -> usize {
    (!buf_size).wrapping_add(1) & (scalar_size.wrapping_sub(1))
}

/// Offset of something already written into a [`Builder`], measured from the end of the
/// arena. `T` records what was written there: `str`, `[E]` for a vector of `E`, or an
/// [`Entity`] for a table.
pub struct Offset<T: ?Sized> {
    value: UOffset,
    _marker: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized> Offset<T> {
    pub(crate) fn new(value: UOffset) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn value(&self) -> UOffset {
        self.value
    }

    /// Re-tag the offset. Only used where the wire layout is identical for both tags.
    pub(crate) fn cast<U: ?Sized>(self) -> Offset<U> {
        Offset::new(self.value)
    }
}

impl<T: ?Sized> Clone for Offset<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Offset<T> {}

impl<T: ?Sized> PartialEq for Offset<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: ?Sized> Eq for Offset<T> {}

impl<T: ?Sized> std::fmt::Debug for Offset<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Offset({})", self.value)
    }
}

/// Tuning for a [`Builder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Starting arena size in bytes. The arena doubles whenever it runs out of room.
    pub initial_capacity: usize,
    /// Write scalar fields even when they equal their default.
    pub force_defaults: bool,
    /// Reuse an identical, previously written vtable instead of writing a new one.
    pub dedup_vtables: bool,
    /// Largest buffer the builder may produce. Clamped to [`MAX_BUFFER_SIZE`].
    pub max_size: usize,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            force_defaults: false,
            dedup_vtables: true,
            max_size: MAX_BUFFER_SIZE,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct FieldLoc {
    off: UOffset,
    slot: VOffset,
}

/// Builds one buffer. Not shareable while building; `finish` hands back the immutable bytes.
#[derive(Debug)]
pub struct Builder {
    buf: Vec<u8>,
    head: usize,
    min_align: usize,
    field_locs: Vec<FieldLoc>,
    written_vtables: Vec<UOffset>,
    max_size: usize,
    force_defaults: bool,
    dedup_vtables: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::with_options(&BuilderOptions::default())
    }

    pub fn with_options(options: &BuilderOptions) -> Self {
        let max_size = options.max_size.min(MAX_BUFFER_SIZE);
        let capacity = options.initial_capacity.min(max_size);
        Self {
            buf: vec![0u8; capacity],
            head: capacity,
            min_align: 1,
            field_locs: Vec::new(),
            written_vtables: Vec::new(),
            max_size,
            force_defaults: options.force_defaults,
            dedup_vtables: options.dedup_vtables,
        }
    }

    /// Number of bytes written so far.
    pub fn used_space(&self) -> usize {
        self.buf.len() - self.head
    }

    /// Drop everything written so far, keeping the arena allocation.
    pub fn reset(&mut self) {
        self.head = self.buf.len();
        self.min_align = 1;
        self.field_locs.clear();
        self.written_vtables.clear();
    }

    fn ensure_capacity(&mut self, want: usize) -> Result<()> {
        if self.head >= want {
            return Ok(());
        }
        let used = self.used_space();
        let needed = used + want;
        if needed > self.max_size {
            return Err(Error::LengthTooLong {
                max: self.max_size,
                actual: needed,
            });
        }
        let mut new_len = self.buf.len().max(16);
        while new_len < needed {
            new_len *= 2;
        }
        let new_len = new_len.min(self.max_size);
        let mut grown = vec![0u8; new_len];
        grown[new_len - used..].copy_from_slice(&self.buf[self.head..]);
        self.buf = grown;
        self.head = new_len - used;
        Ok(())
    }

    fn make_space(&mut self, want: usize) -> Result<usize> {
        self.ensure_capacity(want)?;
        self.head -= want;
        Ok(self.head)
    }

    fn fill(&mut self, len: usize) -> Result<()> {
        let at = self.make_space(len)?;
        self.buf[at..at + len].fill(0);
        Ok(())
    }

    /// Pad so that after writing `len` more bytes the arena is aligned to `alignment`.
    fn align(&mut self, len: usize, alignment: usize) -> Result<()> {
        self.min_align = self.min_align.max(alignment);
        let pad = padding_bytes(self.used_space() + len, alignment);
        self.fill(pad)
    }

    /// Write a scalar, aligned to its own size.
    pub fn push<T: Scalar>(&mut self, v: T) -> Result<UOffset> {
        self.align(T::SIZE, T::SIZE)?;
        let at = self.make_space(T::SIZE)?;
        v.write_le(&mut self.buf[at..at + T::SIZE]);
        Ok(self.used_space() as UOffset)
    }

    /// Write a forward offset pointing at `target`, relative to the offset's own position.
    fn push_uoffset(&mut self, target: UOffset) -> Result<UOffset> {
        self.align(SIZE_UOFFSET, SIZE_UOFFSET)?;
        let n = self.used_space() + SIZE_UOFFSET;
        debug_assert!(n >= target as usize, "Offsets may only point at finished data");
        self.push((n - target as usize) as UOffset)
    }

    fn check_slot(slot: VOffset) -> Result<()> {
        if slot > MAX_SLOT {
            return Err(Error::BadEncode(format!(
                "Slot {} is past the last slot a vtable can hold ({})",
                slot, MAX_SLOT
            )));
        }
        Ok(())
    }

    fn push_slot<T: Scalar>(&mut self, slot: VOffset, v: T, default: T) -> Result<()> {
        Self::check_slot(slot)?;
        if v == default && !self.force_defaults {
            return Ok(());
        }
        let off = self.push(v)?;
        self.field_locs.push(FieldLoc { off, slot });
        Ok(())
    }

    fn push_slot_offset<T: ?Sized>(&mut self, slot: VOffset, target: Offset<T>) -> Result<()> {
        Self::check_slot(slot)?;
        let off = self.push_uoffset(target.value())?;
        self.field_locs.push(FieldLoc { off, slot });
        Ok(())
    }

    /// Write a length-prefixed, NUL-terminated UTF-8 string.
    pub fn create_string(&mut self, s: &str) -> Result<Offset<str>> {
        self.align(s.len() + 1, SIZE_UOFFSET)?;
        self.push(0u8)?;
        let at = self.make_space(s.len())?;
        self.buf[at..at + s.len()].copy_from_slice(s.as_bytes());
        let off = self.push(s.len() as UOffset)?;
        Ok(Offset::new(off))
    }

    fn start_vector(&mut self, len: usize, elem_size: usize, alignment: usize) -> Result<()> {
        let bytes = len.checked_mul(elem_size).ok_or(Error::LengthTooLong {
            max: self.max_size,
            actual: usize::MAX,
        })?;
        self.align(bytes, SIZE_UOFFSET.max(alignment))?;
        self.align(bytes, alignment)
    }

    fn end_vector<T: ?Sized>(&mut self, len: usize) -> Result<Offset<T>> {
        let off = self.push(len as UOffset)?;
        Ok(Offset::new(off))
    }

    /// Write a vector of scalars. The first element ends up at the lowest address.
    pub fn create_vector<T: Scalar>(&mut self, items: &[T]) -> Result<Offset<[T]>> {
        self.start_vector(items.len(), T::SIZE, T::SIZE)?;
        for &item in items.iter().rev() {
            self.push(item)?;
        }
        self.end_vector(items.len())
    }

    /// Write a vector of forward offsets to already written strings, vectors or tables.
    pub fn create_vector_of_offsets<T: ?Sized>(
        &mut self,
        items: &[Offset<T>],
    ) -> Result<Offset<[Offset<T>]>> {
        self.start_vector(items.len(), SIZE_UOFFSET, SIZE_UOFFSET)?;
        for item in items.iter().rev() {
            self.push_uoffset(item.value())?;
        }
        self.end_vector(items.len())
    }

    /// Write every string, then a vector referencing them in the given order.
    pub fn create_vector_of_strings<S: AsRef<str>>(
        &mut self,
        items: &[S],
    ) -> Result<Offset<[Offset<str>]>> {
        let offsets = items
            .iter()
            .map(|s| self.create_string(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.create_vector_of_offsets(&offsets)
    }

    /// Begin a table of entity `E`. Nothing else can be written until the returned writer is
    /// finished or dropped.
    pub fn start_table<E: Entity>(&mut self) -> TableWriter<'_, E> {
        self.field_locs.clear();
        let start = self.used_space() as UOffset;
        TableWriter {
            builder: self,
            start,
            _entity: PhantomData,
        }
    }

    fn end_table(&mut self, start: UOffset, schema: &TableSchema) -> Result<UOffset> {
        for field in schema.required_fields() {
            if !self.field_locs.iter().any(|loc| loc.slot == field.slot) {
                self.field_locs.clear();
                tracing::debug!(
                    table = schema.name,
                    field = field.name,
                    "refusing to end table without a required field"
                );
                return Err(Error::MissingRequiredField {
                    table: schema.name,
                    field: field.name,
                    slot: field.slot,
                });
            }
        }

        let object_loc = self.push::<SOffset>(0)?;
        let table_len = object_loc as usize - start as usize;
        if table_len > u16::MAX as usize {
            self.field_locs.clear();
            return Err(Error::TableTooLarge {
                table: schema.name,
                size: table_len,
            });
        }

        let slots = self
            .field_locs
            .iter()
            .map(|loc| loc.slot as usize + 1)
            .max()
            .unwrap_or(0);
        let vtable_len = (2 + slots) * SIZE_VOFFSET;
        let mut vtable = vec![0u8; vtable_len];
        LittleEndian::write_u16(&mut vtable[0..2], vtable_len as u16);
        LittleEndian::write_u16(&mut vtable[2..4], table_len as u16);
        for loc in self.field_locs.drain(..) {
            let pos = field_index_to_voffset(loc.slot) as usize;
            LittleEndian::write_u16(&mut vtable[pos..pos + 2], (object_loc - loc.off) as u16);
        }

        let existing = if self.dedup_vtables {
            self.written_vtables
                .iter()
                .copied()
                .find(|&vt| self.vtable_at(vt) == &vtable[..])
        } else {
            None
        };
        let vtable_loc = match existing {
            Some(vt) => vt,
            None => {
                let at = self.make_space(vtable_len)?;
                self.buf[at..at + vtable_len].copy_from_slice(&vtable);
                let vt = self.used_space() as UOffset;
                self.written_vtables.push(vt);
                vt
            }
        };

        // vtable position = table position - soffset
        let object_at = self.buf.len() - object_loc as usize;
        LittleEndian::write_i32(
            &mut self.buf[object_at..object_at + SIZE_SOFFSET],
            vtable_loc as SOffset - object_loc as SOffset,
        );
        Ok(object_loc)
    }

    fn vtable_at(&self, vt: UOffset) -> &[u8] {
        let at = self.buf.len() - vt as usize;
        let len = LittleEndian::read_u16(&self.buf[at..at + 2]) as usize;
        &self.buf[at..at + len]
    }

    /// Prefix the buffer with the offset of `root` and hand back the finished bytes.
    pub fn finish<E: Entity>(mut self, root: Offset<E>) -> Result<Vec<u8>> {
        let min_align = self.min_align;
        self.align(SIZE_UOFFSET, min_align)?;
        self.push_uoffset(root.value())?;
        tracing::trace!(
            root = E::SCHEMA.name,
            size = self.used_space(),
            "finished buffer"
        );
        let head = self.head;
        let mut buf = self.buf;
        buf.drain(..head);
        Ok(buf)
    }
}

/// Writes the fields of one table. Fields may be added in any order; the order they're added in
/// is the order they're laid out in, last added at the lowest address.
pub struct TableWriter<'b, E: Entity> {
    builder: &'b mut Builder,
    start: UOffset,
    _entity: PhantomData<fn() -> E>,
}

impl<'b, E: Entity> TableWriter<'b, E> {
    /// Add a scalar field. Skipped if it equals the field's default, unless the builder forces
    /// defaults.
    pub fn add<T: Scalar>(&mut self, field: &Field<T>, value: T) -> Result<()> {
        self.builder.push_slot(field.slot, value, field.default)
    }

    /// Add a reference to a string, vector or table written earlier.
    pub fn add_offset<T: ?Sized>(&mut self, field: &RefField<T>, target: Offset<T>) -> Result<()> {
        self.builder.push_slot_offset(field.slot, target)
    }

    /// Like [`add_offset`][Self::add_offset], doing nothing for `None`.
    pub fn add_opt_offset<T: ?Sized>(
        &mut self,
        field: &RefField<T>,
        target: Option<Offset<T>>,
    ) -> Result<()> {
        match target {
            Some(target) => self.add_offset(field, target),
            None => Ok(()),
        }
    }

    /// Add a scalar to a raw slot, for tables whose schema lives outside this crate.
    pub fn add_raw<T: Scalar>(&mut self, slot: VOffset, value: T, default: T) -> Result<()> {
        self.builder.push_slot(slot, value, default)
    }

    /// Add an offset to a raw slot, for tables whose schema lives outside this crate.
    pub fn add_raw_offset<T: ?Sized>(&mut self, slot: VOffset, target: Offset<T>) -> Result<()> {
        self.builder.push_slot_offset(slot, target)
    }

    /// Write the vtable and close the table. Fails if a required field was never added.
    pub fn finish(self) -> Result<Offset<E>> {
        self.builder.end_table(self.start, E::SCHEMA).map(Offset::new)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raft::VoteRequest;
    use crate::schema::{FieldDef, ScalarKind, WireType};
    use crate::table::{root, ForwardsUOffset, Table};

    enum Probe {}

    const PROBE_SCHEMA: TableSchema = TableSchema::new(
        "Probe",
        &[
            FieldDef::required("label", 0, WireType::String),
            FieldDef::optional("wide", 1, WireType::Scalar(ScalarKind::ULong)),
            FieldDef::optional("flag", 2, WireType::Scalar(ScalarKind::Bool)),
        ],
    );

    impl Entity for Probe {
        const SCHEMA: &'static TableSchema = &PROBE_SCHEMA;
        type View<'a> = Table<'a>;
    }

    const LABEL: RefField<str> = RefField::new("label", 0);
    const WIDE: Field<u64> = Field::new("wide", 1, 0);
    const FLAG: Field<bool> = Field::new("flag", 2, false);

    #[test]
    fn padding() {
        assert_eq!(padding_bytes(0, 4), 0);
        assert_eq!(padding_bytes(1, 4), 3);
        assert_eq!(padding_bytes(6, 4), 2);
        assert_eq!(padding_bytes(9, 8), 7);
        assert_eq!(padding_bytes(5, 1), 0);
    }

    #[test]
    fn vote_request_term_only_layout() {
        let mut builder = Builder::new();
        let mut table = builder.start_table::<VoteRequest>();
        table.add(&VoteRequest::TERM, 7).unwrap();
        let root = table.finish().unwrap();
        let buf = builder.finish(root).unwrap();
        assert_eq!(
            buf,
            &[
                0x0c, 0x00, 0x00, 0x00, // root offset -> 12
                0x00, 0x00, // padding
                0x06, 0x00, 0x08, 0x00, 0x04, 0x00, // vtable: 6 bytes, table 8 bytes, slot 0 @ 4
                0x06, 0x00, 0x00, 0x00, // soffset: vtable is 6 bytes back
                0x07, 0x00, 0x00, 0x00, // term
            ]
        );
    }

    #[test]
    fn empty_table_layout() {
        let mut builder = Builder::new();
        let root = builder.start_table::<VoteRequest>().finish().unwrap();
        let buf = builder.finish(root).unwrap();
        assert_eq!(
            buf,
            &[0x08, 0x00, 0x00, 0x00, 0x04, 0x00, 0x04, 0x00, 0x04, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn string_layout() {
        let mut builder = Builder::new();
        builder.create_string("hi").unwrap();
        assert_eq!(builder.used_space(), 8);
        let at = builder.head;
        assert_eq!(
            &builder.buf[at..],
            &[0x02, 0x00, 0x00, 0x00, b'h', b'i', 0x00, 0x00]
        );
    }

    #[test]
    fn scalar_vector_layout() {
        let mut builder = Builder::new();
        builder.create_vector(&[1u16, 2, 3]).unwrap();
        let at = builder.head;
        assert_eq!(
            &builder.buf[at..],
            &[0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn missing_required_field() {
        let mut builder = Builder::new();
        let mut table = builder.start_table::<Probe>();
        table.add(&WIDE, 99).unwrap();
        let err = table.finish().unwrap_err();
        assert_eq!(
            err,
            Error::MissingRequiredField {
                table: "Probe",
                field: "label",
                slot: 0
            }
        );
    }

    #[test]
    fn defaults_are_omitted() {
        let mut builder = Builder::new();
        let label = builder.create_string("x").unwrap();
        let mut table = builder.start_table::<Probe>();
        table.add(&WIDE, 0).unwrap();
        table.add(&FLAG, false).unwrap();
        table.add_offset(&LABEL, label).unwrap();
        let root_off = table.finish().unwrap();
        let buf = builder.finish(root_off).unwrap();
        let probe = root::<Probe>(&buf).unwrap();
        assert!(probe.is_present(0));
        assert!(!probe.is_present(1));
        assert!(!probe.is_present(2));
        assert_eq!(probe.scalar(&WIDE), 0);
    }

    #[test]
    fn force_defaults() {
        let options = BuilderOptions {
            force_defaults: true,
            ..BuilderOptions::default()
        };
        let mut builder = Builder::with_options(&options);
        let label = builder.create_string("x").unwrap();
        let mut table = builder.start_table::<Probe>();
        table.add(&WIDE, 0).unwrap();
        table.add_offset(&LABEL, label).unwrap();
        let root_off = table.finish().unwrap();
        let buf = builder.finish(root_off).unwrap();
        let probe = root::<Probe>(&buf).unwrap();
        assert!(probe.is_present(1));
        assert_eq!(probe.scalar(&WIDE), 0);
    }

    #[test]
    fn vtables_are_shared() {
        let build = |dedup: bool| {
            let options = BuilderOptions {
                dedup_vtables: dedup,
                ..BuilderOptions::default()
            };
            let mut builder = Builder::with_options(&options);
            for i in 1..=4u32 {
                let mut table = builder.start_table::<VoteRequest>();
                table.add(&VoteRequest::TERM, i).unwrap();
                table.finish().unwrap();
            }
            (builder.used_space(), builder.written_vtables.len())
        };
        let (shared, shared_count) = build(true);
        let (unshared, unshared_count) = build(false);
        assert_eq!(unshared_count, 4);
        assert!(shared_count < unshared_count);
        assert!(shared < unshared, "{} vs {}", shared, unshared);
    }

    #[test]
    fn grows_from_tiny_capacity() {
        let options = BuilderOptions {
            initial_capacity: 1,
            ..BuilderOptions::default()
        };
        let mut builder = Builder::with_options(&options);
        let long = "z".repeat(5000);
        let label = builder.create_string(&long).unwrap();
        let mut table = builder.start_table::<Probe>();
        table.add(&WIDE, u64::MAX).unwrap();
        table.add_offset(&LABEL, label).unwrap();
        let root_off = table.finish().unwrap();
        let buf = builder.finish(root_off).unwrap();
        let probe = root::<Probe>(&buf).unwrap();
        assert_eq!(probe.get::<ForwardsUOffset<&str>>(0), Some(long.as_str()));
        assert_eq!(probe.scalar(&WIDE), u64::MAX);
    }

    #[test]
    fn size_limit() {
        let options = BuilderOptions {
            max_size: 64,
            ..BuilderOptions::default()
        };
        let mut builder = Builder::with_options(&options);
        let err = builder.create_string(&"a".repeat(100)).unwrap_err();
        assert!(matches!(err, Error::LengthTooLong { max: 64, .. }));
    }

    #[test]
    fn reset_discards_content() {
        let mut builder = Builder::new();
        builder.create_string("discard me").unwrap();
        builder.reset();
        assert_eq!(builder.used_space(), 0);
        let root = builder.start_table::<VoteRequest>().finish().unwrap();
        assert_eq!(builder.finish(root).unwrap().len(), 12);
    }

    #[test]
    fn slot_limit() {
        let mut builder = Builder::new();
        let mut table = builder.start_table::<VoteRequest>();
        let err = table.add_raw::<u16>(MAX_SLOT + 1, 1, 0).unwrap_err();
        assert!(matches!(err, Error::BadEncode(_)));
        let err = table.add_raw::<u16>(u16::MAX, 0, 0).unwrap_err();
        assert!(matches!(err, Error::BadEncode(_)));
        drop(table);

        let label = builder.create_string("far").unwrap();
        let mut table = builder.start_table::<VoteRequest>();
        let err = table.add_raw_offset(40_000, label).unwrap_err();
        assert!(matches!(err, Error::BadEncode(_)));
        table.add_raw::<u16>(MAX_SLOT, 7, 0).unwrap();
        let root_off = table.finish().unwrap();
        let buf = builder.finish(root_off).unwrap();

        let view = root::<VoteRequest>(&buf).unwrap().table();
        assert_eq!(view.vtable().num_bytes(), 65_534);
        assert_eq!(view.scalar_at::<u16>(MAX_SLOT, 0), 7);
        assert_eq!(view.scalar_at::<u16>(MAX_SLOT + 1, 3), 3);
        assert_eq!(view.scalar_at::<u16>(u16::MAX, 3), 3);
    }
}
