//! Table schema descriptions.
//!
//! Each entity is described once, as a [`TableSchema`]: its field slots, what each slot holds on
//! the wire, and which slots must be present. The builder uses the schema to enforce required
//! fields; the verifier uses it to check every reachable field before a view is handed out.
//! Typed [`Field`] and [`RefField`] handles carry the slot (and default) to the generic reader
//! and writer, so no per-entity encoding code is needed beyond listing the fields.

use std::marker::PhantomData;

use crate::{builder::VOffset, table::Table};

/// Highest slot a vtable can hold: its entry has to end within the 16-bit vtable length.
pub const MAX_SLOT: VOffset = 32_764;

/// Byte position of a field slot's entry inside a vtable. The first two entries hold the vtable
/// length and the table length. Entries for slots past [`MAX_SLOT`] lie beyond any vtable
/// (the arithmetic saturates at `u16::MAX`), so those slots read as absent.
#[inline]
pub const fn field_index_to_voffset(slot: VOffset) -> VOffset {
    4u16.saturating_add(slot.saturating_mul(2))
}

/// Fixed-width wire types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    UByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
}

impl ScalarKind {
    pub const fn size(self) -> usize {
        match self {
            ScalarKind::Bool | ScalarKind::UByte | ScalarKind::Byte => 1,
            ScalarKind::Short | ScalarKind::UShort => 2,
            ScalarKind::Int | ScalarKind::UInt | ScalarKind::Float => 4,
            ScalarKind::Long | ScalarKind::ULong | ScalarKind::Double => 8,
        }
    }
}

/// What a vector holds.
#[derive(Clone, Copy, Debug)]
pub enum ElemType {
    Scalar(ScalarKind),
    String,
    Table(&'static TableSchema),
}

impl ElemType {
    /// Bytes per element in the vector body.
    pub const fn stride(&self) -> usize {
        match self {
            ElemType::Scalar(kind) => kind.size(),
            ElemType::String | ElemType::Table(_) => 4,
        }
    }
}

/// What a field slot holds.
#[derive(Clone, Copy, Debug)]
pub enum WireType {
    /// Stored inline in the table.
    Scalar(ScalarKind),
    /// Forward offset to a length-prefixed, NUL-terminated UTF-8 string.
    String,
    /// Forward offset to another table.
    Table(&'static TableSchema),
    /// Forward offset to a length-prefixed vector.
    Vector(ElemType),
    /// Forward offset to a vector of tables whose schema is picked by the `u16` in slot `tag` of
    /// the same table. An absent tag reads as 0. Tags with no listed variant are only checked
    /// structurally.
    UnionVector {
        tag: VOffset,
        variants: &'static [UnionVariant],
    },
}

/// One arm of a [`WireType::UnionVector`].
#[derive(Clone, Copy, Debug)]
pub struct UnionVariant {
    pub tag: u16,
    pub schema: &'static TableSchema,
}

impl UnionVariant {
    pub const fn new(tag: u16, schema: &'static TableSchema) -> Self {
        Self { tag, schema }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub slot: VOffset,
    pub wire: WireType,
    pub required: bool,
}

impl FieldDef {
    pub const fn optional(name: &'static str, slot: VOffset, wire: WireType) -> Self {
        Self {
            name,
            slot,
            wire,
            required: false,
        }
    }

    pub const fn required(name: &'static str, slot: VOffset, wire: WireType) -> Self {
        Self {
            name,
            slot,
            wire,
            required: true,
        }
    }

    pub const fn voffset(&self) -> VOffset {
        field_index_to_voffset(self.slot)
    }
}

/// The field layout of one table type.
///
/// A schema with no fields describes a table defined elsewhere: its structure is still checked,
/// its contents are not.
#[derive(Clone, Copy, Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub fields: &'static [FieldDef],
}

impl TableSchema {
    pub const fn new(name: &'static str, fields: &'static [FieldDef]) -> Self {
        Self { name, fields }
    }

    pub fn field(&self, slot: VOffset) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.slot == slot)
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> + '_ {
        self.fields.iter().filter(|f| f.required)
    }

    /// True when the contents are described here, rather than by an external schema.
    pub fn is_opaque(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A type that is encoded as a table.
pub trait Entity {
    const SCHEMA: &'static TableSchema;
    /// Zero-copy view over an encoded table of this type.
    type View<'a>: From<Table<'a>>;
}

/// Typed handle for a scalar field: its slot and the value an absent field reads as.
#[derive(Clone, Copy, Debug)]
pub struct Field<T> {
    pub name: &'static str,
    pub slot: VOffset,
    pub default: T,
}

impl<T> Field<T> {
    pub const fn new(name: &'static str, slot: VOffset, default: T) -> Self {
        Self {
            name,
            slot,
            default,
        }
    }
}

/// Typed handle for a field holding an offset to a `T` (a string, vector or table).
pub struct RefField<T: ?Sized> {
    pub name: &'static str,
    pub slot: VOffset,
    _marker: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized> RefField<T> {
    pub const fn new(name: &'static str, slot: VOffset) -> Self {
        Self {
            name,
            slot,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Clone for RefField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for RefField<T> {}

impl<T: ?Sized> std::fmt::Debug for RefField<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "RefField({}, slot {})", self.name, self.slot)
    }
}
