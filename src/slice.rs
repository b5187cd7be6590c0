//! Indexed scalar values: the elements of a pin's array value.
//!
//! A slice is one `(index, value)` pair, encoded as its own small table. There are four variants
//! that differ in value type, and also in index width: bool, byte and short slices carry an
//! 8-bit index while float slices carry a 32-bit one. Nothing inside a slice says which variant
//! it is; the owning pin's `ValueType` field does.

use std::{collections::BTreeSet, fmt, marker::PhantomData};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    builder::{Builder, Offset},
    error::{Error, Result},
    pin::ValType,
    scalar::Scalar,
    schema::{Entity, Field, FieldDef, ScalarKind, TableSchema, UnionVariant, WireType},
    table::{root, Follow, ForwardsUOffset, Table, Vector},
};

/// A value type a slice can carry.
pub trait SliceValue: Scalar + Serialize + DeserializeOwned {
    /// Index type of this slice variant.
    type Index: Scalar + TryFrom<u32> + Into<u32> + Serialize + DeserializeOwned;
    /// Table name of this slice variant.
    const NAME: &'static str;
    /// The owning pin's value type when it holds slices of this variant.
    const VALUE_TYPE: ValType;
    const SCHEMA: &'static TableSchema;
    /// Largest index this variant can hold.
    const MAX_INDEX: u32;
    const INDEX: Field<Self::Index>;
    const VALUE: Field<Self>;
}

macro_rules! slice_value {
    ($($value:ty, $index:ty, $name:literal, $val_type:ident, $value_kind:ident, $index_kind:ident, $zero:expr;)+) => {
        $(
            impl SliceValue for $value {
                type Index = $index;
                const NAME: &'static str = $name;
                const VALUE_TYPE: ValType = ValType::$val_type;
                const SCHEMA: &'static TableSchema = &TableSchema::new(
                    $name,
                    &[
                        FieldDef::optional("Index", 0, WireType::Scalar(ScalarKind::$index_kind)),
                        FieldDef::optional("Value", 1, WireType::Scalar(ScalarKind::$value_kind)),
                    ],
                );
                const MAX_INDEX: u32 = <$index>::MAX as u32;
                const INDEX: Field<$index> = Field::new("Index", 0, 0);
                const VALUE: Field<$value> = Field::new("Value", 1, $zero);
            }
        )+
    };
}

slice_value! {
    bool, u8, "BoolSlice", Bool, Bool, UByte, false;
    i8, u8, "ByteSlice", Byte, Byte, UByte, 0;
    i16, u8, "ShortSlice", Int, Short, UByte, 0;
    f32, u32, "FloatSlice", Real, Float, UInt, 0.0;
}

/// Element schemas of a pin's slice vector, keyed by the pin's `ValueType`.
pub(crate) const SLICE_VARIANTS: &[UnionVariant] = &[
    UnionVariant::new(ValType::Real as u16, <f32 as SliceValue>::SCHEMA),
    UnionVariant::new(ValType::Int as u16, <i16 as SliceValue>::SCHEMA),
    UnionVariant::new(ValType::Bool as u16, <bool as SliceValue>::SCHEMA),
    UnionVariant::new(ValType::Byte as u16, <i8 as SliceValue>::SCHEMA),
];

/// One element of a pin's array value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Slice<T: SliceValue> {
    pub index: T::Index,
    pub value: T,
}

impl<T: SliceValue> Entity for Slice<T> {
    const SCHEMA: &'static TableSchema = T::SCHEMA;
    type View<'a> = SliceRef<'a, T>;
}

impl<T: SliceValue> Slice<T> {
    pub fn new(index: T::Index, value: T) -> Self {
        Self { index, value }
    }

    /// Build a slice from a wide index. Indices that don't fit this variant's index type are
    /// rejected, never truncated.
    pub fn try_new(index: u32, value: T) -> Result<Self> {
        let narrow =
            <T::Index as TryFrom<u32>>::try_from(index).map_err(|_| Error::IndexOutOfRange {
                slice: T::NAME,
                index,
                max: T::MAX_INDEX,
            })?;
        Ok(Self::new(narrow, value))
    }

    /// The index, widened.
    pub fn index(&self) -> u32 {
        self.index.into()
    }

    pub fn create(&self, builder: &mut Builder) -> Result<Offset<Self>> {
        let mut table = builder.start_table::<Self>();
        table.add(&T::VALUE, self.value)?;
        table.add(&T::INDEX, self.index)?;
        table.finish()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut builder = Builder::new();
        let root = self.create(&mut builder)?;
        builder.finish(root)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        Ok(root::<Self>(buf)?.to_owned())
    }
}

/// Zero-copy view of an encoded slice.
pub struct SliceRef<'a, T> {
    table: Table<'a>,
    _marker: PhantomData<T>,
}

impl<'a, T> Clone for SliceRef<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for SliceRef<'a, T> {}

impl<'a, T> From<Table<'a>> for SliceRef<'a, T> {
    fn from(table: Table<'a>) -> Self {
        Self {
            table,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Follow<'a> for SliceRef<'a, T> {
    type Inner = SliceRef<'a, T>;
    fn follow(buf: &'a [u8], loc: usize) -> Self {
        Table::new(buf, loc).into()
    }
}

impl<'a, T: SliceValue> SliceRef<'a, T> {
    pub fn index(&self) -> T::Index {
        self.table.scalar(&T::INDEX)
    }

    pub fn value(&self) -> T {
        self.table.scalar(&T::VALUE)
    }

    pub fn to_owned(&self) -> Slice<T> {
        Slice::new(self.index(), self.value())
    }
}

impl<'a, T: SliceValue> fmt::Debug for SliceRef<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct(T::NAME)
            .field("index", &self.index())
            .field("value", &self.value())
            .finish()
    }
}

/// A pin's whole array value, in one of the four slice variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Slices {
    Bool(Vec<Slice<bool>>),
    Byte(Vec<Slice<i8>>),
    Short(Vec<Slice<i16>>),
    Float(Vec<Slice<f32>>),
}

impl Default for Slices {
    fn default() -> Self {
        Slices::Float(Vec::new())
    }
}

/// Tag for a table in a slice vector whose variant is decided by the owning pin.
pub enum AnySlice {}

/// A written slice vector, along with the value type the owning pin must declare for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceVectorOffset {
    pub value_type: ValType,
    pub offset: Offset<[Offset<AnySlice>]>,
}

fn create_slices<T: SliceValue>(
    builder: &mut Builder,
    slices: &[Slice<T>],
) -> Result<SliceVectorOffset> {
    let mut seen = BTreeSet::new();
    for slice in slices {
        if !seen.insert(slice.index()) {
            return Err(Error::DuplicateSliceIndex {
                index: slice.index(),
            });
        }
    }
    let offsets = slices
        .iter()
        .map(|s| s.create(builder).map(Offset::cast))
        .collect::<Result<Vec<Offset<AnySlice>>>>()?;
    let offset = builder.create_vector_of_offsets(&offsets)?;
    Ok(SliceVectorOffset {
        value_type: T::VALUE_TYPE,
        offset,
    })
}

impl Slices {
    pub fn value_type(&self) -> ValType {
        match self {
            Slices::Bool(_) => ValType::Bool,
            Slices::Byte(_) => ValType::Byte,
            Slices::Short(_) => ValType::Int,
            Slices::Float(_) => ValType::Real,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Slices::Bool(v) => v.len(),
            Slices::Byte(v) => v.len(),
            Slices::Short(v) => v.len(),
            Slices::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every slice table and then the vector referencing them, in order. Fails if two
    /// slices share an index.
    pub fn create(&self, builder: &mut Builder) -> Result<SliceVectorOffset> {
        match self {
            Slices::Bool(v) => create_slices(builder, v),
            Slices::Byte(v) => create_slices(builder, v),
            Slices::Short(v) => create_slices(builder, v),
            Slices::Float(v) => create_slices(builder, v),
        }
    }
}

type SliceVector<'a, T> = Vector<'a, ForwardsUOffset<SliceRef<'a, T>>>;

/// Zero-copy view of a pin's slice vector, dispatched on the pin's value type.
#[derive(Clone, Copy, Debug)]
pub enum PinSlices<'a> {
    Bool(SliceVector<'a, bool>),
    Byte(SliceVector<'a, i8>),
    Short(SliceVector<'a, i16>),
    Float(SliceVector<'a, f32>),
    /// The pin declared a value type this build doesn't know.
    Untyped {
        value_type: u16,
        tables: Vector<'a, ForwardsUOffset<Table<'a>>>,
    },
}

fn slice_vector<'a, T>(table: &Table<'a>, slot: u16) -> SliceVector<'a, T> {
    table
        .get::<ForwardsUOffset<SliceVector<'a, T>>>(slot)
        .unwrap_or_else(Vector::empty)
}

impl<'a> PinSlices<'a> {
    pub(crate) fn from_table(table: &Table<'a>, slot: u16, value_type: u16) -> Self {
        match ValType::from_u16(value_type) {
            Some(ValType::Bool) => PinSlices::Bool(slice_vector(table, slot)),
            Some(ValType::Byte) => PinSlices::Byte(slice_vector(table, slot)),
            Some(ValType::Int) => PinSlices::Short(slice_vector(table, slot)),
            Some(ValType::Real) => PinSlices::Float(slice_vector(table, slot)),
            None => PinSlices::Untyped {
                value_type,
                tables: table
                    .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Table<'a>>>>>(slot)
                    .unwrap_or_else(Vector::empty),
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PinSlices::Bool(v) => v.len(),
            PinSlices::Byte(v) => v.len(),
            PinSlices::Short(v) => v.len(),
            PinSlices::Float(v) => v.len(),
            PinSlices::Untyped { tables, .. } => tables.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the slices out. Fails for an unknown value type.
    pub fn to_owned(&self) -> Result<Slices> {
        Ok(match self {
            PinSlices::Bool(v) => Slices::Bool(v.iter().map(|s| s.to_owned()).collect()),
            PinSlices::Byte(v) => Slices::Byte(v.iter().map(|s| s.to_owned()).collect()),
            PinSlices::Short(v) => Slices::Short(v.iter().map(|s| s.to_owned()).collect()),
            PinSlices::Float(v) => Slices::Float(v.iter().map(|s| s.to_owned()).collect()),
            PinSlices::Untyped { value_type, .. } => {
                return Err(Error::BadEncode(format!(
                    "Pin slices have unknown value type {}",
                    value_type
                )))
            }
        })
    }
}
