//! Pins (I/O boxes): named, typed, array-valued endpoints.
//!
//! A pin is written as one `IOBox` table that owns its strings, its tag and property vectors,
//! and a vector of slice tables holding its current value. The slice variant isn't recorded in
//! the slices themselves; the pin's `ValueType` field selects it.

use serde::{Deserialize, Serialize};

use crate::{
    builder::{Builder, Offset},
    error::{Error, Result},
    schema::{ElemType, Entity, Field, FieldDef, RefField, ScalarKind, TableSchema, WireType},
    slice::{AnySlice, PinSlices, SliceVectorOffset, Slices, SLICE_VARIANTS},
    table::{root_with_opts, ForwardsUOffset, Table, Vector},
    verifier::VerifierOptions,
};

wire_enum! {
    /// What kind of value a pin carries.
    pub enum PinType (default = Value, unknown = Value) {
        Value = 0,
        String = 1,
        Color = 2,
        Enum = 3,
        Node = 4,
    }
}

wire_enum! {
    /// How a value pin reacts to input.
    pub enum Behavior (default = Slider, unknown = Slider) {
        Slider = 0,
        Toggle = 1,
        Bang = 2,
    }
}

wire_enum! {
    /// Value type of a pin's slices. Selects the slice variant: `Real` pins hold float slices,
    /// `Int` pins short slices, `Bool` pins bool slices and `Byte` pins byte slices.
    pub enum ValType (default = Real, unknown = Real) {
        Real = 0,
        Int = 1,
        Bool = 2,
        Byte = 3,
    }
}

wire_enum! {
    /// How a string pin's text is to be interpreted.
    #[allow(clippy::upper_case_acronyms)]
    pub enum StringType (default = Simple, unknown = Simple) {
        Simple = 0,
        MultiLine = 1,
        FileName = 2,
        Directory = 3,
        Url = 4,
        IP = 5,
    }
}

const PIN_SCHEMA: TableSchema = TableSchema::new(
    "IOBox",
    &[
        FieldDef::required("Id", 0, WireType::String),
        FieldDef::required("Name", 1, WireType::String),
        FieldDef::optional("Type", 2, WireType::Scalar(ScalarKind::Short)),
        FieldDef::optional("Patch", 3, WireType::String),
        FieldDef::optional("Tag", 4, WireType::Vector(ElemType::String)),
        FieldDef::optional("Behavior", 5, WireType::Scalar(ScalarKind::Short)),
        FieldDef::optional("VecSize", 6, WireType::Scalar(ScalarKind::Short)),
        FieldDef::optional("Min", 7, WireType::Scalar(ScalarKind::Int)),
        FieldDef::optional("Max", 8, WireType::Scalar(ScalarKind::Int)),
        FieldDef::optional("Unit", 9, WireType::String),
        FieldDef::optional("Precision", 10, WireType::Scalar(ScalarKind::Int)),
        FieldDef::optional("ValueType", 11, WireType::Scalar(ScalarKind::Short)),
        FieldDef::optional("StringType", 12, WireType::Scalar(ScalarKind::Short)),
        FieldDef::optional("FileMask", 13, WireType::String),
        FieldDef::optional("MaxChars", 14, WireType::Scalar(ScalarKind::UInt)),
        FieldDef::optional("Properties", 15, WireType::Vector(ElemType::String)),
        FieldDef::optional(
            "Slices",
            16,
            WireType::UnionVector {
                tag: 11,
                variants: SLICE_VARIANTS,
            },
        ),
    ],
);

/// Offsets and values for one `IOBox` table. Every string, vector and slice must already be
/// written into the builder.
#[derive(Clone, Copy, Debug, Default)]
pub struct PinArgs {
    pub id: Option<Offset<str>>,
    pub name: Option<Offset<str>>,
    pub kind: PinType,
    pub patch: Option<Offset<str>>,
    pub tags: Option<Offset<[Offset<str>]>>,
    pub behavior: Behavior,
    pub vec_size: i16,
    pub min: i32,
    pub max: i32,
    pub unit: Option<Offset<str>>,
    pub precision: i32,
    pub value_type: ValType,
    pub string_type: StringType,
    pub file_mask: Option<Offset<str>>,
    pub max_chars: u32,
    pub properties: Option<Offset<[Offset<str>]>>,
    pub slices: Option<SliceVectorOffset>,
}

/// An owned pin.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub id: String,
    pub name: String,
    pub kind: PinType,
    pub patch: Option<String>,
    pub tags: Vec<String>,
    pub behavior: Behavior,
    pub vec_size: i16,
    pub min: i32,
    pub max: i32,
    pub unit: Option<String>,
    pub precision: i32,
    pub string_type: StringType,
    pub file_mask: Option<String>,
    pub max_chars: u32,
    pub properties: Vec<String>,
    /// The current value. Its variant is the pin's value type.
    pub slices: Slices,
}

impl Entity for Pin {
    const SCHEMA: &'static TableSchema = &PIN_SCHEMA;
    type View<'a> = PinRef<'a>;
}

impl Pin {
    pub const ID: RefField<str> = RefField::new("Id", 0);
    pub const NAME: RefField<str> = RefField::new("Name", 1);
    pub const TYPE: Field<PinType> = Field::new("Type", 2, PinType::Value);
    pub const PATCH: RefField<str> = RefField::new("Patch", 3);
    pub const TAG: RefField<[Offset<str>]> = RefField::new("Tag", 4);
    pub const BEHAVIOR: Field<Behavior> = Field::new("Behavior", 5, Behavior::Slider);
    pub const VEC_SIZE: Field<i16> = Field::new("VecSize", 6, 0);
    pub const MIN: Field<i32> = Field::new("Min", 7, 0);
    pub const MAX: Field<i32> = Field::new("Max", 8, 0);
    pub const UNIT: RefField<str> = RefField::new("Unit", 9);
    pub const PRECISION: Field<i32> = Field::new("Precision", 10, 0);
    pub const VALUE_TYPE: Field<ValType> = Field::new("ValueType", 11, ValType::Real);
    pub const STRING_TYPE: Field<StringType> = Field::new("StringType", 12, StringType::Simple);
    pub const FILE_MASK: RefField<str> = RefField::new("FileMask", 13);
    pub const MAX_CHARS: Field<u32> = Field::new("MaxChars", 14, 0);
    pub const PROPERTIES: RefField<[Offset<str>]> = RefField::new("Properties", 15);
    pub const SLICES: RefField<[Offset<AnySlice>]> = RefField::new("Slices", 16);

    /// Write an `IOBox` table from already written parts.
    ///
    /// Fails if `Id` or `Name` is missing, or if the slice vector's variant doesn't match
    /// `value_type`.
    pub fn create(builder: &mut Builder, args: &PinArgs) -> Result<Offset<Pin>> {
        if let Some(slices) = args.slices {
            if slices.value_type != args.value_type {
                return Err(Error::SliceTypeMismatch {
                    declared: args.value_type,
                    actual: slices.value_type,
                });
            }
        }
        let mut table = builder.start_table::<Pin>();
        table.add_opt_offset(&Self::SLICES, args.slices.map(|s| s.offset))?;
        table.add_opt_offset(&Self::PROPERTIES, args.properties)?;
        table.add(&Self::MAX_CHARS, args.max_chars)?;
        table.add_opt_offset(&Self::FILE_MASK, args.file_mask)?;
        table.add(&Self::PRECISION, args.precision)?;
        table.add_opt_offset(&Self::UNIT, args.unit)?;
        table.add(&Self::MAX, args.max)?;
        table.add(&Self::MIN, args.min)?;
        table.add_opt_offset(&Self::TAG, args.tags)?;
        table.add_opt_offset(&Self::PATCH, args.patch)?;
        table.add_opt_offset(&Self::NAME, args.name)?;
        table.add_opt_offset(&Self::ID, args.id)?;
        table.add(&Self::STRING_TYPE, args.string_type)?;
        table.add(&Self::VALUE_TYPE, args.value_type)?;
        table.add(&Self::VEC_SIZE, args.vec_size)?;
        table.add(&Self::BEHAVIOR, args.behavior)?;
        table.add(&Self::TYPE, args.kind)?;
        table.finish()
    }

    /// Write this pin and everything it owns. Empty vectors are left out.
    pub fn write(&self, builder: &mut Builder) -> Result<Offset<Pin>> {
        let slices = if self.slices.is_empty() {
            None
        } else {
            Some(self.slices.create(builder)?)
        };
        let properties = create_strings(builder, &self.properties)?;
        let file_mask = create_opt_string(builder, self.file_mask.as_deref())?;
        let unit = create_opt_string(builder, self.unit.as_deref())?;
        let tags = create_strings(builder, &self.tags)?;
        let patch = create_opt_string(builder, self.patch.as_deref())?;
        let name = builder.create_string(&self.name)?;
        let id = builder.create_string(&self.id)?;
        let args = PinArgs {
            id: Some(id),
            name: Some(name),
            kind: self.kind,
            patch,
            tags,
            behavior: self.behavior,
            vec_size: self.vec_size,
            min: self.min,
            max: self.max,
            unit,
            precision: self.precision,
            value_type: self.slices.value_type(),
            string_type: self.string_type,
            file_mask,
            max_chars: self.max_chars,
            properties,
            slices,
        };
        Pin::create(builder, &args)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut builder = Builder::new();
        let root = self.write(&mut builder)?;
        builder.finish(root)
    }

    /// Decode a pin, requiring `Id` and `Name` to be present.
    pub fn decode(buf: &[u8]) -> Result<Pin> {
        let opts = VerifierOptions {
            check_required: true,
            ..VerifierOptions::default()
        };
        root_with_opts::<Pin>(buf, &opts)?.to_owned()
    }
}

fn create_opt_string(builder: &mut Builder, s: Option<&str>) -> Result<Option<Offset<str>>> {
    s.map(|s| builder.create_string(s)).transpose()
}

fn create_strings(
    builder: &mut Builder,
    items: &[String],
) -> Result<Option<Offset<[Offset<str>]>>> {
    if items.is_empty() {
        return Ok(None);
    }
    builder.create_vector_of_strings(items).map(Some)
}

/// Zero-copy view of an `IOBox` table.
#[derive(Clone, Copy, Debug)]
pub struct PinRef<'a> {
    table: Table<'a>,
}

table_view!(PinRef);

impl<'a> PinRef<'a> {
    fn string(&self, field: &RefField<str>) -> Option<&'a str> {
        self.table.get::<ForwardsUOffset<&'a str>>(field.slot)
    }

    fn strings(&self, field: &RefField<[Offset<str>]>) -> Vector<'a, ForwardsUOffset<&'a str>> {
        self.table
            .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<&'a str>>>>(field.slot)
            .unwrap_or_else(Vector::empty)
    }

    /// The pin's id. Only `None` for a buffer that wasn't checked for required fields.
    pub fn id(&self) -> Option<&'a str> {
        self.string(&Pin::ID)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.string(&Pin::NAME)
    }

    pub fn kind(&self) -> PinType {
        self.table.scalar(&Pin::TYPE)
    }

    pub fn patch(&self) -> Option<&'a str> {
        self.string(&Pin::PATCH)
    }

    pub fn tags(&self) -> Vector<'a, ForwardsUOffset<&'a str>> {
        self.strings(&Pin::TAG)
    }

    pub fn behavior(&self) -> Behavior {
        self.table.scalar(&Pin::BEHAVIOR)
    }

    pub fn vec_size(&self) -> i16 {
        self.table.scalar(&Pin::VEC_SIZE)
    }

    pub fn min(&self) -> i32 {
        self.table.scalar(&Pin::MIN)
    }

    pub fn max(&self) -> i32 {
        self.table.scalar(&Pin::MAX)
    }

    pub fn unit(&self) -> Option<&'a str> {
        self.string(&Pin::UNIT)
    }

    pub fn precision(&self) -> i32 {
        self.table.scalar(&Pin::PRECISION)
    }

    /// The declared value type. Unknown ordinals read as `Real`; [`slices`][Self::slices] sees
    /// the raw ordinal.
    pub fn value_type(&self) -> ValType {
        self.table.scalar(&Pin::VALUE_TYPE)
    }

    pub fn string_type(&self) -> StringType {
        self.table.scalar(&Pin::STRING_TYPE)
    }

    pub fn file_mask(&self) -> Option<&'a str> {
        self.string(&Pin::FILE_MASK)
    }

    pub fn max_chars(&self) -> u32 {
        self.table.scalar(&Pin::MAX_CHARS)
    }

    pub fn properties(&self) -> Vector<'a, ForwardsUOffset<&'a str>> {
        self.strings(&Pin::PROPERTIES)
    }

    pub fn slices(&self) -> PinSlices<'a> {
        let raw = self
            .table
            .scalar_at::<u16>(Pin::VALUE_TYPE.slot, Pin::VALUE_TYPE.default.to_u16());
        PinSlices::from_table(&self.table, Pin::SLICES.slot, raw)
    }

    /// Copy the pin out. Fails if a required field is absent or the value type is unknown.
    pub fn to_owned(&self) -> Result<Pin> {
        let missing = |field: &RefField<str>| Error::MissingRequiredField {
            table: PIN_SCHEMA.name,
            field: field.name,
            slot: field.slot,
        };
        Ok(Pin {
            id: self.id().ok_or_else(|| missing(&Pin::ID))?.to_owned(),
            name: self.name().ok_or_else(|| missing(&Pin::NAME))?.to_owned(),
            kind: self.kind(),
            patch: self.patch().map(str::to_owned),
            tags: self.tags().iter().map(str::to_owned).collect(),
            behavior: self.behavior(),
            vec_size: self.vec_size(),
            min: self.min(),
            max: self.max(),
            unit: self.unit().map(str::to_owned),
            precision: self.precision(),
            string_type: self.string_type(),
            file_mask: self.file_mask().map(str::to_owned),
            max_chars: self.max_chars(),
            properties: self.properties().iter().map(str::to_owned).collect(),
            slices: self.slices().to_owned()?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::slice::Slice;
    use crate::table::root;
    use rand::{distributions::Alphanumeric, Rng};

    enum Loose {}

    const LOOSE_SCHEMA: TableSchema = TableSchema::new("Loose", &[]);

    impl Entity for Loose {
        const SCHEMA: &'static TableSchema = &LOOSE_SCHEMA;
        type View<'a> = Table<'a>;
    }

    fn rand_string<R: Rng>(rng: &mut R) -> String {
        let len = rng.gen_range(0..12);
        rng.sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    fn rand_strings<R: Rng>(rng: &mut R) -> Vec<String> {
        let len = rng.gen_range(0..5);
        (0..len).map(|_| rand_string(rng)).collect()
    }

    fn rand_opt_string<R: Rng>(rng: &mut R) -> Option<String> {
        if rng.gen() {
            Some(rand_string(rng))
        } else {
            None
        }
    }

    fn rand_slices<R: Rng>(rng: &mut R) -> Slices {
        let len = rng.gen_range(0..30usize);
        // 7 is coprime with 256, so narrow indices never repeat.
        let narrow = |i: usize| (i * 7 % 256) as u8;
        match rng.gen_range(0..4) {
            0 => Slices::Bool((0..len).map(|i| Slice::new(narrow(i), rng.gen())).collect()),
            1 => Slices::Byte((0..len).map(|i| Slice::new(narrow(i), rng.gen())).collect()),
            2 => Slices::Short((0..len).map(|i| Slice::new(narrow(i), rng.gen())).collect()),
            _ => Slices::Float(
                (0..len)
                    .map(|i| Slice::new(i as u32 * 1000 + rng.gen_range(0..1000), rng.gen()))
                    .collect(),
            ),
        }
    }

    fn rand_pin<R: Rng>(rng: &mut R) -> Pin {
        Pin {
            id: rand_string(rng),
            name: rand_string(rng),
            kind: PinType::ALL[rng.gen_range(0..PinType::ALL.len())],
            patch: rand_opt_string(rng),
            tags: rand_strings(rng),
            behavior: Behavior::ALL[rng.gen_range(0..Behavior::ALL.len())],
            vec_size: rng.gen(),
            min: rng.gen(),
            max: rng.gen(),
            unit: rand_opt_string(rng),
            precision: rng.gen_range(-2..8),
            string_type: StringType::ALL[rng.gen_range(0..StringType::ALL.len())],
            file_mask: rand_opt_string(rng),
            max_chars: rng.gen(),
            properties: rand_strings(rng),
            slices: rand_slices(rng),
        }
    }

    fn sample() -> Pin {
        Pin {
            id: "pin-1".into(),
            name: "Brightness".into(),
            tags: vec!["light".into(), "dmx".into(), "stage-left".into()],
            properties: vec!["a=1".into(), "b=2".into()],
            unit: Some("%".into()),
            max: 100,
            slices: Slices::Float(vec![Slice::new(0, 0.25), Slice::new(7, 1.0)]),
            ..Pin::default()
        }
    }

    #[test]
    fn random_round_trip() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let pin = rand_pin(&mut rng);
            let buf = pin.encode().unwrap();
            assert_eq!(Pin::decode(&buf).unwrap(), pin);
        }
    }

    #[test]
    fn view_accessors() {
        let pin = sample();
        let buf = pin.encode().unwrap();
        let view = root::<Pin>(&buf).unwrap();
        assert_eq!(view.id(), Some("pin-1"));
        assert_eq!(view.name(), Some("Brightness"));
        assert_eq!(view.kind(), PinType::Value);
        assert_eq!(view.patch(), None);
        assert_eq!(view.unit(), Some("%"));
        assert_eq!(view.max(), 100);
        assert_eq!(view.min(), 0);
        assert_eq!(view.value_type(), ValType::Real);
        assert_eq!(view.properties().len(), 2);
        match view.slices() {
            PinSlices::Float(slices) => {
                let got: Vec<_> = slices.iter().map(|s| (s.index(), s.value())).collect();
                assert_eq!(got, vec![(0, 0.25), (7, 1.0)]);
            }
            other => panic!("wrong slice variant: {:?}", other),
        }
        // Defaults and empty values are never written.
        assert!(!view.table().is_present(Pin::MIN.slot));
        assert!(!view.table().is_present(Pin::PATCH.slot));
        assert!(!view.table().is_present(Pin::VALUE_TYPE.slot));
    }

    #[test]
    fn vector_order() {
        let pin = sample();
        let buf = pin.encode().unwrap();
        let view = root::<Pin>(&buf).unwrap();
        let tags: Vec<_> = view.tags().iter().collect();
        assert_eq!(tags, vec!["light", "dmx", "stage-left"]);
        let props: Vec<_> = view.properties().into_iter().collect();
        assert_eq!(props, vec!["a=1", "b=2"]);
    }

    #[test]
    fn slice_dispatch() {
        let pin = Pin {
            id: "p".into(),
            name: "toggles".into(),
            slices: Slices::Bool(vec![Slice::new(3, true), Slice::new(1, false)]),
            ..Pin::default()
        };
        let buf = pin.encode().unwrap();
        let view = root::<Pin>(&buf).unwrap();
        assert_eq!(view.value_type(), ValType::Bool);
        match view.slices() {
            PinSlices::Bool(slices) => {
                let got: Vec<_> = slices.iter().map(|s| s.to_owned()).collect();
                assert_eq!(got, vec![Slice::new(3, true), Slice::new(1, false)]);
            }
            other => panic!("wrong slice variant: {:?}", other),
        }

        // An empty value keeps its type.
        let pin = Pin {
            slices: Slices::Short(vec![]),
            ..pin
        };
        let buf = pin.encode().unwrap();
        let view = root::<Pin>(&buf).unwrap();
        assert!(!view.table().is_present(Pin::SLICES.slot));
        assert!(matches!(view.slices(), PinSlices::Short(v) if v.is_empty()));
        assert_eq!(Pin::decode(&buf).unwrap(), pin);
    }

    #[test]
    fn required_fields() {
        let mut builder = Builder::new();
        let name = builder.create_string("n").unwrap();
        let args = PinArgs {
            name: Some(name),
            ..PinArgs::default()
        };
        assert_eq!(
            Pin::create(&mut builder, &args).unwrap_err(),
            Error::MissingRequiredField {
                table: "IOBox",
                field: "Id",
                slot: 0
            }
        );

        let mut builder = Builder::new();
        let id = builder.create_string("i").unwrap();
        let args = PinArgs {
            id: Some(id),
            ..PinArgs::default()
        };
        assert_eq!(
            Pin::create(&mut builder, &args).unwrap_err(),
            Error::MissingRequiredField {
                table: "IOBox",
                field: "Name",
                slot: 1
            }
        );

        let mut builder = Builder::new();
        let name = builder.create_string("").unwrap();
        let id = builder.create_string("").unwrap();
        let args = PinArgs {
            id: Some(id),
            name: Some(name),
            ..PinArgs::default()
        };
        let root_off = Pin::create(&mut builder, &args).unwrap();
        let buf = builder.finish(root_off).unwrap();
        let pin = Pin::decode(&buf).unwrap();
        assert_eq!(pin.id, "");
        assert_eq!(pin.name, "");
    }

    #[test]
    fn slice_type_mismatch() {
        let mut builder = Builder::new();
        let slices = Slices::Bool(vec![Slice::new(0, true)])
            .create(&mut builder)
            .unwrap();
        let name = builder.create_string("n").unwrap();
        let id = builder.create_string("i").unwrap();
        let args = PinArgs {
            id: Some(id),
            name: Some(name),
            value_type: ValType::Real,
            slices: Some(slices),
            ..PinArgs::default()
        };
        assert_eq!(
            Pin::create(&mut builder, &args).unwrap_err(),
            Error::SliceTypeMismatch {
                declared: ValType::Real,
                actual: ValType::Bool
            }
        );
    }

    #[test]
    fn lenient_view_strict_decode() {
        let mut builder = Builder::new();
        let name = builder.create_string("nameless").unwrap();
        let mut table = builder.start_table::<Loose>();
        table.add_raw_offset(Pin::NAME.slot, name).unwrap();
        let root_off = table.finish().unwrap();
        let buf = builder.finish(root_off).unwrap();

        let view = root::<Pin>(&buf).unwrap();
        assert_eq!(view.id(), None);
        assert_eq!(view.name(), Some("nameless"));
        let missing = Error::MissingRequiredField {
            table: "IOBox",
            field: "Id",
            slot: 0,
        };
        assert_eq!(view.to_owned().unwrap_err(), missing);
        assert_eq!(Pin::decode(&buf).unwrap_err(), missing);
    }

    #[test]
    fn unknown_ordinals() {
        let mut builder = Builder::new();
        let name = builder.create_string("n").unwrap();
        let id = builder.create_string("i").unwrap();
        let mut table = builder.start_table::<Loose>();
        table.add_raw_offset(Pin::ID.slot, id).unwrap();
        table.add_raw_offset(Pin::NAME.slot, name).unwrap();
        table.add_raw::<u16>(Pin::TYPE.slot, 77, 0).unwrap();
        table.add_raw::<u16>(Pin::VALUE_TYPE.slot, 99, 0).unwrap();
        let root_off = table.finish().unwrap();
        let buf = builder.finish(root_off).unwrap();

        let view = root::<Pin>(&buf).unwrap();
        assert_eq!(view.kind(), PinType::Value);
        assert_eq!(view.value_type(), ValType::Real);
        assert!(matches!(
            view.slices(),
            PinSlices::Untyped { value_type: 99, .. }
        ));
        assert!(matches!(Pin::decode(&buf), Err(Error::BadEncode(_))));
    }

    #[test]
    fn mislabelled_slices_never_panic() {
        let pin = Pin {
            id: "p".into(),
            name: "n".into(),
            slices: Slices::Bool((0..8).map(|i| Slice::new(i, i % 2 == 0)).collect()),
            ..Pin::default()
        };
        let mut buf = pin.encode().unwrap();
        let view = root::<Pin>(&buf).unwrap();
        let at = view.table().field_loc(Pin::VALUE_TYPE.slot).unwrap();
        // Claim the bool slices are floats.
        buf[at..at + 2].copy_from_slice(&ValType::Real.to_u16().to_le_bytes());
        if let Ok(view) = root::<Pin>(&buf) {
            if let PinSlices::Float(slices) = view.slices() {
                for slice in slices.iter() {
                    let _ = (slice.index(), slice.value());
                }
            }
        }
    }

    #[test]
    fn json() {
        let pin = sample();
        let json = serde_json::to_value(&pin).unwrap();
        assert_eq!(json["name"], "Brightness");
        assert_eq!(json["kind"], "Value");
        assert_eq!(serde_json::from_value::<Pin>(json).unwrap(), pin);
    }
}
