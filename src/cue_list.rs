//! Named, ordered lists of cues.

use crate::{
    builder::{Builder, Offset},
    error::Result,
    schema::{ElemType, Entity, FieldDef, RefField, TableSchema, WireType},
    table::{ForwardsUOffset, Table, Vector},
};

const CUE_SCHEMA: TableSchema = TableSchema::new("CueFB", &[]);

/// A single cue. Its layout belongs to the cue schema, so here it's only ever an opaque table.
pub enum Cue {}

impl Entity for Cue {
    const SCHEMA: &'static TableSchema = &CUE_SCHEMA;
    type View<'a> = Table<'a>;
}

const CUE_LIST_SCHEMA: TableSchema = TableSchema::new(
    "CueListFB",
    &[
        FieldDef::optional("Id", 0, WireType::String),
        FieldDef::optional("Name", 1, WireType::String),
        FieldDef::optional("Cues", 2, WireType::Vector(ElemType::Table(&CUE_SCHEMA))),
    ],
);

/// Marker for `CueListFB` tables. Unlike pins, neither the id nor the name is required.
pub enum CueList {}

impl Entity for CueList {
    const SCHEMA: &'static TableSchema = &CUE_LIST_SCHEMA;
    type View<'a> = CueListRef<'a>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CueListArgs {
    pub id: Option<Offset<str>>,
    pub name: Option<Offset<str>>,
    pub cues: Option<Offset<[Offset<Cue>]>>,
}

impl CueList {
    pub const ID: RefField<str> = RefField::new("Id", 0);
    pub const NAME: RefField<str> = RefField::new("Name", 1);
    pub const CUES: RefField<[Offset<Cue>]> = RefField::new("Cues", 2);

    pub fn create(builder: &mut Builder, args: &CueListArgs) -> Result<Offset<CueList>> {
        let mut table = builder.start_table::<CueList>();
        table.add_opt_offset(&Self::CUES, args.cues)?;
        table.add_opt_offset(&Self::NAME, args.name)?;
        table.add_opt_offset(&Self::ID, args.id)?;
        table.finish()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CueListRef<'a> {
    table: Table<'a>,
}

table_view!(CueListRef);

impl<'a> CueListRef<'a> {
    pub fn id(&self) -> Option<&'a str> {
        self.table.get::<ForwardsUOffset<&'a str>>(CueList::ID.slot)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.table.get::<ForwardsUOffset<&'a str>>(CueList::NAME.slot)
    }

    /// The cue tables, in list order. Empty when absent.
    pub fn cues(&self) -> Vector<'a, ForwardsUOffset<Table<'a>>> {
        self.table
            .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Table<'a>>>>>(CueList::CUES.slot)
            .unwrap_or_else(Vector::empty)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::table::root;

    fn cue(builder: &mut Builder, number: u32) -> Offset<Cue> {
        let mut table = builder.start_table::<Cue>();
        table.add_raw(0, number, 0).unwrap();
        table.finish().unwrap()
    }

    #[test]
    fn cues_keep_their_order() {
        let mut builder = Builder::new();
        let cues: Vec<_> = (1..=5).map(|n| cue(&mut builder, n * 10)).collect();
        let cues = builder.create_vector_of_offsets(&cues).unwrap();
        let name = builder.create_string("Act 1").unwrap();
        let args = CueListArgs {
            name: Some(name),
            cues: Some(cues),
            ..CueListArgs::default()
        };
        let root_off = CueList::create(&mut builder, &args).unwrap();
        let buf = builder.finish(root_off).unwrap();

        let list = root::<CueList>(&buf).unwrap();
        assert_eq!(list.id(), None);
        assert_eq!(list.name(), Some("Act 1"));
        let numbers: Vec<u32> = list.cues().iter().map(|c| c.scalar_at(0, 0)).collect();
        assert_eq!(numbers, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn everything_optional() {
        let mut builder = Builder::new();
        let root_off = CueList::create(&mut builder, &CueListArgs::default()).unwrap();
        let buf = builder.finish(root_off).unwrap();
        let list = root::<CueList>(&buf).unwrap();
        assert_eq!(list.id(), None);
        assert_eq!(list.name(), None);
        assert!(list.cues().is_empty());
    }

    #[test]
    fn cue_contents_are_not_trusted() {
        let mut builder = Builder::new();
        // Offsets into nowhere, which the opaque cue schema lets through.
        let cues: Vec<_> = [0x7fff_fff0u32, 4, u32::MAX]
            .iter()
            .map(|&n| cue(&mut builder, n))
            .collect();
        let cues = builder.create_vector_of_offsets(&cues).unwrap();
        let args = CueListArgs {
            cues: Some(cues),
            ..CueListArgs::default()
        };
        let root_off = CueList::create(&mut builder, &args).unwrap();
        let buf = builder.finish(root_off).unwrap();

        let list = root::<CueList>(&buf).unwrap();
        assert_eq!(list.cues().len(), 3);
        for cue in list.cues() {
            let _ = cue.get::<ForwardsUOffset<&str>>(0);
            let _ = cue.get::<ForwardsUOffset<Vector<ForwardsUOffset<Table>>>>(0);
            if let Some(inner) = cue.get::<ForwardsUOffset<Table>>(0) {
                let _ = inner.scalar_at::<u64>(1, 0);
            }
        }
        let first = list.cues().get(0).unwrap();
        assert_eq!(first.get::<ForwardsUOffset<&str>>(0), Some(""));
    }
}
