//! Raft RPC messages.

use serde::{Deserialize, Serialize};

use crate::{
    builder::{Builder, Offset},
    error::Result,
    schema::{Entity, Field, FieldDef, RefField, ScalarKind, TableSchema, WireType},
    table::{root, ForwardsUOffset, Table},
};

const NODE_SCHEMA: TableSchema = TableSchema::new("Node", &[]);

/// A cluster member descriptor. Its layout is owned by the cluster configuration schema, so
/// here it's only ever an opaque table.
pub enum Node {}

impl Entity for Node {
    const SCHEMA: &'static TableSchema = &NODE_SCHEMA;
    type View<'a> = Table<'a>;
}

const VOTE_REQUEST_SCHEMA: TableSchema = TableSchema::new(
    "VoteRequestFB",
    &[
        FieldDef::optional("Term", 0, WireType::Scalar(ScalarKind::UInt)),
        FieldDef::optional("Candidate", 1, WireType::Table(&NODE_SCHEMA)),
        FieldDef::optional("LastLogIndex", 2, WireType::Scalar(ScalarKind::UInt)),
        FieldDef::optional("LastLogTerm", 3, WireType::Scalar(ScalarKind::UInt)),
    ],
);

/// A candidate's request for a vote.
///
/// No field is required: a request with every field absent is a valid bootstrap-state request
/// with term 0 and no candidate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub term: u32,
    pub last_log_index: u32,
    pub last_log_term: u32,
}

impl Entity for VoteRequest {
    const SCHEMA: &'static TableSchema = &VOTE_REQUEST_SCHEMA;
    type View<'a> = VoteRequestRef<'a>;
}

impl VoteRequest {
    pub const TERM: Field<u32> = Field::new("Term", 0, 0);
    pub const CANDIDATE: RefField<Node> = RefField::new("Candidate", 1);
    pub const LAST_LOG_INDEX: Field<u32> = Field::new("LastLogIndex", 2, 0);
    pub const LAST_LOG_TERM: Field<u32> = Field::new("LastLogTerm", 3, 0);

    /// Write the request. The candidate's node table, if any, must already be in the builder.
    pub fn create(
        &self,
        builder: &mut Builder,
        candidate: Option<Offset<Node>>,
    ) -> Result<Offset<Self>> {
        let mut table = builder.start_table::<Self>();
        table.add(&Self::LAST_LOG_TERM, self.last_log_term)?;
        table.add(&Self::LAST_LOG_INDEX, self.last_log_index)?;
        table.add_opt_offset(&Self::CANDIDATE, candidate)?;
        table.add(&Self::TERM, self.term)?;
        table.finish()
    }

    /// Encode a request without a candidate as a finished buffer.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut builder = Builder::new();
        let root = self.create(&mut builder, None)?;
        builder.finish(root)
    }

    /// Decode the scalar fields of a request. The candidate's node table, if any, isn't carried
    /// over: it has no owned form here, so read it through [`VoteRequestRef::candidate`] instead.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Ok(root::<Self>(buf)?.to_owned())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VoteRequestRef<'a> {
    table: Table<'a>,
}

table_view!(VoteRequestRef);

impl<'a> VoteRequestRef<'a> {
    pub fn term(&self) -> u32 {
        self.table.scalar(&VoteRequest::TERM)
    }

    /// The candidate's node table, if the sender included one.
    pub fn candidate(&self) -> Option<Table<'a>> {
        self.table
            .get::<ForwardsUOffset<Table<'a>>>(VoteRequest::CANDIDATE.slot)
    }

    pub fn last_log_index(&self) -> u32 {
        self.table.scalar(&VoteRequest::LAST_LOG_INDEX)
    }

    pub fn last_log_term(&self) -> u32 {
        self.table.scalar(&VoteRequest::LAST_LOG_TERM)
    }

    pub fn to_owned(&self) -> VoteRequest {
        VoteRequest {
            term: self.term(),
            last_log_index: self.last_log_index(),
            last_log_term: self.last_log_term(),
        }
    }
}
