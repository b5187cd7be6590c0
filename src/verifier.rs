//! Structural verification of received buffers.
//!
//! Every offset, vtable and field reachable from the root through the schema is bounds-checked
//! before a view is handed out. After verification, reading through a view can't go out of
//! bounds, loop forever, or yield invalid UTF-8.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::{
    builder::{VOffset, SIZE_UOFFSET},
    error::{Error, Result},
    schema::{field_index_to_voffset, ElemType, FieldDef, TableSchema, WireType},
    table::read_uoffset,
    MAX_BUFFER_SIZE, MAX_DEPTH,
};

/// Limits applied while verifying a buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierOptions {
    /// Maximum table nesting depth, counting the root as 1.
    pub max_depth: usize,
    /// Maximum number of tables visited in one buffer.
    pub max_tables: usize,
    /// Reject tables that lack a required field. Off by default: absent required fields read as
    /// their default.
    pub check_required: bool,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_tables: 1_000_000,
            check_required: false,
        }
    }
}

const UNTYPED: TableSchema = TableSchema::new("Untyped", &[]);

/// Position of a slot's field relative to the table start, 0 when absent.
fn slot_voffset(vtable: &[u8], slot: VOffset) -> usize {
    let entry = field_index_to_voffset(slot) as usize;
    if entry + 2 > vtable.len() {
        return 0;
    }
    LittleEndian::read_u16(&vtable[entry..entry + 2]) as usize
}

pub struct Verifier<'a, 'o> {
    buf: &'a [u8],
    opts: &'o VerifierOptions,
    depth: usize,
    tables: usize,
}

impl<'a, 'o> Verifier<'a, 'o> {
    pub fn new(buf: &'a [u8], opts: &'o VerifierOptions) -> Self {
        Self {
            buf,
            opts,
            depth: 0,
            tables: 0,
        }
    }

    /// Verify the whole buffer as rooted at a `schema` table. Returns the root table's position.
    pub fn verify_root(mut self, schema: &TableSchema) -> Result<usize> {
        let result = self.root(schema);
        if let Err(ref e) = result {
            tracing::debug!(
                root = schema.name,
                len = self.buf.len(),
                error = %e,
                "buffer failed verification"
            );
        }
        result
    }

    fn root(&mut self, schema: &TableSchema) -> Result<usize> {
        if self.buf.len() > MAX_BUFFER_SIZE {
            return Err(Error::LengthTooLong {
                max: MAX_BUFFER_SIZE,
                actual: self.buf.len(),
            });
        }
        let loc = self.deref_uoffset(0, "root offset")?;
        self.verify_table(loc, schema)?;
        Ok(loc)
    }

    fn check_range(&self, loc: usize, len: usize, step: &'static str) -> Result<()> {
        match loc.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(()),
            end => Err(Error::LengthTooShort {
                step,
                actual: self.buf.len(),
                expected: end.unwrap_or(usize::MAX),
            }),
        }
    }

    /// Read the forward offset stored at `loc` and return the position it points to.
    fn deref_uoffset(&self, loc: usize, step: &'static str) -> Result<usize> {
        self.check_range(loc, SIZE_UOFFSET, step)?;
        let off = read_uoffset(self.buf, loc);
        if off == 0 {
            return Err(Error::BadEncode(format!("Zero offset at {} ({})", loc, step)));
        }
        match loc.checked_add(off) {
            Some(target) if target < self.buf.len() => Ok(target),
            target => Err(Error::LengthTooShort {
                step,
                actual: self.buf.len(),
                expected: target.map_or(usize::MAX, |t| t + 1),
            }),
        }
    }

    fn verify_table(&mut self, loc: usize, schema: &TableSchema) -> Result<()> {
        self.depth += 1;
        self.tables += 1;
        if self.depth > self.opts.max_depth {
            return Err(Error::ParseLimit(format!(
                "Depth limit of {} exceeded in {}",
                self.opts.max_depth, schema.name
            )));
        }
        if self.tables > self.opts.max_tables {
            return Err(Error::ParseLimit(format!(
                "Table limit of {} exceeded",
                self.opts.max_tables
            )));
        }

        self.check_range(loc, 4, "table soffset")?;
        let soffset = LittleEndian::read_i32(&self.buf[loc..loc + 4]);
        let vtable_loc = loc as i64 - soffset as i64;
        if vtable_loc < 0 || vtable_loc as usize + 4 > self.buf.len() {
            return Err(Error::BadEncode(format!(
                "{} table at {} has its vtable outside the buffer",
                schema.name, loc
            )));
        }
        let vtable_loc = vtable_loc as usize;
        let vtable_len = LittleEndian::read_u16(&self.buf[vtable_loc..vtable_loc + 2]) as usize;
        if vtable_len < 4 || vtable_len % 2 != 0 {
            return Err(Error::BadEncode(format!(
                "{} table at {} has a malformed vtable length of {}",
                schema.name, loc, vtable_len
            )));
        }
        self.check_range(vtable_loc, vtable_len, "vtable")?;
        let object_len =
            LittleEndian::read_u16(&self.buf[vtable_loc + 2..vtable_loc + 4]) as usize;
        if object_len < 4 {
            return Err(Error::BadEncode(format!(
                "{} table at {} is shorter than its soffset",
                schema.name, loc
            )));
        }
        self.check_range(loc, object_len, "table")?;

        let buf = self.buf;
        let vtable = &buf[vtable_loc..vtable_loc + vtable_len];
        for entry in vtable[4..].chunks_exact(2) {
            let voffset = LittleEndian::read_u16(entry) as usize;
            if voffset != 0 && (voffset < 4 || voffset >= object_len) {
                return Err(Error::BadEncode(format!(
                    "{} table at {} has a field outside of its {} bytes",
                    schema.name, loc, object_len
                )));
            }
        }

        for field in schema.fields {
            let voffset = slot_voffset(vtable, field.slot);
            if voffset == 0 {
                if field.required && self.opts.check_required {
                    return Err(Error::MissingRequiredField {
                        table: schema.name,
                        field: field.name,
                        slot: field.slot,
                    });
                }
                continue;
            }
            let tag = match field.wire {
                WireType::UnionVector { tag, .. } => self.union_tag(loc, vtable, object_len, tag)?,
                _ => 0,
            };
            self.verify_field(loc, voffset, object_len, field, tag)?;
        }

        self.depth -= 1;
        Ok(())
    }

    /// Read the `u16` that selects a union vector's element schema.
    fn union_tag(
        &self,
        table_loc: usize,
        vtable: &[u8],
        object_len: usize,
        slot: VOffset,
    ) -> Result<u16> {
        let voffset = slot_voffset(vtable, slot);
        if voffset == 0 {
            return Ok(0);
        }
        if voffset + 2 > object_len {
            return Err(Error::BadEncode(format!(
                "Union tag in slot {} runs past the end of its table",
                slot
            )));
        }
        let loc = table_loc + voffset;
        Ok(LittleEndian::read_u16(&self.buf[loc..loc + 2]))
    }

    fn verify_field(
        &mut self,
        table_loc: usize,
        voffset: usize,
        object_len: usize,
        field: &FieldDef,
        tag: u16,
    ) -> Result<()> {
        let loc = table_loc + voffset;
        let inline_size = match field.wire {
            WireType::Scalar(kind) => kind.size(),
            _ => SIZE_UOFFSET,
        };
        if voffset + inline_size > object_len {
            return Err(Error::BadEncode(format!(
                "Field {} runs past the end of its table",
                field.name
            )));
        }
        match field.wire {
            WireType::Scalar(_) => Ok(()),
            WireType::String => {
                let target = self.deref_uoffset(loc, field.name)?;
                self.verify_string(target)
            }
            WireType::Table(schema) => {
                let target = self.deref_uoffset(loc, field.name)?;
                self.verify_table(target, schema)
            }
            WireType::Vector(elem) => {
                let target = self.deref_uoffset(loc, field.name)?;
                self.verify_vector(target, elem)
            }
            WireType::UnionVector { variants, .. } => {
                let schema = variants
                    .iter()
                    .find(|v| v.tag == tag)
                    .map_or(&UNTYPED, |v| v.schema);
                let target = self.deref_uoffset(loc, field.name)?;
                self.verify_vector(target, ElemType::Table(schema))
            }
        }
    }

    fn verify_string(&self, loc: usize) -> Result<()> {
        self.check_range(loc, SIZE_UOFFSET, "string length")?;
        let len = read_uoffset(self.buf, loc);
        let start = loc + SIZE_UOFFSET;
        // One more for the terminator.
        self.check_range(start, len.saturating_add(1), "string")?;
        if self.buf[start + len] != 0 {
            return Err(Error::BadEncode(format!(
                "String at {} is missing its NUL terminator",
                loc
            )));
        }
        std::str::from_utf8(&self.buf[start..start + len])
            .map_err(|_| Error::BadEncode(format!("String at {} is not valid UTF-8", loc)))?;
        Ok(())
    }

    fn verify_vector(&mut self, loc: usize, elem: ElemType) -> Result<()> {
        self.check_range(loc, SIZE_UOFFSET, "vector length")?;
        let len = read_uoffset(self.buf, loc);
        let start = loc + SIZE_UOFFSET;
        let bytes = len.checked_mul(elem.stride()).ok_or(Error::LengthTooLong {
            max: MAX_BUFFER_SIZE,
            actual: usize::MAX,
        })?;
        self.check_range(start, bytes, "vector")?;
        match elem {
            ElemType::Scalar(_) => Ok(()),
            ElemType::String => (0..len).try_for_each(|i| {
                let target = self.deref_uoffset(start + i * SIZE_UOFFSET, "string vector")?;
                self.verify_string(target)
            }),
            ElemType::Table(schema) => (0..len).try_for_each(|i| {
                let target = self.deref_uoffset(start + i * SIZE_UOFFSET, "table vector")?;
                self.verify_table(target, schema)
            }),
        }
    }
}
