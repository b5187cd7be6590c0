use std::fmt;

use crate::{builder::VOffset, error_type::ErrorType, pin::ValType};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A table was finished without one of its required fields. Raised by the builder when
    /// ending a table, and by the verifier when required-field checking is turned on.
    MissingRequiredField {
        table: &'static str,
        field: &'static str,
        slot: VOffset,
    },
    /// Buffer was greater than the maximum allowed size, either while building or on decode.
    LengthTooLong { max: usize, actual: usize },
    /// Buffer ended before a complete value could be read.
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Basic wire encoding failure: a bad offset, a malformed vtable, invalid UTF-8...
    BadEncode(String),
    /// Verification hit the nesting depth or table count limit.
    ParseLimit(String),
    /// A slice index doesn't fit the index width of its slice variant.
    IndexOutOfRange {
        slice: &'static str,
        index: u32,
        max: u32,
    },
    /// Two slices of the same pin share an index.
    DuplicateSliceIndex { index: u32 },
    /// The pin's declared value type doesn't match the slice vector handed to it.
    SliceTypeMismatch { declared: ValType, actual: ValType },
    /// A table's inline fields don't fit the 16-bit size recorded in its vtable.
    TableTooLarge { table: &'static str, size: usize },
    /// Occurs when serde serialization or deserialization fails
    SerdeFail(String),
}

impl Error {
    /// The wire-stable tag this error is reported as when it has to cross a process boundary.
    ///
    /// The tag depends only on the variant, not on whether the builder or the reader raised it.
    /// A message that doesn't have the shape its schema demands is a `ParseError`, including a
    /// required field left out while building. Slice model violations and oversized tables are
    /// `Other`.
    pub fn error_type(&self) -> ErrorType {
        match *self {
            Error::MissingRequiredField { .. }
            | Error::LengthTooLong { .. }
            | Error::LengthTooShort { .. }
            | Error::BadEncode(_)
            | Error::ParseLimit(_)
            | Error::SerdeFail(_) => ErrorType::ParseError,
            Error::IndexOutOfRange { .. }
            | Error::DuplicateSliceIndex { .. }
            | Error::SliceTypeMismatch { .. }
            | Error::TableTooLarge { .. } => ErrorType::Other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::MissingRequiredField { table, field, slot } => write!(
                f,
                "Table {} is missing required field {} (slot {})",
                table, field, slot
            ),
            Error::LengthTooLong { max, actual } => write!(
                f,
                "Data too long: was {} bytes, maximum allowed is {}",
                actual, max
            ),
            Error::LengthTooShort {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected data length {}, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::BadEncode(ref err) => write!(f, "Basic data encoding failure: {}", err),
            Error::ParseLimit(ref err) => write!(f, "Hit parsing limit: {}", err),
            Error::IndexOutOfRange { slice, index, max } => write!(
                f,
                "Index {} is out of range for {} (maximum is {})",
                index, slice, max
            ),
            Error::DuplicateSliceIndex { index } => {
                write!(f, "Slice index {} appears more than once", index)
            }
            Error::SliceTypeMismatch { declared, actual } => write!(
                f,
                "Pin declares value type {}, but its slices are {}",
                declared.name(),
                actual.name()
            ),
            Error::TableTooLarge { table, size } => write!(
                f,
                "Table {} has {} bytes of inline fields, more than a vtable can address",
                table, size
            ),
            Error::SerdeFail(ref msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerdeFail(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = Error::MissingRequiredField {
            table: "IOBox",
            field: "Name",
            slot: 1,
        };
        assert_eq!(
            err.to_string(),
            "Table IOBox is missing required field Name (slot 1)"
        );
    }

    #[test]
    fn every_error_maps_to_one_tag() {
        let cases = vec![
            (Error::BadEncode("x".into()), ErrorType::ParseError),
            (Error::ParseLimit("x".into()), ErrorType::ParseError),
            (
                Error::IndexOutOfRange {
                    slice: "BoolSlice",
                    index: 256,
                    max: 255,
                },
                ErrorType::Other,
            ),
            (Error::DuplicateSliceIndex { index: 3 }, ErrorType::Other),
        ];
        for (err, tag) in cases {
            assert_eq!(err.error_type(), tag, "{}", err);
        }
    }

    #[test]
    fn tag_does_not_depend_on_the_side() {
        use crate::{pin::Pin, verifier::VerifierOptions, Builder};

        // Raised by the builder.
        let mut builder = Builder::new();
        let built = builder.start_table::<Pin>().finish().unwrap_err();
        assert!(matches!(built, Error::MissingRequiredField { .. }));

        // Raised by the verifier.
        let mut builder = Builder::new();
        let root_off = builder.start_table::<crate::raft::VoteRequest>().finish().unwrap();
        let buf = builder.finish(root_off).unwrap();
        let strict = VerifierOptions {
            check_required: true,
            ..VerifierOptions::default()
        };
        let read = crate::table::root_with_opts::<Pin>(&buf, &strict).unwrap_err();
        assert!(matches!(read, Error::MissingRequiredField { .. }));

        assert_eq!(built.error_type(), ErrorType::ParseError);
        assert_eq!(read.error_type(), ErrorType::ParseError);
        let too_long = Error::LengthTooLong { max: 64, actual: 100 };
        assert_eq!(too_long.error_type(), ErrorType::ParseError);
        let too_large = Error::TableTooLarge {
            table: "IOBox",
            size: 70_000,
        };
        assert_eq!(too_large.error_type(), ErrorType::Other);
    }
}
