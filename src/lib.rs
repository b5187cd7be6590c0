//! iris-wire is the binary message layer shared by the nodes of a replicated show-control
//! cluster and their front ends. Every message is a single offset-based buffer: a root table
//! whose fields are found through a vtable of 16-bit offsets, with strings, vectors and nested
//! tables reached through 32-bit forward offsets. Buffers can be read in place without copying.
//!
//! The crate provides:
//!
//! - A [`Builder`] that writes buffers back to front, deduplicating vtables and leaving out
//!     fields that hold their default value.
//! - A [`Verifier`][verifier::Verifier] that bounds-checks a received buffer against a
//!     [`TableSchema`][schema::TableSchema] before any of it is read, with configurable
//!     nesting and table-count limits.
//! - Zero-copy views over verified buffers, through [`root`] and [`root_with_opts`].
//! - The message types themselves:
//!     - [`Pin`]: a typed, array-valued endpoint with its value stored as a vector of
//!         [`Slice`]s of bools, bytes, shorts or floats.
//!     - [`CueList`]: a named, ordered list of cues.
//!     - [`VoteRequest`]: the Raft election request.
//!     - [`ErrorType`]: the cluster-wide error taxonomy.
//! - A [`StateStore`] for front ends, holding decoded state as JSON and publishing every
//!     change to subscribers.
//!
//! # Example
//!
//! ```
//! use iris_wire::{root, VoteRequest};
//!
//! let request = VoteRequest {
//!     term: 7,
//!     last_log_index: 12,
//!     last_log_term: 6,
//! };
//! let buf = request.encode().unwrap();
//!
//! let view = root::<VoteRequest>(&buf).unwrap();
//! assert_eq!(view.term(), 7);
//! assert_eq!(VoteRequest::decode(&buf).unwrap(), request);
//! ```
//!
//! # Wire Format
//!
//! All integers are little-endian. A buffer starts with a 32-bit offset to the root table. A
//! table starts with a signed 32-bit offset back to its vtable; the vtable holds its own length,
//! the table's inline length, and one 16-bit field offset per slot, with 0 meaning the field is
//! absent. Strings are a 32-bit length, the UTF-8 bytes, and a NUL terminator. Vectors are a
//! 32-bit element count followed by the elements, where table and string elements are stored as
//! forward offsets.

#[macro_use]
mod macros;

pub mod builder;
pub mod cue_list;
pub mod error;
pub mod error_type;
pub mod pin;
pub mod raft;
pub mod scalar;
pub mod schema;
pub mod slice;
pub mod state;
pub mod table;
pub mod verifier;

pub use builder::{Builder, BuilderOptions, Offset};
pub use cue_list::{CueList, CueListArgs, CueListRef};
pub use error::{Error, Result};
pub use error_type::{ErrorCategory, ErrorType};
pub use pin::{Behavior, Pin, PinArgs, PinRef, PinType, StringType, ValType};
pub use raft::{VoteRequest, VoteRequestRef};
pub use schema::Entity;
pub use slice::{PinSlices, Slice, SliceRef, Slices};
pub use state::{StateStore, Subscription};
pub use table::{root, root_with_opts};
pub use verifier::VerifierOptions;

/// The largest buffer that can be built or verified. Offsets are 32-bit and signed offsets must
/// be able to reach any point in the buffer, so this is 2 GiB less one byte.
pub const MAX_BUFFER_SIZE: usize = (1usize << 31) - 1;

/// Default limit on table nesting, counting the root table as 1.
pub const MAX_DEPTH: usize = 64;
