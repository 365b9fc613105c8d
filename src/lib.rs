//! Bulk geocoding for free-text specimen localities.
//!
//! Builds resolver queries from structured label fields, corrects for
//! directional offsets such as "5mi NW of Niland", and flags results that
//! need a human to look at them.

pub mod assembler;
pub mod batch;
pub mod flags;
pub mod geocoder;
pub mod geodesy;
pub mod offset;
pub mod record;
pub mod table;

pub use assembler::{build_query, AssembledQuery};
pub use batch::{Batch, BatchOptions, BatchSummary, GeocodeOutcome, OutputRow};
pub use flags::{classify, FlagResult, FlagStatus};
pub use geodesy::{apply_offset, ShiftedCoordinate};
pub use offset::{parse_offset, Direction, OffsetSpec};
pub use record::LocationRecord;
