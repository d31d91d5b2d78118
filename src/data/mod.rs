//! Data structures for paired multi-block measurements.

mod layout;
mod table;

pub use layout::{BlockLayout, NamedBlock};
pub use table::SampleTable;
