//! Definition domain types: identifiers, parsed sources, converted records.

pub mod naming;
pub mod output;
pub mod source;

pub use naming::*;
pub use output::*;
pub use source::*;
