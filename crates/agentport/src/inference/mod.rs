//! Metadata inference: categories, tool permissions, MCP integrations.
//!
//! All three stages read from one immutable [`InferenceTables`] value that is
//! built once (built-in defaults, optionally overlaid from TOML) and passed by
//! reference, so tests can substitute their own tables.

pub mod classify;
pub mod default;
pub mod integrations;
pub mod load;
pub mod permissions;
pub mod types;

pub use classify::*;
pub use integrations::*;
pub use load::*;
pub use permissions::*;
pub use types::*;
