//! Convert Claude Code agent definitions into Kiro agent JSON, inferring
//! categories, tool permissions and MCP integrations along the way.
//! Companion converters turn skills into powers and validate emitted JSON.

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod inference;
pub mod logging;
pub mod model;
pub mod parser;
pub mod powers;
pub mod validate;

pub use error::{ConvertError, Result};
