// src/parse/mod.rs
//! Typed extraction of `data-stat` statistics tables.

pub mod error;
pub mod field;
pub mod filter;
pub mod registry;
pub mod table;
pub mod value;

pub use error::ParseError;
pub use field::{Conversion, FieldParser, ParserKind};
pub use filter::RowFilter;
pub use registry::{games_started_count, games_started_marker, Registry};
pub use table::{find_table, parse_stats_table, ColumnHeader, StatsTable};
pub use value::Value;
