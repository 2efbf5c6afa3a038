// src/lib.rs
pub mod config;
pub mod fetch;
pub mod parse;

pub use parse::{
    parse_stats_table, FieldParser, ParseError, Registry, RowFilter, StatsTable, Value,
};
