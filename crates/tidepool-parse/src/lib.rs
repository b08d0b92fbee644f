//! Allocation-free parsing of trade frames and the decimal fields inside
//! them, in the style of a hot-path exchange-feed parser: single-pass byte
//! scanning, no intermediate JSON value tree.

pub mod frame;
pub mod num;
pub mod symbol_table;

pub use frame::{ParseError, ParsedFrame, parse_frame};
pub use num::{parse_f64_fast, parse_i64_fast};
pub use symbol_table::SymbolTable;
