// src/process/mod.rs
//
// Response rows → named tables. Leaf first: `value` (the tree), `decode`
// (wire row → tree), `route` (tree → per-table field maps), `table`
// (header/body accumulation) and `materialize` (drives the whole pass).

pub mod batch;
pub mod decode;
pub mod materialize;
pub mod route;
pub mod table;
pub mod value;

pub use batch::{RawRow, ResponseBatch};
pub use decode::{decode_row, ResponseRow};
pub use materialize::{materialize, MaterializeOptions, Materialized, Materializer, QueryOutcome};
pub use route::Router;
pub use table::{HeaderPolicy, Table, TableSet};
pub use value::{Fields, Value};
