//! Database access for snapshot capture and change reports.
//!
//! The snapshotter and the diff engine only see [`RowSource`]. The shipped
//! backend is SQLite; anything that can list tables, name a primary key and
//! stream rows as tagged values can stand in for it.

pub mod sqlite;
pub mod value;

pub use sqlite::SqliteSource;
pub use value::{Row, Value};

use crate::error::Result;

pub trait RowSource {
    /// All user tables, sorted by name.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// First column of the table's primary key, if it has one.
    fn primary_key(&self, table: &str) -> Result<Option<String>>;

    /// Visit every row of `table` in schema column order.
    fn for_each_row(&self, table: &str, visit: &mut dyn FnMut(Row) -> Result<()>) -> Result<()>;

    /// Fetch one row by its canonical primary key string.
    fn fetch_row(&self, table: &str, pk_column: &str, pk_value: &str) -> Result<Option<Row>>;
}
