use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OpenFlags};

use super::{Row, RowSource, Value};
use crate::error::Result;

/// Read-only view of an SQLite database.
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open the monitored database read-only. Never creates the file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(SqliteSource { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        SqliteSource { conn }
    }
}

// identifiers come from sqlite_master, but a table name can still contain quotes
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl RowSource for SqliteSource {
    fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;

        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tables)
    }

    fn primary_key(&self, table: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) WHERE pk = 1")?;

        let mut rows = stmt.query(params![table])?;

        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    fn for_each_row(&self, table: &str, visit: &mut dyn FnMut(Row) -> Result<()>) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;

        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let mut columns = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                columns.push((name.clone(), Value::from(row.get_ref(i)?)));
            }
            visit(Row::new(columns))?;
        }

        Ok(())
    }

    fn fetch_row(&self, table: &str, pk_column: &str, pk_value: &str) -> Result<Option<Row>> {
        let sql = lookup_sql(table, pk_column);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        // the canonical key string lost its storage class, so try each class it
        // could have come from; every attempt is an indexed equality lookup
        for candidate in key_candidates(pk_value) {
            let mut rows = stmt.query(params![candidate])?;

            if let Some(row) = rows.next()? {
                let mut columns = Vec::with_capacity(names.len());
                for (i, name) in names.iter().enumerate() {
                    columns.push((name.clone(), Value::from(row.get_ref(i)?)));
                }
                return Ok(Some(Row::new(columns)));
            }
        }

        Ok(None)
    }
}

fn lookup_sql(table: &str, pk_column: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = ?1 LIMIT 1",
        quote_ident(table),
        quote_ident(pk_column)
    )
}

/// Typed parameters a canonical key string may stand for, most likely first.
///
/// Integer keys also match TEXT columns through affinity, and a text
/// parameter matches INTEGER columns the same way. Blob keys are stored as
/// hex and only match when bound as bytes.
fn key_candidates(pk_value: &str) -> Vec<SqlValue> {
    let mut candidates = Vec::with_capacity(3);

    if let Ok(i) = pk_value.parse::<i64>() {
        candidates.push(SqlValue::Integer(i));
    } else if let Ok(f) = pk_value.parse::<f64>() {
        candidates.push(SqlValue::Real(f));
    }

    candidates.push(SqlValue::Text(pk_value.to_string()));

    if let Ok(bytes) = hex::decode(pk_value) {
        candidates.push(SqlValue::Blob(bytes));
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> SqliteSource {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, item TEXT, qty INTEGER, note TEXT);
             INSERT INTO orders VALUES (1, 'apple', 3, NULL);
             INSERT INTO orders VALUES (2, 'pear', 1, '');
             CREATE TABLE \"odd \"\"name\" (code TEXT PRIMARY KEY, v REAL);
             INSERT INTO \"odd \"\"name\" VALUES ('x', 1.5);
             CREATE TABLE audit (msg TEXT);
             CREATE TABLE blobs (k BLOB PRIMARY KEY, v TEXT);
             INSERT INTO blobs VALUES (x'00ff', 'binary key');",
        )
        .unwrap();
        SqliteSource::from_connection(conn)
    }

    #[test]
    fn lists_user_tables_sorted() {
        let source = fixture();
        assert_eq!(
            source.list_tables().unwrap(),
            vec!["audit", "blobs", "odd \"name", "orders"]
        );
    }

    #[test]
    fn resolves_primary_keys() {
        let source = fixture();
        assert_eq!(source.primary_key("orders").unwrap().as_deref(), Some("id"));
        assert_eq!(source.primary_key("odd \"name").unwrap().as_deref(), Some("code"));
        assert_eq!(source.primary_key("audit").unwrap(), None);
    }

    #[test]
    fn rows_keep_schema_column_order_and_types() {
        let source = fixture();
        let mut rows = Vec::new();
        source
            .for_each_row("orders", &mut |row| {
                rows.push(row);
                Ok(())
            })
            .unwrap();

        assert_eq!(rows.len(), 2);
        let names: Vec<&str> = rows[0].columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["id", "item", "qty", "note"]);
        assert_eq!(rows[0].get("note"), Some(&Value::Null));
        assert_eq!(rows[1].get("note"), Some(&Value::Text(String::new())));
    }

    #[test]
    fn fetches_row_by_canonical_key() {
        let source = fixture();
        let row = source.fetch_row("orders", "id", "2").unwrap().unwrap();
        assert_eq!(row.get("item"), Some(&Value::Text("pear".into())));

        assert!(source.fetch_row("orders", "id", "99").unwrap().is_none());

        let blob = source.fetch_row("blobs", "k", "00ff").unwrap().unwrap();
        assert_eq!(blob.get("v"), Some(&Value::Text("binary key".into())));
    }

    fn query_plan(source: &SqliteSource, table: &str, pk_column: &str) -> Vec<String> {
        let sql = format!("EXPLAIN QUERY PLAN {}", lookup_sql(table, pk_column));
        let mut stmt = source.conn.prepare(&sql).unwrap();
        stmt.query_map(params!["1"], |row| row.get::<_, String>(3))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn row_lookup_uses_the_key_index() {
        let source = fixture();

        for (table, pk) in [("orders", "id"), ("odd \"name", "code"), ("blobs", "k")] {
            let plan = query_plan(&source, table, pk);
            assert!(
                plan.iter().all(|step| step.starts_with("SEARCH")),
                "{table}: {plan:?}"
            );
        }
    }

    #[test]
    fn untyped_key_column_matches_each_storage_class() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE mixed (k PRIMARY KEY, v TEXT);
             INSERT INTO mixed VALUES (7, 'int'), ('abc', 'text'), (2.5, 'real'), (x'0a0b', 'blob');",
        )
        .unwrap();
        let source = SqliteSource::from_connection(conn);

        for (key, expected) in [("7", "int"), ("abc", "text"), ("2.5", "real"), ("0a0b", "blob")] {
            let row = source.fetch_row("mixed", "k", key).unwrap().unwrap();
            assert_eq!(row.get("v"), Some(&Value::Text(expected.into())), "key {key}");
        }
        assert!(source.fetch_row("mixed", "k", "8").unwrap().is_none());
    }

    #[test]
    fn text_key_that_looks_numeric_is_found() {
        let source = fixture();
        let conn = &source.conn;
        conn.execute("INSERT INTO \"odd \"\"name\" VALUES ('007', 2.0)", [])
            .unwrap();

        let row = source.fetch_row("odd \"name", "code", "007").unwrap().unwrap();
        assert_eq!(row.get("v"), Some(&Value::Real(2.0)));
    }

    #[test]
    fn missing_table_is_a_capture_error() {
        let source = fixture();
        let err = source.for_each_row("nope", &mut |_| Ok(())).unwrap_err();
        assert!(err.is_fatal());
    }
}
