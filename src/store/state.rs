//! JSON shape of the persisted baseline.
//!
//! ```json
//! {
//!   "files": { "/site/index.php": "<sha256>" },
//!   "database": {
//!     "orders": { "pk_col": "id", "rows": { "1": "<sha256>" } }
//!   },
//!   "timestamp": 1700000000
//! }
//! ```
//!
//! PHP's `json_encode` writes empty or sequentially keyed maps as JSON
//! arrays. Those are read as maps keyed by index so a baseline written by a
//! PHP scanner keeps working.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::snapshot::{Digest, FileEntry, Snapshot, TableEntry};

#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default, deserialize_with = "map_or_list")]
    pub files: BTreeMap<String, Digest>,
    #[serde(default, deserialize_with = "map_or_list")]
    pub database: BTreeMap<String, PersistedTable>,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedTable {
    pub pk_col: String,
    #[serde(default, deserialize_with = "map_or_list")]
    pub rows: BTreeMap<String, Digest>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapOrList<V> {
    Map(BTreeMap<String, V>),
    List(Vec<V>),
}

fn map_or_list<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    Ok(match MapOrList::deserialize(deserializer)? {
        MapOrList::Map(map) => map,
        MapOrList::List(list) => list
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
    })
}

impl From<&Snapshot> for PersistedState {
    fn from(snapshot: &Snapshot) -> Self {
        PersistedState {
            files: snapshot
                .files
                .iter()
                .map(|(path, entry)| (path.clone(), entry.content_hash.clone()))
                .collect(),
            database: snapshot
                .tables
                .iter()
                .map(|(name, table)| {
                    (
                        name.clone(),
                        PersistedTable {
                            pk_col: table.primary_key_column.clone(),
                            rows: table.rows.clone(),
                        },
                    )
                })
                .collect(),
            timestamp: snapshot.timestamp,
        }
    }
}

impl From<PersistedState> for Snapshot {
    fn from(state: PersistedState) -> Self {
        Snapshot {
            timestamp: state.timestamp,
            files: state
                .files
                .into_iter()
                .map(|(path, content_hash)| {
                    (
                        path.clone(),
                        FileEntry {
                            path,
                            content_hash,
                        },
                    )
                })
                .collect(),
            tables: state
                .database
                .into_iter()
                .map(|(name, table)| {
                    (
                        name.clone(),
                        TableEntry {
                            table_name: name,
                            primary_key_column: table.pk_col,
                            rows: table.rows,
                        },
                    )
                })
                .collect(),
        }
    }
}

pub fn to_json(snapshot: &Snapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&PersistedState::from(snapshot))
}

pub fn from_json(text: &str) -> serde_json::Result<Snapshot> {
    serde_json::from_str::<PersistedState>(text).map(Snapshot::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot::empty(1_700_000_000);
        snapshot.files.insert(
            "/site/a.py".into(),
            FileEntry {
                path: "/site/a.py".into(),
                content_hash: "h1".into(),
            },
        );
        let mut orders = TableEntry::new("orders", "id");
        orders.rows.insert("1".into(), "hA".into());
        orders.rows.insert("2".into(), "hB".into());
        snapshot.tables.insert("orders".into(), orders);
        snapshot.tables.insert("empty".into(), TableEntry::new("empty", "slug"));
        snapshot
    }

    #[test]
    fn round_trip_reconstructs_snapshot() {
        let snapshot = sample();
        let restored = from_json(&to_json(&snapshot).unwrap()).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn persisted_shape_matches_documented_layout() {
        let value: serde_json::Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        assert_eq!(value["files"]["/site/a.py"], "h1");
        assert_eq!(value["database"]["orders"]["pk_col"], "id");
        assert_eq!(value["database"]["orders"]["rows"]["2"], "hB");
        assert_eq!(value["timestamp"], 1_700_000_000);
    }

    #[test]
    fn reads_php_style_empty_arrays() {
        let text = r#"{
            "files": [],
            "database": {
                "pages": { "pk_col": "id", "rows": [] },
                "tags": { "pk_col": "id", "rows": ["h0", "h1"] }
            },
            "timestamp": 42
        }"#;

        let snapshot = from_json(text).unwrap();

        assert!(snapshot.files.is_empty());
        assert!(snapshot.tables["pages"].rows.is_empty());
        assert_eq!(snapshot.tables["tags"].rows["1"], "h1");
        assert_eq!(snapshot.tables["tags"].table_name, "tags");
        assert_eq!(snapshot.timestamp, 42);
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        assert!(from_json(r#"{"files": {}, "database": {}}"#).is_err());
    }
}
