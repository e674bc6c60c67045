//! Content fingerprints.
//!
//! Files are hashed as raw bytes. Rows are canonicalized first: for each
//! column, in the order the schema returns them, the column name, a one byte
//! type tag and a length-prefixed payload are fed to the hasher. Two rows hash
//! equal exactly when they hold the same typed values under the same names.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest as _, Sha256};

use crate::db::Row;
use crate::error::{Error, Result};
use crate::snapshot::Digest;

pub fn hash_bytes(bytes: &[u8]) -> Digest {
    hex::encode(Sha256::digest(bytes))
}

/// Streaming hash of a file's contents.
pub fn hash_file(path: &Path) -> Result<Digest> {
    let unreadable = |source: std::io::Error| Error::ResourceUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unreadable)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buf).map_err(unreadable)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

pub fn hash_row(row: &Row) -> Digest {
    let mut hasher = Sha256::new();

    for (name, value) in &row.columns {
        write_field(&mut hasher, name.as_bytes());
        hasher.update([value.tag()]);
        write_field(&mut hasher, &value.payload());
    }

    hex::encode(hasher.finalize())
}

fn write_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
