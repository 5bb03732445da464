//! One keyed JSON document.
//!
//! A [`Collection`] holds a full document in memory as a `BTreeMap` from
//! sequence key to record, mirrored to one file on disk. All writes go
//! through [`Collection::mutate`], which runs the caller's closure on a
//! working copy under the write lock and publishes the result with a
//! tmp-file-and-rename replace before the in-memory map is swapped. A
//! failed closure or a failed write leaves both the file and the map
//! untouched, so domain checks done inside the closure (balance covers
//! price, stock below cap, key not taken) are atomic per collection.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use kudos_core::SeqKey;

use crate::error::StoreError;

#[derive(Debug)]
pub struct Collection<T> {
    path: PathBuf,
    records: RwLock<BTreeMap<SeqKey, T>>,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open the collection backed by `path`.
    ///
    /// A missing file is an empty collection; an unreadable or malformed
    /// file is an error. Nothing is created on disk until the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Fetch one record by key.
    pub async fn get(&self, key: &str) -> Option<T> {
        self.records.read().await.get(key).cloned()
    }

    /// Snapshot all records in numeric key order.
    pub async fn list(&self) -> Vec<(SeqKey, T)> {
        let guard = self.records.read().await;
        let mut pairs: Vec<(SeqKey, T)> = guard
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort_by_key(|(k, _)| k.parse::<u64>().unwrap_or(u64::MAX));
        pairs
    }

    /// Snapshot all record values in numeric key order.
    pub async fn values(&self) -> Vec<T> {
        self.list().await.into_iter().map(|(_, v)| v).collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Run a read-modify-write cycle on the whole document.
    ///
    /// The closure sees a working copy; its changes are persisted and then
    /// swapped in only when it returns `Ok` and the file write succeeds.
    /// Sequence-key allocation belongs inside the closure so no other
    /// writer can observe the same maximum.
    pub async fn mutate<R, E>(
        &self,
        f: impl FnOnce(&mut BTreeMap<SeqKey, T>) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.records.write().await;
        let mut working = guard.clone();
        let out = f(&mut working)?;
        persist(&self.path, &working)?;
        *guard = working;
        Ok(out)
    }

    /// Insert a record under a freshly allocated sequence key.
    pub async fn append(&self, record: T) -> Result<SeqKey, StoreError> {
        self.mutate(|records| {
            let key = next_seq_key(records);
            records.insert(key.clone(), record);
            Ok::<_, StoreError>(key)
        })
        .await
    }

    /// Drop every record and persist the empty document. Returns the
    /// number of records destroyed.
    pub async fn clear(&self) -> Result<usize, StoreError> {
        self.mutate(|records| {
            let destroyed = records.len();
            records.clear();
            Ok::<_, StoreError>(destroyed)
        })
        .await
    }
}

/// Allocate the next sequence key: one past the numeric maximum, `"1"` for
/// an empty document. Only meaningful while holding the collection's write
/// lock (i.e. inside [`Collection::mutate`]).
pub fn next_seq_key<T>(records: &BTreeMap<SeqKey, T>) -> SeqKey {
    let max = records
        .keys()
        .filter_map(|k| k.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}

/// Replace the document on disk atomically: encode, write a sibling tmp
/// file, rename over the target.
fn persist<T: Serialize>(path: &Path, records: &BTreeMap<SeqKey, T>) -> Result<(), StoreError> {
    let encoded =
        serde_json::to_string_pretty(records).map_err(|source| StoreError::Encode {
            path: path.to_path_buf(),
            source,
        })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, encoded).map_err(|source| StoreError::Write {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
