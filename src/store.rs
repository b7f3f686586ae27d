//! Keyed JSON stores.
//!
//! The classify and repeat commands both keep a JSON object mapping a row key
//! to a record, rewritten in full after every upsert so a session can be
//! interrupted at any point without losing finished work.
use crate::util::{read_json, write_json};
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct KeyedStore<T> {
    path: PathBuf,
    records: BTreeMap<String, T>,
}

impl<T> KeyedStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let records = if path.exists() {
            read_json(path)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Insert or replace `key`, then persist the whole store.
    pub fn upsert(&mut self, key: &str, record: T) -> Result<()> {
        self.records.insert(key.to_string(), record);
        write_json(&self.path, &self.records)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn records(&self) -> &BTreeMap<String, T> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
