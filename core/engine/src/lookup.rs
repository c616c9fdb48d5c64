//! FILENAME: core/engine/src/lookup.rs
//! PURPOSE: Per-execution cache of dataset rows and Lookup indices.
//! CONTEXT: A Lookup resolves a key against another dataset's rows. Each
//! (dataset, key field) pair is indexed once per report execution; the
//! cache is owned by that execution and dropped with it.
//!
//! Two row sets are kept per dataset. Fetched rows carry only the declared
//! fields read from the query result and back every index. Evaluated rows
//! also carry tablix cells and exist only for datasets someone rendered.

use crate::row::EvaluatedRow;
use parser::ScalarValue;
use rustc_hash::FxHashMap;

/// A normalized, hashable form of a key value.
/// Keys compare by their display text, so the number 42 and the text "42"
/// address the same row. Null is never a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    pub fn from_value(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Null => None,
            other => Some(LookupKey(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Maps key values of one field to the position of the first row holding them.
#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    positions: FxHashMap<LookupKey, usize>,
}

impl LookupIndex {
    /// Indexes `rows` by `key_field`. Rows whose key is Null or missing are skipped;
    /// for duplicate keys the earliest row wins.
    pub fn build(rows: &[EvaluatedRow], key_field: &str) -> Self {
        let mut positions = FxHashMap::default();
        for (position, row) in rows.iter().enumerate() {
            let key = row.get(key_field).and_then(LookupKey::from_value);
            if let Some(key) = key {
                positions.entry(key).or_insert(position);
            }
        }
        LookupIndex { positions }
    }

    pub fn position(&self, key: &ScalarValue) -> Option<usize> {
        LookupKey::from_value(key).and_then(|k| self.positions.get(&k).copied())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Rows of every dataset fetched so far, plus the Lookup indices over them.
#[derive(Debug, Default)]
pub struct ExecutionCache {
    rows: FxHashMap<String, Vec<EvaluatedRow>>,
    evaluated: FxHashMap<String, Vec<EvaluatedRow>>,
    indices: FxHashMap<(String, String), LookupIndex>,
}

impl ExecutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetched rows: declared fields only, no cells.
    pub fn rows(&self, dataset: &str) -> Option<&[EvaluatedRow]> {
        self.rows.get(dataset).map(Vec::as_slice)
    }

    pub fn store_rows(&mut self, dataset: &str, rows: Vec<EvaluatedRow>) {
        self.rows.insert(dataset.to_string(), rows);
    }

    /// Rows with every bound tablix column evaluated.
    pub fn evaluated(&self, dataset: &str) -> Option<&[EvaluatedRow]> {
        self.evaluated.get(dataset).map(Vec::as_slice)
    }

    pub fn store_evaluated(&mut self, dataset: &str, rows: Vec<EvaluatedRow>) {
        self.evaluated.insert(dataset.to_string(), rows);
    }

    pub fn has_index(&self, dataset: &str, key_field: &str) -> bool {
        self.indices
            .contains_key(&(dataset.to_string(), key_field.to_string()))
    }

    /// Builds the index for (dataset, key_field) from the fetched rows.
    /// Returns false when the dataset has not been fetched yet.
    pub fn build_index(&mut self, dataset: &str, key_field: &str) -> bool {
        let Some(rows) = self.rows.get(dataset) else {
            return false;
        };
        let index = LookupIndex::build(rows, key_field);
        log::debug!(
            target: "EXEC",
            "Indexed '{}' by '{}': {} distinct keys over {} rows",
            dataset,
            key_field,
            index.len(),
            rows.len()
        );
        self.indices
            .insert((dataset.to_string(), key_field.to_string()), index);
        true
    }

    /// Resolves `key` against the (dataset, key_field) index.
    /// The outer None means no index was prepared; the inner None means no row matched.
    pub fn lookup(
        &self,
        dataset: &str,
        key_field: &str,
        key: &ScalarValue,
    ) -> Option<Option<&EvaluatedRow>> {
        let index = self
            .indices
            .get(&(dataset.to_string(), key_field.to_string()))?;
        let rows = self.rows.get(dataset)?;
        Some(index.position(key).and_then(|p| rows.get(p)))
    }
}
