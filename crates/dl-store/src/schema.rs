//! Column schema bookkeeping.
//!
//! Columns are split in two runs: the committed columns that are already
//! part of the on-disk header, and the pending columns discovered since.
//! Indices are positional over `committed ++ pending` and never change once
//! assigned.

use std::collections::HashMap;

/// Ordered, append-only set of column names.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    committed: Vec<String>,
    pending: Vec<String>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Create a registry seeded with the columns of an existing header.
    ///
    /// A name repeated in the header keeps its first position.
    pub fn new(committed: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(committed.len());
        for (i, name) in committed.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self {
            committed,
            pending: Vec::new(),
            index,
        }
    }

    /// Return the index of `name`, appending it to the pending run if unseen.
    pub fn resolve_or_append(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        self.pending.push(name.to_string());
        let i = self.committed.len() + self.pending.len() - 1;
        self.index.insert(name.to_string(), i);
        i
    }

    pub fn committed(&self) -> &[String] {
        &self.committed
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// All column names in index order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.committed
            .iter()
            .chain(self.pending.iter())
            .map(String::as_str)
    }

    /// Header line for the full schema, without line terminator.
    pub fn header_line(&self, separator: char) -> String {
        let mut sep = [0u8; 4];
        let sep = separator.encode_utf8(&mut sep);
        self.columns().collect::<Vec<_>>().join(sep)
    }

    /// Move the pending run into the committed run.
    ///
    /// Indices are unchanged; only call once the header is on disk.
    pub fn commit_pending(&mut self) {
        self.committed.append(&mut self.pending);
    }
}
