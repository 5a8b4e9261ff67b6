//! The per-key value list and its one-shot read cursor.

use crate::error::{Error, Result};

/// Values emitted for one key, in emission order.
///
/// Values are appended during the map phase and read back exactly once
/// during the reduce phase. The cursor only moves forward and is never
/// reset, so a sequence is consumed at most once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSequence {
    key: String,
    values: Vec<String>,
    cursor: usize,
}

impl ValueSequence {
    pub fn new(key: String) -> Self {
        Self {
            key,
            values: Vec::new(),
            cursor: 0,
        }
    }

    /// Creates a sequence holding a single value.
    pub fn with_first(key: String, value: String) -> Result<Self> {
        let mut seq = Self::new(key);
        seq.push(value)?;
        Ok(seq)
    }

    /// Appends `value`, growing the backing storage geometrically.
    ///
    /// Running out of memory is reported instead of aborting the process.
    pub fn push(&mut self, value: String) -> Result<()> {
        self.values
            .try_reserve(1)
            .map_err(|source| Error::Allocation {
                what: "value sequence",
                source,
            })?;
        self.values.push(value);
        Ok(())
    }

    /// Returns the value under the cursor and advances it, or `None` once
    /// every value has been handed out. Calling again after the end keeps
    /// returning `None`.
    pub fn next_value(&mut self) -> Option<String> {
        let value = self.values.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(value)
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of values not yet handed out.
    pub fn remaining(&self) -> usize {
        self.values.len() - self.cursor
    }
}
