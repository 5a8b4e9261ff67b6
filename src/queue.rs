//! Hands out input units to mapper workers.

use std::sync::{Mutex, PoisonError};

/// One input unit handed to a mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit<'a> {
    /// Position of the unit in the input list.
    pub id: usize,
    pub name: &'a str,
}

/// Dispenses every unit exactly once, in input order.
#[derive(Debug)]
pub struct TaskQueue {
    units: Vec<String>,
    cursor: Mutex<usize>,
}

impl TaskQueue {
    pub fn new(units: Vec<String>) -> Self {
        Self {
            units,
            cursor: Mutex::new(0),
        }
    }

    /// Takes the next unit, or `None` once the queue is exhausted.
    pub fn next(&self) -> Option<Unit<'_>> {
        let id = {
            // The critical section cannot panic, so a poisoned cursor is still valid.
            let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
            if *cursor >= self.units.len() {
                return None;
            }
            let id = *cursor;
            *cursor += 1;
            id
        };
        Some(Unit {
            id,
            name: &self.units[id],
        })
    }

    /// Number of units handed out so far.
    pub fn dispensed(&self) -> usize {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn remaining(&self) -> usize {
        self.units.len() - self.dispensed()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
