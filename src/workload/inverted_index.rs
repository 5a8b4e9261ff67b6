//! Maps every word to the input units it appears in.

use crate::{Emitter, Getter};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::fs;

pub fn map(unit: &str, emit: &Emitter<'_>, _aux: &[String]) -> Result<()> {
    let text = fs::read_to_string(unit).with_context(|| format!("failed to read `{unit}`"))?;
    for word in text.split_whitespace().unique() {
        emit.emit(word, unit)?;
    }
    Ok(())
}

pub fn reduce(key: &str, values: &mut Getter<'_>, _aux: &[String]) -> Result<String> {
    let units = values.sorted().dedup().join(", ");
    Ok(format!("{} {}\n", key, units))
}
