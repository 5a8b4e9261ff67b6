//! A MapReduce-compatible implementation of word count.
//!

use crate::{Emitter, Getter};
use anyhow::{Context, Result};
use std::fs;

pub fn map(unit: &str, emit: &Emitter<'_>, _aux: &[String]) -> Result<()> {
    let text = fs::read_to_string(unit).with_context(|| format!("failed to read `{unit}`"))?;
    for word in text.split_whitespace() {
        emit.emit(word, "1")?;
    }
    Ok(())
}

pub fn reduce(key: &str, values: &mut Getter<'_>, _aux: &[String]) -> Result<String> {
    let mut count: u64 = 0;
    for value in values {
        count += value
            .parse::<u64>()
            .with_context(|| format!("bad count `{value}` for `{key}`"))?;
    }
    Ok(format!("{} {}\n", key, count))
}
