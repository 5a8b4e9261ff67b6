//! A MapReduce-compatible implementation of `grep`.
//!
//! Every matching line is emitted under the file it came from, so each
//! reduce call prints the matches of one file in line order.

use crate::{Emitter, Getter};
use anyhow::{Context, Result};
use clap::Parser;
use std::fmt::Write;
use std::fs;

#[derive(Parser, Debug)]
#[clap(no_binary_name = true)]
struct Args {
    #[clap(short, long, value_parser)]
    term: String,
}

pub fn map(unit: &str, emit: &Emitter<'_>, aux: &[String]) -> Result<()> {
    let term = Args::try_parse_from(aux)?.term;
    let text = fs::read_to_string(unit).with_context(|| format!("failed to read `{unit}`"))?;
    for (i, line) in text.lines().enumerate() {
        if line.contains(&term) {
            emit.emit(unit, format!("{}\t{}", i + 1, line))?;
        }
    }
    Ok(())
}

pub fn reduce(key: &str, values: &mut Getter<'_>, _aux: &[String]) -> Result<String> {
    let mut out = String::new();
    for value in values {
        let (line_no, line) = value
            .split_once('\t')
            .with_context(|| format!("malformed match `{value}`"))?;
        writeln!(out, "{}:{}: {}", key, line_no, line)?;
    }
    Ok(out)
}
