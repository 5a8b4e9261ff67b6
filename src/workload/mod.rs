//! Converts MapReduce application names to actual application code.
//!
//! # Example
//!
//! To get the word count application:
//! ```
//! # use anyhow::Result;
//! use mrlocal::workload;
//! # fn main() -> Result<()> {
//! let wc = workload::named("wc")?;
//! # let _ = wc;
//! # Ok(())
//! # }
//! ```

use crate::Workload;
use anyhow::{bail, Result};

pub mod grep;
pub mod inverted_index;
pub mod wc;

/// Names accepted by [`named`] and [`try_named`].
pub const NAMES: [&str; 3] = ["wc", "grep", "inverted-index"];

/// Gets the [`Workload`] named `name`.
///
/// Returns [`None`] if no application with the given name was found.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "wc" => Some(Workload {
            map_fn: wc::map,
            reduce_fn: wc::reduce,
        }),
        "grep" => Some(Workload {
            map_fn: grep::map,
            reduce_fn: grep::reduce,
        }),
        "inverted-index" | "ii" => Some(Workload {
            map_fn: inverted_index::map,
            reduce_fn: inverted_index::reduce,
        }),
        _ => None,
    }
}

/// Gets the [`Workload`] named `name`.
///
/// Returns an [`anyhow::Error`] if no application with the given name was found.
pub fn named(name: &str) -> Result<Workload> {
    match try_named(name) {
        Some(app) => Ok(app),
        None => bail!("No app named `{}` found.", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_resolves() {
        for name in NAMES {
            assert!(try_named(name).is_some(), "{name} should resolve");
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(try_named("sort").is_none());
        let err = named("sort").err().unwrap();
        assert!(err.to_string().contains("sort"));
    }
}
