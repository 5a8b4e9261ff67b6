//! Utility functions shared by the runtime and the standalone job runner.
//!

use anyhow::{bail, Result};
use glob::glob;
use std::any::Any;

/// Turns a panic payload into something printable.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Expands each glob pattern into matching paths, keeping the order in
/// which patterns were given. A pattern without glob characters is kept
/// as-is even if no such file exists; the map function reports it.
///
/// Returns an error if a pattern is malformed or a glob matches nothing.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<String>> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            inputs.push(pattern.clone());
            continue;
        }
        let before = inputs.len();
        for pathspec in glob(pattern)? {
            inputs.push(pathspec?.to_string_lossy().into_owned());
        }
        if inputs.len() == before {
            bail!("input pattern `{}` matched no files", pattern);
        }
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload = std::panic::catch_unwind(|| panic!("{} {}", "formatted", 1)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 1");
    }

    #[test]
    fn glob_patterns_expand_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.txt", "c.log"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let pattern = format!("{}/*.txt", dir.path().display());
        let literal = "plain/path.txt".to_string();

        let inputs = expand_inputs(&[literal.clone(), pattern]).unwrap();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0], literal);
        assert!(inputs[1].ends_with("a.txt"));
        assert!(inputs[2].ends_with("b.txt"));
    }

    #[test]
    fn glob_matching_nothing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.none", dir.path().display());
        assert!(expand_inputs(&[pattern]).is_err());
    }
}
