use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::thread;

/// Worker counts and phase options for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Mapper threads draining the input units.
    #[serde(default = "default_workers")]
    pub num_mappers: usize,
    /// Reducer threads; also the number of partitions.
    #[serde(default = "default_workers")]
    pub num_reducers: usize,
    /// Sort partitions on one thread each instead of one after another.
    #[serde(default)]
    pub parallel_sort: bool,
}

fn default_workers() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_mappers: default_workers(),
            num_reducers: default_workers(),
            parallel_sort: false,
        }
    }
}

impl RunConfig {
    pub fn new(num_mappers: usize, num_reducers: usize) -> Self {
        Self {
            num_mappers,
            num_reducers,
            parallel_sort: false,
        }
    }

    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_mappers == 0 {
            return Err(Error::InvalidConfig(
                "there must be at least one mapper".to_string(),
            ));
        }
        if self.num_reducers == 0 {
            return Err(Error::InvalidConfig(
                "there must be at least one reducer".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = RunConfig::default();
        assert!(config.num_mappers >= 1);
        assert!(config.num_reducers >= 1);
        assert!(!config.parallel_sort);
        config.validate().unwrap();
    }

    #[test]
    fn zero_workers_are_rejected() {
        assert!(matches!(
            RunConfig::new(0, 2).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            RunConfig::new(2, 0).validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "num_reducers": 3, "parallel_sort": true }}"#).unwrap();

        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.num_reducers, 3);
        assert!(config.parallel_sort);
        assert_eq!(config.num_mappers, RunConfig::default().num_mappers);
    }

    #[test]
    fn load_reports_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "num_mappers = 4").unwrap();
        assert!(matches!(
            RunConfig::load(file.path()),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            RunConfig::load(dir.path().join("absent.json")),
            Err(Error::Io(_))
        ));
    }
}
