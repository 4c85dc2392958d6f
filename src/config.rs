use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use crate::aggregation::join::DuplicatePolicy;
use crate::loader::LoaderOptions;

/// One campus to process.
#[derive(Debug, Clone, Deserialize)]
pub struct CampusConfig {
    /// Directory name under the input root, e.g. `UBCV`.
    pub name: String,
    /// Subject list file, relative to the subjects directory.
    pub subjects: String,
    /// Whether courses on this campus get the honorary science credit annotation.
    #[serde(default)]
    pub honorary_science_credit: bool,
}

/// Batch run configuration.
///
/// Stored as a JSON object on disk; every field is optional:
/// ```json
/// {
///   "campuses": [
///     { "name": "UBCV", "subjects": "UBCV-subjects.json", "honorary_science_credit": true },
///     { "name": "UBCO", "subjects": "UBCO-subjects.json" }
///   ],
///   "summary_file": "Grade Summary.csv",
///   "distribution_file": "Grade Summary by Grade.csv",
///   "delimiter": "\t",
///   "legacy_delimiter": ",",
///   "duplicate_join": "first"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub campuses: Vec<CampusConfig>,
    pub summary_file: String,
    pub distribution_file: String,
    pub delimiter: String,
    /// Delimiter of older terms' combined files.
    pub legacy_delimiter: String,
    pub duplicate_join: DuplicatePolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        let loader = LoaderOptions::default();
        Self {
            campuses: vec![
                CampusConfig {
                    name: "UBCV".to_string(),
                    subjects: "UBCV-subjects.json".to_string(),
                    honorary_science_credit: true,
                },
                CampusConfig {
                    name: "UBCO".to_string(),
                    subjects: "UBCO-subjects.json".to_string(),
                    honorary_science_credit: false,
                },
            ],
            summary_file: loader.summary_file,
            distribution_file: loader.distribution_file,
            delimiter: "\t".to_string(),
            legacy_delimiter: ",".to_string(),
            duplicate_join: DuplicatePolicy::default(),
        }
    }
}

impl RunConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(content)?;
        config.loader_options()?;
        Ok(config)
    }

    /// Loader options derived from this config. Delimiters must be a single byte.
    pub fn loader_options(&self) -> Result<LoaderOptions> {
        Ok(LoaderOptions {
            summary_file: self.summary_file.clone(),
            distribution_file: self.distribution_file.clone(),
            delimiter: single_byte("delimiter", &self.delimiter)?,
            legacy_delimiter: single_byte("legacy_delimiter", &self.legacy_delimiter)?,
        })
    }
}

fn single_byte(field: &str, value: &str) -> Result<u8> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => bail!("{field} must be a single ASCII character, got {value:?}"),
    }
}
