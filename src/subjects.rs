use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One entry of a campus subject list.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectMetadata {
    pub code: String,
    pub title: String,
    pub faculty_school: String,
}

/// Subject code lookup for a single campus.
///
/// Stored on disk as a JSON array:
/// ```json
/// [
///   { "code": "CPSC", "title": "Computer Science", "faculty_school": "Faculty of Science" }
/// ]
/// ```
#[derive(Debug, Clone, Default)]
pub struct SubjectDirectory {
    entries: HashMap<String, SubjectMetadata>,
}

impl SubjectDirectory {
    /// Loads the directory from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading subject list {}", path.display()))?;
        let entries: Vec<SubjectMetadata> = serde_json::from_str(&content)
            .with_context(|| format!("parsing subject list {}", path.display()))?;
        Ok(Self::from_entries(entries))
    }

    /// Later entries with a repeated code replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = SubjectMetadata>) -> Self {
        let entries = entries
            .into_iter()
            .map(|s| (s.code.trim().to_string(), s))
            .collect();
        Self { entries }
    }

    pub fn get(&self, code: &str) -> Option<&SubjectMetadata> {
        self.entries.get(code.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_code() {
        let json = r#"[
            {"code": "CPSC", "title": "Computer Science", "faculty_school": "Faculty of Science"},
            {"code": "ENGL", "title": "English", "faculty_school": "Faculty of Arts"}
        ]"#;
        let entries: Vec<SubjectMetadata> = serde_json::from_str(json).unwrap();
        let dir = SubjectDirectory::from_entries(entries);

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.get("CPSC").unwrap().title, "Computer Science");
        assert_eq!(dir.get(" ENGL ").unwrap().faculty_school, "Faculty of Arts");
        assert!(dir.get("MATH").is_none());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = SubjectDirectory::load("/nonexistent/subjects.json");
        assert!(result.is_err());
    }
}
