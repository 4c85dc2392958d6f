//! Reading the per-term grade exports from disk.
//!
//! Each term directory holds two tab-separated exports: section statistics
//! and letter-grade distributions. Exports come out of the registrar's tool
//! as either UTF-16 or UTF-8, and the distribution export carries a title
//! row above its real header.
//!
//! Older terms instead hold one or more comma-separated files that combine
//! both tables, with bucket counts already on each section row.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::records::{GradeDistributionRecord, RawSectionRow, SectionRecord};

/// File naming and parsing options for one term directory.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub summary_file: String,
    pub distribution_file: String,
    pub delimiter: u8,
    /// Delimiter of the legacy combined files.
    pub legacy_delimiter: u8,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            summary_file: "Grade Summary.csv".to_string(),
            distribution_file: "Grade Summary by Grade.csv".to_string(),
            delimiter: b'\t',
            legacy_delimiter: b',',
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// Section statistics plus a separate letter-grade distribution.
    #[default]
    Export,
    /// Combined comma-separated files with inline bucket counts.
    Legacy,
}

/// Both tables of one (campus, term) unit.
#[derive(Debug, Default)]
pub struct TermInput {
    pub format: InputFormat,
    pub sections: Vec<SectionRecord>,
    /// Empty for legacy input.
    pub distribution: Vec<GradeDistributionRecord>,
}

/// Loads a term directory.
///
/// Uses the export pair when both files are present. Otherwise falls back to
/// any other `*.csv` files in the directory, read as legacy combined files.
/// Returns `Ok(None)` when neither is available.
pub fn load_term(dir: &Path, options: &LoaderOptions) -> Result<Option<TermInput>> {
    let summary_path = dir.join(&options.summary_file);
    let distribution_path = dir.join(&options.distribution_file);

    let missing: Vec<&PathBuf> = [&summary_path, &distribution_path]
        .into_iter()
        .filter(|p| !p.is_file())
        .collect();
    if !missing.is_empty() {
        let legacy_files = legacy_files(dir, options)?;
        if !legacy_files.is_empty() {
            return load_legacy(dir, &legacy_files, options.legacy_delimiter);
        }
        for path in missing {
            warn!(path = %path.display(), "Missing grade export");
        }
        return Ok(None);
    }

    let sections = load_sections(&summary_path, options.delimiter)?;
    let distribution = load_distribution(&distribution_path, options.delimiter)?;

    debug!(
        dir = %dir.display(),
        sections = sections.len(),
        distribution_rows = distribution.len(),
        "Term loaded"
    );

    Ok(Some(TermInput {
        format: InputFormat::Export,
        sections,
        distribution,
    }))
}

/// `*.csv` files in `dir` other than the two export names, sorted.
fn legacy_files(dir: &Path, options: &LoaderOptions) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv
            && path.is_file()
            && name != options.summary_file
            && name != options.distribution_file
        {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Concatenates every readable legacy file. A file that fails to parse is
/// logged and left out; `Ok(None)` when none could be read.
fn load_legacy(dir: &Path, files: &[PathBuf], delimiter: u8) -> Result<Option<TermInput>> {
    let mut sections = Vec::new();
    let mut loaded = 0;

    for path in files {
        match load_legacy_sections(path, delimiter) {
            Ok(mut rows) => {
                loaded += 1;
                sections.append(&mut rows);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable legacy file"),
        }
    }

    if loaded == 0 {
        return Ok(None);
    }

    debug!(
        dir = %dir.display(),
        files = loaded,
        sections = sections.len(),
        "Legacy term loaded"
    );

    Ok(Some(TermInput {
        format: InputFormat::Legacy,
        sections,
        distribution: Vec::new(),
    }))
}

/// Reads one legacy combined file.
pub fn load_legacy_sections(path: &Path, delimiter: u8) -> Result<Vec<SectionRecord>> {
    let (headers, rows) = read_table(path, delimiter, "Subject")?;
    Ok(parse_legacy(&headers, &rows))
}

/// Reads the section statistics export.
pub fn load_sections(path: &Path, delimiter: u8) -> Result<Vec<SectionRecord>> {
    let (headers, rows) = read_table(path, delimiter, "Course")?;
    parse_sections(&headers, &rows).with_context(|| format!("parsing {}", path.display()))
}

/// Reads the letter-grade distribution export.
pub fn load_distribution(path: &Path, delimiter: u8) -> Result<Vec<GradeDistributionRecord>> {
    let (headers, rows) = read_table(path, delimiter, "Course")?;
    Ok(parse_distribution(&headers, &rows))
}

/// Rows shorter than the header are padded with blanks; longer rows are cut.
pub fn parse_sections(headers: &StringRecord, rows: &[StringRecord]) -> Result<Vec<SectionRecord>> {
    let mut sections = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let padded: StringRecord = row
            .iter()
            .chain(std::iter::repeat(""))
            .take(headers.len())
            .collect();
        let raw: RawSectionRow = padded
            .deserialize(Some(headers))
            .with_context(|| format!("data row {}", i + 1))?;
        if let Some(section) = SectionRecord::from_raw(&raw) {
            sections.push(section);
        }
    }
    Ok(sections)
}

pub fn parse_legacy(headers: &StringRecord, rows: &[StringRecord]) -> Vec<SectionRecord> {
    rows.iter()
        .filter_map(|row| SectionRecord::from_legacy_row(headers.iter(), row.iter()))
        .collect()
}

pub fn parse_distribution(
    headers: &StringRecord,
    rows: &[StringRecord],
) -> Vec<GradeDistributionRecord> {
    rows.iter()
        .filter_map(|row| GradeDistributionRecord::from_row(headers.iter(), row.iter()))
        .collect()
}

/// Decodes and splits a delimited export into its header and data rows.
pub fn read_table(
    path: &Path,
    delimiter: u8,
    key_column: &str,
) -> Result<(StringRecord, Vec<StringRecord>)> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = decode_text(&bytes);
    parse_table(&text, delimiter, key_column)
        .with_context(|| format!("parsing {}", path.display()))
}

/// Parses delimited text. The header is the first row with a `key_column`
/// cell; anything above it is discarded.
pub fn parse_table(
    text: &str,
    delimiter: u8,
    key_column: &str,
) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        records.push(result?);
    }

    let header_at = records
        .iter()
        .position(|r| r.iter().any(|cell| cell == key_column))
        .with_context(|| format!("no header row with a `{key_column}` column"))?;

    let rows = records.split_off(header_at + 1);
    let headers = records.pop().context("header row vanished")?;
    Ok((headers, rows))
}

/// Decodes export bytes: UTF-16 when a byte-order mark (or a little-endian
/// ASCII pattern) says so, UTF-8 otherwise. Invalid sequences are replaced.
pub fn decode_text(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        [first, 0, ..] if *first != 0 && bytes.len() % 2 == 0 => {
            decode_utf16(bytes, u16::from_le_bytes)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
