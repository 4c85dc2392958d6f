use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::aggregation::{AggregationContext, aggregate_term};
use crate::classify::CreditRules;
use crate::config::{CampusConfig, RunConfig};
use crate::grades::LetterGradeMap;
use crate::loader::{LoaderOptions, load_term};
use crate::output::{view_path, write_json};
use crate::subjects::SubjectDirectory;

pub const COURSE_VIEW: &str = "courses";
pub const INSTRUCTOR_VIEW: &str = "instructors";

/// Where a batch run reads from and writes to.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Holds `<CAMPUS>/<TERM>/` export directories.
    pub input_root: PathBuf,
    /// Holds each campus's subject list.
    pub subjects_dir: PathBuf,
    pub output_root: PathBuf,
    /// Only these terms, when non-empty.
    pub terms: Vec<String>,
    pub gzip: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Processed {
        courses: usize,
        instructors: usize,
        unmatched_sections: usize,
    },
    Skipped {
        reason: String,
    },
}

/// Result of one (campus, term) unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub campus: String,
    pub term: String,
    pub outcome: UnitOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub units: Vec<UnitReport>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::Processed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.units.len() - self.processed()
    }
}

/// Processes every configured campus and term under `options.input_root`.
///
/// Units that cannot be loaded are skipped with a diagnostic. Fails only when
/// no unit at all could be processed.
pub fn run(config: &RunConfig, options: &RunOptions) -> Result<RunSummary> {
    let loader = config.loader_options()?;
    let letters = LetterGradeMap::default();
    let rules = CreditRules::default();
    let mut summary = RunSummary::default();

    for campus in &config.campuses {
        let subjects_path = options.subjects_dir.join(&campus.subjects);
        let subjects = match SubjectDirectory::load(&subjects_path) {
            Ok(subjects) => {
                if subjects.is_empty() {
                    warn!(campus = %campus.name, "Subject list is empty");
                }
                debug!(campus = %campus.name, subjects = subjects.len(), "Subject list loaded");
                subjects
            }
            Err(e) => {
                warn!(campus = %campus.name, error = %e, "Skipping campus without subject list");
                continue;
            }
        };

        let ctx = AggregationContext {
            subjects: &subjects,
            letters: &letters,
            credit_rules: campus.honorary_science_credit.then_some(&rules),
            duplicate_policy: config.duplicate_join,
        };

        process_campus(&ctx, campus, &loader, options, &mut summary);
    }

    info!(
        processed = summary.processed(),
        skipped = summary.skipped(),
        "Run complete"
    );

    if summary.processed() == 0 {
        bail!(
            "no loadable input under {}",
            options.input_root.display()
        );
    }
    Ok(summary)
}

fn process_campus(
    ctx: &AggregationContext<'_>,
    campus: &CampusConfig,
    loader: &LoaderOptions,
    options: &RunOptions,
    summary: &mut RunSummary,
) {
    let campus_dir = options.input_root.join(&campus.name);
    let terms = match list_terms(&campus_dir) {
        Ok(terms) => terms,
        Err(e) => {
            warn!(campus = %campus.name, error = %e, "Skipping campus without input directory");
            return;
        }
    };

    for term in terms {
        if !options.terms.is_empty() && !options.terms.contains(&term) {
            continue;
        }

        let outcome = match process_term(
            ctx,
            &campus.name,
            &term,
            &campus_dir.join(&term),
            loader,
            &options.output_root,
            options.gzip,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(campus = %campus.name, term = %term, error = %e, "Term failed");
                UnitOutcome::Skipped {
                    reason: format!("{e:#}"),
                }
            }
        };

        summary.units.push(UnitReport {
            campus: campus.name.clone(),
            term,
            outcome,
        });
    }
}

/// Loads, aggregates and writes a single (campus, term) unit.
#[tracing::instrument(skip(ctx, term_dir, loader, output_root), fields(dir = %term_dir.display()))]
pub fn process_term(
    ctx: &AggregationContext<'_>,
    campus: &str,
    term: &str,
    term_dir: &Path,
    loader: &LoaderOptions,
    output_root: &Path,
    gzip: bool,
) -> Result<UnitOutcome> {
    let Some(input) = load_term(term_dir, loader)? else {
        warn!("Skipping term with missing exports");
        return Ok(UnitOutcome::Skipped {
            reason: "missing grade exports".to_string(),
        });
    };

    let aggregates = aggregate_term(ctx, &input);

    if aggregates.unmatched_sections > 0 {
        warn!(
            unmatched_sections = aggregates.unmatched_sections,
            "Sections without a grade distribution"
        );
    }

    let course_path = view_path(output_root, COURSE_VIEW, campus, term, gzip);
    write_json(&course_path, &aggregates.courses, gzip)?;

    let instructor_path = view_path(output_root, INSTRUCTOR_VIEW, campus, term, gzip);
    write_json(&instructor_path, &aggregates.instructors, gzip)?;

    info!(
        format = ?input.format,
        courses = aggregates.courses.len(),
        instructors = aggregates.instructors.len(),
        "Term processed"
    );

    Ok(UnitOutcome::Processed {
        courses: aggregates.courses.len(),
        instructors: aggregates.instructors.len(),
        unmatched_sections: aggregates.unmatched_sections,
    })
}

/// Term directory names under a campus directory, sorted.
pub fn list_terms(campus_dir: &Path) -> Result<Vec<String>> {
    let mut terms = Vec::new();

    for entry in fs::read_dir(campus_dir)
        .with_context(|| format!("reading {}", campus_dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                terms.push(name.to_string());
            }
        }
    }

    terms.sort();
    Ok(terms)
}
