//! Job resolution and ordering.
//!
//! Resolution folds each job's property fragments over an empty mapping, in
//! tag-list order, via the merge engine. Ordering sorts the resolved jobs by
//! stage count (descending) and priority label (ascending, lexicographic),
//! keeping input order on ties.

use crate::Result;
use crate::diagnostics;
use crate::fragment::{Fragment, merge};
use crate::matrix::{PropertyTable, ValidatedMatrix};

use anyhow::bail;
use std::collections::BTreeMap;

/// One fully-resolved job: the merged configuration mapping plus the
/// ordering metadata carried over from the job spec. Immutable once built;
/// resolution copies structurally, so no two jobs share substructure.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJob {
    pub priority: String,
    pub tags: Vec<String>,
    pub config: BTreeMap<String, Fragment>,
}

impl ResolvedJob {
    /// Number of stages this job participates in, the primary sort key.
    ///
    /// A resolved job without a `stage` sequence cannot be ordered; that is
    /// always a defect in the matrix, never a condition to recover from.
    fn stage_count(&self) -> Result<usize> {
        match self.config.get("stage") {
            Some(Fragment::Sequence(stages)) => Ok(stages.len()),
            Some(_) => bail!(
                "{}",
                diagnostics::error_message(format!(
                    "job {:?} (priority '{}') has a stage field that is not a sequence",
                    self.tags, self.priority
                ))
            ),
            None => bail!(
                "{}",
                diagnostics::error_message(format!(
                    "job {:?} (priority '{}') resolved without a stage field",
                    self.tags, self.priority
                ))
            ),
        }
    }
}

/// Fold the fragments named by `tags` over an empty mapping, in order.
///
/// Pure: the same `(tags, table)` pair always yields a structurally equal
/// fragment. Later fragments override earlier ones on scalar conflicts;
/// sequence-valued keys accumulate, so tag order is semantically
/// significant. Unknown tags are an error here too, so the function stays
/// safe to use on a table that did not come through matrix validation.
pub fn resolve(tags: &[String], table: &PropertyTable) -> Result<Fragment> {
    let mut result = Fragment::empty_mapping();
    for tag in tags {
        match table.get(tag) {
            Some(fragment) => result = merge(&result, fragment),
            None => bail!(
                "{}",
                diagnostics::error_message(format!("unknown property '{}'", tag))
            ),
        }
    }
    Ok(result)
}

/// Resolve every job in the validated matrix.
pub fn resolve_jobs(matrix: &ValidatedMatrix) -> Result<Vec<ResolvedJob>> {
    let mut out = Vec::with_capacity(matrix.jobs.len());

    for job in &matrix.jobs {
        let config = match resolve(&job.tags, &matrix.table)? {
            Fragment::Mapping(m) => m,
            // Unreachable through validation (properties are mappings), but
            // the table is caller-supplied when resolve() is used directly.
            other => bail!(
                "{}",
                diagnostics::error_message(format!(
                    "job {:?} (priority '{}') resolved to a non-mapping fragment: {:?}",
                    job.tags, job.priority, other
                ))
            ),
        };

        out.push(ResolvedJob {
            priority: job.priority.clone(),
            tags: job.tags.clone(),
            config,
        });
    }

    Ok(out)
}

/// Order resolved jobs for rendering: more stages first, then ascending
/// priority label. The sort is stable, so jobs with equal keys keep their
/// relative order from the matrix.
pub fn order(jobs: Vec<ResolvedJob>) -> Result<Vec<ResolvedJob>> {
    let mut keyed = Vec::with_capacity(jobs.len());
    for job in jobs {
        let stages = job.stage_count()?;
        keyed.push((stages, job));
    }

    keyed.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.priority.cmp(&b.priority)));

    Ok(keyed.into_iter().map(|(_, job)| job).collect())
}
