//! Matrix spec (matrix.json): property table + job list + auxiliary bindings.
//!
//! JSON shape:
//! {
//!   "properties": {
//!     "build": {"stage": ["build"]},
//!     "linux": {"os": "linux"},
//!     "g++-7": {"env": ["CC=gcc-7 CXX=g++-7"]}
//!   },
//!   "jobs": [
//!     {"priority": "1-gcc", "properties": ["build", "linux", "g++-7"]}
//!   ],
//!   "cache": ["$HOME/usr/"]            // optional, rendered as-is
//! }
//!
//! We validate that every property fragment is a mapping, that every tag a
//! job references exists in the table, and warn about table entries no job
//! references.

use crate::Result;
use crate::diagnostics;
use crate::fragment::Fragment;

use anyhow::bail;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Immutable tag-to-fragment table, built once per run.
pub type PropertyTable = BTreeMap<String, Fragment>;

#[derive(Debug, Clone, Deserialize)]
pub struct MatrixSpec {
    #[serde(default)]
    pub properties: BTreeMap<String, Fragment>,

    #[serde(default)]
    pub jobs: Vec<RawJob>,

    #[serde(default)]
    pub cache: Vec<String>,
}

/// Raw job shape as it appears in matrix.json.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJob {
    pub priority: String,

    #[serde(default)]
    pub properties: Vec<String>,
}

/// Validated job ready for resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    /// Ordering label, compared lexicographically (e.g. "0-clang", "1-gcc").
    pub priority: String,
    /// Property tags, folded over the job in this exact order.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ValidatedMatrix {
    pub table: PropertyTable,
    pub jobs: Vec<JobSpec>,
    pub cache: Vec<String>,
}

impl MatrixSpec {
    /// Check structural integrity and build the validated matrix.
    ///
    /// Unknown tags are a hard error: a job referencing a tag absent from
    /// the table fails the whole run rather than being passed through as a
    /// literal. This keeps resolution deterministic and catches typos at
    /// load time instead of in the rendered output.
    pub fn validate_and_build(&self) -> Result<ValidatedMatrix> {
        // Phase 1: every property fragment must be a mapping. A job resolves
        // to a mapping; a sequence or scalar property would replace the
        // whole job on merge instead of contributing fields to it.
        for (tag, fragment) in &self.properties {
            if !fragment.is_mapping() {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "property '{}' must be a mapping fragment",
                        tag
                    ))
                );
            }
        }

        if self.jobs.is_empty() {
            bail!(
                "{}",
                diagnostics::error_message("matrix.json contained no jobs")
            );
        }

        // Phase 2: validate jobs and their tag references.
        let mut jobs: Vec<JobSpec> = Vec::with_capacity(self.jobs.len());
        let mut referenced: BTreeSet<&str> = BTreeSet::new();

        for (idx, raw) in self.jobs.iter().enumerate() {
            if raw.priority.trim().is_empty() {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "job #{} has an empty priority label",
                        idx
                    ))
                );
            }

            for tag in &raw.properties {
                if !self.properties.contains_key(tag) {
                    bail!(
                        "{}",
                        diagnostics::error_message(format!(
                            "job #{} (priority '{}') references unknown property '{}'",
                            idx, raw.priority, tag
                        ))
                    );
                }
                referenced.insert(tag.as_str());
            }

            jobs.push(JobSpec {
                priority: raw.priority.clone(),
                tags: raw.properties.clone(),
            });
        }

        // Phase 3: flag table entries no job uses. Not fatal, but usually a
        // typo on the table side that the unknown-tag check cannot see.
        for tag in self.properties.keys() {
            if !referenced.contains(tag.as_str()) {
                diagnostics::warn(format!(
                    "property '{}' is defined but referenced by no job",
                    tag
                ));
            }
        }

        Ok(ValidatedMatrix {
            table: self.properties.clone(),
            jobs,
            cache: self.cache.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(json: &str) -> MatrixSpec {
        serde_json::from_str(json).expect("test matrix must parse")
    }

    #[test]
    fn valid_matrix_builds() {
        let m = spec(
            r#"{
                "properties": {
                    "build": {"stage": ["build"]},
                    "linux": {"os": "linux"}
                },
                "jobs": [
                    {"priority": "0", "properties": ["build", "linux"]}
                ],
                "cache": ["$HOME/usr/"]
            }"#,
        );
        let v = m.validate_and_build().unwrap();
        assert_eq!(v.jobs.len(), 1);
        assert_eq!(
            v.jobs[0],
            JobSpec {
                priority: "0".to_string(),
                tags: vec!["build".to_string(), "linux".to_string()],
            }
        );
        assert_eq!(v.cache, vec!["$HOME/usr/".to_string()]);
        assert!(v.table.contains_key("build"));
    }

    #[test]
    fn unknown_tag_fails() {
        let m = spec(
            r#"{
                "properties": {"build": {"stage": ["build"]}},
                "jobs": [{"priority": "0", "properties": ["build", "g++-7"]}]
            }"#,
        );
        let err = m.validate_and_build().unwrap_err();
        assert!(err.to_string().contains("unknown property 'g++-7'"));
    }

    #[test]
    fn non_mapping_property_fails() {
        let m = spec(
            r#"{
                "properties": {"j1": ["MAKE_PARALLEL=-j1"]},
                "jobs": [{"priority": "0", "properties": ["j1"]}]
            }"#,
        );
        let err = m.validate_and_build().unwrap_err();
        assert!(err.to_string().contains("must be a mapping fragment"));
    }

    #[test]
    fn empty_job_list_fails() {
        let m = spec(r#"{"properties": {}, "jobs": []}"#);
        let err = m.validate_and_build().unwrap_err();
        assert!(err.to_string().contains("no jobs"));
    }

    #[test]
    fn empty_priority_fails() {
        let m = spec(
            r#"{
                "properties": {"build": {"stage": ["build"]}},
                "jobs": [{"priority": "  ", "properties": ["build"]}]
            }"#,
        );
        let err = m.validate_and_build().unwrap_err();
        assert!(err.to_string().contains("empty priority label"));
    }
}
