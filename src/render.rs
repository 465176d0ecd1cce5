//! Render the final CI configuration document.
//!
//! The document is a fixed template; the ordered job configs and the cache
//! directory list are serialized to YAML and substituted in, re-indented to
//! fit their sections. The template carries everything that does not vary
//! per job.

use crate::Result;
use crate::fragment::Fragment;
use crate::resolve::ResolvedJob;

use std::collections::BTreeMap;

const TEMPLATE: &str = "# Generated by cigen. Do not edit; change matrix.json and regenerate.

cache:
  directories:
__CACHE__

jobs:
  include:
__JOBS__
";

pub fn render_config(jobs: &[ResolvedJob], cache: &[String]) -> Result<String> {
    let configs: Vec<&BTreeMap<String, Fragment>> = jobs.iter().map(|j| &j.config).collect();

    let jobs_yaml = serde_yaml::to_string(&configs)?;
    let cache_yaml = serde_yaml::to_string(&cache)?;

    Ok(TEMPLATE
        .replace("__CACHE__", &indent(&cache_yaml, "    "))
        .replace("__JOBS__", &indent(&jobs_yaml, "    ")))
}

/// Prefix every non-empty line so a YAML block nests under its section.
fn indent(text: &str, prefix: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn job(priority: &str, config_json: &str) -> ResolvedJob {
        let config: BTreeMap<String, Fragment> =
            serde_json::from_str(config_json).expect("test config must parse");
        ResolvedJob {
            priority: priority.to_string(),
            tags: vec![],
            config,
        }
    }

    #[test]
    fn renders_jobs_and_cache() {
        let jobs = vec![
            job(
                "0-clang",
                r#"{"stage": ["build"], "os": "linux", "env": ["CC=clang-6.0"]}"#,
            ),
            job("2-macos", r#"{"stage": ["build"], "os": "osx"}"#),
        ];
        let cache = vec!["$HOME/usr/".to_string(), "build/resources".to_string()];

        let text = render_config(&jobs, &cache).unwrap();

        assert!(!text.contains("__JOBS__"));
        assert!(!text.contains("__CACHE__"));
        assert!(text.contains("    - $HOME/usr/\n"));
        assert!(text.contains("    - build/resources\n"));
        assert!(text.contains("    - env:\n"));
        assert!(text.contains("      os: linux\n"));
        assert!(text.contains("    - os: osx\n"));
    }

    #[test]
    fn job_order_is_preserved_in_output() {
        let jobs = vec![
            job("b", r#"{"os": "osx", "stage": ["build"]}"#),
            job("a", r#"{"os": "linux", "stage": ["build"]}"#),
        ];
        let text = render_config(&jobs, &[]).unwrap();

        let osx = text.find("os: osx").unwrap();
        let linux = text.find("os: linux").unwrap();
        assert!(osx < linux, "renderer must not reorder jobs");
    }

    #[test]
    fn indent_skips_empty_lines() {
        assert_eq!(indent("a\n\nb\n", "  "), "  a\n\n  b");
    }
}
