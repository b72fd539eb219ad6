//! Replays the behavioural suites in `cases/*.json` against the compiler and
//! the prop checker. Each file holds a list of suites:
//!
//! ```json
//! [{
//!   "describe": "simple object",
//!   "shape": { "people": true },
//!   "cases": [
//!     { "it": "should pass", "props": { "people": "hi" } },
//!     { "it": "should fail when missing prop", "props": {},
//!       "warn": ["Failed propType", "Required prop `.*` was not specified in `Component`"] }
//!   ]
//! }]
//! ```
//!
//! `warn` patterns are regexes matched against the first warning printed for
//! the render, as a browser test would inspect the console.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use falcor_shapes::{Location, falcor_shapes_prop_types};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static CASES_DIR: Lazy<PathBuf> = Lazy::new(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("cases"));

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Suite {
    describe: String,
    shape: Value,
    #[serde(default)]
    optional: bool,
    #[serde(default = "default_component")]
    component: String,
    #[serde(default)]
    compile: CompileExpect,
    #[serde(default)]
    cases: Vec<Case>,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum CompileExpect {
    #[default]
    Ok,
    Error,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    it: String,
    props: Value,
    #[serde(default)]
    warn: Option<Vec<String>>,
}

#[derive(Debug)]
struct Outcome {
    name: String,
    failure: Option<String>,
}

fn default_component() -> String {
    "Component".to_owned()
}

fn load_suites(dir: &Path) -> Result<Vec<Suite>, String> {
    let entries = std::fs::read_dir(dir).map_err(|e| format!("cannot read {}: {e}", dir.display()))?;
    let mut paths = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect::<Vec<_>>();
    paths.sort();

    let mut out = Vec::new();
    for path in paths {
        let source = std::fs::read_to_string(&path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let de = &mut serde_json::Deserializer::from_str(&source);
        let suites = serde_path_to_error::deserialize::<_, Vec<Suite>>(de).map_err(|err| {
            format!("{}: at JSON path {} → {}", path.display(), err.path(), err.inner())
        })?;
        out.extend(suites);
    }
    Ok(out)
}

fn run_suite(suite: &Suite) -> Vec<Outcome> {
    let compiled = falcor_shapes_prop_types(&suite.shape, suite.optional);
    let types = match (&suite.compile, compiled) {
        (CompileExpect::Ok, Ok(types)) => types,
        (CompileExpect::Error, Err(_)) => {
            return vec![Outcome { name: format!("{} compiles with an error", suite.describe), failure: None }];
        }
        (CompileExpect::Ok, Err(err)) => {
            return vec![Outcome {
                name: format!("{} compiles", suite.describe),
                failure: Some(format!("unexpected configuration error: {err}")),
            }];
        }
        (CompileExpect::Error, Ok(_)) => {
            return vec![Outcome {
                name: format!("{} compiles with an error", suite.describe),
                failure: Some("compiled without error".to_owned()),
            }];
        }
    };

    let mut outcomes = vec![Outcome { name: format!("{} compiles", suite.describe), failure: None }];
    outcomes.extend(suite.cases.iter().map(|case| {
        let name = format!("{} {}", suite.describe, case.it);
        let first_warning = types
            .check_value(&case.props, &suite.component, Location::Prop)
            .first()
            .map(|failure| failure.warning());
        Outcome { name, failure: judge(case.warn.as_deref(), first_warning.as_deref()) }
    }));
    outcomes
}

fn judge(expected: Option<&[String]>, warning: Option<&str>) -> Option<String> {
    match (expected, warning) {
        (None, None) => None,
        (None, Some(warning)) => Some(format!("unexpected warning: {warning}")),
        (Some(_), None) => Some("expected a warning, none was printed".to_owned()),
        (Some(patterns), Some(warning)) => patterns.iter().find_map(|pattern| match Regex::new(pattern) {
            Err(err) => Some(format!("bad pattern {pattern:?}: {err}")),
            Ok(rx) if !rx.is_match(warning) => Some(format!("warning {warning:?} does not match {pattern:?}")),
            Ok(_) => None,
        }),
    }
}

fn run_all(dir: &Path) -> Result<Vec<Outcome>, String> {
    let mut outcomes = Vec::new();
    for suite in load_suites(dir)? {
        outcomes.extend(run_suite(&suite));
    }
    Ok(outcomes)
}

fn main() -> ExitCode {
    let outcomes = match run_all(&CASES_DIR) {
        Ok(outcomes) => outcomes,
        Err(error) => {
            eprintln!("❌ {error}");
            return ExitCode::FAILURE;
        }
    };
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.failure {
            None => eprintln!("✅ {}", outcome.name),
            Some(why) => {
                failed += 1;
                eprintln!("❌ {}: {why}", outcome.name);
            }
        }
    }
    eprintln!("{} cases, {failed} failed", outcomes.len());
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_case_files_pass() {
        let outcomes = run_all(&CASES_DIR).unwrap();
        assert!(!outcomes.is_empty());
        let failures = outcomes
            .iter()
            .filter_map(|o| o.failure.as_ref().map(|why| format!("{}: {why}", o.name)))
            .collect::<Vec<_>>();
        assert!(failures.is_empty(), "{failures:#?}");
    }

    #[test]
    fn judge_matches_every_pattern() {
        let warning = "Failed propType: Required prop `people` was not specified in `Component`.";
        let patterns = vec!["Failed propType".to_owned(), "Required prop `.*` was not specified".to_owned()];
        assert_eq!(judge(Some(patterns.as_slice()), Some(warning)), None);
        let other = vec!["expected `object`".to_owned()];
        assert!(judge(Some(other.as_slice()), Some(warning)).is_some());
        assert!(judge(None, Some(warning)).is_some());
        assert!(judge(Some(patterns.as_slice()), None).is_some());
    }
}
