//! Minimal CLI: shape → (validator tree | props check)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use tracing::{debug, info};

use crate::compiler::{CollectionMode, CompileOptions, DEFAULT_MAX_RANGE_ENTRIES};
use crate::error::{Location, PropValidationFailure};
use crate::report::PropTypeReporter;
use crate::shape::ShapeMap;
use crate::validator::PropTypes;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile Falcor path shapes into prop validators, or check JSON props against them
#[derive(Parser, Debug)]
#[command(name = "falcor-shapes")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile a shape and print the validator tree as JSON
    Compile(CompileOut),
    /// check props documents against a compiled shape
    Check(CheckIn),
}

#[derive(Args, Debug, Clone)]
struct ShapeSettings {
    /// JSON file holding the Falcor shape
    #[arg(long, short)]
    shape: PathBuf,

    /// mark every field optional
    #[arg(long, default_value_t = false)]
    optional: bool,

    /// how `$` ranges compile
    #[arg(long, value_enum, default_value_t = CollectionMode::Sparse)]
    collections: CollectionMode,

    /// refuse ranges with more entries than this
    #[arg(long, default_value_t = DEFAULT_MAX_RANGE_ENTRIES)]
    max_range_entries: u64,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select the props in each document (e.g. /data/props)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    #[command(flatten)]
    shape_settings: ShapeSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckIn {
    #[command(flatten)]
    shape_settings: ShapeSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// component name used in failure messages
    #[arg(long, default_value = "Component")]
    component: String,

    /// where the checked values come from
    #[arg(long, value_enum, default_value_t = Location::Prop)]
    location: Location,

    /// print each distinct failure message only the first time it is seen
    #[arg(long, default_value_t = false)]
    warn_once: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ShapeSettings {
    fn options(&self) -> CompileOptions {
        CompileOptions {
            optional: self.optional,
            collections: self.collections,
            max_range_entries: self.max_range_entries,
        }
    }

    fn load_compile(&self) -> Result<PropTypes> {
        let shape_path = self.shape.to_string_lossy().to_string();
        let source = std::fs::read_to_string(&self.shape)
            .with_context(|| format!("failed to read shape file ({shape_path})"))?;
        let value = crate::path_de::from_str_with_path::<Value>(&source)
            .with_context(|| format!("failed to parse shape file ({shape_path})"))?;
        let shape = ShapeMap::from_value(&value)
            .with_context(|| format!("invalid shape ({shape_path})"))?;
        let types = crate::compiler::compile(&shape, &self.options())
            .with_context(|| format!("failed to compile shape ({shape_path})"))?;
        debug!(shape = %shape_path, props = types.len(), "loaded shape");
        Ok(types)
    }
}

impl InputSettings {
    /// Calls `apply` with a label and the selected props of every input document.
    fn load_process(&self, mut apply: impl FnMut(&str, Value)) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            if self.ndjson {
                for (ix, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let label = format!("{source_path_str}:{}", ix + 1);
                    let value = parse_document(line, &label)?;
                    apply(&label, self.select(value, &label)?);
                }
            } else {
                let value = parse_document(&source, &source_path_str)?;
                apply(&source_path_str, self.select(value, &source_path_str)?);
            }
        }
        Ok(())
    }

    fn select(&self, value: Value, label: &str) -> Result<Value> {
        match self.json_pointer.as_deref() {
            None => Ok(value),
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} matched nothing in {label}")),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns `false` when a checked document failed validation.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Compile(target) => {
                let types = target.shape_settings.load_compile()?;
                let description = crate::emit::describe(&types);
                let description_src = serde_json::to_string_pretty(&description)?;
                write_output(target.out.as_deref(), &description_src)?;
                Ok(true)
            }
            Command::Check(target) => {
                let types = target.shape_settings.load_compile()?;
                let location = target.location;
                let mut reporter = PropTypeReporter::new();
                let mut checked = 0usize;
                let mut failed = 0usize;

                target.input_settings.load_process(|label, props| {
                    checked += 1;
                    let mut failures = types.check_value(&props, &target.component, location);
                    if failures.is_empty() {
                        println!("{} {label}", "✓".green());
                        return;
                    }
                    failed += 1;
                    if target.warn_once {
                        failures = reporter.report(failures);
                    }
                    for line in failure_lines(label, &failures) {
                        println!("{line}");
                    }
                })?;

                info!(checked, failed, "check finished");
                let summary = format!("{checked} checked, {failed} failed");
                if failed == 0 {
                    println!("{}", summary.green());
                } else {
                    println!("{}", summary.red());
                }
                Ok(failed == 0)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_document(source: &str, label: &str) -> Result<Value> {
    crate::path_de::from_str_with_path::<Value>(source)
        .with_context(|| format!("failed to parse JSON source ({label})"))
}

/// Verdict and warnings for a failing document. With `--warn-once` every
/// failure may already have been printed, leaving only a note.
fn failure_lines(label: &str, failures: &[PropValidationFailure]) -> Vec<String> {
    if failures.is_empty() {
        return vec![format!("{} {label} {}", "✗".red(), "(already reported)".dimmed())];
    }
    std::iter::once(format!("{} {label}", "✗".red()))
        .chain(failures.iter().map(|failure| format!("    {}", failure.warning().yellow())))
        .collect()
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{contents}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn cli(args: &[&str]) -> CommandLineInterface {
        CommandLineInterface::try_parse_from(std::iter::once("falcor-shapes").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn globs_and_literals_resolve() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", "{}");
        write(dir.path(), "b.json", "{}");
        write(dir.path(), "c.txt", "");

        let pattern = format!("{}/*.json", dir.path().display());
        let literal = format!("{}/c.txt", dir.path().display());
        let paths = resolve_file_path_patterns([pattern.as_str(), literal.as_str()]).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("a.json"));
        assert!(paths[1].ends_with("b.json"));

        let nothing = format!("{}/*.ndjson", dir.path().display());
        assert!(resolve_file_path_patterns([nothing.as_str()]).is_err());
    }

    #[test]
    fn compile_writes_description() {
        let dir = tempfile::tempdir().unwrap();
        let shape = write(dir.path(), "shape.json", r#"{"people": {"name": true}}"#);
        let out = dir.path().join("out/tree.json");

        let passed = cli(&[
            "compile",
            "--shape",
            shape.to_str().unwrap(),
            "--optional",
            "-o",
            out.to_str().unwrap(),
        ])
        .run()
        .unwrap();
        assert!(passed);

        let written: Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(written["people"]["required"], Value::Bool(false));
        assert_eq!(written["people"]["fields"]["name"]["type"], "any");
    }

    #[test]
    fn check_reports_pass_and_fail() {
        let dir = tempfile::tempdir().unwrap();
        let shape = write(
            dir.path(),
            "shape.json",
            r#"{"people": {"$": [{"from": 0, "to": 1}, {"name": true}]}}"#,
        );
        write(dir.path(), "good.json", r#"{"props": {"people": {"0": {"name": "hi"}}}}"#);
        let shape = shape.to_str().unwrap();
        let good = format!("{}/good.json", dir.path().display());

        let passed = cli(&["check", "-s", shape, "--json-pointer", "/props", "-i", good.as_str()])
            .run()
            .unwrap();
        assert!(passed);

        let lines = write(dir.path(), "props.ndjson", "{\"people\": {}}\n\n{\"people\": []}\n");
        let passed = cli(&["check", "-s", shape, "--ndjson", "-i", lines.to_str().unwrap()])
            .run()
            .unwrap();
        assert!(!passed);
    }

    #[test]
    fn check_surfaces_bad_shapes_and_pointers() {
        let dir = tempfile::tempdir().unwrap();
        let bad_shape = write(dir.path(), "bad.json", r#"{"people": {"$": [{"from": 0}, true]}}"#);
        let props = write(dir.path(), "props.json", "{}");
        let props = props.to_str().unwrap();

        let err = cli(&["check", "-s", bad_shape.to_str().unwrap(), "-i", props])
            .run()
            .unwrap_err();
        assert!(format!("{err:#}").contains("Must specify either `to` or `length`"));

        let shape = write(dir.path(), "shape.json", r#"{"people": true}"#);
        let err = cli(&["check", "-s", shape.to_str().unwrap(), "--json-pointer", "/nope", "-i", props])
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("/nope"));
    }

    #[test]
    fn repeated_failures_collapse_under_warn_once() {
        let types = crate::compiler::falcor_shapes_prop_types(&json!({"people": true}), false).unwrap();
        let mut reporter = PropTypeReporter::new();

        let first = reporter.report(types.check_value(&json!({}), "Component", Location::Prop));
        let lines = failure_lines("a.json", &first);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Required prop `people` was not specified in `Component`."));

        let second = reporter.report(types.check_value(&json!({}), "Component", Location::Prop));
        assert!(second.is_empty());
        let lines = failure_lines("b.json", &second);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("b.json"));
        assert!(lines[0].contains("already reported"));

        let dir = tempfile::tempdir().unwrap();
        let shape = write(dir.path(), "shape.json", r#"{"people": true}"#);
        let props = write(dir.path(), "props.ndjson", "{}\n{}\n");
        let passed = cli(&[
            "check",
            "-s",
            shape.to_str().unwrap(),
            "--ndjson",
            "--warn-once",
            "-i",
            props.to_str().unwrap(),
        ])
        .run()
        .unwrap();
        assert!(!passed);
    }

    #[test]
    fn location_flag_accepts_every_location() {
        for (flag, location) in [
            ("prop", Location::Prop),
            ("context", Location::Context),
            ("child-context", Location::ChildContext),
        ] {
            let parsed = cli(&["check", "-s", "x.json", "-i", "p.json", "--location", flag]);
            let Command::Check(target) = &parsed.cmd else {
                panic!("expected check");
            };
            assert_eq!(target.location, location);
        }
        let unknown = ["falcor-shapes", "check", "-s", "x", "-i", "p", "--location", "props"];
        assert!(CommandLineInterface::try_parse_from(unknown).is_err());
    }

    #[test]
    fn flags_map_to_options() {
        let parsed = cli(&["compile", "-s", "x.json", "--collections", "dense", "--max-range-entries", "4"]);
        let Command::Compile(target) = &parsed.cmd else {
            panic!("expected compile");
        };
        assert_eq!(
            target.shape_settings.options(),
            CompileOptions { optional: false, collections: CollectionMode::Dense, max_range_entries: 4 }
        );
    }
}
