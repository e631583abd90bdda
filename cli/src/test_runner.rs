//! Runner for `.test.md` conformance files.
//!
//! A test file is TOML between `---` lines followed by the document:
//!
//! ```text
//! ---
//! description = "theorem is numbered"
//! format = "html"
//! expect_contains = ['id="0.1"']
//! ---
//! Theorem: x {}
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use engine::{Format, FsAssets, NumberingOptions, Options, Output};
use mdt::Issue;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based line of the
    /// expanded source.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub format: Format,

    #[serde(default)]
    pub numbering: NumberingOptions,

    #[serde(default = "default_sections")]
    pub sections: bool,

    #[serde(default)]
    pub render: BTreeMap<String, String>,

    /// Exact rendered content (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Substrings the content must contain.
    #[serde(default)]
    pub expect_contains: Vec<String>,

    /// Substrings the content must not contain.
    #[serde(default)]
    pub expect_absent: Vec<String>,

    /// Expected warnings. If present (even empty), count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

fn default_sections() -> bool {
    true
}

impl TestConfig {
    fn options(&self) -> Options {
        Options {
            format: self.format,
            sections: self.sections,
            numbering: self.numbering.clone(),
            render: self.render.clone(),
            ..Options::default()
        }
    }
}

/// Split a `.test.md` file into its TOML config and the document.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let after_open = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
        .ok_or("missing opening --- delimiter")?;

    let mut offset = 0;
    let mut close = None;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == "---" {
            close = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let (toml_end, body_start) = close.ok_or("missing closing --- delimiter")?;
    let toml_str = &after_open[..toml_end];
    let document = &after_open[body_start..];

    let config = toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, document))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description
            .as_deref()
            .or_else(|| self.path.file_stem().and_then(|s| s.to_str()))
            .unwrap_or("?")
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let mut result = TestResult {
        path: path.to_path_buf(),
        description: None,
        outcome: TestOutcome::Pass,
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            result.outcome = TestOutcome::Fail(format!("cannot read file: {}", e));
            return result;
        }
    };
    let (config, document) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            result.outcome = TestOutcome::Fail(format!("frontmatter error: {}", e));
            return result;
        }
    };
    result.description = config.description.clone();

    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let output = engine::convert_with(document, 0, &config.options(), &FsAssets::new(base_dir));

    if let Some(reason) = check_output(&config, &output).or_else(|| check_warnings(&config, &output)) {
        result.outcome = TestOutcome::Fail(reason);
    }
    result
}

fn check_output(config: &TestConfig, output: &Output) -> Option<String> {
    let actual = output.content.trim();

    if let Some(expected) = &config.expect_output {
        let expected = expected.trim();
        if actual != expected {
            return Some(format!(
                "output mismatch\n  expected:\n{}\n  actual:\n{}",
                indent(expected),
                indent(actual)
            ));
        }
    }
    if let Some(missing) = config.expect_contains.iter().find(|s| !actual.contains(s.as_str())) {
        return Some(format!("output does not contain \"{}\"\n  actual:\n{}", missing, indent(actual)));
    }
    if let Some(present) = config.expect_absent.iter().find(|s| actual.contains(s.as_str())) {
        return Some(format!("output unexpectedly contains \"{}\"", present));
    }
    None
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Compare issues against expectations, in order.
fn check_warnings(config: &TestConfig, output: &Output) -> Option<String> {
    let expected = config.expect_warnings.as_ref()?;
    let actual: &[Issue] = &output.issues;

    if actual.len() != expected.len() {
        let listed: Vec<String> = actual.iter().map(|w| format!("    - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            if listed.is_empty() {
                "    (none)".to_string()
            } else {
                listed.join("\n")
            }
        ));
    }

    for (i, (issue, want)) in actual.iter().zip(expected).enumerate() {
        let message = issue.message();
        if !message.contains(&want.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, want.contains, message
            ));
        }
        let Some(line) = want.line else {
            continue;
        };
        match &issue.span {
            Some(span) => {
                let actual_line = byte_offset_to_line(&output.source, span.start);
                if actual_line != line {
                    return Some(format!(
                        "warning[{}]: expected on line {}, but span is on line {}",
                        i, line, actual_line
                    ));
                }
            }
            None => {
                return Some(format!(
                    "warning[{}]: expected on line {}, but warning has no span",
                    i, line
                ));
            }
        }
    }
    None
}

/// `.test.md` files under `root` grouped by subfolder. Files directly in
/// `root` get the category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".test.md"));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }
}

/// Select the categories to run. Unknown names are reported and skipped.
fn select<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> Vec<(&'a str, &'a [PathBuf])> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected: BTreeMap<&str, &[PathBuf]> = BTreeMap::new();
    for name in requested {
        let name = name.trim_matches('/');
        let prefix = format!("{}/", name);
        let before = selected.len();
        for (category, files) in all {
            if category == name || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                name,
                available.join(", ")
            );
        }
    }
    selected.into_iter().collect()
}

/// Run all `.test.md` files under `path` (or a single file), optionally
/// restricted to `categories`. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { color: !no_color };

    let groups: Vec<(String, Vec<PathBuf>)> = if path.is_file() {
        vec![(String::new(), vec![path.to_path_buf()])]
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }
        select(&all, categories)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect()
    };
    if groups.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();
    let single = path.is_file();

    for (category, files) in &groups {
        if !single {
            eprintln!();
            eprintln!("{}", style.paint("1", category_label(category)));
        }
        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("31", "FAILED"),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_config_and_document() {
        let (config, document) = parse_test_file(
            "---\ndescription = \"d\"\nformat = \"latex\"\nexpect_contains = [\"x\"]\n\n[numbering]\ndepth_limit = 0\n---\nTheorem: x {}\n",
        )
        .unwrap();
        assert_eq!(config.description.as_deref(), Some("d"));
        assert_eq!(config.format, Format::Latex);
        assert_eq!(config.numbering.depth_limit, 0);
        assert!(config.sections);
        assert_eq!(document, "Theorem: x {}\n");
    }

    #[test]
    fn document_may_have_its_own_front_matter() {
        let (_, document) = parse_test_file("---\n---\n---\ntitle = \"t\"\n---\nBody").unwrap();
        assert_eq!(document, "---\ntitle = \"t\"\n---\nBody");
    }

    #[test]
    fn rejects_missing_delimiters() {
        assert!(parse_test_file("no front matter").is_err());
        assert!(parse_test_file("---\nnever closed").is_err());
    }

    #[test]
    fn warning_lines_use_expanded_source() {
        let (config, document) = parse_test_file(
            "---\n[[expect_warnings]]\ncontains = \"unterminated Lemma\"\nline = 3\n---\nIntro.\n\nLemma: open\n",
        )
        .unwrap();
        let output = engine::convert(document, &config.options());
        assert_eq!(check_warnings(&config, &output), None);
    }
}
