//! Line selectors and the names recipes can see.
//!
//! A recipe line ending in `# [expr]` only applies where `expr` holds.
//! Selectors are Python-style boolean expressions (`win`, `not osx`,
//! `py>=36 and linux64`, `target_platform == "osx-64"`) evaluated as minijinja
//! expressions against [`namespace`]. Unknown names are undefined and false.

use c3i_core::{Platform, Variant};
use minijinja::{Environment, Value};
use std::collections::BTreeMap;

/// Names visible to selectors and templates on `platform` under `variant`.
///
/// Variant entries come first as strings. Platform flags follow and win on a
/// clash: `linux`/`osx`/`win`, `unix`, `<family><arch>` (`linux64`), the
/// architecture itself when it is a name (`aarch64`), `x86`/`x86_64`,
/// `target_platform`, plus the integer forms `py` (`3.12` gives `312`) and
/// `np`/`npy` with `py2k`, `py3k` and `py<NN>` flags.
#[must_use]
pub fn namespace(platform: &Platform, variant: &Variant) -> BTreeMap<String, Value> {
    let mut names: BTreeMap<String, Value> = variant
        .iter()
        .map(|(key, value)| (key.to_string(), Value::from(value)))
        .collect();

    let family = platform.family.as_str();
    let arch = platform.arch.as_str();
    let subdir = platform.subdir();
    for known in ["linux", "osx", "win"] {
        names.insert(known.to_string(), Value::from(family == known));
    }
    names.insert(
        "unix".to_string(),
        Value::from(matches!(family, "linux" | "osx")),
    );
    names.insert(format!("{family}{arch}"), Value::from(true));
    if arch.starts_with(|c: char| c.is_ascii_alphabetic()) {
        names.insert(arch.to_string(), Value::from(true));
    }
    names.insert("x86".to_string(), Value::from(matches!(arch, "32" | "64")));
    names.insert("x86_64".to_string(), Value::from(arch == "64"));
    names.insert("target_platform".to_string(), Value::from(subdir.clone()));
    names.insert("build_platform".to_string(), Value::from(subdir));

    if let Some(py) = variant.get("python").and_then(series_number) {
        names.insert("py".to_string(), Value::from(py));
        names.insert("py2k".to_string(), Value::from((20..30).contains(&py)));
        names.insert("py3k".to_string(), Value::from((30..40).contains(&py)));
        names.insert(format!("py{py}"), Value::from(true));
    }
    if let Some(np) = variant.get("numpy").and_then(series_number) {
        names.insert("np".to_string(), Value::from(np));
        names.insert("npy".to_string(), Value::from(np));
    }
    names
}

/// `3.12.1` becomes `312`: the first two components run together.
fn series_number(version: &str) -> Option<i64> {
    let digits: String = version.split('.').take(2).collect();
    digits.parse().ok()
}

/// Evaluate selector `expr` against `names`.
///
/// # Errors
///
/// Returns the minijinja error for an expression that does not parse or
/// fails to evaluate.
pub fn evaluate(
    env: &Environment<'_>,
    expr: &str,
    names: &BTreeMap<String, Value>,
) -> Result<bool, minijinja::Error> {
    Ok(env.compile_expression(expr)?.eval(names)?.is_true())
}
