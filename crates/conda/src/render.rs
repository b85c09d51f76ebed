//! `meta.yaml` rendering.
//!
//! Rendering follows conda-build's order: `# [selector]` lines are filtered
//! first, the remaining text is rendered as a Jinja template, and the result
//! is read as YAML. The template sees the variant and the selector namespace.
//! `compiler()`, `pin_compatible()` and `pin_subpackage()` render to plain
//! package names, since no build environment exists at planning time.

use crate::selector;
use c3i_core::{Error, Platform, RecipeRenderer, RenderedRecipe, Result, Variant, scalar};
use minijinja::value::{Rest, Value};
use minijinja::{Environment, State};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const META_FILE: &str = "meta.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetaYaml {
    #[serde(deserialize_with = "or_default")]
    package: PackageSection,
    #[serde(deserialize_with = "or_default")]
    build: BuildSection,
    #[serde(deserialize_with = "or_default")]
    requirements: RequirementsSection,
    #[serde(deserialize_with = "or_default")]
    test: TestSection,
}

#[derive(Debug, Default, Deserialize)]
struct PackageSection {
    #[serde(default, deserialize_with = "scalar::opt_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "scalar::opt_string")]
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BuildSection {
    #[serde(default, deserialize_with = "scalar::opt_string")]
    number: Option<String>,
    #[serde(default, deserialize_with = "scalar::opt_string")]
    string: Option<String>,
    #[serde(default)]
    skip: serde_yaml::Value,
    #[serde(default)]
    noarch: serde_yaml::Value,
}

#[derive(Debug, Default, Deserialize)]
struct RequirementsSection {
    #[serde(default, deserialize_with = "scalar::string_list")]
    build: Vec<String>,
    #[serde(default, deserialize_with = "scalar::string_list")]
    host: Vec<String>,
    #[serde(default, deserialize_with = "scalar::string_list")]
    run: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TestSection {
    #[serde(default, deserialize_with = "scalar::string_list")]
    requires: Vec<String>,
}

/// An empty section (`build:` with nothing under it) reads as its default.
fn or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn truthy(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Null => false,
        serde_yaml::Value::Bool(b) => *b,
        serde_yaml::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_yaml::Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "no" | "0"
        ),
        _ => true,
    }
}

type CacheKey = (PathBuf, Variant, String);

/// Renders `meta.yaml` recipes for the engine.
pub struct MetaYamlRenderer {
    env: Environment<'static>,
    selector: Regex,
    cache: RefCell<HashMap<CacheKey, RenderedRecipe>>,
}

impl MetaYamlRenderer {
    /// Create a renderer with an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the selector pattern fails to compile.
    pub fn new() -> Result<Self> {
        let selector = Regex::new(r"^(.*?)\s*#\s*\[([^\]]*)\]\s*$")
            .map_err(|e| Error::config(format!("invalid selector pattern: {e}")))?;

        let mut env = Environment::new();
        env.add_function("compiler", compiler);
        env.add_function("pin_compatible", pinned_name);
        env.add_function("pin_subpackage", pinned_name);

        Ok(Self {
            env,
            selector,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Number of cached renders.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Render recipe `text` belonging to `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Recipe`] for template or selector errors, invalid
    /// YAML or a missing package name or version, and
    /// [`Error::InvalidDependency`] for a requirement that does not parse.
    pub fn render_text(
        &self,
        dir: &Path,
        text: &str,
        variant: &Variant,
        platform: &Platform,
    ) -> Result<RenderedRecipe> {
        let names = selector::namespace(platform, variant);
        let selected = self.select_lines(dir, text, &names)?;
        let yaml = self
            .env
            .render_str(&selected, &names)
            .map_err(|e| Error::recipe(dir, format!("template error: {e}")))?;
        let meta: MetaYaml =
            serde_yaml::from_str(&yaml).map_err(|e| Error::recipe(dir, e.to_string()))?;

        let name = meta
            .package
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::recipe(dir, "missing package.name"))?;
        let version = meta
            .package
            .version
            .filter(|version| !version.is_empty())
            .ok_or_else(|| Error::recipe(dir, "missing package.version"))?;
        let number = meta.build.number.unwrap_or_else(|| "0".to_string());
        let build_id = match meta.build.string {
            Some(string) => string,
            None => format!("h{}_{number}", build_hash(&name, &version, text, variant)),
        };

        RenderedRecipe::new(name, version, build_id)
            .skipped(truthy(&meta.build.skip))
            .noarch(truthy(&meta.build.noarch))
            .with_build_deps(meta.requirements.build.iter().chain(&meta.requirements.host))?
            .with_run_deps(&meta.requirements.run)?
            .with_test_deps(&meta.test.requires)
    }

    /// Drop lines whose selector is false and strip the selector comment
    /// from the rest.
    fn select_lines(
        &self,
        dir: &Path,
        text: &str,
        names: &BTreeMap<String, Value>,
    ) -> Result<String> {
        let mut selected = String::with_capacity(text.len());
        for raw in text.lines() {
            let line = match self.selector.captures(raw) {
                Some(caps) => {
                    let expr = caps.get(2).map_or("", |m| m.as_str());
                    let applies = selector::evaluate(&self.env, expr, names).map_err(|e| {
                        Error::recipe(dir, format!("invalid selector [{expr}]: {e}"))
                    })?;
                    if !applies {
                        continue;
                    }
                    caps.get(1).map_or("", |m| m.as_str())
                }
                None => raw,
            };
            selected.push_str(line);
            selected.push('\n');
        }
        Ok(selected)
    }
}

/// `compiler('c')` names the platform's compiler package, e.g.
/// `gcc_linux-64`, or the variant's `c_compiler` when set.
fn compiler(state: &State, language: String) -> String {
    let lookup = |name: &str| {
        state
            .lookup(name)
            .filter(|value| !value.is_undefined() && !value.is_none())
            .map(|value| value.to_string())
    };
    let subdir = lookup("target_platform").unwrap_or_default();
    let family = subdir.split('-').next().unwrap_or_default();
    let package = lookup(&format!("{language}_compiler"))
        .unwrap_or_else(|| default_compiler(family, &language));
    format!("{package}_{subdir}")
}

fn default_compiler(family: &str, language: &str) -> String {
    let name = match (family, language) {
        ("linux", "c") => "gcc",
        ("linux", "cxx") => "gxx",
        ("osx", "c") => "clang",
        ("osx", "cxx") => "clangxx",
        ("win", "c" | "cxx") => "vs2017",
        (_, "fortran") => "gfortran",
        (_, other) => other,
    };
    name.to_string()
}

/// Pins resolve against a build environment; here they stay bare names.
fn pinned_name(name: String, _options: Rest<Value>) -> String {
    name
}

impl RecipeRenderer for MetaYamlRenderer {
    #[instrument(skip_all, fields(dir = %dir.display(), platform = %platform.label))]
    fn render(
        &self,
        dir: &Path,
        variant: &Variant,
        platform: &Platform,
    ) -> Result<Option<RenderedRecipe>> {
        let key = (dir.to_path_buf(), variant.clone(), platform.subdir());
        if let Some(hit) = self.cache.borrow().get(&key) {
            return Ok(Some(hit.clone()));
        }
        let Some(path) = meta_path(dir) else {
            return Ok(None);
        };

        let text = std::fs::read_to_string(&path).map_err(|e| Error::io(e, &path, "read recipe"))?;
        let recipe = self.render_text(dir, &text, variant, platform)?;
        debug!(
            package = recipe.name(),
            version = recipe.version(),
            build_id = recipe.build_id(),
            skip = recipe.skip(),
            "Rendered recipe"
        );

        self.cache.borrow_mut().insert(key, recipe.clone());
        Ok(Some(recipe))
    }

    fn recognizes(&self, dir: &Path) -> bool {
        meta_path(dir).is_some()
    }
}

fn meta_path(dir: &Path) -> Option<PathBuf> {
    [dir.join(META_FILE), dir.join("recipe").join(META_FILE)]
        .into_iter()
        .find(|p| p.is_file())
}

/// First seven hex digits of the hash over the package identity and the
/// variant entries the recipe text mentions, in key order.
fn build_hash(name: &str, version: &str, text: &str, variant: &Variant) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(version.as_bytes());
    hasher.update([0u8]);

    let mut used: Vec<(&str, &str)> = variant.iter().filter(|(k, _)| text.contains(k)).collect();
    used.sort_unstable();
    for (key, value) in used {
        hasher.update(key.as_bytes());
        hasher.update([b'=']);
        hasher.update(value.as_bytes());
        hasher.update([0u8]);
    }

    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(7);
    digest
}
