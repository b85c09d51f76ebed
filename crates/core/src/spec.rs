//! Dependency specifications and constraint matching.
//!
//! Requirements are conda match specs, e.g. `numpy >=1.11,<2 py36*` or
//! `python>=3.8`, parsed leniently by `rattler_conda_types`. Recipes write a
//! bare version (`numpy 1.11`) to mean any release in that series, and use
//! `any` or the hashed placeholder `anyh<hex>` for "no constraint"; both are
//! normalized before parsing.

use crate::error::{Error, Result};
use rattler_conda_types::{MatchSpec, ParseStrictness, Version, VersionSpec};
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Length of the hash placeholder appended to `any` (`anyh1a2b3c4`).
const HASH_LENGTH: usize = 7;

const OPERATORS: [&str; 8] = ["==", ">=", "<=", "!=", "~=", ">", "<", "="];

/// One requirement: a package name plus optional version and build matchers.
///
/// Equality and display use the requirement as written.
#[derive(Debug, Clone)]
pub struct DependencySpec {
    /// Normalized package name
    pub name: String,
    spec: MatchSpec,
    raw: String,
}

impl DependencySpec {
    /// Parse one requirement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDependency`] for blank input, a spec without a
    /// package name, or anything the match-spec parser rejects.
    pub fn parse(requirement: &str) -> Result<Self> {
        let raw = requirement.split_whitespace().collect::<Vec<_>>().join(" ");
        if raw.is_empty() {
            return Err(Error::invalid_dependency(requirement, "empty requirement"));
        }
        let spec = MatchSpec::from_str(&normalize(&raw), ParseStrictness::Lenient)
            .map_err(|e| Error::invalid_dependency(&raw, e.to_string()))?;
        let name = spec
            .name
            .as_ref()
            .map(|n| n.as_normalized().to_string())
            .ok_or_else(|| Error::invalid_dependency(&raw, "no package name"))?;
        Ok(Self { name, spec, raw })
    }

    /// Whether the spec constrains the version at all.
    #[must_use]
    pub fn has_version(&self) -> bool {
        !matches!(self.spec.version, None | Some(VersionSpec::Any))
    }

    /// Whether `version` satisfies the version matcher. Unparsable versions
    /// only satisfy an unconstrained spec.
    #[must_use]
    pub fn matches_version(&self, version: &str) -> bool {
        self.spec.version.as_ref().is_none_or(|spec| {
            Version::from_str(version).is_ok_and(|version| spec.matches(&version))
        })
    }

    /// Whether `build` satisfies the build-string matcher.
    #[must_use]
    pub fn matches_build(&self, build: &str) -> bool {
        self.spec
            .build
            .as_ref()
            .is_none_or(|matcher| matcher.matches(build))
    }

    /// Whether a package `name`/`version`/`build` satisfies this requirement.
    #[must_use]
    pub fn is_satisfied_by(&self, name: &str, version: &str, build: &str) -> bool {
        self.name == name && self.matches_version(version) && self.matches_build(build)
    }
}

impl FromStr for DependencySpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for DependencySpec {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for DependencySpec {}

impl Hash for DependencySpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for DependencySpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Rewrite the space-separated form into what the match-spec parser expects.
///
/// `>= 1.2` is joined into `>=1.2`, placeholders become `*` and a bare
/// version `1.11` becomes the series `1.11.*`.
fn normalize(raw: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut parts = raw.split(' ');
    while let Some(part) = parts.next() {
        if OPERATORS.contains(&part) {
            if let Some(next) = parts.next() {
                tokens.push(format!("{part}{next}"));
                continue;
            }
        }
        tokens.push(part.to_string());
    }

    let Some((name, rest)) = tokens.split_first_mut() else {
        return String::new();
    };
    if let Some(version) = rest.first_mut() {
        if is_any_placeholder(version) {
            *version = "*".to_string();
        } else if is_bare_version(version) {
            version.push_str(".*");
        }
    }
    if let Some(build) = rest.get_mut(1) {
        if is_any_placeholder(build) {
            *build = "*".to_string();
        }
    }

    let rest: &[String] = if rest.len() == 1 && rest[0] == "*" { &[] } else { rest };
    let mut normalized = name.clone();
    for token in rest {
        normalized.push(' ');
        normalized.push_str(token);
    }
    normalized
}

fn is_bare_version(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '!'))
}

fn is_any_placeholder(raw: &str) -> bool {
    let Some(rest) = raw.strip_prefix("any") else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    rest.strip_prefix('h').is_some_and(|hash| {
        hash.len() == HASH_LENGTH && hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    })
}

/// Parse a list of requirement strings.
///
/// Blank entries are dropped. When a name appears more than once the later
/// entry replaces the earlier one at the earlier one's position.
///
/// # Errors
///
/// Returns the first [`Error::InvalidDependency`].
pub fn parse_requirements<I, S>(requirements: I) -> Result<Vec<DependencySpec>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut specs: Vec<DependencySpec> = Vec::new();
    for requirement in requirements {
        let requirement = requirement.as_ref();
        if requirement.trim().is_empty() {
            continue;
        }
        let spec = DependencySpec::parse(requirement)?;
        if let Some(existing) = specs.iter_mut().find(|s| s.name == spec.name) {
            *existing = spec;
        } else {
            specs.push(spec);
        }
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spec(raw: &str) -> DependencySpec {
        DependencySpec::parse(raw).unwrap()
    }

    #[test]
    fn test_any_placeholders() {
        assert!(!spec("zlib any").has_version());
        assert!(!spec("zlib anyh1a2b3c4").has_version());
        assert!(!spec("zlib *").has_version());
        assert!(spec("zlib anyh1a2b3c4 anyh1a2b3c4").matches_build("h0_0"));
        assert!(spec("zlib").matches_version("1.0"));
    }

    #[test]
    fn test_parse_requirement_parts() {
        let numpy = spec("numpy >=1.11 py36*");
        assert_eq!(numpy.name, "numpy");
        assert!(numpy.matches_version("1.12"));
        assert!(!numpy.matches_version("1.10"));
        assert!(numpy.matches_build("py36h1234567_0"));
        assert!(!numpy.matches_build("py27h1234567_0"));

        let bare = spec("zlib");
        assert!(!bare.has_version());
        assert!(bare.matches_build("anything"));
    }

    #[test]
    fn test_operator_without_space() {
        let python = spec("python>=3.6");
        assert_eq!(python.name, "python");
        assert!(python.matches_version("3.12.1"));
        assert!(!python.matches_version("2.7.18"));
        assert_eq!(python.to_string(), "python>=3.6");
    }

    #[test]
    fn test_operator_split_from_version() {
        let python = spec("python >= 3.6");
        assert!(python.matches_version("3.6.0"));
        assert!(!python.matches_version("3.5"));
    }

    #[test]
    fn test_invalid_requirements() {
        assert!(matches!(
            DependencySpec::parse("   "),
            Err(Error::InvalidDependency { .. })
        ));
        assert!(matches!(
            DependencySpec::parse(">=1.0"),
            Err(Error::InvalidDependency { ref requirement, .. }) if requirement == ">=1.0"
        ));
    }

    #[test]
    fn test_later_requirement_wins_in_place() {
        let specs = parse_requirements(["python", "", "numpy 1.11", "six", "numpy 1.12"]).unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["python", "numpy", "six"]);
        assert_eq!(specs[1].to_string(), "numpy 1.12");
    }

    #[test]
    fn test_invalid_entry_fails_the_list() {
        assert!(parse_requirements(["zlib", ">=1.0"]).is_err());
    }

    #[test]
    fn test_version_operators() {
        let v = |s: &str, version: &str| spec(&format!("pkg {s}")).matches_version(version);
        assert!(v(">=1.11", "1.11.0"));
        assert!(v(">=1.11,<2", "1.12"));
        assert!(!v(">=1.11,<2", "2.0"));
        assert!(v("<1.10|>=1.12", "1.13"));
        assert!(!v("<1.10|>=1.12", "1.11"));
        assert!(v("==1.0", "1.0.0"));
        assert!(v("!=1.0", "1.0.1"));
        assert!(v("~=1.4.2", "1.4.5"));
        assert!(!v("~=1.4.2", "1.5.0"));
    }

    #[test]
    fn test_excluded_series() {
        let not_12 = spec("pkg !=1.2.*");
        assert!(!not_12.matches_version("1.2.5"));
        assert!(not_12.matches_version("1.3.0"));
    }

    #[test]
    fn test_bare_version_is_a_series() {
        let v = |s: &str, version: &str| spec(&format!("pkg {s}")).matches_version(version);
        assert!(v("1.11", "1.11.3"));
        assert!(v("1.11", "1.11"));
        assert!(!v("1.1", "1.11.0"));
        assert!(v("1.2.*", "1.2.8"));
        assert!(!v("1.2.*", "1.3"));
    }

    #[test]
    fn test_version_ordering() {
        assert!(spec("pkg >1.9").matches_version("1.10"));
        assert!(spec("pkg <1.1.0").matches_version("1.1.0rc1"));
    }

    #[test]
    fn test_unparsable_candidate_version() {
        assert!(!spec("pkg >=1").matches_version(""));
        assert!(spec("pkg").matches_version(""));
    }

    #[test]
    fn test_is_satisfied_by() {
        let libpng = spec("libpng 1.6 h1*");
        assert!(libpng.is_satisfied_by("libpng", "1.6.34", "h1234567_0"));
        assert!(!libpng.is_satisfied_by("libpng", "1.5.0", "h1234567_0"));
        assert!(!libpng.is_satisfied_by("libpng", "1.6.34", "h7654321_0"));
        assert!(!libpng.is_satisfied_by("zlib", "1.6.34", "h1234567_0"));
    }

    #[test]
    fn test_display_keeps_requirement_as_written() {
        assert_eq!(spec("zlib").to_string(), "zlib");
        assert_eq!(spec("zlib  1.2.*").to_string(), "zlib 1.2.*");
        assert_eq!(spec("zlib * h1_0").to_string(), "zlib * h1_0");
    }

    proptest! {
        #[test]
        fn prop_version_satisfies_itself(parts in prop::collection::vec(0u64..200, 1..5)) {
            let version = parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
            for constraint in [version.clone(), format!("=={version}"), format!(">={version}")] {
                let dep = DependencySpec::parse(&format!("pkg {constraint}")).unwrap();
                prop_assert!(dep.matches_version(&version));
            }
        }
    }
}
