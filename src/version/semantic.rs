//! Semantic versions with SemVer 2.0 precedence.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use log::warn;
use serde::{Serialize, Serializer};

use super::{SemanticVersionRange, VersionError};

/// An immutable semantic version.
///
/// The all-zero version without identifiers or metadata is the *empty*
/// version. It means "unspecified" and orders below every concrete version.
/// Build metadata is carried along but never takes part in ordering,
/// equality or hashing.
#[derive(Debug, Clone, Default)]
pub struct SemanticVersion {
    major: u64,
    minor: u64,
    patch: u64,
    pre_release: Vec<String>,
    metadata: Vec<String>,
}

impl SemanticVersion {
    /// Create a release version without identifiers.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// The empty (unspecified) version.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a version with pre-release identifiers and build metadata.
    ///
    /// Every identifier must match `[0-9A-Za-z-]+`.
    pub fn with_identifiers<P, M>(
        major: u64,
        minor: u64,
        patch: u64,
        pre_release: P,
        metadata: M,
    ) -> Result<Self, VersionError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Ok(Self {
            major,
            minor,
            patch,
            pre_release: collect_identifiers(pre_release)?,
            metadata: collect_identifiers(metadata)?,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn pre_release(&self) -> &[String] {
        &self.pre_release
    }

    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    pub fn is_empty(&self) -> bool {
        self.major == 0
            && self.minor == 0
            && self.patch == 0
            && self.pre_release.is_empty()
            && self.metadata.is_empty()
    }

    pub fn is_pre_release(&self) -> bool {
        !self.pre_release.is_empty()
    }

    /// Next major version. Pre-release identifiers are dropped, metadata kept.
    ///
    /// `None` when the major component is already at its maximum.
    pub fn raise_major(&self) -> Option<Self> {
        Some(self.bumped(self.major.checked_add(1)?, 0, 0))
    }

    /// Next minor version. Pre-release identifiers are dropped, metadata kept.
    pub fn raise_minor(&self) -> Option<Self> {
        Some(self.bumped(self.major, self.minor.checked_add(1)?, 0))
    }

    /// Next patch version. Pre-release identifiers are dropped, metadata kept.
    pub fn raise_patch(&self) -> Option<Self> {
        Some(self.bumped(self.major, self.minor, self.patch.checked_add(1)?))
    }

    /// Replace the pre-release identifiers.
    ///
    /// At least one identifier is required.
    pub fn declare_pre_release<I>(&self, identifiers: I) -> Result<Self, VersionError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let pre_release = collect_identifiers(identifiers)?;
        if pre_release.is_empty() {
            return Err(VersionError::Identifier(String::new()));
        }

        Ok(Self {
            pre_release,
            ..self.clone()
        })
    }

    /// Drop the pre-release identifiers.
    pub fn declare_final(&self) -> Self {
        Self {
            pre_release: Vec::new(),
            ..self.clone()
        }
    }

    /// Replace the build metadata.
    ///
    /// At least one token is required.
    pub fn with_metadata<I>(&self, metadata: I) -> Result<Self, VersionError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let metadata = collect_identifiers(metadata)?;
        if metadata.is_empty() {
            return Err(VersionError::Identifier(String::new()));
        }

        Ok(Self {
            metadata,
            ..self.clone()
        })
    }

    pub fn without_metadata(&self) -> Self {
        Self {
            metadata: Vec::new(),
            ..self.clone()
        }
    }

    /// The range of versions compatible with this one:
    /// `[major.minor.0, (major+1).0.0)`.
    ///
    /// The empty version is compatible with anything. A version whose major
    /// component cannot be raised has no upper bound.
    pub fn compatible_range(&self) -> SemanticVersionRange {
        if self.is_empty() {
            return SemanticVersionRange::any();
        }

        let minimum = Self::new(self.major, self.minor, 0);
        match self.major.checked_add(1) {
            Some(major) => SemanticVersionRange::between_including_minimum(minimum, Self::new(major, 0, 0)),
            None => {
                warn!("Version {} has no next major version, leaving the range open", self);
                SemanticVersionRange::at_least_including(minimum)
            }
        }
    }

    /// Canonical text, optionally with build metadata.
    pub fn to_string_with(&self, include_metadata: bool) -> String {
        if self.is_empty() {
            return "0.0.0".to_string();
        }

        let mut text = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if !self.pre_release.is_empty() {
            text.push('-');
            text.push_str(&self.pre_release.join("."));
        }
        if include_metadata && !self.metadata.is_empty() {
            text.push('+');
            text.push_str(&self.metadata.join("."));
        }
        text
    }

    /// Parse `major.minor.patch[-pre.release][+build.metadata]`.
    ///
    /// Numeric parts must not have leading zeros. Surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VersionError::Empty);
        }

        let invalid = || VersionError::Format(text.to_string());

        let (rest, metadata) = match text.split_once('+') {
            Some((rest, metadata)) => (rest, Some(metadata)),
            None => (text, None),
        };
        let (core, pre_release) = match rest.split_once('-') {
            Some((core, pre_release)) => (core, Some(pre_release)),
            None => (rest, None),
        };

        let numbers = core
            .split('.')
            .map(parse_strict_number)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;
        let &[major, minor, patch] = numbers.as_slice() else {
            return Err(invalid());
        };

        let split = |part: Option<&str>| -> Result<Vec<String>, VersionError> {
            match part {
                None => Ok(Vec::new()),
                Some(part) => collect_identifiers(part.split('.')).map_err(|_| invalid()),
            }
        };

        Ok(Self {
            major,
            minor,
            patch,
            pre_release: split(pre_release)?,
            metadata: split(metadata)?,
        })
    }

    /// Non-failing variant of [`SemanticVersion::parse`].
    pub fn try_parse(text: &str) -> Option<Self> {
        Self::parse(text).ok()
    }

    /// Parse a strict semantic version, falling back to the numeric
    /// `major.minor[.patch[.revision]]` form used by MSBuild.
    ///
    /// A missing patch defaults to 0; a revision is dropped.
    pub fn parse_loose(text: &str) -> Result<Self, VersionError> {
        let strict = match Self::parse(text) {
            Ok(version) => return Ok(version),
            Err(err) => err,
        };

        let numbers = text
            .trim()
            .split('.')
            .map(|part| {
                if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
                    part.parse::<u64>().ok()
                } else {
                    None
                }
            })
            .collect::<Option<Vec<_>>>();

        match numbers.as_deref() {
            Some([major, minor]) => Ok(Self::new(*major, *minor, 0)),
            Some([major, minor, patch]) | Some([major, minor, patch, _]) => {
                Ok(Self::new(*major, *minor, *patch))
            }
            _ => Err(strict),
        }
    }

    fn bumped(&self, major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: Vec::new(),
            metadata: self.metadata.clone(),
        }
    }
}

fn parse_strict_number(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

fn is_valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn collect_identifiers<I>(identifiers: I) -> Result<Vec<String>, VersionError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    identifiers
        .into_iter()
        .map(Into::into)
        .map(|identifier| {
            if is_valid_identifier(&identifier) {
                Ok(identifier)
            } else {
                Err(VersionError::Identifier(identifier))
            }
        })
        .collect()
}

fn is_numeric(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

fn trim_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}

/// Numeric identifiers may exceed `u64`, so compare them as digit strings.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let (a, b) = (trim_leading_zeros(a), trim_leading_zeros(b));
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_identifier(a: &str, b: &str) -> Ordering {
    match (is_numeric(a), is_numeric(b)) {
        (true, true) => compare_numeric(a, b),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

fn compare_pre_release(a: &[String], b: &[String]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    a.iter()
        .zip(b)
        .map(|(x, y)| compare_identifier(x, y))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| compare_pre_release(&self.pre_release, &other.pre_release))
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_empty().hash(state);
        if self.is_empty() {
            return;
        }
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        for identifier in &self.pre_release {
            if is_numeric(identifier) {
                trim_leading_zeros(identifier).hash(state);
            } else {
                identifier.hash(state);
            }
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(true))
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn v(text: &str) -> SemanticVersion {
        SemanticVersion::parse(text).unwrap()
    }

    #[test]
    fn test_parse_core() {
        let version = v("1.2.3");
        assert_eq!(version.major(), 1);
        assert_eq!(version.minor(), 2);
        assert_eq!(version.patch(), 3);
        assert!(version.pre_release().is_empty());
        assert!(version.metadata().is_empty());
    }

    #[test]
    fn test_parse_identifiers() {
        let version = v("1.0.0-alpha.1+build.5-x");
        assert_eq!(version.pre_release(), ["alpha", "1"]);
        assert_eq!(version.metadata(), ["build", "5-x"]);
        assert!(version.is_pre_release());
    }

    #[test]
    fn test_parse_pre_release_with_hyphen() {
        let version = v("2.0.0-rc-1.x-y");
        assert_eq!(version.pre_release(), ["rc-1", "x-y"]);
    }

    #[test]
    fn test_round_trip() {
        for text in [
            "0.0.1",
            "1.2.3",
            "10.20.30",
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-0.3.7",
            "1.0.0-x.7.z.92",
            "1.0.0+20130313144700",
            "1.0.0-beta+exp.sha.5114f85",
        ] {
            assert_eq!(v(text).to_string(), text);
        }
    }

    #[test]
    fn test_to_string_without_metadata() {
        assert_eq!(v("1.0.0-beta+exp").to_string_with(false), "1.0.0-beta");
    }

    #[test]
    fn test_parse_invalid() {
        for text in [
            "1",
            "1.2",
            "1.2.3.4",
            "01.2.3",
            "1.02.3",
            "a.b.c",
            "1.2.3-",
            "1.2.3-alpha..1",
            "1.2.3+",
            "1.2.3-al_pha",
            "-1.2.3",
        ] {
            assert!(SemanticVersion::parse(text).is_err(), "{text} should fail");
            assert!(SemanticVersion::try_parse(text).is_none());
        }
        assert_eq!(SemanticVersion::parse("  "), Err(VersionError::Empty));
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(SemanticVersion::parse_loose("15.0").unwrap(), v("15.0.0"));
        assert_eq!(SemanticVersion::parse_loose("4.5.1.0").unwrap(), v("4.5.1"));
        assert_eq!(
            SemanticVersion::parse_loose("1.0.0-beta").unwrap(),
            v("1.0.0-beta")
        );
        assert!(SemanticVersion::parse_loose("1").is_err());
        assert!(SemanticVersion::parse_loose("1.x").is_err());
        assert!(SemanticVersion::parse_loose("1.2.3.4.5").is_err());
    }

    #[test]
    fn test_precedence() {
        assert!(!(v("1.0.0") < v("1.0.0-alpha")));
        assert!(v("1.0.0-alpha") < v("1.0.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0-alpha.1"));
        assert!(v("1.0.0-alpha.beta") < v("1.0.0-beta"));
        assert!(v("1.0.0-1") < v("1.0.0-2"));
        assert!(v("1.0.0-2") < v("1.0.0-10"));
        assert!(v("1.0.0-999") < v("1.0.0-alpha"));
    }

    #[test]
    fn test_precedence_chain() {
        let chain = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
            "1.0.1",
            "1.1.0",
            "2.0.0",
        ];
        for pair in chain.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_empty_orders_below_everything() {
        let empty = SemanticVersion::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.to_string(), "0.0.0");
        assert!(empty < v("0.0.0-alpha"));
        assert!(empty < v("0.0.1"));
        assert_eq!(empty, SemanticVersion::default());
    }

    #[test]
    fn test_metadata_ignored_for_equality_and_hash() {
        let a = v("1.0.0+one");
        let b = v("1.0.0+two");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_arithmetic_at_maximum() {
        let top = v("18446744073709551615.18446744073709551615.18446744073709551615");
        assert_eq!(top.raise_major(), None);
        assert_eq!(top.raise_minor(), None);
        assert_eq!(top.raise_patch(), None);
        assert_eq!(v("1.2.18446744073709551615").raise_minor().unwrap().to_string(), "1.3.0");
    }

    #[test]
    fn test_compatible_range_at_maximum_major() {
        let range = v("18446744073709551615.2.0").compatible_range();
        assert_eq!(range.to_string(), "18446744073709551615.2.0");
        assert!(range.contains(&v("18446744073709551615.9.9")));
        assert!(!range.contains(&v("18446744073709551615.1.0")));
    }

    #[test]
    fn test_huge_numeric_identifiers() {
        assert!(v("1.0.0-99999999999999999999") < v("1.0.0-100000000000000000000"));
    }

    #[test]
    fn test_arithmetic() {
        let version = v("1.2.3-beta+meta");
        assert_eq!(version.raise_major().unwrap().to_string(), "2.0.0+meta");
        assert_eq!(version.raise_minor().unwrap().to_string(), "1.3.0+meta");
        assert_eq!(version.raise_patch().unwrap().to_string(), "1.2.4+meta");
        assert_eq!(version.declare_final().to_string(), "1.2.3+meta");
        assert_eq!(version.without_metadata().to_string(), "1.2.3-beta");
        assert_eq!(
            version.declare_pre_release(["rc", "1"]).unwrap().to_string(),
            "1.2.3-rc.1+meta"
        );
        assert_eq!(
            version.with_metadata(["sha", "abc"]).unwrap().to_string(),
            "1.2.3-beta+sha.abc"
        );
    }

    #[test]
    fn test_declare_pre_release_rejects_invalid() {
        let version = v("1.0.0");
        assert!(version.declare_pre_release(Vec::<String>::new()).is_err());
        assert!(version.declare_pre_release(["not valid"]).is_err());
    }

    #[test]
    fn test_with_identifiers_validates() {
        assert!(SemanticVersion::with_identifiers(1, 0, 0, ["ok"], ["b_ad"]).is_err());
        let version = SemanticVersion::with_identifiers(1, 0, 0, ["rc"], ["7"]).unwrap();
        assert_eq!(version.to_string(), "1.0.0-rc+7");
    }

    #[test]
    fn test_compatible_range() {
        let range = v("1.4.2").compatible_range();
        assert_eq!(range.to_string(), "[1.4.0,2.0.0)");
        assert!(range.contains(&v("1.4.9")));
        assert!(!range.contains(&v("1.3.9")));
        assert!(!range.contains(&v("2.0.0")));
    }

    #[test]
    fn test_compatible_range_of_empty_is_any() {
        assert!(SemanticVersion::empty().compatible_range().is_any());
    }

    #[test]
    fn test_from_str_and_serialize() {
        let version: SemanticVersion = "3.1.0-preview.2".parse().unwrap();
        assert_eq!(
            serde_json::to_string(&version).unwrap(),
            "\"3.1.0-preview.2\""
        );
    }
}
