//! Version intervals in NuGet range notation.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::{SemanticVersion, VersionError};

/// An immutable interval of semantic versions.
///
/// An empty bound means "unbounded" on that side. With both bounds empty the
/// range accepts any version. Notation:
///
/// | Range                         | Text            |
/// |-------------------------------|-----------------|
/// | any                           | (empty string)  |
/// | `v <= x`                      | `1.2.3`         |
/// | `v < x`                       | `(1.2.3,)`      |
/// | `x <= v`                      | `(,2.0.0]`      |
/// | `x < v`                       | `(,2.0.0)`      |
/// | `a <= x < b`                  | `[1.0.0,2.0.0)` |
/// | `x == v`                      | `[1.2.3]`       |
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SemanticVersionRange {
    minimum: SemanticVersion,
    maximum: SemanticVersion,
    minimum_inclusive: bool,
    maximum_inclusive: bool,
}

impl SemanticVersionRange {
    /// The range accepting every version.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn exactly(version: SemanticVersion) -> Self {
        Self::between(version.clone(), version, true, true)
    }

    pub fn at_least_including(version: SemanticVersion) -> Self {
        Self::between(version, SemanticVersion::empty(), true, false)
    }

    pub fn at_least_excluding(version: SemanticVersion) -> Self {
        Self::between(version, SemanticVersion::empty(), false, false)
    }

    pub fn until_including(version: SemanticVersion) -> Self {
        Self::between(SemanticVersion::empty(), version, false, true)
    }

    pub fn until_excluding(version: SemanticVersion) -> Self {
        Self::between(SemanticVersion::empty(), version, false, false)
    }

    pub fn between_including(minimum: SemanticVersion, maximum: SemanticVersion) -> Self {
        Self::between(minimum, maximum, true, true)
    }

    pub fn between_excluding(minimum: SemanticVersion, maximum: SemanticVersion) -> Self {
        Self::between(minimum, maximum, false, false)
    }

    /// `[minimum, maximum)`
    pub fn between_including_minimum(minimum: SemanticVersion, maximum: SemanticVersion) -> Self {
        Self::between(minimum, maximum, true, false)
    }

    /// `(minimum, maximum]`
    pub fn between_including_maximum(minimum: SemanticVersion, maximum: SemanticVersion) -> Self {
        Self::between(minimum, maximum, false, true)
    }

    /// General constructor. An empty bound is unbounded and its inclusivity
    /// flag is ignored.
    pub fn between(
        minimum: SemanticVersion,
        maximum: SemanticVersion,
        minimum_inclusive: bool,
        maximum_inclusive: bool,
    ) -> Self {
        let minimum_inclusive = minimum_inclusive && !minimum.is_empty();
        let maximum_inclusive = maximum_inclusive && !maximum.is_empty();

        Self {
            minimum: minimum.without_metadata(),
            maximum: maximum.without_metadata(),
            minimum_inclusive,
            maximum_inclusive,
        }
    }

    pub fn minimum(&self) -> &SemanticVersion {
        &self.minimum
    }

    pub fn maximum(&self) -> &SemanticVersion {
        &self.maximum
    }

    pub fn is_minimum_inclusive(&self) -> bool {
        self.minimum_inclusive
    }

    pub fn is_maximum_inclusive(&self) -> bool {
        self.maximum_inclusive
    }

    /// True when both bounds are open, i.e. every version satisfies the range.
    pub fn is_any(&self) -> bool {
        self.minimum.is_empty() && self.maximum.is_empty()
    }

    pub fn is_exact(&self) -> bool {
        !self.is_any()
            && self.minimum == self.maximum
            && self.minimum_inclusive
            && self.maximum_inclusive
    }

    pub fn contains(&self, version: &SemanticVersion) -> bool {
        if self.is_any() {
            return true;
        }

        let above_minimum = self.minimum.is_empty()
            || match version.cmp(&self.minimum) {
                Ordering::Greater => true,
                Ordering::Equal => self.minimum_inclusive,
                Ordering::Less => false,
            };

        let below_maximum = self.maximum.is_empty()
            || match version.cmp(&self.maximum) {
                Ordering::Less => true,
                Ordering::Equal => self.maximum_inclusive,
                Ordering::Greater => false,
            };

        above_minimum && below_maximum
    }

    /// Parse range notation.
    ///
    /// The empty string is the any range, `[v]` is exact and a bare `v` is an
    /// inclusive lower bound. Bounds accept the loose `major.minor` form.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::any());
        }

        let invalid = || VersionError::Range(text.to_string());
        let bound = |token: &str| SemanticVersion::parse_loose(token).map_err(|_| invalid());

        let (open, rest) = match text.as_bytes()[0] {
            b @ (b'[' | b'(') => (Some(b), &text[1..]),
            _ => (None, text),
        };
        let (close, inner) = match rest.as_bytes().last() {
            Some(&b @ (b']' | b')')) => (Some(b), &rest[..rest.len() - 1]),
            _ => (None, rest),
        };

        let tokens: Vec<&str> = inner.split(',').map(str::trim).collect();
        match tokens.as_slice() {
            &[single] => {
                let version = bound(single)?;
                match (open, close) {
                    (Some(b'['), Some(b']')) => Ok(Self::exactly(version)),
                    (None, None) => Ok(Self::at_least_including(version)),
                    _ => Err(invalid()),
                }
            }
            &["", ""] => Err(invalid()),
            &["", maximum] => {
                if open != Some(b'(') {
                    return Err(invalid());
                }
                let maximum = bound(maximum)?;
                match close {
                    Some(b']') => Ok(Self::until_including(maximum)),
                    Some(_) => Ok(Self::until_excluding(maximum)),
                    None => Err(invalid()),
                }
            }
            &[minimum, ""] => {
                if close != Some(b')') {
                    return Err(invalid());
                }
                let minimum = bound(minimum)?;
                if open == Some(b'[') {
                    Ok(Self::at_least_including(minimum))
                } else {
                    Ok(Self::at_least_excluding(minimum))
                }
            }
            &[minimum, maximum] => {
                let minimum = bound(minimum)?;
                let maximum = bound(maximum)?;
                let minimum_inclusive = open == Some(b'[');
                let maximum_inclusive = close == Some(b']');

                match minimum.cmp(&maximum) {
                    Ordering::Greater => Err(invalid()),
                    Ordering::Equal if !(minimum_inclusive && maximum_inclusive) => Err(invalid()),
                    _ => Ok(Self::between(
                        minimum,
                        maximum,
                        minimum_inclusive,
                        maximum_inclusive,
                    )),
                }
            }
            _ => Err(invalid()),
        }
    }

    /// Non-failing variant of [`SemanticVersionRange::parse`].
    pub fn try_parse(text: &str) -> Option<Self> {
        Self::parse(text).ok()
    }
}

impl fmt::Display for SemanticVersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minimum = self.minimum.to_string_with(false);
        let maximum = self.maximum.to_string_with(false);

        match (self.minimum.is_empty(), self.maximum.is_empty()) {
            (true, true) => Ok(()),
            (false, true) if self.minimum_inclusive => f.write_str(&minimum),
            (false, true) => write!(f, "({},)", minimum),
            (true, false) if self.maximum_inclusive => write!(f, "(,{}]", maximum),
            (true, false) => write!(f, "(,{})", maximum),
            (false, false) if self.is_exact() => write!(f, "[{}]", minimum),
            (false, false) => write!(
                f,
                "{}{},{}{}",
                if self.minimum_inclusive { '[' } else { '(' },
                minimum,
                maximum,
                if self.maximum_inclusive { ']' } else { ')' }
            ),
        }
    }
}

impl FromStr for SemanticVersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SemanticVersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
