//! Version-aware tag ordering.

use std::str::FromStr;

/// A tag parsed into a sortable key.
///
/// Within one image name group, tags order as:
/// numeric versions (pre-releases before their final release), then tags
/// that do not parse as dotted numbers, then `latest`.
///
/// ```
/// use kiln::version::VersionKey;
///
/// assert!(VersionKey::parse("1.2.0-alpha") < VersionKey::parse("1.2.0"));
/// assert!(VersionKey::parse("1.2.0") < VersionKey::parse("1.2.1"));
/// assert!(VersionKey::parse("1.2.1") < VersionKey::parse("latest"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionKey {
    /// A dotted-numeric version, flattened into comparable segments.
    Numeric(Vec<Segment>),
    /// A tag that failed numeric parsing, compared lexicographically.
    Opaque(String),
    /// The literal tag `latest`, greater than every other key.
    Latest,
}

/// One element of a numeric version key.
///
/// A version `N(.N)*` becomes its numbers followed by `Num(1)`; a
/// pre-release `N(.N)*-suffix` becomes its numbers followed by `Num(0)`
/// and `Pre(suffix)`, so the pre-release sorts strictly before the final
/// release of the same version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    /// A numeric component.
    Num(u64),
    /// A pre-release suffix.
    Pre(String),
}

impl VersionKey {
    /// The tag that always sorts last.
    pub const LATEST: &'static str = "latest";

    /// Parse a tag string into a sortable key. Never fails; tags that do
    /// not look like dotted numbers become [`VersionKey::Opaque`].
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        if tag == Self::LATEST {
            return Self::Latest;
        }

        let (version, pre) = match tag.split_once('-') {
            Some((version, pre)) => (version, Some(pre)),
            None => (tag, None),
        };

        let mut segments = Vec::new();
        for part in version.split('.') {
            match part.parse::<u64>() {
                Ok(n) => segments.push(Segment::Num(n)),
                Err(_) => return Self::Opaque(tag.to_string()),
            }
        }

        match pre {
            Some(suffix) => {
                segments.push(Segment::Num(0));
                segments.push(Segment::Pre(suffix.to_string()));
            }
            None => segments.push(Segment::Num(1)),
        }

        Self::Numeric(segments)
    }
}

impl FromStr for VersionKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(tags: &[&str]) -> Vec<String> {
        let mut tags: Vec<String> = tags.iter().map(ToString::to_string).collect();
        tags.sort_by_key(|t| VersionKey::parse(t));
        tags
    }

    #[test]
    fn latest_sorts_last() {
        for tag in ["1.0", "99.99.99", "2.0-rc1", "edge"] {
            assert!(VersionKey::parse(tag) < VersionKey::parse("latest"), "{tag}");
        }
    }

    #[test]
    fn numeric_order_is_not_lexicographic() {
        assert!(VersionKey::parse("1.9") < VersionKey::parse("1.10"));
    }

    #[test]
    fn pre_release_before_final() {
        assert!(VersionKey::parse("1.2.0-alpha") < VersionKey::parse("1.2.0"));
        assert!(VersionKey::parse("1.2.0") < VersionKey::parse("1.2.1"));
    }

    #[test]
    fn pre_releases_compare_by_suffix() {
        assert!(VersionKey::parse("2.0-alpha") < VersionKey::parse("2.0-beta"));
    }

    #[test]
    fn mixed_tag_group_sorts_as_documented() {
        assert_eq!(
            sorted(&["1.10", "1.9", "latest", "2.0-beta", "2.0"]),
            vec!["1.9", "1.10", "2.0-beta", "2.0", "latest"]
        );
    }

    #[test]
    fn opaque_between_numeric_and_latest() {
        assert!(VersionKey::parse("9.9") < VersionKey::parse("edge"));
        assert!(VersionKey::parse("edge") < VersionKey::parse("latest"));
        assert!(VersionKey::parse("alpine-edge") < VersionKey::parse("bookworm"));
    }

    #[test]
    fn opaque_when_any_segment_is_not_a_number() {
        assert!(matches!(VersionKey::parse("v1.0"), VersionKey::Opaque(_)));
        assert!(matches!(VersionKey::parse("1.x"), VersionKey::Opaque(_)));
        assert!(matches!(VersionKey::parse(""), VersionKey::Opaque(_)));
    }

    #[test]
    fn suffix_split_is_on_first_dash() {
        // "1.0-rc-2" -> version "1.0", suffix "rc-2"
        assert!(VersionKey::parse("1.0-rc-1") < VersionKey::parse("1.0-rc-2"));
        assert!(VersionKey::parse("1.0-rc-2") < VersionKey::parse("1.0"));
    }
}
