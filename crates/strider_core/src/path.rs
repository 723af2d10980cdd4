use std::borrow::Borrow;
use std::fmt;

/// Separator between bone names in a [`BonePath`].
pub const PATH_SEPARATOR: char = '/';

/// Slash-delimited identifier of a bone relative to the export root.
///
/// `"Armature/hips/leg_L/foot_L"` names the bone `foot_L`, whose parent is
/// `"Armature/hips/leg_L"`. Leading and trailing separators are dropped on
/// construction so that every non-top-level path has exactly one parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BonePath(String);

impl BonePath {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let trimmed = path.trim_matches(PATH_SEPARATOR);
        if trimmed.len() == path.len() {
            Self(path)
        } else {
            Self(trimmed.to_string())
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment (the bone's own name).
    #[must_use]
    pub fn name(&self) -> &str {
        leaf_name(&self.0)
    }

    /// The path with its last segment removed, or `None` for a top-level bone.
    #[must_use]
    pub fn parent(&self) -> Option<BonePath> {
        parent_str(&self.0).map(|p| BonePath(p.to_string()))
    }

    /// Number of segments. The empty path has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.matches(PATH_SEPARATOR).count() + 1
        }
    }

    /// Ancestor paths, nearest parent first.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        std::iter::successors(parent_str(&self.0), |&p| parent_str(p))
    }

    /// True if `self` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &str) -> bool {
        self.0.len() > ancestor.len()
            && self.0.starts_with(ancestor)
            && self.0[ancestor.len()..].starts_with(PATH_SEPARATOR)
    }
}

fn parent_str(path: &str) -> Option<&str> {
    path.rfind(PATH_SEPARATOR).map(|idx| &path[..idx])
}

fn leaf_name(path: &str) -> &str {
    path.rfind(PATH_SEPARATOR).map_or(path, |idx| &path[idx + 1..])
}

impl fmt::Display for BonePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for BonePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BonePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BonePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for BonePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_strips_last_segment() {
        let path = BonePath::new("Armature/hips/foot_L");
        assert_eq!(path.parent(), Some(BonePath::new("Armature/hips")));
        assert_eq!(path.name(), "foot_L");
        assert_eq!(path.depth(), 3);
        assert_eq!(BonePath::new("root").parent(), None);
    }

    #[test]
    fn separators_are_trimmed() {
        assert_eq!(BonePath::new("/root/hips/").as_str(), "root/hips");
    }

    #[test]
    fn ancestors_nearest_first() {
        let path = BonePath::new("a/b/c/d");
        let ancestors: Vec<&str> = path.ancestors().collect();
        assert_eq!(ancestors, vec!["a/b/c", "a/b", "a"]);
    }

    #[test]
    fn descendant_requires_segment_boundary() {
        let path = BonePath::new("root/hips/foot_L");
        assert!(path.is_descendant_of("root"));
        assert!(path.is_descendant_of("root/hips"));
        assert!(!path.is_descendant_of("root/hip"));
        assert!(!path.is_descendant_of("root/hips/foot_L"));
    }
}
