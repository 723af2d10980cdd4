use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use strider_core::BonePath;

use crate::property::{PropertyCurves, PropertyKind};

/// The animated properties of one bone.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveGroup {
    pub path: BonePath,
    properties: SmallVec<[PropertyCurves; 3]>,
}

impl CurveGroup {
    #[must_use]
    pub fn new(path: impl Into<BonePath>) -> Self {
        Self {
            path: path.into(),
            properties: SmallVec::new(),
        }
    }

    /// Builder form of [`CurveGroup::insert`].
    #[must_use]
    pub fn with(mut self, curves: PropertyCurves) -> Self {
        self.insert(curves);
        self
    }

    /// Adds or replaces the curves of one property.
    pub fn insert(&mut self, curves: PropertyCurves) {
        match self.properties.iter_mut().find(|p| p.kind() == curves.kind()) {
            Some(existing) => *existing = curves,
            None => self.properties.push(curves),
        }
    }

    /// Curves of `kind`, or `None` if that property was not animated.
    #[must_use]
    pub fn property(&self, kind: PropertyKind) -> Option<&PropertyCurves> {
        self.properties.iter().find(|p| p.kind() == kind)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyCurves> {
        self.properties.iter()
    }
}

/// Bone path → curve group mapping for one clip.
///
/// Groups live in insertion order; lookups go through a path index so that
/// resolved hierarchies can refer to groups by position.
#[derive(Debug, Clone, Default)]
pub struct CurveGroupSet {
    groups: Vec<CurveGroup>,
    index: FxHashMap<BonePath, usize>,
}

impl CurveGroupSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a group, replacing any previous group for the same path.
    /// Returns the group's index.
    pub fn insert(&mut self, group: CurveGroup) -> usize {
        if let Some(&idx) = self.index.get(&group.path) {
            self.groups[idx] = group;
            return idx;
        }
        let idx = self.groups.len();
        self.index.insert(group.path.clone(), idx);
        self.groups.push(group);
        idx
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.index.get(path).copied()
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&CurveGroup> {
        self.index_of(path).map(|idx| &self.groups[idx])
    }

    #[must_use]
    pub fn by_index(&self, index: usize) -> Option<&CurveGroup> {
        self.groups.get(index)
    }

    #[must_use]
    pub fn property(&self, path: &str, kind: PropertyKind) -> Option<&PropertyCurves> {
        self.get(path)?.property(kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurveGroup> {
        self.groups.iter()
    }

    /// Latest keyframe time across every curve in the set.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.groups
            .iter()
            .flat_map(CurveGroup::properties)
            .filter_map(PropertyCurves::end_time)
            .fold(0.0_f32, f32::max)
    }
}

impl FromIterator<CurveGroup> for CurveGroupSet {
    fn from_iter<I: IntoIterator<Item = CurveGroup>>(iter: I) -> Self {
        let mut set = Self::new();
        for group in iter {
            set.insert(group);
        }
        set
    }
}
