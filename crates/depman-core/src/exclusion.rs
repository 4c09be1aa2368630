//! Maven exclusion patterns and the per-dependency exclusions map.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::coordinates::ModuleId;

/// Matches any group or artifact.
pub const WILDCARD: &str = "*";

/// A pattern suppressing transitive dependencies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Exclusion {
    /// `group:artifact`, where either side may be [`WILDCARD`].
    Pattern { group: String, artifact: String },
    /// A declaration that was not of the form `group:artifact`. Never matches.
    Malformed(String),
}

impl Exclusion {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self::Pattern {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    /// Parse a build-declared `group:artifact` pattern.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((group, artifact))
                if !group.is_empty() && !artifact.is_empty() && !artifact.contains(':') =>
            {
                Self::new(group, artifact)
            }
            _ => {
                tracing::warn!("Ignoring malformed exclusion '{s}', expected group:artifact");
                Self::Malformed(s.to_string())
            }
        }
    }

    pub fn matches(&self, id: &ModuleId) -> bool {
        match self {
            Self::Pattern { group, artifact } => {
                (group == WILDCARD || *group == id.group)
                    && (artifact == WILDCARD || *artifact == id.artifact)
            }
            Self::Malformed(_) => false,
        }
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern { group, artifact } => write!(f, "{group}:{artifact}"),
            Self::Malformed(raw) => f.write_str(raw),
        }
    }
}

/// Exclusion patterns keyed by the dependency that declares them.
///
/// The patterns registered for `g:a` apply to the dependencies of `g:a`,
/// never to `g:a` itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    entries: BTreeMap<ModuleId, BTreeSet<Exclusion>>,
}

impl Exclusions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, owner: ModuleId, exclusions: impl IntoIterator<Item = Exclusion>) {
        let mut exclusions = exclusions.into_iter().peekable();
        if exclusions.peek().is_none() {
            return;
        }
        self.entries.entry(owner).or_default().extend(exclusions);
    }

    /// Merge every entry of `other` into this map.
    pub fn add_all(&mut self, other: &Exclusions) {
        for (owner, exclusions) in &other.entries {
            self.add(owner.clone(), exclusions.iter().cloned());
        }
    }

    pub fn exclusions_for(&self, owner: &ModuleId) -> Option<&BTreeSet<Exclusion>> {
        self.entries.get(owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleId, &BTreeSet<Exclusion>)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
