//! Dependency configurations (resolvable scopes) and the local-module registry.

use std::collections::HashSet;
use std::fmt;

use crate::coordinates::{Coordinates, ModuleId};

/// A dependency declared directly on a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredDependency {
    /// An external module. The version is absent when it should be managed.
    Module(Coordinates),
    /// Another module of the same multi-module build, by build path.
    Project(String),
}

impl DeclaredDependency {
    /// The `group:artifact` of an external module dependency.
    pub fn module_id(&self) -> Option<ModuleId> {
        match self {
            Self::Module(coords) => Some(coords.id()),
            Self::Project(_) => None,
        }
    }
}

/// A flat `(group, artifact)` exclude rule, applied everywhere in a
/// configuration's graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExcludeRule {
    pub group: String,
    pub artifact: String,
}

impl ExcludeRule {
    pub fn matches(&self, id: &ModuleId) -> bool {
        self.group == id.group && self.artifact == id.artifact
    }
}

impl From<ModuleId> for ExcludeRule {
    fn from(id: ModuleId) -> Self {
        Self {
            group: id.group,
            artifact: id.artifact,
        }
    }
}

impl fmt::Display for ExcludeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

/// A resolvable dependency scope, e.g. `compileClasspath` or `testRuntime`.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    pub name: String,
    /// Configurations this one extends, nearest first.
    pub extends_from: Vec<String>,
    pub dependencies: Vec<DeclaredDependency>,
    /// Version constraints that take part in resolution without adding edges.
    pub constraints: Vec<Coordinates>,
    pub exclude_rules: Vec<ExcludeRule>,
}

impl Configuration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends_from.push(parent.into());
        self
    }

    pub fn with_dependency(mut self, dependency: DeclaredDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_constraint(mut self, constraint: Coordinates) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// This configuration's name followed by the ones it extends, most
    /// specific first.
    pub fn hierarchy(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.extends_from.iter().map(String::as_str))
    }

    /// Ids of the external modules declared directly on this configuration.
    pub fn direct_dependency_ids(&self) -> HashSet<ModuleId> {
        self.dependencies
            .iter()
            .filter_map(DeclaredDependency::module_id)
            .collect()
    }

    /// A copy with the same dependencies and constraints but no exclude rules,
    /// used to discover the complete transitive graph.
    pub fn dry_run_copy(&self) -> Self {
        Self {
            exclude_rules: Vec::new(),
            ..self.clone()
        }
    }

    /// A copy with `rules` appended to the existing exclude rules.
    pub fn with_exclude_rules(&self, rules: impl IntoIterator<Item = ExcludeRule>) -> Self {
        let mut copy = self.clone();
        for rule in rules {
            if !copy.exclude_rules.contains(&rule) {
                copy.exclude_rules.push(rule);
            }
        }
        copy
    }

    /// Whether a flat exclude rule of this configuration removes `id`.
    pub fn excludes(&self, id: &ModuleId) -> bool {
        self.exclude_rules.iter().any(|rule| rule.matches(id))
    }
}

/// The `group:artifact` ids produced by modules of the current build.
#[derive(Debug, Clone, Default)]
pub struct LocalModules {
    modules: HashSet<ModuleId>,
}

impl LocalModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: ModuleId) {
        self.modules.insert(id);
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains(id)
    }
}

impl FromIterator<ModuleId> for LocalModules {
    fn from_iter<I: IntoIterator<Item = ModuleId>>(iter: I) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}
