//! Resolved dependency graphs as produced by an external resolver.
//!
//! A [`ResolvedGraph`] is an immutable arena of [`Component`]s addressed by
//! [`ComponentId`]. Every component lists its outgoing edges in declaration
//! order as [`DependencyResult`]s.

use std::collections::HashMap;
use std::fmt;

use depman_core::configuration::Configuration;
use depman_core::coordinates::{Coordinates, ModuleId, ModuleVersion};

use crate::selector::DependencyInterceptor;

/// What a dependency edge asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentSelector {
    /// An external module; the version may be absent or dynamic.
    Module(Coordinates),
    /// A module of the same build, by build path.
    Project(String),
}

impl ComponentSelector {
    /// `group:artifact` of a module selector. Project selectors have none.
    pub fn module_id(&self) -> Option<ModuleId> {
        match self {
            Self::Module(coords) => Some(coords.id()),
            Self::Project(_) => None,
        }
    }
}

impl fmt::Display for ComponentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(coords) => write!(f, "{coords}"),
            Self::Project(path) => write!(f, "project {path}"),
        }
    }
}

/// The identity of a resolved component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentIdentity {
    /// A module fetched from a repository.
    Module(ModuleVersion),
    /// A module built by the current build. It has no POM to consult.
    Project { path: String, module: ModuleVersion },
}

impl ComponentIdentity {
    /// `group:artifact`, version ignored.
    pub fn module_id(&self) -> ModuleId {
        match self {
            Self::Module(mv) | Self::Project { module: mv, .. } => mv.id(),
        }
    }

    pub fn module_version(&self) -> &ModuleVersion {
        match self {
            Self::Module(mv) | Self::Project { module: mv, .. } => mv,
        }
    }

    /// The module version of a repository module, `None` for projects.
    pub fn external_module(&self) -> Option<&ModuleVersion> {
        match self {
            Self::Module(mv) => Some(mv),
            Self::Project { .. } => None,
        }
    }
}

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(mv) => write!(f, "{mv}"),
            Self::Project { path, .. } => write!(f, "project {path}"),
        }
    }
}

/// Index of a component within its [`ResolvedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(usize);

/// One outgoing edge of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyResult {
    /// A dependency that resolved to a component.
    Resolved {
        requested: ComponentSelector,
        selected: ComponentId,
    },
    /// A dependency the resolver could not satisfy.
    Unresolved {
        attempted: ComponentSelector,
        failure: String,
    },
    /// A constraint that shaped version selection without being consumed.
    Constraint {
        requested: ComponentSelector,
        selected: Option<ComponentId>,
    },
}

/// A resolved component and its outgoing edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub identity: ComponentIdentity,
    pub dependencies: Vec<DependencyResult>,
}

/// An immutable resolved graph.
#[derive(Debug, Clone)]
pub struct ResolvedGraph {
    components: Vec<Component>,
    root: ComponentId,
}

impl ResolvedGraph {
    pub fn root(&self) -> ComponentId {
        self.root
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    /// All components with their ids, root first.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(idx, c)| (ComponentId(idx), c))
    }

    /// Repository modules of the graph, i.e. every component with a POM.
    pub fn external_modules(&self) -> impl Iterator<Item = &ModuleVersion> {
        self.components
            .iter()
            .filter_map(|c| c.identity.external_module())
    }

    /// Look up a component by `group:artifact`.
    pub fn find(&self, id: &ModuleId) -> Option<ComponentId> {
        self.components()
            .find(|(_, c)| c.identity.module_id() == *id)
            .map(|(idx, _)| idx)
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.find(id).is_some()
    }

    /// Number of components, root included.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Assembles a [`ResolvedGraph`]. Components are deduplicated by identity.
#[derive(Debug)]
pub struct GraphBuilder {
    components: Vec<Component>,
    index: HashMap<ComponentIdentity, ComponentId>,
}

impl GraphBuilder {
    /// Start a graph whose root is `root`.
    pub fn new(root: ComponentIdentity) -> Self {
        let mut builder = Self {
            components: Vec::new(),
            index: HashMap::new(),
        };
        builder.add_component(root);
        builder
    }

    pub fn root(&self) -> ComponentId {
        ComponentId(0)
    }

    /// Add or retrieve a component. If the identity already exists, returns the existing id.
    pub fn add_component(&mut self, identity: ComponentIdentity) -> ComponentId {
        if let Some(&id) = self.index.get(&identity) {
            return id;
        }
        let id = ComponentId(self.components.len());
        self.index.insert(identity.clone(), id);
        self.components.push(Component {
            identity,
            dependencies: Vec::new(),
        });
        id
    }

    /// Append an edge to `from`.
    pub fn add_dependency(&mut self, from: ComponentId, dependency: DependencyResult) {
        self.components[from.0].dependencies.push(dependency);
    }

    pub fn build(self) -> ResolvedGraph {
        ResolvedGraph {
            components: self.components,
            root: ComponentId(0),
        }
    }
}

/// The external graph resolution service.
///
/// Implementations resolve the configuration's direct dependencies and
/// constraints, honour its flat exclude rules, and call `interceptor` once
/// for every dependency edge before choosing a version for it.
pub trait GraphResolver {
    fn resolve(
        &mut self,
        configuration: &Configuration,
        interceptor: &mut dyn DependencyInterceptor,
    ) -> miette::Result<ResolvedGraph>;
}
