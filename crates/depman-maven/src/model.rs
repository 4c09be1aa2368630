//! The effective POM model consumed by dependency management, and the
//! [`PomResolver`] service that produces it.

use std::collections::BTreeMap;

use depman_core::coordinates::{Coordinates, ModuleId};
use depman_core::exclusion::Exclusion;

/// Property name to value.
pub type Properties = BTreeMap<String, String>;

/// An effective POM: parents merged, properties interpolated and BOM imports
/// expanded. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pom {
    pub coordinates: Coordinates,
    pub managed_dependencies: Vec<Dependency>,
    pub dependencies: Vec<Dependency>,
    pub properties: Properties,
}

/// A dependency of an effective POM, managed or direct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub coordinates: Coordinates,
    pub type_: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub exclusions: Vec<Exclusion>,
}

impl Dependency {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            type_: None,
            classifier: None,
            scope: None,
            optional: false,
            exclusions: Vec::new(),
        }
    }

    pub fn id(&self) -> ModuleId {
        self.coordinates.id()
    }

    /// Whether Maven would follow this dependency transitively: not optional
    /// and not `provided` or `test` scoped.
    pub fn is_transitive(&self) -> bool {
        !self.optional && !matches!(self.scope.as_deref(), Some("provided") | Some("test"))
    }
}

/// A POM to resolve, with property overrides applied only while resolving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomReference {
    pub coordinates: Coordinates,
    pub properties: Properties,
}

impl PomReference {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            properties: Properties::new(),
        }
    }

    pub fn with_properties(coordinates: Coordinates, properties: Properties) -> Self {
        Self {
            coordinates,
            properties,
        }
    }
}

/// Builds effective POM models.
///
/// `properties` is the caller's property source. A reference's own
/// properties take precedence over it, and both take precedence over the
/// properties a POM declares.
pub trait PomResolver {
    /// Resolve every reference, failing if any of them cannot be resolved.
    /// The result is in reference order.
    fn resolve_poms(
        &self,
        references: &[PomReference],
        properties: &Properties,
    ) -> miette::Result<Vec<Pom>>;

    /// Resolve every reference, yielding `None` for those that fail. The
    /// result is in reference order.
    fn resolve_poms_leniently(
        &self,
        references: &[PomReference],
        properties: &Properties,
    ) -> Vec<Option<Pom>> {
        references
            .iter()
            .map(
                |reference| match self.resolve_poms(std::slice::from_ref(reference), properties) {
                    Ok(mut poms) => poms.pop(),
                    Err(e) => {
                        tracing::debug!("Skipping POM {}: {e}", reference.coordinates);
                        None
                    }
                },
            )
            .collect()
    }
}
