//! Per-edge version selection while a graph is being resolved.

use std::collections::HashSet;

use depman_core::configuration::{Configuration, LocalModules};
use depman_core::coordinates::{Coordinates, ModuleId};
use depman_core::version;
use depman_maven::model::PomResolver;

use crate::container::DependencyManagementContainer;
use crate::graph::ComponentSelector;

/// An in-flight request for one dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRequest {
    requested: ComponentSelector,
    forced_version: Option<String>,
}

impl DependencyRequest {
    pub fn new(requested: ComponentSelector) -> Self {
        Self {
            requested,
            forced_version: None,
        }
    }

    pub fn module(coordinates: Coordinates) -> Self {
        Self::new(ComponentSelector::Module(coordinates))
    }

    pub fn project(path: impl Into<String>) -> Self {
        Self::new(ComponentSelector::Project(path.into()))
    }

    pub fn requested(&self) -> &ComponentSelector {
        &self.requested
    }

    /// Force this edge to `version`, whatever the selector asked for.
    pub fn use_version(&mut self, version: impl Into<String>) {
        self.forced_version = Some(version.into());
    }

    pub fn forced_version(&self) -> Option<&str> {
        self.forced_version.as_deref()
    }

    /// The version the resolver should select: the forced one if any,
    /// otherwise the requested one.
    pub fn target_version(&self) -> Option<&str> {
        match (&self.forced_version, &self.requested) {
            (Some(forced), _) => Some(forced),
            (None, ComponentSelector::Module(coords)) => coords.version.as_deref(),
            (None, ComponentSelector::Project(_)) => None,
        }
    }
}

/// Called by a [`GraphResolver`](crate::graph::GraphResolver) for every
/// dependency edge before it picks a version.
pub trait DependencyInterceptor {
    fn intercept(&mut self, request: &mut DependencyRequest) -> miette::Result<()>;
}

/// Forces managed versions onto the edges of one configuration.
pub struct VersionSelector<'a> {
    container: &'a mut DependencyManagementContainer,
    poms: &'a dyn PomResolver,
    configuration: &'a Configuration,
    local_modules: &'a LocalModules,
    direct_dependencies: Option<HashSet<ModuleId>>,
}

impl<'a> VersionSelector<'a> {
    pub fn new(
        container: &'a mut DependencyManagementContainer,
        poms: &'a dyn PomResolver,
        configuration: &'a Configuration,
        local_modules: &'a LocalModules,
    ) -> Self {
        Self {
            container,
            poms,
            configuration,
            local_modules,
            direct_dependencies: None,
        }
    }

    fn is_direct(&mut self, id: &ModuleId) -> bool {
        let configuration = self.configuration;
        self.direct_dependencies
            .get_or_insert_with(|| configuration.direct_dependency_ids())
            .contains(id)
    }
}

impl DependencyInterceptor for VersionSelector<'_> {
    fn intercept(&mut self, request: &mut DependencyRequest) -> miette::Result<()> {
        let ComponentSelector::Module(coords) = request.requested() else {
            return Ok(());
        };
        let id = coords.id();
        if self.local_modules.contains(&id) {
            return Ok(());
        }
        let dynamic = coords.version.as_deref().is_some_and(version::is_dynamic);
        if dynamic && self.is_direct(&id) {
            tracing::debug!("Leaving direct dependency {coords} unmanaged");
            return Ok(());
        }

        let managed = self.container.managed_version(
            Some(self.configuration),
            &id.group,
            &id.artifact,
            self.poms,
        )?;
        if let Some(version) = managed {
            tracing::debug!("Using managed version {version} for {id}");
            request.use_version(version);
        }
        Ok(())
    }
}
