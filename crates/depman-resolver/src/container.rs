//! The global dependency-management scope plus one scope per configuration.

use std::collections::BTreeMap;

use depman_core::configuration::Configuration;
use depman_core::coordinates::ModuleId;
use depman_core::exclusion::{Exclusion, Exclusions};
use depman_maven::model::{PomReference, PomResolver, Properties};

use crate::management::DependencyManagement;

/// Every dependency-management scope of a build.
///
/// Lookups for a configuration walk its hierarchy from most to least
/// specific and fall back to the global scope.
#[derive(Debug, Default)]
pub struct DependencyManagementContainer {
    global: DependencyManagement,
    scopes: BTreeMap<String, DependencyManagement>,
    properties: Properties,
}

impl DependencyManagementContainer {
    /// `properties` is the project property source used for BOM resolution.
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// The global scope for `None`, otherwise the named scope, created on demand.
    pub fn scope_mut(&mut self, scope: Option<&str>) -> &mut DependencyManagement {
        match scope {
            None => &mut self.global,
            Some(name) => self.scopes.entry(name.to_string()).or_default(),
        }
    }

    pub fn scope(&self, scope: Option<&str>) -> Option<&DependencyManagement> {
        match scope {
            None => Some(&self.global),
            Some(name) => self.scopes.get(name),
        }
    }

    pub fn add_implicit(
        &mut self,
        scope: Option<&str>,
        group: &str,
        artifact: &str,
        version: &str,
    ) {
        self.scope_mut(scope).add_implicit(group, artifact, version);
    }

    pub fn add_explicit(
        &mut self,
        scope: Option<&str>,
        group: &str,
        artifact: &str,
        version: &str,
        exclusions: impl IntoIterator<Item = Exclusion>,
    ) {
        self.scope_mut(scope)
            .add_explicit(group, artifact, version, exclusions);
    }

    pub fn import_bom(&mut self, scope: Option<&str>, reference: PomReference) {
        self.scope_mut(scope).import_bom(reference);
    }

    /// The managed version of `group:artifact` for `configuration`, or from
    /// the global scope when no configuration is given.
    pub fn managed_version(
        &mut self,
        configuration: Option<&Configuration>,
        group: &str,
        artifact: &str,
        poms: &dyn PomResolver,
    ) -> miette::Result<Option<String>> {
        if let Some(configuration) = configuration {
            for name in configuration.hierarchy() {
                if let Some(scope) = self.scopes.get_mut(name) {
                    if let Some(version) =
                        scope.managed_version(group, artifact, poms, &self.properties)?
                    {
                        return Ok(Some(version));
                    }
                }
            }
        }
        self.global
            .managed_version(group, artifact, poms, &self.properties)
    }

    /// Global exclusions merged with those of every scope in the
    /// configuration's hierarchy.
    pub fn exclusions(
        &mut self,
        configuration: Option<&Configuration>,
        poms: &dyn PomResolver,
    ) -> miette::Result<Exclusions> {
        let mut merged = self.global.exclusions(poms, &self.properties)?.clone();
        if let Some(configuration) = configuration {
            for name in configuration.hierarchy() {
                if let Some(scope) = self.scopes.get_mut(name) {
                    merged.add_all(scope.exclusions(poms, &self.properties)?);
                }
            }
        }
        Ok(merged)
    }

    /// The version table of a single scope. Unknown scopes are empty.
    pub fn managed_versions_for_scope(
        &mut self,
        scope: Option<&str>,
        poms: &dyn PomResolver,
    ) -> miette::Result<BTreeMap<ModuleId, String>> {
        let management = match scope {
            None => &mut self.global,
            Some(name) => match self.scopes.get_mut(name) {
                Some(management) => management,
                None => return Ok(BTreeMap::new()),
            },
        };
        Ok(management.managed_versions(poms, &self.properties)?.clone())
    }

    /// The versions in effect for a configuration: the global table
    /// overlaid by each scope of its hierarchy, least specific first.
    pub fn managed_versions_for_hierarchy(
        &mut self,
        configuration: &Configuration,
        poms: &dyn PomResolver,
    ) -> miette::Result<BTreeMap<ModuleId, String>> {
        let mut versions = self.global.managed_versions(poms, &self.properties)?.clone();
        let names: Vec<&str> = configuration.hierarchy().collect();
        for name in names.into_iter().rev() {
            if let Some(scope) = self.scopes.get_mut(name) {
                versions.extend(
                    scope
                        .managed_versions(poms, &self.properties)?
                        .iter()
                        .map(|(id, v)| (id.clone(), v.clone())),
                );
            }
        }
        Ok(versions)
    }
}
