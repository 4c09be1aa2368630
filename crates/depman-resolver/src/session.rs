//! Resolution of configurations with managed versions and Maven exclusions.

use std::collections::BTreeMap;

use depman_core::config::ManagementConfig;
use depman_core::configuration::{Configuration, DeclaredDependency, ExcludeRule, LocalModules};
use depman_core::coordinates::ModuleId;
use depman_core::exclusion::Exclusions;
use depman_maven::model::PomResolver;

use crate::catalog::ExclusionCatalog;
use crate::container::DependencyManagementContainer;
use crate::descriptor::ManagementDescriptor;
use crate::graph::{GraphResolver, ResolvedGraph};
use crate::selector::VersionSelector;
use crate::walker;

/// The outcome of resolving one configuration.
#[derive(Debug)]
pub struct Resolution {
    pub graph: ResolvedGraph,
    /// Exclude rules added to the configuration before the final resolution.
    pub exclude_rules: Vec<ExcludeRule>,
}

/// State shared by every resolution of one build: the dependency-management
/// scopes, the exclusion catalog and the POM service.
pub struct BuildSession<R: PomResolver> {
    config: ManagementConfig,
    poms: R,
    container: DependencyManagementContainer,
    catalog: ExclusionCatalog,
    local_modules: LocalModules,
}

impl<R: PomResolver> BuildSession<R> {
    pub fn new(config: ManagementConfig, poms: R) -> Self {
        let container = DependencyManagementContainer::new(config.properties.clone());
        Self {
            config,
            poms,
            container,
            catalog: ExclusionCatalog::new(),
            local_modules: LocalModules::new(),
        }
    }

    pub fn with_local_modules(mut self, local_modules: LocalModules) -> Self {
        self.local_modules = local_modules;
        self
    }

    pub fn config(&self) -> &ManagementConfig {
        &self.config
    }

    pub fn poms(&self) -> &R {
        &self.poms
    }

    /// Where managed versions, exclusions and BOM imports are declared.
    pub fn dependency_management(&mut self) -> &mut DependencyManagementContainer {
        &mut self.container
    }

    pub fn catalog(&self) -> &ExclusionCatalog {
        &self.catalog
    }

    /// Resolve `configuration`.
    ///
    /// A trial resolution without exclude rules discovers the full graph,
    /// Maven exclusions are turned into flat exclude rules from it, and the
    /// configuration is resolved again with those rules applied.
    pub fn resolve(
        &mut self,
        configuration: &Configuration,
        resolver: &mut dyn GraphResolver,
    ) -> miette::Result<Resolution> {
        let exclude_rules = self.compute_exclude_rules(configuration, resolver)?;
        let effective = configuration.with_exclude_rules(exclude_rules.iter().cloned());

        let mut selector =
            VersionSelector::new(&mut self.container, &self.poms, &effective, &self.local_modules);
        let graph = resolver.resolve(&effective, &mut selector)?;
        Ok(Resolution {
            graph,
            exclude_rules,
        })
    }

    /// The exclude rules equivalent to the Maven exclusions that apply to
    /// `configuration`, computed from a trial resolution.
    pub fn compute_exclude_rules(
        &mut self,
        configuration: &Configuration,
        resolver: &mut dyn GraphResolver,
    ) -> miette::Result<Vec<ExcludeRule>> {
        if self.config.management.overridden_by_dependencies {
            self.record_direct_versions(configuration);
        }

        let trial_configuration = configuration.dry_run_copy();
        let trial = {
            let mut selector = VersionSelector::new(
                &mut self.container,
                &self.poms,
                &trial_configuration,
                &self.local_modules,
            );
            resolver.resolve(&trial_configuration, &mut selector)?
        };

        let declared = self.container.exclusions(Some(configuration), &self.poms)?;
        let from_poms = if self.config.management.apply_maven_exclusions {
            self.catalog.resolve(trial.external_modules(), &self.poms)
        } else {
            Exclusions::new()
        };

        let outcome = walker::compute_exclusions(&trial, &declared, &from_poms);
        let rules = outcome.exclude_rules();
        if !rules.is_empty() {
            tracing::debug!(
                "Excluding {} from {}",
                rules
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                configuration.name
            );
        }
        Ok(rules)
    }

    /// Direct dependencies with a concrete version become implicit managed
    /// versions of the configuration's own scope.
    fn record_direct_versions(&mut self, configuration: &Configuration) {
        for dependency in &configuration.dependencies {
            if let DeclaredDependency::Module(coords) = dependency {
                if let Some(version) = coords.version.as_deref() {
                    self.container.add_implicit(
                        Some(&configuration.name),
                        &coords.group_id,
                        &coords.artifact_id,
                        version,
                    );
                }
            }
        }
    }

    /// The managed versions in effect for `configuration`.
    pub fn managed_versions(
        &mut self,
        configuration: &Configuration,
    ) -> miette::Result<BTreeMap<ModuleId, String>> {
        self.container
            .managed_versions_for_hierarchy(configuration, &self.poms)
    }

    /// The descriptor view of one scope, `None` meaning the global scope.
    pub fn descriptor(&mut self, scope: Option<&str>) -> miette::Result<ManagementDescriptor> {
        let properties = self.container.properties().clone();
        let management = self.container.scope_mut(scope);
        ManagementDescriptor::for_scope(management, &self.poms, &properties)
    }
}
