//! Managed versions of one dependency-management scope.
//!
//! Versions come from three places: explicit declarations, implicit
//! declarations inferred from direct dependencies, and imported BOMs. BOMs
//! are resolved lazily on the first query, and whatever was declared
//! directly always wins over what a BOM contributes.

use std::collections::BTreeMap;

use depman_core::coordinates::ModuleId;
use depman_core::exclusion::{Exclusion, Exclusions};
use depman_core::version;
use depman_maven::model::{Dependency, Pom, PomReference, PomResolver, Properties};
use depman_util::errors::{root_cause_message, DepmanError};

/// Lifecycle of a scope's BOM resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    /// BOMs are being imported. Seeing this on entry means resolution re-entered itself.
    Resolving,
    /// The version table is final.
    Resolved,
    /// Importing BOMs failed; holds the root cause reported by every later query.
    Failed(String),
}

/// The managed versions, exclusions and BOM imports of one scope.
#[derive(Debug)]
pub struct DependencyManagement {
    versions: BTreeMap<ModuleId, String>,
    explicit_versions: BTreeMap<ModuleId, String>,
    exclusions: Exclusions,
    explicit_exclusions: Exclusions,
    imported_boms: Vec<PomReference>,
    imported_properties: Properties,
    state: ResolutionState,
}

impl Default for DependencyManagement {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyManagement {
    pub fn new() -> Self {
        Self {
            versions: BTreeMap::new(),
            explicit_versions: BTreeMap::new(),
            exclusions: Exclusions::new(),
            explicit_exclusions: Exclusions::new(),
            imported_boms: Vec::new(),
            imported_properties: Properties::new(),
            state: ResolutionState::Unresolved,
        }
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// Record a version inferred from a direct dependency declaration.
    /// Dynamic versions are not recorded.
    pub fn add_implicit(&mut self, group: &str, artifact: &str, version: &str) {
        let id = ModuleId::new(group, artifact);
        if !version::is_concrete(version) {
            tracing::debug!("Not managing {id} from dynamic version {version}");
            return;
        }
        if self.versions.get(&id).map(String::as_str) == Some(version) {
            return;
        }
        if self.accepts_declarations(&id) {
            self.versions.insert(id, version.to_string());
        }
    }

    /// Record a version declared by the user, with exclusions that apply to
    /// the dependencies of `group:artifact`.
    pub fn add_explicit(
        &mut self,
        group: &str,
        artifact: &str,
        version: &str,
        exclusions: impl IntoIterator<Item = Exclusion>,
    ) {
        let id = ModuleId::new(group, artifact);
        if !self.accepts_declarations(&id) {
            return;
        }
        let exclusions: Vec<Exclusion> = exclusions.into_iter().collect();
        self.versions.insert(id.clone(), version.to_string());
        self.explicit_versions.insert(id.clone(), version.to_string());
        self.exclusions.add(id.clone(), exclusions.iter().cloned());
        self.explicit_exclusions.add(id, exclusions);
    }

    /// Append a BOM import. Nothing is resolved until the first query.
    pub fn import_bom(&mut self, reference: PomReference) {
        let id = reference.coordinates.id();
        if self.accepts_declarations(&id) {
            self.imported_boms.push(reference);
        }
    }

    fn accepts_declarations(&self, id: &ModuleId) -> bool {
        if self.state == ResolutionState::Unresolved {
            return true;
        }
        tracing::warn!(
            "Ignoring dependency management for {id} declared after the scope was resolved"
        );
        false
    }

    /// Imported BOMs in declaration order.
    pub fn imported_boms(&self) -> &[PomReference] {
        &self.imported_boms
    }

    /// Versions declared explicitly, without implicit or imported ones.
    pub fn explicit_versions(&self) -> &BTreeMap<ModuleId, String> {
        &self.explicit_versions
    }

    /// Exclusions declared explicitly, without those from BOMs.
    pub fn explicit_exclusions(&self) -> &Exclusions {
        &self.explicit_exclusions
    }

    /// The managed version of `group:artifact`, resolving BOMs first if needed.
    pub fn managed_version(
        &mut self,
        group: &str,
        artifact: &str,
        poms: &dyn PomResolver,
        properties: &Properties,
    ) -> miette::Result<Option<String>> {
        self.resolve(poms, properties)?;
        Ok(self.versions.get(&ModuleId::new(group, artifact)).cloned())
    }

    /// The complete version table.
    pub fn managed_versions(
        &mut self,
        poms: &dyn PomResolver,
        properties: &Properties,
    ) -> miette::Result<&BTreeMap<ModuleId, String>> {
        self.resolve(poms, properties)?;
        Ok(&self.versions)
    }

    /// Explicit exclusions merged with those declared in imported BOMs.
    pub fn exclusions(
        &mut self,
        poms: &dyn PomResolver,
        properties: &Properties,
    ) -> miette::Result<&Exclusions> {
        self.resolve(poms, properties)?;
        Ok(&self.exclusions)
    }

    /// Properties declared by imported BOMs. Later imports win.
    pub fn imported_properties(
        &mut self,
        poms: &dyn PomResolver,
        properties: &Properties,
    ) -> miette::Result<&Properties> {
        self.resolve(poms, properties)?;
        Ok(&self.imported_properties)
    }

    /// Resolve imported BOMs once. A failure is remembered and reported again
    /// on every later call.
    pub fn resolve(
        &mut self,
        poms: &dyn PomResolver,
        properties: &Properties,
    ) -> miette::Result<()> {
        match &self.state {
            ResolutionState::Resolved => return Ok(()),
            ResolutionState::Failed(cause) => return Err(self.import_error(cause)),
            ResolutionState::Resolving => {
                return Err(DepmanError::Resolution {
                    message: "dependency management was queried while its BOMs were being imported"
                        .to_string(),
                }
                .into())
            }
            ResolutionState::Unresolved => {}
        }
        if self.imported_boms.is_empty() {
            self.state = ResolutionState::Resolved;
            return Ok(());
        }

        self.state = ResolutionState::Resolving;
        match self.import_boms(poms, properties) {
            Ok(()) => {
                self.state = ResolutionState::Resolved;
                Ok(())
            }
            Err(report) => {
                let cause = root_cause_message(&report);
                let err = self.import_error(&cause);
                self.state = ResolutionState::Failed(cause);
                Err(err)
            }
        }
    }

    fn import_boms(
        &mut self,
        poms: &dyn PomResolver,
        properties: &Properties,
    ) -> miette::Result<()> {
        let declared = self.versions.clone();
        let boms = poms.resolve_poms(&self.imported_boms, properties)?;
        for bom in &boms {
            self.imported_properties
                .extend(bom.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
            for dep in &bom.managed_dependencies {
                if dep.classifier.is_some() {
                    continue;
                }
                match dep.coordinates.version.as_deref() {
                    Some(v) if version::is_concrete(v) => {
                        self.versions.insert(dep.id(), v.to_string());
                        self.exclusions.add(dep.id(), dep.exclusions.iter().cloned());
                    }
                    Some(v) => {
                        tracing::warn!(
                            "Dependency management for {} in {} has non-concrete version '{v}' and will be ignored",
                            dep.id(),
                            bom.coordinates
                        );
                    }
                    None => {
                        tracing::warn!(
                            "Dependency management for {} in {} has no version and will be ignored",
                            dep.id(),
                            bom.coordinates
                        );
                    }
                }
            }
        }
        // Direct declarations win over anything a BOM contributed.
        self.versions.extend(declared);
        Ok(())
    }

    fn import_error(&self, cause: &str) -> miette::Report {
        let coordinates = self
            .imported_boms
            .iter()
            .map(|r| r.coordinates.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        DepmanError::BomImport {
            coordinates,
            cause: cause.to_string(),
        }
        .into()
    }

    /// Managed dependencies whose version depends on `properties`.
    ///
    /// The imported BOMs are resolved once without any property overrides and
    /// once with `properties`; every managed dependency whose version differs
    /// must be written out explicitly by a static descriptor.
    pub fn overridden_dependencies(
        &self,
        poms: &dyn PomResolver,
        properties: &Properties,
    ) -> miette::Result<Vec<Dependency>> {
        if self.imported_boms.is_empty() {
            return Ok(Vec::new());
        }
        let plain: Vec<PomReference> = self
            .imported_boms
            .iter()
            .map(|r| PomReference::new(r.coordinates.clone()))
            .collect();
        let defaults = managed_by_id(&poms.resolve_poms(&plain, &Properties::new())?);
        let live = managed_by_id(&poms.resolve_poms(&self.imported_boms, properties)?);

        Ok(live
            .into_iter()
            .filter(|(id, dep)| {
                defaults
                    .get(id)
                    .map_or(true, |d| d.coordinates.version != dep.coordinates.version)
            })
            .map(|(_, dep)| dep)
            .collect())
    }
}

/// Managed dependencies without classifier by id. Later POMs win.
fn managed_by_id(poms: &[Pom]) -> BTreeMap<ModuleId, Dependency> {
    poms.iter()
        .flat_map(|pom| pom.managed_dependencies.iter())
        .filter(|dep| dep.classifier.is_none())
        .map(|dep| (dep.id(), dep.clone()))
        .collect()
}
