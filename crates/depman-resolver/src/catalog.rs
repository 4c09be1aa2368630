//! Exclusions declared in the POMs of resolved components.

use std::collections::{BTreeSet, HashMap};

use depman_core::coordinates::{ModuleId, ModuleVersion};
use depman_core::exclusion::Exclusions;
use depman_maven::model::{Pom, PomReference, PomResolver, Properties};

/// Caches, per module, the exclusions its POM attaches to its own dependencies.
///
/// The cache is keyed by `group:artifact` only: once a module has been
/// looked up, later requests for a different version of it reuse the first
/// version's exclusions for the rest of the build session.
#[derive(Debug, Default)]
pub struct ExclusionCatalog {
    cache: HashMap<ModuleId, Exclusions>,
}

impl ExclusionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusions for the given modules, fetching the POMs of uncached ones
    /// in a single lenient batch. POMs that cannot be resolved contribute
    /// nothing.
    pub fn resolve<'m>(
        &mut self,
        modules: impl IntoIterator<Item = &'m ModuleVersion>,
        poms: &dyn PomResolver,
    ) -> Exclusions {
        let mut requested = BTreeSet::new();
        let mut missing_ids = Vec::new();
        let mut missing = Vec::new();
        for module in modules {
            let id = module.id();
            if requested.insert(id.clone()) && !self.cache.contains_key(&id) {
                missing.push(PomReference::new(module.coordinates()));
                missing_ids.push(id);
            }
        }

        if !missing.is_empty() {
            tracing::debug!("Looking up exclusions in {} POMs", missing.len());
            let found = poms.resolve_poms_leniently(&missing, &Properties::new());
            // Keyed by the requested module, whatever coordinates the POM declares.
            for (id, pom) in missing_ids.into_iter().zip(found) {
                if let Some(pom) = pom {
                    self.cache.insert(id, exclusions_of(&pom));
                }
            }
        }

        let mut merged = Exclusions::new();
        for id in &requested {
            if let Some(exclusions) = self.cache.get(id) {
                merged.add_all(exclusions);
            }
        }
        merged
    }

    pub fn cached(&self, id: &ModuleId) -> Option<&Exclusions> {
        self.cache.get(id)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Exclusions of every transitive managed or direct dependency of `pom`,
/// keyed by that dependency.
fn exclusions_of(pom: &Pom) -> Exclusions {
    let mut exclusions = Exclusions::new();
    for dep in pom.managed_dependencies.iter().chain(&pom.dependencies) {
        if dep.is_transitive() {
            exclusions.add(dep.id(), dep.exclusions.iter().cloned());
        }
    }
    exclusions
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use depman_core::coordinates::Coordinates;
    use depman_core::exclusion::Exclusion;
    use depman_maven::model::Dependency;

    use super::*;

    /// Every POM `g:a:v` depends on `dep:<a>` excluding `x:<v>`.
    /// Artifacts named `missing` fail. Artifacts named `relocated` declare
    /// the group `elsewhere`.
    struct Recording {
        batches: RefCell<Vec<Vec<String>>>,
    }

    impl Recording {
        fn new() -> Self {
            Self {
                batches: RefCell::new(Vec::new()),
            }
        }
    }

    impl PomResolver for Recording {
        fn resolve_poms(
            &self,
            references: &[PomReference],
            _properties: &Properties,
        ) -> miette::Result<Vec<Pom>> {
            references
                .iter()
                .map(|r| {
                    let c = &r.coordinates;
                    if c.artifact_id == "missing" {
                        miette::bail!("no POM for {c}");
                    }
                    let version = c.version.clone().unwrap_or_default();
                    let dep = Dependency {
                        exclusions: vec![Exclusion::new("x", version.as_str())],
                        ..Dependency::new(Coordinates::new("dep", &c.artifact_id, Some("1")))
                    };
                    let test_dep = Dependency {
                        scope: Some("test".into()),
                        exclusions: vec![Exclusion::new("never", "seen")],
                        ..Dependency::new(Coordinates::new("test", &c.artifact_id, Some("1")))
                    };
                    let optional = Dependency {
                        optional: true,
                        exclusions: vec![Exclusion::new("never", "seen")],
                        ..Dependency::new(Coordinates::new("opt", &c.artifact_id, Some("1")))
                    };
                    let mut coordinates = c.clone();
                    if c.artifact_id == "relocated" {
                        coordinates.group_id = "elsewhere".to_string();
                    }
                    Ok(Pom {
                        coordinates,
                        managed_dependencies: vec![optional],
                        dependencies: vec![dep, test_dep],
                        properties: Properties::new(),
                    })
                })
                .collect()
        }

        fn resolve_poms_leniently(
            &self,
            references: &[PomReference],
            properties: &Properties,
        ) -> Vec<Option<Pom>> {
            self.batches.borrow_mut().push(
                references
                    .iter()
                    .map(|r| r.coordinates.to_string())
                    .collect(),
            );
            references
                .iter()
                .map(|r| {
                    self.resolve_poms(std::slice::from_ref(r), properties)
                        .ok()
                        .and_then(|mut p| p.pop())
                })
                .collect()
        }
    }

    #[test]
    fn records_exclusions_of_transitive_dependencies_only() {
        let poms = Recording::new();
        let mut catalog = ExclusionCatalog::new();
        let a = ModuleVersion::new("g", "a", "1.0");
        let excl = catalog.resolve([&a], &poms);

        assert_eq!(excl.len(), 1);
        let patterns = excl.exclusions_for(&ModuleId::new("dep", "a")).unwrap();
        assert!(patterns.contains(&Exclusion::new("x", "1.0")));
        assert!(excl.exclusions_for(&ModuleId::new("test", "a")).is_none());
        assert!(excl.exclusions_for(&ModuleId::new("opt", "a")).is_none());
    }

    #[test]
    fn uncached_modules_are_fetched_in_one_batch() {
        let poms = Recording::new();
        let mut catalog = ExclusionCatalog::new();
        let a = ModuleVersion::new("g", "a", "1.0");
        let b = ModuleVersion::new("g", "b", "1.0");
        catalog.resolve([&a, &b, &a], &poms);
        catalog.resolve([&a, &b], &poms);

        let batches = poms.batches.borrow();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], ["g:a:1.0", "g:b:1.0"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn cache_ignores_version() {
        let poms = Recording::new();
        let mut catalog = ExclusionCatalog::new();
        catalog.resolve([&ModuleVersion::new("g", "a", "1.0")], &poms);
        let excl = catalog.resolve([&ModuleVersion::new("g", "a", "2.0")], &poms);

        let patterns = excl.exclusions_for(&ModuleId::new("dep", "a")).unwrap();
        assert!(patterns.contains(&Exclusion::new("x", "1.0")));
        assert!(!patterns.contains(&Exclusion::new("x", "2.0")));
        assert_eq!(poms.batches.borrow().len(), 1);
    }

    #[test]
    fn cache_is_keyed_by_requested_module() {
        let poms = Recording::new();
        let mut catalog = ExclusionCatalog::new();
        let relocated = ModuleVersion::new("g", "relocated", "1.0");
        let excl = catalog.resolve([&relocated], &poms);

        let patterns = excl.exclusions_for(&ModuleId::new("dep", "relocated")).unwrap();
        assert!(patterns.contains(&Exclusion::new("x", "1.0")));
        assert!(catalog.cached(&ModuleId::new("g", "relocated")).is_some());
        assert!(catalog.cached(&ModuleId::new("elsewhere", "relocated")).is_none());

        catalog.resolve([&relocated], &poms);
        assert_eq!(poms.batches.borrow().len(), 1);
    }

    #[test]
    fn unresolvable_poms_are_skipped() {
        let poms = Recording::new();
        let mut catalog = ExclusionCatalog::new();
        let excl = catalog.resolve(
            [
                &ModuleVersion::new("g", "missing", "1.0"),
                &ModuleVersion::new("g", "a", "1.0"),
            ],
            &poms,
        );
        assert_eq!(excl.len(), 1);
        assert!(catalog.cached(&ModuleId::new("g", "missing")).is_none());
    }
}
