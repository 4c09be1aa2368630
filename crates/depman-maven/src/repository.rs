//! A local Maven repository (`~/.m2/repository` layout) as a [`PomResolver`].

use std::fs;
use std::path::{Path, PathBuf};

use depman_core::config::RepositoryConfig;
use depman_core::coordinates::Coordinates;
use depman_core::exclusion::{Exclusion, WILDCARD};
use depman_util::errors::DepmanError;

use crate::model::{Dependency, Pom, PomReference, PomResolver, Properties};
use crate::pom::{self, PomDependency, PomDocument};

/// Parent and import chains longer than this are treated as cycles.
const MAX_DEPTH: usize = 16;

/// Builds effective POMs from `.pom` files stored in Maven repository layout.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &RepositoryConfig) -> Self {
        Self::new(config.local_path())
    }

    /// The root directory of this repository.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the `.pom` file for a coordinate.
    pub fn pom_path(&self, group: &str, artifact: &str, version: &str) -> PathBuf {
        self.root
            .join(group.replace('.', "/"))
            .join(artifact)
            .join(version)
            .join(format!("{artifact}-{version}.pom"))
    }

    fn read_document(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> miette::Result<PomDocument> {
        let path = self.pom_path(group, artifact, version);
        let content = fs::read_to_string(&path).map_err(|e| DepmanError::Pom {
            message: format!(
                "Cannot read POM for {group}:{artifact}:{version} at {}: {e}",
                path.display()
            ),
        })?;
        pom::parse_pom(&content)
    }

    /// Read a POM and merge its parent chain into it.
    fn load_with_parents(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        depth: usize,
    ) -> miette::Result<PomDocument> {
        if depth > MAX_DEPTH {
            return Err(chain_too_deep(group, artifact, version));
        }
        let mut doc = self.read_document(group, artifact, version)?;
        if let Some(parent_ref) = doc.parent.clone() {
            let parent = self.load_with_parents(
                &parent_ref.group_id,
                &parent_ref.artifact_id,
                &parent_ref.version,
                depth + 1,
            )?;
            doc.apply_parent(&parent);
        }
        Ok(doc)
    }

    /// Build the effective model of one POM.
    fn build(
        &self,
        coordinates: &Coordinates,
        overrides: &Properties,
        depth: usize,
    ) -> miette::Result<Pom> {
        let Some(version) = coordinates.version.as_deref() else {
            return Err(DepmanError::Pom {
                message: format!("Cannot resolve POM for {coordinates}: no version"),
            }
            .into());
        };
        let (group, artifact) = (&coordinates.group_id, &coordinates.artifact_id);
        if depth > MAX_DEPTH {
            return Err(chain_too_deep(group, artifact, version));
        }

        let mut doc = self.load_with_parents(group, artifact, version, depth)?;
        doc.properties
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        doc.resolve_properties();

        let mut managed: Vec<Dependency> = Vec::new();
        let mut imported: Vec<Dependency> = Vec::new();
        for dm in &doc.dependency_management {
            if dm.is_bom_import() {
                let bom_coords =
                    Coordinates::new(&dm.group_id, &dm.artifact_id, dm.version.as_deref());
                let bom = self.build(&bom_coords, overrides, depth + 1)?;
                imported.extend(bom.managed_dependencies);
            } else {
                managed.push(to_dependency(dm));
            }
        }
        // Declared entries win over imported ones, and earlier imports over later ones.
        for dep in imported {
            let declared = managed
                .iter()
                .any(|m| m.id() == dep.id() && m.classifier == dep.classifier);
            if !declared {
                managed.push(dep);
            }
        }

        let dependencies = doc
            .dependencies
            .iter()
            .map(|d| {
                let mut dep = to_dependency(d);
                if dep.coordinates.version.is_none() {
                    dep.coordinates.version = managed
                        .iter()
                        .find(|m| m.id() == dep.id() && m.classifier == dep.classifier)
                        .and_then(|m| m.coordinates.version.clone());
                }
                dep
            })
            .collect();

        Ok(Pom {
            coordinates: Coordinates::new(
                doc.effective_group_id().unwrap_or(group),
                doc.artifact_id.as_deref().unwrap_or(artifact),
                Some(doc.effective_version().unwrap_or(version)),
            ),
            managed_dependencies: managed,
            dependencies,
            properties: doc.properties,
        })
    }
}

impl PomResolver for LocalRepository {
    fn resolve_poms(
        &self,
        references: &[PomReference],
        properties: &Properties,
    ) -> miette::Result<Vec<Pom>> {
        references
            .iter()
            .map(|reference| {
                let mut overrides = properties.clone();
                overrides.extend(
                    reference
                        .properties
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
                self.build(&reference.coordinates, &overrides, 0)
            })
            .collect()
    }
}

fn to_dependency(dep: &PomDependency) -> Dependency {
    Dependency {
        coordinates: Coordinates::new(&dep.group_id, &dep.artifact_id, dep.version.as_deref()),
        type_: dep.type_.clone(),
        classifier: dep.classifier.clone(),
        scope: dep.scope.clone(),
        optional: dep.optional,
        exclusions: dep
            .exclusions
            .iter()
            .map(|e| Exclusion::new(&e.group_id, e.artifact_id.as_deref().unwrap_or(WILDCARD)))
            .collect(),
    }
}

fn chain_too_deep(group: &str, artifact: &str, version: &str) -> miette::Report {
    DepmanError::Pom {
        message: format!(
            "Parent or import chain of {group}:{artifact}:{version} is deeper than {MAX_DEPTH}; is it cyclic?"
        ),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pom_path_layout() {
        let repo = LocalRepository::new("/repo");
        assert_eq!(
            repo.pom_path("org.example", "lib", "1.0"),
            PathBuf::from("/repo/org/example/lib/1.0/lib-1.0.pom")
        );
    }

    #[test]
    fn exclusion_without_artifact_is_group_wide() {
        let dep = PomDependency {
            group_id: "g".into(),
            artifact_id: "a".into(),
            exclusions: vec![pom::PomExclusion {
                group_id: "javax.servlet".into(),
                artifact_id: None,
            }],
            ..PomDependency::default()
        };
        assert_eq!(
            to_dependency(&dep).exclusions,
            vec![Exclusion::new("javax.servlet", "*")]
        );
    }
}
