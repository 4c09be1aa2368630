//! The dependency-management section a publishing layer writes into a
//! build descriptor.

use serde::Serialize;

use depman_core::coordinates::Coordinates;
use depman_maven::model::{PomResolver, Properties};

use crate::management::DependencyManagement;

/// One managed dependency of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorEntry {
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<String>,
}

/// Dependency management of one scope, ready to be serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagementDescriptor {
    /// Imported BOMs, last import first: descriptor consumers let the first
    /// import win, the opposite of import resolution.
    pub imports: Vec<Coordinates>,
    pub dependencies: Vec<DescriptorEntry>,
    /// Managed versions that differ because of project properties and must
    /// be written out literally.
    pub overrides: Vec<DescriptorEntry>,
}

impl ManagementDescriptor {
    pub fn for_scope(
        management: &DependencyManagement,
        poms: &dyn PomResolver,
        properties: &Properties,
    ) -> miette::Result<Self> {
        let imports = management
            .imported_boms()
            .iter()
            .rev()
            .map(|r| r.coordinates.clone())
            .collect();

        let explicit_exclusions = management.explicit_exclusions();
        let dependencies = management
            .explicit_versions()
            .iter()
            .map(|(id, version)| DescriptorEntry {
                coordinates: Coordinates::new(&id.group, &id.artifact, Some(version.as_str())),
                exclusions: explicit_exclusions
                    .exclusions_for(id)
                    .into_iter()
                    .flatten()
                    .map(ToString::to_string)
                    .collect(),
            })
            .collect();

        let overrides = management
            .overridden_dependencies(poms, properties)?
            .into_iter()
            .map(|dep| DescriptorEntry {
                exclusions: dep.exclusions.iter().map(ToString::to_string).collect(),
                coordinates: dep.coordinates,
            })
            .collect();

        Ok(Self {
            imports,
            dependencies,
            overrides,
        })
    }
}
