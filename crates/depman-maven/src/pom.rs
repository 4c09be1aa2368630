//! POM document parsing: dependency declarations, parent references,
//! properties and property interpolation.
//!
//! A [`PomDocument`] is the raw content of one `.pom` file. Parent merging,
//! BOM import expansion and conversion into the effective [`crate::model::Pom`]
//! happen in [`crate::repository`].

use std::collections::BTreeMap;

use depman_util::errors::DepmanError;
use quick_xml::events::Event;
use quick_xml::Reader;

const DEPENDENCY: &str = "project>dependencies>dependency";
const MANAGED_DEPENDENCY: &str = "project>dependencyManagement>dependencies>dependency";
const PARENT: &str = "project>parent";

/// A parsed POM file, before inheritance and interpolation.
#[derive(Debug, Clone, Default)]
pub struct PomDocument {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,

    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
}

/// Reference to a parent POM.
#[derive(Debug, Clone, Default)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// A `<dependency>` element, from `<dependencies>` or `<dependencyManagement>`.
#[derive(Debug, Clone, Default)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub classifier: Option<String>,
    pub type_: Option<String>,
    pub exclusions: Vec<PomExclusion>,
}

/// An `<exclusion>` within a dependency. A missing artifact excludes the
/// whole group.
#[derive(Debug, Clone, Default)]
pub struct PomExclusion {
    pub group_id: String,
    pub artifact_id: Option<String>,
}

impl PomDependency {
    /// `scope = import` with `type = pom` inside dependency management.
    pub fn is_bom_import(&self) -> bool {
        self.scope.as_deref() == Some("import") && self.type_.as_deref() == Some("pom")
    }
}

impl PomDocument {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Resolve `${property}` references using POM properties and built-in
    /// project variables. Unknown references are left in place and scanning
    /// continues after them.
    pub fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        let mut from = 0;
        let mut substitutions = 0;
        while substitutions < 20 {
            let Some(offset) = result[from..].find("${") else {
                break;
            };
            let start = from + offset;
            let Some(len) = result[start..].find('}') else {
                break;
            };
            let key = &result[start + 2..start + len];
            match self.resolve_property(key) {
                Some(value) if !value.contains(&format!("${{{key}}}")) => {
                    result.replace_range(start..=start + len, &value);
                    substitutions += 1;
                }
                _ => from = start + len + 1,
            }
        }
        result
    }

    fn resolve_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" => self.effective_group_id().map(str::to_string),
            "project.artifactId" | "pom.artifactId" => self.artifact_id.clone(),
            "project.version" | "pom.version" => self.effective_version().map(str::to_string),
            "project.packaging" | "pom.packaging" => self.packaging.clone(),
            "project.parent.groupId" => self.parent.as_ref().map(|p| p.group_id.clone()),
            "project.parent.version" => self.parent.as_ref().map(|p| p.version.clone()),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Interpolate every property reference in dependencies and dependency
    /// management.
    pub fn resolve_properties(&mut self) {
        let snapshot = self.clone();
        for dep in self
            .dependencies
            .iter_mut()
            .chain(self.dependency_management.iter_mut())
        {
            dep.group_id = snapshot.interpolate(&dep.group_id);
            dep.artifact_id = snapshot.interpolate(&dep.artifact_id);
            for field in [&mut dep.version, &mut dep.scope, &mut dep.classifier, &mut dep.type_] {
                if let Some(value) = field.as_mut() {
                    *value = snapshot.interpolate(value);
                }
            }
            for excl in &mut dep.exclusions {
                excl.group_id = snapshot.interpolate(&excl.group_id);
                if let Some(artifact) = excl.artifact_id.as_mut() {
                    *artifact = snapshot.interpolate(artifact);
                }
            }
        }
    }

    /// Merge a parent POM into this one. Declarations of this POM win.
    pub fn apply_parent(&mut self, parent: &PomDocument) {
        for (k, v) in &parent.properties {
            self.properties
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        if self.group_id.is_none() {
            self.group_id = parent.effective_group_id().map(str::to_string);
        }
        if self.version.is_none() {
            self.version = parent.effective_version().map(str::to_string);
        }
        inherit(&mut self.dependency_management, &parent.dependency_management);
        inherit(&mut self.dependencies, &parent.dependencies);
    }
}

fn inherit(own: &mut Vec<PomDependency>, inherited: &[PomDependency]) {
    for dep in inherited {
        let declared = own.iter().any(|d| {
            d.group_id == dep.group_id
                && d.artifact_id == dep.artifact_id
                && d.classifier == dep.classifier
        });
        if !declared {
            own.push(dep.clone());
        }
    }
}

/// Parse a POM XML string into a [`PomDocument`].
pub fn parse_pom(xml: &str) -> miette::Result<PomDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = PomDocument::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    let mut current_dep: Option<PomDependency> = None;
    let mut current_exclusion: Option<PomExclusion> = None;
    let mut current_parent: Option<ParentRef> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text.clear();

                let ctx = path_context(&path);
                if ctx == DEPENDENCY || ctx == MANAGED_DEPENDENCY {
                    current_dep = Some(PomDependency::default());
                } else if ctx.ends_with(">exclusions>exclusion") && current_dep.is_some() {
                    current_exclusion = Some(PomExclusion::default());
                } else if ctx == PARENT {
                    current_parent = Some(ParentRef::default());
                }
            }
            Ok(Event::Text(ref e)) => {
                text = e
                    .unescape()
                    .map_err(|err| DepmanError::Pom {
                        message: format!("Invalid text in POM XML: {err}"),
                    })?
                    .to_string();
            }
            Ok(Event::CData(ref e)) => {
                text = String::from_utf8_lossy(e).to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path_context(&path);
                let leaf = path.last().map(String::as_str).unwrap_or_default();

                if path.len() == 3 && path[1] == "properties" {
                    pom.properties.insert(leaf.to_string(), text.clone());
                } else if let Some(excl) = current_exclusion.as_mut() {
                    match leaf {
                        "groupId" => excl.group_id = text.clone(),
                        "artifactId" => excl.artifact_id = Some(text.clone()),
                        "exclusion" => {
                            if let (Some(excl), Some(dep)) =
                                (current_exclusion.take(), current_dep.as_mut())
                            {
                                dep.exclusions.push(excl);
                            }
                        }
                        _ => {}
                    }
                } else if let Some(dep) = current_dep.as_mut() {
                    if ctx.ends_with(&format!(">dependency>{leaf}")) {
                        match leaf {
                            "groupId" => dep.group_id = text.clone(),
                            "artifactId" => dep.artifact_id = text.clone(),
                            "version" => dep.version = Some(text.clone()),
                            "scope" => dep.scope = Some(text.clone()),
                            "optional" => dep.optional = text.trim() == "true",
                            "classifier" => dep.classifier = Some(text.clone()),
                            "type" => dep.type_ = Some(text.clone()),
                            _ => {}
                        }
                    }
                    if ctx == DEPENDENCY || ctx == MANAGED_DEPENDENCY {
                        if let Some(dep) = current_dep.take() {
                            if ctx == MANAGED_DEPENDENCY {
                                pom.dependency_management.push(dep);
                            } else {
                                pom.dependencies.push(dep);
                            }
                        }
                    }
                } else if let Some(parent) = current_parent.as_mut() {
                    match ctx.as_str() {
                        "project>parent>groupId" => parent.group_id = text.clone(),
                        "project>parent>artifactId" => parent.artifact_id = text.clone(),
                        "project>parent>version" => parent.version = text.clone(),
                        PARENT => pom.parent = current_parent.take(),
                        _ => {}
                    }
                } else if path.len() == 2 {
                    match leaf {
                        "groupId" => pom.group_id = Some(text.clone()),
                        "artifactId" => pom.artifact_id = Some(text.clone()),
                        "version" => pom.version = Some(text.clone()),
                        "packaging" => pom.packaging = Some(text.clone()),
                        _ => {}
                    }
                }

                path.pop();
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DepmanError::Pom {
                    message: format!("Failed to parse POM XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(pom)
}

/// Build a context string from the current XML path for matching.
fn path_context(path: &[String]) -> String {
    path.join(">")
}
