//! Test doubles for the POM service and the graph resolver.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use depman_core::configuration::{Configuration, DeclaredDependency};
use depman_core::coordinates::{Coordinates, ModuleId, ModuleVersion};
use depman_core::exclusion::Exclusion;
use depman_core::version;
use depman_maven::model::{Dependency, Pom, PomReference, PomResolver, Properties};
use depman_resolver::graph::{
    ComponentId, ComponentIdentity, ComponentSelector, DependencyResult, GraphBuilder,
    GraphResolver, ResolvedGraph,
};
use depman_resolver::selector::{DependencyInterceptor, DependencyRequest};

pub fn coords(s: &str) -> Coordinates {
    Coordinates::parse(s).unwrap()
}

pub fn id(s: &str) -> ModuleId {
    ModuleId::parse(s).unwrap()
}

/// A dependency entry `g:a[:v]` with `g:a` exclusion patterns.
pub fn dep(s: &str, exclusions: &[&str]) -> Dependency {
    Dependency {
        exclusions: exclusions.iter().map(|e| Exclusion::parse(e)).collect(),
        ..Dependency::new(coords(s))
    }
}

/// In-memory POMs keyed by `g:a:v`.
///
/// Versions of the form `${name}` are substituted from the reference's
/// properties, then the caller's, then the POM's own.
#[derive(Default)]
pub struct FakePoms {
    poms: HashMap<String, Pom>,
    pub calls: Cell<usize>,
    pub requested: RefCell<Vec<String>>,
}

impl FakePoms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bom(self, coordinates: &str, managed: Vec<Dependency>) -> Self {
        self.bom_with_properties(coordinates, managed, &[])
    }

    pub fn bom_with_properties(
        mut self,
        coordinates: &str,
        managed: Vec<Dependency>,
        properties: &[(&str, &str)],
    ) -> Self {
        self.poms.insert(
            coordinates.to_string(),
            Pom {
                coordinates: coords(coordinates),
                managed_dependencies: managed,
                dependencies: Vec::new(),
                properties: properties
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        );
        self
    }

    pub fn pom(mut self, coordinates: &str, dependencies: Vec<Dependency>) -> Self {
        self.poms.insert(
            coordinates.to_string(),
            Pom {
                coordinates: coords(coordinates),
                managed_dependencies: Vec::new(),
                dependencies,
                properties: Properties::new(),
            },
        );
        self
    }
}

impl PomResolver for FakePoms {
    fn resolve_poms(
        &self,
        references: &[PomReference],
        properties: &Properties,
    ) -> miette::Result<Vec<Pom>> {
        self.calls.set(self.calls.get() + 1);
        references
            .iter()
            .map(|reference| {
                let key = reference.coordinates.to_string();
                self.requested.borrow_mut().push(key.clone());
                let Some(pom) = self.poms.get(&key) else {
                    miette::bail!("POM not found for {key}");
                };
                let mut pom = pom.clone();
                let lookup = |name: &str| {
                    reference
                        .properties
                        .get(name)
                        .or_else(|| properties.get(name))
                        .or_else(|| pom.properties.get(name))
                        .cloned()
                };
                let substituted: Vec<Option<String>> = pom
                    .managed_dependencies
                    .iter()
                    .map(|d| match d.coordinates.version.as_deref() {
                        Some(v) if v.starts_with("${") && v.ends_with('}') => {
                            lookup(&v[2..v.len() - 1])
                        }
                        other => other.map(str::to_string),
                    })
                    .collect();
                for (d, v) in pom.managed_dependencies.iter_mut().zip(substituted) {
                    d.coordinates.version = v;
                }
                Ok(pom)
            })
            .collect()
    }
}

/// A breadth-first resolver over a fixed module table.
///
/// The first version selected for a module wins, exclude rules remove a
/// module everywhere, and requests without a usable version are unresolved.
/// Dynamic versions select the highest known version.
#[derive(Default)]
pub struct FakeGraphResolver {
    modules: HashMap<ModuleVersion, Vec<Coordinates>>,
    projects: HashMap<String, ModuleVersion>,
    /// Every request seen, after interception.
    pub requests: Vec<DependencyRequest>,
    pub resolutions: usize,
}

impl FakeGraphResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `g:a:v` with its dependencies `g:a[:v]`.
    pub fn module(mut self, coordinates: &str, dependencies: &[&str]) -> Self {
        let c = coords(coordinates);
        let mv = ModuleVersion::new(
            c.group_id,
            c.artifact_id,
            c.version.unwrap_or_default(),
        );
        self.modules
            .insert(mv, dependencies.iter().map(|d| coords(d)).collect());
        self
    }

    pub fn project(mut self, path: &str, coordinates: &str) -> Self {
        let c = coords(coordinates);
        self.projects.insert(
            path.to_string(),
            ModuleVersion::new(c.group_id, c.artifact_id, c.version.unwrap_or_default()),
        );
        self
    }

    fn pick_version(&self, id: &ModuleId, wanted: &str) -> Option<String> {
        if !version::is_dynamic(wanted) {
            return Some(wanted.to_string());
        }
        self.modules
            .keys()
            .filter(|mv| mv.id() == *id)
            .map(|mv| mv.version.clone())
            .max()
    }
}

impl GraphResolver for FakeGraphResolver {
    fn resolve(
        &mut self,
        configuration: &Configuration,
        interceptor: &mut dyn DependencyInterceptor,
    ) -> miette::Result<ResolvedGraph> {
        self.resolutions += 1;
        let mut builder = GraphBuilder::new(ComponentIdentity::Project {
            path: ":".into(),
            module: ModuleVersion::new("com.example", "root", "1.0"),
        });
        let root = builder.root();
        let mut selected: HashMap<ModuleId, ComponentId> = HashMap::new();
        let mut expanded: HashSet<ComponentId> = HashSet::new();

        let direct: Vec<ComponentSelector> = configuration
            .dependencies
            .iter()
            .map(|d| match d {
                DeclaredDependency::Module(c) => ComponentSelector::Module(c.clone()),
                DeclaredDependency::Project(path) => ComponentSelector::Project(path.clone()),
            })
            .collect();
        let mut queue = VecDeque::from([(root, direct)]);

        while let Some((from, selectors)) = queue.pop_front() {
            for requested in selectors {
                if let ComponentSelector::Project(path) = &requested {
                    let Some(module) = self.projects.get(path).cloned() else {
                        builder.add_dependency(
                            from,
                            DependencyResult::Unresolved {
                                attempted: requested.clone(),
                                failure: format!("no project {path}"),
                            },
                        );
                        continue;
                    };
                    let target = builder.add_component(ComponentIdentity::Project {
                        path: path.clone(),
                        module,
                    });
                    builder.add_dependency(
                        from,
                        DependencyResult::Resolved {
                            requested: requested.clone(),
                            selected: target,
                        },
                    );
                    continue;
                }
                let Some(module_id) = requested.module_id() else {
                    continue;
                };
                if configuration.excludes(&module_id) {
                    continue;
                }

                let mut request = DependencyRequest::new(requested.clone());
                interceptor.intercept(&mut request)?;
                self.requests.push(request.clone());

                if let Some(&existing) = selected.get(&module_id) {
                    builder.add_dependency(
                        from,
                        DependencyResult::Resolved {
                            requested,
                            selected: existing,
                        },
                    );
                    continue;
                }

                let version = request
                    .target_version()
                    .and_then(|v| self.pick_version(&module_id, v));
                let found = version.and_then(|v| {
                    let mv = ModuleVersion::new(&module_id.group, &module_id.artifact, v);
                    self.modules.get(&mv).map(|deps| (mv, deps.clone()))
                });
                let Some((mv, deps)) = found else {
                    builder.add_dependency(
                        from,
                        DependencyResult::Unresolved {
                            attempted: requested,
                            failure: format!("could not resolve {module_id}"),
                        },
                    );
                    continue;
                };

                let target = builder.add_component(ComponentIdentity::Module(mv));
                selected.insert(module_id, target);
                builder.add_dependency(
                    from,
                    DependencyResult::Resolved {
                        requested,
                        selected: target,
                    },
                );
                if expanded.insert(target) {
                    queue.push_back((
                        target,
                        deps.into_iter().map(ComponentSelector::Module).collect(),
                    ));
                }
            }
        }

        for constraint in &configuration.constraints {
            builder.add_dependency(
                root,
                DependencyResult::Constraint {
                    requested: ComponentSelector::Module(constraint.clone()),
                    selected: selected.get(&constraint.id()).copied(),
                },
            );
        }
        Ok(builder.build())
    }
}

/// `g:a:v` of every external module in `graph`, sorted.
pub fn modules(graph: &ResolvedGraph) -> Vec<String> {
    let mut modules: Vec<String> = graph.external_modules().map(ToString::to_string).collect();
    modules.sort();
    modules
}
