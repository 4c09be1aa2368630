//! Path-sensitive exclusion computation over a trial graph.
//!
//! A graph resolver applies exclude rules everywhere, while a Maven
//! exclusion only prunes the subtree below the dependency that declares it.
//! [`compute_exclusions`] walks a trial graph breadth-first, carrying the
//! exclusion patterns accumulated along the path that first reached each
//! component, and reports the modules that no surviving path reaches. Those
//! can then be excluded flatly with the same effect.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::rc::Rc;

use depman_core::configuration::ExcludeRule;
use depman_core::coordinates::ModuleId;
use depman_core::exclusion::{Exclusion, Exclusions};

use crate::graph::{ComponentId, DependencyResult, ResolvedGraph};

/// Result of one exclusion computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionOutcome {
    /// Modules reachable without crossing a matching exclusion.
    pub included: BTreeSet<ModuleId>,
    /// Candidates that are not included.
    pub excluded: BTreeSet<ModuleId>,
}

impl ExclusionOutcome {
    pub fn exclude_rules(&self) -> Vec<ExcludeRule> {
        self.excluded.iter().cloned().map(ExcludeRule::from).collect()
    }
}

type PatternSet = Rc<BTreeSet<Exclusion>>;

/// Compute which modules of `graph` Maven exclusions would prune.
///
/// `declared` holds build-declared exclusions and `from_poms` the exclusions
/// found in the POMs of the graph's components; both are keyed by the
/// dependency whose children they apply to.
pub fn compute_exclusions(
    graph: &ResolvedGraph,
    declared: &Exclusions,
    from_poms: &Exclusions,
) -> ExclusionOutcome {
    let candidates = candidates(graph);
    let included = included(graph, declared, from_poms);
    let excluded = candidates.difference(&included).cloned().collect();
    ExclusionOutcome { included, excluded }
}

/// Every module a resolved or unresolved edge points at.
fn candidates(graph: &ResolvedGraph) -> BTreeSet<ModuleId> {
    let mut candidates = BTreeSet::new();
    for (_, component) in graph.components() {
        for dependency in &component.dependencies {
            match dependency {
                DependencyResult::Resolved { selected, .. } => {
                    candidates.insert(graph.component(*selected).identity.module_id());
                }
                DependencyResult::Unresolved { attempted, .. } => {
                    candidates.extend(attempted.module_id());
                }
                DependencyResult::Constraint { .. } => {}
            }
        }
    }
    candidates
}

fn included(
    graph: &ResolvedGraph,
    declared: &Exclusions,
    from_poms: &Exclusions,
) -> BTreeSet<ModuleId> {
    let mut included = BTreeSet::new();
    let mut seen: HashSet<ComponentId> = HashSet::new();
    let mut queue: VecDeque<(ComponentId, PatternSet)> = VecDeque::new();

    seen.insert(graph.root());
    queue.push_back((graph.root(), Rc::new(BTreeSet::new())));

    while let Some((node, inherited)) = queue.pop_front() {
        let component = graph.component(node);
        let id = component.identity.module_id();
        let patterns = extend(&inherited, &id, declared, from_poms);
        included.insert(id);

        for dependency in &component.dependencies {
            match dependency {
                DependencyResult::Resolved { selected, .. } => {
                    let child = graph.component(*selected).identity.module_id();
                    if is_excluded(&patterns, &child) {
                        tracing::debug!("{child} is excluded below {}", component.identity);
                        continue;
                    }
                    if seen.insert(*selected) {
                        queue.push_back((*selected, Rc::clone(&patterns)));
                    }
                }
                DependencyResult::Unresolved { attempted, .. } => {
                    if let Some(child) = attempted.module_id() {
                        if !is_excluded(&patterns, &child) {
                            included.insert(child);
                        }
                    }
                }
                DependencyResult::Constraint { .. } => {}
            }
        }
    }
    included
}

/// `inherited` plus the exclusions registered against `owner`. Shares the
/// inherited set when `owner` adds nothing.
fn extend(
    inherited: &PatternSet,
    owner: &ModuleId,
    declared: &Exclusions,
    from_poms: &Exclusions,
) -> PatternSet {
    let own: Vec<&Exclusion> = declared
        .exclusions_for(owner)
        .into_iter()
        .chain(from_poms.exclusions_for(owner))
        .flatten()
        .filter(|e| !inherited.contains(*e))
        .collect();
    if own.is_empty() {
        return Rc::clone(inherited);
    }
    let mut patterns = BTreeSet::clone(inherited);
    patterns.extend(own.into_iter().cloned());
    Rc::new(patterns)
}

fn is_excluded(patterns: &BTreeSet<Exclusion>, id: &ModuleId) -> bool {
    patterns.iter().any(|pattern| pattern.matches(id))
}
