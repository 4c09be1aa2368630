//! Maven dependency management on top of a graph resolver: managed versions
//! with BOM imports, per-edge version selection, and exclusion rules that
//! reproduce Maven's path-sensitive exclusions.

pub mod catalog;
pub mod container;
pub mod descriptor;
pub mod graph;
pub mod management;
pub mod selector;
pub mod session;
pub mod walker;
