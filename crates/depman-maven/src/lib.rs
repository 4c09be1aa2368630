//! Maven POM handling: POM parsing, effective model building and the
//! POM resolver service consumed by dependency management.

pub mod model;
pub mod pom;
pub mod repository;
