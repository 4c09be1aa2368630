//! Core data types for depman.
//!
//! This crate defines the model shared by the POM layer and the resolver:
//! Maven coordinates and module ids, exclusion patterns, dependency
//! configurations, the local-module registry, version classification and the
//! `depman.toml` configuration file.
//!
//! This crate is intentionally free of POM handling and graph logic.

pub mod config;
pub mod configuration;
pub mod coordinates;
pub mod exclusion;
pub mod version;
