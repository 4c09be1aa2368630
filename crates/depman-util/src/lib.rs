//! Shared utilities for depman.
//!
//! Every other depman crate reports failures through [`errors::DepmanError`]
//! wrapped in a `miette::Report`.

pub mod errors;
