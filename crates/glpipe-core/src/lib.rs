//! Core domain types for the glpipe pipeline renderer.
//!
//! This crate contains:
//! - Flavour specification types and combination expansion
//! - Build target progression and stage resolution
//! - Credential specs, resolved bundles and the source abstraction
//! - The closed error set shared by all glpipe crates

pub mod credential;
pub mod error;
pub mod flavour;
pub mod target;

pub use error::{Error, Result};
pub use flavour::{CombinationRule, Flavour, FlavourDocument, FlavourSet, TestCategory};
pub use target::{BuildTarget, StagePlan};
