//! KDL configuration parsing for glpipe.
//!
//! This crate handles parsing of:
//! - Flavour specification documents (flavours.kdl)
//! - Credential spec declarations
//! - Environment-driven render parameters

pub mod document;
pub mod error;
pub mod params;

pub use document::{FlavourConfig, parse_document};
pub use error::{ConfigError, ConfigResult};
pub use params::RenderParams;
