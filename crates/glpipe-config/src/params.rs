//! Environment-driven render parameters.
//!
//! Every parameter carries the documented default; empty environment values
//! count as unset so an exported-but-blank variable never flips a mode.

use crate::{ConfigError, ConfigResult};
use glpipe_core::target::BuildTarget;

/// Parameters of one render invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderParams {
    /// Orchestrator namespace the definitions target.
    pub namespace: String,
    /// Requested build target.
    pub target: BuildTarget,
    /// Name of the flavour set to expand.
    pub flavour_set: String,
    /// Branch the pipelines build from.
    pub branch: String,
    /// OCI repository path; required for stages pushing to a registry.
    pub oci_path: Option<String>,
    /// Central credential server endpoint; absence selects local-secret mode.
    pub secrets_server_endpoint: Option<String>,
    /// Cipher algorithm name for locally stored secrets.
    pub cipher_algorithm: String,
    /// Base64-encoded key for locally stored encrypted secrets.
    pub cipher_key: Option<String>,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            namespace: "gardenlinux".to_string(),
            target: BuildTarget::Build,
            flavour_set: "all".to_string(),
            branch: "main".to_string(),
            oci_path: None,
            secrets_server_endpoint: None,
            cipher_algorithm: "AES256-GCM".to_string(),
            cipher_key: None,
        }
    }
}

impl RenderParams {
    /// Build params from the process environment, falling back to defaults.
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();

        let target = match env_var("GLPIPE_BUILD_TARGET") {
            Some(raw) => raw
                .parse::<BuildTarget>()
                .map_err(|message| ConfigError::InvalidValue {
                    field: "GLPIPE_BUILD_TARGET".to_string(),
                    message,
                })?,
            None => defaults.target,
        };

        Ok(Self {
            namespace: env_var("GLPIPE_NAMESPACE").unwrap_or(defaults.namespace),
            target,
            flavour_set: env_var("GLPIPE_FLAVOUR_SET").unwrap_or(defaults.flavour_set),
            branch: env_var("GLPIPE_BRANCH").unwrap_or(defaults.branch),
            oci_path: env_var("GLPIPE_OCI_PATH"),
            secrets_server_endpoint: env_var("SECRETS_SERVER_ENDPOINT"),
            cipher_algorithm: env_var("SECRETS_CIPHER_ALGORITHM")
                .unwrap_or(defaults.cipher_algorithm),
            cipher_key: env_var("SECRETS_CIPHER_KEY"),
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
