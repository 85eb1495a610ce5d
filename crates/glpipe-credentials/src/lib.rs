//! Credential resolution backends for glpipe.
//!
//! Two mutually exclusive modes exist: fetching from a central credential
//! server, or reading a local (optionally encrypted) configuration bundle.
//! Mode selection is a pure function of the endpoint parameter, so callers
//! can never observe a mixed or absent mode.
//!
//! Resolution is all-or-nothing: a single unresolvable spec fails the whole
//! run and no bundle is produced.

pub mod central;
pub mod local;

use glpipe_core::credential::{
    CipherAlgorithm, CredentialSource, CredentialSpec, ResolvedCredentialBundle,
};
use glpipe_core::{Error, Result};
use std::time::Duration;
use tracing::{debug, info};

pub use central::CentralServerSource;
pub use local::LocalSecretSource;

/// Which credential source a run uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverMode {
    CentralServer { endpoint: String },
    LocalSecret { cipher: CipherAlgorithm },
}

/// Select the resolver mode from the invocation parameters.
///
/// A non-empty endpoint always selects the central server, regardless of the
/// cipher value; its absence always selects local secrets.
pub fn select_mode(endpoint: Option<&str>, cipher: CipherAlgorithm) -> ResolverMode {
    match endpoint {
        Some(endpoint) if !endpoint.trim().is_empty() => ResolverMode::CentralServer {
            endpoint: endpoint.trim().to_string(),
        },
        _ => ResolverMode::LocalSecret { cipher },
    }
}

/// Build the credential source for a mode.
///
/// `cipher_key` is the base64-encoded key for encrypted local secrets; it is
/// ignored in central-server mode. `timeout` bounds every fetch.
pub fn source_for_mode(
    mode: &ResolverMode,
    cipher_key: Option<String>,
    timeout: Duration,
) -> Result<Box<dyn CredentialSource>> {
    match mode {
        ResolverMode::CentralServer { endpoint } => {
            info!(%endpoint, "using central credential server");
            Ok(Box::new(CentralServerSource::new(endpoint, timeout)?))
        }
        ResolverMode::LocalSecret { cipher } => {
            info!(%cipher, "using local secret configuration");
            Ok(Box::new(LocalSecretSource::new(*cipher, cipher_key, timeout)))
        }
    }
}

/// Pick the declared specs for the required cfg types, preserving the
/// requested order.
///
/// A required cfg type without a declared spec has no resolvable source,
/// which is a hard failure for the whole run.
pub fn specs_for_cfg_types(
    specs: &[CredentialSpec],
    required: &[&str],
) -> Result<Vec<CredentialSpec>> {
    required
        .iter()
        .map(|cfg_type| {
            specs
                .iter()
                .find(|s| s.cfg_type == *cfg_type)
                .cloned()
                .ok_or_else(|| Error::CredentialUnavailable {
                    cfg_type: cfg_type.to_string(),
                    reason: "no credential spec declared for this cfg type".to_string(),
                })
        })
        .collect()
}

/// Resolve all specs against one source, in order, all-or-nothing.
///
/// The returned bundle contains exactly the cfg types present in `specs`.
pub async fn resolve(
    specs: &[CredentialSpec],
    source: &dyn CredentialSource,
) -> Result<ResolvedCredentialBundle> {
    let mut bundle = ResolvedCredentialBundle::new();
    for spec in specs {
        debug!(cfg_type = %spec.cfg_type, "resolving credential");
        let credential = source.fetch(spec).await?;
        bundle.insert(&spec.cfg_type, credential);
    }
    Ok(bundle)
}
