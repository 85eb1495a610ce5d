//! The `render` command: the full resolver pipeline in one invocation.
//!
//! Load document → expand flavours → resolve target → resolve credentials →
//! generate definitions. Any failure terminates the run before anything is
//! emitted; partial definition sequences are never printed.

use anyhow::Result;
use glpipe_config::RenderParams;
use glpipe_core::credential::CipherAlgorithm;
use glpipe_core::target::{BuildTarget, resolve_target};
use glpipe_core::Error;
use glpipe_generator::GeneratorContext;
use std::time::Duration;
use tracing::info;

/// Command-line overrides on top of the environment-driven parameters.
#[derive(Debug, Default)]
pub struct RenderOverrides {
    pub target: Option<BuildTarget>,
    pub flavour_set: Option<String>,
    pub namespace: Option<String>,
    pub branch: Option<String>,
    pub oci_path: Option<String>,
}

pub async fn render(config_path: &str, overrides: RenderOverrides, timeout_secs: u64) -> Result<()> {
    let text = std::fs::read_to_string(config_path)?;
    let config = glpipe_config::parse_document(&text).map_err(Error::from)?;

    let mut params = RenderParams::from_env().map_err(Error::from)?;
    if let Some(target) = overrides.target {
        params.target = target;
    }
    if let Some(flavour_set) = overrides.flavour_set {
        params.flavour_set = flavour_set;
    }
    if let Some(namespace) = overrides.namespace {
        params.namespace = namespace;
    }
    if let Some(branch) = overrides.branch {
        params.branch = branch;
    }
    if let Some(oci_path) = overrides.oci_path {
        params.oci_path = Some(oci_path);
    }

    let flavours = config.flavours.get(&params.flavour_set)?.expand()?;
    info!(
        set = %params.flavour_set,
        target = %params.target,
        count = flavours.len(),
        "expanded flavour set"
    );

    let plans = resolve_target(params.target, flavours);

    // Only the cfg types the requested progression needs get resolved; the
    // last stage's requirements subsume all earlier ones.
    let timeout = Duration::from_secs(timeout_secs);
    let cipher = CipherAlgorithm::parse(&params.cipher_algorithm)?;
    let mode = glpipe_credentials::select_mode(
        params.secrets_server_endpoint.as_deref(),
        cipher,
    );
    let specs = glpipe_credentials::specs_for_cfg_types(
        &config.credentials,
        params.target.required_cfg_types(),
    )?;
    let source = glpipe_credentials::source_for_mode(&mode, params.cipher_key.clone(), timeout)?;
    let credentials = glpipe_credentials::resolve(&specs, source.as_ref()).await?;

    let context = GeneratorContext {
        namespace: params.namespace.clone(),
        branch: params.branch.clone(),
        oci_path: params.oci_path.clone(),
    };
    let definitions = glpipe_generator::generate(&plans, &credentials, &context)?;

    if definitions.is_empty() {
        info!("flavour set expands to zero flavours; nothing to render");
    }
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}
