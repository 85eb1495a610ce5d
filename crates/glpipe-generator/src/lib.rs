//! Pipeline definition generation.
//!
//! Joins expanded flavours, the requested build target and the resolved
//! credential bundle into the ordered sequence of pipeline-definition
//! documents handed to the orchestrator. Emission is deterministic: identical
//! inputs always yield byte-for-byte identical sequences. Serialization to
//! the orchestrator's wire format is the caller's concern; this crate only
//! produces the structured records.

use glpipe_core::credential::ResolvedCredentialBundle;
use glpipe_core::flavour::Flavour;
use glpipe_core::target::{BuildTarget, StagePlan};
use glpipe_core::{Error, Result};
use serde::Serialize;
use tracing::debug;

/// Maximum length of an orchestrator object name (RFC 1123 label).
const MAX_NAME_LEN: usize = 63;

/// Invocation-scoped generation parameters with their documented defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorContext {
    pub namespace: String,
    pub branch: String,
    /// OCI repository path; required for stages pushing to a registry.
    pub oci_path: Option<String>,
}

impl Default for GeneratorContext {
    fn default() -> Self {
        Self {
            namespace: "gardenlinux".to_string(),
            branch: "main".to_string(),
            oci_path: None,
        }
    }
}

/// One pipeline-definition document, immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineDefinition {
    /// Orchestrator-safe object name, derived from flavour and stage.
    pub name: String,
    pub flavour: Flavour,
    pub target: BuildTarget,
    pub namespace: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oci_path: Option<String>,
    /// Exactly the credential subset this stage needs.
    pub credentials: ResolvedCredentialBundle,
}

/// Generate pipeline definitions for the given stage plans.
///
/// Emits one definition per (flavour, required stage), in flavour enumeration
/// order with stages in progression order. Fails before emitting anything if
/// a stage's credential subset is incomplete or a registry-pushing stage has
/// no OCI path; partial sequences are never returned.
pub fn generate(
    plans: &[StagePlan],
    credentials: &ResolvedCredentialBundle,
    context: &GeneratorContext,
) -> Result<Vec<PipelineDefinition>> {
    let mut definitions = Vec::new();

    for plan in plans {
        for stage in &plan.stages {
            definitions.push(render_definition(&plan.flavour, *stage, credentials, context)?);
        }
    }

    debug!(count = definitions.len(), "generated pipeline definitions");
    Ok(definitions)
}

fn render_definition(
    flavour: &Flavour,
    stage: BuildTarget,
    credentials: &ResolvedCredentialBundle,
    context: &GeneratorContext,
) -> Result<PipelineDefinition> {
    if stage.needs_oci_path() && context.oci_path.is_none() {
        return Err(Error::InvalidSpec(format!(
            "stage '{stage}' for flavour '{flavour}' requires an OCI path"
        )));
    }

    let subset = credentials.subset(stage.required_cfg_types())?;

    Ok(PipelineDefinition {
        name: run_name(flavour, stage),
        flavour: flavour.clone(),
        target: stage,
        namespace: context.namespace.clone(),
        branch: context.branch.clone(),
        oci_path: context.oci_path.clone(),
        credentials: subset,
    })
}

/// Render the orchestrator object name for one flavour and stage.
fn run_name(flavour: &Flavour, stage: BuildTarget) -> String {
    rfc1123_label(&format!("{}-{stage}", flavour.canonical_name()))
}

/// Sanitize a string to an RFC 1123 label: lowercase alphanumerics and
/// dashes, no leading/trailing dash, at most 63 characters.
fn rfc1123_label(raw: &str) -> String {
    let mut label = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            'a'..='z' | '0'..='9' => label.push(c),
            'A'..='Z' => label.push(c.to_ascii_lowercase()),
            _ => {
                if !label.is_empty() && !label.ends_with('-') {
                    label.push('-');
                }
            }
        }
    }
    let label = label.trim_end_matches('-');
    label.chars().take(MAX_NAME_LEN).collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glpipe_core::credential::{
        CipherAlgorithm, CredentialOrigin, ResolvedCredential, SecretPayload,
    };
    use glpipe_core::target::{CFG_TYPE_OBJECT_STORE, CFG_TYPE_OCI_REGISTRY, resolve_target};
    use std::collections::BTreeSet;

    fn flavour() -> Flavour {
        Flavour {
            architecture: "amd64".to_string(),
            platform: "aws".to_string(),
            modifiers: BTreeSet::from(["_prod", "gardener"].map(String::from)),
            fails: BTreeSet::new(),
        }
    }

    fn credential() -> ResolvedCredential {
        ResolvedCredential {
            payload: SecretPayload::new("material"),
            origin: CredentialOrigin::LocalSecret,
            cipher: CipherAlgorithm::Plaintext,
        }
    }

    fn full_bundle() -> ResolvedCredentialBundle {
        let mut bundle = ResolvedCredentialBundle::new();
        bundle.insert(CFG_TYPE_OBJECT_STORE, credential());
        bundle.insert(CFG_TYPE_OCI_REGISTRY, credential());
        bundle
    }

    #[test]
    fn test_build_target_emits_one_definition_without_credentials() {
        let plans = resolve_target(BuildTarget::Build, vec![flavour()]);
        let definitions = generate(
            &plans,
            &ResolvedCredentialBundle::new(),
            &GeneratorContext::default(),
        )
        .unwrap();

        assert_eq!(definitions.len(), 1);
        let def = &definitions[0];
        assert_eq!(def.target, BuildTarget::Build);
        assert_eq!(def.namespace, "gardenlinux");
        assert_eq!(def.branch, "main");
        assert_eq!(def.name, "aws-prod-gardener-amd64-build");
        assert!(def.credentials.is_empty());
    }

    #[test]
    fn test_publish_emits_full_progression_with_credential_subsets() {
        let plans = resolve_target(BuildTarget::Publish, vec![flavour()]);
        let context = GeneratorContext {
            oci_path: Some("ghcr.io/gardenlinux".to_string()),
            ..GeneratorContext::default()
        };
        let definitions = generate(&plans, &full_bundle(), &context).unwrap();

        let stages: Vec<BuildTarget> = definitions.iter().map(|d| d.target).collect();
        assert_eq!(stages, BuildTarget::Publish.required_stages());

        assert!(definitions[0].credentials.is_empty());
        assert_eq!(
            definitions[1].credentials.cfg_types().collect::<Vec<_>>(),
            vec![CFG_TYPE_OBJECT_STORE]
        );
        assert_eq!(
            definitions[3].credentials.cfg_types().collect::<Vec<_>>(),
            vec![CFG_TYPE_OBJECT_STORE, CFG_TYPE_OCI_REGISTRY]
        );
    }

    #[test]
    fn test_publish_without_oci_path_is_invalid() {
        let plans = resolve_target(BuildTarget::Publish, vec![flavour()]);
        let err = generate(&plans, &full_bundle(), &GeneratorContext::default()).unwrap_err();

        assert!(matches!(err, Error::InvalidSpec(_)));
    }

    #[test]
    fn test_missing_bundle_entry_fails_generation() {
        let plans = resolve_target(BuildTarget::Manifest, vec![flavour()]);
        let err = generate(
            &plans,
            &ResolvedCredentialBundle::new(),
            &GeneratorContext::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::CredentialUnavailable { .. }));
    }

    #[test]
    fn test_generation_is_idempotent() {
        let plans = resolve_target(BuildTarget::Publish, vec![flavour()]);
        let context = GeneratorContext {
            oci_path: Some("ghcr.io/gardenlinux".to_string()),
            ..GeneratorContext::default()
        };

        let first = generate(&plans, &full_bundle(), &context).unwrap();
        let second = generate(&plans, &full_bundle(), &context).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_zero_flavours_is_a_no_op() {
        let plans = resolve_target(BuildTarget::Build, vec![]);
        let definitions = generate(
            &plans,
            &ResolvedCredentialBundle::new(),
            &GeneratorContext::default(),
        )
        .unwrap();

        assert!(definitions.is_empty());
    }

    #[test]
    fn test_rfc1123_label_sanitization() {
        assert_eq!(rfc1123_label("aws-_prod-amd64-build"), "aws-prod-amd64-build");
        assert_eq!(rfc1123_label("AWS__chost_amd64"), "aws-chost-amd64");
        assert_eq!(rfc1123_label("-weird--input-"), "weird-input");

        let long = "x".repeat(100);
        assert_eq!(rfc1123_label(&long).len(), MAX_NAME_LEN);
    }
}
