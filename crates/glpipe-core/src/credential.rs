//! Credential specs, resolved bundles and the source abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::{Error, Result};

/// Declares which named credential a pipeline needs and where its
/// template/definition lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSpec {
    pub cfg_type: String,
    pub source_file: PathBuf,
}

/// Opaque secret material. The `Debug` impl is redacted so payloads can
/// never leak through logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretPayload(String);

impl SecretPayload {
    pub fn new(material: impl Into<String>) -> Self {
        Self(material.into())
    }

    /// Access the raw material. Named loudly on purpose.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretPayload(<redacted>)")
    }
}

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialOrigin {
    CentralServer,
    LocalSecret,
}

/// Decryption method applied to locally stored credential material.
/// `PLAINTEXT` disables decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherAlgorithm {
    #[serde(rename = "PLAINTEXT")]
    Plaintext,
    #[serde(rename = "AES256-GCM")]
    Aes256Gcm,
}

impl CipherAlgorithm {
    /// Parse an algorithm name; unrecognized names are a terminating error.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "PLAINTEXT" => Ok(CipherAlgorithm::Plaintext),
            "AES256-GCM" => Ok(CipherAlgorithm::Aes256Gcm),
            other => Err(Error::UnsupportedCipher(other.to_string())),
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherAlgorithm::Plaintext => write!(f, "PLAINTEXT"),
            CipherAlgorithm::Aes256Gcm => write!(f, "AES256-GCM"),
        }
    }
}

/// One resolved secret, annotated with its origin and the cipher that
/// protected the source material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCredential {
    pub payload: SecretPayload,
    pub origin: CredentialOrigin,
    pub cipher: CipherAlgorithm,
}

/// Mapping from cfg type to resolved secret. Built once per invocation and
/// held only in memory for the duration of generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedCredentialBundle {
    entries: BTreeMap<String, ResolvedCredential>,
}

impl ResolvedCredentialBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cfg_type: impl Into<String>, credential: ResolvedCredential) {
        self.entries.insert(cfg_type.into(), credential);
    }

    pub fn get(&self, cfg_type: &str) -> Option<&ResolvedCredential> {
        self.entries.get(cfg_type)
    }

    pub fn cfg_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Extract the sub-bundle for the given cfg types.
    ///
    /// A missing entry is a hard failure; generation must never proceed with
    /// an incomplete credential set.
    pub fn subset(&self, cfg_types: &[&str]) -> Result<ResolvedCredentialBundle> {
        let mut out = ResolvedCredentialBundle::new();
        for cfg_type in cfg_types {
            let credential = self.entries.get(*cfg_type).ok_or_else(|| {
                Error::CredentialUnavailable {
                    cfg_type: cfg_type.to_string(),
                    reason: "not present in resolved bundle".to_string(),
                }
            })?;
            out.insert(*cfg_type, credential.clone());
        }
        Ok(out)
    }
}

/// A backend able to resolve a single credential spec.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Resolve one spec into a credential, or fail the whole run.
    async fn fetch(&self, spec: &CredentialSpec) -> Result<ResolvedCredential>;

    /// The origin this source stamps on resolved credentials.
    fn origin(&self) -> CredentialOrigin;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(material: &str) -> ResolvedCredential {
        ResolvedCredential {
            payload: SecretPayload::new(material),
            origin: CredentialOrigin::LocalSecret,
            cipher: CipherAlgorithm::Plaintext,
        }
    }

    #[test]
    fn test_debug_is_redacted() {
        let payload = SecretPayload::new("hunter2");
        let rendered = format!("{payload:?}");

        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_subset_extracts_exactly_requested_types() {
        let mut bundle = ResolvedCredentialBundle::new();
        bundle.insert("object-store", credential("s3"));
        bundle.insert("oci-registry", credential("ghcr"));

        let subset = bundle.subset(&["oci-registry"]).unwrap();
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.get("oci-registry").unwrap().payload.expose(), "ghcr");
    }

    #[test]
    fn test_subset_missing_type_is_a_hard_failure() {
        let bundle = ResolvedCredentialBundle::new();
        let err = bundle.subset(&["oci-registry"]).unwrap_err();

        assert!(matches!(err, Error::CredentialUnavailable { .. }));
    }

    #[test]
    fn test_cipher_parsing() {
        assert_eq!(
            CipherAlgorithm::parse("PLAINTEXT").unwrap(),
            CipherAlgorithm::Plaintext
        );
        assert_eq!(
            CipherAlgorithm::parse("AES256-GCM").unwrap(),
            CipherAlgorithm::Aes256Gcm
        );
        assert!(matches!(
            CipherAlgorithm::parse("ROT13"),
            Err(Error::UnsupportedCipher(_))
        ));
    }
}
