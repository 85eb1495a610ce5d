//! Local secret configuration backend.
//!
//! Each spec's source file is read from local configuration. With the
//! `PLAINTEXT` cipher the payload is used verbatim; with `AES256-GCM` the
//! file holds base64 of a 12-byte nonce followed by the ciphertext, decrypted
//! with the base64-encoded 256-bit key supplied by the caller.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use glpipe_core::credential::{
    CipherAlgorithm, CredentialOrigin, CredentialSource, CredentialSpec, ResolvedCredential,
    SecretPayload,
};
use glpipe_core::{Error, Result};
use std::time::Duration;

/// Nonce length for AES-GCM, prefixed to the ciphertext.
const NONCE_LEN: usize = 12;

pub struct LocalSecretSource {
    cipher: CipherAlgorithm,
    /// Base64-encoded 32-byte key; only consulted for encrypted ciphers.
    cipher_key: Option<String>,
    timeout: Duration,
}

impl LocalSecretSource {
    pub fn new(cipher: CipherAlgorithm, cipher_key: Option<String>, timeout: Duration) -> Self {
        Self {
            cipher,
            cipher_key,
            timeout,
        }
    }

    fn decrypt(&self, cfg_type: &str, contents: &str) -> Result<String> {
        let key_b64 =
            self.cipher_key
                .as_deref()
                .ok_or_else(|| Error::DecryptionFailed {
                    cfg_type: cfg_type.to_string(),
                    reason: "no cipher key provided".to_string(),
                })?;

        let key = BASE64
            .decode(key_b64)
            .map_err(|e| Error::DecryptionFailed {
                cfg_type: cfg_type.to_string(),
                reason: format!("cipher key is not valid base64: {e}"),
            })?;
        if key.len() != 32 {
            return Err(Error::DecryptionFailed {
                cfg_type: cfg_type.to_string(),
                reason: format!("cipher key must be 32 bytes, got {}", key.len()),
            });
        }

        let raw = BASE64
            .decode(contents.trim())
            .map_err(|e| Error::DecryptionFailed {
                cfg_type: cfg_type.to_string(),
                reason: format!("ciphertext is not valid base64: {e}"),
            })?;
        if raw.len() < NONCE_LEN {
            return Err(Error::DecryptionFailed {
                cfg_type: cfg_type.to_string(),
                reason: "ciphertext shorter than nonce".to_string(),
            });
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::DecryptionFailed {
                cfg_type: cfg_type.to_string(),
                reason: "bad key or ciphertext".to_string(),
            })?;

        String::from_utf8(plaintext).map_err(|_| Error::DecryptionFailed {
            cfg_type: cfg_type.to_string(),
            reason: "decrypted payload is not valid UTF-8".to_string(),
        })
    }
}

#[async_trait]
impl CredentialSource for LocalSecretSource {
    async fn fetch(&self, spec: &CredentialSpec) -> Result<ResolvedCredential> {
        let read = tokio::fs::read_to_string(&spec.source_file);
        let contents = tokio::time::timeout(self.timeout, read)
            .await
            .map_err(|_| Error::CredentialUnavailable {
                cfg_type: spec.cfg_type.clone(),
                reason: format!("reading {} timed out", spec.source_file.display()),
            })?
            .map_err(|e| Error::CredentialUnavailable {
                cfg_type: spec.cfg_type.clone(),
                reason: format!("cannot read {}: {e}", spec.source_file.display()),
            })?;

        let material = match self.cipher {
            CipherAlgorithm::Plaintext => contents,
            CipherAlgorithm::Aes256Gcm => self.decrypt(&spec.cfg_type, &contents)?,
        };

        Ok(ResolvedCredential {
            payload: SecretPayload::new(material),
            origin: CredentialOrigin::LocalSecret,
            cipher: self.cipher,
        })
    }

    fn origin(&self) -> CredentialOrigin {
        CredentialOrigin::LocalSecret
    }
}
