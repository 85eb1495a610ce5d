//! Central credential server backend.
//!
//! Each cfg type is fetched with a single GET against
//! `{endpoint}/cfg-types/{cfg_type}`. The server responds with the plaintext
//! secret material; an unreachable server or an unknown cfg type fails the
//! run with `CredentialUnavailable`.

use async_trait::async_trait;
use glpipe_core::credential::{
    CipherAlgorithm, CredentialOrigin, CredentialSource, CredentialSpec, ResolvedCredential,
    SecretPayload,
};
use glpipe_core::{Error, Result};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

#[derive(Debug)]
pub struct CentralServerSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl CentralServerSource {
    /// Build a source against `endpoint`, bounding every fetch by `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            Error::InvalidSpec(format!("invalid credential server endpoint '{endpoint}': {e}"))
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidSpec(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    fn cfg_type_url(&self, cfg_type: &str) -> Result<Url> {
        // Url::join treats a path without trailing slash as a file; normalize.
        let base = if self.endpoint.path().ends_with('/') {
            self.endpoint.clone()
        } else {
            let mut url = self.endpoint.clone();
            url.set_path(&format!("{}/", url.path()));
            url
        };
        base.join(&format!("cfg-types/{cfg_type}"))
            .map_err(|e| Error::CredentialUnavailable {
                cfg_type: cfg_type.to_string(),
                reason: format!("cannot build fetch URL: {e}"),
            })
    }
}

#[async_trait]
impl CredentialSource for CentralServerSource {
    async fn fetch(&self, spec: &CredentialSpec) -> Result<ResolvedCredential> {
        let url = self.cfg_type_url(&spec.cfg_type)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            Error::CredentialUnavailable {
                cfg_type: spec.cfg_type.clone(),
                reason: format!("credential server unreachable: {e}"),
            }
        })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(Error::CredentialUnavailable {
                    cfg_type: spec.cfg_type.clone(),
                    reason: "cfg type unknown to credential server".to_string(),
                });
            }
            status => {
                return Err(Error::CredentialUnavailable {
                    cfg_type: spec.cfg_type.clone(),
                    reason: format!("credential server answered {status}"),
                });
            }
        }

        let material = response
            .text()
            .await
            .map_err(|e| Error::CredentialUnavailable {
                cfg_type: spec.cfg_type.clone(),
                reason: format!("cannot read credential server response: {e}"),
            })?;

        Ok(ResolvedCredential {
            payload: SecretPayload::new(material),
            origin: CredentialOrigin::CentralServer,
            cipher: CipherAlgorithm::Plaintext,
        })
    }

    fn origin(&self) -> CredentialOrigin {
        CredentialOrigin::CentralServer
    }
}
