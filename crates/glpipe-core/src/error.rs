//! Error types for glpipe.
//!
//! Every failure of a render invocation terminates the whole run with one of
//! these kinds; partial pipeline generation is never surfaced to callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or empty flavour rule, or a violated generation precondition.
    #[error("invalid flavour spec: {0}")]
    InvalidSpec(String),

    /// A referenced flavour-set name is absent from the document.
    #[error("unknown flavour set: '{0}'")]
    UnknownSet(String),

    /// Remote fetch failure, missing local source, or unknown cfg type.
    #[error("credential unavailable for cfg type '{cfg_type}': {reason}")]
    CredentialUnavailable { cfg_type: String, reason: String },

    /// Bad key or ciphertext for a locally stored secret.
    #[error("decryption failed for cfg type '{cfg_type}': {reason}")]
    DecryptionFailed { cfg_type: String, reason: String },

    /// Cipher algorithm name not recognized by this build.
    #[error("unsupported cipher algorithm: '{0}'")]
    UnsupportedCipher(String),
}

pub type Result<T> = std::result::Result<T, Error>;
