//! Error types for template loading, resolution and redirect signatures.
//!
//! # Design
//! `UnresolvedVariable` is the one error a well-formed collection can hit at
//! runtime: a placeholder with no bound value. It carries the token name and
//! where it was found so a caller can prompt for the missing value. The other
//! `ResolveError` variants are authoring problems surfaced while loading or
//! validating a collection.

use thiserror::Error;

/// Where in a template a placeholder was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TokenLocation {
    Url,
    PathVariable,
    Query,
    Header,
    Body,
}

/// Errors returned while loading or resolving request templates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A placeholder has no value in the environment or the template's
    /// declared examples.
    #[error("unresolved variable `{name}` in {location}")]
    UnresolvedVariable { name: String, location: TokenLocation },

    /// A variable's value refers back to itself through `{{...}}` tokens.
    #[error("variable `{0}` refers to itself")]
    RecursiveVariable(String),

    /// No template with this name exists in the store.
    #[error("unknown request template: {0}")]
    UnknownTemplate(String),

    /// Two requests in one collection share a name.
    #[error("duplicate request template: {0}")]
    DuplicateTemplate(String),

    /// The template itself is not usable (bad method, empty URL, broken token).
    #[error("malformed template: {0}")]
    MalformedTemplate(String),

    /// A JSON body did not parse after substitution.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// The collection or environment document could not be deserialized.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ResolveError {
    pub(crate) fn unresolved(name: &str, location: TokenLocation) -> Self {
        Self::UnresolvedVariable {
            name: name.to_string(),
            location,
        }
    }
}

/// Errors returned while reading or verifying a signed redirect URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid redirect url: {0}")]
    InvalidRedirect(String),

    #[error("redirect url carries no signature")]
    MissingSignature,

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signature is not valid hex: {0}")]
    Crypto(String),
}
