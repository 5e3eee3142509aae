//! HTTP request types for the host-does-IO pattern.
//!
//! # Design
//! A `ResolvedRequest` is plain data. The core crate materializes it from a
//! template and never touches the network; the caller (host) sends it with
//! whatever client it likes. All fields use owned types so values can cross
//! the FFI boundary without lifetime concerns.

use serde::{Deserialize, Serialize};

/// HTTP method for a request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

/// A fully materialized request with no placeholder tokens left.
///
/// Produced by [`crate::resolve`]. `url` is the complete target including
/// the query string; `path` and `query` are the same data decomposed for
/// clients that build URLs themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Declared language of `body`, e.g. `json`.
    pub body_language: Option<String>,
}

impl ResolvedRequest {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body parsed as JSON, when it is declared as JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        match (self.body_language.as_deref(), self.body.as_deref()) {
            (Some(lang), Some(body)) if lang.eq_ignore_ascii_case("json") => {
                serde_json::from_str(body).ok()
            }
            _ => None,
        }
    }
}
