//! Variable environments supplied by the caller at resolution time.
//!
//! # Design
//! An environment is an immutable name → string map. Templates only look
//! values up by name; they never own or mutate an environment. Layering is
//! expressed by `with_fallback`, which lets collection-scoped variables sit
//! beneath whatever the caller passes in.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::collection::value_text;
use crate::error::ResolveError;

/// Documented deployments of the payments API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Deployment {
    Sandbox,
    Production,
}

impl Deployment {
    pub fn base_url(self) -> &'static str {
        match self {
            Deployment::Sandbox => "https://sandbox.hyperswitch.io",
            Deployment::Production => "https://api.hyperswitch.io",
        }
    }
}

/// Header that carries the merchant's secret API key.
pub const API_KEY_HEADER: &str = "api-key";

/// Name → value bindings for `{{name}}` and `:name` tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableEnvironment {
    values: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct EnvironmentExport {
    #[serde(default)]
    values: Vec<ExportedValue>,
}

#[derive(Deserialize)]
struct ExportedValue {
    key: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl VariableEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment pre-seeded with `baseUrl` for a documented deployment.
    pub fn for_deployment(deployment: Deployment) -> Self {
        Self::new().with("baseUrl", deployment.base_url())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A new environment where `self` shadows `fallback`.
    pub fn with_fallback(&self, fallback: &VariableEnvironment) -> VariableEnvironment {
        let mut values = fallback.values.clone();
        values.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        VariableEnvironment { values }
    }

    /// Load a Postman environment export. Disabled entries are skipped.
    pub fn from_postman_json(text: &str) -> Result<Self, ResolveError> {
        let export: EnvironmentExport =
            serde_json::from_str(text).map_err(|e| ResolveError::Deserialization(e.to_string()))?;
        Ok(export
            .values
            .into_iter()
            .filter(|v| v.enabled)
            .map(|v| {
                let value = v.value.as_ref().map(value_text).unwrap_or_default();
                (v.key, value)
            })
            .collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
