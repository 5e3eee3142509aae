//! Postman v2.1 collection documents, reduced to the fields a request
//! template needs.
//!
//! # Design
//! These types mirror the collection JSON closely so it can be loaded with a
//! plain `serde_json::from_str`. Fields the format allows in more than one
//! shape (a URL as a bare string or an object, a host as a string or a list,
//! a description as a string or `{content}`) are normalized on load. Unknown
//! fields are ignored. `method` stays a string here; it is checked against
//! [`HttpMethod`] when the template is validated so a typo is reported with
//! the template's name instead of as a parse error.

use serde::{Deserialize, Deserializer};

use crate::error::ResolveError;
use crate::http::HttpMethod;
use crate::token;

/// Top-level collection document.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub info: CollectionInfo,
    #[serde(default)]
    pub item: Vec<Item>,
    /// Collection-scoped variables, used beneath the caller's environment.
    #[serde(default)]
    pub variable: Vec<Variable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub description: Option<Description>,
}

/// A request or a folder of further items.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub item: Option<Vec<Item>>,
    #[serde(default)]
    pub request: Option<RequestTemplate>,
}

/// A single templated HTTP request.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestTemplate {
    /// Filled in from the owning item when the collection is loaded.
    #[serde(skip)]
    pub name: String,
    pub method: String,
    #[serde(default)]
    pub header: Vec<Header>,
    #[serde(default)]
    pub body: Option<Body>,
    pub url: UrlTemplate,
    #[serde(default)]
    pub description: Option<Description>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub options: Option<BodyOptions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodyOptions {
    #[serde(default)]
    pub raw: Option<RawOptions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOptions {
    #[serde(default)]
    pub language: Option<String>,
}

impl Body {
    /// Declared language of a raw body, e.g. `json`.
    pub fn language(&self) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|o| o.raw.as_ref())
            .and_then(|r| r.language.as_deref())
    }

    /// A missing mode with raw content is read as raw.
    pub fn is_raw(&self) -> bool {
        matches!(self.mode.as_deref(), Some("raw") | None) && self.raw.is_some()
    }
}

/// A templated URL, always held in decomposed form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "UrlRepr")]
pub struct UrlTemplate {
    pub raw: String,
    pub protocol: Option<String>,
    pub host: Vec<String>,
    pub port: Option<String>,
    pub path: Vec<String>,
    pub query: Vec<QueryParam>,
    pub variable: Vec<PathVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryParam {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

/// A `:name` path variable declaration with its example value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathVariable {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<Description>,
}

/// Collection-scoped variable. Values may be any JSON scalar.
#[derive(Debug, Clone, Deserialize)]
pub struct Variable {
    pub key: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub disabled: bool,
}

impl Variable {
    pub fn value_text(&self) -> Option<String> {
        self.value.as_ref().map(value_text)
    }
}

/// Render a JSON scalar as the string a placeholder would expand to.
pub(crate) fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Rich { content: String },
}

impl Description {
    pub fn text(&self) -> &str {
        match self {
            Description::Text(s) => s,
            Description::Rich { content } => content,
        }
    }
}

impl RequestTemplate {
    /// Check the template can be resolved at all, independent of any
    /// environment.
    pub fn validate(&self) -> Result<HttpMethod, ResolveError> {
        let method_name = self.method.trim();
        if method_name.is_empty() {
            return Err(ResolveError::MalformedTemplate(format!(
                "{}: empty method",
                self.name
            )));
        }
        let method = method_name.parse::<HttpMethod>().map_err(|_| {
            ResolveError::MalformedTemplate(format!("{}: unknown method {method_name}", self.name))
        })?;
        if self.url.raw.trim().is_empty() && self.url.host.is_empty() {
            return Err(ResolveError::MalformedTemplate(format!(
                "{}: empty url",
                self.name
            )));
        }
        for text in self.template_texts() {
            token::tokenize(text)?;
        }
        if let Some(body) = &self.body {
            match body.mode.as_deref() {
                None | Some("raw") | Some("none") => {}
                Some(other) => {
                    return Err(ResolveError::MalformedTemplate(format!(
                        "{}: unsupported body mode {other}",
                        self.name
                    )))
                }
            }
        }
        Ok(method)
    }

    /// Every string in the template that may carry `{{name}}` tokens.
    pub(crate) fn template_texts(&self) -> impl Iterator<Item = &str> {
        let url = &self.url;
        url.host
            .iter()
            .map(String::as_str)
            .chain(url.port.as_deref())
            .chain(url.path.iter().map(String::as_str))
            .chain(url.query.iter().filter(|q| !q.disabled).flat_map(|q| {
                std::iter::once(q.key.as_str()).chain(q.value.as_deref())
            }))
            .chain(url.variable.iter().filter_map(|v| v.value.as_deref()))
            .chain(
                self.header
                    .iter()
                    .filter(|h| !h.disabled)
                    .flat_map(|h| [h.key.as_str(), h.value.as_str()]),
            )
            .chain(self.raw_body())
    }

    /// Raw body text, if the body is in raw mode.
    pub fn raw_body(&self) -> Option<&str> {
        self.body
            .as_ref()
            .filter(|b| b.is_raw())
            .and_then(|b| b.raw.as_deref())
    }

    pub fn path_variable(&self, key: &str) -> Option<&PathVariable> {
        self.url.variable.iter().find(|v| v.key == key)
    }
}

// ---------------------------------------------------------------------------
// URL normalization
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum UrlRepr {
    Raw(String),
    Structured {
        #[serde(default)]
        raw: Option<String>,
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default, deserialize_with = "one_or_many")]
        host: Vec<String>,
        #[serde(default)]
        port: Option<String>,
        #[serde(default, deserialize_with = "one_or_many")]
        path: Vec<String>,
        #[serde(default)]
        query: Vec<QueryParam>,
        #[serde(default)]
        variable: Vec<PathVariable>,
    },
}

impl From<UrlRepr> for UrlTemplate {
    fn from(repr: UrlRepr) -> Self {
        match repr {
            UrlRepr::Raw(raw) => UrlTemplate::from_raw(&raw),
            UrlRepr::Structured {
                raw,
                protocol,
                host,
                port,
                path,
                query,
                variable,
            } => {
                let raw = raw.unwrap_or_default();
                if host.is_empty() && !raw.is_empty() {
                    let mut parsed = UrlTemplate::from_raw(&raw);
                    parsed.variable = variable;
                    if !query.is_empty() {
                        parsed.query = query;
                    }
                    return parsed;
                }
                UrlTemplate {
                    raw,
                    protocol,
                    host,
                    port: port.filter(|p| !p.is_empty()),
                    path,
                    query,
                    variable,
                }
            }
        }
    }
}

impl UrlTemplate {
    /// Decompose a raw templated URL such as `{{baseUrl}}/payments/:id?x=1`.
    pub fn from_raw(raw: &str) -> Self {
        let (before_query, query_str) = match raw.split_once('?') {
            Some((head, q)) => (head, Some(q)),
            None => (raw, None),
        };
        let (protocol, rest) = match before_query.split_once("://") {
            Some((scheme, rest)) if !scheme.contains('/') && !scheme.contains("{{") => {
                (Some(scheme.to_string()), rest)
            }
            _ => (None, before_query),
        };
        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, path),
            None => (rest, ""),
        };
        let (host, port) = split_port(authority);
        let query = query_str
            .map(|q| {
                q.split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| match pair.split_once('=') {
                        Some((k, v)) => QueryParam {
                            key: k.to_string(),
                            value: Some(v.to_string()),
                            disabled: false,
                        },
                        None => QueryParam {
                            key: pair.to_string(),
                            value: None,
                            disabled: false,
                        },
                    })
                    .collect()
            })
            .unwrap_or_default();

        UrlTemplate {
            raw: raw.to_string(),
            protocol,
            host: if host.is_empty() {
                Vec::new()
            } else {
                vec![host.to_string()]
            },
            port: port.map(str::to_string),
            path: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query,
            variable: Vec::new(),
        }
    }
}

/// Split `host:port` where the port is numeric or a single `{{name}}` token.
fn split_port(authority: &str) -> (&str, Option<&str>) {
    match authority.rsplit_once(':') {
        Some((host, port))
            if !host.is_empty() && (is_numeric(port) || is_single_token(port)) =>
        {
            (host, Some(port))
        }
        _ => (authority, None),
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_single_token(s: &str) -> bool {
    s.starts_with("{{") && s.ends_with("}}") && s.matches("{{").count() == 1
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => s.split('/').filter(|p| !p.is_empty()).map(str::to_string).collect(),
        OneOrMany::Many(v) => v,
    })
}
