//! Turn a request template plus a variable environment into a request that
//! can be sent.
//!
//! # Design
//! Resolution is a pure function of its two inputs. Path segments of the
//! form `:name` take the environment's value for `name` first and the
//! template's declared example second; the example may itself contain
//! `{{name}}` tokens, which are resolved against the environment. Every
//! other string in the template only consults the environment. Bound values
//! are expanded in turn, so `baseUrl = https://{{host}}` works. A `:name`
//! segment never resolves to an empty string. The first token without a
//! value aborts resolution with `UnresolvedVariable`, so a half-substituted
//! request is never returned.

use tracing::{debug, warn};

use crate::body;
use crate::collection::RequestTemplate;
use crate::environment::VariableEnvironment;
use crate::error::{ResolveError, TokenLocation};
use crate::http::ResolvedRequest;
use crate::token::{self, Segment};

/// Kind of placeholder a template needs bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// `{{name}}`
    Variable,
    /// `:name` path segment
    PathParam,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub kind: PlaceholderKind,
}

/// Materialize `template` against `env`.
pub fn resolve(
    template: &RequestTemplate,
    env: &VariableEnvironment,
) -> Result<ResolvedRequest, ResolveError> {
    let result = materialize(template, env);
    match &result {
        Ok(req) => debug!(
            template = %template.name,
            tokens = placeholders(template).map_or(0, |p| p.len()),
            method = %req.method,
            url = %req.url,
            "resolved request template"
        ),
        Err(ResolveError::UnresolvedVariable { name, location }) => warn!(
            template = %template.name,
            variable = %name,
            %location,
            "request template has an unresolved variable"
        ),
        Err(err) => warn!(template = %template.name, error = %err, "request template rejected"),
    }
    result
}

/// Variable lookup that expands `{{name}}` tokens inside bound values.
///
/// A value that reaches itself again while expanding fails with
/// `RecursiveVariable`.
struct Lookup<'a> {
    env: &'a VariableEnvironment,
}

impl Lookup<'_> {
    fn value(&self, name: &str, location: TokenLocation) -> Result<Option<String>, ResolveError> {
        self.expand(name, location, &mut Vec::new())
    }

    fn expand(
        &self,
        name: &str,
        location: TokenLocation,
        visiting: &mut Vec<String>,
    ) -> Result<Option<String>, ResolveError> {
        let Some(raw) = self.env.get(name) else {
            return Ok(None);
        };
        // A value that is not a well-formed template is plain text.
        let segments = match token::tokenize(raw) {
            Ok(segments) if segments.iter().any(|s| matches!(s, Segment::Variable(_))) => segments,
            _ => return Ok(Some(raw.to_string())),
        };
        if visiting.iter().any(|v| v == name) {
            return Err(ResolveError::RecursiveVariable(name.to_string()));
        }

        visiting.push(name.to_string());
        let mut out = String::with_capacity(raw.len());
        for segment in segments {
            match segment {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Variable(inner) => {
                    let value = self
                        .expand(inner, location, visiting)?
                        .ok_or_else(|| ResolveError::unresolved(inner, location))?;
                    out.push_str(&value);
                }
            }
        }
        visiting.pop();
        Ok(Some(out))
    }
}

fn materialize(
    template: &RequestTemplate,
    env: &VariableEnvironment,
) -> Result<ResolvedRequest, ResolveError> {
    let method = template.validate()?;
    let vars = Lookup { env };
    let url = &template.url;

    let host = url
        .host
        .iter()
        .map(|seg| token::substitute(seg, TokenLocation::Url, |n| vars.value(n, TokenLocation::Url)))
        .collect::<Result<Vec<_>, _>>()?
        .join(".");
    let port = url
        .port
        .as_deref()
        .map(|p| token::substitute(p, TokenLocation::Url, |n| vars.value(n, TokenLocation::Url)))
        .transpose()?;

    let segments = url
        .path
        .iter()
        .map(|seg| resolve_path_segment(template, seg, &vars))
        .collect::<Result<Vec<_>, _>>()?;
    let path = format!("/{}", segments.join("/"));

    let query_lookup = |n: &str| vars.value(n, TokenLocation::Query);
    let mut query = Vec::new();
    let mut query_parts = Vec::new();
    for param in url.query.iter().filter(|q| !q.disabled) {
        let key = token::substitute(&param.key, TokenLocation::Query, query_lookup)?;
        match &param.value {
            Some(v) => {
                let value = token::substitute(v, TokenLocation::Query, query_lookup)?;
                query_parts.push(format!("{key}={value}"));
                query.push((key, value));
            }
            None => {
                query_parts.push(key.clone());
                query.push((key, String::new()));
            }
        }
    }

    let mut full_url = String::new();
    if let Some(protocol) = &url.protocol {
        full_url.push_str(protocol);
        full_url.push_str("://");
    }
    full_url.push_str(host.trim_end_matches('/'));
    if let Some(port) = port.filter(|p| !p.is_empty()) {
        full_url.push(':');
        full_url.push_str(&port);
    }
    if !segments.is_empty() {
        full_url.push_str(&path);
    }
    if !query_parts.is_empty() {
        full_url.push('?');
        full_url.push_str(&query_parts.join("&"));
    }

    let header_lookup = |n: &str| vars.value(n, TokenLocation::Header);
    let headers = template
        .header
        .iter()
        .filter(|h| !h.disabled)
        .map(|h| -> Result<(String, String), ResolveError> {
            Ok((
                token::substitute(&h.key, TokenLocation::Header, header_lookup)?,
                token::substitute(&h.value, TokenLocation::Header, header_lookup)?,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let body_language = template
        .body
        .as_ref()
        .and_then(|b| b.language())
        .map(str::to_string);
    let body = template
        .raw_body()
        .map(|raw| {
            body::substitute_body(raw, body_language.as_deref(), |n| {
                vars.value(n, TokenLocation::Body)
            })
        })
        .transpose()?;

    Ok(ResolvedRequest {
        method,
        url: full_url,
        path,
        query,
        headers,
        body,
        body_language,
    })
}

fn resolve_path_segment(
    template: &RequestTemplate,
    segment: &str,
    vars: &Lookup<'_>,
) -> Result<String, ResolveError> {
    let Some(name) = token::path_param(segment) else {
        return token::substitute(segment, TokenLocation::Url, |n| vars.value(n, TokenLocation::Url));
    };
    // An empty binding would collapse the segment, so it counts as unbound.
    if let Some(value) = vars
        .value(name, TokenLocation::PathVariable)?
        .filter(|v| !v.is_empty())
    {
        return Ok(value);
    }
    let example = template
        .path_variable(name)
        .and_then(|v| v.value.as_deref())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ResolveError::unresolved(name, TokenLocation::PathVariable))?;
    let value = token::substitute(example, TokenLocation::PathVariable, |n| {
        vars.value(n, TokenLocation::PathVariable)
    })?;
    if value.is_empty() {
        return Err(ResolveError::unresolved(name, TokenLocation::PathVariable));
    }
    Ok(value)
}

/// Distinct placeholders `template` needs, in order of first appearance.
///
/// A `:name` path parameter with a declared example is listed together with
/// the `{{...}}` tokens inside that example, since either binding satisfies it.
pub fn placeholders(template: &RequestTemplate) -> Result<Vec<Placeholder>, ResolveError> {
    let mut found: Vec<Placeholder> = Vec::new();
    let mut push = |name: &str, kind: PlaceholderKind| {
        if !found.iter().any(|p| p.name == name && p.kind == kind) {
            found.push(Placeholder {
                name: name.to_string(),
                kind,
            });
        }
    };

    for seg in template.url.host.iter().chain(template.url.port.as_ref()) {
        for name in token::variables(seg)? {
            push(name, PlaceholderKind::Variable);
        }
    }
    for seg in &template.url.path {
        match token::path_param(seg) {
            Some(name) => {
                push(name, PlaceholderKind::PathParam);
                if let Some(example) = template.path_variable(name).and_then(|v| v.value.as_deref()) {
                    for inner in token::variables(example)? {
                        push(inner, PlaceholderKind::Variable);
                    }
                }
            }
            None => {
                for name in token::variables(seg)? {
                    push(name, PlaceholderKind::Variable);
                }
            }
        }
    }
    let rest = template
        .url
        .query
        .iter()
        .filter(|q| !q.disabled)
        .flat_map(|q| std::iter::once(q.key.as_str()).chain(q.value.as_deref()))
        .chain(
            template
                .header
                .iter()
                .filter(|h| !h.disabled)
                .flat_map(|h| [h.key.as_str(), h.value.as_str()]),
        )
        .chain(template.raw_body());
    for text in rest {
        for name in token::variables(text)? {
            push(name, PlaceholderKind::Variable);
        }
    }
    Ok(found)
}
