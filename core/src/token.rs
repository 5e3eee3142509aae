//! Placeholder scanning.
//!
//! Two token forms exist: `{{name}}` anywhere in a string, and `:name` as a
//! whole URL path segment.

use crate::error::{ResolveError, TokenLocation};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A piece of a template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Variable(&'a str),
}

/// Split `text` into literal runs and `{{name}}` variables.
///
/// Names are trimmed, so `{{ baseUrl }}` and `{{baseUrl}}` are the same
/// token. An unclosed `{{` or an empty name is a malformed template.
pub fn tokenize(text: &str) -> Result<Vec<Segment<'_>>, ResolveError> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open.find(CLOSE).ok_or_else(|| {
            ResolveError::MalformedTemplate(format!("unclosed `{OPEN}` in {text:?}"))
        })?;
        let name = after_open[..end].trim();
        if name.is_empty() {
            return Err(ResolveError::MalformedTemplate(format!(
                "empty placeholder in {text:?}"
            )));
        }
        segments.push(Segment::Variable(name));
        rest = &after_open[end + CLOSE.len()..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

/// Names of the `{{name}}` tokens in `text`, in order of appearance.
pub fn variables(text: &str) -> Result<Vec<&str>, ResolveError> {
    Ok(tokenize(text)?
        .into_iter()
        .filter_map(|s| match s {
            Segment::Variable(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect())
}

/// True if `text` contains at least one `{{` opener.
pub fn has_placeholders(text: &str) -> bool {
    text.contains(OPEN)
}

/// The parameter name when `segment` is a `:name` path token.
pub fn path_param(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix(':')?;
    if !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Some(name)
    } else {
        None
    }
}

/// Replace every `{{name}}` in `text` using `lookup`.
///
/// `lookup` yields `Ok(None)` for an unbound name, which is reported as
/// `UnresolvedVariable` at `location`.
pub fn substitute<F>(text: &str, location: TokenLocation, mut lookup: F) -> Result<String, ResolveError>
where
    F: FnMut(&str) -> Result<Option<String>, ResolveError>,
{
    if !has_placeholders(text) {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    for segment in tokenize(text)? {
        match segment {
            Segment::Literal(lit) => out.push_str(lit),
            Segment::Variable(name) => {
                let value = lookup(name)?.ok_or_else(|| ResolveError::unresolved(name, location))?;
                out.push_str(&value);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_mixed_text() {
        let segs = tokenize("{{baseUrl}}/payments/{{ id }}x").unwrap();
        assert_eq!(
            segs,
            vec![
                Segment::Variable("baseUrl"),
                Segment::Literal("/payments/"),
                Segment::Variable("id"),
                Segment::Literal("x"),
            ]
        );
    }

    #[test]
    fn tokenize_plain_text() {
        assert_eq!(tokenize("plain").unwrap(), vec![Segment::Literal("plain")]);
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn tokenize_rejects_unclosed_and_empty() {
        assert!(matches!(
            tokenize("{{baseUrl"),
            Err(ResolveError::MalformedTemplate(_))
        ));
        assert!(matches!(
            tokenize("a{{ }}b"),
            Err(ResolveError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn single_braces_are_literal() {
        assert_eq!(
            tokenize(r#"{"a": 1}"#).unwrap(),
            vec![Segment::Literal(r#"{"a": 1}"#)]
        );
    }

    #[test]
    fn path_params_are_whole_segments() {
        assert_eq!(path_param(":id"), Some("id"));
        assert_eq!(path_param(":payment_id"), Some("payment_id"));
        assert_eq!(path_param("id"), None);
        assert_eq!(path_param(":"), None);
        assert_eq!(path_param(":a/b"), None);
    }

    #[test]
    fn substitute_reports_first_missing_name() {
        let err = substitute("{{a}}-{{b}}", TokenLocation::Url, |name| {
            Ok((name == "a").then(|| "1".to_string()))
        })
        .unwrap_err();
        assert_eq!(err, ResolveError::unresolved("b", TokenLocation::Url));
    }

    #[test]
    fn substitute_passes_lookup_errors_through() {
        let err = substitute("{{a}}", TokenLocation::Header, |name| {
            Err(ResolveError::RecursiveVariable(name.to_string()))
        })
        .unwrap_err();
        assert_eq!(err, ResolveError::RecursiveVariable("a".to_string()));
    }

    #[test]
    fn substitute_without_tokens_is_identity() {
        let out = substitute("no tokens here", TokenLocation::Body, |_| Ok(None)).unwrap();
        assert_eq!(out, "no tokens here");
    }
}
