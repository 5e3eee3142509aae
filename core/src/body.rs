//! Raw body substitution.
//!
//! JSON bodies are substituted at the token level without parsing the
//! template first, since a template such as `{"amount": {{amount}}}` is not
//! valid JSON until it is resolved. A token inside a string literal receives
//! the JSON-escaped value; a bare token receives the value text verbatim, so
//! `{{amount}}` bound to `20000` becomes a number. Everything outside the
//! tokens is copied through unchanged, which keeps untemplated numbers and
//! booleans exactly as written.

use crate::error::{ResolveError, TokenLocation};
use crate::token::{self, Segment};

/// Tracks whether the scanner is inside a JSON string literal.
#[derive(Debug, Default)]
struct JsonLexState {
    in_string: bool,
    escaped: bool,
}

impl JsonLexState {
    fn advance(&mut self, literal: &str) {
        for c in literal.chars() {
            if !self.in_string {
                if c == '"' {
                    self.in_string = true;
                }
                continue;
            }
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
        }
    }
}

pub fn is_json(language: Option<&str>) -> bool {
    language.is_some_and(|l| l.eq_ignore_ascii_case("json"))
}

/// Substitute `{{name}}` tokens in a raw body.
pub fn substitute_body<F>(raw: &str, language: Option<&str>, mut lookup: F) -> Result<String, ResolveError>
where
    F: FnMut(&str) -> Result<Option<String>, ResolveError>,
{
    if !is_json(language) {
        return token::substitute(raw, TokenLocation::Body, lookup);
    }

    let mut out = String::with_capacity(raw.len());
    let mut state = JsonLexState::default();
    for segment in token::tokenize(raw)? {
        match segment {
            Segment::Literal(lit) => {
                state.advance(lit);
                out.push_str(lit);
            }
            Segment::Variable(name) => {
                let value =
                    lookup(name)?.ok_or_else(|| ResolveError::unresolved(name, TokenLocation::Body))?;
                if state.in_string {
                    out.push_str(&escape_json_fragment(&value));
                } else {
                    out.push_str(&value);
                }
                state.escaped = false;
            }
        }
    }

    serde_json::from_str::<serde_json::Value>(&out)
        .map_err(|e| ResolveError::InvalidBody(e.to_string()))?;
    Ok(out)
}

/// `value` escaped for embedding inside an existing JSON string literal.
fn escape_json_fragment(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
