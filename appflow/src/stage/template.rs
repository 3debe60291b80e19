//! Placeholder substitution for stage description templates.
//!
//! Templates reference values as `{name}`, where `name` is an upstream stage
//! identifier or a run-level parameter (`prompt`, `docs_uploaded`). Doubled
//! braces (`{{`, `}}`) escape literal braces. References are validated when
//! the graph is built, so rendering a validated stage cannot fail.

use std::collections::HashMap;

/// Returns the placeholder names referenced by a template, in order of first
/// appearance.
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    for_each_token(template, |token| {
        if let Token::Placeholder(name) = token {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    });
    names
}

/// Renders a template, substituting each `{name}` with its value.
///
/// Placeholders without a value are left verbatim; build-time validation
/// guarantees that does not happen for stages inside a pipeline.
#[must_use]
pub fn render(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    for_each_token(template, |token| match token {
        Token::Literal(s) => out.push_str(s),
        Token::Placeholder(name) => match values.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        },
    });
    out
}

enum Token<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn for_each_token<'a>(template: &'a str, mut f: impl FnMut(Token<'a>)) {
    let bytes = template.as_bytes();
    let mut pos = 0;
    let mut literal_start = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' if bytes.get(pos + 1) == Some(&b'{') => {
                f(Token::Literal(&template[literal_start..=pos]));
                pos += 2;
                literal_start = pos;
            }
            b'}' if bytes.get(pos + 1) == Some(&b'}') => {
                f(Token::Literal(&template[literal_start..=pos]));
                pos += 2;
                literal_start = pos;
            }
            b'{' => {
                let name_start = pos + 1;
                let end = template[name_start..].find('}').map(|i| name_start + i);
                match end {
                    Some(end) if is_identifier(&template[name_start..end]) => {
                        f(Token::Literal(&template[literal_start..pos]));
                        f(Token::Placeholder(&template[name_start..end]));
                        pos = end + 1;
                        literal_start = pos;
                    }
                    _ => pos += 1,
                }
            }
            _ => pos += 1,
        }
    }

    if literal_start < template.len() {
        f(Token::Literal(&template[literal_start..]));
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
