//! CSS to style object.
//!
//! The style object maps every selector to its declarations with property
//! names camelCased. Selectors and declarations keep source order; a
//! repeated selector is merged and later declarations win.

use indexmap::IndexMap;

use crate::error::SyntaxError;

/// `selector -> (property -> value)`.
pub type StyleObject = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssError {
    /// At-rules (`@media`, `@import`, ...) have no style object form.
    AtRule { name: String, offset: usize },
    Syntax(SyntaxError),
}

/// Parse a stylesheet. `base` is the offset of `css` within the unit.
pub fn parse_css(css: &str, base: usize) -> Result<StyleObject, CssError> {
    let masked = strip_comments(css);
    let bytes = masked.as_bytes();
    let mut object = StyleObject::new();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Ok(object);
        }

        if bytes[pos] == b'@' {
            let name_end = masked[pos + 1..]
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .map_or(masked.len(), |found| pos + 1 + found);
            return Err(CssError::AtRule {
                name: masked[pos..name_end].to_string(),
                offset: base + pos,
            });
        }

        let open = memchr::memchr2(b'{', b'}', &bytes[pos..])
            .map(|found| pos + found)
            .filter(|&found| bytes[found] == b'{')
            .ok_or_else(|| CssError::Syntax(SyntaxError::new(base + pos, "expected '{' after selector")))?;
        let close = memchr::memchr2(b'{', b'}', &bytes[open + 1..])
            .map(|found| open + 1 + found)
            .ok_or_else(|| CssError::Syntax(SyntaxError::new(base + open, "unclosed rule block")))?;
        if bytes[close] == b'{' {
            return Err(CssError::Syntax(SyntaxError::new(base + close, "nested rule blocks are not allowed")));
        }

        let selectors: Vec<String> = masked[pos..open]
            .split(',')
            .map(|selector| selector.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        if selectors.iter().any(String::is_empty) {
            return Err(CssError::Syntax(SyntaxError::new(base + pos, "empty selector")));
        }

        let declarations = parse_declarations(&masked[open + 1..close], base + open + 1)?;
        for selector in selectors {
            let entry = object.entry(selector).or_default();
            for (property, value) in &declarations {
                entry.insert(property.clone(), value.clone());
            }
        }
        pos = close + 1;
    }
}

fn parse_declarations(block: &str, base: usize) -> Result<Vec<(String, String)>, CssError> {
    let mut declarations = Vec::new();
    let mut offset = 0;
    for declaration in block.split(';') {
        let start = offset;
        offset += declaration.len() + 1;
        if declaration.trim().is_empty() {
            continue;
        }
        let (property, value) = declaration.split_once(':').ok_or_else(|| {
            CssError::Syntax(SyntaxError::new(
                base + start,
                format!("expected 'property: value', found '{}'", declaration.trim()),
            ))
        })?;
        let property = property.trim();
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        if property.is_empty() || value.is_empty() {
            return Err(CssError::Syntax(SyntaxError::new(base + start, "empty property or value")));
        }
        declarations.push((camel_case(property), value));
    }
    Ok(declarations)
}

/// `font-size` -> `fontSize`, `-webkit-line-clamp` -> `webkitLineClamp`.
pub fn camel_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len());
    for (index, part) in property.split('-').filter(|part| !part.is_empty()).enumerate() {
        if index == 0 {
            out.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Replace comment text with spaces, preserving byte offsets.
fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        let body = &rest[start..];
        let end = body[2..].find("*/").map_or(body.len(), |found| found + 4);
        for c in body[..end].chars() {
            if c == '\n' {
                out.push('\n');
            } else {
                out.extend(std::iter::repeat_n(' ', c.len_utf8()));
            }
        }
        rest = &body[end..];
    }
    out.push_str(rest);
    out
}

/// Serialize a style object as compact JSON.
pub fn to_json(object: &StyleObject) -> String {
    serde_json::to_string(object).unwrap_or_else(|_| "{}".to_string())
}
