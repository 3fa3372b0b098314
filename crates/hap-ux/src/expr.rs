//! Template expressions: `{{ }}` splitting and lowering to view-model access.
//!
//! Lowering prefixes every free identifier with `vm.` so that the expression
//! becomes a closure over the view model passed to the render function.
//! Member names, object keys, literals, well-known globals and loop locals
//! are left alone.

/// Part of an attribute value or text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Expr(String),
}

/// Split text on `{{ ... }}`. Fails with the byte offset of an unterminated
/// `{{`.
pub fn split_interpolation(text: &str) -> Result<Vec<Segment>, usize> {
    let mut segments = Vec::new();
    let mut rest = text;
    let mut consumed = 0;

    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or(consumed + open)?;
        if open > 0 {
            segments.push(Segment::Literal(rest[..open].to_string()));
        }
        segments.push(Segment::Expr(after[..close].trim().to_string()));
        let advance = open + 2 + close + 2;
        consumed += advance;
        rest = &rest[advance..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    Ok(segments)
}

pub fn has_interpolation(text: &str) -> bool {
    text.contains("{{")
}

/// Directive values may be written with or without `{{ }}`.
pub fn strip_braces(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("{{")
        .and_then(|inner| inner.strip_suffix("}}"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

const RESERVED: &[&str] = &[
    "true", "false", "null", "undefined", "this", "typeof", "instanceof", "in", "of", "new", "void", "delete",
    "NaN", "Infinity", "Math", "JSON", "Date", "Number", "String", "Boolean", "Array", "Object", "RegExp",
    "parseInt", "parseFloat", "isNaN", "isFinite", "encodeURIComponent", "decodeURIComponent", "console",
];

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Dot,
    Spread,
    Open(char),
    Comma,
    Other,
}

/// Lower an expression for use inside the render function.
pub fn lower(expr: &str, locals: &[String]) -> Result<String, String> {
    let chars: Vec<(usize, char)> = expr.char_indices().collect();
    let mut out = String::with_capacity(expr.len() + 16);
    let mut brackets: Vec<char> = Vec::new();
    let mut prev = Prev::Start;
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];

        if c.is_whitespace() {
            out.push(c);
            i += 1;
            continue;
        }

        if c == '"' || c == '\'' || c == '`' {
            let mut j = i + 1;
            let mut closed = false;
            while j < chars.len() {
                match chars[j].1 {
                    '\\' => j += 2,
                    q if q == c => {
                        closed = true;
                        break;
                    }
                    _ => j += 1,
                }
            }
            if !closed {
                return Err(format!("unterminated string in '{expr}'"));
            }
            let end = chars.get(j + 1).map_or(expr.len(), |&(offset, _)| offset);
            out.push_str(&expr[start..end]);
            prev = Prev::Other;
            i = j + 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_digit())) {
            let mut j = i;
            while j < chars.len() && (chars[j].1.is_ascii_alphanumeric() || chars[j].1 == '.') {
                j += 1;
            }
            let end = chars.get(j).map_or(expr.len(), |&(offset, _)| offset);
            out.push_str(&expr[start..end]);
            prev = Prev::Other;
            i = j;
            continue;
        }

        if is_ident_start(c) {
            let mut j = i;
            while j < chars.len() && is_ident_part(chars[j].1) {
                j += 1;
            }
            let end = chars.get(j).map_or(expr.len(), |&(offset, _)| offset);
            let ident = &expr[start..end];
            let next = chars[j..].iter().map(|(_, c)| *c).find(|c| !c.is_whitespace());
            let in_object_head = brackets.last() == Some(&'{') && matches!(prev, Prev::Open('{') | Prev::Comma);

            if in_object_head && next == Some(':') {
                out.push_str(ident);
            } else if in_object_head && matches!(next, Some(',') | Some('}')) && !RESERVED.contains(&ident) {
                out.push_str(ident);
                out.push_str(": ");
                push_reference(&mut out, ident, locals);
            } else if prev == Prev::Dot || RESERVED.contains(&ident) {
                out.push_str(ident);
            } else {
                push_reference(&mut out, ident, locals);
            }
            prev = Prev::Other;
            i = j;
            continue;
        }

        match c {
            '(' | '[' | '{' => {
                brackets.push(c);
                prev = Prev::Open(c);
            }
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if brackets.pop() != Some(expected) {
                    return Err(format!("unbalanced '{c}' in '{expr}'"));
                }
                prev = Prev::Other;
            }
            '.' => {
                if expr[start..].starts_with("...") {
                    out.push_str("...");
                    prev = Prev::Spread;
                    i += 3;
                    continue;
                }
                prev = Prev::Dot;
            }
            ',' => prev = Prev::Comma,
            '?' if chars.get(i + 1).is_some_and(|&(_, n)| n == '.') => {
                out.push_str("?.");
                prev = Prev::Dot;
                i += 2;
                continue;
            }
            _ => prev = Prev::Other,
        }
        out.push(c);
        i += 1;
    }

    if let Some(open) = brackets.last() {
        return Err(format!("unclosed '{open}' in '{expr}'"));
    }
    Ok(out)
}

fn push_reference(out: &mut String, ident: &str, locals: &[String]) {
    if !locals.iter().any(|local| local == ident) {
        out.push_str("vm.");
    }
    out.push_str(ident);
}

/// Lower a mixed literal/interpolation value to a JavaScript expression.
pub fn lower_segments(segments: &[Segment], locals: &[String]) -> Result<String, String> {
    let mut parts = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Literal(text) => parts.push(js_string(text)),
            Segment::Expr(expr) => parts.push(format!("({})", lower(expr, locals)?)),
        }
    }
    if parts.is_empty() {
        return Ok("\"\"".to_string());
    }
    if parts.len() == 1 && !matches!(segments[0], Segment::Literal(_)) {
        return Ok(parts.remove(0));
    }
    if matches!(segments[0], Segment::Expr(_)) {
        parts.insert(0, "\"\"".to_string());
    }
    Ok(parts.join(" + "))
}

/// JSON string literal, valid JavaScript.
pub fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Loop header of a `for` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForHeader {
    pub item: String,
    pub index: String,
    pub list: String,
}

/// Parse `list`, `item in list` or `(index, item) in list`.
pub fn parse_for(value: &str) -> Result<ForHeader, String> {
    let value = strip_braces(value);
    let Some((head, list)) = split_in(value) else {
        return Ok(ForHeader {
            item: "$item".to_string(),
            index: "$idx".to_string(),
            list: value.to_string(),
        });
    };

    let head = head.trim();
    let (index, item) = match head.strip_prefix('(').and_then(|h| h.strip_suffix(')')) {
        Some(pair) => match pair.split_once(',') {
            Some((index, item)) => (index.trim().to_string(), item.trim().to_string()),
            None => ("$idx".to_string(), pair.trim().to_string()),
        },
        None => ("$idx".to_string(), head.to_string()),
    };

    for name in [&index, &item] {
        let mut chars = name.chars();
        let valid = chars.next().is_some_and(is_ident_start) && chars.all(is_ident_part);
        if !valid {
            return Err(format!("invalid loop variable '{name}' in for=\"{value}\""));
        }
    }
    if list.trim().is_empty() {
        return Err(format!("missing list in for=\"{value}\""));
    }

    Ok(ForHeader {
        item,
        index,
        list: list.trim().to_string(),
    })
}

fn split_in(value: &str) -> Option<(&str, &str)> {
    let mut search = 0;
    while let Some(found) = value[search..].find(" in ") {
        let at = search + found;
        let head = &value[..at];
        let depth = head.matches('(').count() as isize - head.matches(')').count() as isize;
        if depth == 0 {
            return Some((head, &value[at + 4..]));
        }
        search = at + 4;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locals(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn splits_interpolations() {
        assert_eq!(
            split_interpolation("Hi {{ name }}!").unwrap(),
            vec![
                Segment::Literal("Hi ".into()),
                Segment::Expr("name".into()),
                Segment::Literal("!".into()),
            ]
        );
        assert_eq!(split_interpolation("a {{ b").unwrap_err(), 2);
    }

    #[test]
    fn prefixes_free_identifiers() {
        assert_eq!(lower("a + b.c", &[]).unwrap(), "vm.a + vm.b.c");
        assert_eq!(lower("ok ? 'yes' : no", &[]).unwrap(), "vm.ok ? 'yes' : vm.no");
        assert_eq!(lower("list.length > 0 && !hidden", &[]).unwrap(), "vm.list.length > 0 && !vm.hidden");
        assert_eq!(lower("Math.max(a, 1.5)", &[]).unwrap(), "Math.max(vm.a, 1.5)");
        assert_eq!(lower("user?.name", &[]).unwrap(), "vm.user?.name");
    }

    #[test]
    fn object_keys_and_locals() {
        assert_eq!(lower("{ color: c, size }", &[]).unwrap(), "{ color: vm.c, size: vm.size }");
        assert_eq!(lower("item.name + idx", &locals(&["item", "idx"])).unwrap(), "item.name + idx");
        assert_eq!(lower("[...items]", &[]).unwrap(), "[...vm.items]");
    }

    #[test]
    fn rejects_broken_expressions() {
        assert!(lower("(a", &[]).is_err());
        assert!(lower("a)", &[]).is_err());
        assert!(lower("'abc", &[]).is_err());
    }

    #[test]
    fn lowers_segments() {
        let segments = split_interpolation("w-{{ width }}px").unwrap();
        assert_eq!(lower_segments(&segments, &[]).unwrap(), r#""w-" + (vm.width) + "px""#);
        let segments = split_interpolation("{{ width }}").unwrap();
        assert_eq!(lower_segments(&segments, &[]).unwrap(), "(vm.width)");
        let segments = split_interpolation("{{ a }}{{ b }}").unwrap();
        assert_eq!(lower_segments(&segments, &[]).unwrap(), r#""" + (vm.a) + (vm.b)"#);
    }

    #[test]
    fn parses_loop_headers() {
        assert_eq!(
            parse_for("{{ list }}").unwrap(),
            ForHeader {
                item: "$item".into(),
                index: "$idx".into(),
                list: "list".into()
            }
        );
        assert_eq!(parse_for("item in items").unwrap().item, "item");
        let header = parse_for("{{(i, row) in rows}}").unwrap();
        assert_eq!((header.index.as_str(), header.item.as_str(), header.list.as_str()), ("i", "row", "rows"));
        assert!(parse_for("(1x, y) in rows").is_err());
    }
}
