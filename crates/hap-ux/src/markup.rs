//! Markup scanning: attributes, elements and text of a template body.

use crate::error::SyntaxError;

/// `name` or `name="value"` on a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    /// Byte offset of the attribute name in the unit.
    pub offset: usize,
}

/// Template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Text),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    pub offset: usize,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|attr| attr.name == name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

/// Text with runs of whitespace collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub content: String,
    pub offset: usize,
}

/// Parsed opening tag.
#[derive(Debug, Clone)]
pub(crate) struct OpenTag {
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub self_closing: bool,
    /// Offset just past the closing `>`.
    pub end: usize,
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':' | b'.')
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Parse an opening tag at `start` (which points at `<`).
///
/// `base` is the offset of `source` within the unit and is added to every
/// reported position.
pub(crate) fn parse_open_tag(source: &str, start: usize, base: usize) -> Result<OpenTag, SyntaxError> {
    let bytes = source.as_bytes();
    let mut pos = start + 1;
    let name_start = pos;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    if pos == name_start {
        return Err(SyntaxError::new(base + start, "expected a tag name after '<'"));
    }
    let name = source[name_start..pos].to_string();

    let mut attrs = Vec::new();
    loop {
        pos = skip_whitespace(bytes, pos);
        match bytes.get(pos) {
            None => {
                return Err(SyntaxError::new(base + start, format!("unclosed tag <{name}>")));
            }
            Some(b'>') => {
                return Ok(OpenTag {
                    name,
                    attrs,
                    self_closing: false,
                    end: pos + 1,
                });
            }
            Some(b'/') if bytes.get(pos + 1) == Some(&b'>') => {
                return Ok(OpenTag {
                    name,
                    attrs,
                    self_closing: true,
                    end: pos + 2,
                });
            }
            Some(_) => {}
        }

        let attr_start = pos;
        while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && !matches!(bytes[pos], b'=' | b'>' | b'/') {
            pos += 1;
        }
        if pos == attr_start {
            return Err(SyntaxError::new(base + pos, format!("unexpected character in <{name}>")));
        }
        let attr_name = source[attr_start..pos].to_string();

        let after_name = skip_whitespace(bytes, pos);
        let value = if bytes.get(after_name) == Some(&b'=') {
            pos = skip_whitespace(bytes, after_name + 1);
            match bytes.get(pos) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let value_start = pos + 1;
                    let value_end = memchr::memchr(quote, &bytes[value_start..])
                        .map(|found| value_start + found)
                        .ok_or_else(|| {
                            SyntaxError::new(base + attr_start, format!("unterminated value of '{attr_name}'"))
                        })?;
                    pos = value_end + 1;
                    Some(source[value_start..value_end].to_string())
                }
                Some(_) => {
                    let value_start = pos;
                    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' {
                        pos += 1;
                    }
                    Some(source[value_start..pos].to_string())
                }
                None => {
                    return Err(SyntaxError::new(base + attr_start, format!("missing value of '{attr_name}'")));
                }
            }
        } else {
            None
        };

        attrs.push(Attribute {
            name: attr_name,
            value,
            offset: base + attr_start,
        });
    }
}

/// Parse a template body into its node forest.
///
/// Uses an explicit element stack, so nesting depth is bounded only by memory.
pub(crate) fn parse_nodes(source: &str, base: usize) -> Result<Vec<Node>, SyntaxError> {
    let bytes = source.as_bytes();
    let mut stack: Vec<Element> = Vec::new();
    let mut roots: Vec<Node> = Vec::new();
    let mut pos = 0;

    fn push_node(stack: &mut [Element], roots: &mut Vec<Node>, node: Node) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    while pos < bytes.len() {
        if bytes[pos..].starts_with(b"<!--") {
            let end = memchr::memmem::find(&bytes[pos + 4..], b"-->")
                .ok_or_else(|| SyntaxError::new(base + pos, "unterminated comment"))?;
            pos += 4 + end + 3;
            continue;
        }

        if bytes[pos..].starts_with(b"</") {
            let name_start = pos + 2;
            let mut name_end = name_start;
            while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
                name_end += 1;
            }
            let name = &source[name_start..name_end];
            let close = skip_whitespace(bytes, name_end);
            if bytes.get(close) != Some(&b'>') {
                return Err(SyntaxError::new(base + pos, format!("malformed closing tag </{name}")));
            }
            let element = stack
                .pop()
                .ok_or_else(|| SyntaxError::new(base + pos, format!("unexpected closing tag </{name}>")))?;
            if element.tag != name {
                return Err(SyntaxError::new(
                    base + pos,
                    format!("mismatched closing tag </{name}>, expected </{}>", element.tag),
                ));
            }
            push_node(&mut stack, &mut roots, Node::Element(element));
            pos = close + 1;
            continue;
        }

        if bytes[pos] == b'<' && bytes.get(pos + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
            let tag = parse_open_tag(source, pos, base)?;
            let element = Element {
                tag: tag.name,
                attrs: tag.attrs,
                children: Vec::new(),
                offset: base + pos,
            };
            if tag.self_closing {
                push_node(&mut stack, &mut roots, Node::Element(element));
            } else {
                stack.push(element);
            }
            pos = tag.end;
            continue;
        }

        let text_start = pos;
        pos = scan_text(source, pos).map_err(|offset| SyntaxError::new(base + offset, "unterminated '{{'"))?;
        let content = collapse_whitespace(&source[text_start..pos]);
        if !content.is_empty() {
            push_node(
                &mut stack,
                &mut roots,
                Node::Text(Text {
                    content,
                    offset: base + text_start,
                }),
            );
        }
    }

    if let Some(open) = stack.pop() {
        return Err(SyntaxError::new(open.offset, format!("unclosed element <{}>", open.tag)));
    }
    Ok(roots)
}

/// Advance over text up to the next tag, skipping `{{ ... }}` so that
/// comparisons inside interpolations are not taken for tags.
/// Returns the offset of the unterminated `{{` on failure.
fn scan_text(source: &str, mut pos: usize) -> Result<usize, usize> {
    let bytes = source.as_bytes();
    if bytes.get(pos) == Some(&b'<') {
        pos += 1;
    }
    while pos < bytes.len() {
        if bytes[pos..].starts_with(b"{{") {
            let close = memchr::memmem::find(&bytes[pos + 2..], b"}}").ok_or(pos)?;
            pos += 2 + close + 2;
            continue;
        }
        if bytes[pos] == b'<' {
            break;
        }
        pos += 1;
    }
    Ok(pos)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
