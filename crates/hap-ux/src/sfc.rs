//! Top-level block extraction for `.ux` units.
//!
//! A unit is a sequence of `<import>` tags followed by at most one
//! `<template>`, `<style>` and `<script>` block each. Style and script
//! bodies are raw text found with memchr; the template body is handed to the
//! markup parser.

use memchr::memmem;

use crate::error::SyntaxError;
use crate::markup::{Attribute, parse_open_tag};

/// `<import name="x" src="./x">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTag {
    pub name: String,
    pub src: String,
    pub offset: usize,
}

/// A raw top-level block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub attrs: Vec<Attribute>,
    pub content: &'a str,
    /// Offset of `content` within the unit.
    pub content_offset: usize,
    /// Offset of the opening tag.
    pub offset: usize,
}

impl Block<'_> {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .and_then(|attr| attr.value.as_deref())
    }

    /// The `lang` attribute, defaulting to `default`.
    pub fn lang<'s>(&'s self, default: &'s str) -> &'s str {
        self.attr("lang").map(str::trim).filter(|lang| !lang.is_empty()).unwrap_or(default)
    }
}

/// All top-level blocks of a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UxDocument<'a> {
    pub imports: Vec<ImportTag>,
    pub template: Option<Block<'a>>,
    pub style: Option<Block<'a>>,
    pub script: Option<Block<'a>>,
}

pub(crate) fn extract(source: &str) -> Result<UxDocument<'_>, SyntaxError> {
    let bytes = source.as_bytes();
    let mut document = UxDocument::default();
    let mut pos = 0;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        if bytes[pos..].starts_with(b"<!--") {
            let end = memmem::find(&bytes[pos + 4..], b"-->")
                .ok_or_else(|| SyntaxError::new(pos, "unterminated comment"))?;
            pos += 4 + end + 3;
            continue;
        }

        if bytes[pos] != b'<' {
            return Err(SyntaxError::new(pos, "unexpected text outside of a block"));
        }

        let start = pos;
        let tag = parse_open_tag(source, pos, 0)?;
        pos = tag.end;

        match tag.name.as_str() {
            "import" => {
                document.imports.push(import_tag(&tag.attrs, start)?);
                if !tag.self_closing {
                    pos = skip_close(source, pos, "</import>");
                }
            }
            "template" | "style" | "script" => {
                let (content, content_offset, next) = if tag.self_closing {
                    ("", pos, pos)
                } else if tag.name == "template" {
                    let end = find_template_end(source, pos)
                        .ok_or_else(|| SyntaxError::new(start, "unclosed <template> block"))?;
                    (&source[pos..end], pos, end + "</template>".len())
                } else {
                    let close = format!("</{}>", tag.name);
                    let end = memmem::find(&bytes[pos..], close.as_bytes())
                        .map(|found| pos + found)
                        .ok_or_else(|| SyntaxError::new(start, format!("unclosed <{}> block", tag.name)))?;
                    (&source[pos..end], pos, end + close.len())
                };

                let block = Block {
                    attrs: tag.attrs,
                    content,
                    content_offset,
                    offset: start,
                };
                let slot = match tag.name.as_str() {
                    "template" => &mut document.template,
                    "style" => &mut document.style,
                    _ => &mut document.script,
                };
                if slot.is_some() {
                    return Err(SyntaxError::new(start, format!("duplicate <{}> block", tag.name)));
                }
                *slot = Some(block);
                pos = next;
            }
            other => {
                return Err(SyntaxError::new(start, format!("unexpected top-level element <{other}>")));
            }
        }
    }

    Ok(document)
}

fn import_tag(attrs: &[Attribute], offset: usize) -> Result<ImportTag, SyntaxError> {
    let value = |name: &str| {
        attrs
            .iter()
            .find(|attr| attr.name == name)
            .and_then(|attr| attr.value.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let src = value("src").ok_or_else(|| SyntaxError::new(offset, "<import> requires a 'src' attribute"))?;
    let name = match value("name") {
        Some(name) => name.to_string(),
        None => default_component_name(src),
    };
    Ok(ImportTag {
        name,
        src: src.to_string(),
        offset,
    })
}

/// `./comps/part-one.ux` -> `part-one`; `./comps/card` -> `card`;
/// `./comps/card/index` -> `card`.
fn default_component_name(src: &str) -> String {
    let trimmed = src.trim_end_matches('/');
    let mut segments = trimmed.rsplit('/');
    let last = segments.next().unwrap_or(trimmed);
    let stem = last.split('.').next().unwrap_or(last);
    if stem == "index" {
        if let Some(parent) = segments.next().filter(|p| !p.is_empty() && *p != "." && *p != "..") {
            return parent.to_string();
        }
    }
    stem.to_string()
}

fn skip_close(source: &str, pos: usize, close: &str) -> usize {
    let rest = &source[pos..];
    let trimmed = rest.trim_start();
    if trimmed.starts_with(close) {
        pos + (rest.len() - trimmed.len()) + close.len()
    } else {
        pos
    }
}

/// Find the `</template>` matching an already-consumed `<template>`,
/// honouring nested `<template>` elements.
fn find_template_end(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 1usize;
    let mut pos = from;
    while pos < bytes.len() {
        let next_lt = memchr::memchr(b'<', &bytes[pos..])? + pos;
        let rest = &source[next_lt..];
        if rest.starts_with("</template") && is_tag_boundary(bytes.get(next_lt + 10)) {
            depth -= 1;
            if depth == 0 {
                return Some(next_lt);
            }
        } else if rest.starts_with("<template") && is_tag_boundary(bytes.get(next_lt + 9)) {
            depth += 1;
        }
        pos = next_lt + 1;
    }
    None
}

fn is_tag_boundary(byte: Option<&u8>) -> bool {
    matches!(byte, Some(b' ' | b'\t' | b'\n' | b'\r' | b'>' | b'/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: &str = r#"<import name="comp-part" src="./comps/part"></import>
<import src="../Common/card/index.ux" />
<template>
  <div class="page"><template><text>nested</text></template></div>
</template>

<style>
  .page { flex-direction: column; }
</style>

<script>
  import fetch from '@system.fetch'
  export default { data: { title: 'x' } }
</script>
"#;

    #[test]
    fn extracts_every_block() {
        let doc = extract(UNIT).unwrap();
        assert_eq!(
            doc.imports.iter().map(|i| (i.name.as_str(), i.src.as_str())).collect::<Vec<_>>(),
            vec![("comp-part", "./comps/part"), ("card", "../Common/card/index.ux")]
        );
        let template = doc.template.unwrap();
        assert!(template.content.contains("<template><text>nested</text></template>"));
        assert_eq!(&UNIT[template.content_offset..template.content_offset + 3], "\n  ");
        assert!(doc.style.unwrap().content.contains(".page"));
        let script = doc.script.unwrap();
        assert_eq!(script.lang("js"), "js");
        assert!(script.content.contains("@system.fetch"));
    }

    #[test]
    fn rejects_duplicates_and_stray_text() {
        let err = extract("<script></script><script></script>").unwrap_err();
        assert_eq!(err.message, "duplicate <script> block");
        assert_eq!(err.offset, 17);

        let err = extract("hello").unwrap_err();
        assert_eq!(err.message, "unexpected text outside of a block");
    }

    #[test]
    fn unclosed_blocks_are_reported_at_the_open_tag() {
        let err = extract("<template>\n<div></div>").unwrap_err();
        assert_eq!(err.offset, 0);
        let err = extract("\n<style>.a{}").unwrap_err();
        assert_eq!(err.message, "unclosed <style> block");
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn import_requires_src() {
        let err = extract(r#"<import name="x"></import>"#).unwrap_err();
        assert!(err.message.contains("'src'"));
    }
}
