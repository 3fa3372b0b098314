//! Script import scanning and rewriting.
//!
//! Every static dependency form is found with a small set of regexes run
//! over a copy of the script whose comments are blanked out:
//!
//! - `import x from '...'`, `import { a, b as c } from '...'`,
//!   `import * as ns from '...'`
//! - bare `import '...'`
//! - `export * from '...'`, `export { a } from '...'`
//! - `require('...')`
//!
//! Rewriting turns each form into a `$app_require$("<id>")` call and lowers
//! ES module exports onto `exports`.

use once_cell::sync::Lazy;
use regex::Regex;

static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s+([\w$*{}\s,]+?)\s*from\s*["']([^"'\n]+)["'][ \t]*;?"#).expect("valid regex")
});
static IMPORT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s*["']([^"'\n]+)["'][ \t]*;?"#).expect("valid regex"));
static EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bexport\s+(\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*["']([^"'\n]+)["'][ \t]*;?"#)
        .expect("valid regex")
});
static REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\brequire\s*\(\s*["']([^"'\n]+)["']\s*\)"#).expect("valid regex"));
static EXPORT_DEFAULT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bexport\s+default\s+").expect("valid regex"));
static EXPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bexport\s+((?:async\s+)?function\*?|class|const|let|var)\s+([\w$]+)").expect("valid regex")
});
static EXPORT_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bexport\s*\{([^}]*)\}[ \t]*;?").expect("valid regex"));

/// How a dependency is pulled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportForm {
    /// `import <clause> from '...'`.
    Bindings(ImportClause),
    /// `import '...'`.
    SideEffect,
    /// `export * from '...'`, `export * as ns from '...'` or
    /// `export { a, b as c } from '...'`.
    ReExport(String),
    /// `require('...')`, replaced in place.
    Require,
}

/// Parsed import clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportClause {
    pub default: Option<String>,
    pub namespace: Option<String>,
    /// `(imported, local)` pairs.
    pub named: Vec<(String, String)>,
}

/// One static dependency in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptImport {
    pub specifier: String,
    pub form: ImportForm,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExportEdit {
    Default,
    Declaration(String),
    List(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
struct Edit {
    start: usize,
    end: usize,
    kind: EditKind,
}

#[derive(Debug, Clone)]
enum EditKind {
    Import(usize),
    Export(ExportEdit),
}

/// Find every static dependency, in source order.
pub fn scan(source: &str) -> Vec<ScriptImport> {
    let lexed = lex(source);
    let masked = &lexed.masked;
    let mut found: Vec<ScriptImport> = Vec::new();

    for caps in IMPORT_FROM.captures_iter(masked) {
        let (Some(whole), Some(clause), Some(spec)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        found.push(ScriptImport {
            specifier: source[spec.range()].to_string(),
            form: ImportForm::Bindings(parse_clause(clause.as_str())),
            start: whole.start(),
            end: whole.end(),
        });
    }
    for caps in IMPORT_BARE.captures_iter(masked) {
        let (Some(whole), Some(spec)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        found.push(ScriptImport {
            specifier: source[spec.range()].to_string(),
            form: ImportForm::SideEffect,
            start: whole.start(),
            end: whole.end(),
        });
    }
    for caps in EXPORT_FROM.captures_iter(masked) {
        let (Some(whole), Some(clause), Some(spec)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        found.push(ScriptImport {
            specifier: source[spec.range()].to_string(),
            form: ImportForm::ReExport(clause.as_str().trim().to_string()),
            start: whole.start(),
            end: whole.end(),
        });
    }
    for caps in REQUIRE.captures_iter(masked) {
        let (Some(whole), Some(spec)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        found.push(ScriptImport {
            specifier: source[spec.range()].to_string(),
            form: ImportForm::Require,
            start: whole.start(),
            end: whole.end(),
        });
    }

    found.retain(|import| !lexed.in_string(import.start));
    found.sort_by_key(|import| import.start);
    let mut kept: Vec<ScriptImport> = Vec::with_capacity(found.len());
    for import in found {
        if kept.last().is_some_and(|last| import.start < last.end) {
            continue;
        }
        kept.push(import);
    }
    kept
}

fn parse_clause(clause: &str) -> ImportClause {
    let mut parsed = ImportClause::default();
    let clause = clause.trim();
    let (head, braces) = match clause.find('{') {
        Some(open) => (&clause[..open], Some(&clause[open..])),
        None => (clause, None),
    };

    for part in head.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        if let Some(ns) = part.strip_prefix('*') {
            let ns = ns.trim().trim_start_matches("as").trim();
            parsed.namespace = Some(ns.to_string());
        } else {
            parsed.default = Some(part.to_string());
        }
    }

    if let Some(braces) = braces {
        parsed.named = parse_specifier_list(braces.trim_start_matches('{').trim_end_matches('}'));
    }
    parsed
}

/// `a, b as c` -> `[(a, a), (b, c)]`.
fn parse_specifier_list(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once(" as ") {
            Some((imported, local)) => (imported.trim().to_string(), local.trim().to_string()),
            None => (item.to_string(), item.to_string()),
        })
        .collect()
}

/// Rewrite a script: dependencies become `$app_require$` calls and ES
/// module exports are assigned onto `exports`.
///
/// `resolved[i]` is the module id for `imports[i]`; `None` leaves that
/// statement untouched.
pub fn rewrite(source: &str, imports: &[ScriptImport], resolved: &[Option<String>]) -> String {
    let lexed = lex(source);
    let masked = &lexed.masked;
    let mut edits: Vec<Edit> = imports
        .iter()
        .enumerate()
        .map(|(index, import)| Edit {
            start: import.start,
            end: import.end,
            kind: EditKind::Import(index),
        })
        .collect();

    for found in EXPORT_DEFAULT.find_iter(masked) {
        edits.push(Edit {
            start: found.start(),
            end: found.end(),
            kind: EditKind::Export(ExportEdit::Default),
        });
    }
    for caps in EXPORT_DECL.captures_iter(masked) {
        let (Some(whole), Some(keyword), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        // keep the declaration, drop only the `export` keyword
        let keyword_start = keyword.start();
        edits.push(Edit {
            start: whole.start(),
            end: keyword_start,
            kind: EditKind::Export(ExportEdit::Declaration(name.as_str().to_string())),
        });
    }
    for caps in EXPORT_LIST.captures_iter(masked) {
        let (Some(whole), Some(list)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        edits.push(Edit {
            start: whole.start(),
            end: whole.end(),
            kind: EditKind::Export(ExportEdit::List(parse_specifier_list(list.as_str()))),
        });
    }

    edits.retain(|edit| !lexed.in_string(edit.start));
    edits.sort_by_key(|edit| edit.start);

    let mut body = String::with_capacity(source.len() + 64);
    let mut trailer = Vec::new();
    let mut cursor = 0;
    let mut uses_default_interop = false;
    let mut has_esm_exports = false;
    let mut reexport_count = 0;

    for edit in edits {
        if edit.start < cursor {
            continue;
        }
        body.push_str(&source[cursor..edit.start]);
        match edit.kind {
            EditKind::Import(index) => {
                let import = &imports[index];
                match resolved.get(index).and_then(Option::as_ref) {
                    Some(id) => {
                        let call = format!("$app_require$({})", crate::expr::js_string(id));
                        match &import.form {
                            ImportForm::Bindings(clause) => {
                                if clause.default.is_some() {
                                    uses_default_interop = true;
                                }
                                body.push_str(&bindings(clause, &call));
                            }
                            ImportForm::SideEffect => {
                                body.push_str(&call);
                                body.push(';');
                            }
                            ImportForm::ReExport(clause) => {
                                has_esm_exports = true;
                                body.push_str(&reexport(clause, &call, reexport_count));
                                reexport_count += 1;
                            }
                            ImportForm::Require => body.push_str(&call),
                        }
                    }
                    None => body.push_str(&source[edit.start..edit.end]),
                }
            }
            EditKind::Export(ExportEdit::Default) => {
                has_esm_exports = true;
                body.push_str("exports.default = ");
            }
            EditKind::Export(ExportEdit::Declaration(name)) => {
                has_esm_exports = true;
                trailer.push(format!("exports.{name} = {name};"));
            }
            EditKind::Export(ExportEdit::List(items)) => {
                has_esm_exports = true;
                for (local, exported) in items {
                    trailer.push(format!("exports.{exported} = {local};"));
                }
            }
        }
        cursor = edit.end;
    }
    body.push_str(&source[cursor..]);

    let mut out = String::with_capacity(body.len() + 128);
    if has_esm_exports {
        out.push_str("exports.__esModule = true;\n");
    }
    if uses_default_interop {
        out.push_str("var $app_default$ = function (m) { return m && m.__esModule ? m.default : m; };\n");
    }
    out.push_str(&body);
    if !trailer.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        for line in trailer {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

fn bindings(clause: &ImportClause, call: &str) -> String {
    let single = [clause.default.is_some(), clause.namespace.is_some(), !clause.named.is_empty()]
        .iter()
        .filter(|present| **present)
        .count()
        <= 1;

    if single {
        if let Some(default) = &clause.default {
            return format!("var {default} = $app_default$({call});");
        }
        if let Some(ns) = &clause.namespace {
            return format!("var {ns} = {call};");
        }
        if !clause.named.is_empty() {
            return format!("var {{ {} }} = {call};", destructure(&clause.named));
        }
        return format!("{call};");
    }

    let holder = clause
        .namespace
        .clone()
        .unwrap_or_else(|| format!("$app_m_{}$", clause.default.as_deref().unwrap_or("anon")));
    let mut out = format!("var {holder} = {call};");
    if let Some(default) = &clause.default {
        out.push_str(&format!(" var {default} = $app_default$({holder});"));
    }
    if !clause.named.is_empty() {
        out.push_str(&format!(" var {{ {} }} = {holder};", destructure(&clause.named)));
    }
    out
}

fn destructure(named: &[(String, String)]) -> String {
    named
        .iter()
        .map(|(imported, local)| {
            if imported == local {
                imported.clone()
            } else {
                format!("{imported}: {local}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn reexport(clause: &str, call: &str, index: usize) -> String {
    if clause == "*" {
        return format!("Object.assign(exports, {call});");
    }
    if let Some(ns) = clause.strip_prefix('*') {
        let ns = ns.trim().trim_start_matches("as").trim();
        return format!("exports.{ns} = {call};");
    }
    let holder = format!("$app_re{index}$");
    let mut out = format!("var {holder} = {call};");
    for (imported, exported) in parse_specifier_list(clause.trim_start_matches('{').trim_end_matches('}')) {
        out.push_str(&format!(" exports.{exported} = {holder}.{imported};"));
    }
    out
}

/// Script text with comments blanked out, plus the byte ranges of string
/// and template literals.
pub(crate) struct Lexed {
    pub masked: String,
    strings: Vec<(usize, usize)>,
}

impl Lexed {
    /// Returns `true` if `offset` lies inside a string literal.
    pub fn in_string(&self, offset: usize) -> bool {
        let index = self.strings.partition_point(|&(start, _)| start <= offset);
        index > 0 && offset < self.strings[index - 1].1
    }
}

/// Replace comments with spaces, keeping byte offsets and newlines.
/// String and template literals are skipped so that `//` inside a URL is
/// not taken for a comment.
pub(crate) fn lex(source: &str) -> Lexed {
    let bytes = source.as_bytes();
    let mut masked = String::with_capacity(source.len());
    let mut strings = Vec::new();
    let mut pos = 0;

    let blank = |out: &mut String, text: &str| {
        for c in text.chars() {
            if c == '\n' {
                out.push('\n');
            } else {
                out.extend(std::iter::repeat_n(' ', c.len_utf8()));
            }
        }
    };

    while pos < bytes.len() {
        match bytes[pos] {
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                let end = memchr::memchr(b'\n', &bytes[pos..]).map_or(bytes.len(), |found| pos + found);
                blank(&mut masked, &source[pos..end]);
                pos = end;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                let end = memchr::memmem::find(&bytes[pos + 2..], b"*/")
                    .map_or(bytes.len(), |found| pos + 2 + found + 2);
                blank(&mut masked, &source[pos..end]);
                pos = end;
            }
            quote @ (b'"' | b'\'' | b'`') => {
                let mut end = pos + 1;
                while end < bytes.len() && bytes[end] != quote {
                    if bytes[end] == b'\\' {
                        end += 1;
                    } else if bytes[end] == b'\n' && quote != b'`' {
                        break;
                    }
                    end += 1;
                }
                let end = (end + 1).min(bytes.len());
                strings.push((pos, end));
                masked.push_str(&source[pos..end]);
                pos = end;
            }
            _ => {
                let next = source[pos..]
                    .find(['/', '"', '\'', '`'])
                    .map_or(bytes.len(), |found| pos + found.max(1));
                masked.push_str(&source[pos..next]);
                pos = next;
            }
        }
    }
    Lexed { masked, strings }
}
