//! Render function generation.
//!
//! A template lowers to
//!
//! ```text
//! function (vm, $h) { return <node>; }
//! ```
//!
//! where an element is `$h(tag, data, children)`, text is `$h.text(value)`
//! and a loop is `$h.list(listFn, itemFn)`. Dynamic values are closures over
//! `vm`. Conditional chains become nested ternaries.

use std::collections::BTreeMap;

use crate::error::SyntaxError;
use crate::expr::{self, ForHeader};
use crate::markup::{Attribute, Element, Node, Text};

/// Problem found while lowering; offsets are unit-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CodegenError {
    Syntax(SyntaxError),
    Unsupported(String),
}

/// Component tags mapped to the module ids they were imported from.
pub(crate) type Components = BTreeMap<String, String>;

const DIRECTIVES: &[&str] = &["if", "elif", "else", "for", "show", "tid"];

struct Generator<'a> {
    components: &'a Components,
    errors: Vec<CodegenError>,
}

/// Lower the template root to a render function.
pub(crate) fn render_function(root: &Element, components: &Components) -> Result<String, Vec<CodegenError>> {
    let mut generator = Generator {
        components,
        errors: Vec::new(),
    };
    if root.has_attr("for") || root.has_attr("if") || root.has_attr("elif") || root.has_attr("else") {
        generator.errors.push(CodegenError::Syntax(SyntaxError::new(
            root.offset,
            "the template root element cannot carry 'for', 'if', 'elif' or 'else'",
        )));
    }
    let body = generator.element(root, &[]);
    if generator.errors.is_empty() {
        Ok(format!("function (vm, $h) {{ return {body}; }}"))
    } else {
        Err(generator.errors)
    }
}

impl Generator<'_> {
    fn syntax(&mut self, offset: usize, message: impl Into<String>) {
        self.errors.push(CodegenError::Syntax(SyntaxError::new(offset, message)));
    }

    fn lower(&mut self, value: &str, locals: &[String], offset: usize) -> String {
        match expr::lower(value, locals) {
            Ok(lowered) => lowered,
            Err(message) => {
                self.syntax(offset, message);
                "undefined".to_string()
            }
        }
    }

    /// Element including its `for` wrapper.
    fn node_with_loop(&mut self, element: &Element, locals: &[String]) -> String {
        let Some(attr) = element.attr("for") else {
            return self.element(element, locals);
        };
        if element.has_attr("if") {
            self.errors.push(CodegenError::Unsupported(format!(
                "'for' and 'if' on the same element <{}>",
                element.tag
            )));
        }
        let header = match expr::parse_for(attr.value.as_deref().unwrap_or_default()) {
            Ok(header) => header,
            Err(message) => {
                self.syntax(attr.offset, message);
                return "null".to_string();
            }
        };
        let ForHeader { item, index, list } = header;
        let list = self.lower(&list, locals, attr.offset);
        let mut inner_locals = locals.to_vec();
        inner_locals.push(item.clone());
        inner_locals.push(index.clone());
        let body = self.element(element, &inner_locals);
        format!("$h.list(function () {{ return {list}; }}, function ({item}, {index}) {{ return {body}; }})")
    }

    fn element(&mut self, element: &Element, locals: &[String]) -> String {
        let tag = match self.components.get(&element.tag) {
            Some(id) => format!("$app_require$({})", expr::js_string(id)),
            None => expr::js_string(&element.tag),
        };

        let mut attrs = Vec::new();
        let mut events = Vec::new();
        let mut show = None;
        for attr in &element.attrs {
            if let Some(event) = event_name(&attr.name) {
                let handler = self.handler(attr, locals);
                events.push(format!("{}: {handler}", expr::js_string(event)));
            } else if attr.name == "show" {
                let condition = self.condition(attr, locals);
                show = Some(format!("function () {{ return {condition}; }}"));
            } else if !DIRECTIVES.contains(&attr.name.as_str()) {
                let value = self.attribute_value(attr, locals);
                attrs.push(format!("{}: {value}", expr::js_string(&attr.name)));
            }
        }

        let mut data = Vec::new();
        if !attrs.is_empty() {
            data.push(format!("\"attr\": {{ {} }}", attrs.join(", ")));
        }
        if !events.is_empty() {
            data.push(format!("\"on\": {{ {} }}", events.join(", ")));
        }
        if let Some(show) = show {
            data.push(format!("\"show\": {show}"));
        }
        let data = if data.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {} }}", data.join(", "))
        };

        let children = self.children(&element.children, locals);
        format!("$h({tag}, {data}, [{}])", children.join(", "))
    }

    fn children(&mut self, nodes: &[Node], locals: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut index = 0;
        while index < nodes.len() {
            match &nodes[index] {
                Node::Text(text) => {
                    out.push(self.text(text, locals));
                    index += 1;
                }
                Node::Element(element) if element.has_attr("if") => {
                    let mut chain = vec![element];
                    index += 1;
                    while let Some(Node::Element(next)) = nodes.get(index) {
                        if next.has_attr("elif") || next.has_attr("else") {
                            chain.push(next);
                            index += 1;
                            if next.has_attr("else") {
                                break;
                            }
                        } else {
                            break;
                        }
                    }
                    out.push(self.conditional_chain(&chain, locals));
                }
                Node::Element(element) => {
                    if element.has_attr("elif") || element.has_attr("else") {
                        let directive = if element.has_attr("elif") { "elif" } else { "else" };
                        self.syntax(element.offset, format!("'{directive}' without a preceding 'if'"));
                    }
                    out.push(self.node_with_loop(element, locals));
                    index += 1;
                }
            }
        }
        out
    }

    fn conditional_chain(&mut self, chain: &[&Element], locals: &[String]) -> String {
        let mut out = String::new();
        let mut closed = false;
        for element in chain {
            let branch = self.node_with_loop(element, locals);
            let condition = element.attr("if").or_else(|| element.attr("elif"));
            match condition {
                Some(attr) => {
                    let condition = self.condition(attr, locals);
                    out.push_str(&format!("({condition}) ? {branch} : "));
                }
                None => {
                    out.push_str(&branch);
                    closed = true;
                }
            }
        }
        if !closed {
            out.push_str("null");
        }
        out
    }

    fn condition(&mut self, attr: &Attribute, locals: &[String]) -> String {
        let value = attr.value.as_deref().map(expr::strip_braces).unwrap_or_default();
        if value.is_empty() {
            self.syntax(attr.offset, format!("'{}' requires a condition", attr.name));
            return "false".to_string();
        }
        self.lower(value, locals, attr.offset)
    }

    fn handler(&mut self, attr: &Attribute, locals: &[String]) -> String {
        let value = attr.value.as_deref().map(expr::strip_braces).unwrap_or_default();
        if value.is_empty() {
            self.syntax(attr.offset, format!("'{}' requires a handler", attr.name));
            return "null".to_string();
        }
        let mut handler_locals = locals.to_vec();
        handler_locals.push("$evt".to_string());
        let is_path = value
            .split('.')
            .all(|part| part.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                && part.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'));
        let call = if is_path {
            format!("{}($evt)", self.lower(value, &handler_locals, attr.offset))
        } else {
            self.lower(value, &handler_locals, attr.offset)
        };
        format!("function ($evt) {{ return {call}; }}")
    }

    fn attribute_value(&mut self, attr: &Attribute, locals: &[String]) -> String {
        let Some(value) = attr.value.as_deref() else {
            return "true".to_string();
        };
        if !expr::has_interpolation(value) {
            return expr::js_string(value);
        }
        let lowered = self.interpolate(value, locals, attr.offset);
        format!("function () {{ return {lowered}; }}")
    }

    fn text(&mut self, text: &Text, locals: &[String]) -> String {
        if !expr::has_interpolation(&text.content) {
            return format!("$h.text({})", expr::js_string(&text.content));
        }
        let lowered = self.interpolate(&text.content, locals, text.offset);
        format!("$h.text(function () {{ return {lowered}; }})")
    }

    fn interpolate(&mut self, value: &str, locals: &[String], offset: usize) -> String {
        let segments = match expr::split_interpolation(value) {
            Ok(segments) => segments,
            Err(at) => {
                self.syntax(offset + at, "unterminated '{{'");
                return "undefined".to_string();
            }
        };
        match expr::lower_segments(&segments, locals) {
            Ok(lowered) => lowered,
            Err(message) => {
                self.syntax(offset, message);
                "undefined".to_string()
            }
        }
    }
}

/// `onclick` -> `click`, `@click` -> `click`.
fn event_name(attr: &str) -> Option<&str> {
    if let Some(event) = attr.strip_prefix('@') {
        return (!event.is_empty()).then_some(event);
    }
    attr.strip_prefix("on").filter(|event| !event.is_empty())
}
