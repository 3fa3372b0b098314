//! User-facing log channel.
//!
//! Separate from `tracing`: these are the human-readable lines a person (or
//! a harness watching the process) reads. Every line can also be fed to
//! registered [`Dialogs`], which react to lines matching a pattern.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use hap_ux::CompileError;
use parking_lot::Mutex;
use regex::Regex;
use tracing::warn;

use crate::stats::BuildStats;

/// Line announcing missing release signing material.
pub const MISSING_RELEASE_KEY: &str = "编译错误，缺少release签名私钥文件";

/// Which sink a line went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// What a dialog listens for.
pub enum Pattern {
    Regex(Regex),
    Predicate(Box<dyn Fn(&str) -> bool + Send>),
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Pattern::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern::Regex(regex)
    }
}

/// A line that triggered a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogMatch<'a> {
    pub stream: Stream,
    pub line: &'a str,
    /// Capture groups of a regex pattern, group 0 excluded. Empty for
    /// predicates.
    pub groups: Vec<Option<&'a str>>,
}

type Handler = Box<dyn FnMut(&DialogMatch<'_>) + Send>;

struct Dialog {
    pattern: Pattern,
    stream: Option<Stream>,
    handler: Handler,
}

/// Pattern → handler pairs run against every logged line.
#[derive(Default)]
pub struct Dialogs {
    dialogs: Vec<Dialog>,
}

impl fmt::Debug for Dialogs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.dialogs.iter().map(|dialog| (&dialog.pattern, dialog.stream)))
            .finish()
    }
}

impl Dialogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. With `stream` set, only lines of that stream are
    /// considered.
    pub fn on(
        mut self,
        pattern: impl Into<Pattern>,
        stream: Option<Stream>,
        handler: impl FnMut(&DialogMatch<'_>) + Send + 'static,
    ) -> Self {
        self.dialogs.push(Dialog {
            pattern: pattern.into(),
            stream,
            handler: Box::new(handler),
        });
        self
    }

    /// Register a predicate handler.
    pub fn on_predicate(
        self,
        predicate: impl Fn(&str) -> bool + Send + 'static,
        stream: Option<Stream>,
        handler: impl FnMut(&DialogMatch<'_>) + Send + 'static,
    ) -> Self {
        self.on(Pattern::Predicate(Box::new(predicate)), stream, handler)
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    /// Run every matching handler for `line`; returns how many fired.
    pub fn feed(&mut self, stream: Stream, line: &str) -> usize {
        let mut fired = 0;
        for dialog in &mut self.dialogs {
            if dialog.stream.is_some_and(|wanted| wanted != stream) {
                continue;
            }
            let groups = match &dialog.pattern {
                Pattern::Regex(regex) => match regex.captures(line) {
                    Some(captures) => captures.iter().skip(1).map(|group| group.map(|m| m.as_str())).collect(),
                    None => continue,
                },
                Pattern::Predicate(predicate) => {
                    if !predicate(line) {
                        continue;
                    }
                    Vec::new()
                }
            };
            (dialog.handler)(&DialogMatch { stream, line, groups });
            fired += 1;
        }
        fired
    }
}

/// Writer pair plus dialogs.
pub struct LogChannel {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    dialogs: Dialogs,
}

impl fmt::Debug for LogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogChannel").field("dialogs", &self.dialogs).finish_non_exhaustive()
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::stdio()
    }
}

impl LogChannel {
    pub fn new(out: impl Write + Send + 'static, err: impl Write + Send + 'static) -> Self {
        Self {
            out: Box::new(out),
            err: Box::new(err),
            dialogs: Dialogs::new(),
        }
    }

    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    /// Discards every line; dialogs still run.
    pub fn sink() -> Self {
        Self::new(io::sink(), io::sink())
    }

    pub fn with_dialogs(mut self, dialogs: Dialogs) -> Self {
        self.dialogs = dialogs;
        self
    }

    pub fn info(&mut self, line: &str) {
        self.emit(Stream::Stdout, line);
    }

    pub fn error(&mut self, line: &str) {
        self.emit(Stream::Stderr, line);
    }

    fn emit(&mut self, stream: Stream, line: &str) {
        let sink = match stream {
            Stream::Stdout => &mut self.out,
            Stream::Stderr => &mut self.err,
        };
        if let Err(err) = writeln!(sink, "{line}").and_then(|()| sink.flush()) {
            warn!(error = %err, "log channel write failed");
        }
        self.dialogs.feed(stream, line);
    }

    pub fn missing_release_key(&mut self, key_path: &Path) {
        self.error(&format!("{MISSING_RELEASE_KEY}: {}", key_path.display()));
    }

    pub fn server_address(&mut self, url: &str) {
        self.info(&format!("服务器地址: {url}, 请确保手机与电脑处于同一局域网下"));
    }

    pub fn package_written(&mut self, path: &Path, size: u64) {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        self.info(&format!("生成文件 {name}，大小为 {} KB", size_kb(size)));
    }

    pub fn build_succeeded(&mut self, stats: &BuildStats) {
        self.info(&format!(
            "编译完成，共 {} 个文件，{} KB",
            stats.asset_count(),
            size_kb(stats.total_size() as u64)
        ));
        for warning in &stats.warnings {
            self.info(&format!("警告 [{}] {}", warning.kind, warning.message));
        }
    }

    pub fn compile_errors(&mut self, errors: &[CompileError]) {
        for error in errors {
            self.error(&format!("编译错误 [{}] {error}", error.kind()));
        }
    }
}

/// Kilobytes, rounded up.
pub fn size_kb(bytes: u64) -> u64 {
    bytes.div_ceil(1024)
}

/// In-memory sink that can be cloned into a [`LogChannel`] and read back.
#[derive(Debug, Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
