//! Log redaction for patient data.
//!
//! Biomarker panels are health data. They must not end up in log files, even
//! when an error message quotes part of a request body. Every formatted log
//! line passes through [`redact`], which replaces:
//! - biomarker values in JSON form (`"Hemoglobin": 14`) under any accepted
//!   field spelling
//! - adapted column values in `key=value` form (`hemo=14`)
//! - common patient identifiers (MRN, email, phone, UUID)
//!
//! Input longer than `NEXUS_SANITIZE_MAX_BYTES` (default 16 KiB) is truncated
//! before scanning.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::{COLUMN_NAMES, FIELD_NAMES};

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: String,
}

struct Rules {
    any: RegexSet,
    rules: Vec<Rule>,
}

fn max_sanitize_bytes() -> usize {
    std::env::var("NEXUS_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Every spelling a biomarker field is accepted under.
fn field_spellings() -> Vec<String> {
    let mut names = Vec::with_capacity(FIELD_NAMES.len() * 3);
    for name in FIELD_NAMES {
        let underscored = name.replace(' ', "_");
        let snake = underscored.to_lowercase();
        names.push(name.to_string());
        if underscored != name {
            names.push(underscored);
        }
        if snake != name {
            names.push(snake);
        }
    }
    names.sort();
    names.dedup();
    names
}

fn build_rules() -> Result<Rules, regex::Error> {
    let fields = field_spellings()
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    let columns = COLUMN_NAMES
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");

    let specs: Vec<(String, &str)> = vec![
        (
            format!(r#""(?P<key>{fields})"\s*:\s*(?:"[^"]*"|[-+0-9.eE]+|true|false|null)"#),
            r#""${key}": "[REDACTED]""#,
        ),
        (
            format!(r"\b(?P<key>{columns})\s*=\s*[^\s,;)}}\]]+"),
            "${key}=[REDACTED]",
        ),
        (r"(?i)\bMRN[:\s#]?\s*\d{6,10}\b".to_string(), "[REDACTED-MRN]"),
        (
            r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b"
                .to_string(),
            "[REDACTED-EMAIL]",
        ),
        (
            r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b"
                .to_string(),
            "[REDACTED-UUID]",
        ),
        (
            r"\+?\b\d{1,3}[-.\s]\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b".to_string(),
            "[REDACTED-PHONE]",
        ),
    ];

    let any = RegexSet::new(specs.iter().map(|(p, _)| p.as_str()))?;
    let rules = specs
        .into_iter()
        .map(|(pattern, replacement)| {
            Ok(Rule {
                regex: Regex::new(&pattern)?,
                replacement: replacement.to_string(),
            })
        })
        .collect::<Result<Vec<_>, regex::Error>>()?;
    Ok(Rules { any, rules })
}

/// Compiled rules, or `None` if they failed to compile (then lines are
/// withheld rather than written unredacted).
fn rules() -> Option<&'static Rules> {
    static RULES: OnceLock<Option<Rules>> = OnceLock::new();
    RULES
        .get_or_init(|| match build_rules() {
            Ok(rules) => Some(rules),
            Err(e) => {
                eprintln!("log redaction rules failed to compile: {e}");
                None
            }
        })
        .as_ref()
}

/// Redact patient data from a log line.
#[must_use]
pub fn redact(input: &str) -> String {
    redact_with_limit(input, max_sanitize_bytes())
}

fn redact_with_limit(input: &str, max_bytes: usize) -> String {
    let Some(rules) = rules() else {
        return "[REDACTION UNAVAILABLE]\n".to_string();
    };

    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);
    let mut out = prefix.to_string();

    // Only apply rules that matched the original prefix.
    for idx in rules.any.matches(prefix).into_iter() {
        let rule = &rules.rules[idx];
        out = rule
            .regex
            .replace_all(&out, rule.replacement.as_str())
            .into_owned();
    }

    if truncated {
        out.push_str(" [TRUNCATED]");
        if input.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// A `tracing_subscriber` writer wrapper that redacts formatted log lines
/// before they reach the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn write_redacted(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let line = String::from_utf8_lossy(bytes);
        self.inner.write_all(redact(&line).as_bytes())
    }

    fn drain_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_redacted(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.drain_lines()?;

        // A formatter that never emits a newline must not grow the buffer
        // without bound.
        if self.buffer.len() > max_sanitize_bytes().saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_redacted(&pending)?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_redacted(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
        }
    }
}
