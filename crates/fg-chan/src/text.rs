//! Native text format.
//!
//! The encoder is fg-core's canonical renderer, so a serialized object reads
//! exactly like its `show()` dump:
//!
//! ```text
//! Begin FrameSet
//!    Nframe = 2
//!    ...
//!    Map =
//!       Begin ZoomMap
//!          Naxes = 2
//!          Zoom = 1.5
//!       End ZoomMap
//! End FrameSet
//! ```
//!
//! Scalars are typed by shape: quoted strings, bare integers, floats (always
//! carrying a `.` or exponent), and bracketed number lists. A key with no
//! value introduces a nested block on the following lines.

use std::sync::LazyLock;

use regex::Regex;

use fg_core::{ReprNode, ReprValue, render_text};

use crate::channel::Codec;
use crate::error::{ChannelError, Result};

static BEGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Begin\s+([A-Za-z][A-Za-z0-9]*)\s*$").unwrap());
static END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*End\s+([A-Za-z][A-Za-z0-9]*)\s*$").unwrap());
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z][A-Za-z0-9]*)\s*=\s*(.*)$").unwrap());

pub struct TextCodec;

impl Codec for TextCodec {
    fn name(&self) -> &'static str {
        "text"
    }

    fn encode(&self, node: &ReprNode) -> Result<String> {
        Ok(render_text(node))
    }

    fn decode(&self, input: &str) -> Result<(ReprNode, usize)> {
        let mut lines = LineCursor::new(input);
        let node = parse_block(&mut lines)?;
        Ok((node, lines.consumed()))
    }
}

struct LineCursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        if self.pos >= self.input.len() {
            return None;
        }
        let rest = &self.input[self.pos..];
        let end = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
        self.pos += end;
        Some(rest[..end].trim_end_matches('\n'))
    }

    fn next_content_line(&mut self) -> Option<&'a str> {
        loop {
            let line = self.next_line()?;
            if !line.trim().is_empty() {
                return Some(line);
            }
        }
    }

    fn consumed(&self) -> usize {
        self.pos
    }
}

fn parse_block(lines: &mut LineCursor<'_>) -> Result<ReprNode> {
    let opener = lines
        .next_content_line()
        .ok_or_else(|| ChannelError::Parse("unexpected end of input".into()))?;
    let class = BEGIN_RE
        .captures(opener)
        .map(|c| c[1].to_string())
        .ok_or_else(|| ChannelError::Parse(format!("expected a Begin line, got '{opener}'")))?;

    let mut node = ReprNode::new(&class);
    loop {
        let line = lines
            .next_content_line()
            .ok_or_else(|| ChannelError::Parse(format!("unterminated Begin {class}")))?;

        if let Some(caps) = END_RE.captures(line) {
            if caps[1] != class {
                return Err(ChannelError::Parse(format!(
                    "End {} does not match Begin {class}",
                    &caps[1]
                )));
            }
            return Ok(node);
        }

        let caps = ATTR_RE
            .captures(line)
            .ok_or_else(|| ChannelError::Parse(format!("unrecognized line '{line}'")))?;
        let key = &caps[1];
        let raw = caps[2].trim();
        if raw.is_empty() {
            let child = parse_block(lines)?;
            node.push(key, ReprValue::Node(child));
        } else {
            node.push(key, parse_value(raw)?);
        }
    }
}

fn parse_value(raw: &str) -> Result<ReprValue> {
    if let Some(body) = raw.strip_prefix('"') {
        return Ok(ReprValue::Str(unquote(body)?));
    }
    if let Some(body) = raw.strip_prefix('[') {
        let body = body
            .strip_suffix(']')
            .ok_or_else(|| ChannelError::Parse(format!("unterminated list '{raw}'")))?;
        let tokens: Vec<&str> = body
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.iter().all(|t| is_integer(t)) {
            let ints: std::result::Result<Vec<i64>, _> =
                tokens.iter().map(|t| t.parse::<i64>()).collect();
            return Ok(ReprValue::IntList(ints.map_err(|e| {
                ChannelError::Parse(format!("bad integer list '{raw}': {e}"))
            })?));
        }
        let floats: std::result::Result<Vec<f64>, _> =
            tokens.iter().map(|t| t.parse::<f64>()).collect();
        return Ok(ReprValue::FloatList(floats.map_err(|e| {
            ChannelError::Parse(format!("bad number list '{raw}': {e}"))
        })?));
    }
    if is_integer(raw) {
        return raw
            .parse::<i64>()
            .map(ReprValue::Int)
            .map_err(|e| ChannelError::Parse(format!("bad integer '{raw}': {e}")));
    }
    raw.parse::<f64>()
        .map(ReprValue::Float)
        .map_err(|_| ChannelError::Parse(format!("unrecognized value '{raw}'")))
}

fn is_integer(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c == '+')
        && token.parse::<i64>().is_ok()
}

/// Unescape the body of a quoted string (the opening quote already
/// stripped).
fn unquote(body: &str) -> Result<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    loop {
        match chars.next() {
            Some('"') => {
                let rest = chars.as_str();
                if !rest.trim().is_empty() {
                    return Err(ChannelError::Parse(format!(
                        "trailing content after string: '{rest}'"
                    )));
                }
                return Ok(out);
            }
            Some('\\') => match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('n') => out.push('\n'),
                other => {
                    return Err(ChannelError::Parse(format!(
                        "unknown escape '\\{}'",
                        other.map(String::from).unwrap_or_default()
                    )));
                }
            },
            Some(c) => out.push(c),
            None => return Err(ChannelError::Parse("unterminated string".into())),
        }
    }
}
