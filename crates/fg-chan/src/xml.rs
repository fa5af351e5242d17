//! XML format.
//!
//! One element per value, typed by tag name, with the class carried as an
//! attribute:
//!
//! ```text
//! <Object class="FrameSet">
//!    <Int name="Nframe">2</Int>
//!    <Str name="Domain">FRAME1</Str>
//!    <Object name="Map" class="ZoomMap">
//!       <Int name="Naxes">2</Int>
//!       <Float name="Zoom">1.5</Float>
//!    </Object>
//! </Object>
//! ```
//!
//! The grammar is deliberately small — elements, attributes, character data —
//! and both directions live here; no schema knowledge is needed to read a
//! document back.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use fg_core::{ReprNode, ReprValue};

use crate::channel::Codec;
use crate::error::{ChannelError, Result};

static OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<([A-Za-z][A-Za-z0-9]*)((?:\s+[A-Za-z][A-Za-z0-9]*="[^"]*")*)\s*>"#).unwrap()
});
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z][A-Za-z0-9]*)="([^"]*)""#).unwrap());
static CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^</([A-Za-z][A-Za-z0-9]*)\s*>").unwrap());

pub struct XmlCodec;

impl Codec for XmlCodec {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn encode(&self, node: &ReprNode) -> Result<String> {
        let mut out = String::new();
        encode_node(node, None, 0, &mut out);
        Ok(out)
    }

    fn decode(&self, input: &str) -> Result<(ReprNode, usize)> {
        let mut cursor = XmlCursor::new(input);
        cursor.skip_whitespace();
        let (_, value) = cursor.parse_element()?;
        cursor.skip_whitespace();
        match value {
            ReprValue::Node(node) => Ok((node, cursor.pos)),
            _ => Err(ChannelError::Parse(
                "top-level element must be an Object".into(),
            )),
        }
    }
}

fn encode_node(node: &ReprNode, name: Option<&str>, depth: usize, out: &mut String) {
    let pad = "   ".repeat(depth);
    match name {
        Some(name) => {
            let _ = writeln!(
                out,
                "{pad}<Object name=\"{}\" class=\"{}\">",
                escape(name),
                escape(node.class())
            );
        }
        None => {
            let _ = writeln!(out, "{pad}<Object class=\"{}\">", escape(node.class()));
        }
    }
    let inner = "   ".repeat(depth + 1);
    for (key, value) in node.items() {
        let ekey = escape(key);
        match value {
            ReprValue::Int(v) => {
                let _ = writeln!(out, "{inner}<Int name=\"{ekey}\">{v}</Int>");
            }
            ReprValue::Float(v) => {
                let _ = writeln!(out, "{inner}<Float name=\"{ekey}\">{v:?}</Float>");
            }
            ReprValue::Str(v) => {
                let _ = writeln!(out, "{inner}<Str name=\"{ekey}\">{}</Str>", escape(v));
            }
            ReprValue::IntList(list) => {
                let body: Vec<String> = list.iter().map(|v| v.to_string()).collect();
                let _ = writeln!(
                    out,
                    "{inner}<IntList name=\"{ekey}\">{}</IntList>",
                    body.join(" ")
                );
            }
            ReprValue::FloatList(list) => {
                let body: Vec<String> = list.iter().map(|v| format!("{v:?}")).collect();
                let _ = writeln!(
                    out,
                    "{inner}<FloatList name=\"{ekey}\">{}</FloatList>",
                    body.join(" ")
                );
            }
            ReprValue::Node(child) => {
                encode_node(child, Some(key.as_str()), depth + 1, out);
            }
        }
    }
    let _ = writeln!(out, "{pad}</Object>");
}

fn escape(s: &str) -> std::borrow::Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"']) {
        return std::borrow::Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    std::borrow::Cow::Owned(out)
}

fn unescape(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let entity = ["&amp;", "&lt;", "&gt;", "&quot;"]
            .into_iter()
            .find(|e| rest.starts_with(e))
            .ok_or_else(|| {
                let context: String = rest.chars().take(8).collect();
                ChannelError::Parse(format!("unknown entity at '{context}'"))
            })?;
        out.push(match entity {
            "&amp;" => '&',
            "&lt;" => '<',
            "&gt;" => '>',
            _ => '"',
        });
        rest = &rest[entity.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

struct XmlCursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> XmlCursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// Parse one element: either an `<Object>` (returning a nested node) or
    /// a typed scalar. Returns the element's `name` attribute, absent only on
    /// a root object.
    fn parse_element(&mut self) -> Result<(Option<String>, ReprValue)> {
        let caps = OPEN_RE.captures(self.remaining()).ok_or_else(|| {
            ChannelError::Parse(format!(
                "expected an opening tag at '{}'",
                head(self.remaining())
            ))
        })?;
        let tag = caps[1].to_string();
        let mut name = None;
        let mut class = None;
        for attr in ATTR_RE.captures_iter(&caps[2]) {
            match &attr[1] {
                "name" => name = Some(unescape(&attr[2])?),
                "class" => class = Some(unescape(&attr[2])?),
                other => {
                    return Err(ChannelError::Parse(format!("unknown attribute '{other}'")));
                }
            }
        }
        self.pos += caps[0].len();

        if tag == "Object" {
            let class = class
                .ok_or_else(|| ChannelError::Parse("Object without a class attribute".into()))?;
            let mut node = ReprNode::new(&class);
            loop {
                self.skip_whitespace();
                if let Some(close) = CLOSE_RE.captures(self.remaining()) {
                    if &close[1] != "Object" {
                        return Err(ChannelError::Parse(format!(
                            "</{}> does not match <Object>",
                            &close[1]
                        )));
                    }
                    self.pos += close[0].len();
                    return Ok((name, ReprValue::Node(node)));
                }
                let (child_name, value) = self.parse_element()?;
                let child_name = child_name
                    .ok_or_else(|| ChannelError::Parse("child element without a name".into()))?;
                node.push(&child_name, value);
            }
        }

        // scalar element: content runs to the matching close tag
        let close_tag = format!("</{tag}>");
        let rest = self.remaining();
        let end = rest.find(&close_tag).ok_or_else(|| {
            ChannelError::Parse(format!("missing {close_tag} for <{tag}>"))
        })?;
        let content = &rest[..end];
        self.pos += end + close_tag.len();

        let name =
            name.ok_or_else(|| ChannelError::Parse(format!("<{tag}> without a name attribute")))?;
        let value = match tag.as_str() {
            "Int" => ReprValue::Int(content.trim().parse::<i64>().map_err(|e| {
                ChannelError::Parse(format!("bad integer '{}': {e}", content.trim()))
            })?),
            "Float" => ReprValue::Float(content.trim().parse::<f64>().map_err(|e| {
                ChannelError::Parse(format!("bad float '{}': {e}", content.trim()))
            })?),
            "Str" => ReprValue::Str(unescape(content)?),
            "IntList" => {
                let values: std::result::Result<Vec<i64>, _> =
                    content.split_whitespace().map(str::parse::<i64>).collect();
                ReprValue::IntList(values.map_err(|e| {
                    ChannelError::Parse(format!("bad integer list '{content}': {e}"))
                })?)
            }
            "FloatList" => {
                let values: std::result::Result<Vec<f64>, _> =
                    content.split_whitespace().map(str::parse::<f64>).collect();
                ReprValue::FloatList(values.map_err(|e| {
                    ChannelError::Parse(format!("bad number list '{content}': {e}"))
                })?)
            }
            other => {
                return Err(ChannelError::Parse(format!("unknown element <{other}>")));
            }
        };
        Ok((Some(name), value))
    }
}

fn head(s: &str) -> String {
    s.chars().take(40).collect()
}
