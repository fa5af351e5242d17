//! Self-describing object representation.
//!
//! Every persistable object converts to and from a [`ReprNode`] tree: a class
//! tag plus an ordered list of named values (scalars, number lists, or nested
//! nodes). Persistence codecs encode this tree, never the objects themselves,
//! so adding a wire format never touches the graph logic.
//!
//! [`render_text`] is the canonical indented rendering used by
//! [`Object::show`](crate::object::Object::show) and by the native text
//! format. Floats render in shortest-round-trip form, which keeps dumps
//! bit-reproducible.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::frameset::FrameSet;
use crate::mapping::Mapping;
use crate::object::Object;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReprNode {
    class: String,
    items: Vec<(String, ReprValue)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReprValue {
    Int(i64),
    Float(f64),
    Str(String),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    Node(ReprNode),
}

impl ReprNode {
    pub fn new(class: &str) -> Self {
        Self {
            class: class.to_string(),
            items: Vec::new(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn items(&self) -> &[(String, ReprValue)] {
        &self.items
    }

    pub fn push(&mut self, key: &str, value: ReprValue) {
        self.items.push((key.to_string(), value));
    }

    fn find(&self, key: &str) -> Option<&ReprValue> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.find(key) {
            Some(ReprValue::Int(v)) => Ok(*v),
            Some(_) => Err(Error::InvalidArgument(format!(
                "{}.{key} is not an integer",
                self.class
            ))),
            None => Err(missing(&self.class, key)),
        }
    }

    pub fn get_float(&self, key: &str) -> Result<f64> {
        match self.find(key) {
            Some(ReprValue::Float(v)) => Ok(*v),
            Some(ReprValue::Int(v)) => Ok(*v as f64),
            Some(_) => Err(Error::InvalidArgument(format!(
                "{}.{key} is not a number",
                self.class
            ))),
            None => Err(missing(&self.class, key)),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.find(key) {
            Some(ReprValue::Str(v)) => Ok(v),
            Some(_) => Err(Error::InvalidArgument(format!(
                "{}.{key} is not a string",
                self.class
            ))),
            None => Err(missing(&self.class, key)),
        }
    }

    pub fn opt_str(&self, key: &str) -> Option<&str> {
        match self.find(key) {
            Some(ReprValue::Str(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_int_list(&self, key: &str) -> Result<Vec<i64>> {
        match self.find(key) {
            Some(ReprValue::IntList(v)) => Ok(v.clone()),
            Some(_) => Err(Error::InvalidArgument(format!(
                "{}.{key} is not an integer list",
                self.class
            ))),
            None => Err(missing(&self.class, key)),
        }
    }

    pub fn get_float_list(&self, key: &str) -> Result<Vec<f64>> {
        match self.find(key) {
            Some(ReprValue::FloatList(v)) => Ok(v.clone()),
            Some(ReprValue::IntList(v)) => Ok(v.iter().map(|&x| x as f64).collect()),
            Some(_) => Err(Error::InvalidArgument(format!(
                "{}.{key} is not a number list",
                self.class
            ))),
            None => Err(missing(&self.class, key)),
        }
    }

    pub fn opt_float_list(&self, key: &str) -> Option<Vec<f64>> {
        self.get_float_list(key).ok()
    }

    /// All nested nodes stored under the given key, in order.
    pub fn nodes_named<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ReprNode> {
        self.items.iter().filter_map(move |(k, v)| match v {
            ReprValue::Node(node) if k == key => Some(node),
            _ => None,
        })
    }
}

fn missing(class: &str, key: &str) -> Error {
    Error::InvalidArgument(format!("{class} is missing {key}"))
}

/// Any object the persistence layer can carry.
#[derive(Clone, Debug)]
pub enum AnyObject {
    Frame(Frame),
    Mapping(Mapping),
    FrameSet(FrameSet),
}

impl AnyObject {
    pub fn class_name(&self) -> &'static str {
        match self {
            AnyObject::Frame(f) => f.class_name(),
            AnyObject::Mapping(m) => m.class_name(),
            AnyObject::FrameSet(s) => s.class_name(),
        }
    }

    pub fn to_repr(&self) -> ReprNode {
        match self {
            AnyObject::Frame(f) => f.to_repr(),
            AnyObject::Mapping(m) => m.to_repr(),
            AnyObject::FrameSet(s) => s.to_repr(),
        }
    }

    pub fn show(&self) -> String {
        render_text(&self.to_repr())
    }

    pub fn into_frame(self) -> Result<Frame> {
        match self {
            AnyObject::Frame(f) => Ok(f),
            other => Err(wrong_kind(other.class_name(), "a Frame")),
        }
    }

    pub fn into_mapping(self) -> Result<Mapping> {
        match self {
            AnyObject::Mapping(m) => Ok(m),
            other => Err(wrong_kind(other.class_name(), "a Mapping")),
        }
    }

    pub fn into_frame_set(self) -> Result<FrameSet> {
        match self {
            AnyObject::FrameSet(s) => Ok(s),
            other => Err(wrong_kind(other.class_name(), "a FrameSet")),
        }
    }
}

impl std::fmt::Display for AnyObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyObject::Frame(x) => std::fmt::Display::fmt(x, f),
            AnyObject::Mapping(x) => std::fmt::Display::fmt(x, f),
            AnyObject::FrameSet(x) => std::fmt::Display::fmt(x, f),
        }
    }
}

fn wrong_kind(class: &str, wanted: &str) -> Error {
    Error::InvalidArgument(format!("object is a {class}, not {wanted}"))
}

/// Whether a class tag is one this engine can reconstruct.
pub fn is_known_class(class: &str) -> bool {
    matches!(
        class,
        "Frame" | "FrameSet" | "UnitMap" | "ZoomMap" | "ShiftMap" | "PermMap" | "SeriesMap"
    )
}

/// Reconstruct an object from its representation, dispatching on the class
/// tag.
pub fn object_from_repr(node: &ReprNode) -> Result<AnyObject> {
    match node.class() {
        "Frame" => Frame::from_repr(node).map(AnyObject::Frame),
        "FrameSet" => FrameSet::from_repr(node).map(AnyObject::FrameSet),
        "UnitMap" | "ZoomMap" | "ShiftMap" | "PermMap" | "SeriesMap" => {
            Mapping::from_repr(node).map(AnyObject::Mapping)
        }
        other => Err(Error::InvalidArgument(format!(
            "class {other} not supported"
        ))),
    }
}

/// Canonical indented text rendering of a representation tree.
pub fn render_text(node: &ReprNode) -> String {
    let mut out = String::new();
    render_node(node, 0, &mut out);
    out
}

fn render_node(node: &ReprNode, depth: usize, out: &mut String) {
    let pad = "   ".repeat(depth);
    let _ = writeln!(out, "{pad}Begin {}", node.class);
    let inner = "   ".repeat(depth + 1);
    for (key, value) in &node.items {
        match value {
            ReprValue::Int(v) => {
                let _ = writeln!(out, "{inner}{key} = {v}");
            }
            ReprValue::Float(v) => {
                let _ = writeln!(out, "{inner}{key} = {v:?}");
            }
            ReprValue::Str(v) => {
                let _ = writeln!(out, "{inner}{key} = {}", quote(v));
            }
            ReprValue::IntList(list) => {
                let body: Vec<String> = list.iter().map(|v| v.to_string()).collect();
                let _ = writeln!(out, "{inner}{key} = [{}]", body.join(", "));
            }
            ReprValue::FloatList(list) => {
                let body: Vec<String> = list.iter().map(|v| format!("{v:?}")).collect();
                let _ = writeln!(out, "{inner}{key} = [{}]", body.join(", "));
            }
            ReprValue::Node(child) => {
                let _ = writeln!(out, "{inner}{key} =");
                render_node(child, depth + 2, out);
            }
        }
    }
    let _ = writeln!(out, "{pad}End {}", node.class);
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
