//! Coordinate frames.
//!
//! A [`Frame`] names a coordinate space. It behaves as the identity mapping
//! over its own axes and carries descriptive attributes: a case-blind
//! `domain` label (stored uppercased, so lookups never depend on caller
//! casing), a title, per-axis labels and units, and an order-preserving
//! property bag that round-trips through persistence untouched.

use std::fmt;

use crate::error::{Error, Result};
use crate::object::{Ident, Object};
use crate::points::CoordBlock;
use crate::repr::{ReprNode, ReprValue};

#[derive(Clone, Debug)]
pub struct Frame {
    naxes: usize,
    domain: String,
    title: String,
    labels: Vec<String>,
    units: Vec<String>,
    ident: String,
    properties: Vec<(String, String)>,
    identity: Ident,
}

impl Frame {
    pub fn new(naxes: usize) -> Result<Self> {
        if naxes == 0 {
            return Err(Error::InvalidArgument("frame needs at least one axis".into()));
        }
        Ok(Self {
            naxes,
            domain: String::new(),
            title: String::new(),
            labels: vec![String::new(); naxes],
            units: vec![String::new(); naxes],
            ident: String::new(),
            properties: Vec::new(),
            identity: Ident::new("Frame"),
        })
    }

    /// Convenience: a frame with its domain already set.
    pub fn with_domain(naxes: usize, domain: &str) -> Result<Self> {
        let mut frame = Self::new(naxes)?;
        frame.set_domain(domain);
        Ok(frame)
    }

    pub fn naxes(&self) -> usize {
        self.naxes
    }

    /// The domain label, uppercased. Empty when never set.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Set the domain label. Stored uppercased so domain comparison is
    /// case blind everywhere.
    pub fn set_domain(&mut self, domain: &str) {
        self.domain = domain.to_uppercase();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Label of a 1-based axis.
    pub fn label(&self, axis: usize) -> Result<&str> {
        self.axis_index(axis).map(|i| self.labels[i].as_str())
    }

    pub fn set_label(&mut self, axis: usize, label: &str) -> Result<()> {
        let i = self.axis_index(axis)?;
        self.labels[i] = label.to_string();
        Ok(())
    }

    /// Unit of a 1-based axis.
    pub fn unit(&self, axis: usize) -> Result<&str> {
        self.axis_index(axis).map(|i| self.units[i].as_str())
    }

    pub fn set_unit(&mut self, axis: usize, unit: &str) -> Result<()> {
        let i = self.axis_index(axis)?;
        self.units[i] = unit.to_string();
        Ok(())
    }

    fn axis_index(&self, axis: usize) -> Result<usize> {
        if axis == 0 || axis > self.naxes {
            return Err(Error::NotFound(format!(
                "axis {axis} of a {}-axis frame",
                self.naxes
            )));
        }
        Ok(axis - 1)
    }

    /// Set an opaque property, preserving first-insertion order.
    pub fn set_property(&mut self, key: &str, value: &str) {
        for (k, v) in self.properties.iter_mut() {
            if k == key {
                *v = value.to_string();
                return;
            }
        }
        self.properties.push((key.to_string(), value.to_string()));
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Reorder axis attributes by a 1-based permutation: new axis `j` takes
    /// the label and unit of old axis `perm[j-1]`.
    pub fn perm_axes(&mut self, perm: &[i32]) -> Result<()> {
        if perm.len() != self.naxes {
            return Err(Error::ShapeMismatch {
                expected: self.naxes,
                actual: perm.len(),
            });
        }
        // validates that perm is a proper permutation
        crate::mapping::Mapping::axis_permutation(perm)?;
        self.labels = perm
            .iter()
            .map(|&s| self.labels[(s - 1) as usize].clone())
            .collect();
        self.units = perm
            .iter()
            .map(|&s| self.units[(s - 1) as usize].clone())
            .collect();
        Ok(())
    }

    /// A frame is the identity mapping over its own axes.
    pub fn n_in(&self) -> usize {
        self.naxes
    }

    pub fn n_out(&self) -> usize {
        self.naxes
    }

    pub fn apply_forward(&self, block: &CoordBlock) -> Result<CoordBlock> {
        if block.naxes() != self.naxes {
            return Err(Error::ShapeMismatch {
                expected: self.naxes,
                actual: block.naxes(),
            });
        }
        Ok(block.clone())
    }

    pub fn apply_inverse(&self, block: &CoordBlock) -> Result<CoordBlock> {
        self.apply_forward(block)
    }

    pub fn apply_forward_point(&self, point: &[f64]) -> Result<Vec<f64>> {
        let out = self.apply_forward(&CoordBlock::from_point(point)?)?;
        Ok(out.point(0))
    }

    pub fn apply_inverse_point(&self, point: &[f64]) -> Result<Vec<f64>> {
        self.apply_forward_point(point)
    }

    pub fn from_repr(node: &ReprNode) -> Result<Self> {
        if node.class() != "Frame" {
            return Err(Error::InvalidArgument(format!(
                "class {} is not a Frame",
                node.class()
            )));
        }
        let naxes = node.get_int("Naxes")? as usize;
        let mut frame = Frame::new(naxes)?;
        if let Some(ident) = node.opt_str("Ident") {
            frame.set_ident(ident);
        }
        if let Some(domain) = node.opt_str("Domain") {
            frame.set_domain(domain);
        }
        if let Some(title) = node.opt_str("Title") {
            frame.set_title(title);
        }
        for axis in 1..=naxes {
            if let Some(label) = node.opt_str(&format!("Label{axis}")) {
                frame.set_label(axis, label)?;
            }
            if let Some(unit) = node.opt_str(&format!("Unit{axis}")) {
                frame.set_unit(axis, unit)?;
            }
        }
        for prop in node.nodes_named("Prop") {
            let key = prop.get_str("Key")?;
            let value = prop.get_str("Value")?;
            frame.set_property(key, value);
        }
        Ok(frame)
    }
}

impl Object for Frame {
    fn class_name(&self) -> &'static str {
        "Frame"
    }

    fn ident(&self) -> &str {
        &self.ident
    }

    fn set_ident(&mut self, ident: &str) {
        self.ident = ident.to_string();
    }

    fn to_repr(&self) -> ReprNode {
        let mut node = ReprNode::new("Frame");
        if !self.ident.is_empty() {
            node.push("Ident", ReprValue::Str(self.ident.clone()));
        }
        node.push("Naxes", ReprValue::Int(self.naxes as i64));
        if !self.domain.is_empty() {
            node.push("Domain", ReprValue::Str(self.domain.clone()));
        }
        if !self.title.is_empty() {
            node.push("Title", ReprValue::Str(self.title.clone()));
        }
        for (i, label) in self.labels.iter().enumerate() {
            if !label.is_empty() {
                node.push(&format!("Label{}", i + 1), ReprValue::Str(label.clone()));
            }
        }
        for (i, unit) in self.units.iter().enumerate() {
            if !unit.is_empty() {
                node.push(&format!("Unit{}", i + 1), ReprValue::Str(unit.clone()));
            }
        }
        for (key, value) in &self.properties {
            let mut prop = ReprNode::new("Prop");
            prop.push("Key", ReprValue::Str(key.clone()));
            prop.push("Value", ReprValue::Str(value.clone()));
            node.push("Prop", ReprValue::Node(prop));
        }
        node
    }

    fn same(&self, other: &Self) -> bool {
        self.identity.same(&other.identity)
    }

    fn ref_count(&self) -> usize {
        self.identity.ref_count()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.domain.is_empty() {
            write!(f, "Frame({})", self.naxes)
        } else {
            write!(f, "Frame({}, {})", self.naxes, self.domain)
        }
    }
}
