//! Domain-indexed frame sets.
//!
//! A [`FrameDict`] wraps a [`FrameSet`] with a lookup table from uppercased
//! domain names to frame indices, so every operation that takes a frame index
//! also accepts a (case blind) domain name. Non-empty domains must be unique
//! within the dictionary; the index is patched or rebuilt inside each
//! structural mutation, with validation before anything is touched.
//!
//! Like the original it is modeled on, a FrameDict has no wire-level identity
//! of its own: `class_name()` reports "FrameSet" and it persists as one, to
//! be rebuilt with [`FrameDict::from_set`] after reading.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::frameset::FrameSet;
use crate::mapping::Mapping;
use crate::object::Object;
use crate::points::CoordBlock;
use crate::repr::ReprNode;

/// A frame address: a 1-based index (or sentinel) or a case-blind domain.
#[derive(Clone, Copy, Debug)]
pub enum FrameRef<'a> {
    Index(i32),
    Domain(&'a str),
}

impl From<i32> for FrameRef<'_> {
    fn from(index: i32) -> Self {
        FrameRef::Index(index)
    }
}

impl<'a> From<&'a str> for FrameRef<'a> {
    fn from(domain: &'a str) -> Self {
        FrameRef::Domain(domain)
    }
}

#[derive(Clone, Debug)]
pub struct FrameDict {
    set: FrameSet,
    by_domain: HashMap<String, i32>,
}

impl FrameDict {
    /// Sentinel index resolving to the base frame at call time.
    pub const BASE: i32 = FrameSet::BASE;
    /// Sentinel index resolving to the current frame at call time.
    pub const CURRENT: i32 = FrameSet::CURRENT;

    /// A dictionary holding a deep copy of one frame.
    pub fn new(frame: &Frame) -> Self {
        let set = FrameSet::new(frame);
        let mut by_domain = HashMap::new();
        let domain = set.frame_at(0).domain();
        if !domain.is_empty() {
            by_domain.insert(domain.to_string(), 1);
        }
        Self { set, by_domain }
    }

    /// A dictionary of two frames connected by a mapping. Fails if both
    /// frames carry the same non-empty domain.
    pub fn triple(base: &Frame, mapping: &Mapping, current: &Frame) -> Result<Self> {
        Self::from_parts(FrameSet::triple(base, mapping, current)?)
    }

    /// Build from a deep copy of an existing frame set, indexing its
    /// domains. Fails if two frames share a non-empty domain.
    pub fn from_set(set: &FrameSet) -> Result<Self> {
        Self::from_parts(set.clone())
    }

    fn from_parts(set: FrameSet) -> Result<Self> {
        let mut dict = Self {
            set,
            by_domain: HashMap::new(),
        };
        dict.rebuild_index()?;
        Ok(dict)
    }

    /// Index of the frame with the given domain, case blind. Empty and
    /// unknown domains are lookup errors.
    pub fn get_index(&self, domain: &str) -> Result<i32> {
        if domain.is_empty() {
            return Err(Error::NotFound("empty domain".into()));
        }
        self.by_domain
            .get(&domain.to_uppercase())
            .copied()
            .ok_or_else(|| Error::NotFound(format!("no frame with domain {domain}")))
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        !domain.is_empty() && self.by_domain.contains_key(&domain.to_uppercase())
    }

    /// Domains of all frames that have one, sorted.
    pub fn get_all_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.by_domain.keys().cloned().collect();
        domains.sort();
        domains
    }

    pub fn n_frame(&self) -> usize {
        self.set.n_frame()
    }

    pub fn base(&self) -> i32 {
        self.set.base()
    }

    pub fn current(&self) -> i32 {
        self.set.current()
    }

    /// Deep copy of the frame at an index or domain.
    pub fn get_frame<'a>(&self, at: impl Into<FrameRef<'a>>) -> Result<Frame> {
        self.set.get_frame(self.resolve(at.into())?)
    }

    /// Composite mapping between two frames, each addressed by index or
    /// domain. Always a fresh deep copy.
    pub fn get_mapping<'a, 'b>(
        &self,
        from: impl Into<FrameRef<'a>>,
        to: impl Into<FrameRef<'b>>,
    ) -> Result<Mapping> {
        self.set
            .get_mapping(self.resolve(from.into())?, self.resolve(to.into())?)
    }

    /// Add a frame under an existing one, as [`FrameSet::add_frame`]. Fails
    /// before mutating if the new frame's non-empty domain already exists.
    pub fn add_frame<'a>(
        &mut self,
        at: impl Into<FrameRef<'a>>,
        mapping: &Mapping,
        frame: &Frame,
    ) -> Result<()> {
        let anchor = self.resolve(at.into())?;
        if !frame.domain().is_empty() && self.has_domain(frame.domain()) {
            return Err(Error::Structural(format!(
                "more than one frame with domain {}",
                frame.domain()
            )));
        }
        self.set.add_frame(anchor, mapping, frame)?;
        if !frame.domain().is_empty() {
            self.by_domain
                .insert(frame.domain().to_string(), self.set.current());
        }
        Ok(())
    }

    /// Remove a frame addressed by index or domain, then rebuild the index
    /// around the shifted numbering.
    pub fn remove_frame<'a>(&mut self, at: impl Into<FrameRef<'a>>) -> Result<()> {
        let target = self.resolve(at.into())?;
        self.set.remove_frame(target)?;
        self.rebuild_index()
    }

    /// Remap a frame addressed by index or domain, as
    /// [`FrameSet::remap_frame`].
    pub fn remap_frame<'a>(&mut self, at: impl Into<FrameRef<'a>>, mapping: &Mapping) -> Result<()> {
        let target = self.resolve(at.into())?;
        self.set.remap_frame(target, mapping)
    }

    /// Permute the current frame's axes, as [`FrameSet::perm_axes`].
    pub fn perm_axes(&mut self, perm: &[i32]) -> Result<()> {
        self.set.perm_axes(perm)
    }

    pub fn set_base<'a>(&mut self, at: impl Into<FrameRef<'a>>) -> Result<()> {
        let target = self.resolve(at.into())?;
        self.set.set_base(target)
    }

    pub fn set_current<'a>(&mut self, at: impl Into<FrameRef<'a>>) -> Result<()> {
        let target = self.resolve(at.into())?;
        self.set.set_current(target)
    }

    /// Rename the current frame's domain, validating uniqueness before
    /// committing; on failure nothing changes.
    pub fn set_domain(&mut self, domain: &str) -> Result<()> {
        let upper = domain.to_uppercase();
        let current = self.set.current();
        if !upper.is_empty()
            && let Some(&existing) = self.by_domain.get(&upper)
            && existing != current
        {
            return Err(Error::Structural(format!(
                "more than one frame with domain {upper}"
            )));
        }
        let old = self.set.frame_at((current - 1) as usize).domain().to_string();
        self.set.set_domain(domain);
        if !old.is_empty() {
            self.by_domain.remove(&old);
        }
        if !upper.is_empty() {
            self.by_domain.insert(upper, current);
        }
        Ok(())
    }

    pub fn n_in(&self) -> usize {
        self.set.n_in()
    }

    pub fn n_out(&self) -> usize {
        self.set.n_out()
    }

    /// Evaluate the base→current transform.
    pub fn apply_forward(&self, block: &CoordBlock) -> Result<CoordBlock> {
        self.set.apply_forward(block)
    }

    pub fn apply_inverse(&self, block: &CoordBlock) -> Result<CoordBlock> {
        self.set.apply_inverse(block)
    }

    pub fn apply_forward_point(&self, point: &[f64]) -> Result<Vec<f64>> {
        self.set.apply_forward_point(point)
    }

    pub fn apply_inverse_point(&self, point: &[f64]) -> Result<Vec<f64>> {
        self.set.apply_inverse_point(point)
    }

    /// The underlying frame set.
    pub fn as_set(&self) -> &FrameSet {
        &self.set
    }

    fn resolve(&self, at: FrameRef<'_>) -> Result<i32> {
        match at {
            FrameRef::Index(i) => Ok(i),
            FrameRef::Domain(domain) => self.get_index(domain),
        }
    }

    fn rebuild_index(&mut self) -> Result<()> {
        let mut by_domain = HashMap::new();
        for index in 1..=self.set.n_frame() {
            let domain = self.set.frame_at(index - 1).domain();
            if domain.is_empty() {
                continue;
            }
            if by_domain.insert(domain.to_string(), index as i32).is_some() {
                return Err(Error::Structural(format!(
                    "more than one frame with domain {domain}"
                )));
            }
        }
        self.by_domain = by_domain;
        Ok(())
    }
}

impl Object for FrameDict {
    /// Reports "FrameSet": a FrameDict is a convenience wrapper with no
    /// wire-level identity of its own.
    fn class_name(&self) -> &'static str {
        "FrameSet"
    }

    fn ident(&self) -> &str {
        self.set.ident()
    }

    fn set_ident(&mut self, ident: &str) {
        self.set.set_ident(ident);
    }

    fn to_repr(&self) -> ReprNode {
        self.set.to_repr()
    }

    fn same(&self, other: &Self) -> bool {
        self.set.same(&other.set)
    }

    fn ref_count(&self) -> usize {
        self.set.ref_count()
    }
}

impl fmt::Display for FrameDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.set, f)
    }
}
