//! Frame sets.
//!
//! A [`FrameSet`] is a rooted tree of frames connected by mappings, stored as
//! an arena of nodes addressed by stable 1-based indices. Each non-root node
//! records its parent and the edge mapping from parent coordinates to its
//! own. The composite transform between any two frames is derived on demand
//! by walking up to the lowest common ancestor (inverting each edge) and back
//! down (composing forward).
//!
//! Two distinguished nodes, `base` and `current`, are addressable through the
//! sentinel constants [`FrameSet::BASE`] and [`FrameSet::CURRENT`], resolved
//! against the live fields at call time.
//!
//! Every frame and mapping inserted is deep-copied, and every query returns a
//! deep copy, so nothing handed out can alias the stored graph.

use std::fmt;

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::mapping::Mapping;
use crate::object::{Ident, Object};
use crate::points::CoordBlock;
use crate::repr::{ReprNode, ReprValue};

#[derive(Clone, Debug)]
struct Node {
    frame: Frame,
    parent: Option<usize>,
    /// Mapping from parent coordinates to this node's coordinates.
    /// None iff this node is the root.
    edge: Option<Mapping>,
}

#[derive(Clone, Debug)]
pub struct FrameSet {
    nodes: Vec<Node>,
    base: usize,
    current: usize,
    ident: String,
    identity: Ident,
}

impl FrameSet {
    /// Sentinel index resolving to the base frame at call time.
    pub const BASE: i32 = -1;
    /// Sentinel index resolving to the current frame at call time.
    pub const CURRENT: i32 = -2;

    /// A set holding a deep copy of one frame, which becomes both base and
    /// current.
    pub fn new(frame: &Frame) -> Self {
        Self {
            nodes: vec![Node {
                frame: frame.clone(),
                parent: None,
                edge: None,
            }],
            base: 0,
            current: 0,
            ident: String::new(),
            identity: Ident::new("FrameSet"),
        }
    }

    /// A set of two frames connected by a mapping: base, then current.
    /// All three are deep copied.
    pub fn triple(base: &Frame, mapping: &Mapping, current: &Frame) -> Result<Self> {
        if mapping.n_in() != base.naxes() {
            return Err(Error::ShapeMismatch {
                expected: base.naxes(),
                actual: mapping.n_in(),
            });
        }
        if mapping.n_out() != current.naxes() {
            return Err(Error::ShapeMismatch {
                expected: current.naxes(),
                actual: mapping.n_out(),
            });
        }
        let mut set = Self::new(base);
        set.nodes.push(Node {
            frame: current.clone(),
            parent: Some(0),
            edge: Some(mapping.clone()),
        });
        set.current = 1;
        Ok(set)
    }

    pub fn n_frame(&self) -> usize {
        self.nodes.len()
    }

    /// 1-based index of the base frame.
    pub fn base(&self) -> i32 {
        (self.base + 1) as i32
    }

    /// 1-based index of the current frame.
    pub fn current(&self) -> i32 {
        (self.current + 1) as i32
    }

    pub fn set_base(&mut self, index: i32) -> Result<()> {
        self.base = self.resolve(index)?;
        Ok(())
    }

    pub fn set_current(&mut self, index: i32) -> Result<()> {
        self.current = self.resolve(index)?;
        Ok(())
    }

    /// Rename the current frame's domain. A bare FrameSet places no
    /// uniqueness constraint on domains; FrameDict does.
    pub fn set_domain(&mut self, domain: &str) {
        self.nodes[self.current].frame.set_domain(domain);
    }

    /// Deep copy of the frame at a 1-based or sentinel index.
    pub fn get_frame(&self, index: i32) -> Result<Frame> {
        Ok(self.nodes[self.resolve(index)?].frame.clone())
    }

    /// Composite mapping along the tree path between two frames. Always a
    /// fresh deep copy; a single-edge path comes back as a plain copy of
    /// that edge, and `from == to` yields a UnitMap.
    pub fn get_mapping(&self, from: i32, to: i32) -> Result<Mapping> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        if from == to {
            return Mapping::unit(self.nodes[from].frame.naxes());
        }

        let up_chain = self.chain_to_root(from);
        let down_chain = self.chain_to_root(to);
        let (lca_up, lca_down) = find_junction(&up_chain, &down_chain)?;

        let mut steps: Vec<Mapping> = Vec::new();
        // invert each edge walked upward from `from` to the junction
        for &idx in &up_chain[..lca_up] {
            let edge = self.edge_of(idx)?;
            steps.push(edge.inverse()?);
        }
        // then forward down to `to`
        for &idx in down_chain[..lca_down].iter().rev() {
            steps.push(self.edge_of(idx)?.clone());
        }

        let mut steps = steps.into_iter();
        let mut composed = match steps.next() {
            Some(first) => first,
            None => return Mapping::unit(self.nodes[from].frame.naxes()),
        };
        for step in steps {
            composed = composed.then(&step)?;
        }
        Ok(composed)
    }

    /// Insert a deep copy of `frame` as a child of the frame at `index`,
    /// connected by a deep copy of `mapping` (existing frame coordinates to
    /// new frame coordinates). The new frame becomes current.
    pub fn add_frame(&mut self, index: i32, mapping: &Mapping, frame: &Frame) -> Result<()> {
        let anchor = self.resolve(index)?;
        let anchor_naxes = self.nodes[anchor].frame.naxes();
        if mapping.n_in() != anchor_naxes {
            return Err(Error::ShapeMismatch {
                expected: anchor_naxes,
                actual: mapping.n_in(),
            });
        }
        if mapping.n_out() != frame.naxes() {
            return Err(Error::ShapeMismatch {
                expected: frame.naxes(),
                actual: mapping.n_out(),
            });
        }
        self.nodes.push(Node {
            frame: frame.clone(),
            parent: Some(anchor),
            edge: Some(mapping.clone()),
        });
        self.current = self.nodes.len() - 1;
        Ok(())
    }

    /// Remove a non-last frame. Children re-parent to the removed node's
    /// parent with their edges composed through it, so the net transform
    /// between every remaining pair of frames is preserved. Indices above
    /// the removed frame shift down by one; base/current follow their frame
    /// or fall back to the removed node's neighbour.
    pub fn remove_frame(&mut self, index: i32) -> Result<()> {
        let target = self.resolve(index)?;
        if self.nodes.len() == 1 {
            return Err(Error::Structural("cannot remove the last frame".into()));
        }

        let children: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].parent == Some(target))
            .collect();

        // Work out every rewire before touching the arena, so a failure
        // leaves the set unmodified.
        let mut rewires: Vec<(usize, Option<usize>, Option<Mapping>)> = Vec::new();
        let fallback;
        match self.nodes[target].parent {
            Some(parent) => {
                let edge_in = self.edge_of(target)?;
                for &child in &children {
                    let composed = edge_in.then(self.edge_of(child)?)?;
                    rewires.push((child, Some(parent), Some(composed)));
                }
                fallback = parent;
            }
            None => {
                // removing the root: promote its first child
                let head = children[0];
                let head_edge_inv = self.edge_of(head)?.inverse()?;
                rewires.push((head, None, None));
                for &child in &children[1..] {
                    let composed = head_edge_inv.then(self.edge_of(child)?)?;
                    rewires.push((child, Some(head), Some(composed)));
                }
                fallback = head - 1;
            }
        }

        for (child, parent, edge) in rewires {
            self.nodes[child].parent = parent;
            self.nodes[child].edge = edge;
        }
        self.nodes.remove(target);
        for node in self.nodes.iter_mut() {
            if let Some(p) = node.parent
                && p > target
            {
                node.parent = Some(p - 1);
            }
        }
        let fix = |i: usize| {
            if i == target {
                fallback
            } else if i > target {
                i - 1
            } else {
                i
            }
        };
        self.base = fix(self.base);
        self.current = fix(self.current);
        Ok(())
    }

    /// Change how the frame at `index` relates to the rest of the set: the
    /// mapping's forward transform converts the frame's old coordinates into
    /// its new ones. The frame objects themselves are untouched.
    pub fn remap_frame(&mut self, index: i32, mapping: &Mapping) -> Result<()> {
        let target = self.resolve(index)?;
        self.remap_at(target, mapping)
    }

    fn remap_at(&mut self, target: usize, mapping: &Mapping) -> Result<()> {
        let naxes = self.nodes[target].frame.naxes();
        if mapping.n_in() != naxes {
            return Err(Error::ShapeMismatch {
                expected: naxes,
                actual: mapping.n_in(),
            });
        }
        if mapping.n_out() != naxes {
            return Err(Error::ShapeMismatch {
                expected: naxes,
                actual: mapping.n_out(),
            });
        }

        let children: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].parent == Some(target))
            .collect();

        // All fallible work happens before the first mutation.
        let inverse = if children.is_empty() {
            None
        } else {
            Some(mapping.inverse()?)
        };
        let new_parent_edge = match &self.nodes[target].edge {
            Some(edge) => Some(edge.then(mapping)?),
            None => None,
        };
        let mut new_child_edges: Vec<(usize, Mapping)> = Vec::new();
        if let Some(inverse) = &inverse {
            for &child in &children {
                new_child_edges.push((child, inverse.then(self.edge_of(child)?)?));
            }
        }

        if let Some(edge) = new_parent_edge {
            self.nodes[target].edge = Some(edge);
        }
        for (child, edge) in new_child_edges {
            self.nodes[child].edge = Some(edge);
        }
        Ok(())
    }

    /// Permute the axes of the current frame in place, updating the edges
    /// touching it so the net transform to every other frame follows the
    /// permutation. A transposition applied twice restores the original
    /// behavior.
    pub fn perm_axes(&mut self, perm: &[i32]) -> Result<()> {
        let target = self.current;
        let naxes = self.nodes[target].frame.naxes();
        if perm.len() != naxes {
            return Err(Error::ShapeMismatch {
                expected: naxes,
                actual: perm.len(),
            });
        }
        let pmap = Mapping::axis_permutation(perm)?;
        self.remap_at(target, &pmap)?;
        self.nodes[target].frame.perm_axes(perm)
    }

    /// Input dimensionality of the base→current transform.
    pub fn n_in(&self) -> usize {
        self.nodes[self.base].frame.naxes()
    }

    /// Output dimensionality of the base→current transform.
    pub fn n_out(&self) -> usize {
        self.nodes[self.current].frame.naxes()
    }

    /// Evaluate the base→current transform.
    pub fn apply_forward(&self, block: &CoordBlock) -> Result<CoordBlock> {
        self.get_mapping(Self::BASE, Self::CURRENT)?.apply_forward(block)
    }

    pub fn apply_inverse(&self, block: &CoordBlock) -> Result<CoordBlock> {
        self.get_mapping(Self::BASE, Self::CURRENT)?.apply_inverse(block)
    }

    pub fn apply_forward_point(&self, point: &[f64]) -> Result<Vec<f64>> {
        let out = self.apply_forward(&CoordBlock::from_point(point)?)?;
        Ok(out.point(0))
    }

    pub fn apply_inverse_point(&self, point: &[f64]) -> Result<Vec<f64>> {
        let out = self.apply_inverse(&CoordBlock::from_point(point)?)?;
        Ok(out.point(0))
    }

    pub(crate) fn frame_at(&self, index0: usize) -> &Frame {
        &self.nodes[index0].frame
    }

    fn resolve(&self, index: i32) -> Result<usize> {
        match index {
            Self::BASE => Ok(self.base),
            Self::CURRENT => Ok(self.current),
            i if i >= 1 && (i as usize) <= self.nodes.len() => Ok((i - 1) as usize),
            other => Err(Error::NotFound(format!("no frame with index {other}"))),
        }
    }

    /// Arena indices from `start` up to the root, inclusive.
    fn chain_to_root(&self, start: usize) -> Vec<usize> {
        let mut chain = vec![start];
        let mut idx = start;
        while let Some(parent) = self.nodes[idx].parent {
            chain.push(parent);
            idx = parent;
        }
        chain
    }

    fn edge_of(&self, index0: usize) -> Result<&Mapping> {
        self.nodes[index0].edge.as_ref().ok_or_else(|| {
            Error::Structural(format!("frame {} has no parent edge", index0 + 1))
        })
    }

    pub fn from_repr(node: &ReprNode) -> Result<Self> {
        if node.class() != "FrameSet" {
            return Err(Error::InvalidArgument(format!(
                "class {} is not a FrameSet",
                node.class()
            )));
        }
        let nframe = node.get_int("Nframe")? as usize;
        let base = node.get_int("Base")?;
        let current = node.get_int("Current")?;

        let mut nodes: Vec<Node> = Vec::new();
        let mut pending_parent: Option<i64> = None;
        for (key, value) in node.items() {
            match (key.as_str(), value) {
                ("Frame", ReprValue::Node(frame_node)) => {
                    if nodes.len() > 1 && nodes[nodes.len() - 1].parent.is_none() {
                        return Err(Error::InvalidArgument(
                            "non-root frame is missing its parent link".into(),
                        ));
                    }
                    nodes.push(Node {
                        frame: Frame::from_repr(frame_node)?,
                        parent: None,
                        edge: None,
                    });
                }
                ("Parent", ReprValue::Int(p)) => pending_parent = Some(*p),
                ("Map", ReprValue::Node(map_node)) => {
                    let parent = pending_parent.take().ok_or_else(|| {
                        Error::InvalidArgument("edge mapping without a parent index".into())
                    })?;
                    let child = nodes.len().checked_sub(1).ok_or_else(|| {
                        Error::InvalidArgument("edge mapping precedes any frame".into())
                    })?;
                    if parent < 1 || parent as usize > child {
                        return Err(Error::InvalidArgument(format!(
                            "parent index {parent} out of range for frame {}",
                            child + 1
                        )));
                    }
                    let mapping = Mapping::from_repr(map_node)?;
                    let parent0 = (parent - 1) as usize;
                    if mapping.n_in() != nodes[parent0].frame.naxes()
                        || mapping.n_out() != nodes[child].frame.naxes()
                    {
                        return Err(Error::ShapeMismatch {
                            expected: nodes[child].frame.naxes(),
                            actual: mapping.n_out(),
                        });
                    }
                    nodes[child].parent = Some(parent0);
                    nodes[child].edge = Some(mapping);
                }
                _ => {}
            }
        }

        if nodes.len() != nframe || nodes.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "frame set declares {nframe} frames but carries {}",
                nodes.len()
            )));
        }
        for (i, n) in nodes.iter().enumerate().skip(1) {
            if n.parent.is_none() {
                return Err(Error::InvalidArgument(format!(
                    "frame {} is missing its parent link",
                    i + 1
                )));
            }
        }
        let in_range = |i: i64| i >= 1 && i as usize <= nodes.len();
        if !in_range(base) || !in_range(current) {
            return Err(Error::InvalidArgument(format!(
                "base/current ({base}/{current}) out of range"
            )));
        }

        let mut set = Self {
            nodes,
            base: (base - 1) as usize,
            current: (current - 1) as usize,
            ident: String::new(),
            identity: Ident::new("FrameSet"),
        };
        if let Some(ident) = node.opt_str("Ident") {
            set.set_ident(ident);
        }
        Ok(set)
    }
}

fn find_junction(up_chain: &[usize], down_chain: &[usize]) -> Result<(usize, usize)> {
    for (down_pos, idx) in down_chain.iter().enumerate() {
        if let Some(up_pos) = up_chain.iter().position(|x| x == idx) {
            return Ok((up_pos, down_pos));
        }
    }
    Err(Error::Structural("frames are not connected".into()))
}

impl Object for FrameSet {
    fn class_name(&self) -> &'static str {
        "FrameSet"
    }

    fn ident(&self) -> &str {
        &self.ident
    }

    fn set_ident(&mut self, ident: &str) {
        self.ident = ident.to_string();
    }

    fn to_repr(&self) -> ReprNode {
        let mut node = ReprNode::new("FrameSet");
        if !self.ident.is_empty() {
            node.push("Ident", ReprValue::Str(self.ident.clone()));
        }
        node.push("Nframe", ReprValue::Int(self.nodes.len() as i64));
        node.push("Base", ReprValue::Int((self.base + 1) as i64));
        node.push("Current", ReprValue::Int((self.current + 1) as i64));
        for n in &self.nodes {
            node.push("Frame", ReprValue::Node(n.frame.to_repr()));
            if let (Some(parent), Some(edge)) = (n.parent, &n.edge) {
                node.push("Parent", ReprValue::Int((parent + 1) as i64));
                node.push("Map", ReprValue::Node(edge.to_repr()));
            }
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

impl fmt::Display for FrameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FrameSet({} frames, base={}, current={})",
            self.nodes.len(),
            self.base + 1,
            self.current + 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_frame_set(zoom: f64) -> FrameSet {
        let frame1 = Frame::with_domain(2, "frame1").unwrap();
        let frame2 = Frame::with_domain(2, "frame2").unwrap();
        let map = Mapping::zoom(2, zoom).unwrap();
        FrameSet::triple(&frame1, &map, &frame2).unwrap()
    }

    fn assert_points_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert_relative_eq!(x, y, epsilon = 1e-8, max_relative = 1e-5);
        }
    }

    #[test]
    fn single_frame_set_is_identity() {
        let set = FrameSet::new(&Frame::with_domain(2, "sky").unwrap());
        assert_eq!(set.n_frame(), 1);
        assert_eq!(set.base(), 1);
        assert_eq!(set.current(), 1);
        let out = set.apply_forward_point(&[0.3, 0.7]).unwrap();
        assert_eq!(out, vec![0.3, 0.7]);
    }

    #[test]
    fn triple_checks_dimensions() {
        let f2 = Frame::new(2).unwrap();
        let f3 = Frame::new(3).unwrap();
        let zoom2 = Mapping::zoom(2, 2.0).unwrap();
        assert!(FrameSet::triple(&f3, &zoom2, &f2).is_err());
        assert!(FrameSet::triple(&f2, &zoom2, &f3).is_err());
    }

    #[test]
    fn insertion_deep_copies_everything() {
        let mut frame1 = Frame::with_domain(2, "frame1").unwrap();
        let mut map = Mapping::zoom(2, 1.5).unwrap();
        map.set_ident("zoomMap");
        let frame2 = Frame::with_domain(2, "frame2").unwrap();
        let set = FrameSet::triple(&frame1, &map, &frame2).unwrap();

        frame1.set_domain("newdomain");
        map.set_ident("newMapping");

        assert_eq!(set.get_frame(FrameSet::BASE).unwrap().domain(), "FRAME1");
        assert_eq!(
            set.get_mapping(FrameSet::BASE, FrameSet::CURRENT)
                .unwrap()
                .ident(),
            "zoomMap"
        );
        assert_eq!(frame1.ref_count(), 1);
        assert_eq!(map.ref_count(), 1);
    }

    #[test]
    fn base_to_current_applies_forward() {
        let set = two_frame_set(1.5);
        let indata = [1.1, 1.2];
        let out = set.apply_forward_point(&indata).unwrap();
        assert_points_close(&out, &[1.1 * 1.5, 1.2 * 1.5]);
        let back = set.apply_inverse_point(&out).unwrap();
        assert_points_close(&back, &indata);
    }

    #[test]
    fn swapping_base_and_current_inverts() {
        let mut set = two_frame_set(2.0);
        set.set_current(1).unwrap();
        let out = set.apply_forward_point(&[4.0, 8.0]).unwrap();
        assert_points_close(&out, &[4.0, 8.0]);

        set.set_base(2).unwrap();
        let out = set.apply_forward_point(&[4.0, 8.0]).unwrap();
        assert_points_close(&out, &[2.0, 4.0]);
    }

    #[test]
    fn sentinels_resolve_dynamically() {
        let mut set = two_frame_set(2.0);
        assert_eq!(set.get_frame(FrameSet::CURRENT).unwrap().domain(), "FRAME2");
        set.set_current(FrameSet::BASE).unwrap();
        assert_eq!(set.get_frame(FrameSet::CURRENT).unwrap().domain(), "FRAME1");
    }

    #[test]
    fn invalid_index_is_not_found() {
        let set = two_frame_set(2.0);
        assert!(matches!(set.get_frame(3), Err(Error::NotFound(_))));
        assert!(matches!(set.get_frame(0), Err(Error::NotFound(_))));
        assert!(matches!(set.get_frame(-7), Err(Error::NotFound(_))));
    }

    #[test]
    fn get_mapping_same_frame_is_unit() {
        let set = two_frame_set(2.0);
        let map = set.get_mapping(1, 1).unwrap();
        assert_eq!(map.class_name(), "UnitMap");
        assert_eq!(map.n_in(), 2);
    }

    #[test]
    fn get_mapping_returns_fresh_copies() {
        let set = two_frame_set(2.0);
        let mut first = set.get_mapping(1, 2).unwrap();
        first.set_ident("mutated");
        let second = set.get_mapping(1, 2).unwrap();
        assert_eq!(second.ident(), "");
        assert!(!first.same(&second));
    }

    #[test]
    fn add_frame_walks_multi_edge_paths() {
        let mut set = two_frame_set(2.0);
        let frame3 = Frame::with_domain(2, "frame3").unwrap();
        let shift = Mapping::shift(&[1.0, -1.0]).unwrap();
        set.add_frame(2, &shift, &frame3).unwrap();

        assert_eq!(set.n_frame(), 3);
        assert_eq!(set.current(), 3);

        // base -> current: zoom then shift
        let out = set.apply_forward_point(&[3.0, 4.0]).unwrap();
        assert_points_close(&out, &[7.0, 7.0]);

        // sibling path: frame3 -> frame1 inverts both edges
        let map = set.get_mapping(3, 1).unwrap();
        let back = map.apply_forward_point(&[7.0, 7.0]).unwrap();
        assert_points_close(&back, &[3.0, 4.0]);
    }

    #[test]
    fn add_frame_validates_mapping_dims() {
        let mut set = two_frame_set(2.0);
        let frame3 = Frame::new(3).unwrap();
        let zoom2 = Mapping::zoom(2, 2.0).unwrap();
        assert!(matches!(
            set.add_frame(1, &zoom2, &frame3),
            Err(Error::ShapeMismatch { .. })
        ));
        assert_eq!(set.n_frame(), 2);
    }

    #[test]
    fn remove_frame_renumbers_and_preserves_transforms() {
        let mut set = two_frame_set(1.5);
        set.remove_frame(1).unwrap();
        assert_eq!(set.n_frame(), 1);
        assert_eq!(set.base(), 1);
        assert_eq!(set.current(), 1);
        assert_eq!(set.get_frame(1).unwrap().domain(), "FRAME2");

        // the survivor's transform to itself is the identity
        let out = set.apply_forward_point(&[0.4, 0.5]).unwrap();
        assert_eq!(out, vec![0.4, 0.5]);
    }

    #[test]
    fn remove_middle_frame_bridges_children() {
        // frame1 --zoom2--> frame2 --shift--> frame3
        let mut set = two_frame_set(2.0);
        let frame3 = Frame::with_domain(2, "frame3").unwrap();
        let shift = Mapping::shift(&[1.0, -1.0]).unwrap();
        set.add_frame(2, &shift, &frame3).unwrap();

        let before = set.get_mapping(1, 3).unwrap();
        let expected = before.apply_forward_point(&[3.0, 4.0]).unwrap();

        set.remove_frame(2).unwrap();
        assert_eq!(set.n_frame(), 2);
        assert_eq!(set.get_frame(2).unwrap().domain(), "FRAME3");

        let after = set.get_mapping(1, 2).unwrap();
        let got = after.apply_forward_point(&[3.0, 4.0]).unwrap();
        assert_points_close(&got, &expected);
    }

    #[test]
    fn remove_last_frame_fails_without_mutation() {
        let mut set = two_frame_set(1.5);
        set.remove_frame(2).unwrap();
        let err = set.remove_frame(1);
        assert!(matches!(err, Err(Error::Structural(_))));
        assert_eq!(set.n_frame(), 1);
        assert_eq!(set.get_frame(1).unwrap().domain(), "FRAME1");
    }

    #[test]
    fn remap_frame_changes_only_the_relationship() {
        let mut set = two_frame_set(1.5);
        let indata = [
            vec![0.0, 0.1, -1.5],
            vec![5.1, 0.0, 3.1],
        ];
        let block = CoordBlock::from_rows(&indata).unwrap();

        let shift = Mapping::shift(&[0.5, -1.5]).unwrap();
        set.remap_frame(1, &shift).unwrap();

        // (indata - shift) * zoom
        let out = set.apply_forward(&block).unwrap();
        for p in 0..3 {
            assert_relative_eq!(out.value(0, p), (indata[0][p] - 0.5) * 1.5, max_relative = 1e-12);
            assert_relative_eq!(out.value(1, p), (indata[1][p] + 1.5) * 1.5, max_relative = 1e-12);
        }
        let back = set.apply_inverse(&out).unwrap();
        for p in 0..3 {
            assert_relative_eq!(back.value(0, p), indata[0][p], epsilon = 1e-8, max_relative = 1e-5);
        }

        // frames themselves are untouched
        assert_eq!(set.get_frame(1).unwrap().domain(), "FRAME1");
        assert_eq!(set.get_frame(2).unwrap().domain(), "FRAME2");
    }

    #[test]
    fn perm_axes_twice_restores_behavior() {
        let frame1 = Frame::new(2).unwrap();
        let frame2 = Frame::new(2).unwrap();
        let unit = Mapping::unit(2).unwrap();
        let mut set = FrameSet::triple(&frame1, &unit, &frame2).unwrap();
        let x = 0.257;
        let y = 0.832;

        set.perm_axes(&[2, 1]).unwrap();
        assert_points_close(&set.apply_forward_point(&[x, y]).unwrap(), &[y, x]);
        assert_points_close(&set.apply_inverse_point(&[x, y]).unwrap(), &[y, x]);

        set.perm_axes(&[2, 1]).unwrap();
        assert_points_close(&set.apply_forward_point(&[x, y]).unwrap(), &[x, y]);
        assert_points_close(&set.apply_inverse_point(&[x, y]).unwrap(), &[x, y]);
    }

    #[test]
    fn perm_axes_with_unequal_dims() {
        // 3 inputs -> 2 outputs, dropped axis restored from a constant
        let x = 75.1;
        let y = -53.2;
        let z = 0.123;
        let frame1 = Frame::new(3).unwrap();
        let perm = Mapping::perm(&[1, 2, -1], &[1, 2], &[z]).unwrap();
        let frame2 = Frame::new(2).unwrap();
        let mut set = FrameSet::triple(&frame1, &perm, &frame2).unwrap();

        assert_points_close(&set.apply_forward_point(&[x, y, z]).unwrap(), &[x, y]);
        assert_points_close(&set.apply_inverse_point(&[x, y]).unwrap(), &[x, y, z]);

        set.perm_axes(&[2, 1]).unwrap();
        assert_points_close(&set.apply_forward_point(&[x, y, z]).unwrap(), &[y, x]);
        assert_points_close(&set.apply_inverse_point(&[x, y]).unwrap(), &[y, x, z]);

        set.perm_axes(&[2, 1]).unwrap();
        assert_points_close(&set.apply_forward_point(&[x, y, z]).unwrap(), &[x, y]);
        assert_points_close(&set.apply_inverse_point(&[x, y]).unwrap(), &[x, y, z]);
    }

    #[test]
    fn set_domain_renames_current() {
        let mut set = two_frame_set(2.0);
        set.set_domain("plate");
        assert_eq!(set.get_frame(2).unwrap().domain(), "PLATE");
        assert_eq!(set.get_frame(1).unwrap().domain(), "FRAME1");
    }

    #[test]
    fn copy_is_independent() {
        let set = two_frame_set(2.0);
        let mut copy = set.copy();
        assert!(!set.same(&copy));
        assert_eq!(set.show(), copy.show());
        assert_eq!(set.to_string(), copy.to_string());

        copy.set_domain("changed");
        assert_eq!(set.get_frame(2).unwrap().domain(), "FRAME2");
    }

    #[test]
    fn repr_round_trip() {
        let mut set = two_frame_set(1.5);
        let frame3 = Frame::with_domain(2, "frame3").unwrap();
        set.add_frame(1, &Mapping::shift(&[0.25, 0.75]).unwrap(), &frame3)
            .unwrap();
        set.set_base(2).unwrap();
        set.set_ident("wcs");

        let restored = FrameSet::from_repr(&set.to_repr()).unwrap();
        assert_eq!(restored.show(), set.show());
        assert_eq!(restored.base(), set.base());
        assert_eq!(restored.current(), set.current());
        assert_eq!(restored.n_frame(), 3);
        assert_eq!(restored.ident(), "wcs");

        let a = set.apply_forward_point(&[1.0, 2.0]).unwrap();
        let b = restored.apply_forward_point(&[1.0, 2.0]).unwrap();
        assert_points_close(&a, &b);
    }
}
