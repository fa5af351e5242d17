//! Coordinate mappings.
//!
//! A [`Mapping`] is a forward (and usually inverse) numeric transform with
//! fixed input/output dimensionality, drawn from a closed set of kinds:
//! identity (`UnitMap`), uniform scale (`ZoomMap`), per-axis offset
//! (`ShiftMap`), axis permutation/selection (`PermMap`), and a left-to-right
//! pipeline (`SeriesMap`). Composition is explicit about order: `a.then(b)`
//! applies `a` first.
//!
//! Every kind is closed under inversion, so no inversion flag is carried:
//! `inverse()` returns the closed-form inverse kind or a capability error.

use std::fmt;

use crate::error::{Error, Result};
use crate::object::{Ident, Object};
use crate::points::CoordBlock;
use crate::repr::{ReprNode, ReprValue};
use crate::simplify;

/// Tolerance for recognizing identity values during simplification.
pub const EPSILON: f64 = 1e-12;

#[derive(Clone, Debug)]
pub struct Mapping {
    kind: MapKind,
    ident: String,
    identity: Ident,
}

#[derive(Clone, Debug)]
pub(crate) enum MapKind {
    Unit {
        naxes: usize,
    },
    Zoom {
        naxes: usize,
        factor: f64,
    },
    Shift {
        offsets: Vec<f64>,
    },
    /// 1-based axis selection in each direction; a negative entry -k reads
    /// `constants[k-1]` instead of an axis.
    Perm {
        inperm: Vec<i32>,
        outperm: Vec<i32>,
        constants: Vec<f64>,
    },
    Series {
        maps: Vec<Mapping>,
    },
}

fn class_of(kind: &MapKind) -> &'static str {
    match kind {
        MapKind::Unit { .. } => "UnitMap",
        MapKind::Zoom { .. } => "ZoomMap",
        MapKind::Shift { .. } => "ShiftMap",
        MapKind::Perm { .. } => "PermMap",
        MapKind::Series { .. } => "SeriesMap",
    }
}

impl Mapping {
    pub(crate) fn from_kind(kind: MapKind, ident: String) -> Self {
        let identity = Ident::new(class_of(&kind));
        Self {
            kind,
            ident,
            identity,
        }
    }

    /// Identity mapping over `naxes` axes.
    pub fn unit(naxes: usize) -> Result<Self> {
        if naxes == 0 {
            return Err(Error::InvalidArgument("mapping needs at least one axis".into()));
        }
        Ok(Self::from_kind(MapKind::Unit { naxes }, String::new()))
    }

    /// Uniform scale by `factor` over `naxes` axes.
    pub fn zoom(naxes: usize, factor: f64) -> Result<Self> {
        if naxes == 0 {
            return Err(Error::InvalidArgument("mapping needs at least one axis".into()));
        }
        if factor == 0.0 {
            return Err(Error::InvalidArgument("zoom factor must be nonzero".into()));
        }
        Ok(Self::from_kind(MapKind::Zoom { naxes, factor }, String::new()))
    }

    /// Per-axis offset; dimensionality is the offset count.
    pub fn shift(offsets: &[f64]) -> Result<Self> {
        if offsets.is_empty() {
            return Err(Error::InvalidArgument("mapping needs at least one axis".into()));
        }
        Ok(Self::from_kind(
            MapKind::Shift {
                offsets: offsets.to_vec(),
            },
            String::new(),
        ))
    }

    /// Axis permutation/selection. `outperm` drives the forward direction
    /// (one entry per output axis), `inperm` the inverse (one entry per input
    /// axis). The forward direction must be fully specified; an inverse entry
    /// that references a missing constant leaves the mapping constructible
    /// but non-invertible.
    pub fn perm(inperm: &[i32], outperm: &[i32], constants: &[f64]) -> Result<Self> {
        if inperm.is_empty() || outperm.is_empty() {
            return Err(Error::InvalidArgument("mapping needs at least one axis".into()));
        }
        let nin = inperm.len();
        let nout = outperm.len();
        for &s in outperm {
            if s == 0 {
                return Err(Error::InvalidArgument("permutation entries must be nonzero".into()));
            }
            if s > 0 && s as usize > nin {
                return Err(Error::InvalidArgument(format!(
                    "output axis selects input {s} but there are only {nin} inputs"
                )));
            }
            if s < 0 && s.unsigned_abs() as usize > constants.len() {
                return Err(Error::InvalidArgument(format!(
                    "output axis references constant {} but only {} were supplied",
                    s.unsigned_abs(),
                    constants.len()
                )));
            }
        }
        for &s in inperm {
            if s == 0 {
                return Err(Error::InvalidArgument("permutation entries must be nonzero".into()));
            }
            if s > 0 && s as usize > nout {
                return Err(Error::InvalidArgument(format!(
                    "input axis selects output {s} but there are only {nout} outputs"
                )));
            }
        }
        Ok(Self::from_kind(
            MapKind::Perm {
                inperm: inperm.to_vec(),
                outperm: outperm.to_vec(),
                constants: constants.to_vec(),
            },
            String::new(),
        ))
    }

    /// Square permutation of `perm.len()` axes, 1-based, invertible.
    pub fn axis_permutation(perm: &[i32]) -> Result<Self> {
        let n = perm.len();
        let mut seen = vec![false; n];
        for &s in perm {
            if s < 1 || s as usize > n || seen[(s - 1) as usize] {
                return Err(Error::InvalidArgument(format!(
                    "[{perm:?}] is not a permutation of 1..={n}"
                )));
            }
            seen[(s - 1) as usize] = true;
        }
        // inverse permutation: where does each original axis end up
        let mut inperm = vec![0i32; n];
        for (j, &s) in perm.iter().enumerate() {
            inperm[(s - 1) as usize] = (j + 1) as i32;
        }
        Self::perm(&inperm, perm, &[])
    }

    pub(crate) fn kind(&self) -> &MapKind {
        &self.kind
    }

    pub fn n_in(&self) -> usize {
        match &self.kind {
            MapKind::Unit { naxes } | MapKind::Zoom { naxes, .. } => *naxes,
            MapKind::Shift { offsets } => offsets.len(),
            MapKind::Perm { inperm, .. } => inperm.len(),
            MapKind::Series { maps } => maps[0].n_in(),
        }
    }

    pub fn n_out(&self) -> usize {
        match &self.kind {
            MapKind::Unit { naxes } | MapKind::Zoom { naxes, .. } => *naxes,
            MapKind::Shift { offsets } => offsets.len(),
            MapKind::Perm { outperm, .. } => outperm.len(),
            MapKind::Series { maps } => maps[maps.len() - 1].n_out(),
        }
    }

    /// Whether the inverse transform is defined.
    pub fn invertible(&self) -> bool {
        match &self.kind {
            MapKind::Unit { .. } | MapKind::Zoom { .. } | MapKind::Shift { .. } => true,
            MapKind::Perm {
                inperm, constants, ..
            } => inperm
                .iter()
                .all(|&s| s > 0 || s.unsigned_abs() as usize <= constants.len()),
            MapKind::Series { maps } => maps.iter().all(Mapping::invertible),
        }
    }

    /// Closed-form inverse. Fails with a capability error if this mapping
    /// declares itself non-invertible.
    pub fn inverse(&self) -> Result<Self> {
        if !self.invertible() {
            return Err(Error::NotInvertible(format!(
                "{} does not define an inverse transform",
                self.class_name()
            )));
        }
        let kind = match &self.kind {
            MapKind::Unit { naxes } => MapKind::Unit { naxes: *naxes },
            MapKind::Zoom { naxes, factor } => MapKind::Zoom {
                naxes: *naxes,
                factor: 1.0 / factor,
            },
            MapKind::Shift { offsets } => MapKind::Shift {
                offsets: offsets.iter().map(|o| -o).collect(),
            },
            MapKind::Perm {
                inperm,
                outperm,
                constants,
            } => MapKind::Perm {
                inperm: outperm.clone(),
                outperm: inperm.clone(),
                constants: constants.clone(),
            },
            MapKind::Series { maps } => {
                let inverses: Result<Vec<Mapping>> =
                    maps.iter().rev().map(Mapping::inverse).collect();
                MapKind::Series { maps: inverses? }
            }
        };
        Ok(Self::from_kind(kind, self.ident.clone()))
    }

    /// Left-to-right composition: the result applies `self` first, `next`
    /// second. Dimensionalities must agree at construction time.
    pub fn then(&self, next: &Mapping) -> Result<Self> {
        if self.n_out() != next.n_in() {
            return Err(Error::ShapeMismatch {
                expected: self.n_out(),
                actual: next.n_in(),
            });
        }
        let mut maps = self.pipeline_parts();
        maps.extend(next.pipeline_parts());
        Ok(Self::from_kind(MapKind::Series { maps }, String::new()))
    }

    /// Pipeline elements of this mapping: its series children, or itself.
    pub(crate) fn pipeline_parts(&self) -> Vec<Mapping> {
        match &self.kind {
            MapKind::Series { maps } => maps.clone(),
            _ => vec![self.clone()],
        }
    }

    /// Equivalent mapping in minimal canonical form.
    pub fn simplify(&self) -> Self {
        simplify::simplify_mapping(self)
    }

    pub fn apply_forward(&self, block: &CoordBlock) -> Result<CoordBlock> {
        self.transform(block, true)
    }

    pub fn apply_inverse(&self, block: &CoordBlock) -> Result<CoordBlock> {
        self.transform(block, false)
    }

    /// Vector-form forward transform of a single point.
    pub fn apply_forward_point(&self, point: &[f64]) -> Result<Vec<f64>> {
        let out = self.apply_forward(&CoordBlock::from_point(point)?)?;
        Ok(out.point(0))
    }

    /// Vector-form inverse transform of a single point.
    pub fn apply_inverse_point(&self, point: &[f64]) -> Result<Vec<f64>> {
        let out = self.apply_inverse(&CoordBlock::from_point(point)?)?;
        Ok(out.point(0))
    }

    fn transform(&self, block: &CoordBlock, forward: bool) -> Result<CoordBlock> {
        let expected = if forward { self.n_in() } else { self.n_out() };
        if block.naxes() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                actual: block.naxes(),
            });
        }
        if !forward && !self.invertible() {
            return Err(Error::NotInvertible(format!(
                "{} does not define an inverse transform",
                self.class_name()
            )));
        }
        let npoint = block.npoint();
        Ok(match &self.kind {
            MapKind::Unit { naxes } => {
                CoordBlock::from_values(*naxes, npoint, block.values().to_vec())
            }
            MapKind::Zoom { naxes, factor } => {
                let scale = if forward { *factor } else { 1.0 / factor };
                let values = block.values().iter().map(|v| v * scale).collect();
                CoordBlock::from_values(*naxes, npoint, values)
            }
            MapKind::Shift { offsets } => {
                let sign = if forward { 1.0 } else { -1.0 };
                let mut values = Vec::with_capacity(offsets.len() * npoint);
                for (axis, offset) in offsets.iter().enumerate() {
                    values.extend(block.row(axis).iter().map(|v| v + sign * offset));
                }
                CoordBlock::from_values(offsets.len(), npoint, values)
            }
            MapKind::Perm {
                inperm,
                outperm,
                constants,
            } => {
                let selector = if forward { outperm } else { inperm };
                perm_apply(selector, constants, block)
            }
            MapKind::Series { maps } => {
                if forward {
                    let mut acc = block.clone();
                    for map in maps {
                        acc = map.apply_forward(&acc)?;
                    }
                    acc
                } else {
                    let mut acc = block.clone();
                    for map in maps.iter().rev() {
                        acc = map.apply_inverse(&acc)?;
                    }
                    acc
                }
            }
        })
    }

    pub fn from_repr(node: &ReprNode) -> Result<Self> {
        let mut mapping = match node.class() {
            "UnitMap" => Self::unit(node.get_int("Naxes")? as usize)?,
            "ZoomMap" => Self::zoom(node.get_int("Naxes")? as usize, node.get_float("Zoom")?)?,
            "ShiftMap" => Self::shift(&node.get_float_list("Shift")?)?,
            "PermMap" => {
                let inperm: Vec<i32> =
                    node.get_int_list("In")?.iter().map(|&v| v as i32).collect();
                let outperm: Vec<i32> =
                    node.get_int_list("Out")?.iter().map(|&v| v as i32).collect();
                let constants = node.opt_float_list("Constants").unwrap_or_default();
                Self::perm(&inperm, &outperm, &constants)?
            }
            "SeriesMap" => {
                let nmap = node.get_int("Nmap")? as usize;
                let maps: Result<Vec<Mapping>> =
                    node.nodes_named("Map").map(Mapping::from_repr).collect();
                let maps = maps?;
                if maps.len() != nmap || maps.is_empty() {
                    return Err(Error::InvalidArgument(format!(
                        "SeriesMap declares {nmap} maps but carries {}",
                        maps.len()
                    )));
                }
                for pair in maps.windows(2) {
                    if pair[0].n_out() != pair[1].n_in() {
                        return Err(Error::ShapeMismatch {
                            expected: pair[0].n_out(),
                            actual: pair[1].n_in(),
                        });
                    }
                }
                Self::from_kind(MapKind::Series { maps }, String::new())
            }
            other => {
                return Err(Error::InvalidArgument(format!(
                    "class {other} is not a mapping"
                )));
            }
        };
        if let Some(ident) = node.opt_str("Ident") {
            mapping.set_ident(ident);
        }
        Ok(mapping)
    }
}

fn perm_apply(selector: &[i32], constants: &[f64], block: &CoordBlock) -> CoordBlock {
    let npoint = block.npoint();
    let mut values = Vec::with_capacity(selector.len() * npoint);
    for &s in selector {
        if s > 0 {
            values.extend_from_slice(block.row((s - 1) as usize));
        } else {
            let c = constants[(s.unsigned_abs() - 1) as usize];
            values.extend(std::iter::repeat_n(c, npoint));
        }
    }
    CoordBlock::from_values(selector.len(), npoint, values)
}

impl Object for Mapping {
    fn class_name(&self) -> &'static str {
        class_of(&self.kind)
    }

    fn ident(&self) -> &str {
        &self.ident
    }

    fn set_ident(&mut self, ident: &str) {
        self.ident = ident.to_string();
    }

    fn to_repr(&self) -> ReprNode {
        let mut node = ReprNode::new(self.class_name());
        if !self.ident.is_empty() {
            node.push("Ident", ReprValue::Str(self.ident.clone()));
        }
        match &self.kind {
            MapKind::Unit { naxes } => node.push("Naxes", ReprValue::Int(*naxes as i64)),
            MapKind::Zoom { naxes, factor } => {
                node.push("Naxes", ReprValue::Int(*naxes as i64));
                node.push("Zoom", ReprValue::Float(*factor));
            }
            MapKind::Shift { offsets } => {
                node.push("Shift", ReprValue::FloatList(offsets.clone()));
            }
            MapKind::Perm {
                inperm,
                outperm,
                constants,
            } => {
                node.push(
                    "In",
                    ReprValue::IntList(inperm.iter().map(|&v| v as i64).collect()),
                );
                node.push(
                    "Out",
                    ReprValue::IntList(outperm.iter().map(|&v| v as i64).collect()),
                );
                if !constants.is_empty() {
                    node.push("Constants", ReprValue::FloatList(constants.clone()));
                }
            }
            MapKind::Series { maps } => {
                node.push("Nmap", ReprValue::Int(maps.len() as i64));
                for map in maps {
                    node.push("Map", ReprValue::Node(map.to_repr()));
                }
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

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}->{})", self.class_name(), self.n_in(), self.n_out())
    }
}
