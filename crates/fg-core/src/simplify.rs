//! Algebraic simplification of mappings.
//!
//! A small rewrite engine over the closed kind set. Rules run to fixpoint on
//! the flattened pipeline:
//!
//! - elements that are identities in disguise (unit zoom, zero shift,
//!   identity permutation) collapse to `UnitMap`;
//! - adjacent same-kind pairs merge (zoom factors multiply, shift offsets
//!   add, permutations compose when every traced entry stays expressible);
//! - `UnitMap` elements drop out of a multi-element pipeline;
//! - an empty pipeline becomes a `UnitMap`, a singleton becomes its element.
//!
//! Inverse-pair cancellation falls out of the merge rules: `M` followed by
//! `M.inverse()` merges into an identity, which then collapses and drops.

use crate::mapping::{EPSILON, MapKind, Mapping};

pub(crate) fn simplify_mapping(m: &Mapping) -> Mapping {
    match m.kind() {
        MapKind::Series { .. } => simplify_series(m),
        _ => {
            if is_identity(m) {
                unit(m.n_in())
            } else {
                m.clone()
            }
        }
    }
}

fn unit(naxes: usize) -> Mapping {
    Mapping::from_kind(MapKind::Unit { naxes }, String::new())
}

fn is_unit(m: &Mapping) -> bool {
    matches!(m.kind(), MapKind::Unit { .. })
}

fn is_identity(m: &Mapping) -> bool {
    match m.kind() {
        MapKind::Unit { .. } => true,
        MapKind::Zoom { factor, .. } => (factor - 1.0).abs() < EPSILON,
        MapKind::Shift { offsets } => offsets.iter().all(|o| o.abs() < EPSILON),
        MapKind::Perm {
            inperm,
            outperm,
            constants: _,
        } => {
            inperm.len() == outperm.len()
                && outperm.iter().enumerate().all(|(i, &s)| s == (i + 1) as i32)
                && inperm.iter().enumerate().all(|(i, &s)| s == (i + 1) as i32)
        }
        MapKind::Series { .. } => false,
    }
}

fn simplify_series(m: &Mapping) -> Mapping {
    let nin = m.n_in();

    // Simplify children first; a simplified child may itself be a series.
    let mut parts: Vec<Mapping> = Vec::new();
    for child in m.pipeline_parts() {
        parts.extend(simplify_mapping(&child).pipeline_parts());
    }

    loop {
        let mut changed = false;

        for part in parts.iter_mut() {
            if !is_unit(part) && is_identity(part) {
                *part = unit(part.n_in());
                changed = true;
            }
        }

        if parts.len() > 1 && parts.iter().any(is_unit) {
            parts.retain(|p| !is_unit(p));
            changed = true;
        }

        let mut i = 0;
        while i + 1 < parts.len() {
            if let Some(merged) = merge_pair(&parts[i], &parts[i + 1]) {
                parts[i] = merged;
                parts.remove(i + 1);
                changed = true;
                i = i.saturating_sub(1);
            } else {
                i += 1;
            }
        }

        if !changed {
            break;
        }
    }

    match parts.len() {
        0 => unit(nin),
        1 => parts.remove(0),
        _ => Mapping::from_kind(MapKind::Series { maps: parts }, String::new()),
    }
}

fn merge_pair(a: &Mapping, b: &Mapping) -> Option<Mapping> {
    match (a.kind(), b.kind()) {
        (MapKind::Zoom { naxes, factor: f1 }, MapKind::Zoom { factor: f2, .. }) => {
            let factor = f1 * f2;
            if factor == 0.0 {
                return None;
            }
            Some(Mapping::from_kind(
                MapKind::Zoom {
                    naxes: *naxes,
                    factor,
                },
                String::new(),
            ))
        }
        (MapKind::Shift { offsets: o1 }, MapKind::Shift { offsets: o2 }) => {
            let offsets = o1.iter().zip(o2).map(|(x, y)| x + y).collect();
            Some(Mapping::from_kind(MapKind::Shift { offsets }, String::new()))
        }
        (
            MapKind::Perm {
                inperm: in1,
                outperm: out1,
                constants: c1,
            },
            MapKind::Perm {
                inperm: in2,
                outperm: out2,
                constants: c2,
            },
        ) => compose_perms(in1, out1, c1, in2, out2, c2),
        _ => None,
    }
}

/// Compose two adjacent permutations into one, tracing each entry through the
/// pair. Returns None when a traced entry references a constant the source
/// map does not supply (a non-invertible direction that one merged table
/// could not express safely).
fn compose_perms(
    in1: &[i32],
    out1: &[i32],
    c1: &[f64],
    in2: &[i32],
    out2: &[i32],
    c2: &[f64],
) -> Option<Mapping> {
    let mut constants: Vec<f64> = Vec::new();
    let mut intern = |v: f64| -> i32 {
        constants.push(v);
        -(constants.len() as i32)
    };

    let fetch =
        |table: &[f64], s: i32| -> Option<f64> { table.get((s.unsigned_abs() - 1) as usize).copied() };

    // Forward: one entry per output axis of the second map.
    let mut outperm = Vec::with_capacity(out2.len());
    for &s2 in out2 {
        if s2 < 0 {
            outperm.push(intern(fetch(c2, s2)?));
        } else {
            let s1 = out1[(s2 - 1) as usize];
            if s1 < 0 {
                outperm.push(intern(fetch(c1, s1)?));
            } else {
                outperm.push(s1);
            }
        }
    }

    // Inverse: one entry per input axis of the first map.
    let mut inperm = Vec::with_capacity(in1.len());
    for &s1 in in1 {
        if s1 < 0 {
            inperm.push(intern(fetch(c1, s1)?));
        } else {
            let s2 = in2[(s1 - 1) as usize];
            if s2 < 0 {
                inperm.push(intern(fetch(c2, s2)?));
            } else {
                inperm.push(s2);
            }
        }
    }

    Some(Mapping::from_kind(
        MapKind::Perm {
            inperm,
            outperm,
            constants,
        },
        String::new(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    fn zoom(factor: f64) -> Mapping {
        Mapping::zoom(2, factor).unwrap()
    }

    fn shift(dx: f64, dy: f64) -> Mapping {
        Mapping::shift(&[dx, dy]).unwrap()
    }

    #[test]
    fn map_then_inverse_simplifies_to_unit() {
        let maps = [
            zoom(1.5),
            shift(0.5, -1.5),
            Mapping::axis_permutation(&[2, 1]).unwrap(),
            zoom(3.0).then(&shift(1.0, 2.0)).unwrap(),
        ];
        for map in &maps {
            for composed in [
                map.then(&map.inverse().unwrap()).unwrap(),
                map.inverse().unwrap().then(map).unwrap(),
            ] {
                let simplified = composed.simplify();
                assert_eq!(simplified.class_name(), "UnitMap", "for {map}");
                assert_eq!(simplified.n_in(), composed.n_in());
                assert_eq!(simplified.n_out(), composed.n_out());
            }
        }
    }

    #[test]
    fn unit_then_map_simplifies_to_map_class() {
        let map = zoom(1.5);
        let inv = map.inverse().unwrap();
        let unit2 = Mapping::unit(2).unwrap();
        for (first, second, reference) in [
            (&unit2, &map, &map),
            (&map, &unit2, &map),
            (&unit2, &inv, &inv),
            (&inv, &unit2, &inv),
        ] {
            let composed = first.then(second).unwrap();
            let simplified = composed.simplify();
            assert_eq!(simplified.class_name(), reference.simplify().class_name());
            assert_eq!(simplified.n_in(), composed.n_in());
            assert_eq!(simplified.n_out(), composed.n_out());
        }
    }

    #[test]
    fn simplify_is_association_independent() {
        let a = zoom(2.0);
        let b = shift(1.0, -1.0);
        let c = a.inverse().unwrap();
        let left = a.then(&b).unwrap().then(&c).unwrap().simplify();
        let right = a.then(&b.then(&c).unwrap()).unwrap().simplify();
        assert_eq!(left.class_name(), right.class_name());
        assert_eq!(left.n_in(), right.n_in());
        assert_eq!(left.n_out(), right.n_out());
    }

    #[test]
    fn adjacent_zooms_merge() {
        let composed = zoom(2.0).then(&zoom(3.0)).unwrap();
        let simplified = composed.simplify();
        assert_eq!(simplified.class_name(), "ZoomMap");
        let out = simplified.apply_forward_point(&[1.0, 1.0]).unwrap();
        assert_eq!(out, vec![6.0, 6.0]);
    }

    #[test]
    fn adjacent_shifts_merge() {
        let composed = shift(1.0, 2.0).then(&shift(0.5, -2.0)).unwrap();
        let simplified = composed.simplify();
        assert_eq!(simplified.class_name(), "ShiftMap");
        let out = simplified.apply_forward_point(&[0.0, 0.0]).unwrap();
        assert_eq!(out, vec![1.5, 0.0]);
    }

    #[test]
    fn permutations_compose_through_constants() {
        let drop = Mapping::perm(&[1, 2, -1], &[1, 2], &[0.5]).unwrap();
        let swap = Mapping::axis_permutation(&[2, 1]).unwrap();
        let simplified = drop.then(&swap).unwrap().simplify();
        assert_eq!(simplified.class_name(), "PermMap");

        let fwd = simplified.apply_forward_point(&[1.0, 2.0, 0.5]).unwrap();
        assert_eq!(fwd, vec![2.0, 1.0]);
        let inv = simplified.apply_inverse_point(&[2.0, 1.0]).unwrap();
        assert_eq!(inv, vec![1.0, 2.0, 0.5]);
    }

    #[test]
    fn non_invertible_perm_pair_is_left_unmerged() {
        let a = Mapping::perm(&[1, 2, -5], &[1, 2], &[]).unwrap();
        let b = Mapping::axis_permutation(&[2, 1]).unwrap();
        let composed = a.then(&b).unwrap();
        let simplified = composed.simplify();
        // still behaviorally correct in the forward direction
        let out = simplified.apply_forward_point(&[1.0, 2.0, 9.0]).unwrap();
        assert_eq!(out, vec![2.0, 1.0]);
    }

    #[test]
    fn zoom_drifted_to_unity_collapses() {
        // 1.5 * (1 / 1.5) leaves floating-point residue; the identity check
        // must absorb it
        let map = zoom(1.5);
        let simplified = map.then(&map.inverse().unwrap()).unwrap().simplify();
        assert_eq!(simplified.class_name(), "UnitMap");
    }

    #[test]
    fn leaf_simplify_is_a_copy() {
        let mut map = zoom(1.5);
        map.set_ident("zoomMap");
        let simplified = map.simplify();
        assert_eq!(simplified.class_name(), "ZoomMap");
        assert_eq!(simplified.ident(), "zoomMap");
        assert!(!simplified.same(&map));
    }

    #[test]
    fn unit_pipeline_collapses_to_unit() {
        let unit2 = Mapping::unit(2).unwrap();
        let composed = unit2.then(&unit2).unwrap().then(&unit2).unwrap();
        let simplified = composed.simplify();
        assert_eq!(simplified.class_name(), "UnitMap");
        assert_eq!(simplified.n_in(), 2);
    }
}
