//! Coordinate batches.
//!
//! A [`CoordBlock`] is a rectangular batch of points stored axis-major: one
//! row per axis, one column per point. The vector form (a single flattened
//! point) is a one-column block; transform output mirrors whichever form the
//! input used.

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct CoordBlock {
    naxes: usize,
    npoint: usize,
    values: Vec<f64>,
}

impl CoordBlock {
    /// Build from matrix form: one row per axis, all rows the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidArgument("coordinate block has no axes".into()));
        }
        let npoint = rows[0].len();
        for row in rows {
            if row.len() != npoint {
                return Err(Error::InvalidArgument(format!(
                    "ragged coordinate block: row lengths {npoint} and {}",
                    row.len()
                )));
            }
        }
        let mut values = Vec::with_capacity(rows.len() * npoint);
        for row in rows {
            values.extend_from_slice(row);
        }
        Ok(Self {
            naxes: rows.len(),
            npoint,
            values,
        })
    }

    /// Build from vector form: a single point with one value per axis.
    pub fn from_point(point: &[f64]) -> Result<Self> {
        if point.is_empty() {
            return Err(Error::InvalidArgument("empty point".into()));
        }
        Ok(Self {
            naxes: point.len(),
            npoint: 1,
            values: point.to_vec(),
        })
    }

    pub(crate) fn from_values(naxes: usize, npoint: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), naxes * npoint);
        Self {
            naxes,
            npoint,
            values,
        }
    }

    pub fn naxes(&self) -> usize {
        self.naxes
    }

    pub fn npoint(&self) -> usize {
        self.npoint
    }

    /// All values of one axis (0-based), across every point.
    pub fn row(&self, axis: usize) -> &[f64] {
        &self.values[axis * self.npoint..(axis + 1) * self.npoint]
    }

    pub fn value(&self, axis: usize, point: usize) -> f64 {
        self.values[axis * self.npoint + point]
    }

    /// One point (0-based) as a vector with one value per axis.
    pub fn point(&self, point: usize) -> Vec<f64> {
        (0..self.naxes).map(|axis| self.value(axis, point)).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.naxes).map(|axis| self.row(axis).to_vec()).collect()
    }

    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }
}
