//! Dense 2-D prediction rasters.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use crate::error::RasterError;

/// Row-major 2-D array of finite prediction values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Raster {
    /// Creates a raster from row-major values.
    ///
    /// # Errors
    ///
    /// - [`RasterError::Empty`] if either dimension is zero
    /// - [`RasterError::DimensionMismatch`] if `data.len() != rows * cols`
    /// - [`RasterError::NonFinite`] if any value is NaN or infinite
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, RasterError> {
        if rows == 0 || cols == 0 {
            return Err(RasterError::Empty);
        }
        let expected = rows * cols;
        if data.len() != expected {
            return Err(RasterError::DimensionMismatch {
                rows,
                cols,
                expected,
                actual: data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(RasterError::NonFinite);
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a raster from a slice of equal-length rows.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_verdict::confidence::Raster;
    ///
    /// let r = Raster::from_rows(&[vec![0.0, 1.0], vec![0.5, 0.5]]).unwrap();
    /// assert_eq!((r.rows(), r.cols()), (2, 2));
    /// assert_eq!(r.get(1, 0), 0.5);
    /// ```
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, RasterError> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(RasterError::RaggedRows);
        }
        let data = rows.iter().flatten().copied().collect();
        Self::new(rows.len(), cols, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`: construction rejects empty rasters.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Value at (`row`, `col`).
    ///
    /// # Panics
    ///
    /// Panics if the position is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "raster index out of bounds");
        self.data[row * self.cols + col]
    }

    /// Returns the raster with values in [0, 1].
    ///
    /// Rasters already inside [0, 1] are borrowed unchanged. Otherwise
    /// values are min-max rescaled; a constant raster outside the range
    /// maps to all zeros.
    pub fn unit_scaled(&self) -> Cow<'_, Raster> {
        let (lo, hi) = self
            .data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if lo >= 0.0 && hi <= 1.0 {
            return Cow::Borrowed(self);
        }
        let range = hi - lo;
        let data = if range > 0.0 {
            self.data.iter().map(|v| (v - lo) / range).collect()
        } else {
            vec![0.0; self.data.len()]
        };
        Cow::Owned(Raster {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// `true` when every value is identical.
    pub fn is_constant(&self) -> bool {
        let first = self.data[0];
        self.data.iter().all(|&v| v == first)
    }

    /// Population variance of all values.
    pub fn variance(&self) -> f64 {
        stats::population_variance(&self.data).unwrap_or(0.0)
    }

    /// Population variance of the 3x3 window centred on each pixel,
    /// clipped at the borders. Row-major, same shape as the raster.
    pub fn local_variance(&self) -> Vec<f64> {
        self.map_windows(|w| stats::population_variance(w).unwrap_or(0.0))
    }

    /// Mean of the 3x3 window centred on each pixel, clipped at the borders.
    pub fn local_mean(&self) -> Vec<f64> {
        self.map_windows(|w| stats::mean(w).unwrap_or(0.0))
    }

    fn map_windows(&self, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.data.len());
        let mut window = Vec::with_capacity(9);
        for r in 0..self.rows {
            let r0 = r.saturating_sub(1);
            let r1 = (r + 1).min(self.rows - 1);
            for c in 0..self.cols {
                let c0 = c.saturating_sub(1);
                let c1 = (c + 1).min(self.cols - 1);
                window.clear();
                for rr in r0..=r1 {
                    window.extend_from_slice(&self.data[rr * self.cols + c0..=rr * self.cols + c1]);
                }
                out.push(f(&window));
            }
        }
        out
    }

    /// Gradient magnitude √(gx² + gy²) per pixel.
    ///
    /// Central differences in the interior and one-sided differences at the
    /// borders. A dimension of length 1 contributes no gradient.
    pub fn gradient_magnitude(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.data.len());
        for r in 0..self.rows {
            for c in 0..self.cols {
                let gx = self.difference(r, c, Axis::Col);
                let gy = self.difference(r, c, Axis::Row);
                out.push((gx * gx + gy * gy).sqrt());
            }
        }
        out
    }

    fn difference(&self, r: usize, c: usize, axis: Axis) -> f64 {
        let (pos, len) = match axis {
            Axis::Row => (r, self.rows),
            Axis::Col => (c, self.cols),
        };
        if len < 2 {
            return 0.0;
        }
        let lo = pos.saturating_sub(1);
        let hi = (pos + 1).min(len - 1);
        let (a, b) = match axis {
            Axis::Row => (self.get(lo, c), self.get(hi, c)),
            Axis::Col => (self.get(r, lo), self.get(r, hi)),
        };
        (b - a) / (hi - lo) as f64
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Row,
    Col,
}

// ----------------------------------------------------------------------------
// Sources
// ----------------------------------------------------------------------------

/// Something that may yield a raster for scoring.
///
/// Batch scoring calls [`load`](RasterSource::load) once per record; an
/// `Err` marks that record unavailable without stopping the batch.
pub trait RasterSource {
    fn load(&self) -> Result<Cow<'_, Raster>, RasterError>;
}

impl RasterSource for Raster {
    fn load(&self) -> Result<Cow<'_, Raster>, RasterError> {
        Ok(Cow::Borrowed(self))
    }
}

impl RasterSource for Option<Raster> {
    fn load(&self) -> Result<Cow<'_, Raster>, RasterError> {
        self.as_ref()
            .map(Cow::Borrowed)
            .ok_or_else(|| RasterError::Unavailable("no raster supplied".to_string()))
    }
}

impl RasterSource for Result<Raster, RasterError> {
    fn load(&self) -> Result<Cow<'_, Raster>, RasterError> {
        self.as_ref().map(Cow::Borrowed).map_err(Clone::clone)
    }
}

impl RasterSource for Vec<Vec<f64>> {
    fn load(&self) -> Result<Cow<'_, Raster>, RasterError> {
        Raster::from_rows(self).map(Cow::Owned)
    }
}
