//! Regular-grid geometry for environment parameters.
//!
//! A [`GridGeometry`] describes a box `[min_pos, max_pos]` subdivided into
//! `subdivisions[axis]` equal cells per axis, each cell holding a vector of
//! `value_dim` floats. Cells are stored in linear order with axis 0
//! varying fastest.

use crate::error::ConfigError;
use smallvec::SmallVec;

/// Largest number of spatial axes a grid may have.
pub const MAX_GRID_AXES: usize = 3;

/// Shape and world-space bounds of a regular vector grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GridGeometry {
    value_dim: usize,
    subdivisions: SmallVec<[usize; MAX_GRID_AXES]>,
    min_pos: SmallVec<[f32; MAX_GRID_AXES]>,
    max_pos: SmallVec<[f32; MAX_GRID_AXES]>,
}

impl GridGeometry {
    /// Construct a grid geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGrid`] if `value_dim` is zero, the axis
    /// count is outside `1..=3`, the three slices disagree in length, any
    /// subdivision count is zero, or any `min >= max`.
    pub fn new(
        value_dim: usize,
        subdivisions: &[usize],
        min_pos: &[f32],
        max_pos: &[f32],
    ) -> Result<Self, ConfigError> {
        let invalid = |reason: String| Err(ConfigError::InvalidGrid { reason });
        if value_dim == 0 {
            return invalid("value_dim must be at least 1".into());
        }
        let ndim = subdivisions.len();
        if ndim == 0 || ndim > MAX_GRID_AXES {
            return invalid(format!(
                "grid must have 1..={MAX_GRID_AXES} axes, got {ndim}"
            ));
        }
        if min_pos.len() != ndim || max_pos.len() != ndim {
            return invalid(format!(
                "bounds have {} and {} components for {ndim} axes",
                min_pos.len(),
                max_pos.len()
            ));
        }
        if let Some(axis) = subdivisions.iter().position(|&n| n == 0) {
            return invalid(format!("axis {axis} has zero subdivisions"));
        }
        for axis in 0..ndim {
            let (lo, hi) = (min_pos[axis], max_pos[axis]);
            if !lo.is_finite() || !hi.is_finite() || lo >= hi {
                return invalid(format!(
                    "axis {axis} bounds [{lo}, {hi}] must be finite with min < max"
                ));
            }
        }
        Ok(Self {
            value_dim,
            subdivisions: SmallVec::from_slice(subdivisions),
            min_pos: SmallVec::from_slice(min_pos),
            max_pos: SmallVec::from_slice(max_pos),
        })
    }

    /// Number of floats per cell.
    pub fn value_dim(&self) -> usize {
        self.value_dim
    }

    /// Number of spatial axes.
    pub fn ndim(&self) -> usize {
        self.subdivisions.len()
    }

    /// Cells per axis.
    pub fn subdivisions(&self) -> &[usize] {
        &self.subdivisions
    }

    /// Lower world-space corner.
    pub fn min_pos(&self) -> &[f32] {
        &self.min_pos
    }

    /// Upper world-space corner.
    pub fn max_pos(&self) -> &[f32] {
        &self.max_pos
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.subdivisions.iter().product()
    }

    /// Total number of floats backing one buffer of the grid.
    pub fn storage_len(&self) -> usize {
        self.cell_count() * self.value_dim
    }

    /// World-space extent of one cell along `axis`.
    pub fn cell_size(&self, axis: usize) -> f32 {
        (self.max_pos[axis] - self.min_pos[axis]) / self.subdivisions[axis] as f32
    }

    /// Midpoint of the grid's bounds.
    pub fn center(&self) -> SmallVec<[f32; MAX_GRID_AXES]> {
        self.min_pos
            .iter()
            .zip(&self.max_pos)
            .map(|(lo, hi)| 0.5 * (lo + hi))
            .collect()
    }

    /// Linear cell index of integer cell coordinates, or `None` if out of range.
    pub fn linear_index(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.ndim() {
            return None;
        }
        let mut index = 0;
        let mut stride = 1;
        for (axis, &c) in coords.iter().enumerate() {
            let n = self.subdivisions[axis];
            if c >= n {
                return None;
            }
            index += c * stride;
            stride *= n;
        }
        Some(index)
    }

    /// Integer cell coordinates of a linear cell index.
    pub fn cell_coords(&self, mut index: usize) -> SmallVec<[usize; MAX_GRID_AXES]> {
        let mut coords = SmallVec::new();
        for &n in &self.subdivisions {
            coords.push(index % n);
            index /= n;
        }
        coords
    }

    /// World-space center of a cell.
    pub fn cell_center(&self, index: usize) -> SmallVec<[f32; MAX_GRID_AXES]> {
        self.cell_coords(index)
            .iter()
            .enumerate()
            .map(|(axis, &c)| self.min_pos[axis] + (c as f32 + 0.5) * self.cell_size(axis))
            .collect()
    }

    /// Linear index of the cell containing `pos`, or `None` outside the bounds.
    ///
    /// The upper bound is inclusive so that `max_pos` maps to the last cell.
    pub fn cell_at(&self, pos: &[f32]) -> Option<usize> {
        if pos.len() != self.ndim() {
            return None;
        }
        let mut coords: SmallVec<[usize; MAX_GRID_AXES]> = SmallVec::new();
        for (axis, &p) in pos.iter().enumerate() {
            if !(p >= self.min_pos[axis] && p <= self.max_pos[axis]) {
                return None;
            }
            let n = self.subdivisions[axis];
            let c = ((p - self.min_pos[axis]) / self.cell_size(axis)) as usize;
            coords.push(c.min(n - 1));
        }
        self.linear_index(&coords)
    }

    /// Whether `pos` lies inside the grid's bounds (inclusive).
    pub fn contains(&self, pos: &[f32]) -> bool {
        pos.len() == self.ndim()
            && pos
                .iter()
                .zip(self.min_pos.iter().zip(&self.max_pos))
                .all(|(p, (lo, hi))| *p >= *lo && *p <= *hi)
    }

    /// Whether two grids can be combined cell-by-cell: same value dimension,
    /// subdivisions, and bounds.
    pub fn same_shape(&self, other: &Self) -> bool {
        self == other
    }
}
