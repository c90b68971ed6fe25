//! Sampling and localized writes on grid parameter buffers.
//!
//! All functions take the grid's [`GridGeometry`] and a flat buffer of
//! `cell_count * value_dim` floats laid out as the geometry describes.
//! Positions outside the grid's bounds are a no-op (`false` return), never
//! an error.

use murmur_core::grid::MAX_GRID_AXES;
use murmur_core::GridGeometry;
use smallvec::SmallVec;

/// How a write combines with the existing cell value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOp {
    /// Overwrite the cell.
    Set,
    /// Accumulate into the cell.
    Add,
}

/// Where a positional write or sample lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// The single cell containing the position.
    Nearest,
    /// The surrounding cell centers, multilinearly weighted.
    Linear,
}

/// `(cell, weight)` pairs of a multilinear stencil.
pub type Weights = SmallVec<[(usize, f32); 8]>;

/// Value slice of one cell.
pub fn cell<'a>(geometry: &GridGeometry, data: &'a [f32], index: usize) -> &'a [f32] {
    let d = geometry.value_dim();
    &data[index * d..(index + 1) * d]
}

/// Value slice of one cell, mutably.
pub fn cell_mut<'a>(geometry: &GridGeometry, data: &'a mut [f32], index: usize) -> &'a mut [f32] {
    let d = geometry.value_dim();
    &mut data[index * d..(index + 1) * d]
}

/// Multilinear weights over cell centers surrounding `pos`.
///
/// Positions between the outermost cell centers and the grid boundary are
/// clamped onto the outermost centers. Returns `None` outside the bounds.
pub fn linear_weights(geometry: &GridGeometry, pos: &[f32]) -> Option<Weights> {
    if !geometry.contains(pos) {
        return None;
    }
    let ndim = geometry.ndim();
    let mut base: SmallVec<[usize; MAX_GRID_AXES]> = SmallVec::new();
    let mut frac: SmallVec<[f32; MAX_GRID_AXES]> = SmallVec::new();
    for (axis, &p) in pos.iter().enumerate() {
        let n = geometry.subdivisions()[axis];
        let u = ((p - geometry.min_pos()[axis]) / geometry.cell_size(axis) - 0.5)
            .clamp(0.0, (n - 1) as f32);
        let i0 = (u.floor() as usize).min(n.saturating_sub(2));
        base.push(i0);
        frac.push(if n > 1 { u - i0 as f32 } else { 0.0 });
    }

    let mut weights = Weights::new();
    for corner in 0..(1usize << ndim) {
        let mut w = 1.0;
        let mut coords: SmallVec<[usize; MAX_GRID_AXES]> = SmallVec::new();
        for axis in 0..ndim {
            let upper = corner & (1 << axis) != 0;
            if upper && geometry.subdivisions()[axis] == 1 {
                w = 0.0;
                break;
            }
            w *= if upper { frac[axis] } else { 1.0 - frac[axis] };
            coords.push(base[axis] + usize::from(upper));
        }
        if w > 0.0 {
            if let Some(index) = geometry.linear_index(&coords) {
                weights.push((index, w));
            }
        }
    }
    Some(weights)
}

/// Sample the field at `pos` into `out`.
///
/// Returns `false` (leaving `out` untouched) outside the grid.
pub fn sample(
    geometry: &GridGeometry,
    data: &[f32],
    pos: &[f32],
    placement: Placement,
    out: &mut [f32],
) -> bool {
    match placement {
        Placement::Nearest => match geometry.cell_at(pos) {
            Some(index) => {
                out.copy_from_slice(cell(geometry, data, index));
                true
            }
            None => false,
        },
        Placement::Linear => match linear_weights(geometry, pos) {
            Some(weights) => {
                out.iter_mut().for_each(|v| *v = 0.0);
                for (index, w) in weights {
                    for (o, v) in out.iter_mut().zip(cell(geometry, data, index)) {
                        *o += w * v;
                    }
                }
                true
            }
            None => false,
        },
    }
}

/// Spatial gradient of one value component at the cell containing `pos`,
/// by central differences (one-sided at the grid edges).
///
/// `out` has one entry per spatial axis. Returns `false` outside the grid.
pub fn gradient(
    geometry: &GridGeometry,
    data: &[f32],
    pos: &[f32],
    component: usize,
    out: &mut [f32],
) -> bool {
    let Some(index) = geometry.cell_at(pos) else {
        return false;
    };
    let coords = geometry.cell_coords(index);
    let d = geometry.value_dim();
    for axis in 0..geometry.ndim() {
        let n = geometry.subdivisions()[axis];
        let c = coords[axis];
        let lo = c.saturating_sub(1);
        let hi = (c + 1).min(n - 1);
        if lo == hi {
            out[axis] = 0.0;
            continue;
        }
        let mut at = coords.clone();
        at[axis] = lo;
        let lo_index = geometry.linear_index(&at).unwrap_or(index);
        at[axis] = hi;
        let hi_index = geometry.linear_index(&at).unwrap_or(index);
        let span = (hi - lo) as f32 * geometry.cell_size(axis);
        out[axis] = (data[hi_index * d + component] - data[lo_index * d + component]) / span;
    }
    true
}

/// Write `value` into the field at `pos`.
///
/// With [`Placement::Linear`], the value is distributed over the
/// surrounding cells by multilinear weight (for [`WriteOp::Set`] each
/// touched cell is overwritten with its weighted share). Returns `false`
/// outside the grid.
pub fn write(
    geometry: &GridGeometry,
    data: &mut [f32],
    pos: &[f32],
    value: &[f32],
    op: WriteOp,
    placement: Placement,
) -> bool {
    let weights: Weights = match placement {
        Placement::Nearest => match geometry.cell_at(pos) {
            Some(index) => smallvec::smallvec![(index, 1.0)],
            None => return false,
        },
        Placement::Linear => match linear_weights(geometry, pos) {
            Some(w) => w,
            None => return false,
        },
    };
    for (index, w) in weights {
        let target = cell_mut(geometry, data, index);
        for (t, v) in target.iter_mut().zip(value) {
            match op {
                WriteOp::Set => *t = w * v,
                WriteOp::Add => *t += w * v,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> GridGeometry {
        GridGeometry::new(1, &[4], &[0.0], &[4.0]).unwrap()
    }

    fn plane() -> GridGeometry {
        GridGeometry::new(1, &[2, 2], &[0.0, 0.0], &[2.0, 2.0]).unwrap()
    }

    #[test]
    fn nearest_sample_reads_containing_cell() {
        let g = line();
        let data = [10.0, 20.0, 30.0, 40.0];
        let mut out = [0.0];
        assert!(sample(&g, &data, &[2.2], Placement::Nearest, &mut out));
        assert_eq!(out, [30.0]);
        assert!(!sample(&g, &data, &[5.0], Placement::Nearest, &mut out));
        assert_eq!(out, [30.0]);
    }

    #[test]
    fn linear_sample_interpolates_between_centers() {
        let g = line();
        let data = [10.0, 20.0, 30.0, 40.0];
        let mut out = [0.0];
        // Halfway between centers 1.5 and 2.5.
        assert!(sample(&g, &data, &[2.0], Placement::Linear, &mut out));
        assert!((out[0] - 25.0).abs() < 1e-5);
        // Clamped onto the outermost center.
        assert!(sample(&g, &data, &[0.1], Placement::Linear, &mut out));
        assert!((out[0] - 10.0).abs() < 1e-5);
    }

    #[test]
    fn linear_weights_sum_to_one() {
        let g = plane();
        let w = linear_weights(&g, &[0.8, 1.3]).unwrap();
        let total: f32 = w.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn single_cell_axis_has_one_corner() {
        let g = GridGeometry::new(1, &[1, 3], &[0.0, 0.0], &[1.0, 3.0]).unwrap();
        let w = linear_weights(&g, &[0.5, 1.0]).unwrap();
        let total: f32 = w.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(w.iter().all(|(i, _)| *i < 3));
    }

    #[test]
    fn nearest_add_accumulates() {
        let g = plane();
        let mut data = [0.0; 4];
        assert!(write(&g, &mut data, &[1.5, 0.5], &[2.0], WriteOp::Add, Placement::Nearest));
        assert!(write(&g, &mut data, &[1.5, 0.5], &[2.0], WriteOp::Add, Placement::Nearest));
        assert_eq!(data, [0.0, 4.0, 0.0, 0.0]);
        assert!(write(&g, &mut data, &[1.5, 0.5], &[1.0], WriteOp::Set, Placement::Nearest));
        assert_eq!(data[1], 1.0);
        assert!(!write(&g, &mut data, &[3.0, 0.5], &[1.0], WriteOp::Add, Placement::Nearest));
    }

    #[test]
    fn linear_add_conserves_total() {
        let g = plane();
        let mut data = [0.0; 4];
        assert!(write(&g, &mut data, &[1.0, 1.2], &[3.0], WriteOp::Add, Placement::Linear));
        let total: f32 = data.iter().sum();
        assert!((total - 3.0).abs() < 1e-5);
    }

    #[test]
    fn gradient_of_ramp() {
        let g = line();
        let data = [0.0, 1.0, 2.0, 3.0];
        let mut out = [0.0];
        assert!(gradient(&g, &data, &[1.5], 0, &mut out));
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!(gradient(&g, &data, &[0.2], 0, &mut out));
        assert!((out[0] - 1.0).abs() < 1e-6);
    }

    proptest::proptest! {
        #[test]
        fn splat_lands_inside_and_conserves(
            x in 0.0f32..2.0,
            y in 0.0f32..3.0,
            value in -5.0f32..5.0,
        ) {
            let g = GridGeometry::new(1, &[2, 3], &[0.0, 0.0], &[2.0, 3.0]).unwrap();
            let mut data = [0.0; 6];
            proptest::prop_assert!(write(&g, &mut data, &[x, y], &[value], WriteOp::Add, Placement::Linear));
            let total: f32 = data.iter().sum();
            proptest::prop_assert!((total - value).abs() < 1e-4);

            let mut out = [0.0];
            proptest::prop_assert!(sample(&g, &[1.0; 6], &[x, y], Placement::Linear, &mut out));
            proptest::prop_assert!((out[0] - 1.0).abs() < 1e-5);
        }
    }
}
