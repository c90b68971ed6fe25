//! Von Neumann neighbour lookup for grid stencils.
//!
//! Grid behaviors use zero-flux boundaries: cells on an edge simply have
//! fewer neighbours. On a 2D grid this yields the five-point stencil with
//! 4 neighbours in the interior, 3 on an edge, and 2 in a corner.

use murmur_core::grid::MAX_GRID_AXES;
use murmur_core::GridGeometry;
use smallvec::SmallVec;

/// Linear indices of the axis-aligned neighbours of `index`, without wrap.
///
/// Neighbours are listed axis by axis, lower before upper.
pub fn von_neumann(geometry: &GridGeometry, index: usize) -> SmallVec<[usize; 2 * MAX_GRID_AXES]> {
    let coords = geometry.cell_coords(index);
    let mut result = SmallVec::new();
    let mut stride = 1;
    for (axis, &n) in geometry.subdivisions().iter().enumerate() {
        let c = coords[axis];
        if c > 0 {
            result.push(index - stride);
        }
        if c + 1 < n {
            result.push(index + stride);
        }
        stride *= n;
    }
    result
}
