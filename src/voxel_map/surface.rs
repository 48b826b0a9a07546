use bitvec::vec::BitVec;

use crate::voxel_map::error::GridError;
use crate::voxel_map::grid::GridModel;
use crate::voxel_map::state::VoxelState;

/// Number of filled face neighbours of the voxel at linear index `idx`.
/// Neighbours outside the grid count as open space.
pub fn filled_face_neighbors(states: &[VoxelState], dims: (usize, usize, usize), idx: usize) -> usize {
	let (nz, ny, nx) = dims;
	let stride_j = nx;
	let stride_i = nx * ny;
	let k = idx % nx;
	let j = (idx / nx) % ny;
	let i = idx / stride_i;

	let neighbors = [
		(k > 0).then(|| idx - 1),
		(k + 1 < nx).then(|| idx + 1),
		(j > 0).then(|| idx - stride_j),
		(j + 1 < ny).then(|| idx + stride_j),
		(i > 0).then(|| idx - stride_i),
		(i + 1 < nz).then(|| idx + stride_i),
	];
	neighbors
		.iter()
		.flatten()
		.filter(|&&n| states[n].is_filled())
		.count()
}

/// Mark every open voxel that shares a face with the solid. This is the shell
/// where escaping secondary electrons are collected.
pub fn derive_surface_mask(states: &[VoxelState], dims: (usize, usize, usize)) -> BitVec {
	let mut mask = BitVec::repeat(false, states.len());
	for (idx, state) in states.iter().enumerate() {
		if state.is_filled() {
			continue;
		}
		if filled_face_neighbors(states, dims, idx) > 0 {
			mask.set(idx, true);
		}
	}
	mask
}

impl GridModel {
	/// Build a grid whose surface mask is derived from the solid's open face neighbours.
	pub fn from_states(
		dims: (usize, usize, usize),
		cell_dim: f64,
		state: Vec<VoxelState>,
	) -> Result<Self, GridError> {
		let (nz, ny, nx) = dims;
		if state.len() != nz * ny * nx {
			return Err(GridError::DimensionMismatch {
				nz,
				ny,
				nx,
				expected: nz * ny * nx,
				actual: state.len(),
			});
		}
		let mask = derive_surface_mask(&state, dims);
		Self::new(dims, cell_dim, state, mask)
	}
}
