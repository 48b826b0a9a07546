use bitvec::vec::BitVec;
use glam::DVec3;

use crate::voxel_map::error::GridError;
use crate::voxel_map::state::VoxelState;

/// Signed voxel index triple: `i` runs along z, `j` along y, `k` along x.
///
/// Signed so that a step off the edge of the grid is representable and can be
/// rejected by [`GridModel::contains_voxel`] before any lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Voxel {
	pub i: isize,
	pub j: isize,
	pub k: isize,
}

impl Voxel {
	#[inline]
	pub const fn new(i: isize, j: isize, k: isize) -> Self {
		Self { i, j, k }
	}
}

/// Immutable voxelized solid: material states, surface mask and placement in world space.
#[derive(Clone, Debug)]
pub struct GridModel {
	pub nz: usize,  // Number of voxels along z (index i)
	pub ny: usize,  // Number of voxels along y (index j)
	pub nx: usize,  // Number of voxels along x (index k)
	pub total_voxels: usize,
	pub cell_dim: f64,  // Edge length of a voxel, nm
	pub origin: DVec3,  // World position of the corner of voxel (0, 0, 0)
	pub beam_offset: (f64, f64),  // Lateral beam position, carried for callers
	state: Vec<VoxelState>,
	surface: BitVec,
}

impl GridModel {
	/// Build a grid from a state array and a same-shaped surface mask, both laid out
	/// x-fastest (`k + nx * (j + ny * i)`). The origin defaults to zero.
	pub fn new(
		dims: (usize, usize, usize),
		cell_dim: f64,
		state: Vec<VoxelState>,
		surface: BitVec,
	) -> Result<Self, GridError> {
		let (nz, ny, nx) = dims;
		if nz == 0 || ny == 0 || nx == 0 {
			return Err(GridError::EmptyDimension { nz, ny, nx });
		}
		if !(cell_dim > 0.0) || !cell_dim.is_finite() {
			return Err(GridError::NonPositiveCellSize(cell_dim));
		}
		if state.len() != surface.len() {
			return Err(GridError::ShapeMismatch { state: state.len(), surface: surface.len() });
		}
		let total_voxels = nz * ny * nx;
		if state.len() != total_voxels {
			return Err(GridError::DimensionMismatch {
				nz,
				ny,
				nx,
				expected: total_voxels,
				actual: state.len(),
			});
		}

		Ok(Self {
			nz,
			ny,
			nx,
			total_voxels,
			cell_dim,
			origin: DVec3::ZERO,
			beam_offset: (0.0, 0.0),
			state,
			surface,
		})
	}

	/// Build a grid from raw material codes and a boolean mask.
	pub fn from_codes(
		dims: (usize, usize, usize),
		cell_dim: f64,
		codes: &[i8],
		surface: &[bool],
	) -> Result<Self, GridError> {
		let state = codes
			.iter()
			.map(|&code| VoxelState::from_code(code))
			.collect::<Result<Vec<_>, _>>()?;
		let mask: BitVec = surface.iter().copied().collect();
		Self::new(dims, cell_dim, state, mask)
	}

	pub fn with_origin(mut self, origin: DVec3) -> Self {
		self.origin = origin;
		self
	}

	pub fn with_beam_offset(mut self, x: f64, y: f64) -> Self {
		self.beam_offset = (x, y);
		self
	}

	/// Voxel containing a world point: `floor((coord - origin) / cell_dim)` per axis.
	/// The result may lie outside the grid.
	#[inline]
	pub fn locate(&self, p: DVec3) -> Voxel {
		let rel = (p - self.origin) / self.cell_dim;
		Voxel::new(rel.z.floor() as isize, rel.y.floor() as isize, rel.x.floor() as isize)
	}

	/// World position of the low corner of a voxel.
	#[inline]
	pub fn voxel_corner(&self, v: Voxel) -> DVec3 {
		self.origin + DVec3::new(v.k as f64, v.j as f64, v.i as f64) * self.cell_dim
	}

	#[inline]
	pub fn contains_voxel(&self, v: Voxel) -> bool {
		v.i >= 0
			&& v.j >= 0
			&& v.k >= 0
			&& (v.i as usize) < self.nz
			&& (v.j as usize) < self.ny
			&& (v.k as usize) < self.nx
	}

	/// Whether a world point lies inside the grid's extent.
	pub fn contains(&self, p: DVec3) -> bool {
		self.contains_voxel(self.locate(p))
	}

	/// Linear index of an in-grid voxel, or `OutOfBounds`.
	#[inline]
	pub fn index_of(&self, v: Voxel) -> Result<usize, GridError> {
		if self.contains_voxel(v) {
			Ok(self.ijk_to_index(v.i as usize, v.j as usize, v.k as usize))
		} else {
			Err(GridError::OutOfBounds(v))
		}
	}

	pub fn state_at(&self, v: Voxel) -> Result<VoxelState, GridError> {
		self.index_of(v).map(|idx| self.state[idx])
	}

	pub fn is_surface(&self, v: Voxel) -> Result<bool, GridError> {
		self.index_of(v).map(|idx| self.surface[idx])
	}

	pub fn states(&self) -> &[VoxelState] {
		&self.state
	}

	pub fn surface_mask(&self) -> &BitVec {
		&self.surface
	}

	/// World z of the top face of the highest filled voxel in the column under `(x, y)`.
	/// `None` when the column is outside the grid or holds no solid.
	pub fn first_solid_z(&self, x: f64, y: f64) -> Option<f64> {
		let probe = self.locate(DVec3::new(x, y, self.origin.z));
		if !self.contains_voxel(Voxel::new(0, probe.j, probe.k)) {
			return None;
		}
		(0..self.nz)
			.rev()
			.find(|&i| self.state[self.ijk_to_index(i, probe.j as usize, probe.k as usize)].is_filled())
			.map(|i| self.origin.z + (i + 1) as f64 * self.cell_dim)
	}
}
