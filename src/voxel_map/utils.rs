use std::mem::size_of;

use bitvec::prelude::BitVec;

use crate::voxel_map::grid::{GridModel, Voxel};
use crate::voxel_map::state::VoxelState;

/// Format large numbers with KB, MB, GB suffixes
pub fn format_bytes(bytes: usize) -> String {
	const KB: usize = 1024;
	const MB: usize = KB * 1024;
	const GB: usize = MB * 1024;

	if bytes >= GB {
		format!("{:.2} GB", bytes as f64 / GB as f64)
	} else if bytes >= MB {
		format!("{:.2} MB", bytes as f64 / MB as f64)
	} else if bytes >= KB {
		format!("{:.2} KB", bytes as f64 / KB as f64)
	} else {
		format!("{} bytes", bytes)
	}
}

impl GridModel {
	/// Log the grid layout and the memory held by the state and surface arrays,
	/// plus what one worker's DE/flux accumulators will cost.
	pub fn report_memory(&self) {
		let state_bytes = self.states().len() * size_of::<VoxelState>();
		let mask_bytes = self.surface_mask().capacity() / 8;
		let field_bytes = 2 * self.total_voxels * size_of::<f64>();

		log::info!("Grid: {} x {} x {} (z, y, x), cell {:.3} nm", self.nz, self.ny, self.nx, self.cell_dim);
		log::info!("  Total voxels: {:e}", self.total_voxels as f64);
		log::info!("  Filled voxels: {}, surface voxels: {}", self.count_filled(), self.count_surface());
		log::info!("  State array: {}", format_bytes(state_bytes));
		log::info!("  Surface mask: {}", format_bytes(mask_bytes + size_of::<BitVec>()));
		log::info!("  Accumulators per worker: {}", format_bytes(field_bytes));
	}

	/// Convert (i, j, k) to a linear index, x fastest
	#[inline]
	pub fn ijk_to_index(&self, i: usize, j: usize, k: usize) -> usize {
		k + self.nx * (j + self.ny * i)
	}

	/// Convert a linear index back to (i, j, k)
	#[inline]
	pub fn index_to_ijk(&self, index: usize) -> (usize, usize, usize) {
		let plane = self.nx * self.ny;
		(index / plane, (index % plane) / self.nx, index % self.nx)
	}

	/// Any surface voxel within the cube of half-width `half_width` around `center`.
	/// The cube is clipped to the grid.
	pub fn surface_within(&self, center: Voxel, half_width: usize) -> bool {
		let hw = half_width as isize;
		let clip = |c: isize, len: usize| -> Option<(usize, usize)> {
			let lo = (c - hw).max(0);
			let hi = (c + hw).min(len as isize - 1);
			(lo <= hi).then_some((lo as usize, hi as usize))
		};
		let (Some((i0, i1)), Some((j0, j1)), Some((k0, k1))) =
			(clip(center.i, self.nz), clip(center.j, self.ny), clip(center.k, self.nx))
		else {
			return false;
		};

		let mask = self.surface_mask();
		for i in i0..=i1 {
			for j in j0..=j1 {
				let row = self.ijk_to_index(i, j, 0);
				if mask[row + k0..=row + k1].any() {
					return true;
				}
			}
		}
		false
	}

	/// Count the number of solid voxels
	pub fn count_filled(&self) -> usize {
		self.states().iter().filter(|s| s.is_filled()).count()
	}

	/// Count the number of voxels flagged in the surface mask
	pub fn count_surface(&self) -> usize {
		self.surface_mask().count_ones()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn grid_with_surface_at(dims: (usize, usize, usize), at: &[(usize, usize, usize)]) -> GridModel {
		let (nz, ny, nx) = dims;
		let total = nz * ny * nx;
		let mut mask = BitVec::repeat(false, total);
		for &(i, j, k) in at {
			mask.set(k + nx * (j + ny * i), true);
		}
		GridModel::new(dims, 1.0, vec![VoxelState::Substrate; total], mask).expect("valid grid")
	}

	#[test]
	fn index_conversions_are_inverse() {
		let grid = grid_with_surface_at((3, 4, 5), &[]);
		for idx in 0..grid.total_voxels {
			let (i, j, k) = grid.index_to_ijk(idx);
			assert_eq!(grid.ijk_to_index(i, j, k), idx);
		}
		assert_eq!(grid.ijk_to_index(0, 0, 1), 1);
		assert_eq!(grid.ijk_to_index(0, 1, 0), 5);
		assert_eq!(grid.ijk_to_index(1, 0, 0), 20);
	}

	#[test]
	fn neighbourhood_search_respects_half_width() {
		let grid = grid_with_surface_at((9, 9, 9), &[(8, 4, 4)]);
		assert!(grid.surface_within(Voxel::new(6, 4, 4), 2));
		assert!(!grid.surface_within(Voxel::new(5, 4, 4), 2));
		assert!(grid.surface_within(Voxel::new(8, 4, 4), 0));
		assert!(!grid.surface_within(Voxel::new(8, 4, 3), 0));
	}

	#[test]
	fn neighbourhood_is_clipped_at_grid_edges() {
		let grid = grid_with_surface_at((4, 4, 4), &[(0, 0, 0)]);
		assert!(grid.surface_within(Voxel::new(1, 1, 1), 3));
		assert!(!grid.surface_within(Voxel::new(10, 10, 10), 1));
	}

	#[test]
	fn counts_filled_and_surface_voxels() {
		let grid = grid_with_surface_at((2, 2, 2), &[(0, 0, 0), (1, 1, 1)]);
		assert_eq!(grid.count_filled(), 8);
		assert_eq!(grid.count_surface(), 2);
	}

	#[test]
	fn formats_byte_sizes() {
		assert_eq!(format_bytes(512), "512 bytes");
		assert_eq!(format_bytes(2048), "2.00 KB");
		assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
	}
}
