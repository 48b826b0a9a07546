use std::ops::AddAssign;

use glam::DVec3;

use crate::voxel_map::grid::{GridModel, Voxel};

/// Secondary electron origin and sampled escape endpoint, kept for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeRecord {
	pub origin: DVec3,
	pub target: DVec3,
}

/// Counters collected while mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingStats {
	pub trajectories: usize,
	pub segments: usize,
	pub left_volume: usize,
	pub shielded: usize,  // deposits too deep for any SE to reach the surface
	pub captured: usize,
	pub absorbed: usize,
	pub discarded: usize,
	pub escaped: usize,
}

impl AddAssign for MappingStats {
	fn add_assign(&mut self, rhs: Self) {
		self.trajectories += rhs.trajectories;
		self.segments += rhs.segments;
		self.left_volume += rhs.left_volume;
		self.shielded += rhs.shielded;
		self.captured += rhs.captured;
		self.absorbed += rhs.absorbed;
		self.discarded += rhs.discarded;
		self.escaped += rhs.escaped;
	}
}

/// Private per-worker result arena. Fields only ever grow; partial results
/// from different workers are combined with [`Accumulator::merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
	pub de: Vec<f64>,  // deposited energy per voxel, eV
	pub flux: Vec<f64>,  // SE count per surface voxel
	pub se_records: Vec<SeRecord>,
	pub paths: Vec<Vec<DVec3>>,  // mapped crossing points per trajectory, when recorded
	pub stats: MappingStats,
}

impl Accumulator {
	pub fn new(total_voxels: usize) -> Self {
		Self {
			de: vec![0.0; total_voxels],
			flux: vec![0.0; total_voxels],
			se_records: Vec::new(),
			paths: Vec::new(),
			stats: MappingStats::default(),
		}
	}

	pub fn for_grid(grid: &GridModel) -> Self {
		Self::new(grid.total_voxels)
	}

	#[inline]
	pub fn deposit(&mut self, index: usize, energy: f64) {
		self.de[index] += energy;
	}

	#[inline]
	pub fn add_flux(&mut self, index: usize, count: f64) {
		self.flux[index] += count;
	}

	/// Fold another worker's result into this one: fields are summed
	/// elementwise, records and paths appended.
	pub fn merge(&mut self, other: Accumulator) {
		debug_assert_eq!(self.de.len(), other.de.len());
		for (a, b) in self.de.iter_mut().zip(&other.de) {
			*a += b;
		}
		for (a, b) in self.flux.iter_mut().zip(&other.flux) {
			*a += b;
		}
		self.se_records.extend(other.se_records);
		self.paths.extend(other.paths);
		self.stats += other.stats;
	}

	pub fn total_deposited(&self) -> f64 {
		self.de.iter().sum()
	}

	pub fn total_flux(&self) -> f64 {
		self.flux.iter().sum()
	}

	pub fn de_at(&self, grid: &GridModel, v: Voxel) -> Option<f64> {
		grid.index_of(v).ok().map(|idx| self.de[idx])
	}

	pub fn flux_at(&self, grid: &GridModel, v: Voxel) -> Option<f64> {
		grid.index_of(v).ok().map(|idx| self.flux[idx])
	}
}
