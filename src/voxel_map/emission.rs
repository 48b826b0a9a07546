use glam::DVec3;
use rand::Rng;

use crate::voxel_map::accumulator::{Accumulator, SeRecord};
use crate::voxel_map::config::MappingConfig;
use crate::voxel_map::grid::{GridModel, Voxel};

/// Number of equal steps taken from the sampled endpoint back toward the origin.
pub const BACK_SEARCH_STEPS: usize = 3;

/// Fate of one secondary-electron emission event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Emission {
	/// No surface voxel within reach of the deposit; nothing was sampled.
	Shielded,
	/// Collected by a surface voxel, which received `count` electrons of flux.
	Captured { voxel: Voxel, count: f64 },
	/// Sampled endpoint lies in solid material.
	Absorbed,
	/// Reached open space but no surface voxel was found on the way back.
	Discarded,
	/// Sampled endpoint or a back-search step fell outside the grid.
	Escaped(Voxel),
}

/// Stochastic secondary-electron emission model.
#[derive(Debug, Clone, PartialEq)]
pub struct SeEmitter {
	pub activation_energy: f64,
	pub lambda_escape: f64,
	pub angle_scale: f64,
	pub half_width: usize,
}

impl SeEmitter {
	pub fn new(config: &MappingConfig, cell_dim: f64) -> Self {
		Self {
			activation_energy: config.activation_energy,
			lambda_escape: config.lambda_escape,
			angle_scale: config.angle_scale,
			half_width: config.escape_half_width(cell_dim),
		}
	}

	/// Distance from the origin at which escape endpoints are sampled.
	#[inline]
	pub fn escape_length(&self) -> f64 {
		2.0 * self.lambda_escape
	}

	/// Sample an escape endpoint at `escape_length` from `origin`.
	/// Azimuth and polar angle are each `U[-1, 1) * angle_scale`.
	pub fn sample_target<R: Rng>(&self, origin: DVec3, rng: &mut R) -> DVec3 {
		let alpha = rng.gen_range(-1.0..1.0) * self.angle_scale;
		let gamma = rng.gen_range(-1.0..1.0) * self.angle_scale;
		let (sin_a, cos_a) = alpha.sin_cos();
		let (sin_g, cos_g) = gamma.sin_cos();
		origin + self.escape_length() * DVec3::new(sin_g * cos_a, sin_g * sin_a, cos_g)
	}

	/// Emit secondary electrons for `de` eV freshly deposited in `voxel` at `origin`.
	pub fn emit<R: Rng>(
		&self,
		grid: &GridModel,
		acc: &mut Accumulator,
		voxel: Voxel,
		de: f64,
		origin: DVec3,
		rng: &mut R,
	) -> Emission {
		if !grid.surface_within(voxel, self.half_width) {
			acc.stats.shielded += 1;
			return Emission::Shielded;
		}

		let n_se = de / self.activation_energy;
		let target = self.sample_target(origin, rng);
		acc.se_records.push(SeRecord { origin, target });
		collect(grid, acc, origin, target, n_se)
	}
}

/// Resolve where an SE heading from `origin` to `target` is collected and record its flux.
pub fn collect(grid: &GridModel, acc: &mut Accumulator, origin: DVec3, target: DVec3, n_se: f64) -> Emission {
	let landing = grid.locate(target);
	match grid.state_at(landing) {
		Err(_) => {
			log::debug!("SE from {:?} left the grid at voxel {:?}, skipping", origin, landing);
			acc.stats.escaped += 1;
			return Emission::Escaped(landing);
		}
		Ok(state) if state.is_filled() => {
			acc.stats.absorbed += 1;
			return Emission::Absorbed;
		}
		Ok(_) => {}
	}

	let step = (origin - target) / BACK_SEARCH_STEPS as f64;
	let mut pos = target;
	for _ in 0..BACK_SEARCH_STEPS {
		let v = grid.locate(pos);
		let idx = match grid.index_of(v) {
			Ok(idx) => idx,
			Err(_) => {
				log::debug!("SE back-search from {:?} left the grid at voxel {:?}, skipping", target, v);
				acc.stats.escaped += 1;
				return Emission::Escaped(v);
			}
		};
		if grid.surface_mask()[idx] {
			acc.add_flux(idx, n_se);
			acc.stats.captured += 1;
			return Emission::Captured { voxel: v, count: n_se };
		}
		pos += step;
	}

	log::debug!("SE from {:?} found no surface voxel, discarded", origin);
	acc.stats.discarded += 1;
	Emission::Discarded
}
