use std::ops::Range;
use std::panic;
use std::thread;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::voxel_map::accumulator::Accumulator;
use crate::voxel_map::config::MappingConfig;
use crate::voxel_map::emission::SeEmitter;
use crate::voxel_map::error::ConfigError;
use crate::voxel_map::grid::GridModel;
use crate::voxel_map::segment::{segment_pass, Pass};
use crate::voxel_map::traversal::{SegmentOutcome, TraversalContext};

/// Split `len` items into `n` contiguous ranges whose sizes differ by at most one,
/// larger ranges first.
pub fn partition(len: usize, n: usize) -> Vec<Range<usize>> {
	let n = n.max(1);
	let base = len / n;
	let extra = len % n;
	let mut start = 0;
	(0..n)
		.map(|b| {
			let size = base + usize::from(b < extra);
			let range = start..start + size;
			start += size;
			range
		})
		.collect()
}

/// Maps batches of primary trajectories onto a shared grid, one worker per batch.
pub struct TrajectoryMapper<'a> {
	grid: &'a GridModel,
	config: MappingConfig,
	emitter: SeEmitter,
	seed: u64,
}

impl<'a> TrajectoryMapper<'a> {
	pub fn new(grid: &'a GridModel, config: MappingConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		let seed = config.seed.unwrap_or_else(rand::random);
		let emitter = SeEmitter::new(&config, grid.cell_dim);
		Ok(Self { grid, config, emitter, seed })
	}

	pub fn seed(&self) -> u64 {
		self.seed
	}

	pub fn config(&self) -> &MappingConfig {
		&self.config
	}

	pub fn emitter(&self) -> &SeEmitter {
		&self.emitter
	}

	/// Generator for the trajectory at global position `index`. Depends only on the
	/// run seed and the index, never on which batch the trajectory landed in.
	pub fn rng_for(&self, index: usize) -> ChaCha8Rng {
		let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
		rng.set_stream(index as u64);
		rng
	}

	/// Deposit energy and generate SE flux for every pass. Batches run in parallel
	/// against private accumulators which are summed once all workers finish.
	pub fn map_passes(&self, passes: &[Pass]) -> Accumulator {
		let start_time = Instant::now();
		let ranges = partition(passes.len(), self.config.batches);
		log::info!(
			"Depositing energy and generating SEs: {} trajectories in {} batches (seed {})",
			passes.len(),
			ranges.len(),
			self.seed
		);

		let progress = if self.config.show_progress {
			let pb = ProgressBar::new(passes.len() as u64);
			pb.set_style(
				ProgressStyle::default_bar()
				.template("Mapping trajectories: [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
				.unwrap_or_else(|_| ProgressStyle::default_bar())
				.progress_chars("#>-"),
			);
			pb
		} else {
			ProgressBar::hidden()
		};

		let partials: Vec<Accumulator> = thread::scope(|scope| {
			let handles: Vec<_> = ranges
				.iter()
				.map(|range| {
					let batch = &passes[range.clone()];
					let first_index = range.start;
					let pb = &progress;
					scope.spawn(move || self.map_batch(first_index, batch, pb))
				})
				.collect();
			handles
				.into_iter()
				.map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
				.collect()
		});
		progress.finish_and_clear();

		let mut total = Accumulator::for_grid(self.grid);
		for partial in partials {
			total.merge(partial);
		}

		let stats = &total.stats;
		log::info!(
			"Mapped {} trajectories ({} segments, {} left the volume) in {:.3} s",
			stats.trajectories,
			stats.segments,
			stats.left_volume,
			start_time.elapsed().as_secs_f64()
		);
		log::info!(
			"Deposited {:.3e} eV; SEs captured {}, absorbed {}, discarded {}, escaped {}, shielded deposits {}",
			total.total_deposited(),
			stats.captured,
			stats.absorbed,
			stats.discarded,
			stats.escaped,
			stats.shielded
		);
		total
	}

	/// Process one contiguous batch whose first pass has global index `first_index`.
	pub fn map_batch(&self, first_index: usize, passes: &[Pass], progress: &ProgressBar) -> Accumulator {
		let ctx = TraversalContext::new(self.grid, &self.emitter);
		let mut acc = Accumulator::for_grid(self.grid);
		for (offset, pass) in passes.iter().enumerate() {
			self.map_pass(&ctx, &mut acc, first_index + offset, pass);
			progress.inc(1);
		}
		log::debug!(
			"batch starting at {} done: {} trajectories, {:.3e} eV",
			first_index,
			passes.len(),
			acc.total_deposited()
		);
		acc
	}

	/// Follow one trajectory segment by segment. Each segment is re-anchored at the
	/// point where the previous one stopped; leaving the grid ends the trajectory.
	pub fn map_pass(&self, ctx: &TraversalContext<'_>, acc: &mut Accumulator, index: usize, pass: &Pass) {
		let mut rng = self.rng_for(index);
		let segments = segment_pass(pass);
		acc.stats.trajectories += 1;

		let mut path = Vec::new();
		if let Some(first) = segments.first() {
			let mut p1 = first.p1;
			for segment in &segments {
				let p2 = p1 + segment.direction();
				acc.stats.segments += 1;
				match ctx.follow_segment(acc, &mut rng, p1, p2, segment.de, &mut path) {
					SegmentOutcome::LeftVolume { .. } => {
						acc.stats.left_volume += 1;
						break;
					}
					SegmentOutcome::Exhausted { continuation } => p1 = continuation,
				}
			}
		}
		if self.config.record_paths {
			acc.paths.push(path);
		}
	}
}

#[cfg(test)]
mod tests {
	use glam::DVec3;

	use super::*;
	use crate::voxel_map::state::VoxelState;

	fn slab_grid() -> GridModel {
		// 8x4x4 unit cells, solid below z = 4
		let states = (0..8 * 16)
			.map(|idx| if idx / 16 < 4 { VoxelState::Deposit } else { VoxelState::Empty })
			.collect();
		GridModel::from_states((8, 4, 4), 1.0, states).expect("valid grid")
	}

	fn config(batches: usize) -> MappingConfig {
		MappingConfig { batches, seed: Some(11), record_paths: true, ..MappingConfig::default() }
	}

	fn vertical_pass(x: f64, y: f64, zs: &[f64], energies: &[f64]) -> Pass {
		let mut points = vec![DVec3::new(x, y, 100.0)];
		points.extend(zs.iter().map(|&z| DVec3::new(x, y, z)));
		let mut e = vec![energies[0]];
		e.extend_from_slice(energies);
		Pass::new(points, e)
	}

	#[test]
	fn partition_matches_contiguous_split() {
		let ranges = partition(10, 4);
		assert_eq!(ranges, vec![0..3, 3..6, 6..8, 8..10]);
		assert_eq!(partition(2, 4), vec![0..1, 1..2, 2..2, 2..2]);
		assert_eq!(partition(5, 0), vec![0..5]);
	}

	#[test]
	fn rejects_invalid_config() {
		let grid = slab_grid();
		let bad = MappingConfig { batches: 0, ..MappingConfig::default() };
		assert_eq!(TrajectoryMapper::new(&grid, bad).err(), Some(ConfigError::ZeroBatches));
	}

	#[test]
	fn emitter_follows_the_config() {
		let grid = slab_grid();
		let config = MappingConfig { lambda_escape: 2.0, activation_energy: 50.0, ..config(2) };
		let mapper = TrajectoryMapper::new(&grid, config.clone()).expect("valid config");

		assert_eq!(mapper.config(), &config);
		assert_eq!(mapper.seed(), 11);
		assert_eq!(mapper.emitter().half_width, 6);
		assert_eq!(mapper.emitter().activation_energy, 50.0);
		assert_eq!(mapper.emitter().escape_length(), 4.0);
	}

	#[test]
	fn energy_of_an_inner_trajectory_is_fully_deposited() {
		let grid = slab_grid();
		let mapper = TrajectoryMapper::new(&grid, config(1)).expect("valid config");
		let pass = vertical_pass(1.5, 1.5, &[3.5, 2.5, 1.5], &[1.0, 0.99, 0.985]);
		let result = mapper.map_passes(&[pass]);

		assert!((result.total_deposited() - 15.0).abs() < 1e-9);
		assert_eq!(result.stats.trajectories, 1);
		assert_eq!(result.stats.segments, 2);
		assert_eq!(result.stats.left_volume, 0);
		assert_eq!(result.paths.len(), 1);
	}

	#[test]
	fn leaving_the_volume_stops_the_trajectory() {
		let grid = slab_grid();
		let mapper = TrajectoryMapper::new(&grid, config(1)).expect("valid config");
		// second segment runs out through the bottom, third is never followed
		let pass = vertical_pass(1.5, 1.5, &[3.5, 2.5, -5.0, -6.0], &[1.0, 0.99, 0.98, 0.5]);
		let result = mapper.map_passes(&[pass]);

		assert_eq!(result.stats.segments, 2);
		assert_eq!(result.stats.left_volume, 1);
		let above_third = result.total_deposited();
		assert!(above_third < 10.0 + 10.0 * 3.0 / 7.5 + 1e-9);
		assert!(above_third > 10.0);
	}

	#[test]
	fn continuation_point_carries_between_segments() {
		let grid = slab_grid();
		let mapper = TrajectoryMapper::new(&grid, config(1)).expect("valid config");
		// starts in vacuum: the first segment is pushed down into the solid
		let pass = vertical_pass(1.5, 1.5, &[6.5, 5.5, 4.5], &[1.0, 0.99, 0.98]);
		let result = mapper.map_passes(&[pass]);

		assert!((result.total_deposited() - 20.0).abs() < 1e-9);
		let path = &result.paths[0];
		let last = path.last().copied().expect("path recorded");
		assert!((last.z - 2.0).abs() < 1e-9);
	}

	#[test]
	fn per_trajectory_generators_ignore_batching() {
		let grid = slab_grid();
		let mapper = TrajectoryMapper::new(&grid, config(3)).expect("valid config");
		use rand::Rng;
		let a: u64 = mapper.rng_for(7).r#gen();
		let b: u64 = mapper.rng_for(7).r#gen();
		let c: u64 = mapper.rng_for(8).r#gen();
		assert_eq!(a, b);
		assert_ne!(a, c);
	}
}
