use bitvec::vec::BitVec;
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use etraj_map::{GridModel, MappingConfig, Pass, TrajectoryMapper, VoxelState};

/// 24x16x16 grid, unit cells: substrate below z = 6, a 6x6 pillar up to z = 16.
fn pillar_grid() -> GridModel {
	let (nz, ny, nx) = (24, 16, 16);
	let mut states = Vec::with_capacity(nz * ny * nx);
	for i in 0..nz {
		for j in 0..ny {
			for k in 0..nx {
				let in_pillar = (5..11).contains(&j) && (5..11).contains(&k) && i < 16;
				states.push(if i < 6 {
					VoxelState::Substrate
				} else if in_pillar {
					VoxelState::Deposit
				} else {
					VoxelState::Empty
				});
			}
		}
	}
	GridModel::from_states((nz, ny, nx), 1.0, states).expect("valid grid")
}

fn random_passes(count: usize, seed: u64) -> Vec<Pass> {
	let mut rng = ChaCha8Rng::seed_from_u64(seed);
	(0..count)
		.map(|_| {
			let mut p = DVec3::new(rng.gen_range(4.0..12.0), rng.gen_range(4.0..12.0), 15.9);
			let mut e = 2.0;
			let mut points = vec![DVec3::new(p.x, p.y, 30.0), p];
			let mut energies = vec![e, e];
			for _ in 0..30 {
				let dir = DVec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..0.5));
				p += dir * 1.7;
				e -= rng.gen_range(0.0..0.05);
				points.push(p);
				energies.push(e);
			}
			Pass::new(points, energies)
		})
		.collect()
}

fn run(grid: &GridModel, passes: &[Pass], batches: usize) -> etraj_map::Accumulator {
	let config = MappingConfig { batches, seed: Some(2024), ..MappingConfig::default() };
	TrajectoryMapper::new(grid, config).expect("valid config").map_passes(passes)
}

fn assert_fields_close(a: &[f64], b: &[f64], what: &str) {
	assert_eq!(a.len(), b.len());
	for (idx, (x, y)) in a.iter().zip(b).enumerate() {
		assert!((x - y).abs() <= 1e-9 * (1.0 + x.abs()), "{} differs at {}: {} vs {}", what, idx, x, y);
	}
}

#[test]
fn totals_do_not_depend_on_batch_count() {
	let grid = pillar_grid();
	let passes = random_passes(100, 3);

	let one = run(&grid, &passes, 1);
	assert!(one.total_deposited() > 0.0);
	assert!(one.total_flux() > 0.0);

	for batches in [2, 4, 7, 150] {
		let other = run(&grid, &passes, batches);
		assert_fields_close(&one.de, &other.de, "DE");
		assert_fields_close(&one.flux, &other.flux, "flux");
		assert_eq!(one.stats, other.stats);
		assert_eq!(one.se_records.len(), other.se_records.len());
	}
}

#[test]
fn trajectory_order_does_not_change_deposited_energy() {
	let grid = pillar_grid();
	let passes = random_passes(40, 8);
	let mut reversed = passes.clone();
	reversed.reverse();

	let forward = run(&grid, &passes, 3);
	let backward = run(&grid, &reversed, 3);
	assert_fields_close(&forward.de, &backward.de, "DE");
	assert_eq!(forward.stats.segments, backward.stats.segments);
}

#[test]
fn flux_only_reaches_surface_voxels() {
	let grid = pillar_grid();
	let result = run(&grid, &random_passes(60, 5), 4);
	let mask = grid.surface_mask();
	for (idx, &f) in result.flux.iter().enumerate() {
		if f != 0.0 {
			assert!(mask[idx], "flux {} recorded at non-surface voxel {}", f, idx);
		}
	}
}

#[test]
fn deposited_energy_only_lands_in_solid() {
	let grid = pillar_grid();
	let result = run(&grid, &random_passes(60, 6), 2);
	for (idx, &de) in result.de.iter().enumerate() {
		if de != 0.0 {
			assert!(grid.states()[idx].is_filled(), "energy {} in open voxel {}", de, idx);
		}
	}
}

#[test]
fn buried_solid_produces_no_flux() {
	// Solid block whose only surface voxels sit far from where trajectories run.
	let (nz, ny, nx) = (40, 8, 8);
	let total = nz * ny * nx;
	let mut mask = BitVec::repeat(false, total);
	for idx in (nz - 1) * ny * nx..total {
		mask.set(idx, true);
	}
	let grid = GridModel::new((nz, ny, nx), 1.0, vec![VoxelState::Substrate; total], mask).expect("valid grid");

	let passes: Vec<Pass> = (0..20)
		.map(|n| {
			let x = 2.5 + (n % 4) as f64;
			let zs = [10.5, 10.5, 9.0, 7.5, 6.0];
			let points = zs.iter().map(|&z| DVec3::new(x, 3.5, z)).collect();
			Pass::new(points, vec![1.0, 1.0, 0.98, 0.96, 0.94])
		})
		.collect();

	let result = run(&grid, &passes, 3);
	assert!((result.total_deposited() - 20.0 * 60.0).abs() < 1e-6);
	assert_eq!(result.total_flux(), 0.0);
	assert!(result.se_records.is_empty());
	assert!(result.stats.shielded > 0);
	assert_eq!(result.stats.captured, 0);
}

#[test]
fn passes_outside_the_grid_change_nothing() {
	let grid = pillar_grid();
	let pass = Pass::new(
		vec![DVec3::new(-5.0, -5.0, 50.0), DVec3::new(-5.0, -5.0, 40.0), DVec3::new(-6.0, -5.0, 38.0)],
		vec![1.0, 1.0, 0.9],
	);
	let result = run(&grid, &[pass], 1);
	assert_eq!(result.total_deposited(), 0.0);
	assert_eq!(result.total_flux(), 0.0);
	assert_eq!(result.stats.left_volume, 1);
}
