use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use etraj_map::voxel_map::{info, mrc_output};
use etraj_map::{GridModel, MappingConfig, Pass, TrajectoryMapper, VoxelState};

/// Map synthetic electron trajectories onto a pillar-on-substrate model and
/// report deposited energy and secondary-electron flux.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// Grid size along x, y and z in voxels
	#[arg(long, num_args = 3, default_values_t = [40usize, 40, 60])]
	dims: Vec<usize>,

	/// Voxel edge length, nm
	#[arg(long, default_value_t = 1.0)]
	cell: f64,

	/// Substrate thickness in voxels
	#[arg(long, default_value_t = 10)]
	substrate: usize,

	/// Pillar radius and height in voxels
	#[arg(long, num_args = 2, default_values_t = [6usize, 30])]
	pillar: Vec<usize>,

	/// Number of primary trajectories
	#[arg(short = 'n', long, default_value_t = 1000)]
	trajectories: usize,

	/// Beam energy, keV
	#[arg(long, default_value_t = 5.0)]
	energy: f64,

	/// Worker batches (defaults to available cores)
	#[arg(short, long)]
	batches: Option<usize>,

	#[arg(long)]
	seed: Option<u64>,

	/// SE activation energy, eV
	#[arg(long, default_value_t = etraj_map::voxel_map::config::DEFAULT_ACTIVATION_ENERGY)]
	activation_energy: f64,

	/// SE mean free escape path, nm
	#[arg(long, default_value_t = etraj_map::voxel_map::config::DEFAULT_LAMBDA_ESCAPE)]
	lambda_escape: f64,

	/// Directory to write de.mrc and flux.mrc into
	#[arg(short, long)]
	output: Option<PathBuf>,

	#[arg(long)]
	progress: bool,
}

fn build_grid(args: &Args) -> Result<GridModel> {
	let (nx, ny, nz) = (args.dims[0], args.dims[1], args.dims[2]);
	let (radius, height) = (args.pillar[0] as f64, args.pillar[1]);
	let (cx, cy) = (nx as f64 / 2.0, ny as f64 / 2.0);

	let mut states = Vec::with_capacity(nx * ny * nz);
	for i in 0..nz {
		for j in 0..ny {
			for k in 0..nx {
				let (dx, dy) = (k as f64 + 0.5 - cx, j as f64 + 0.5 - cy);
				let state = if i < args.substrate {
					VoxelState::Substrate
				} else if i < args.substrate + height && dx * dx + dy * dy <= radius * radius {
					VoxelState::Deposit
				} else {
					VoxelState::Empty
				};
				states.push(state);
			}
		}
	}

	let beam = (cx * args.cell, cy * args.cell);
	let grid = GridModel::from_states((nz, ny, nx), args.cell, states).context("building demo grid")?;
	Ok(grid.with_beam_offset(beam.0, beam.1))
}

/// Crude downward random walk standing in for Monte Carlo output.
fn synthetic_passes(grid: &GridModel, count: usize, energy: f64, seed: u64) -> Vec<Pass> {
	let mut rng = ChaCha8Rng::seed_from_u64(seed);
	let (bx, by) = grid.beam_offset;
	let top = grid.origin.z + grid.nz as f64 * grid.cell_dim;
	let start_z = grid.first_solid_z(bx, by).unwrap_or(top);
	let step = 2.0 * grid.cell_dim;

	(0..count)
		.map(|_| {
			let mut p = DVec3::new(bx + rng.gen_range(-1.0..1.0), by + rng.gen_range(-1.0..1.0), start_z);
			if !grid.contains(DVec3::new(p.x, p.y, grid.origin.z)) {
				p = DVec3::new(bx, by, start_z);
			}
			let mut e = energy;
			let mut points = vec![DVec3::new(p.x, p.y, top), p];
			let mut energies = vec![e, e];
			while e > 0.05 * energy && points.len() < 200 {
				let dir = DVec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..0.3))
					.normalize_or_zero();
				p += dir * step;
				e *= rng.gen_range(0.93..0.99);
				points.push(p);
				energies.push(e);
			}
			Pass::new(points, energies)
		})
		.collect()
}

fn main() -> Result<()> {
	env_logger::init();
	let args = Args::parse();
	info::log_build_info();

	let grid = build_grid(&args)?;
	grid.report_memory();

	let mut config = MappingConfig {
		activation_energy: args.activation_energy,
		lambda_escape: args.lambda_escape,
		seed: args.seed,
		show_progress: args.progress,
		..MappingConfig::default()
	};
	if let Some(batches) = args.batches {
		config.batches = batches;
	}
	info::log_run_parameters(&config, &grid);

	let mapper = TrajectoryMapper::new(&grid, config).context("invalid mapping parameters")?;
	let passes = synthetic_passes(&grid, args.trajectories, args.energy, mapper.seed());
	let result = mapper.map_passes(&passes);

	println!("Deposited energy: {:.4e} eV", result.total_deposited());
	println!("SE flux: {:.4} electrons over {} surface voxels", result.total_flux(), grid.count_surface());
	println!("Trajectories leaving the volume: {}/{}", result.stats.left_volume, result.stats.trajectories);

	if let Some(dir) = &args.output {
		fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
		mrc_output::write_field_mrc(&grid, &result.de, "deposited energy, eV", dir.join("de.mrc"))
			.context("writing de.mrc")?;
		mrc_output::write_field_mrc(&grid, &result.flux, "secondary electron flux", dir.join("flux.mrc"))
			.context("writing flux.mrc")?;
	}
	Ok(())
}
