use std::env;
use std::sync::Once;

use crate::voxel_map::config::MappingConfig;
use crate::voxel_map::grid::GridModel;

/// Log program and build information (only once per process)
pub fn log_build_info() {
	static LOG_BUILD_ONCE: Once = Once::new();
	LOG_BUILD_ONCE.call_once(|| {
		let program_name = env::current_exe()
		.ok()
		.as_ref()
		.and_then(|path| path.file_name())
		.and_then(|name| name.to_str())
		.unwrap_or("etraj_map")
		.to_string();

		log::info!("Program: {} v{}", program_name, env!("CARGO_PKG_VERSION"));
		log::info!("Built on {} (revision {})", env!("BUILD_STAMP"), env!("GIT_REVISION"));
	});
}

/// Log the physical parameters a mapping run will use on `grid`.
pub fn log_run_parameters(config: &MappingConfig, grid: &GridModel) {
	log::info!(
		"SE model: activation energy {} eV, escape path {} nm, search half-width {} cells",
		config.activation_energy,
		config.lambda_escape,
		config.escape_half_width(grid.cell_dim)
	);
	log::info!(
		"Grid origin ({:.3}, {:.3}, {:.3}), beam offset ({:.3}, {:.3})",
		grid.origin.x,
		grid.origin.y,
		grid.origin.z,
		grid.beam_offset.0,
		grid.beam_offset.1
	);
}
