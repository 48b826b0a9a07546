pub mod voxel_map {
	pub mod accumulator;
	pub mod config;
	pub mod emission;
	pub mod error;
	pub mod grid;
	pub mod info;
	pub mod mapper;
	pub mod mrc_output;
	pub mod segment;
	pub mod state;
	pub mod surface;
	pub mod traversal;
	pub mod utils;
}

pub use voxel_map::accumulator::{Accumulator, MappingStats, SeRecord};
pub use voxel_map::config::MappingConfig;
pub use voxel_map::error::{ConfigError, GridError};
pub use voxel_map::grid::{GridModel, Voxel};
pub use voxel_map::mapper::TrajectoryMapper;
pub use voxel_map::segment::{Pass, Segment};
pub use voxel_map::state::VoxelState;
