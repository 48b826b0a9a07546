use thiserror::Error;

use crate::voxel_map::grid::Voxel;

/// Failures raised while building or indexing a [`GridModel`](crate::voxel_map::grid::GridModel).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
	#[error("state array has {state} voxels but surface mask has {surface}")]
	ShapeMismatch { state: usize, surface: usize },

	#[error("dimensions {nz}x{ny}x{nx} require {expected} voxels, got {actual}")]
	DimensionMismatch { nz: usize, ny: usize, nx: usize, expected: usize, actual: usize },

	#[error("grid dimensions must all be non-zero, got {nz}x{ny}x{nx}")]
	EmptyDimension { nz: usize, ny: usize, nx: usize },

	#[error("cell size must be positive and finite, got {0}")]
	NonPositiveCellSize(f64),

	#[error("unknown voxel state code {0}")]
	UnknownStateCode(i8),

	#[error("voxel {0:?} lies outside the grid")]
	OutOfBounds(Voxel),
}

/// Invalid tunables for a mapping run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
	#[error("activation energy must be positive, got {0} eV")]
	NonPositiveActivationEnergy(f64),

	#[error("escape path must be positive, got {0} nm")]
	NonPositiveEscapePath(f64),

	#[error("batch count must be at least 1")]
	ZeroBatches,

	#[error("angle scale must be finite, got {0}")]
	NonFiniteAngleScale(f64),
}
