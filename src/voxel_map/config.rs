use std::f64::consts::PI;
use std::thread;

use crate::voxel_map::error::ConfigError;

/// Mean energy needed to start a secondary-electron cascade, eV.
pub const DEFAULT_ACTIVATION_ENERGY: f64 = 72.0;
/// Mean free escape path of a secondary electron, nm.
pub const DEFAULT_LAMBDA_ESCAPE: f64 = 3.5;
/// Uniform samples in [-1, 1) are scaled by this to give escape angles.
/// The deposition model has always used 2π, which covers the circle twice.
pub const DEFAULT_ANGLE_SCALE: f64 = 2.0 * PI;

/// Tunables for one mapping run.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingConfig {
	pub activation_energy: f64,
	pub lambda_escape: f64,
	pub batches: usize,
	/// `None` draws a fresh seed per run.
	pub seed: Option<u64>,
	pub angle_scale: f64,
	pub record_paths: bool,
	pub show_progress: bool,
}

impl Default for MappingConfig {
	fn default() -> Self {
		Self {
			activation_energy: DEFAULT_ACTIVATION_ENERGY,
			lambda_escape: DEFAULT_LAMBDA_ESCAPE,
			batches: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
			seed: None,
			angle_scale: DEFAULT_ANGLE_SCALE,
			record_paths: false,
			show_progress: false,
		}
	}
}

impl MappingConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !(self.activation_energy > 0.0) {
			return Err(ConfigError::NonPositiveActivationEnergy(self.activation_energy));
		}
		if !(self.lambda_escape > 0.0) {
			return Err(ConfigError::NonPositiveEscapePath(self.lambda_escape));
		}
		if self.batches == 0 {
			return Err(ConfigError::ZeroBatches);
		}
		if !self.angle_scale.is_finite() {
			return Err(ConfigError::NonFiniteAngleScale(self.angle_scale));
		}
		Ok(())
	}

	/// Half-width, in cells, of the neighbourhood an SE can cross: `floor(3 * lambda / cell_dim)`.
	pub fn escape_half_width(&self, cell_dim: f64) -> usize {
		(3.0 * self.lambda_escape / cell_dim).floor() as usize
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_valid() {
		let config = MappingConfig::default();
		assert!(config.validate().is_ok());
		assert!(config.batches >= 1);
		assert_eq!(config.activation_energy, 72.0);
		assert_eq!(config.lambda_escape, 3.5);
	}

	#[test]
	fn rejects_bad_tunables() {
		let bad = MappingConfig { batches: 0, ..MappingConfig::default() };
		assert_eq!(bad.validate(), Err(ConfigError::ZeroBatches));

		let bad = MappingConfig { activation_energy: 0.0, ..MappingConfig::default() };
		assert_eq!(bad.validate(), Err(ConfigError::NonPositiveActivationEnergy(0.0)));

		let bad = MappingConfig { lambda_escape: -1.0, ..MappingConfig::default() };
		assert_eq!(bad.validate(), Err(ConfigError::NonPositiveEscapePath(-1.0)));

		let bad = MappingConfig { angle_scale: f64::INFINITY, ..MappingConfig::default() };
		assert!(matches!(bad.validate(), Err(ConfigError::NonFiniteAngleScale(_))));
	}

	#[test]
	fn half_width_floors() {
		let config = MappingConfig::default();
		assert_eq!(config.escape_half_width(1.0), 10);
		assert_eq!(config.escape_half_width(5.0), 2);
		assert_eq!(config.escape_half_width(20.0), 0);
	}
}
