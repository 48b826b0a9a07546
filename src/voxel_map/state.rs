use crate::voxel_map::error::GridError;

/// Material category of one voxel.
///
/// Codes follow the deposition model that produces the grids: the two filled
/// categories are negative, everything at or above zero is open space that a
/// primary electron crosses without losing energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i8)]
pub enum VoxelState {
	/// Bulk substrate the structure grows on.
	Substrate = -2,
	/// Fully deposited material.
	Deposit = -1,
	#[default]
	Empty = 0,
	/// Open cell adjacent to the solid, carrying adsorbate.
	Surface = 1,
}

impl VoxelState {
	pub fn from_code(code: i8) -> Result<Self, GridError> {
		match code {
			-2 => Ok(Self::Substrate),
			-1 => Ok(Self::Deposit),
			0 => Ok(Self::Empty),
			1 => Ok(Self::Surface),
			other => Err(GridError::UnknownStateCode(other)),
		}
	}

	#[inline]
	pub fn code(self) -> i8 {
		self as i8
	}

	/// Solid voxels absorb energy from a passing primary electron.
	#[inline]
	pub fn is_filled(self) -> bool {
		matches!(self, Self::Substrate | Self::Deposit)
	}
}
