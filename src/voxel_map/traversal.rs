use glam::DVec3;
use rand::Rng;

use crate::voxel_map::accumulator::Accumulator;
use crate::voxel_map::emission::SeEmitter;
use crate::voxel_map::grid::{GridModel, Voxel};

/// Axis order used for crossing parameters and step signs.
pub const AXIS_Z: usize = 0;
pub const AXIS_Y: usize = 1;
pub const AXIS_X: usize = 2;

/// How the walk along one segment ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentOutcome {
	/// The walk stepped out of the grid at `exit`. The trajectory is finished.
	LeftVolume { exit: DVec3 },
	/// The solid path length was used up; the next segment attaches at `continuation`.
	Exhausted { continuation: DVec3 },
}

/// Read-only geometry and emission model shared by every worker.
#[derive(Debug, Clone, Copy)]
pub struct TraversalContext<'a> {
	pub grid: &'a GridModel,
	pub emitter: &'a SeEmitter,
}

#[inline]
fn sign(x: f64) -> isize {
	if x < 0.0 {
		-1
	} else if x > 0.0 {
		1
	} else {
		0
	}
}

/// Index step per axis, in (z, y, x) order.
pub fn step_signs(vd: DVec3) -> [isize; 3] {
	[sign(vd.z), sign(vd.y), sign(vd.x)]
}

/// Parametric distance from `p0` to the next wall of voxel `v` on each axis, in units
/// of `vd`. The far wall is used when stepping up, the near wall otherwise. Axes
/// the segment does not move along never cross.
pub fn crossing_params(grid: &GridModel, v: Voxel, steps: [isize; 3], p0: DVec3, vd: DVec3) -> [f64; 3] {
	let corner = grid.voxel_corner(v);
	let axis = |start: f64, wall: f64, d: f64, step: isize| -> f64 {
		if d == 0.0 {
			return f64::INFINITY;
		}
		let wall = if step == 1 { wall + grid.cell_dim } else { wall };
		(wall - start) / d
	};
	[
		axis(p0.z, corner.z, vd.z, steps[AXIS_Z]),
		axis(p0.y, corner.y, vd.y, steps[AXIS_Y]),
		axis(p0.x, corner.x, vd.x, steps[AXIS_X]),
	]
}

/// Axis with the nearest crossing. Ties go to z first, then y: the comparison order of
/// the deposition model's original walk is kept, so x never wins a tie.
#[inline]
pub fn next_axis(t: [f64; 3]) -> usize {
	let [tz, ty, tx] = t;
	if tx < ty {
		if tx < tz { AXIS_X } else { AXIS_Z }
	} else if ty < tz {
		AXIS_Y
	} else {
		AXIS_Z
	}
}

impl<'a> TraversalContext<'a> {
	pub fn new(grid: &'a GridModel, emitter: &'a SeEmitter) -> Self {
		Self { grid, emitter }
	}

	/// Walk the segment `p1 -> p2` through the grid, depositing `de` eV into the filled
	/// voxels it crosses in proportion to the length travelled in each.
	///
	/// Open voxels absorb nothing: the length spent in them is added onto the end of
	/// the segment, so the walk keeps going until `|p2 - p1|` of solid has been
	/// crossed or the grid is left. Crossing points are appended to `path`.
	pub fn follow_segment<R: Rng>(
		&self,
		acc: &mut Accumulator,
		rng: &mut R,
		p1: DVec3,
		p2: DVec3,
		de: f64,
		path: &mut Vec<DVec3>,
	) -> SegmentOutcome {
		let grid = self.grid;
		let vd = p2 - p1;
		let l0 = vd.length();
		if !(l0 > 0.0) {
			return SegmentOutcome::Exhausted { continuation: p2 };
		}

		let mut v = grid.locate(p1);
		path.push(p1);
		if !grid.contains_voxel(v) {
			return SegmentOutcome::LeftVolume { exit: p1 };
		}

		let steps = step_signs(vd);
		let mut remaining = l0;
		let mut t = 0.0;
		let mut p0 = p1;
		let mut pr = p2;

		loop {
			let tc = crossing_params(grid, v, steps, p0, vd);
			let axis = next_axis(tc);
			t += tc[axis];

			let exited = v;
			match axis {
				AXIS_Z => v.i += steps[AXIS_Z],
				AXIS_Y => v.j += steps[AXIS_Y],
				_ => v.k += steps[AXIS_X],
			}

			let ps = p1 + t * vd;
			let dl = (ps - p0).length();

			// `exited` was inside the grid on the previous iteration
			let idx = grid.ijk_to_index(exited.i as usize, exited.j as usize, exited.k as usize);
			let filled = grid.states()[idx].is_filled();

			// The true endpoint comes before this crossing, even when the crossing is the grid edge.
			if filled && remaining - dl < 0.0 {
				let share = (pr - p0).length() / l0 * de;
				self.deposit(acc, rng, exited, idx, share, pr);
				path.push(pr);
				return SegmentOutcome::Exhausted { continuation: pr };
			}
			if !grid.contains_voxel(v) {
				path.push(ps);
				return SegmentOutcome::LeftVolume { exit: ps };
			}

			if filled {
				remaining -= dl;
				self.deposit(acc, rng, exited, idx, de * dl / l0, ps);
			} else {
				pr += ps - p0;
			}
			path.push(ps);
			p0 = ps;
		}
	}

	fn deposit<R: Rng>(&self, acc: &mut Accumulator, rng: &mut R, voxel: Voxel, idx: usize, energy: f64, at: DVec3) {
		acc.deposit(idx, energy);
		if energy != 0.0 {
			self.emitter.emit(self.grid, acc, voxel, energy, at, rng);
		}
	}
}
