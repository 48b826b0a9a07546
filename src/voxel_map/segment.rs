use glam::DVec3;

/// Conversion from the simulator's keV to the eV used by the energy field.
pub const KEV_TO_EV: f64 = 1000.0;

/// One primary-electron trajectory as delivered by the Monte Carlo simulator:
/// world points and the residual kinetic energy (keV) at each point. The first
/// entry of each is a synthetic entry marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pass {
	pub points: Vec<DVec3>,
	pub energies: Vec<f64>,
}

impl Pass {
	pub fn new(points: Vec<DVec3>, energies: Vec<f64>) -> Self {
		Self { points, energies }
	}
}

/// Straight piece of a trajectory with the energy (eV) lost along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
	pub p1: DVec3,
	pub p2: DVec3,
	pub de: f64,
}

impl Segment {
	#[inline]
	pub fn direction(&self) -> DVec3 {
		self.p2 - self.p1
	}
}

/// Split a pass into consecutive segments, dropping the entry marker.
///
/// Segment `n` runs from point `n` to point `n + 1` and carries
/// `1000 * (E_n - E_{n+1})` eV. Passes with fewer than two usable points give
/// no segments. If points and energies disagree in length the shorter one wins.
pub fn segment_pass(pass: &Pass) -> Vec<Segment> {
	if pass.points.len() != pass.energies.len() {
		log::warn!(
			"pass has {} points but {} energies, truncating to the shorter",
			pass.points.len(),
			pass.energies.len()
		);
	}
	let usable = pass.points.len().min(pass.energies.len());
	if usable < 3 {
		return Vec::new();
	}

	let points = &pass.points[1..usable];
	let energies = &pass.energies[1..usable];
	points
		.windows(2)
		.zip(energies.windows(2))
		.map(|(p, e)| Segment {
			p1: p[0],
			p2: p[1],
			de: KEV_TO_EV * (e[0] - e[1]),
		})
		.collect()
}
