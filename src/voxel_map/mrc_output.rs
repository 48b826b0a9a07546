use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::voxel_map::grid::GridModel;

pub const MRC_HEADER_BYTES: usize = 1024;
const MODE_FLOAT32: i32 = 2;
const LABEL_BYTES: usize = 80;

/// MRC2014 header for a float32 volume laid out x fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct MrcHeader {
	pub nx: i32,
	pub ny: i32,
	pub nz: i32,
	pub cell_lengths: [f32; 3],  // Physical extent, nm
	pub origin: [f32; 3],
	pub amin: f32,
	pub amax: f32,
	pub amean: f32,
	pub rms: f32,
	pub label: String,
}

impl MrcHeader {
	pub fn for_field(grid: &GridModel, field: &[f64], label: &str) -> Self {
		let n = field.len().max(1) as f64;
		let (mut amin, mut amax, mut sum, mut sum_sq) = (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0.0);
		for &v in field {
			amin = amin.min(v);
			amax = amax.max(v);
			sum += v;
			sum_sq += v * v;
		}
		if field.is_empty() {
			amin = 0.0;
			amax = 0.0;
		}
		let mean = sum / n;
		let rms = (sum_sq / n - mean * mean).max(0.0).sqrt();
		let cd = grid.cell_dim as f32;

		Self {
			nx: grid.nx as i32,
			ny: grid.ny as i32,
			nz: grid.nz as i32,
			cell_lengths: [grid.nx as f32 * cd, grid.ny as f32 * cd, grid.nz as f32 * cd],
			origin: [grid.origin.x as f32, grid.origin.y as f32, grid.origin.z as f32],
			amin: amin as f32,
			amax: amax as f32,
			amean: mean as f32,
			rms: rms as f32,
			label: label.to_string(),
		}
	}

	/// Serialize as the fixed 1024-byte little-endian header.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut buf = Vec::with_capacity(MRC_HEADER_BYTES);
		let put_i32 = |buf: &mut Vec<u8>, v: i32| buf.extend_from_slice(&v.to_le_bytes());
		for v in [self.nx, self.ny, self.nz, MODE_FLOAT32, 0, 0, 0, self.nx, self.ny, self.nz] {
			put_i32(&mut buf, v);
		}
		let floats = |buf: &mut Vec<u8>, vs: &[f32]| {
			for v in vs {
				buf.extend_from_slice(&v.to_le_bytes());
			}
		};
		floats(&mut buf, &self.cell_lengths);
		floats(&mut buf, &[90.0, 90.0, 90.0]);
		for v in [1, 2, 3] {
			put_i32(&mut buf, v);
		}
		floats(&mut buf, &[self.amin, self.amax, self.amean]);
		put_i32(&mut buf, 0);  // ispg
		put_i32(&mut buf, 0);  // nsymbt
		buf.resize(buf.len() + 25 * 4, 0);  // extra
		floats(&mut buf, &self.origin);
		buf.extend_from_slice(b"MAP ");
		buf.extend_from_slice(&[0x44, 0x44, 0x00, 0x00]);  // little-endian machine stamp
		floats(&mut buf, &[self.rms]);
		put_i32(&mut buf, 1);  // nlabl

		let mut label = [b' '; LABEL_BYTES];
		let text = self.label.as_bytes();
		let len = text.len().min(LABEL_BYTES);
		label[..len].copy_from_slice(&text[..len]);
		buf.extend_from_slice(&label);
		buf.resize(MRC_HEADER_BYTES, 0);
		buf
	}
}

/// Save a per-voxel field (DE or flux) as an MRC volume and report save time.
pub fn write_field_mrc(grid: &GridModel, field: &[f64], label: &str, path: impl AsRef<Path>) -> io::Result<()> {
	if field.len() != grid.total_voxels {
		return Err(io::Error::new(
			io::ErrorKind::InvalidInput,
			format!("field has {} values, grid has {} voxels", field.len(), grid.total_voxels),
		));
	}
	let start_time = Instant::now();
	let path = path.as_ref();
	let mut file = BufWriter::new(File::create(path)?);

	file.write_all(&MrcHeader::for_field(grid, field, label).to_bytes())?;
	for &v in field {
		file.write_all(&(v as f32).to_le_bytes())?;
	}
	file.flush()?;

	log::info!("MRC file saved: {} ({:.3} s)", path.display(), start_time.elapsed().as_secs_f64());
	Ok(())
}
