//! The RAWR zip payload stored alongside a raw tile: one entry per named
//! format produced by the raw-tile generator, DEFLATE-compressed, with a
//! fixed or current GMT timestamp.

use anyhow::{Context, Result};
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// One named member of a raw-tile's formatted output (e.g. a geojson or
/// text subfield). The raw-tile generator itself is a collaborator
/// concern; this type only carries its named byte outputs.
pub struct RawrFormattedData {
	pub name: String,
	pub data: Vec<u8>,
}

/// Builds the zip archive uploaded for one RAWR intermediate tile. Pass
/// `None` for `date_time` to fall back to a fixed timestamp (the zip
/// epoch) when reproducible bytes matter more than wall-clock accuracy.
pub fn make_rawr_zip_payload(members: &[RawrFormattedData], date_time: Option<DateTime>) -> Result<Vec<u8>> {
	let date_time = date_time.unwrap_or_default();
	let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated).last_modified_time(date_time);

	let mut buf = std::io::Cursor::new(Vec::new());
	{
		let mut zip = ZipWriter::new(&mut buf);
		for member in members {
			zip.start_file(member.name.as_str(), options)
				.with_context(|| format!("starting zip entry {}", member.name))?;
			zip.write_all(&member.data).with_context(|| format!("writing zip entry {}", member.name))?;
		}
		zip.finish().context("finalizing RAWR zip payload")?;
	}
	Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn payload_contains_every_member() {
		let members = vec![
			RawrFormattedData {
				name: "tile.geojson".to_string(),
				data: b"{}".to_vec(),
			},
			RawrFormattedData {
				name: "tile.txt".to_string(),
				data: b"hello".to_vec(),
			},
		];
		let bytes = make_rawr_zip_payload(&members, None).unwrap();
		let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
		assert_eq!(archive.len(), 2);
		let mut names: Vec<String> = (0..archive.len()).map(|i| archive.by_index(i).unwrap().name().to_string()).collect();
		names.sort();
		assert_eq!(names, vec!["tile.geojson", "tile.txt"]);
	}
}
