use std::path::PathBuf;

use psdoc::psd::Result;

use crate::cmd::util::{emit_json, open_parsed};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Print only the dimensions known from the header.
	#[arg(long)]
	pub size_only: bool,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct PlaneRow {
	channel: usize,
	len: usize,
	min: u8,
	max: u8,
}

#[derive(serde::Serialize)]
struct ImageJson {
	path: String,
	width: u32,
	height: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	depth: Option<u16>,
	#[serde(skip_serializing_if = "Option::is_none")]
	compression: Option<&'static str>,
	decoded: bool,
	planes: Vec<PlaneRow>,
}

/// Summarize the composite image, decoding it unless `--size-only` is set.
pub fn run(args: Args) -> Result<()> {
	let mut doc = open_parsed(&args.path)?;
	let mut payload = ImageJson {
		path: args.path.display().to_string(),
		width: doc.image_width()?,
		height: doc.image_height()?,
		depth: None,
		compression: None,
		decoded: false,
		planes: Vec::new(),
	};

	if !args.size_only {
		let image = doc.image()?;
		payload.depth = Some(image.depth);
		payload.compression = Some(image.compression.as_str());
		payload.decoded = true;
		payload.planes = image
			.planes
			.iter()
			.enumerate()
			.map(|(channel, plane)| PlaneRow {
				channel,
				len: plane.len(),
				min: plane.iter().copied().min().unwrap_or(0),
				max: plane.iter().copied().max().unwrap_or(0),
			})
			.collect();
	}

	if args.json {
		return emit_json(&payload);
	}

	println!("path: {}", payload.path);
	println!("size: {}x{}", payload.width, payload.height);
	if let (Some(depth), Some(compression)) = (payload.depth, payload.compression) {
		println!("depth: {depth}");
		println!("compression: {compression}");
	}
	for row in &payload.planes {
		println!("plane {}: len={} min={} max={}", row.channel, row.len, row.min, row.max);
	}
	Ok(())
}
