use std::path::PathBuf;

use psdoc::psd::{PsdError, Result, Section, SectionHandle};

use crate::cmd::util::{emit_json, open_parsed};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct SectionRow {
	name: &'static str,
	start: usize,
	skipped_len: Option<usize>,
	materialized: bool,
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	wrapping: &'static str,
	len: usize,
	version: u16,
	big: bool,
	width: u32,
	height: u32,
	channels: u16,
	depth: u16,
	mode: &'static str,
	color_data_len: usize,
	stage: &'static str,
	sections: Vec<SectionRow>,
}

/// Print header facts and section offsets without decoding any section.
pub fn run(args: Args) -> Result<()> {
	let doc = open_parsed(&args.path)?;
	let header = doc.header().cloned().ok_or(PsdError::NotParsed)?;

	let mut sections = Vec::new();
	if let Some(handle) = doc.resources_handle() {
		sections.push(section_row(handle));
	}
	if let Some(handle) = doc.layer_mask_handle() {
		sections.push(section_row(handle));
	}
	if let Some(handle) = doc.image_handle() {
		sections.push(section_row(handle));
	}

	let payload = InfoJson {
		path: args.path.display().to_string(),
		wrapping: doc.wrapping().as_str(),
		len: doc.cursor().len(),
		version: header.version,
		big: header.is_big(),
		width: header.width,
		height: header.height,
		channels: header.channels,
		depth: header.depth,
		mode: header.mode.as_str(),
		color_data_len: header.color_data.len(),
		stage: doc.stage().as_str(),
		sections,
	};

	if args.json {
		return emit_json(&payload);
	}

	println!("path: {}", payload.path);
	println!("wrapping: {}", payload.wrapping);
	println!("len: {}", payload.len);
	println!("version: {}{}", payload.version, if payload.big { " (psb)" } else { "" });
	println!("size: {}x{}", payload.width, payload.height);
	println!("channels: {}", payload.channels);
	println!("depth: {}", payload.depth);
	println!("mode: {}", payload.mode);
	println!("color_data: {} bytes", payload.color_data_len);
	println!("stage: {}", payload.stage);
	for row in &payload.sections {
		let skipped = row.skipped_len.map_or_else(|| "-".to_owned(), |len| len.to_string());
		println!("section {}: start={} skipped={} materialized={}", row.name, row.start, skipped, row.materialized);
	}
	Ok(())
}

fn section_row<S: Section>(handle: &SectionHandle<S>) -> SectionRow {
	SectionRow {
		name: S::NAME,
		start: handle.start_offset(),
		skipped_len: handle.skipped_len(),
		materialized: handle.is_materialized(),
	}
}
