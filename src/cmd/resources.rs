use std::path::PathBuf;

use psdoc::psd::Result;

use crate::cmd::util::{emit_json, open_parsed};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Only list the resource with this id.
	#[arg(long)]
	pub id: Option<u16>,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct ResourceRow {
	id: u16,
	label: Option<&'static str>,
	name: String,
	offset: usize,
	len: usize,
}

#[derive(serde::Serialize)]
struct Resolution {
	h_res: f64,
	v_res: f64,
}

#[derive(serde::Serialize)]
struct ResourcesJson {
	path: String,
	count: usize,
	resolution: Option<Resolution>,
	resources: Vec<ResourceRow>,
}

/// Decode and list image resource records.
pub fn run(args: Args) -> Result<()> {
	let mut doc = open_parsed(&args.path)?;
	let resources = doc.resources()?;

	let rows: Vec<ResourceRow> = resources
		.records
		.iter()
		.filter(|record| args.id.is_none_or(|id| id == record.id))
		.map(|record| ResourceRow {
			id: record.id,
			label: record.label(),
			name: record.name.clone(),
			offset: record.data_offset,
			len: record.data.len(),
		})
		.collect();
	let resolution = resources.resolution_info()?.map(|info| Resolution {
		h_res: info.h_res,
		v_res: info.v_res,
	});

	let payload = ResourcesJson {
		path: args.path.display().to_string(),
		count: rows.len(),
		resolution,
		resources: rows,
	};

	if args.json {
		return emit_json(&payload);
	}

	println!("path: {}", payload.path);
	println!("resources: {}", payload.count);
	if let Some(resolution) = &payload.resolution {
		println!("resolution: {}x{}", resolution.h_res, resolution.v_res);
	}
	println!("id\tlabel\tname\toffset\tlen");
	for row in &payload.resources {
		println!("{}\t{}\t{}\t{}\t{}", row.id, row.label.unwrap_or("-"), row.name, row.offset, row.len);
	}
	Ok(())
}
