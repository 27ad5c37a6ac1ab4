#![allow(missing_docs)]

use std::path::Path;
use std::process::Command;

use psdoc_testkit::{LayerSpec, PsdBuilder, stdout_json};
use serde_json::Value;

fn sample() -> PsdBuilder {
	PsdBuilder::new(6, 4)
		.resource(1060, "", b"<x:xmpmeta/>".to_vec())
		.layer(LayerSpec::group("Group").bounds(0, 0, 4, 6))
		.layer(LayerSpec::new("Inner").bounds(1, 1, 3, 3))
		.layer(LayerSpec::group_end())
		.layer(LayerSpec::new("Background").bounds(0, 0, 4, 6).hidden())
		.rle()
}

#[test]
fn info_json_reports_sections_without_materializing() {
	let dir = tempfile::tempdir().expect("tempdir");
	let path = write_doc(dir.path(), "sample.psd", &sample().build());

	let json = run_json(&["info", path.as_str(), "--json"]);
	assert_eq!(json["width"], 6);
	assert_eq!(json["height"], 4);
	assert_eq!(json["mode"], "rgb");
	assert_eq!(json["wrapping"], "none");
	assert_eq!(json["stage"], "parsed");

	let sections = json["sections"].as_array().expect("sections array");
	assert_eq!(sections.len(), 3);
	assert!(sections.iter().all(|section| section["materialized"] == false));
	assert_eq!(sections[2]["name"], "image");
	assert!(sections[2]["skipped_len"].is_null());
}

#[test]
fn layers_json_lists_records_top_first() {
	let dir = tempfile::tempdir().expect("tempdir");
	let path = write_doc(dir.path(), "sample.psd", &sample().build());

	let json = run_json(&["layers", path.as_str(), "--json"]);
	let names: Vec<&str> = json["layers"].as_array().expect("layers array").iter().filter_map(|layer| layer["name"].as_str()).collect();
	assert_eq!(names, ["Group", "Inner", "Background"]);
	assert_eq!(json["layers"][0]["kind"], "group");
	assert_eq!(json["layers"][2]["visible"], false);

	let all = run_json(&["layers", path.as_str(), "--all", "--json"]);
	assert_eq!(all["count"], 4);
}

#[test]
fn tree_json_nests_groups() {
	let dir = tempfile::tempdir().expect("tempdir");
	let path = write_doc(dir.path(), "sample.psd", &sample().build());

	let json = run_json(&["tree", path.as_str(), "--json"]);
	assert_eq!(json["document"]["width"], 6);
	assert_eq!(json["children"][0]["type"], "group");
	assert_eq!(json["children"][0]["children"][0]["name"], "Inner");
	assert_eq!(json["children"][1]["name"], "Background");
	assert!(json["children"][1].get("children").is_none());
}

#[test]
fn image_json_decodes_rle_planes() {
	let dir = tempfile::tempdir().expect("tempdir");
	let path = write_doc(dir.path(), "sample.psd", &sample().build());

	let json = run_json(&["image", path.as_str(), "--json"]);
	assert_eq!(json["compression"], "rle");
	assert_eq!(json["decoded"], true);
	assert_eq!(json["planes"].as_array().map(Vec::len), Some(3));
	assert_eq!(json["planes"][0]["len"], 24);

	let size = run_json(&["image", path.as_str(), "--size-only", "--json"]);
	assert_eq!(size["decoded"], false);
	assert!(size.get("compression").is_none());
}

#[test]
fn resources_json_labels_known_ids() {
	let dir = tempfile::tempdir().expect("tempdir");
	let path = write_doc(dir.path(), "sample.psd", &sample().build());

	let json = run_json(&["resources", path.as_str(), "--json"]);
	assert_eq!(json["count"], 1);
	assert_eq!(json["resources"][0]["id"], 1060);
	assert_eq!(json["resources"][0]["label"], "xmp_metadata");
}

#[test]
fn zstd_wrapped_input_is_accepted() {
	let dir = tempfile::tempdir().expect("tempdir");
	let packed = zstd::encode_all(sample().build().as_slice(), 3).expect("zstd encodes");
	let path = write_doc(dir.path(), "sample.psd.zst", &packed);

	let json = run_json(&["info", path.as_str(), "--json"]);
	assert_eq!(json["wrapping"], "zstd");
}

#[test]
fn malformed_input_exits_with_error() {
	let dir = tempfile::tempdir().expect("tempdir");
	let mut bytes = sample().build();
	bytes[4..6].copy_from_slice(&9_u16.to_be_bytes());
	let path = write_doc(dir.path(), "broken.psd", &bytes);

	let output = Command::new(env!("CARGO_BIN_EXE_psdoc")).args(["info", path.as_str()]).output().expect("command executes");
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

fn write_doc(dir: &Path, name: &str, bytes: &[u8]) -> String {
	let path = dir.join(name);
	std::fs::write(&path, bytes).expect("document written");
	path.display().to_string()
}

fn run_json(args: &[&str]) -> Value {
	let output = Command::new(env!("CARGO_BIN_EXE_psdoc")).args(args).output().expect("command executes");
	stdout_json(&output)
}
