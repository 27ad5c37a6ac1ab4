#![allow(missing_docs)]

use psdoc::psd::{Document, LoadOptions, NodeKind, PsdError, Stage, Tree, Wrapping};
use psdoc_testkit::{LayerSpec, PsdBuilder};

fn nested() -> PsdBuilder {
	PsdBuilder::new(8, 8)
		.layer(LayerSpec::group("Outer").bounds(0, 0, 8, 8))
		.layer(LayerSpec::group("Inner").bounds(0, 0, 4, 4))
		.layer(LayerSpec::new("Leaf").bounds(1, 1, 3, 3))
		.layer(LayerSpec::group_end())
		.layer(LayerSpec::group_end())
		.layer(LayerSpec::new("Background").bounds(0, 0, 8, 8))
		.rle()
}

#[test]
fn opened_document_decodes_only_what_is_asked_for() {
	let dir = tempfile::tempdir().expect("tempdir");
	let path = dir.path().join("nested.psd");
	std::fs::write(&path, nested().build()).expect("document written");

	let mut doc = Document::open(&path).expect("document opens");
	assert_eq!(doc.wrapping(), Wrapping::None);
	doc.parse().expect("document parses");
	assert_eq!(doc.stage(), Stage::Parsed);

	let tree = Tree::build(&mut doc).expect("tree builds");
	assert!(doc.layer_mask_handle().expect("staged").is_materialized());
	assert!(!doc.resources_handle().expect("staged").is_materialized());
	assert!(!doc.image_handle().expect("staged").is_materialized());

	assert_eq!(tree.children.len(), 2);
	let outer = &tree.children[0];
	assert_eq!(outer.kind, NodeKind::Group);
	assert_eq!(outer.children[0].name, "Inner");
	assert_eq!(outer.children[0].children[0].name, "Leaf");
	assert_eq!(tree.descendants().len(), 4);
}

#[test]
fn large_documents_follow_the_same_pipeline() {
	let bytes = nested().psb().build();
	let mut doc = Document::from_bytes(bytes);
	doc.parse().expect("psb parses");

	assert!(doc.header().expect("header").is_big());
	assert_eq!(doc.layers().expect("layers decode").len(), 6);
	let image = doc.image().expect("image decodes");
	assert_eq!(image.sample_u8(0, 0, 0), Some(0));
	assert_eq!(image.sample_u8(1, 1, 0), Some(11));
}

#[test]
fn accessors_before_parse_report_not_parsed() {
	let mut doc = Document::from_bytes(nested().build());
	assert!(matches!(doc.layers(), Err(PsdError::NotParsed)));
	assert!(matches!(doc.image_width(), Err(PsdError::NotParsed)));
	assert_eq!(doc.cursor().read_count(), 0);
}

#[test]
fn failed_pipeline_refuses_to_resume() {
	let bytes = nested().build()[..20].to_vec();
	let mut doc = Document::from_bytes(bytes);
	assert!(doc.parse().is_err());
	assert!(matches!(doc.parse(), Err(PsdError::ParseAborted { .. })));
}

#[test]
fn wrapped_files_respect_the_unwrap_limit() {
	let dir = tempfile::tempdir().expect("tempdir");
	let path = dir.path().join("nested.psd.zst");
	let packed = zstd::encode_all(nested().build().as_slice(), 3).expect("zstd encodes");
	std::fs::write(&path, packed).expect("document written");

	let doc = Document::open(&path).expect("wrapped document opens");
	assert_eq!(doc.wrapping(), Wrapping::Zstd);

	let err = Document::open_with(&path, &LoadOptions { max_decompressed_bytes: 16 }).expect_err("limit enforced");
	assert!(matches!(err, PsdError::DecompressedTooLarge { limit: 16 }));
}
