use std::path::PathBuf;

use psdoc::psd::{Node, NodeKind, Result, Tree};

use crate::cmd::util::{emit_json, open_parsed};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Print the layer hierarchy.
pub fn run(args: Args) -> Result<()> {
	let mut doc = open_parsed(&args.path)?;
	let tree = Tree::build(&mut doc)?;

	if args.json {
		return emit_json(&tree.export()?);
	}

	println!("path: {}", args.path.display());
	println!("document: {}x{}", tree.document.width, tree.document.height);
	println!("nodes: {}", tree.descendants().len());
	for node in &tree.children {
		print_node(node, 0);
	}
	Ok(())
}

fn print_node(node: &Node, depth: usize) {
	let marker = match node.kind {
		NodeKind::Group => "+",
		NodeKind::Layer => "-",
	};
	let hidden = if node.visible { "" } else { " (hidden)" };
	println!("{}{marker} {} [{}x{}]{hidden}", "  ".repeat(depth), node.name, node.width, node.height);
	for child in &node.children {
		print_node(child, depth + 1);
	}
}
