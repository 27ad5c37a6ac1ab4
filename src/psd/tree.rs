use serde::Serialize;
use tracing::trace;

use crate::psd::{Document, Layer, Result};

/// Whether a node is a plain layer or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
	/// Pixel, shape, text, or adjustment layer.
	Layer,
	/// Group opened by a folder divider.
	Group,
}

/// One node of the layer hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
	/// Node kind.
	#[serde(rename = "type")]
	pub kind: NodeKind,
	/// Display name.
	pub name: String,
	/// Visibility flag.
	pub visible: bool,
	/// Opacity in `0.0..=1.0`.
	pub opacity: f64,
	/// Blend mode key.
	pub blending_mode: String,
	/// Top edge.
	pub top: i32,
	/// Left edge.
	pub left: i32,
	/// Bottom edge.
	pub bottom: i32,
	/// Right edge.
	pub right: i32,
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// Index into the document's top-first layer list.
	pub layer_index: usize,
	/// Children, top-most first; always empty for layers.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<Node>,
}

impl Node {
	fn from_layer(layer: &Layer, layer_index: usize, kind: NodeKind) -> Self {
		Self {
			kind,
			name: layer.name().to_owned(),
			visible: layer.visible(),
			opacity: f64::from(layer.opacity) / 255.0,
			blending_mode: layer.blend_mode.trim_end().to_owned(),
			top: layer.top,
			left: layer.left,
			bottom: layer.bottom,
			right: layer.right,
			width: layer.width(),
			height: layer.height(),
			layer_index,
			children: Vec::new(),
		}
	}

	/// Count of this node and all descendants.
	pub fn descendant_count(&self) -> usize {
		self.children.iter().map(|child| 1 + child.descendant_count()).sum()
	}
}

/// Document facts exported with the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
	/// Canvas width.
	pub width: u32,
	/// Canvas height.
	pub height: u32,
}

/// Caller-facing layer hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tree {
	/// Canvas facts.
	pub document: DocumentInfo,
	/// Root nodes, top-most first.
	pub children: Vec<Node>,
}

impl Tree {
	/// Build the hierarchy, materializing the layer/mask section.
	///
	/// Requires a parsed document.
	pub fn build(doc: &mut Document) -> Result<Self> {
		let document = DocumentInfo {
			width: doc.image_width()?,
			height: doc.image_height()?,
		};
		let children = nest(doc.layers()?);
		Ok(Self { document, children })
	}

	/// Serializable export view.
	pub fn export(&self) -> Result<serde_json::Value> {
		Ok(serde_json::to_value(self)?)
	}

	/// Depth-first iteration over every node.
	pub fn descendants(&self) -> Vec<&Node> {
		let mut out = Vec::new();
		let mut stack: Vec<&Node> = self.children.iter().rev().collect();
		while let Some(node) = stack.pop() {
			out.push(node);
			stack.extend(node.children.iter().rev());
		}
		out
	}
}

/// Nest a top-first layer list using folder/divider markers.
fn nest(layers: &[Layer]) -> Vec<Node> {
	let mut roots = Vec::new();
	let mut open: Vec<Node> = Vec::new();

	for (index, layer) in layers.iter().enumerate() {
		if layer.is_folder() {
			open.push(Node::from_layer(layer, index, NodeKind::Group));
		} else if layer.is_folder_end() {
			match open.pop() {
				Some(group) => attach(&mut roots, &mut open, group),
				None => trace!(index, "unmatched group end ignored"),
			}
		} else {
			attach(&mut roots, &mut open, Node::from_layer(layer, index, NodeKind::Layer));
		}
	}

	while let Some(group) = open.pop() {
		attach(&mut roots, &mut open, group);
	}
	roots
}

fn attach(roots: &mut Vec<Node>, open: &mut [Node], node: Node) {
	match open.last_mut() {
		Some(parent) => parent.children.push(node),
		None => roots.push(node),
	}
}
