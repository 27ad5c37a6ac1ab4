use std::path::Path;

use psdoc::psd::{Document, Result};

/// Open and run the pipeline over a document.
pub(crate) fn open_parsed(path: &Path) -> Result<Document> {
	let mut doc = Document::open(path)?;
	doc.parse()?;
	Ok(doc)
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

/// Render a four-byte key as a printable label.
pub(crate) fn render_code(code: [u8; 4]) -> String {
	let mut out = String::new();
	for byte in code {
		if byte == 0 {
			continue;
		}
		if byte.is_ascii_graphic() || byte == b' ' {
			out.push(char::from(byte));
		} else {
			out.push('.');
		}
	}
	if out.is_empty() { "....".to_owned() } else { out }
}
