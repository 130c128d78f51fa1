//! Content-based MIME detection.
//!
//! The file name is never consulted: a PNG saved as `photo.jpg` is still
//! `image/png`.

/// Fallback for content that matches no signature.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Detects the MIME type of `bytes` from their leading signature.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
	if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
		return "image/png";
	}
	if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
		return "image/jpeg";
	}
	if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
		return "image/gif";
	}
	if bytes.len() >= 12 && bytes[..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
		return "image/webp";
	}
	if bytes.starts_with(b"BM") && bytes.len() >= 14 {
		return "image/bmp";
	}
	if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
		return "image/tiff";
	}
	if bytes.starts_with(b"%PDF-") {
		return "application/pdf";
	}
	if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
		return "application/zip";
	}
	if bytes.is_empty() {
		return "application/x-empty";
	}

	match std::str::from_utf8(bytes) {
		Ok(text) => sniff_text(text),
		Err(_) => OCTET_STREAM,
	}
}

fn sniff_text(text: &str) -> &'static str {
	let head = text.trim_start_matches('\u{feff}').trim_start();
	let prefix: String = head.chars().take(512).collect::<String>().to_lowercase();
	if prefix.contains("<svg") {
		return "image/svg+xml";
	}
	if prefix.starts_with("<?xml") {
		return "text/xml";
	}
	if prefix.starts_with("<!doctype html") || prefix.starts_with("<html") {
		return "text/html";
	}
	if prefix.starts_with('{') || prefix.starts_with('[') {
		return "application/json";
	}
	if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
		return OCTET_STREAM;
	}
	"text/plain"
}
