//! Derived image scales.

use image::{GenericImageView, ImageFormat};
use serde::Serialize;

use crate::error::{RepositoryError, RepositoryResult};

/// Allowed scale sizes as `(name, max width, max height)`.
pub const ALLOWED_SIZES: &[(&str, u32, u32)] = &[
	("large", 768, 768),
	("preview", 400, 400),
	("mini", 200, 200),
	("thumb", 128, 128),
	("tile", 64, 64),
	("icon", 32, 32),
	("listing", 16, 16),
];

/// Name of the scale that keeps the original dimensions.
pub const ORIGINAL_SCALE: &str = "original";

/// One stored scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scale {
	pub name: String,
	pub width: u32,
	pub height: u32,
	#[serde(skip)]
	pub data: Vec<u8>,
}

/// Renders every allowed size plus the original-size scale of an encoded image.
pub fn render_scales(field: &str, data: &[u8]) -> RepositoryResult<Vec<Scale>> {
	let scale_error = |message: String| RepositoryError::Scale {
		field: field.to_string(),
		message,
	};
	let source = image::load_from_memory(data).map_err(|e| scale_error(e.to_string()))?;
	let (width, height) = source.dimensions();

	let mut scales = Vec::with_capacity(ALLOWED_SIZES.len() + 1);
	let sizes = ALLOWED_SIZES
		.iter()
		.copied()
		.chain(std::iter::once((ORIGINAL_SCALE, width, height)));
	for (name, max_width, max_height) in sizes {
		let (target_width, target_height) = fit(width, height, max_width, max_height);
		let scaled = if (target_width, target_height) == (width, height) {
			source.clone()
		} else {
			source.thumbnail_exact(target_width, target_height)
		};
		let mut buffer = Vec::new();
		scaled
			.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
			.map_err(|e| scale_error(e.to_string()))?;
		scales.push(Scale {
			name: name.to_string(),
			width: target_width,
			height: target_height,
			data: buffer,
		});
	}
	Ok(scales)
}

/// Largest size with the source aspect ratio inside the box, never upscaled.
fn fit(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
	if width <= max_width && height <= max_height {
		return (width, height);
	}
	let ratio = f64::min(
		f64::from(max_width) / f64::from(width),
		f64::from(max_height) / f64::from(height),
	);
	let scaled_width = (f64::from(width) * ratio).round().max(1.0) as u32;
	let scaled_height = (f64::from(height) * ratio).round().max(1.0) as u32;
	(scaled_width, scaled_height)
}
