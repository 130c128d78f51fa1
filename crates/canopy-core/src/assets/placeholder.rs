//! Generated placeholder raster.
//!
//! A flat blue-grey rectangle with a white one-pixel frame and its own
//! dimensions (`400 x 300`) written in the middle with a small built-in
//! bitmap font.

use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

use crate::error::AssetError;

pub const PLACEHOLDER_WIDTH: u32 = 400;
pub const PLACEHOLDER_HEIGHT: u32 = 300;

const FILL: Rgb<u8> = Rgb([73, 109, 137]);
const FRAME: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([33, 22, 22]);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SCALE: u32 = 3;
const GLYPH_SPACING: u32 = 1;

/// 5x7 glyph rows, most significant of the low five bits is the leftmost pixel.
fn glyph(c: char) -> [u8; 7] {
	match c {
		'0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
		'1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
		'2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
		'3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
		'4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
		'5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
		'6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
		'7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
		'8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
		'9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
		'x' => [0b00000, 0b00000, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001],
		_ => [0; 7],
	}
}

/// Pixel width of `text` once rendered.
fn text_width(text: &str) -> u32 {
	let chars = text.chars().count() as u32;
	if chars == 0 {
		return 0;
	}
	chars * GLYPH_WIDTH * GLYPH_SCALE + (chars - 1) * GLYPH_SPACING * GLYPH_SCALE
}

fn draw_text(image: &mut RgbImage, text: &str, left: u32, top: u32) {
	let advance = (GLYPH_WIDTH + GLYPH_SPACING) * GLYPH_SCALE;
	for (index, c) in text.chars().enumerate() {
		let origin_x = left + index as u32 * advance;
		for (row, bits) in glyph(c).iter().enumerate() {
			for col in 0..GLYPH_WIDTH {
				if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
					continue;
				}
				for dy in 0..GLYPH_SCALE {
					for dx in 0..GLYPH_SCALE {
						let x = origin_x + col * GLYPH_SCALE + dx;
						let y = top + row as u32 * GLYPH_SCALE + dy;
						if x < image.width() && y < image.height() {
							image.put_pixel(x, y, INK);
						}
					}
				}
			}
		}
	}
}

/// Renders the placeholder raster at the given size.
pub fn render(width: u32, height: u32) -> RgbImage {
	let mut image: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
		if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
			FRAME
		} else {
			FILL
		}
	});

	let label = format!("{width} x {height}");
	let label_width = text_width(&label);
	let label_height = GLYPH_HEIGHT * GLYPH_SCALE;
	let left = width.saturating_sub(label_width) / 2;
	let top = height.saturating_sub(label_height) / 2;
	draw_text(&mut image, &label, left, top);

	image
}

/// Encodes the default-size placeholder as PNG.
pub fn placeholder_png() -> Result<Vec<u8>, AssetError> {
	let image = render(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);
	let mut buffer = Vec::new();
	image.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)?;
	Ok(buffer)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::assets::sniff::sniff_mime;
	use rstest::rstest;

	#[rstest]
	fn test_placeholder_is_decodable_png() {
		// Act
		let bytes = placeholder_png().unwrap();

		// Assert
		assert_eq!(sniff_mime(&bytes), "image/png");
		let decoded = image::load_from_memory(&bytes).unwrap();
		assert_eq!(decoded.width(), PLACEHOLDER_WIDTH);
		assert_eq!(decoded.height(), PLACEHOLDER_HEIGHT);
	}

	#[rstest]
	fn test_frame_fill_and_label() {
		let image = render(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);

		assert_eq!(*image.get_pixel(0, 0), FRAME);
		assert_eq!(*image.get_pixel(399, 299), FRAME);
		assert_eq!(*image.get_pixel(10, 10), FILL);
		assert!(image.pixels().any(|p| *p == INK));
	}

	#[rstest]
	fn test_placeholder_is_deterministic() {
		assert_eq!(placeholder_png().unwrap(), placeholder_png().unwrap());
	}

	#[rstest]
	#[case("", 0)]
	#[case("0", 15)]
	#[case("400 x 300", 9 * 15 + 8 * 3)]
	fn test_text_width(#[case] text: &str, #[case] expected: u32) {
		assert_eq!(text_width(text), expected);
	}
}
