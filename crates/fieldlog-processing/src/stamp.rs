//! Caption stamping.
//!
//! Burns caption lines into the bottom-left corner of the image using the
//! built-in glyph set. Enlargement is pixel replication: every set glyph
//! pixel becomes a `scale x scale` white block. Limited to the glyph set's
//! script coverage; no outline or background layer is drawn.

use crate::glyphs::{self, GLYPH_HEIGHT, GLYPH_TRACKING, GLYPH_WIDTH};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Stamping parameters. Defaults match the field deployment: 16 px margin,
/// 10 px base line spacing, 4x enlargement, quality-95 JPEG rewrite.
#[derive(Debug, Clone)]
pub struct StampOptions {
    pub scale: u32,
    pub margin: u32,
    pub line_spacing: u32,
    pub jpeg_quality: u8,
}

impl Default for StampOptions {
    fn default() -> Self {
        StampOptions {
            scale: 4,
            margin: 16,
            line_spacing: 10,
            jpeg_quality: 95,
        }
    }
}

/// Outcome of the stamp stage. Never escalates to a request failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StampOutcome {
    Stamped,
    Failed(String),
}

impl StampOutcome {
    pub fn stamped(&self) -> bool {
        matches!(self, StampOutcome::Stamped)
    }
}

/// Stamp `lines` onto the image at `path`, top-to-bottom, anchored to the
/// bottom-left corner. When the block is taller than the image it is clamped
/// to start at the top margin and may overflow past the bottom.
pub fn stamp(path: &Path, lines: &[String], opts: &StampOptions) -> StampOutcome {
    match render(path, lines, opts) {
        Ok(()) => StampOutcome::Stamped,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Caption stamping failed");
            StampOutcome::Failed(e.to_string())
        }
    }
}

fn render(path: &Path, lines: &[String], opts: &StampOptions) -> Result<(), anyhow::Error> {
    let mut img = image::open(path)?.to_rgb8();
    let height = img.height();

    let scale = opts.scale.max(1);
    let line_height = GLYPH_HEIGHT * scale;
    let line_advance = line_height + opts.line_spacing * scale;
    let block_height = line_advance * lines.len() as u32;

    let y_start = if block_height + opts.margin > height {
        opts.margin
    } else {
        height - opts.margin - block_height
    };

    let mut y = y_start;
    for line in lines {
        draw_line(&mut img, line, opts.margin, y, scale);
        y += line_advance;
    }

    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, opts.jpeg_quality);
    img.write_with_encoder(encoder)?;

    Ok(())
}

/// Draw one caption line with the glyph set, `scale`-replicated.
fn draw_line(img: &mut RgbImage, text: &str, x_start: u32, y_start: u32, scale: u32) {
    let mut x = x_start;
    let advance = (GLYPH_WIDTH + GLYPH_TRACKING) * scale;

    for c in text.chars() {
        let columns = glyphs::glyph(c);
        for (col, bits) in columns.iter().enumerate() {
            for row in 0..GLYPH_HEIGHT {
                if bits & (1 << row) != 0 {
                    let px = x + col as u32 * scale;
                    let py = y_start + row * scale;
                    if px < img.width() && py < img.height() {
                        // draw_filled_rect_mut clips to the image bounds
                        draw_filled_rect_mut(
                            img,
                            Rect::at(px as i32, py as i32).of_size(scale, scale),
                            TEXT_COLOR,
                        );
                    }
                }
            }
        }
        x += advance;
    }
}
