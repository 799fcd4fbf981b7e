//! Canvas-drawing normalization.
//!
//! Turns an arbitrary-size grayscale image with a bright drawing on a dark
//! background into the 28×28 [0,1] input the classifier was trained on,
//! following the standard MNIST framing: the glyph is cropped, squared,
//! scaled into a 20×20 box, and centered with a 4-pixel margin.

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::utils::error::{MnistDrawError, Result};
use crate::{DIGIT_BOX, DIGIT_MARGIN, FOREGROUND_THRESHOLD, IMAGE_SIZE};

/// Inclusive bounding box of all foreground pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Locate the minimal box enclosing every pixel brighter than the
/// foreground threshold. Returns `None` when the canvas is empty.
///
/// The box is inclusive on both ends, so a single bright pixel yields a
/// valid 1×1 box.
pub fn foreground_bounds(image: &GrayImage) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] <= FOREGROUND_THRESHOLD {
            continue;
        }
        bounds = Some(match bounds {
            None => BoundingBox {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            },
            Some(b) => BoundingBox {
                min_x: b.min_x.min(x),
                min_y: b.min_y.min(y),
                max_x: b.max_x.max(x),
                max_y: b.max_y.max(y),
            },
        });
    }

    bounds
}

/// Normalize a grayscale drawing to the model input format.
///
/// Steps: crop to the foreground bounding box, center the crop on a square
/// canvas, resize to 20×20 with Lanczos filtering, paste at offset (4,4)
/// into a black 28×28 canvas, and scale intensities to [0,1].
///
/// Returns a row-major vector of 784 floats, or [`MnistDrawError::EmptyCanvas`]
/// when no pixel exceeds the foreground threshold.
pub fn normalize_drawing(image: &GrayImage) -> Result<Vec<f32>> {
    let bounds = foreground_bounds(image).ok_or(MnistDrawError::EmptyCanvas)?;

    // Crop exactly to the bounding box
    let cropped = imageops::crop_imm(
        image,
        bounds.min_x,
        bounds.min_y,
        bounds.width(),
        bounds.height(),
    )
    .to_image();

    // Center on a square canvas sized to the larger dimension. Integer
    // division leaves the extra pixel on the bottom/right when the
    // difference is odd.
    let side = bounds.width().max(bounds.height());
    let mut squared = GrayImage::new(side, side);
    let offset_x = (side - bounds.width()) / 2;
    let offset_y = (side - bounds.height()) / 2;
    imageops::replace(&mut squared, &cropped, offset_x as i64, offset_y as i64);

    // Scale the glyph into its conventional 20×20 box
    let glyph = imageops::resize(
        &squared,
        DIGIT_BOX as u32,
        DIGIT_BOX as u32,
        FilterType::Lanczos3,
    );

    // Fixed 4-pixel margin on all sides; the offset is constant and does
    // not depend on the glyph content.
    let mut framed = GrayImage::new(IMAGE_SIZE as u32, IMAGE_SIZE as u32);
    imageops::replace(&mut framed, &glyph, DIGIT_MARGIN as i64, DIGIT_MARGIN as i64);

    Ok(framed.pixels().map(|p| p.0[0] as f32 / 255.0).collect())
}
