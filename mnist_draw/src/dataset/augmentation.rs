//! Runtime data augmentation for digit images.
//!
//! Each training epoch sees freshly perturbed copies of the data: a small
//! random rotation, zoom, and shift, composed into a single inverse affine
//! transform and resampled bilinearly over the 28×28 grid. Pixels sampled
//! from outside the source image read as black, matching the MNIST
//! background.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::IMAGE_SIZE;

/// Augmentation ranges, all symmetric around the identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Maximum rotation in degrees (either direction)
    pub rotation_degrees: f32,
    /// Maximum zoom factor deviation (0.1 = scale in [0.9, 1.1])
    pub zoom_range: f32,
    /// Maximum shift as a fraction of the image side (0.1 = ±2.8 px)
    pub shift_range: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            rotation_degrees: 10.0,
            zoom_range: 0.1,
            shift_range: 0.1,
        }
    }
}

impl AugmentationConfig {
    /// Identity transform (no augmentation)
    pub fn none() -> Self {
        Self {
            rotation_degrees: 0.0,
            zoom_range: 0.0,
            shift_range: 0.0,
        }
    }

    /// Whether every range is zero
    pub fn is_identity(&self) -> bool {
        self.rotation_degrees == 0.0 && self.zoom_range == 0.0 && self.shift_range == 0.0
    }
}

/// Seeded augmenter applying random affine perturbations
pub struct Augmentor {
    config: AugmentationConfig,
    rng: ChaCha8Rng,
}

impl Augmentor {
    /// Create an augmenter with a fixed seed for reproducible epochs
    pub fn new(config: AugmentationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Produce a randomly perturbed copy of a flattened 28×28 image
    pub fn apply(&mut self, pixels: &[f32]) -> Vec<f32> {
        if self.config.is_identity() {
            return pixels.to_vec();
        }

        let r = self.config.rotation_degrees;
        let z = self.config.zoom_range;
        let s = self.config.shift_range * IMAGE_SIZE as f32;

        let angle = self.rng.gen_range(-r..=r).to_radians();
        let zoom = 1.0 + self.rng.gen_range(-z..=z);
        let dx = self.rng.gen_range(-s..=s);
        let dy = self.rng.gen_range(-s..=s);

        warp(pixels, angle, zoom, dx, dy)
    }
}

/// Resample `pixels` through the inverse of rotate(angle) ∘ scale(zoom) ∘
/// translate(dx, dy), all about the image center.
fn warp(pixels: &[f32], angle: f32, zoom: f32, dx: f32, dy: f32) -> Vec<f32> {
    let side = IMAGE_SIZE;
    let center = (side as f32 - 1.0) / 2.0;
    let (sin, cos) = (-angle).sin_cos();

    let mut out = vec![0.0f32; side * side];
    for y in 0..side {
        for x in 0..side {
            // Undo the translation, then the rotation, then the zoom
            let ox = x as f32 - center - dx;
            let oy = y as f32 - center - dy;
            let rx = ox * cos - oy * sin;
            let ry = ox * sin + oy * cos;
            let sx = rx / zoom + center;
            let sy = ry / zoom + center;

            out[y * side + x] = sample_bilinear(pixels, sx, sy);
        }
    }
    out
}

/// Bilinear sample with zero padding outside the image
fn sample_bilinear(pixels: &[f32], x: f32, y: f32) -> f32 {
    let side = IMAGE_SIZE as i32;
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let read = |px: i32, py: i32| -> f32 {
        if px < 0 || py < 0 || px >= side || py >= side {
            0.0
        } else {
            pixels[(py * side + px) as usize]
        }
    };

    let top = read(x0, y0) * (1.0 - fx) + read(x0 + 1, y0) * fx;
    let bottom = read(x0, y0 + 1) * (1.0 - fx) + read(x0 + 1, y0 + 1) * fx;
    top * (1.0 - fy) + bottom * fy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centered_square() -> Vec<f32> {
        let mut pixels = vec![0.0f32; IMAGE_SIZE * IMAGE_SIZE];
        for y in 10..18 {
            for x in 10..18 {
                pixels[y * IMAGE_SIZE + x] = 255.0;
            }
        }
        pixels
    }

    #[test]
    fn test_identity_config_is_noop() {
        let pixels = centered_square();
        let mut augmentor = Augmentor::new(AugmentationConfig::none(), 7);
        assert_eq!(augmentor.apply(&pixels), pixels);
    }

    #[test]
    fn test_output_shape_and_range() {
        let pixels = centered_square();
        let mut augmentor = Augmentor::new(AugmentationConfig::default(), 42);

        for _ in 0..10 {
            let augmented = augmentor.apply(&pixels);
            assert_eq!(augmented.len(), IMAGE_SIZE * IMAGE_SIZE);
            assert!(augmented.iter().all(|&v| (0.0..=255.0).contains(&v)));
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let pixels = centered_square();
        let mut a = Augmentor::new(AugmentationConfig::default(), 123);
        let mut b = Augmentor::new(AugmentationConfig::default(), 123);

        for _ in 0..5 {
            assert_eq!(a.apply(&pixels), b.apply(&pixels));
        }
    }

    #[test]
    fn test_pure_shift_moves_mass() {
        let pixels = centered_square();
        let shifted = warp(&pixels, 0.0, 1.0, 3.0, 0.0);

        // The square should land 3 pixels to the right
        assert_eq!(shifted[13 * IMAGE_SIZE + 15], 255.0);
        assert_eq!(shifted[13 * IMAGE_SIZE + 10], 0.0);
    }

    #[test]
    fn test_warp_preserves_total_roughly() {
        let pixels = centered_square();
        let total: f32 = pixels.iter().sum();

        let warped = warp(&pixels, 5.0f32.to_radians(), 1.05, 1.0, -1.0);
        let warped_total: f32 = warped.iter().sum();

        // Interior content stays inside the frame for small perturbations,
        // so mass changes only by interpolation and scale effects.
        let ratio = warped_total / total;
        assert!(ratio > 0.8 && ratio < 1.3, "mass ratio {}", ratio);
    }
}
