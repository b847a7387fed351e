//! 8-bit RGB colors and weighted color mixing.

use serde::{Deserialize, Serialize};

/// An 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A gray with all channels set to `v`. Used for specular intensities.
    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    /// Packs into `0x00RRGGBB`.
    pub fn to_packed(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    /// Inverse of [`to_packed`](Self::to_packed); the top byte is ignored.
    pub fn from_packed(packed: u32) -> Self {
        Self::rgb((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Absorbs floating-point error in `Σ(c·w) / Σw` so an exact integer result is not
/// truncated one step down.
const TRUNCATION_EPSILON: f64 = 1e-9;

/// Accumulates `(color, weight)` pairs and produces their weighted average.
///
/// A mixer is scratch state: give each thread (or each concurrent classification)
/// its own instance. Entries are retained so a second pass can reuse the same
/// weights with different colors (see [`recolor`](Self::recolor)).
#[derive(Clone, Debug, Default)]
pub struct ColorMixer {
    entries: Vec<(Color, f64)>,
}

impl ColorMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mixer that can hold `capacity` entries without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Adds a color with the given non-negative weight.
    pub fn attach_color(&mut self, color: Color, weight: f64) {
        self.entries.push((color, weight));
    }

    /// Replaces the color of each entry, in attachment order, keeping its weight.
    ///
    /// Extra colors are ignored; entries without a replacement keep their color.
    pub fn recolor(&mut self, colors: impl IntoIterator<Item = Color>) {
        for (entry, color) in self.entries.iter_mut().zip(colors) {
            entry.0 = color;
        }
    }

    /// Sum of all attached weights.
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|&(_, w)| w).sum()
    }

    /// Number of attached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-channel `Σ(channel·weight) / Σweight`, truncated to an integer channel.
    ///
    /// Returns `None` when the total weight is not positive, since the average is
    /// undefined.
    pub fn mixed_color(&self) -> Option<Color> {
        let total = self.total_weight();
        if total.is_nan() || total <= 0.0 {
            return None;
        }

        let mut sums = [0.0_f64; 3];
        for &(color, weight) in &self.entries {
            for (sum, channel) in sums.iter_mut().zip(color.channels()) {
                *sum += f64::from(channel) * weight;
            }
        }

        let [r, g, b] = sums.map(|sum| (sum / total + TRUNCATION_EPSILON).clamp(0.0, 255.0) as u8);
        Some(Color::rgb(r, g, b))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_color(rng: &mut ChaCha8Rng) -> Color {
        Color::rgb(rng.random(), rng.random(), rng.random())
    }

    #[test]
    fn test_single_color_is_returned_unchanged_for_any_weight() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            let color = random_color(&mut rng);
            let weight = rng.random_range(1e-6..1e6);
            let mut mixer = ColorMixer::new();
            mixer.attach_color(color, weight);
            assert_eq!(mixer.mixed_color(), Some(color), "weight {weight}");
        }
    }

    #[test]
    fn test_equal_weights_average_channels() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..10_000 {
            let a = random_color(&mut rng);
            let b = random_color(&mut rng);
            let weight = rng.random_range(1e-3..1e3);
            let mut mixer = ColorMixer::new();
            mixer.attach_color(a, weight);
            mixer.attach_color(b, weight);

            let expected = Color::rgb(
                ((u16::from(a.r) + u16::from(b.r)) / 2) as u8,
                ((u16::from(a.g) + u16::from(b.g)) / 2) as u8,
                ((u16::from(a.b) + u16::from(b.b)) / 2) as u8,
            );
            assert_eq!(mixer.mixed_color(), Some(expected), "{a:?} + {b:?}");
        }
    }

    #[test]
    fn test_weights_bias_the_mix() {
        let mut mixer = ColorMixer::new();
        mixer.attach_color(Color::rgb(200, 0, 0), 3.0);
        mixer.attach_color(Color::rgb(0, 0, 200), 1.0);
        assert_eq!(mixer.mixed_color(), Some(Color::rgb(150, 0, 50)));
    }

    #[test]
    fn test_zero_weight_entries_do_not_contribute() {
        let mut mixer = ColorMixer::new();
        mixer.attach_color(Color::rgb(10, 20, 30), 0.5);
        mixer.attach_color(Color::WHITE, 0.0);
        assert_eq!(mixer.mixed_color(), Some(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn test_no_weight_is_undefined() {
        let mut mixer = ColorMixer::new();
        assert_eq!(mixer.mixed_color(), None);
        mixer.attach_color(Color::WHITE, 0.0);
        assert_eq!(mixer.mixed_color(), None);
    }

    #[test]
    fn test_clear_resets() {
        let mut mixer = ColorMixer::new();
        mixer.attach_color(Color::WHITE, 1.0);
        mixer.clear();
        assert!(mixer.is_empty());
        mixer.attach_color(Color::BLACK, 1.0);
        assert_eq!(mixer.mixed_color(), Some(Color::BLACK));
    }

    #[test]
    fn test_recolor_keeps_weights() {
        let mut mixer = ColorMixer::new();
        mixer.attach_color(Color::rgb(255, 0, 0), 1.0);
        mixer.attach_color(Color::rgb(0, 255, 0), 3.0);
        mixer.recolor([Color::gray(0), Color::gray(100)]);
        assert_eq!(mixer.mixed_color(), Some(Color::gray(75)));
        assert_eq!(mixer.total_weight(), 4.0);
    }

    #[test]
    fn test_packed_roundtrip() {
        let color = Color::rgb(0x12, 0x34, 0x56);
        assert_eq!(color.to_packed(), 0x0012_3456);
        assert_eq!(Color::from_packed(0xFF12_3456), color);
    }
}
