//! Test patterns for driving the server from a client.

use rand::{Rng, thread_rng};

use crate::pixel::Pixel;

pub const BRIGHTNESS: u8 = 0x0E;

/// Red, green, cyan, magenta, yellow.
pub const PALETTE: [Pixel; 5] = [
    Pixel::new(BRIGHTNESS, 0xFF, 0x00, 0x00),
    Pixel::new(BRIGHTNESS, 0x00, 0xFF, 0x00),
    Pixel::new(BRIGHTNESS, 0x00, 0xFF, 0xFF),
    Pixel::new(BRIGHTNESS, 0xFF, 0x00, 0xFF),
    Pixel::new(BRIGHTNESS, 0xFF, 0xFF, 0x00),
];

/// Palette colors laid along the string, rotated by `shift`.
pub fn cycle(num_pixels: usize, shift: usize) -> Vec<Pixel> {
    (0..num_pixels)
        .map(|i| PALETTE[(i + shift) % PALETTE.len()])
        .collect()
}

pub fn random(num_pixels: usize) -> Vec<Pixel> {
    let mut rng = thread_rng();

    (0..num_pixels)
        .map(|_| Pixel::new(BRIGHTNESS, rng.r#gen(), rng.r#gen(), rng.r#gen()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_rotates_palette() {
        let first = cycle(7, 0);
        assert_eq!(first[0], PALETTE[0]);
        assert_eq!(first[5], PALETTE[0]);

        let shifted = cycle(7, 1);
        assert_eq!(shifted[0], PALETTE[1]);
        assert_eq!(shifted[4], PALETTE[0]);
    }

    #[test]
    fn random_has_requested_length() {
        let pixels = random(32);
        assert_eq!(pixels.len(), 32);
        assert!(pixels.iter().all(|p| p.brightness == BRIGHTNESS));
    }
}
