use crate::error::{LedError, Result};
use crate::protocol::{FrameGeometry, PIXEL_SIZE};

/// One LED: brightness plus 8-bit red, green and blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub brightness: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const fn new(brightness: u8, r: u8, g: u8, b: u8) -> Self {
        Self { brightness, r, g, b }
    }

    pub fn to_bytes(self) -> [u8; PIXEL_SIZE] {
        [self.brightness, self.r, self.g, self.b]
    }

    /// `#RRGGBB`; brightness is not part of the color string.
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A complete set of pixels submitted in one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<Pixel>,
}

impl Frame {
    pub fn new(pixels: Vec<Pixel>) -> Self {
        Self { pixels }
    }

    /// Slice a raw frame buffer into pixels, skipping header and trailer.
    ///
    /// Header and trailer bytes are not checked against any expected value.
    pub fn parse(data: &[u8], geometry: FrameGeometry) -> Result<Self> {
        if data.len() < geometry.frame_size() {
            return Err(LedError::ShortFrame {
                len: data.len(),
                expected: geometry.frame_size(),
            });
        }

        let pixels = data[geometry.body_start()..geometry.body_end()]
            .chunks_exact(PIXEL_SIZE)
            .map(|c| Pixel::new(c[0], c[1], c[2], c[3]))
            .collect();

        Ok(Self { pixels })
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn first(&self) -> Option<&Pixel> {
        self.pixels.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(geometry: FrameGeometry, fill: [u8; 4]) -> Vec<u8> {
        let mut data = vec![0u8; 4];
        for _ in 0..geometry.num_pixels {
            data.extend_from_slice(&fill);
        }
        data.extend_from_slice(&[0xFF; 4]);
        data
    }

    #[test]
    fn parses_every_pixel_count() {
        for n in 1..=64 {
            let g = FrameGeometry::new(n);
            let mut data = vec![0xAA; 4];
            for i in 0..n {
                let i = i as u8;
                data.extend_from_slice(&[i, i.wrapping_add(1), i.wrapping_add(2), i.wrapping_add(3)]);
            }
            data.extend_from_slice(&[0xBB; 4]);

            let frame = Frame::parse(&data, g).unwrap();
            assert_eq!(frame.len(), n);
            for (i, p) in frame.pixels().iter().enumerate() {
                let i = i as u8;
                assert_eq!(*p, Pixel::new(i, i.wrapping_add(1), i.wrapping_add(2), i.wrapping_add(3)));
            }
        }
    }

    #[test]
    fn fifty_red_pixels() {
        let g = FrameGeometry::new(50);
        let frame = Frame::parse(&raw(g, [0x0E, 0xFF, 0x00, 0x00]), g).unwrap();

        assert_eq!(frame.len(), 50);
        assert!(frame.pixels().iter().all(|p| *p == Pixel::new(14, 255, 0, 0)));
        assert_eq!(frame.first().unwrap().hex(), "#FF0000");
    }

    #[test]
    fn short_buffer_is_rejected() {
        let g = FrameGeometry::new(10);
        let err = Frame::parse(&[0u8; 12], g).unwrap_err();
        assert!(matches!(err, LedError::ShortFrame { len: 12, expected: 48 }));
    }
}
