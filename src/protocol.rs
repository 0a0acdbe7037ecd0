//! LED data frame wire format.
//!
//! Each message is a 4-byte big-endian signed length followed by that many
//! bytes: a 4-byte header, 4 bytes per pixel (brightness, r, g, b), and a
//! 4-byte trailer. The length must equal the size configured on the server.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::error::{LedError, Result};
use crate::pixel::Pixel;
use crate::reader::read_exact_bytes;

pub const PIXEL_SIZE: usize = 4;
pub const HEADER_SIZE: usize = 4;
pub const TRAILER_SIZE: usize = 4;
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest pixel count whose frame size still fits the signed 32-bit length prefix.
pub const MAX_PIXELS: usize = (i32::MAX as usize - HEADER_SIZE - TRAILER_SIZE) / PIXEL_SIZE;

pub const HEADER: [u8; HEADER_SIZE] = [0x00; HEADER_SIZE];
pub const TRAILER: [u8; TRAILER_SIZE] = [0xFF; TRAILER_SIZE];

/// Frame layout derived from the configured pixel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub num_pixels: usize,
}

impl FrameGeometry {
    pub fn new(num_pixels: usize) -> Self {
        Self { num_pixels }
    }

    pub fn body_size(&self) -> usize {
        self.num_pixels * PIXEL_SIZE
    }

    /// Header + body + trailer; the value a client must send as its length prefix.
    pub fn frame_size(&self) -> usize {
        HEADER_SIZE + self.body_size() + TRAILER_SIZE
    }

    /// The length prefix a client sends for this geometry.
    pub fn declared_len(&self) -> Result<i32> {
        if self.num_pixels > MAX_PIXELS {
            return Err(LedError::FrameTooLarge {
                pixels: self.num_pixels,
                max: MAX_PIXELS,
            });
        }

        i32::try_from(self.frame_size()).map_err(|_| LedError::FrameTooLarge {
            pixels: self.num_pixels,
            max: MAX_PIXELS,
        })
    }

    pub fn body_start(&self) -> usize {
        HEADER_SIZE
    }

    pub fn body_end(&self) -> usize {
        HEADER_SIZE + self.body_size()
    }
}

/// Read one length-prefixed frame and return its raw bytes.
///
/// A length that disagrees with `expected` leaves the stream at an unknown
/// offset, so callers must drop the connection on [`LedError::FrameSizeMismatch`].
pub async fn read_frame<R>(reader: &mut R, expected: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let prefix = read_exact_bytes(reader, LENGTH_PREFIX_SIZE).await?;
    let declared = i32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);

    if usize::try_from(declared).ok() != Some(expected) {
        return Err(LedError::FrameSizeMismatch { declared, expected });
    }

    read_exact_bytes(reader, expected).await
}

/// Build a complete wire message (length prefix included) for `pixels`.
pub fn encode_frame(pixels: &[Pixel]) -> Result<Vec<u8>> {
    let geometry = FrameGeometry::new(pixels.len());
    let declared = geometry.declared_len()?;
    let frame_size = geometry.frame_size();

    let mut out = Vec::with_capacity(LENGTH_PREFIX_SIZE + frame_size);
    out.extend_from_slice(&declared.to_be_bytes());
    out.extend_from_slice(&HEADER);
    for p in pixels {
        out.extend_from_slice(&p.to_bytes());
    }
    out.extend_from_slice(&TRAILER);

    Ok(out)
}

pub async fn write_frame<W>(writer: &mut W, pixels: &[Pixel]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_frame(pixels)?).await?;
    writer.flush().await?;
    Ok(())
}
