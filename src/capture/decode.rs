//! Packed pixel decoding
//!
//! Display servers hand back one packed integer per pixel together with a
//! red/green/blue mask set. This module turns that into RGBA8.
//!
//! The common true-color layout puts red in bits 16-23, green in bits 8-15
//! and blue in bits 0-7, which decodes as a fixed shift of 16/8/0 followed by
//! truncation to 8 bits. Shifts here are derived from each mask's lowest set
//! bit instead, which gives exactly that table for the 24-bit layout and also
//! covers BGR ordering and 16-bit visuals:
//! - channels wider than 8 bits keep their 8 most significant bits
//! - channels narrower than 8 bits are scaled up to 0..=255
//! - an empty mask decodes to 0

use super::{CaptureError, PixelBuffer};

/// Red, green and blue bit masks of a packed pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ColorMasks {
    /// 0x00RRGGBB
    pub const TRUE_COLOR_24: ColorMasks = ColorMasks {
        red: 0x00FF_0000,
        green: 0x0000_FF00,
        blue: 0x0000_00FF,
    };

    pub fn new(red: u32, green: u32, blue: u32) -> Self {
        Self { red, green, blue }
    }

    pub fn is_true_color_24(&self) -> bool {
        *self == Self::TRUE_COLOR_24
    }
}

/// Extracts one channel from a packed pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelDecoder {
    mask: u32,
    shift: u32,
    bits: u32,
}

impl ChannelDecoder {
    fn new(mask: u32) -> Self {
        if mask == 0 {
            return Self {
                mask,
                shift: 0,
                bits: 0,
            };
        }
        let shift = mask.trailing_zeros();
        let bits = u32::BITS - (mask >> shift).leading_zeros();
        Self { mask, shift, bits }
    }

    #[inline]
    fn decode(&self, pixel: u32) -> u8 {
        let value = (pixel & self.mask) >> self.shift;
        match self.bits {
            0 => 0,
            8 => value as u8,
            bits if bits > 8 => (value >> (bits - 8)) as u8,
            bits => {
                let max = (1u32 << bits) - 1;
                ((value * 255 + max / 2) / max) as u8
            }
        }
    }
}

/// Row-major store of packed pixels
pub trait PixelSource {
    /// (width, height) in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Packed value at (x, y); callers stay within `dimensions()`
    fn packed_pixel(&self, x: u32, y: u32) -> u32;
}

/// Byte order of multi-byte pixels in an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LsbFirst,
    MsbFirst,
}

/// How packed pixels are laid out in raw image bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    /// Significant bits per pixel
    pub depth: u8,
    /// Storage bits per pixel (8, 16, 24 or 32)
    pub bits_per_pixel: u8,
    /// Each scanline is padded to a multiple of this many bits
    pub scanline_pad: u8,
    pub byte_order: ByteOrder,
}

impl PixelLayout {
    /// 32 bits per pixel, depth 24, little endian, no extra row padding
    pub const XRGB32_LE: PixelLayout = PixelLayout {
        depth: 24,
        bits_per_pixel: 32,
        scanline_pad: 32,
        byte_order: ByteOrder::LsbFirst,
    };

    /// Bytes per scanline for an image `width` pixels wide
    pub fn stride(&self, width: u32) -> usize {
        let pad = usize::from(self.scanline_pad.max(8));
        let row_bits = width as usize * usize::from(self.bits_per_pixel);
        row_bits.div_ceil(pad) * pad / 8
    }
}

/// Packed pixels borrowed from a raw image reply
#[derive(Debug, Clone, Copy)]
pub struct PackedImage<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    stride: usize,
    byte_order: ByteOrder,
}

impl<'a> PackedImage<'a> {
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        layout: PixelLayout,
    ) -> Result<Self, CaptureError> {
        let unsupported = CaptureError::UnsupportedPixelFormat {
            depth: layout.depth,
            bits_per_pixel: layout.bits_per_pixel,
        };
        if !matches!(layout.bits_per_pixel, 8 | 16 | 24 | 32) || layout.scanline_pad % 8 != 0 {
            return Err(unsupported);
        }

        let stride = layout.stride(width);
        let expected = stride * height as usize;
        if data.len() < expected {
            return Err(CaptureError::TruncatedImage {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            bytes_per_pixel: usize::from(layout.bits_per_pixel / 8),
            stride,
            byte_order: layout.byte_order,
        })
    }
}

impl PixelSource for PackedImage<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn packed_pixel(&self, x: u32, y: u32) -> u32 {
        let start = y as usize * self.stride + x as usize * self.bytes_per_pixel;
        let bytes = &self.data[start..start + self.bytes_per_pixel];
        match self.byte_order {
            ByteOrder::LsbFirst => bytes
                .iter()
                .rev()
                .fold(0, |acc, &b| (acc << 8) | u32::from(b)),
            ByteOrder::MsbFirst => bytes.iter().fold(0, |acc, &b| (acc << 8) | u32::from(b)),
        }
    }
}

/// Decode every pixel of `source` into an opaque RGBA buffer
pub fn decode_pixels<S: PixelSource + ?Sized>(source: &S, masks: ColorMasks) -> PixelBuffer {
    let (width, height) = source.dimensions();
    let red = ChannelDecoder::new(masks.red);
    let green = ChannelDecoder::new(masks.green);
    let blue = ChannelDecoder::new(masks.blue);

    tracing::trace!(
        width,
        height,
        red = ?red,
        green = ?green,
        blue = ?blue,
        "Decoding packed pixels"
    );

    let row_len = width as usize * PixelBuffer::CHANNELS;
    let mut data = vec![0u8; row_len * height as usize];
    if row_len > 0 {
        for (y, row) in data.chunks_exact_mut(row_len).enumerate() {
            for (x, sample) in row.chunks_exact_mut(PixelBuffer::CHANNELS).enumerate() {
                let pixel = source.packed_pixel(x as u32, y as u32);
                sample[0] = red.decode(pixel);
                sample[1] = green.decode(pixel);
                sample[2] = blue.decode(pixel);
                sample[3] = u8::MAX;
            }
        }
    }

    PixelBuffer {
        width,
        height,
        data,
    }
}
