// capture/mod.rs - Display Capture Module
//
// Defines the display server contract and the pixel buffer it produces.
// Each windowing protocol has its own submodule implementing the contract;
// nothing outside those submodules depends on protocol types.

pub mod decode;

#[cfg(target_os = "linux")]
pub mod x11;
#[cfg(target_os = "linux")]
pub use x11::X11Server;

pub use decode::{decode_pixels, ByteOrder, ColorMasks, PackedImage, PixelLayout, PixelSource};

use crate::geometry::Geometry;

/// A captured frame as row-major RGBA8 samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, no row padding
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Bytes per RGBA sample
    pub const CHANNELS: usize = 4;

    /// Opaque black buffer of the given size
    pub fn new(width: u32, height: u32) -> Self {
        let mut data = vec![0u8; width as usize * height as usize * Self::CHANNELS];
        for sample in data.chunks_exact_mut(Self::CHANNELS) {
            sample[3] = u8::MAX;
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// RGBA sample at (x, y), or None outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        let sample = self.data.get(start..start + Self::CHANNELS)?;
        Some([sample[0], sample[1], sample[2], sample[3]])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

/// Errors reported by display server adapters
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The display server could not be reached
    #[error("could not open display {display}: {reason}")]
    DisplayUnavailable { display: String, reason: String },
    /// A reachable display server rejected or failed a request
    #[error("{request} request failed: {reason}")]
    QueryFailed {
        request: &'static str,
        reason: String,
    },
    /// The server returned pixels in a layout the decoder cannot read
    #[error("unsupported pixel format: {bits_per_pixel} bits per pixel at depth {depth}")]
    UnsupportedPixelFormat { depth: u8, bits_per_pixel: u8 },
    /// Fewer image bytes than the requested rectangle needs
    #[error("truncated image data: expected {expected} bytes, got {actual}")]
    TruncatedImage { expected: usize, actual: usize },
}

impl CaptureError {
    pub fn query_failed(request: &'static str, reason: impl ToString) -> Self {
        CaptureError::QueryFailed {
            request,
            reason: reason.to_string(),
        }
    }
}

/// Trait for protocol-specific display server adapters
///
/// Every call opens its own connection and releases it before returning,
/// so implementations carry no connection state between calls.
pub trait DisplayServer {
    /// Short adapter name used in logs
    fn name(&self) -> &str;

    /// Size of the default root drawable, with zero offsets
    fn max_geometry(&self) -> Result<Geometry, CaptureError>;

    /// Capture exactly `geometry` from the root drawable
    ///
    /// The rectangle is passed to the server as is; one that extends past
    /// the drawable area is rejected by the server, not here.
    fn screenshot(&self, geometry: &Geometry) -> Result<PixelBuffer, CaptureError>;
}

/// Create the display server adapter for this platform
///
/// `display` names the display to connect to; `None` uses the environment
/// default (`$DISPLAY` on X11).
pub fn create_display_server(display: Option<String>) -> Result<Box<dyn DisplayServer>, CaptureError> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(x11::X11Server::new(display)))
    }

    #[cfg(not(target_os = "linux"))]
    {
        Err(CaptureError::DisplayUnavailable {
            display: display.unwrap_or_default(),
            reason: format!("no display server backend for {}", std::env::consts::OS),
        })
    }
}
