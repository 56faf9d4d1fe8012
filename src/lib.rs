//! framegrab - Screenshot Capture Library
//!
//! This library provides X-style geometry parsing and the display capture
//! contract used by the `framegrab` binary.

// Configuration constants
pub mod config;

// Geometry strings ([=][WxH][{+-}X{+-}Y])
pub mod geometry;

// Display server contract, pixel decoding and platform adapters
pub mod capture;

// Re-export commonly used types
pub use capture::{create_display_server, CaptureError, ColorMasks, DisplayServer, PixelBuffer};
pub use geometry::{parse_geometry, Geometry, GeometryError};

#[cfg(target_os = "linux")]
pub use capture::x11::X11Server;
