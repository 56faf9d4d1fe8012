// capture/x11.rs - X11 display server adapter
//
// Talks to the X server through x11rb's pure Rust connection. Each call
// connects, issues its requests and drops the connection when the function
// scope ends, on success and on every error path.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    ConnectionExt as _, Depth, Format, ImageFormat, ImageOrder, Screen, VisualClass, Visualid,
};
use x11rb::rust_connection::RustConnection;

use super::decode::{decode_pixels, ByteOrder, ColorMasks, PackedImage, PixelLayout};
use super::{CaptureError, DisplayServer, PixelBuffer};
use crate::geometry::Geometry;

/// Default display name reported when neither an explicit name nor
/// `$DISPLAY` is available
const FALLBACK_DISPLAY: &str = ":0";

/// All planes
const ALL_PLANES: u32 = !0;

/// Captures the root window of an X11 display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct X11Server {
    display: Option<String>,
}

impl X11Server {
    /// `display` is an X display name such as `:1` or `host:0.1`; `None`
    /// uses `$DISPLAY`
    pub fn new(display: Option<String>) -> Self {
        Self {
            display: display.filter(|d| !d.is_empty()),
        }
    }

    /// Display name as used for connecting, for messages
    pub fn display_name(&self) -> String {
        self.display
            .clone()
            .or_else(|| std::env::var(crate::config::env::DISPLAY_ENV).ok().filter(|d| !d.is_empty()))
            .unwrap_or_else(|| FALLBACK_DISPLAY.to_string())
    }

    fn connect(&self) -> Result<(RustConnection, usize), CaptureError> {
        let display_name = self.display_name();
        tracing::debug!(display = %display_name, "Connecting to X server");

        RustConnection::connect(self.display.as_deref()).map_err(|e| {
            CaptureError::DisplayUnavailable {
                display: display_name,
                reason: e.to_string(),
            }
        })
    }
}

fn root_screen(conn: &RustConnection, screen_num: usize) -> Result<&Screen, CaptureError> {
    conn.setup()
        .roots
        .get(screen_num)
        .ok_or_else(|| CaptureError::query_failed("Setup", format!("screen {} not found", screen_num)))
}

/// Pixmap format the server uses for images of `depth`
fn pixel_layout(
    formats: &[Format],
    byte_order: ImageOrder,
    depth: u8,
) -> Result<PixelLayout, CaptureError> {
    let format = formats
        .iter()
        .find(|f| f.depth == depth)
        .ok_or(CaptureError::UnsupportedPixelFormat {
            depth,
            bits_per_pixel: 0,
        })?;

    Ok(PixelLayout {
        depth,
        bits_per_pixel: format.bits_per_pixel,
        scanline_pad: format.scanline_pad,
        byte_order: if byte_order == ImageOrder::MSB_FIRST {
            ByteOrder::MsbFirst
        } else {
            ByteOrder::LsbFirst
        },
    })
}

/// Channel masks of `visual`, if it is a true/direct color visual
fn visual_masks(depths: &[Depth], visual: Visualid) -> Option<ColorMasks> {
    depths
        .iter()
        .flat_map(|d| d.visuals.iter())
        .find(|v| v.visual_id == visual)
        .filter(|v| v.class == VisualClass::TRUE_COLOR || v.class == VisualClass::DIRECT_COLOR)
        .map(|v| ColorMasks::new(v.red_mask, v.green_mask, v.blue_mask))
}

fn to_protocol<T: TryFrom<U>, U: Copy + std::fmt::Display>(
    value: U,
    field: &str,
) -> Result<T, CaptureError> {
    T::try_from(value).map_err(|_| {
        CaptureError::query_failed(
            "GetImage",
            format!("{} {} exceeds X11 protocol limits", field, value),
        )
    })
}

impl DisplayServer for X11Server {
    fn name(&self) -> &str {
        "x11"
    }

    fn max_geometry(&self) -> Result<Geometry, CaptureError> {
        let (conn, screen_num) = self.connect()?;
        let root = root_screen(&conn, screen_num)?.root;

        let reply = conn
            .get_geometry(root)
            .map_err(|e| CaptureError::query_failed("GetGeometry", e))?
            .reply()
            .map_err(|e| CaptureError::query_failed("GetGeometry", e))?;

        tracing::debug!(
            width = reply.width,
            height = reply.height,
            "Root window geometry"
        );

        Ok(Geometry::with_size(
            u32::from(reply.width),
            u32::from(reply.height),
        ))
    }

    fn screenshot(&self, geometry: &Geometry) -> Result<PixelBuffer, CaptureError> {
        let x: i16 = to_protocol(geometry.x_offset, "x offset")?;
        let y: i16 = to_protocol(geometry.y_offset, "y offset")?;
        let width: u16 = to_protocol(geometry.width, "width")?;
        let height: u16 = to_protocol(geometry.height, "height")?;

        let (conn, screen_num) = self.connect()?;
        let screen = root_screen(&conn, screen_num)?;

        tracing::debug!(%geometry, "Requesting image from root window");
        let reply = conn
            .get_image(ImageFormat::Z_PIXMAP, screen.root, x, y, width, height, ALL_PLANES)
            .map_err(|e| CaptureError::query_failed("GetImage", e))?
            .reply()
            .map_err(|e| CaptureError::query_failed("GetImage", e))?;

        let setup = conn.setup();
        let layout = pixel_layout(&setup.pixmap_formats, setup.image_byte_order, reply.depth)?;

        // Windows created without a visual of their own report 0 (CopyFromParent)
        let visual = if reply.visual == 0 {
            screen.root_visual
        } else {
            reply.visual
        };
        let masks = visual_masks(&screen.allowed_depths, visual).ok_or(
            CaptureError::UnsupportedPixelFormat {
                depth: layout.depth,
                bits_per_pixel: layout.bits_per_pixel,
            },
        )?;

        tracing::trace!(
            depth = layout.depth,
            bits_per_pixel = layout.bits_per_pixel,
            scanline_pad = layout.scanline_pad,
            byte_order = ?layout.byte_order,
            true_color_24 = masks.is_true_color_24(),
            bytes = reply.data.len(),
            "Image reply received"
        );

        let image = PackedImage::new(&reply.data, geometry.width, geometry.height, layout)?;
        Ok(decode_pixels(&image, masks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x11rb::protocol::xproto::Visualtype;

    fn visual(visual_id: Visualid, class: VisualClass) -> Visualtype {
        Visualtype {
            visual_id,
            class,
            bits_per_rgb_value: 8,
            colormap_entries: 256,
            red_mask: 0xFF0000,
            green_mask: 0x00FF00,
            blue_mask: 0x0000FF,
        }
    }

    #[test]
    fn test_layout_from_pixmap_formats() {
        let formats = [
            Format {
                depth: 1,
                bits_per_pixel: 1,
                scanline_pad: 32,
            },
            Format {
                depth: 24,
                bits_per_pixel: 32,
                scanline_pad: 32,
            },
        ];

        let layout = pixel_layout(&formats, ImageOrder::LSB_FIRST, 24).unwrap();
        assert_eq!(layout, PixelLayout::XRGB32_LE);

        let layout = pixel_layout(&formats, ImageOrder::MSB_FIRST, 24).unwrap();
        assert_eq!(layout.byte_order, ByteOrder::MsbFirst);

        assert!(matches!(
            pixel_layout(&formats, ImageOrder::LSB_FIRST, 16),
            Err(CaptureError::UnsupportedPixelFormat { depth: 16, .. })
        ));
    }

    #[test]
    fn test_masks_only_for_true_color_visuals() {
        let depths = [Depth {
            depth: 24,
            visuals: vec![
                visual(0x21, VisualClass::TRUE_COLOR),
                visual(0x22, VisualClass::PSEUDO_COLOR),
            ],
        }];

        assert_eq!(
            visual_masks(&depths, 0x21),
            Some(ColorMasks::TRUE_COLOR_24)
        );
        assert_eq!(visual_masks(&depths, 0x22), None);
        assert_eq!(visual_masks(&depths, 0x99), None);
    }

    #[test]
    fn test_empty_display_name_uses_environment() {
        assert_eq!(X11Server::new(Some(String::new())), X11Server::new(None));
        assert_eq!(
            X11Server::new(Some(":7".to_string())).display_name(),
            ":7"
        );
    }
}
