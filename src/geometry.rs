//! X-style geometry strings
//!
//! Parses the compact `[=][<width>{xX}<height>][{+-}<xoffset>{+-}<yoffset>]`
//! notation used by X clients (see `man 3 XParseGeometry`) into a [`Geometry`].
//!
//! ```rust
//! # use framegrab_capture::geometry::{parse_geometry, Geometry};
//! let geometry = parse_geometry("=200x300+103-44").unwrap();
//! assert_eq!(geometry, Geometry::new(200, 300, 103, -44));
//! ```

use std::fmt;
use std::str::FromStr;

/// Capture rectangle: size in pixels plus signed offsets relative to an edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    pub y_offset: i32,
}

impl Geometry {
    pub fn new(width: u32, height: u32, x_offset: i32, y_offset: i32) -> Self {
        Self {
            width,
            height,
            x_offset,
            y_offset,
        }
    }

    /// Geometry covering `width` x `height` at the origin
    pub fn with_size(width: u32, height: u32) -> Self {
        Self::new(width, height, 0, 0)
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Resolve a user supplied geometry against the drawable area `bounds`.
    ///
    /// - A zero width (height) takes the remaining width (height) of `bounds`
    ///   after the offset on that axis.
    /// - A negative offset is measured from the right (bottom) edge, the way
    ///   XParseGeometry reports XNegative/YNegative.
    ///
    /// The result is not clipped: a rectangle hanging off the screen is left
    /// for the display server to reject.
    pub fn resolve_within(&self, bounds: &Geometry) -> Geometry {
        let width = if self.width == 0 {
            bounds.width.saturating_sub(self.x_offset.unsigned_abs())
        } else {
            self.width
        };
        let height = if self.height == 0 {
            bounds.height.saturating_sub(self.y_offset.unsigned_abs())
        } else {
            self.height
        };

        Geometry {
            width,
            height,
            x_offset: anchor_offset(bounds.x_offset, bounds.width, width, self.x_offset),
            y_offset: anchor_offset(bounds.y_offset, bounds.height, height, self.y_offset),
        }
    }
}

fn anchor_offset(origin: i32, extent: u32, size: u32, offset: i32) -> i32 {
    let position = if offset < 0 {
        i64::from(origin) + i64::from(extent) - i64::from(size) + i64::from(offset)
    } else {
        i64::from(origin) + i64::from(offset)
    };
    position.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl fmt::Display for Geometry {
    /// Canonical `WxH{+-}X{+-}Y` form; zero parts are left out
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_size = self.width != 0 || self.height != 0;
        let has_offsets = self.x_offset != 0 || self.y_offset != 0;

        if has_size || !has_offsets {
            write!(f, "{}x{}", self.width, self.height)?;
        }
        if has_offsets {
            write!(f, "{:+}{:+}", self.x_offset, self.y_offset)?;
        }
        Ok(())
    }
}

impl FromStr for Geometry {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_geometry(s)
    }
}

/// Grammar violations, each tagged with the byte position it was found at
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("missing offset at byte {position}")]
    MissingOffset { position: usize },
    #[error("invalid sign at byte {position}, expected '+' or '-'")]
    InvalidSign { position: usize },
    #[error("multiple signs at byte {position}")]
    MultipleSigns { position: usize },
    #[error("expected a number at byte {position}")]
    NotANumber { position: usize },
    #[error("incomplete width and height, expected {{xX}} separator at byte {position}")]
    IncompleteSize { position: usize },
    #[error("missing {{xX}} separator at byte {position}")]
    MissingSeparator { position: usize },
    #[error("missing height at byte {position}")]
    MissingHeight { position: usize },
    #[error("unexpected sign on height at byte {position}")]
    SignedHeight { position: usize },
    #[error("trailing garbage on geometry string at byte {position}")]
    TrailingGarbage { position: usize },
    #[error("number at byte {position} is out of range")]
    NumberOutOfRange { position: usize },
}

impl GeometryError {
    /// Byte offset into the input where parsing stopped
    pub fn position(&self) -> usize {
        match *self {
            GeometryError::MissingOffset { position }
            | GeometryError::InvalidSign { position }
            | GeometryError::MultipleSigns { position }
            | GeometryError::NotANumber { position }
            | GeometryError::IncompleteSize { position }
            | GeometryError::MissingSeparator { position }
            | GeometryError::MissingHeight { position }
            | GeometryError::SignedHeight { position }
            | GeometryError::TrailingGarbage { position }
            | GeometryError::NumberOutOfRange { position } => position,
        }
    }
}

/// Parse an X geometry string.
///
/// `""` and `"="` are accepted and yield the zero geometry, which callers
/// use to mean "no override". Fields missing from the input stay zero.
pub fn parse_geometry(input: &str) -> Result<Geometry, GeometryError> {
    let mut cursor = Cursor::new(input);
    let mut geometry = Geometry::default();

    cursor.eat(b'=');
    if cursor.is_at_end() {
        return Ok(geometry);
    }

    if !matches!(cursor.peek(), Some(b'+' | b'-')) {
        let (width, height) = parse_size(&mut cursor)?;
        geometry.width = width;
        geometry.height = height;
    }

    if !cursor.is_at_end() {
        let (x_offset, y_offset) = parse_offsets(&mut cursor)?;
        geometry.x_offset = x_offset;
        geometry.y_offset = y_offset;
    }

    Ok(geometry)
}

fn parse_size(cursor: &mut Cursor<'_>) -> Result<(u32, u32), GeometryError> {
    let width = cursor.unsigned()?;

    match cursor.peek() {
        None => {
            return Err(GeometryError::IncompleteSize {
                position: cursor.pos,
            })
        }
        Some(b'x' | b'X') => cursor.bump(),
        Some(_) => {
            return Err(GeometryError::MissingSeparator {
                position: cursor.pos,
            })
        }
    }

    match cursor.peek() {
        None => Err(GeometryError::MissingHeight {
            position: cursor.pos,
        }),
        Some(b'+' | b'-') => Err(GeometryError::SignedHeight {
            position: cursor.pos,
        }),
        Some(_) => Ok((width, cursor.unsigned()?)),
    }
}

fn parse_offsets(cursor: &mut Cursor<'_>) -> Result<(i32, i32), GeometryError> {
    let x_offset = cursor.signed()?;
    let y_offset = cursor.signed()?;

    if !cursor.is_at_end() {
        return Err(GeometryError::TrailingGarbage {
            position: cursor.pos,
        });
    }

    Ok((x_offset, y_offset))
}

/// Byte cursor over the geometry string
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Consume a run of decimal digits and return its value
    fn digits(&mut self) -> Result<u64, GeometryError> {
        let start = self.pos;
        let mut value: u64 = 0;

        while let Some(byte) = self.peek().filter(u8::is_ascii_digit) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(byte - b'0')))
                .ok_or(GeometryError::NumberOutOfRange { position: start })?;
            self.bump();
        }

        if self.pos == start {
            return Err(GeometryError::NotANumber { position: start });
        }
        Ok(value)
    }

    fn unsigned(&mut self) -> Result<u32, GeometryError> {
        let start = self.pos;
        let value = self.digits()?;
        u32::try_from(value).map_err(|_| GeometryError::NumberOutOfRange { position: start })
    }

    /// `{+-}<digits>` with exactly one sign
    fn signed(&mut self) -> Result<i32, GeometryError> {
        let start = self.pos;
        let negative = match self.peek() {
            None => return Err(GeometryError::MissingOffset { position: start }),
            Some(b'+') => false,
            Some(b'-') => true,
            Some(_) => return Err(GeometryError::InvalidSign { position: start }),
        };
        self.bump();

        if matches!(self.peek(), Some(b'+' | b'-')) {
            return Err(GeometryError::MultipleSigns { position: self.pos });
        }

        let magnitude = i64::try_from(self.digits()?)
            .map_err(|_| GeometryError::NumberOutOfRange { position: start })?;
        let value = if negative { -magnitude } else { magnitude };
        i32::try_from(value).map_err(|_| GeometryError::NumberOutOfRange { position: start })
    }
}
