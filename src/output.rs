//! Output file naming and image encoding

use anyhow::{anyhow, bail, Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::settings_io::normalize_format_name;
use framegrab_capture::PixelBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Bmp,
    Tiff,
}

impl OutputFormat {
    /// Extension used for generated file names
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Tiff => ImageFormat::Tiff,
        }
    }

    /// Format named by the file extension of `path`, if any
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize_format_name(s) {
            Some("png") => Ok(OutputFormat::Png),
            Some("jpeg") => Ok(OutputFormat::Jpeg),
            Some("bmp") => Ok(OutputFormat::Bmp),
            Some("tiff") => Ok(OutputFormat::Tiff),
            _ => Err(format!(
                "unsupported format '{}', expected one of: {}",
                s,
                framegrab_capture::config::output::SUPPORTED_FORMATS.join(", ")
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Pick the output format: explicit flag, then the output file's
/// extension, then the settings default
pub fn resolve_format(
    flag: Option<OutputFormat>,
    output: Option<&Path>,
    settings_format: &str,
) -> Result<OutputFormat> {
    if let Some(format) = flag {
        return Ok(format);
    }
    if let Some(format) = output.and_then(OutputFormat::from_path) {
        return Ok(format);
    }
    settings_format
        .parse()
        .map_err(|e: String| anyhow!(e))
        .context("Invalid format in settings")
}

/// `<unix-seconds>.<ext>`
pub fn default_file_name(format: OutputFormat, now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{}.{}", secs, format.extension())
}

/// Explicit `--output` wins; otherwise a timestamped name, placed in
/// `output_dir` when configured
pub fn resolve_output_path(
    output: Option<PathBuf>,
    output_dir: Option<&Path>,
    format: OutputFormat,
    now: SystemTime,
) -> PathBuf {
    match output {
        Some(path) => path,
        None => {
            let name = default_file_name(format, now);
            match output_dir {
                Some(dir) => dir.join(name),
                None => PathBuf::from(name),
            }
        }
    }
}

/// Encode `buffer` as `format` into `path`, creating or truncating it
pub fn write_image(buffer: PixelBuffer, path: &Path, format: OutputFormat) -> Result<()> {
    if buffer.is_empty() {
        bail!("Refusing to write an empty {}x{} image", buffer.width, buffer.height);
    }

    let (width, height) = (buffer.width, buffer.height);
    let image = RgbaImage::from_raw(width, height, buffer.into_raw())
        .context("Pixel buffer does not match its dimensions")?;

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let encoded = match format {
        // JPEG has no alpha channel
        OutputFormat::Jpeg => DynamicImage::ImageRgba8(image)
            .to_rgb8()
            .write_to(&mut writer, format.image_format()),
        _ => image.write_to(&mut writer, format.image_format()),
    };
    encoded.with_context(|| format!("Failed to encode {} image", format))?;

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), %format, width, height, "Screenshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct TempDir {
        path: PathBuf,
    }

    impl TempDir {
        fn new(label: &str) -> Self {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos();
            let mut path = std::env::temp_dir();
            path.push(format!("framegrab_test_{}_{}_{}", label, std::process::id(), nanos));
            std::fs::create_dir_all(&path).unwrap();
            Self { path }
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(width, height);
        for (i, sample) in buffer.data.chunks_exact_mut(4).enumerate() {
            sample[0] = (i * 10) as u8;
            sample[1] = 0x80;
            sample[2] = 0xFF - (i * 10) as u8;
        }
        buffer
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<OutputFormat>(), Ok(OutputFormat::Png));
        assert_eq!("jpg".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert!("webm".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_resolution_order() {
        let out = Path::new("shot.bmp");
        assert_eq!(
            resolve_format(Some(OutputFormat::Tiff), Some(out), "png").unwrap(),
            OutputFormat::Tiff
        );
        assert_eq!(resolve_format(None, Some(out), "png").unwrap(), OutputFormat::Bmp);
        assert_eq!(
            resolve_format(None, Some(Path::new("shot")), "jpeg").unwrap(),
            OutputFormat::Jpeg
        );
        assert!(resolve_format(None, None, "gif").is_err());
    }

    #[test]
    fn test_default_file_name_is_timestamped() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(default_file_name(OutputFormat::Png, now), "1700000000.png");
        assert_eq!(
            resolve_output_path(None, Some(Path::new("/shots")), OutputFormat::Jpeg, now),
            PathBuf::from("/shots/1700000000.jpeg")
        );
        assert_eq!(
            resolve_output_path(Some("a.png".into()), Some(Path::new("/shots")), OutputFormat::Png, now),
            PathBuf::from("a.png")
        );
    }

    #[test]
    fn test_png_keeps_exact_pixels() {
        let temp = TempDir::new("png");
        let path = temp.path.join("out.png");
        let buffer = gradient(4, 3);
        let expected = buffer.clone();

        write_image(buffer, &path, OutputFormat::Png).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.into_raw(), expected.data);
    }

    #[test]
    fn test_jpeg_is_written_without_alpha() {
        let temp = TempDir::new("jpeg");
        let path = temp.path.join("out.jpeg");

        write_image(gradient(8, 8), &path, OutputFormat::Jpeg).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_existing_file_is_truncated() {
        let temp = TempDir::new("truncate");
        let path = temp.path.join("out.bmp");
        std::fs::write(&path, vec![0xAB; 1 << 16]).unwrap();

        write_image(gradient(2, 2), &path, OutputFormat::Bmp).unwrap();

        assert!(std::fs::metadata(&path).unwrap().len() < 1 << 16);
        assert!(image::open(&path).is_ok());
    }

    #[test]
    fn test_empty_buffer_is_rejected() {
        let temp = TempDir::new("empty");
        let path = temp.path.join("out.png");
        assert!(write_image(PixelBuffer::new(0, 0), &path, OutputFormat::Png).is_err());
        assert!(!path.exists());
    }
}
