use clap::Parser;
use std::path::PathBuf;

use crate::logging::LogLevel;
use crate::output::OutputFormat;
use framegrab_capture::Geometry;

#[derive(Debug, Parser)]
#[command(name = "framegrab", version)]
#[command(about = "Take a screenshot of an X11 display or a region of it")]
#[command(after_help = "GEOMETRY is a standard X string, see man 3 XParseGeometry")]
pub struct Cli {
    /// Area to capture: [=][<width>{xX}<height>][{+-}<xoffset>{+-}<yoffset>]
    #[arg(short, long, value_name = "GEOMETRY", allow_hyphen_values = true)]
    pub geometry: Option<Geometry>,

    /// Output file name [default: <unix-seconds>.<format>]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format: png, jpeg, bmp or tiff [default: from --output, then settings]
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// X display to capture [default: $DISPLAY]
    #[arg(short, long, value_name = "DISPLAY")]
    pub display: Option<String>,

    /// Print the resolved capture geometry and exit
    #[arg(long)]
    pub print_geometry: bool,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}
