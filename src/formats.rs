//! Output format selection
//!
//! Every requested output is one of a fixed set of formats, each bound to
//! exactly one processor strategy in the registry.

use crate::error::{CompressionError, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// PNG at maximum compression
    Lossless,
    /// PNG passed through optipng when available
    LosslessOptimized,
    /// JPEG at the requested quality
    Lossy,
    /// JPEG passed through mozjpeg when available
    LossyOptimized,
    /// WebP through the cwebp encoder, no fallback
    NextGen,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Lossless,
        Format::LosslessOptimized,
        Format::Lossy,
        Format::LossyOptimized,
        Format::NextGen,
    ];

    /// Returns the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Lossless | Format::LosslessOptimized => "png",
            Format::Lossy | Format::LossyOptimized => "jpg",
            Format::NextGen => "webp",
        }
    }

    /// Canonical name accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Format::Lossless => "png",
            Format::LosslessOptimized => "optipng",
            Format::Lossy => "jpeg",
            Format::LossyOptimized => "mozjpeg",
            Format::NextGen => "webp",
        }
    }

    /// Container the output file ends up in
    pub fn container(&self) -> image::ImageFormat {
        match self {
            Format::Lossless | Format::LosslessOptimized => image::ImageFormat::Png,
            Format::Lossy | Format::LossyOptimized => image::ImageFormat::Jpeg,
            Format::NextGen => image::ImageFormat::WebP,
        }
    }

    /// Total progress units a strategy for this format reports
    pub fn progress_units(&self) -> u64 {
        use crate::constants::{CONVERT_UNITS, OPTIMIZE_UNITS, VALIDATE_UNITS};
        match self {
            Format::Lossless | Format::Lossy => CONVERT_UNITS,
            Format::LosslessOptimized | Format::LossyOptimized => {
                VALIDATE_UNITS + CONVERT_UNITS + OPTIMIZE_UNITS
            }
            Format::NextGen => VALIDATE_UNITS + OPTIMIZE_UNITS,
        }
    }

    /// Format names for CLI help text
    pub fn format_names() -> Vec<&'static str> {
        Format::ALL.iter().map(|f| f.name()).collect()
    }

    /// Infers the plain format for an output file extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "png" => Some(Format::Lossless),
            "jpg" | "jpeg" => Some(Format::Lossy),
            "webp" => Some(Format::NextGen),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Format {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "png" => Ok(Format::Lossless),
            "optipng" => Ok(Format::LosslessOptimized),
            "jpeg" | "jpg" => Ok(Format::Lossy),
            "mozjpeg" => Ok(Format::LossyOptimized),
            "webp" => Ok(Format::NextGen),
            _ => Err(CompressionError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// A `--format` value before it is resolved against an output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChoice {
    Auto,
    Explicit(Format),
}

impl FromStr for FormatChoice {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(FormatChoice::Auto)
        } else {
            Format::from_str(s).map(FormatChoice::Explicit)
        }
    }
}

/// Determine the output format for single-file mode.
///
/// `auto` is resolved from the output path extension; an output without a
/// recognised extension is a configuration error.
pub fn determine_output_format(output_path: Option<&Path>, choice: FormatChoice) -> Result<Format> {
    match choice {
        FormatChoice::Explicit(format) => Ok(format),
        FormatChoice::Auto => {
            let output = output_path.ok_or_else(|| {
                CompressionError::config("--format auto needs an --output path to infer from")
            })?;
            output
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(Format::from_extension)
                .ok_or_else(|| CompressionError::UndetectableFormat(output.to_path_buf()))
        }
    }
}

/// Batch mode never infers: `auto` means WebP.
pub fn batch_format(choice: FormatChoice) -> Format {
    match choice {
        FormatChoice::Explicit(format) => format,
        FormatChoice::Auto => Format::NextGen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("png").unwrap(), Format::Lossless);
        assert_eq!(Format::from_str("OptiPNG").unwrap(), Format::LosslessOptimized);
        assert_eq!(Format::from_str("jpg").unwrap(), Format::Lossy);
        assert_eq!(Format::from_str("JPEG").unwrap(), Format::Lossy);
        assert_eq!(Format::from_str("mozjpeg").unwrap(), Format::LossyOptimized);
        assert_eq!(Format::from_str("webp").unwrap(), Format::NextGen);

        assert!(matches!(
            Format::from_str("tga"),
            Err(CompressionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(Format::Lossless.extension(), "png");
        assert_eq!(Format::LosslessOptimized.extension(), "png");
        assert_eq!(Format::Lossy.extension(), "jpg");
        assert_eq!(Format::LossyOptimized.extension(), "jpg");
        assert_eq!(Format::NextGen.extension(), "webp");
    }

    #[test]
    fn test_name_round_trips_through_from_str() {
        for format in Format::ALL {
            assert_eq!(Format::from_str(format.name()).unwrap(), format);
        }
    }

    #[test]
    fn test_determine_output_format_auto() {
        let path = Path::new("image.webp");
        assert_eq!(
            determine_output_format(Some(path), FormatChoice::Auto).unwrap(),
            Format::NextGen
        );

        let path = Path::new("photo.JPEG");
        assert_eq!(
            determine_output_format(Some(path), FormatChoice::Auto).unwrap(),
            Format::Lossy
        );

        let path = Path::new("archive.tar");
        assert!(matches!(
            determine_output_format(Some(path), FormatChoice::Auto),
            Err(CompressionError::UndetectableFormat(_))
        ));

        assert!(determine_output_format(None, FormatChoice::Auto)
            .unwrap_err()
            .is_config_error());
    }

    #[test]
    fn test_determine_output_format_explicit_wins() {
        let path = Path::new("image.webp");
        assert_eq!(
            determine_output_format(Some(path), FormatChoice::Explicit(Format::Lossless)).unwrap(),
            Format::Lossless
        );
    }

    #[test]
    fn test_batch_format_auto_is_webp() {
        assert_eq!(batch_format(FormatChoice::Auto), Format::NextGen);
        assert_eq!(
            batch_format(FormatChoice::Explicit(Format::Lossy)),
            Format::Lossy
        );
    }

    #[test]
    fn test_format_choice_parse() {
        assert_eq!(FormatChoice::from_str("AUTO").unwrap(), FormatChoice::Auto);
        assert_eq!(
            FormatChoice::from_str("optipng").unwrap(),
            FormatChoice::Explicit(Format::LosslessOptimized)
        );
        assert!(FormatChoice::from_str("bogus").is_err());
    }
}
