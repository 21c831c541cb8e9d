use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to create output file {path:?}: {source}")]
    OutputCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("External tool {tool} failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    #[error("Invalid quality value: {0}. Must be between 0 and 100")]
    InvalidQuality(u8),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Cannot detect output format from {0:?}")]
    UndetectableFormat(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to create output directory {path:?}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No image files found in input path: {0}")]
    NoImageFilesFound(PathBuf),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Worker panicked: {0}")]
    WorkerPanic(String),
}

/// Coarse error taxonomy used for batch results and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    Io,
    Encode,
    ExternalTool,
    UnsupportedFormat,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Decode => "DecodeError",
            ErrorKind::Io => "IOError",
            ErrorKind::Encode => "EncodeError",
            ErrorKind::ExternalTool => "ExternalToolError",
            ErrorKind::UnsupportedFormat => "UnsupportedFormatError",
            ErrorKind::Config => "ConfigError",
        };
        write!(f, "{}", name)
    }
}

impl CompressionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Encode { .. } | Self::WorkerPanic(_) => ErrorKind::Encode,
            Self::Io(_)
            | Self::OutputCreation { .. }
            | Self::FileNotFound(_)
            | Self::DirectoryCreationFailed { .. }
            | Self::WalkdirError(_) => ErrorKind::Io,
            Self::ToolNotFound(_) | Self::ToolFailed { .. } => ErrorKind::ExternalTool,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::InvalidQuality(_)
            | Self::UndetectableFormat(_)
            | Self::Config(_)
            | Self::NoImageFilesFound(_) => ErrorKind::Config,
        }
    }

    /// Configuration errors surface before any work begins.
    pub fn is_config_error(&self) -> bool {
        self.kind() == ErrorKind::Config
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn tool_failed<S: Into<String>, R: Into<String>>(tool: S, reason: R) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
