use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the project configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The project file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project file is not valid TOML for the expected schema
    #[error("Failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A configuration value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A cumulative slice names a threshold layer missing from the layer order
    #[error("Slice '{slice}' uses threshold layer '{layer}' which is not in layer_order")]
    UnknownThresholdLayer { slice: String, layer: String },

    /// A slice filter on the command line names no configured slice
    #[error("Unknown slice: {0}")]
    UnknownSlice(String),
}

/// Errors reported by a rendering engine session
#[derive(Debug, Error)]
pub enum EngineError {
    /// An input file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The style sheet is malformed
    #[error("Invalid style sheet {path}: {message}")]
    StyleSheet { path: PathBuf, message: String },

    /// A geometry file is malformed
    #[error("Invalid layout {path}: {message}")]
    Layout { path: PathBuf, message: String },

    /// No geometry is loaded, so there is no bounding box
    #[error("Layout is empty: no geometry loaded")]
    EmptyLayout,

    /// Render requested with a zero or oversized pixel size
    #[error("Invalid render size {width}x{height}")]
    InvalidRenderSize { width: u32, height: u32 },
}

/// Errors that can occur while producing a single tile or manifest
#[derive(Debug, Error)]
pub enum TileError {
    /// PNG encoding failed
    #[error("Encode error: {message}")]
    EncodeError { message: String },

    /// Writing an output file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine returned an image of the wrong size
    #[error("Render returned {actual:?}, expected {expected:?}")]
    UnexpectedSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// The black and white renders of one tile differ in size
    #[error("Render size mismatch: black {black:?}, white {white:?}")]
    SizeMismatch {
        black: (u32, u32),
        white: (u32, u32),
    },
}

/// Errors that abort an export run
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Tile error: {0}")]
    Tile(#[from] TileError),
}
