pub const IMAGE_FOLDER_NAME: &str = "out";
pub const SEQUENCE_FOLDER_NAME: &str = "exports";

pub const DEFAULT_FILE_NAME: &str = "image";
pub const PNG_EXTENSION: &str = "png";

pub const DEFAULT_FPS: f64 = 30.0;
pub const DEFAULT_SEQUENCE_BEGIN_S: f64 = 0.0;
pub const DEFAULT_SEQUENCE_END_S: f64 = 10.0;

pub const DEFAULT_EXPORT_WIDTH: u32 = 1920;
pub const DEFAULT_EXPORT_HEIGHT: u32 = 1080;
/// Largest accepted width or height. Keeps row and buffer sizes well inside `u32`.
pub const MAX_DIMENSION: u32 = 16384;

/// RGBA8: one byte per channel.
pub const BYTES_PER_PIXEL: u32 = 4;
