pub mod constants;
pub mod duration_format;
pub mod export_error;
pub mod frame;
pub mod rect_size;
