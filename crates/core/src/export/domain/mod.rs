pub mod file_naming;
pub mod frame_numbering;
pub mod frame_source;
pub mod frame_time_average;
pub mod image_writer;
pub mod render_state;
