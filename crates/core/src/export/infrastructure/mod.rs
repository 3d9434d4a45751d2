pub mod cpu_framebuffer;
pub mod gpu_framebuffer;
pub mod png_file_writer;
