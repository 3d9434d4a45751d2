//! Framebuffer export for interactive renderers.
//!
//! Dumps the current framebuffer to disk either as a single PNG snapshot or,
//! with the `image-sequence` feature, as a fixed-timestep sequence of
//! zero-padded PNG frames.

pub mod export;
pub mod scene;
pub mod shared;
pub mod time;
