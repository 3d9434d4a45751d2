pub mod domain;
pub mod exporter;
pub mod infrastructure;
#[cfg(feature = "image-sequence")]
pub mod sequence_exporter;
