//! Program file loading
//!
//! - [`image`] - raw little-endian instruction images

pub mod image;

pub use image::ProgramImage;
