//! Core types for the codimg filtering engine.
//!
//! This module contains the foundational types shared by every other module:
//! - Geometry (points and regions)
//! - Image storage and pixel scalars
//! - Error types
//! - Configuration

pub mod config;
pub mod error;
pub mod geometry;
pub mod image;
pub mod scalar;

// Re-export commonly used types
pub use config::CodConfig;
pub use error::{CodError, ConfigError, Error, FilterError, ImageError};
pub use geometry::{Point, Region, DIM};
pub use image::Image;
pub use scalar::Scalar;
