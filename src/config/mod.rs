//! Configuration for pixelate
//!
//! Provides types, discovery and loading for the `pixelate.toml` file.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
