//! Pixelate - Library for parsing and rendering pixel art documents
//!
//! A document is a markdown file holding a TOML color legend between `+++`
//! markers, followed by a comma-separated grid of tokens. This library:
//! - Resolves legend colors given as hex values or `palette:color` references
//! - Validates the grid against the legend
//! - Renders each cell as a solid block of an RGBA image and saves it

pub mod cli;
pub mod color;
pub mod config;
pub mod discovery;
pub mod models;
pub mod output;
pub mod palettes;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod renderer;
