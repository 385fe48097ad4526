//! MapCSS stylesheets.
//!
//! A stylesheet decides which elements become meshes and with what
//! parameters. [`MapCssParser`] turns source text into a [`Stylesheet`],
//! and [`StyleProvider`] resolves the cascade for a concrete element at a
//! concrete zoom level.

mod color;
mod gradient;
mod parser;
mod provider;
mod types;

pub use color::Color;
pub use gradient::Gradient;
pub use parser::MapCssParser;
pub use provider::StyleProvider;
pub use types::{Condition, Rule, Selector, SelectorTarget, Style, Stylesheet};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("stylesheet i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("stylesheet parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid color `{0}`")]
    InvalidColor(String),

    #[error("invalid gradient `{0}`")]
    InvalidGradient(String),
}
